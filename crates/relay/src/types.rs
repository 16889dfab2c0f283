//! Identifikationstypen fuer das Relay
//!
//! Die ClientId verwendet das Newtype-Pattern, damit Verbindungs-Identitaeten
//! nicht mit beliebigen UUIDs verwechselt werden koennen.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Eindeutige ID einer verbundenen Client-Verbindung
///
/// Wird beim Accept vergeben und lebt bis zum Teardown des Handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Erstellt eine neue zufaellige ClientId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "client:{}", self.0)
    }
}
