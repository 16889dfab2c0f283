//! Gemeinsamer Server-Zustand fuer das Relay
//!
//! Haelt Konfiguration, Registry und Broadcaster als einen explizit
//! konstruierten Kontext, der per Arc an Listener und Connection-Handler
//! gereicht wird. Es gibt keinen ambienten globalen Serverzustand.

use std::sync::Arc;
use std::time::Instant;

use crate::broadcast::Broadcaster;
use crate::registry::ClientRegistry;

/// Konfiguration des Relay-Subsystems
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Anzeigename des Servers (nur fuer Logs)
    pub server_name: String,
    /// Groesse des Lesepuffers pro Read
    ///
    /// Eine Nachricht ist genau das, was ein Read liefert; dieser Wert ist
    /// Konfiguration, kein Protokollfeld.
    pub lese_puffer_bytes: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            server_name: "Stammtisch Server".to_string(),
            lese_puffer_bytes: 1024,
        }
    }
}

/// Gemeinsamer Zustand (thread-safe, Arc-geteilt)
pub struct RelayState {
    /// Relay-Konfiguration
    pub config: Arc<RelayConfig>,
    /// Registry aller verbundenen Clients
    pub registry: ClientRegistry,
    /// Broadcast-Engine ueber der Registry
    pub broadcaster: Broadcaster,
    /// Startzeitpunkt (fuer Uptime-Logs)
    pub start_zeit: Instant,
}

impl RelayState {
    /// Erstellt einen neuen RelayState
    pub fn neu(config: RelayConfig) -> Arc<Self> {
        let registry = ClientRegistry::neu();
        Arc::new(Self {
            config: Arc::new(config),
            broadcaster: Broadcaster::neu(registry.clone()),
            registry,
            start_zeit: Instant::now(),
        })
    }

    /// Gibt die Uptime in Sekunden zurueck
    pub fn uptime_sek(&self) -> u64 {
        self.start_zeit.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config() {
        let config = RelayConfig::default();
        assert_eq!(config.lese_puffer_bytes, 1024);
    }

    #[test]
    fn broadcaster_und_registry_teilen_den_zustand() {
        let state = RelayState::neu(RelayConfig::default());
        assert_eq!(state.registry.anzahl(), 0);
    }
}
