//! Fehlertypen fuer das Relay
//!
//! Nur Startfehler (Zertifikat, Schluessel, Bind) duerfen den Prozess
//! beenden. Alles andere bleibt auf die betroffene Verbindung beschraenkt.

use thiserror::Error;

/// Fehlertyp fuer das Relay
#[derive(Debug, Error)]
pub enum RelayError {
    /// IO-Fehler (TCP, Socket)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Zertifikat konnte nicht geladen oder geparst werden (fatal beim Start)
    #[error("Zertifikat '{pfad}' nicht ladbar: {grund}")]
    Zertifikat { pfad: String, grund: String },

    /// Privater Schluessel konnte nicht geladen oder geparst werden (fatal beim Start)
    #[error("Privater Schluessel '{pfad}' nicht ladbar: {grund}")]
    Schluessel { pfad: String, grund: String },

    /// TLS-Serverkonfiguration ungueltig (fatal beim Start)
    #[error("TLS-Konfiguration ungueltig: {0}")]
    TlsKonfiguration(String),

    /// Bind auf die konfigurierte Adresse fehlgeschlagen (fatal beim Start)
    #[error("Bind auf {adresse} fehlgeschlagen: {quelle}")]
    Bind {
        adresse: String,
        #[source]
        quelle: std::io::Error,
    },

    /// TLS-Handshake einer einzelnen Verbindung fehlgeschlagen
    #[error("TLS-Handshake fehlgeschlagen: {0}")]
    Handshake(std::io::Error),
}

impl RelayError {
    /// Erstellt einen Zertifikatsfehler
    pub fn zertifikat(pfad: impl Into<String>, grund: impl std::fmt::Display) -> Self {
        Self::Zertifikat {
            pfad: pfad.into(),
            grund: grund.to_string(),
        }
    }

    /// Erstellt einen Schluesselfehler
    pub fn schluessel(pfad: impl Into<String>, grund: impl std::fmt::Display) -> Self {
        Self::Schluessel {
            pfad: pfad.into(),
            grund: grund.to_string(),
        }
    }
}

/// Result-Typ fuer das Relay
pub type RelayResult<T> = Result<T, RelayError>;
