//! stammtisch-relay – TCP/TLS Broadcast-Relay
//!
//! Dieser Crate implementiert den kompletten Verbindungs- und
//! Broadcast-Kern des Stammtisch-Servers: Verbindungen annehmen, per TLS
//! sichern, Clients registrieren und Nachrichten an alle anderen
//! Mitglieder verteilen.
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (ChatServer)
//!     |
//!     v
//! TLS-Handshake (tls::acceptor_*) – pro Verbindung, im eigenen Task
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |  State Machine: WarteAufName -> Aktiv -> Geschlossen
//!     |
//!     +-- ClientRegistry  – Wer ist verbunden (einziger geteilter Zustand)
//!     +-- Broadcaster     – Uebersicht, Chat-Weiterleitung, Beitritt/Abschied
//! ```
//!
//! Das Protokoll ist bewusst unframed: eine Nachricht ist genau das, was
//! ein einzelner Read liefert (siehe `wire`).

pub mod broadcast;
pub mod connection;
pub mod error;
pub mod kanal;
pub mod registry;
pub mod state;
pub mod tcp;
pub mod tls;
pub mod types;
pub mod wire;

// Bequeme Re-Exporte
pub use broadcast::Broadcaster;
pub use connection::{ClientConnection, VerbindungsZustand};
pub use error::{RelayError, RelayResult};
pub use registry::{Client, ClientRegistry};
pub use state::{RelayConfig, RelayState};
pub use tcp::ChatServer;
pub use types::ClientId;
