//! Client-Connection – Lebenszyklus einer einzelnen Verbindung
//!
//! Jede akzeptierte Verbindung bekommt eine `ClientConnection` in einem
//! eigenen tokio-Task.
//!
//! ## State Machine
//! ```text
//! WarteAufName -> Aktiv -> Geschlossen
//!      |                      ^
//!      +----------------------+   (kein Frame, Fehler, Shutdown)
//! ```
//!
//! Der Handler ist alleiniger Besitzer seines Registry-Eintrags: er meldet
//! sich selbst an und wieder ab. Ein Lesefehler wird wie eine Trennung
//! behandelt (fail closed). Es gibt bewusst keine Timeouts fuer laufende
//! Reads; ein haengender Client blockiert nur seinen eigenen Task.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::sync::watch;

use crate::kanal::{self, NachrichtenSenke};
use crate::registry::Client;
use crate::state::RelayState;
use crate::wire;

/// Zustand einer Client-Verbindung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbindungsZustand {
    /// Verbunden, wartet auf den Namens-Frame
    WarteAufName,
    /// Registriert, Leseschleife laeuft
    Aktiv,
    /// Terminal, Kanal freigegeben
    Geschlossen,
}

/// Verarbeitet eine einzelne gesicherte Verbindung
pub struct ClientConnection {
    state: Arc<RelayState>,
    peer_addr: SocketAddr,
}

impl ClientConnection {
    /// Erstellt eine neue ClientConnection
    pub fn neu(state: Arc<RelayState>, peer_addr: SocketAddr) -> Self {
        Self { state, peer_addr }
    }

    /// Startet die Verbindungs-Verarbeitung
    ///
    /// Laeuft bis der Client trennt, ein Lesefehler auftritt oder das
    /// Shutdown-Signal eingeht. Generisch ueber den Stream, damit Tests
    /// ohne TLS-Handshake auf Duplex-Streams laufen koennen.
    pub async fn verarbeiten<S>(self, stream: S, mut shutdown_rx: watch::Receiver<bool>)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let peer_addr = self.peer_addr;
        let mut zustand = VerbindungsZustand::WarteAufName;
        let (mut lese, sender) = kanal::teilen(stream);
        let mut puffer = vec![0u8; self.state.config.lese_puffer_bytes];

        tracing::info!(peer = %peer_addr, zustand = ?zustand, "Neue Verbindung");

        // Genau ein Read fuer den Anzeigenamen. Kein Frame oder Fehler:
        // Verbindung endet, ohne dass die Registry je beruehrt wurde.
        let gelesen = tokio::select! {
            ergebnis = lese.read(&mut puffer) => ergebnis.unwrap_or(0),
            Ok(()) = shutdown_rx.changed() => 0,
        };
        if gelesen == 0 {
            zustand = VerbindungsZustand::Geschlossen;
            tracing::debug!(peer = %peer_addr, zustand = ?zustand, "Verbindung ohne Namens-Frame beendet");
            return;
        }

        let name = String::from_utf8_lossy(&puffer[..gelesen]).into_owned();
        let client = Client::neu(name, peer_addr, sender.clone());

        // Mitgliederstand zum Zeitpunkt der eigenen Anmeldung entscheidet,
        // ob der Neue eine Uebersicht bekommt.
        let andere_vorhanden = self.state.registry.anzahl() > 0;
        self.state.registry.anmelden(client.clone());
        zustand = VerbindungsZustand::Aktiv;
        tracing::info!(peer = %peer_addr, name = %client.name, zustand = ?zustand, "Client registriert");

        // Bestaetigung auf dem eigenen Kanal. Schlaegt sie fehl, wurde noch
        // nichts angekuendigt: stiller Teardown ohne Abschiedsnotiz.
        if let Err(e) = sender.senden(wire::SERVER_ERFOLG).await {
            tracing::warn!(peer = %peer_addr, fehler = %e, "Bestaetigung nicht zustellbar");
            self.state.registry.abmelden(&client.id);
            return;
        }

        // Die Uebersicht muss vollstaendig auf dem Kanal des Neuen liegen,
        // bevor die anderen von seinem Beitritt erfahren.
        if andere_vorhanden {
            self.state.broadcaster.uebersicht_senden(&client).await;
        }
        self.state.broadcaster.beitritt_ankuendigen(&client).await;

        let mut stiller_abgang = false;
        loop {
            tokio::select! {
                ergebnis = lese.read(&mut puffer) => {
                    match ergebnis {
                        Ok(0) => {
                            tracing::info!(peer = %peer_addr, name = %client.name, "Client getrennt");
                            break;
                        }
                        Ok(n) => {
                            self.state.broadcaster.chat_weiterleiten(&client, &puffer[..n]).await;
                        }
                        Err(e) => {
                            tracing::warn!(peer = %peer_addr, name = %client.name, fehler = %e, "Lesefehler, Verbindung wird getrennt");
                            break;
                        }
                    }
                }
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::debug!(peer = %peer_addr, "Shutdown-Signal, Verbindung wird beendet");
                        stiller_abgang = true;
                        break;
                    }
                }
            }
        }

        // Erst ankuendigen, dann abmelden: die Engine schliesst den
        // Betroffenen selbst ohnehin aus. Beim Server-Shutdown entfaellt
        // die Abschiedsnotiz, SERVER:CLOSE kam bereits vom Shutdown-Pfad.
        if !stiller_abgang {
            self.state.broadcaster.abschied_ankuendigen(&client).await;
        }
        self.state.registry.abmelden(&client.id);
        zustand = VerbindungsZustand::Geschlossen;
        tracing::info!(peer = %peer_addr, name = %client.name, zustand = ?zustand, "Verbindungs-Task beendet");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
