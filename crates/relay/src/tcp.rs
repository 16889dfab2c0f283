//! TCP-Listener – Bindet Socket, akzeptiert Verbindungen
//!
//! Der `ChatServer` bindet einen TCP-Socket und startet fuer jede
//! eingehende Verbindung einen eigenen tokio-Task, der erst den
//! TLS-Handshake ausfuehrt und dann die `ClientConnection` treibt.
//! Ein fehlgeschlagener Handshake betrifft nur die eine Verbindung;
//! der Accept-Loop laeuft weiter. Es gibt kein Verbindungslimit.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_rustls::TlsAcceptor;

use crate::connection::ClientConnection;
use crate::error::{RelayError, RelayResult};
use crate::state::RelayState;

/// TCP/TLS Chat-Relay-Server
///
/// Der Accept-Loop ist die einzige langlebige serielle Operation;
/// er laeuft bis `shutdown_rx` ein `true`-Signal empfaengt.
pub struct ChatServer {
    state: Arc<RelayState>,
    bind_addr: SocketAddr,
}

impl ChatServer {
    /// Erstellt einen neuen ChatServer
    pub fn neu(state: Arc<RelayState>, bind_addr: SocketAddr) -> Self {
        Self { state, bind_addr }
    }

    /// Gibt die Bind-Adresse zurueck
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Bindet den Socket und startet den Accept-Loop
    ///
    /// Ein Bind-Fehler ist ein Startfehler und bricht ab, bevor irgendeine
    /// Verbindung angenommen wurde.
    pub async fn starten(
        self,
        tls_acceptor: TlsAcceptor,
        shutdown_rx: watch::Receiver<bool>,
    ) -> RelayResult<()> {
        let listener = TcpListener::bind(self.bind_addr)
            .await
            .map_err(|e| RelayError::Bind {
                adresse: self.bind_addr.to_string(),
                quelle: e,
            })?;
        self.mit_listener(listener, tls_acceptor, shutdown_rx).await
    }

    /// Accept-Loop ueber einem bereits gebundenen Listener
    ///
    /// Separater Einstiegspunkt fuer Tests und als Naht, hinter der sich
    /// der Accept-zu-Spawn-Schritt austauschen laesst.
    pub async fn mit_listener(
        self,
        listener: TcpListener,
        tls_acceptor: TlsAcceptor,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> RelayResult<()> {
        let lokale_adresse = listener.local_addr()?;
        tracing::info!(
            adresse = %lokale_adresse,
            server = %self.state.config.server_name,
            "Relay-Server gestartet"
        );

        loop {
            tokio::select! {
                ergebnis = listener.accept() => {
                    match ergebnis {
                        Ok((stream, peer_addr)) => {
                            verbindung_abfertigen(
                                stream,
                                peer_addr,
                                tls_acceptor.clone(),
                                Arc::clone(&self.state),
                                shutdown_rx.clone(),
                            );
                        }
                        Err(e) => {
                            tracing::error!(fehler = %e, "TCP-Accept-Fehler");
                            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        }
                    }
                }
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Relay-Server: Shutdown-Signal empfangen");
                        break;
                    }
                }
            }
        }

        tracing::info!(uptime_sek = self.state.uptime_sek(), "Relay-Server gestoppt");
        Ok(())
    }
}

/// Accept-zu-Spawn-Schritt: ein eigener Task pro akzeptierter Verbindung
///
/// Der Handshake laeuft im Task der Verbindung, damit ein zaeher oder
/// boeswilliger Client den Accept-Loop nie aufhaelt.
fn verbindung_abfertigen(
    stream: TcpStream,
    peer_addr: SocketAddr,
    tls_acceptor: TlsAcceptor,
    state: Arc<RelayState>,
    shutdown_rx: watch::Receiver<bool>,
) {
    tokio::spawn(async move {
        match tls_acceptor.accept(stream).await {
            Ok(tls_stream) => {
                tracing::debug!(peer = %peer_addr, "TLS-Verbindung aufgebaut");
                ClientConnection::neu(state, peer_addr)
                    .verarbeiten(tls_stream, shutdown_rx)
                    .await;
            }
            Err(e) => {
                let fehler = RelayError::Handshake(e);
                tracing::warn!(peer = %peer_addr, fehler = %fehler, "TLS-Handshake fehlgeschlagen");
            }
        }
    });
}
