//! stammtisch-server – Bibliotheks-Root
//!
//! Verdrahtet Konfiguration, TLS-Setup und den Relay-Kern zu einem
//! lauffaehigen Server und stellt den Einstiegspunkt fuer
//! Integrationstests bereit.

pub mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;

use config::ServerConfig;
use stammtisch_relay::{tls, wire, ChatServer, RelayConfig, RelayState};

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet den Relay-Server und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Zertifikat und Schluessel laden (Fehler sind fatal)
    /// 2. TCP/TLS-Listener starten
    /// 3. Auf Ctrl-C / SIGTERM warten
    /// 4. SERVER:CLOSE an alle registrierten Clients, Listener stoppen
    pub async fn starten(self) -> Result<()> {
        let tls_acceptor = tls::acceptor_erstellen(
            &self.config.netzwerk.tls_zertifikat,
            &self.config.netzwerk.tls_schluessel,
        )
        .context("TLS-Setup fehlgeschlagen")?;

        let bind_addr: std::net::SocketAddr = self
            .config
            .tcp_bind_adresse()
            .parse()
            .with_context(|| {
                format!("Ungueltige Bind-Adresse '{}'", self.config.tcp_bind_adresse())
            })?;

        let state = RelayState::neu(RelayConfig {
            server_name: self.config.server.name.clone(),
            lese_puffer_bytes: self.config.netzwerk.lese_puffer_bytes,
        });

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let relay = ChatServer::neu(Arc::clone(&state), bind_addr);
        let mut listener_task = tokio::spawn(relay.starten(tls_acceptor, shutdown_rx));

        tracing::info!(
            adresse = %bind_addr,
            server = %self.config.server.name,
            "Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)..."
        );

        tokio::select! {
            // Listener endete von selbst (z.B. Bind-Fehler)
            ergebnis = &mut listener_task => {
                ergebnis??;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
                // Best-effort Abschied an alle noch registrierten Clients,
                // bevor der Listener-Socket geschlossen wird
                let benachrichtigt = state
                    .broadcaster
                    .an_alle_senden(wire::SERVER_SCHLIESSEN)
                    .await;
                tracing::info!(clients = benachrichtigt, "Abschiedsnachricht gesendet");
                let _ = shutdown_tx.send(true);
                listener_task.await??;
            }
        }

        Ok(())
    }
}
