//! Client-Registry – Wer ist gerade verbunden?
//!
//! Die Registry ist der einzige geteilte veraenderliche Zustand des Relays.
//! Eintraege werden ausschliesslich vom besitzenden Connection-Handler
//! angelegt und entfernt; der Broadcaster liest Schnappschuesse aus
//! beliebigen Tasks.

use std::net::SocketAddr;
use std::sync::Arc;

use dashmap::DashMap;

use crate::kanal::NachrichtenSenke;
use crate::types::ClientId;

/// Ein verbundener Teilnehmer
///
/// Ein Client existiert erst, wenn sein Handler den Namens-Frame erhalten
/// hat, und verschwindet mit dem Teardown. Halb-angelegte Eintraege sind
/// nicht moeglich: eingefuegt wird immer ein vollstaendig konstruierter Wert.
#[derive(Clone)]
pub struct Client {
    /// Verbindungs-Identitaet, beim Accept vergeben
    pub id: ClientId,
    /// Selbstgewaehlter Anzeigename, nicht validiert, nicht eindeutig
    pub name: String,
    /// Peer-Adresse zum Accept-Zeitpunkt (nur fuer Ankuendigungstexte)
    pub adresse: SocketAddr,
    /// Sende-Seite des gesicherten Kanals
    pub sender: Arc<dyn NachrichtenSenke>,
}

impl Client {
    /// Erstellt einen neuen Client mit frischer ClientId
    pub fn neu(name: String, adresse: SocketAddr, sender: Arc<dyn NachrichtenSenke>) -> Self {
        Self {
            id: ClientId::new(),
            name,
            adresse,
            sender,
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("adresse", &self.adresse)
            .finish()
    }
}

/// Registry aller aktuell verbundenen Clients
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct ClientRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    clients: DashMap<ClientId, Client>,
}

impl ClientRegistry {
    /// Erstellt eine leere Registry
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                clients: DashMap::new(),
            }),
        }
    }

    /// Traegt einen Client ein
    pub fn anmelden(&self, client: Client) {
        tracing::debug!(client = %client.id, name = %client.name, "Client angemeldet");
        self.inner.clients.insert(client.id, client);
    }

    /// Entfernt einen Client
    ///
    /// Idempotent: gibt `false` zurueck wenn der Eintrag bereits weg war.
    pub fn abmelden(&self, id: &ClientId) -> bool {
        let entfernt = self.inner.clients.remove(id).is_some();
        if entfernt {
            tracing::debug!(client = %id, "Client abgemeldet");
        }
        entfernt
    }

    /// Prueft ob ein Client eingetragen ist
    pub fn ist_angemeldet(&self, id: &ClientId) -> bool {
        self.inner.clients.contains_key(id)
    }

    /// Gibt die Anzahl eingetragener Clients zurueck
    pub fn anzahl(&self) -> usize {
        self.inner.clients.len()
    }

    /// Momentaufnahme aller Eintraege fuer die Broadcast-Iteration
    ///
    /// Die zurueckgegebene Liste ist ein eigener Vec; waehrend der Iteration
    /// wird kein Map-Guard gehalten, sodass Sendungen nie eine parallele
    /// An- oder Abmeldung blockieren.
    pub fn schnappschuss(&self) -> Vec<Client> {
        self.inner
            .clients
            .iter()
            .map(|eintrag| eintrag.value().clone())
            .collect()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StummeSenke;

    #[async_trait]
    impl NachrichtenSenke for StummeSenke {
        async fn senden(&self, _daten: &[u8]) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn test_client(name: &str) -> Client {
        Client::neu(
            name.to_string(),
            "127.0.0.1:4711".parse().unwrap(),
            Arc::new(StummeSenke),
        )
    }

    #[test]
    fn anmelden_und_abmelden() {
        let registry = ClientRegistry::neu();
        let client = test_client("alice");
        let id = client.id;

        registry.anmelden(client);
        assert!(registry.ist_angemeldet(&id));
        assert_eq!(registry.anzahl(), 1);

        assert!(registry.abmelden(&id));
        assert!(!registry.ist_angemeldet(&id));
        assert_eq!(registry.anzahl(), 0);
    }

    #[test]
    fn abmelden_ist_idempotent() {
        let registry = ClientRegistry::neu();
        let client = test_client("bob");
        let id = client.id;

        registry.anmelden(client);
        assert!(registry.abmelden(&id));
        // Zweites Abmelden (z.B. Lesefehler nach bereits erkannter Trennung)
        assert!(!registry.abmelden(&id));
        assert_eq!(registry.anzahl(), 0);
    }

    #[test]
    fn schnappschuss_enthaelt_alle_eintraege() {
        let registry = ClientRegistry::neu();
        registry.anmelden(test_client("a"));
        registry.anmelden(test_client("b"));
        registry.anmelden(test_client("c"));

        let schnappschuss = registry.schnappschuss();
        assert_eq!(schnappschuss.len(), 3);
        let mut namen: Vec<&str> = schnappschuss.iter().map(|c| c.name.as_str()).collect();
        namen.sort_unstable();
        assert_eq!(namen, ["a", "b", "c"]);
    }

    #[test]
    fn clone_teilt_inneren_state() {
        let r1 = ClientRegistry::neu();
        let r2 = r1.clone();
        let client = test_client("shared");
        let id = client.id;

        r1.anmelden(client);
        assert!(r2.ist_angemeldet(&id));
    }

    #[tokio::test]
    async fn nebenlaeufige_mutation_und_iteration() {
        let registry = ClientRegistry::neu();

        let mut tasks = Vec::new();
        for i in 0..8 {
            let r = registry.clone();
            tasks.push(tokio::spawn(async move {
                for _ in 0..50 {
                    let client = test_client(&format!("client{}", i));
                    let id = client.id;
                    r.anmelden(client);
                    let _ = r.schnappschuss();
                    r.abmelden(&id);
                }
            }));
        }
        for task in tasks {
            task.await.expect("Task darf nicht abstuerzen");
        }

        assert_eq!(registry.anzahl(), 0);
    }
}
