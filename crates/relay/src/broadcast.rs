//! Broadcast-Engine – Fan-out an alle (oder fast alle) Mitglieder
//!
//! Sendungen laufen synchron aus dem Task des ausloesenden Handlers ueber
//! einen Registry-Schnappschuss. Ein fehlgeschlagener Einzelversand wird
//! geloggt und verschluckt; der betroffene Eintrag bleibt stehen, bis sein
//! eigener Handler die Trennung in der Leseschleife bemerkt.

use crate::registry::{Client, ClientRegistry};
use crate::types::ClientId;
use crate::wire;

/// Verteilt Nachrichten an die Mitglieder der Registry
#[derive(Clone)]
pub struct Broadcaster {
    registry: ClientRegistry,
}

impl Broadcaster {
    /// Erstellt einen Broadcaster ueber der gegebenen Registry
    pub fn neu(registry: ClientRegistry) -> Self {
        Self { registry }
    }

    /// Sendet rohe Bytes an alle Mitglieder
    ///
    /// Gibt die Anzahl erfolgreicher Sendungen zurueck.
    pub async fn an_alle_senden(&self, daten: &[u8]) -> usize {
        let mut gesendet = 0;
        for mitglied in self.registry.schnappschuss() {
            if senden_an(&mitglied, daten).await {
                gesendet += 1;
            }
        }
        gesendet
    }

    /// Sendet rohe Bytes an alle Mitglieder ausser einem
    pub async fn an_alle_ausser_senden(&self, ausgeschlossen: &ClientId, daten: &[u8]) -> usize {
        let mut gesendet = 0;
        for mitglied in self.registry.schnappschuss() {
            if mitglied.id == *ausgeschlossen {
                continue;
            }
            if senden_an(&mitglied, daten).await {
                gesendet += 1;
            }
        }
        gesendet
    }

    /// Leitet eine Chat-Nachricht an alle ausser dem Absender weiter
    pub async fn chat_weiterleiten(&self, absender: &Client, nachricht: &[u8]) -> usize {
        let daten = wire::chat_nachricht(&absender.name, nachricht);
        self.an_alle_ausser_senden(&absender.id, &daten).await
    }

    /// Kuendigt einen Beitritt bei allen anderen Mitgliedern an
    pub async fn beitritt_ankuendigen(&self, client: &Client) -> usize {
        let daten = wire::beitritt_nachricht(&client.name, client.adresse.ip());
        self.an_alle_ausser_senden(&client.id, &daten).await
    }

    /// Kuendigt einen Abschied bei allen verbleibenden Mitgliedern an
    pub async fn abschied_ankuendigen(&self, client: &Client) -> usize {
        let daten = wire::abschied_nachricht(&client.name);
        self.an_alle_ausser_senden(&client.id, &daten).await
    }

    /// Sendet einem neuen Mitglied die Uebersicht der anderen Mitglieder
    ///
    /// Der Empfaenger selbst taucht nie in der Liste auf. Ohne andere
    /// Mitglieder wird nichts gesendet.
    pub async fn uebersicht_senden(&self, neues_mitglied: &Client) {
        let andere: Vec<(String, std::net::IpAddr)> = self
            .registry
            .schnappschuss()
            .into_iter()
            .filter(|mitglied| mitglied.id != neues_mitglied.id)
            .map(|mitglied| (mitglied.name, mitglied.adresse.ip()))
            .collect();

        if andere.is_empty() {
            return;
        }

        let daten = wire::uebersicht_nachricht(&andere);
        senden_an(neues_mitglied, &daten).await;
    }
}

/// Einzelversand mit Verschluck-Semantik
///
/// Der Registry-Eintrag des Empfaengers wird hier nie entfernt, damit der
/// besitzende Handler nicht mit einem fremden Teardown konkurriert.
async fn senden_an(mitglied: &Client, daten: &[u8]) -> bool {
    match mitglied.sender.senden(daten).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                client = %mitglied.id,
                name = %mitglied.name,
                fehler = %e,
                "Sendung an Mitglied fehlgeschlagen, wird verworfen"
            );
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
