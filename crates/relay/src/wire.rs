//! Protokolltexte des Relays
//!
//! Das Protokoll ist zeilenlos und unframed: eine Nachricht ist genau das,
//! was ein einzelner Read liefert. Die ANSI-Farbmarker sind reine Kosmetik
//! fuer Terminal-Clients und duerfen von niemandem als Syntax geparst werden.

use std::net::IpAddr;

/// Bestaetigung an einen frisch registrierten Client
pub const SERVER_ERFOLG: &[u8] = b"SERVER:SUCCESS";

/// Abschiedsnachricht beim geordneten Server-Shutdown
pub const SERVER_SCHLIESSEN: &[u8] = b"SERVER:CLOSE";

// Kosmetische Farbmarker (Terminal-Darstellung, keine Protokollsyntax)
const ROT: &str = "\x1b[31m";
const GRUEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

/// Baut die Chat-Weiterleitung `<name>: <nachricht>`
///
/// Der Nachrichteninhalt wird verlustbehaftet als UTF-8 interpretiert,
/// genau wie der Anzeigename beim Beitritt.
pub fn chat_nachricht(name: &str, nachricht: &[u8]) -> Vec<u8> {
    let text = String::from_utf8_lossy(nachricht);
    format!("{ROT}{name}:{RESET} {text}").into_bytes()
}

/// Baut die Beitrittsankuendigung `SERVER: <name> connected from <ip>`
pub fn beitritt_nachricht(name: &str, adresse: IpAddr) -> Vec<u8> {
    format!("SERVER: {GRUEN}{name} connected from {adresse} {RESET}").into_bytes()
}

/// Baut die Abschiedsankuendigung `SERVER: <name> disconnected`
pub fn abschied_nachricht(name: &str) -> Vec<u8> {
    format!("SERVER: {GRUEN}{name} disconnected {RESET}").into_bytes()
}

/// Baut die Mitglieder-Uebersicht fuer einen neuen Client
///
/// Ein Eintrag `<name> from <ip>` pro bereits verbundenem Mitglied,
/// zeilenweise verbunden.
pub fn uebersicht_nachricht(mitglieder: &[(String, IpAddr)]) -> Vec<u8> {
    let eintraege: Vec<String> = mitglieder
        .iter()
        .map(|(name, adresse)| format!("{name} from {adresse}"))
        .collect();
    format!(
        "SERVER: {GRUEN}TOTAL USERS CONNECTED:\n{RESET}{ROT}{} {RESET}",
        eintraege.join("\n")
    )
    .into_bytes()
}
