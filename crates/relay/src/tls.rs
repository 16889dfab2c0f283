//! TLS-Acceptor aus Zertifikat und privatem Schluessel
//!
//! Zertifikat und Schluessel werden genau einmal beim Start geladen.
//! Ladefehler sind fatal; ein fehlgeschlagener Handshake einer einzelnen
//! Verbindung bleibt dagegen Sache des Accept-Loops.

use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use rustls_pemfile::{certs, private_key};
use tokio_rustls::TlsAcceptor;

use crate::error::{RelayError, RelayResult};

/// Laedt Zertifikat und Schluessel aus PEM-Dateien und baut den Acceptor
pub fn acceptor_erstellen(zert_pfad: &str, schluessel_pfad: &str) -> RelayResult<TlsAcceptor> {
    let zert_pem = std::fs::read_to_string(zert_pfad)
        .map_err(|e| RelayError::zertifikat(zert_pfad, e))?;
    let schluessel_pem = std::fs::read_to_string(schluessel_pfad)
        .map_err(|e| RelayError::schluessel(schluessel_pfad, e))?;
    acceptor_aus_pem(&zert_pem, &schluessel_pem)
}

/// Baut den Acceptor direkt aus PEM-Strings
pub fn acceptor_aus_pem(zert_pem: &str, schluessel_pem: &str) -> RelayResult<TlsAcceptor> {
    let zertifikate = parse_zertifikate(zert_pem)?;
    let schluessel = parse_schluessel(schluessel_pem)?;

    let tls_config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(zertifikate, schluessel)
        .map_err(|e| RelayError::TlsKonfiguration(e.to_string()))?;

    Ok(TlsAcceptor::from(Arc::new(tls_config)))
}

fn parse_zertifikate(pem: &str) -> RelayResult<Vec<CertificateDer<'static>>> {
    let mut cursor = std::io::Cursor::new(pem.as_bytes());
    certs(&mut cursor)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            RelayError::TlsKonfiguration(format!("Zertifikat-Parsing fehlgeschlagen: {}", e))
        })
}

fn parse_schluessel(pem: &str) -> RelayResult<PrivateKeyDer<'static>> {
    let mut cursor = std::io::Cursor::new(pem.as_bytes());
    private_key(&mut cursor)
        .map_err(|e| {
            RelayError::TlsKonfiguration(format!("Schluessel-Parsing fehlgeschlagen: {}", e))
        })?
        .ok_or_else(|| {
            RelayError::TlsKonfiguration("Kein privater Schluessel gefunden".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{CertificateParams, DistinguishedName, KeyPair};

    fn install_crypto_provider() {
        let _ = rustls::crypto::ring::default_provider().install_default();
    }

    /// Generiert ein selbstsigniertes Zertifikat als (Zertifikat-PEM, Schluessel-PEM)
    fn selbstsigniert(common_name: &str) -> (String, String) {
        let mut params = CertificateParams::new(vec![common_name.to_string()]).unwrap();
        let mut dn = DistinguishedName::new();
        dn.push(rcgen::DnType::CommonName, common_name);
        params.distinguished_name = dn;

        let key_pair = KeyPair::generate().unwrap();
        let cert = params.self_signed(&key_pair).unwrap();
        (cert.pem(), key_pair.serialize_pem())
    }

    #[test]
    fn acceptor_aus_gueltigem_pem() {
        install_crypto_provider();
        let (zert, schluessel) = selbstsigniert("relay-test");
        assert!(acceptor_aus_pem(&zert, &schluessel).is_ok());
    }

    #[test]
    fn acceptor_aus_ungueltigem_pem_schlaegt_fehl() {
        install_crypto_provider();
        let ergebnis = acceptor_aus_pem("ungueltig", "ungueltig");
        assert!(matches!(ergebnis, Err(RelayError::TlsKonfiguration(_))));
    }

    #[test]
    fn fehlende_zertifikatsdatei_ist_fatal() {
        install_crypto_provider();
        let ergebnis = acceptor_erstellen("/nirgendwo/cert.pem", "/nirgendwo/key.pem");
        assert!(matches!(ergebnis, Err(RelayError::Zertifikat { .. })));
    }

    #[test]
    fn acceptor_aus_dateien() {
        install_crypto_provider();
        let (zert, schluessel) = selbstsigniert("datei-test");

        let verzeichnis = std::env::temp_dir();
        let zert_pfad = verzeichnis.join(format!("relay-test-{}.pem", uuid::Uuid::new_v4()));
        let schluessel_pfad = verzeichnis.join(format!("relay-test-{}.key", uuid::Uuid::new_v4()));
        std::fs::write(&zert_pfad, zert).unwrap();
        std::fs::write(&schluessel_pfad, schluessel).unwrap();

        let ergebnis = acceptor_erstellen(
            zert_pfad.to_str().unwrap(),
            schluessel_pfad.to_str().unwrap(),
        );

        let _ = std::fs::remove_file(&zert_pfad);
        let _ = std::fs::remove_file(&schluessel_pfad);
        assert!(ergebnis.is_ok());
    }
}
