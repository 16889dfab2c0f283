//! Kanal-Abstraktion ueber eine gesicherte Verbindung
//!
//! Nach dem TLS-Handshake wird der Stream geteilt: die Lesehaelfte bleibt
//! exklusiv beim Connection-Handler, die Schreibhaelfte wandert hinter den
//! `NachrichtenSenke`-Trait in die Registry, damit der Broadcaster von
//! fremden Tasks aus senden kann.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::Mutex;

/// Sende-Seite eines Client-Kanals
///
/// Implementierungen muessen nebenlaeufige Aufrufe serialisieren, damit sich
/// zwei gleichzeitige Broadcasts nicht byteweise vermischen.
#[async_trait]
pub trait NachrichtenSenke: Send + Sync {
    /// Sendet eine Nachricht vollstaendig an den Client
    async fn senden(&self, daten: &[u8]) -> std::io::Result<()>;
}

/// Schreibhaelfte eines geteilten Streams hinter einem Mutex
///
/// Der Mutex serialisiert Sendungen des eigenen Handlers und fremder
/// Broadcast-Tasks auf denselben Kanal.
pub struct KanalSender<S> {
    schreiber: Mutex<WriteHalf<S>>,
}

#[async_trait]
impl<S> NachrichtenSenke for KanalSender<S>
where
    S: AsyncWrite + Send + 'static,
{
    async fn senden(&self, daten: &[u8]) -> std::io::Result<()> {
        let mut schreiber = self.schreiber.lock().await;
        schreiber.write_all(daten).await?;
        schreiber.flush().await
    }
}

/// Teilt einen gesicherten Stream in Lesehaelfte und geteilten Sender
pub fn teilen<S>(stream: S) -> (ReadHalf<S>, Arc<KanalSender<S>>)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (lese, schreib) = tokio::io::split(stream);
    (
        lese,
        Arc::new(KanalSender {
            schreiber: Mutex::new(schreib),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn senden_schreibt_vollstaendig() {
        let (client, server) = tokio::io::duplex(256);
        let (_lese, sender) = teilen(server);

        sender.senden(b"hallo").await.unwrap();

        let (mut gegenseite, _) = tokio::io::split(client);
        let mut puffer = [0u8; 5];
        gegenseite.read_exact(&mut puffer).await.unwrap();
        assert_eq!(&puffer, b"hallo");
    }

    #[tokio::test]
    async fn nebenlaeufige_sendungen_vermischen_sich_nicht() {
        let (client, server) = tokio::io::duplex(4096);
        let (_lese, sender) = teilen(server);

        let a = Arc::clone(&sender);
        let b = Arc::clone(&sender);
        let t1 = tokio::spawn(async move { a.senden(&[b'a'; 100]).await });
        let t2 = tokio::spawn(async move { b.senden(&[b'b'; 100]).await });
        t1.await.unwrap().unwrap();
        t2.await.unwrap().unwrap();

        let (mut gegenseite, _) = tokio::io::split(client);
        let mut puffer = vec![0u8; 200];
        gegenseite.read_exact(&mut puffer).await.unwrap();

        // Jede Sendung muss als zusammenhaengender Block ankommen
        let erste = puffer[0];
        assert!(puffer[..100].iter().all(|&b| b == erste));
        assert!(puffer[100..].iter().all(|&b| b != erste));
    }

    #[tokio::test]
    async fn senden_auf_geschlossenem_kanal_schlaegt_fehl() {
        let (client, server) = tokio::io::duplex(64);
        let (_lese, sender) = teilen(server);
        drop(client);

        let ergebnis = sender.senden(b"verloren").await;
        assert!(ergebnis.is_err());
    }
}
