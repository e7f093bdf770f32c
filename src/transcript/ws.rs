use anyhow::{Context, Result};
use futures::stream::{SplitSink, StreamExt};
use futures::SinkExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{info, warn};

use super::{TranscriptChannel, TranscriptMessage, TranscriptSink};

type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Open a websocket transcript channel
///
/// Splits the socket: the write half becomes the audio sink, the read half
/// is pumped into a message channel by a background task. Malformed incoming
/// payloads are ignored.
pub async fn connect(url: &str) -> Result<TranscriptChannel> {
    info!("connecting transcript channel to {}", url);

    let (socket, _response) = connect_async(url)
        .await
        .with_context(|| format!("failed to connect transcript socket to {}", url))?;

    let (writer, mut reader) = socket.split();
    let open = Arc::new(AtomicBool::new(true));
    let (tx, rx) = mpsc::channel(100);

    let pump_open = Arc::clone(&open);
    tokio::spawn(async move {
        while let Some(message) = reader.next().await {
            match message {
                Ok(Message::Text(text)) => match serde_json::from_str::<TranscriptMessage>(&text) {
                    Ok(parsed) => {
                        if tx.send(parsed).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("ignoring malformed transcript payload: {}", e),
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("transcript socket error: {}", e);
                    break;
                }
            }
        }
        pump_open.store(false, Ordering::SeqCst);
        info!("transcript receive pump stopped");
    });

    let sink = WsSink { writer, open };
    Ok(TranscriptChannel::new(Box::new(sink), rx))
}

struct WsSink {
    writer: WsWriter,
    open: Arc<AtomicBool>,
}

#[async_trait::async_trait]
impl TranscriptSink for WsSink {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn send_audio(&mut self, fragment: &[u8]) -> Result<()> {
        if !self.is_open() {
            return Ok(());
        }
        if let Err(e) = self.writer.send(Message::Binary(fragment.to_vec())).await {
            self.open.store(false, Ordering::SeqCst);
            return Err(e).context("failed to send audio fragment over transcript socket");
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if !self.open.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        if let Err(e) = self.writer.send(Message::Close(None)).await {
            warn!("transcript socket close failed: {}", e);
        }
        Ok(())
    }
}
