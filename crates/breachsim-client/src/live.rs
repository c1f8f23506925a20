//! Live channel adapter: drives the session from the remote service.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use breachsim_core::protocol::{self, OutboundCommand};
use breachsim_core::session::SessionStore;
use breachsim_core::{BreachError, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;

/// An open duplex channel to the remote game service.
///
/// Owns a reader task (decodes frames, applies them to the store, tracks
/// liveness) and a writer task (serializes outbound commands). `close()` is
/// idempotent and detaches both.
pub struct LiveChannel {
    outbound: mpsc::Sender<Message>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
    liveness: Arc<AtomicBool>,
}

impl LiveChannel {
    /// Opens the channel, bounded by the configured connect-timeout.
    ///
    /// A channel that has not reached the open state by expiry is
    /// abandoned; that alone does not force mock mode.
    ///
    /// # Errors
    ///
    /// [`BreachError::Transport`] when the endpoint is unreachable or the
    /// handshake does not complete in time.
    pub async fn connect(config: &ClientConfig, store: SessionStore) -> Result<Self> {
        let url = config.ws_url()?;
        let connect = timeout(config.timing.connect_timeout, connect_async(url.as_str()));
        let (ws, _) = connect
            .await
            .map_err(|_| BreachError::transport("game channel connect timed out"))?
            .map_err(|e| BreachError::transport(e.to_string()))?;
        info!(target: "live", "game channel open: {url}");

        let (mut sink, mut stream) = ws.split();

        let (outbound, mut outbound_rx) = mpsc::channel::<Message>(32);
        let writer = tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                if sink.send(frame).await.is_err() {
                    debug!(target: "live", "send failed, channel gone");
                    break;
                }
            }
        });

        // Liveness resets to "not yet proven" on every open.
        let liveness = Arc::new(AtomicBool::new(false));
        let reader = {
            let liveness = liveness.clone();
            let hit_flash = config.timing.hit_flash;
            tokio::spawn(async move {
                while let Some(result) = stream.next().await {
                    let text = match result {
                        Ok(Message::Text(text)) => text,
                        Ok(Message::Close(_)) => {
                            info!(target: "live", "remote closed the game channel");
                            break;
                        }
                        Ok(_) => continue,
                        Err(e) => {
                            warn!(target: "live", "game channel error: {e}");
                            break;
                        }
                    };
                    let event = match protocol::decode(&text) {
                        Ok(event) => event,
                        Err(e) => {
                            // Malformed frames are dropped; state untouched.
                            warn!(target: "live", "dropping malformed frame: {e}");
                            continue;
                        }
                    };
                    if event.proves_liveness() {
                        liveness.store(true, Ordering::SeqCst);
                    }
                    if let Some(generation) = store.apply(event).await {
                        let store = store.clone();
                        tokio::spawn(async move {
                            tokio::time::sleep(hit_flash).await;
                            store.clear_hit(generation).await;
                        });
                    }
                }
            })
        };

        Ok(Self {
            outbound,
            reader,
            writer,
            liveness,
        })
    }

    /// Whether a liveness-proving event has arrived since the channel
    /// opened. Once true, stays true for the life of the channel.
    pub fn liveness_proven(&self) -> bool {
        self.liveness.load(Ordering::SeqCst)
    }

    /// Serializes and sends one command.
    pub async fn send(&self, command: OutboundCommand) -> Result<()> {
        let frame = command.encode()?;
        self.outbound
            .send(Message::Text(frame))
            .await
            .map_err(|_| BreachError::transport("game channel closed"))
    }

    /// Tears the channel down. Idempotent; safe to call repeatedly. No
    /// further inbound frame can mutate the session afterwards.
    pub fn close(&self) {
        self.reader.abort();
        self.writer.abort();
    }
}

impl Drop for LiveChannel {
    fn drop(&mut self) {
        self.close();
    }
}
