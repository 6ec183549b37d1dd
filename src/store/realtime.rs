//! WebSocket client for the hosted backend's realtime feed.
//!
//! One channel per subscribed collection: connect, subscribe, forward
//! parsed document events into a broadcast sender, reconnect on drop.

use super::{Document, DocumentEvent, EventKind};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Delay before reconnecting after a dropped connection.
const RECONNECT_DELAY_SECS: u64 = 5;

/// Keepalive ping interval.
const PING_INTERVAL_SECS: u64 = 30;

/// Subscription request sent after connecting.
#[derive(Debug, Serialize)]
struct SubscribeMessage {
    #[serde(rename = "type")]
    msg_type: String,
    channels: Vec<String>,
}

/// A message from the realtime feed.
#[derive(Debug, Deserialize)]
struct RealtimeMessage {
    #[serde(rename = "type")]
    msg_type: String,
    #[serde(default)]
    event: Option<EventKind>,
    #[serde(default)]
    payload: Option<Document>,
}

/// Reader task for one collection's realtime channel.
pub struct RealtimeChannel {
    url: String,
    channel: String,
    collection: String,
    tx: broadcast::Sender<DocumentEvent>,
}

impl RealtimeChannel {
    /// Spawn the reader task. It runs for the life of the process,
    /// reconnecting with a fixed delay whenever the connection drops.
    pub fn spawn(
        url: String,
        channel: String,
        collection: String,
        tx: broadcast::Sender<DocumentEvent>,
    ) {
        let reader = Self {
            url,
            channel,
            collection,
            tx,
        };
        tokio::spawn(async move {
            reader.run().await;
        });
    }

    async fn run(&self) {
        loop {
            match self.run_connection().await {
                Ok(_) => {
                    warn!(
                        "Realtime channel '{}' disconnected, reconnecting...",
                        self.channel
                    );
                }
                Err(e) => {
                    error!(
                        "Realtime channel '{}' error: {}, reconnecting...",
                        self.channel, e
                    );
                }
            }
            tokio::time::sleep(tokio::time::Duration::from_secs(RECONNECT_DELAY_SECS)).await;
        }
    }

    async fn run_connection(&self) -> anyhow::Result<()> {
        info!("Connecting to realtime feed for '{}'", self.collection);

        let (ws_stream, _) = connect_async(&self.url).await?;
        let (mut write, mut read) = ws_stream.split();

        let subscribe = SubscribeMessage {
            msg_type: "subscribe".to_string(),
            channels: vec![self.channel.clone()],
        };
        write
            .send(Message::Text(serde_json::to_string(&subscribe)?))
            .await?;
        info!("Subscribed to realtime channel '{}'", self.channel);

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_message(&text);
                        }
                        Some(Ok(Message::Ping(data))) => {
                            let _ = write.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) => {
                            info!("Realtime channel '{}' closed", self.channel);
                            break;
                        }
                        Some(Err(e)) => {
                            error!("Realtime read error on '{}': {}", self.channel, e);
                            break;
                        }
                        None => {
                            break;
                        }
                        _ => {}
                    }
                }
                // Keep the connection alive
                _ = tokio::time::sleep(tokio::time::Duration::from_secs(PING_INTERVAL_SECS)) => {
                    let _ = write.send(Message::Ping(vec![])).await;
                }
            }
        }

        Ok(())
    }

    fn handle_message(&self, text: &str) {
        let msg: RealtimeMessage = match serde_json::from_str(text) {
            Ok(m) => m,
            Err(_) => return,
        };

        if msg.msg_type != "event" {
            return;
        }

        let (kind, document) = match (msg.event, msg.payload) {
            (Some(kind), Some(document)) => (kind, document),
            _ => return,
        };

        debug!(
            "Realtime event on '{}': {:?} {}",
            self.collection, kind, document.id
        );

        // No receivers is fine; subscribers may come and go
        let _ = self.tx.send(DocumentEvent {
            collection: self.collection.clone(),
            kind,
            document,
        });
    }
}
