//! WebSocket price stream.
//!
//! Clients connect to `/ws`, subscribe by stock symbol, and receive a
//! price update message whenever a subscribed stock's document changes on
//! the realtime feed.

use super::AppState;
use crate::services::StockService;
use crate::store::HostedStore;
use crate::types::PriceUpdate;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};

/// Messages a client may send.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Subscribe { symbols: Vec<String> },
    Unsubscribe { symbols: Vec<String> },
}

/// Messages pushed to the client.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    Subscribed { symbols: Vec<String> },
    PriceUpdate { data: PriceUpdate },
}

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.stocks.subscribe_events();
    let mut subscriptions: HashSet<String> = HashSet::new();

    info!("WebSocket client connected");

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let Ok(client_msg) = serde_json::from_str::<ClientMessage>(&text) else {
                            debug!("Ignoring malformed client message");
                            continue;
                        };

                        match client_msg {
                            ClientMessage::Subscribe { symbols } => {
                                for symbol in symbols {
                                    subscriptions.insert(symbol.to_uppercase());
                                }
                            }
                            ClientMessage::Unsubscribe { symbols } => {
                                for symbol in symbols {
                                    subscriptions.remove(&symbol.to_uppercase());
                                }
                            }
                        }

                        let ack = ServerMessage::Subscribed {
                            symbols: subscriptions.iter().cloned().collect(),
                        };
                        if let Ok(json) = serde_json::to_string(&ack) {
                            if sender.send(Message::Text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        let Some(update) =
                            StockService::<HostedStore>::price_update_from_event(&event)
                        else {
                            continue;
                        };
                        if !subscriptions.contains(&update.symbol) {
                            continue;
                        }

                        let msg = ServerMessage::PriceUpdate { data: update };
                        if let Ok(json) = serde_json::to_string(&msg) {
                            if sender.send(Message::Text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    // Slow consumers skip missed updates and keep going
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    info!("WebSocket client disconnected");
}
