//! WebSocket sessions.
//!
//! One task per connection reads client events and feeds them to the
//! tracker; a second task drains the client's outbound queue into the
//! socket. Closing the socket, or any read error, disconnects the client.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, warn};

use api_types::{ClientMessage, ErrorBody, RoomPayload, ServerMessage};
use bus_tracker_fleet::{ClientIdentifier, Room};

use crate::error::IngestError;
use crate::tracker::Tracker;
use crate::wire;

pub async fn upgrade(ws: WebSocketUpgrade, State(tracker): State<Tracker>) -> Response {
    ws.on_upgrade(move |socket| run_session(socket, tracker))
}

async fn run_session(socket: WebSocket, tracker: Tracker) {
    let (client, mut outbound) = tracker.connect();
    let (mut sink, mut stream) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let text = match serde_json::to_string(message.as_ref()) {
                Ok(text) => text,
                Err(error) => {
                    warn!(client_id = %client, %error, "failed to encode message");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(error) => {
                debug!(client_id = %client, %error, "socket read failed");
                break;
            }
        };

        let reply = match serde_json::from_str::<ClientMessage>(text.as_str()) {
            Ok(message) => handle_client_message(&tracker, client, message),
            Err(error) => Some(error_reply(format!("Malformed message: {error}"))),
        };

        if let Some(reply) = reply {
            if let Err(error) = tracker.hub.send(client, Arc::new(reply)) {
                warn!(client_id = %client, %error, "failed to queue reply");
            }
        }
    }

    // removing the hub entry drops the sender, which ends the writer
    tracker.disconnect(client);
    if let Err(error) = writer.await {
        debug!(client_id = %client, %error, "writer task ended abnormally");
    }
}

/// Apply one client event. Returns the reply for the sender, if any;
/// broadcasts triggered by the event go out through the hub.
pub fn handle_client_message(
    tracker: &Tracker,
    client: ClientIdentifier,
    message: ClientMessage,
) -> Option<ServerMessage> {
    match message {
        ClientMessage::Join(RoomPayload { room }) => match Room::parse(&room) {
            Ok(room) => {
                tracker.join(client, room.clone());
                Some(ServerMessage::Joined(RoomPayload {
                    room: room.to_string(),
                }))
            }
            Err(error) => Some(error_reply(error)),
        },
        ClientMessage::Leave(RoomPayload { room }) => match Room::parse(&room) {
            Ok(room) => {
                tracker.leave(client, &room);
                Some(ServerMessage::Left(RoomPayload {
                    room: room.to_string(),
                }))
            }
            Err(error) => Some(error_reply(error)),
        },
        ClientMessage::LocationUpdate(report) => {
            let result = wire::location_reading(&report)
                .map_err(IngestError::from)
                .and_then(|(vehicle, reading)| tracker.gateway.ingest_location(&vehicle, reading));
            result.err().map(error_reply)
        }
        ClientMessage::StatusUpdate(report) => {
            let result = wire::status_change(&report)
                .map_err(IngestError::from)
                .and_then(|(vehicle, status)| tracker.gateway.ingest_status(&vehicle, status));
            result.err().map(error_reply)
        }
        ClientMessage::Alert(report) => {
            let result = wire::alert_request(&report)
                .map_err(IngestError::from)
                .and_then(|(vehicle, kind)| {
                    tracker.gateway.ingest_alert(&vehicle, kind, &report.message)
                });
            result.err().map(error_reply)
        }
    }
}

fn error_reply(error: impl ToString) -> ServerMessage {
    ServerMessage::Error(ErrorBody::new(error.to_string()))
}
