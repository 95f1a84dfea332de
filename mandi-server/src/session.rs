//! Chat session coordinator.
//!
//! Per-connection WebSocket handling and protocol orchestration: joins,
//! message relay, the delayed simulated-supplier reply, and deal emission.
//!
//! Connection lifecycle:
//! 1. Assign a [`ConnectionId`] and spawn a writer task draining an
//!    unbounded channel into the socket.
//! 2. Reader loop: decode each text frame as a [`ClientEvent`] and
//!    dispatch it.
//! 3. On disconnect, remove the connection from the registry (dropping
//!    any room it leaves empty).
//!
//! Ordering guarantee: a vendor's message is broadcast to the room before
//! its reply task is even spawned, so every consumer observes
//! offer-then-reply order for a given message. Replies to different
//! messages run on independent timers and may interleave.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use mandi_proto::catalog::Product;
use mandi_proto::codec;
use mandi_proto::event::{ClientEvent, Role, Sender, ServerEvent};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::catalog::CatalogStore;
use crate::negotiate::{self, DEAL_DISTANCE, SUPPLIER_CONTACT};
use crate::rooms::{ConnectionId, Participant, RoomRegistry};

/// Default simulated typing delay before the supplier's reply.
pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(1500);

/// Shared server state: the read-only catalog, the room registry, and the
/// configured reply delay.
pub struct ServerState {
    /// Product catalog (read-only after startup).
    pub catalog: CatalogStore,
    /// Room membership and negotiation bookkeeping.
    pub rooms: RoomRegistry,
    /// Delay between a vendor's offer and the simulated reply.
    pub reply_delay: Duration,
}

impl ServerState {
    /// Creates server state over a catalog with the default reply delay.
    #[must_use]
    pub fn new(catalog: CatalogStore) -> Self {
        Self::with_reply_delay(catalog, DEFAULT_REPLY_DELAY)
    }

    /// Creates server state with an explicit reply delay.
    #[must_use]
    pub fn with_reply_delay(catalog: CatalogStore, reply_delay: Duration) -> Self {
        Self {
            catalog,
            rooms: RoomRegistry::new(),
            reply_delay,
        }
    }
}

/// Handles an upgraded WebSocket connection for its whole lifetime.
pub async fn handle_socket(socket: WebSocket, state: Arc<ServerState>) {
    let connection_id = ConnectionId::new();
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Channel feeding this connection's writer task. Room broadcasts and
    // private sends all go through it.
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let writer_conn = connection_id;
    let mut write_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                tracing::warn!(connection = %writer_conn, "WebSocket write failed");
                break;
            }
        }
    });

    let reader_state = Arc::clone(&state);
    let reader_tx = tx.clone();
    let mut read_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_receiver.next().await {
            match msg {
                Message::Text(text) => {
                    handle_frame(connection_id, &text, &reader_tx, &reader_state).await;
                }
                Message::Close(_) => {
                    tracing::debug!(connection = %connection_id, "received close frame");
                    break;
                }
                _ => {
                    // Ignore binary, ping, pong frames.
                }
            }
        }
    });

    tokio::select! {
        _ = &mut read_task => {
            write_task.abort();
        }
        _ = &mut write_task => {
            read_task.abort();
        }
    }

    state.rooms.leave(connection_id).await;
    tracing::info!(connection = %connection_id, "connection closed");
}

/// Decodes and dispatches one inbound text frame.
async fn handle_frame(
    connection_id: ConnectionId,
    text: &str,
    tx: &mpsc::UnboundedSender<Message>,
    state: &Arc<ServerState>,
) {
    let event = match codec::decode_client(text) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(connection = %connection_id, error = %e, "failed to decode event");
            return;
        }
    };

    match event {
        ClientEvent::JoinChat {
            chat_room,
            product_name: _,
            role,
            mobile,
        } => {
            handle_join(connection_id, &chat_room, role, mobile, tx, state).await;
        }
        ClientEvent::SendMessage {
            chat_room,
            user,
            message,
            mobile,
        } => {
            handle_message(connection_id, &chat_room, user, message, mobile, state).await;
        }
    }
}

/// Adds the connection to the room and sends the private welcome.
async fn handle_join(
    connection_id: ConnectionId,
    chat_room: &str,
    role: Role,
    mobile: String,
    tx: &mpsc::UnboundedSender<Message>,
    state: &Arc<ServerState>,
) {
    let participant = Participant {
        connection_id,
        role,
        mobile,
    };
    let count = state
        .rooms
        .join(chat_room, participant, tx.clone())
        .await;
    tracing::info!(
        connection = %connection_id,
        room = %chat_room,
        role = ?role,
        members = count,
        "participant joined room"
    );

    // Private welcome, not a room broadcast. An unknown product id still
    // gets a generic welcome — joining never fails.
    let welcome = state.catalog.get(chat_room).map_or_else(
        || "Welcome to the chat for this product! You can now negotiate the price.".to_string(),
        |product| {
            format!(
                "Welcome to the chat for {}! MRP: \u{20b9}{}/{}. You can now negotiate the price.",
                product.name, product.mrp, product.unit
            )
        },
    );
    send_private(
        tx,
        &ServerEvent::ChatMessage {
            user: Sender::System,
            message: welcome,
            is_system: true,
        },
    );
}

/// Relays a message to the room and, for vendor messages, schedules the
/// simulated supplier reply.
///
/// The sender's role and contact come from the [`Participant`] record made
/// at join time; the payload's copies are used only for connections that
/// never joined.
async fn handle_message(
    connection_id: ConnectionId,
    chat_room: &str,
    user: Role,
    message: String,
    mobile: String,
    state: &Arc<ServerState>,
) {
    let (user, mobile) = match state.rooms.participant(connection_id).await {
        Some(p) => (p.role, p.mobile),
        None => (user, mobile),
    };
    tracing::debug!(
        connection = %connection_id,
        room = %chat_room,
        role = ?user,
        "relaying message"
    );

    // Echo the message to the whole room first; the reply (if any) always
    // trails it.
    state
        .rooms
        .broadcast(
            chat_room,
            &ServerEvent::ChatMessage {
                user: Sender::from(user),
                message: message.clone(),
                is_system: false,
            },
        )
        .await;

    let Some(product) = state.catalog.get(chat_room) else {
        tracing::warn!(room = %chat_room, "product not found for chat room, skipping reply");
        return;
    };

    // Only the initiating (vendor) side triggers the simulated
    // counterparty, and only while the room has no finalized deal.
    if user == Role::Vendor && !state.rooms.is_finalized(chat_room).await {
        schedule_reply(state, chat_room, product.clone(), message, mobile).await;
    }
}

/// Spawns the delayed supplier reply for one vendor message.
///
/// The task sleeps for the configured delay, re-checks that the room is
/// still open, evaluates the offer, broadcasts the reply, and — if the
/// engine accepted — emits the single `deal_finalized` event. Its abort
/// handle lives in the room's pending set so finalization or room
/// teardown can cancel it.
async fn schedule_reply(
    state: &Arc<ServerState>,
    chat_room: &str,
    product: Product,
    message: String,
    mobile: String,
) {
    let task_id = Uuid::now_v7();
    let task_state = Arc::clone(state);
    let room = chat_room.to_string();

    let handle = tokio::spawn(async move {
        tokio::time::sleep(task_state.reply_delay).await;

        // A deal may have been finalized while this reply was pending.
        if task_state.rooms.is_finalized(&room).await {
            task_state.rooms.complete_reply(&room, task_id).await;
            return;
        }

        let outcome = negotiate::evaluate(&message, &product);
        task_state
            .rooms
            .broadcast(
                &room,
                &ServerEvent::ChatMessage {
                    user: Sender::Supplier,
                    message: outcome.reply,
                    is_system: false,
                },
            )
            .await;

        if let Some(final_price) = outcome.deal
            && task_state.rooms.finalize(&room, task_id).await
        {
            tracing::info!(room = %room, final_price, "deal finalized");
            task_state
                .rooms
                .broadcast(
                    &room,
                    &ServerEvent::DealFinalized {
                        final_price,
                        supplier_contact: SUPPLIER_CONTACT.to_string(),
                        vendor_contact: mobile,
                        distance: DEAL_DISTANCE.to_string(),
                    },
                )
                .await;
        }

        task_state.rooms.complete_reply(&room, task_id).await;
    });

    // Registration can lose a race against room teardown or a concurrent
    // finalization; if it does, the reply must not fire into a dead room.
    if !state
        .rooms
        .register_reply(chat_room, task_id, handle.abort_handle())
        .await
    {
        handle.abort();
    }
}

/// Sends an event directly to one connection.
fn send_private(tx: &mpsc::UnboundedSender<Message>, event: &ServerEvent) {
    match codec::encode_server(event) {
        Ok(text) => {
            let _ = tx.send(Message::Text(text.into()));
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to encode private event");
        }
    }
}
