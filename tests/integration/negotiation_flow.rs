//! End-to-end negotiation tests over a live server.
//!
//! Starts the real axum server on a random port, drives it with
//! WebSocket clients, and checks the full offer → reply → deal protocol:
//! threshold branches, greeting and re-prompt paths, unknown products,
//! and single-shot deal finalization.
//!
//! Verification command: `cargo test --test negotiation_flow`

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite;

use mandi_proto::codec;
use mandi_proto::event::{ClientEvent, Role, Sender, ServerEvent};
use mandi_server::api::start_server;
use mandi_server::catalog::CatalogStore;
use mandi_server::session::ServerState;

// =============================================================================
// Type aliases and helpers
// =============================================================================

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Short reply delay so tests stay fast; the protocol is delay-agnostic.
const TEST_REPLY_DELAY: Duration = Duration::from_millis(100);

/// How long to wait for an expected event before failing.
const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// How long a socket must stay quiet to count as "no further events".
const QUIET_WINDOW: Duration = Duration::from_millis(400);

/// Starts a server with the demo catalog on a random port.
async fn start_test_server() -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
    let state = Arc::new(ServerState::with_reply_delay(
        CatalogStore::with_demo_data(),
        TEST_REPLY_DELAY,
    ));
    start_server("127.0.0.1:0", state)
        .await
        .expect("failed to start test server")
}

/// Connects a WebSocket client to the test server.
async fn connect(addr: std::net::SocketAddr) -> WsStream {
    let url = format!("ws://{addr}/ws");
    let (ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
    ws
}

/// Sends a `join_chat` and returns the private welcome message text.
async fn join(ws: &mut WsStream, room: &str, role: Role, mobile: &str) -> String {
    let event = ClientEvent::JoinChat {
        chat_room: room.to_string(),
        product_name: String::new(),
        role,
        mobile: mobile.to_string(),
    };
    send_client_event(ws, &event).await;

    match recv_event(ws).await {
        ServerEvent::ChatMessage {
            user: Sender::System,
            message,
            is_system: true,
        } => message,
        other => panic!("expected system welcome, got {other:?}"),
    }
}

/// Sends a `send_message` event.
async fn send_message(ws: &mut WsStream, room: &str, role: Role, text: &str, mobile: &str) {
    let event = ClientEvent::SendMessage {
        chat_room: room.to_string(),
        user: role,
        message: text.to_string(),
        mobile: mobile.to_string(),
    };
    send_client_event(ws, &event).await;
}

async fn send_client_event(ws: &mut WsStream, event: &ClientEvent) {
    let text = codec::encode_client(event).unwrap();
    ws.send(tungstenite::Message::Text(text.into()))
        .await
        .unwrap();
}

/// Receives the next server event, failing after [`RECV_TIMEOUT`].
async fn recv_event(ws: &mut WsStream) -> ServerEvent {
    let msg = tokio::time::timeout(RECV_TIMEOUT, ws.next())
        .await
        .expect("timed out waiting for server event")
        .expect("connection closed")
        .expect("WebSocket read failed");
    match msg {
        tungstenite::Message::Text(text) => codec::decode_server(text.as_str()).unwrap(),
        other => panic!("expected text frame, got {other:?}"),
    }
}

/// Asserts that no further event arrives within the quiet window.
async fn assert_silent(ws: &mut WsStream) {
    let result = tokio::time::timeout(QUIET_WINDOW, ws.next()).await;
    assert!(result.is_err(), "expected silence, got {result:?}");
}

/// Receives the next event and asserts it is the vendor's own echo.
async fn expect_echo(ws: &mut WsStream, text: &str) {
    assert_eq!(
        recv_event(ws).await,
        ServerEvent::ChatMessage {
            user: Sender::Vendor,
            message: text.to_string(),
            is_system: false,
        }
    );
}

/// Receives the next event and returns the supplier reply text.
async fn expect_supplier_reply(ws: &mut WsStream) -> String {
    match recv_event(ws).await {
        ServerEvent::ChatMessage {
            user: Sender::Supplier,
            message,
            is_system: false,
        } => message,
        other => panic!("expected supplier reply, got {other:?}"),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn accepted_offer_finalizes_deal() {
    let (addr, _handle) = start_test_server().await;
    let mut ws = connect(addr).await;

    // p2 = Premium Tomatoes, mrp 40.
    let welcome = join(&mut ws, "p2", Role::Vendor, "9000000001").await;
    assert!(welcome.contains("Premium Tomatoes"), "got: {welcome}");
    assert!(welcome.contains("₹40"), "got: {welcome}");

    // 36 == 90% of 40: accept branch.
    send_message(&mut ws, "p2", Role::Vendor, "₹36/kg", "9000000001").await;
    expect_echo(&mut ws, "₹36/kg").await;

    let reply = expect_supplier_reply(&mut ws).await;
    assert!(reply.contains("I accept"), "got: {reply}");

    match recv_event(&mut ws).await {
        ServerEvent::DealFinalized {
            final_price,
            supplier_contact,
            vendor_contact,
            distance,
        } => {
            assert_eq!(final_price, 36);
            assert_eq!(supplier_contact, "9876543210");
            assert_eq!(vendor_contact, "9000000001");
            assert_eq!(distance, "5 km");
        }
        other => panic!("expected deal_finalized, got {other:?}"),
    }
}

#[tokio::test]
async fn low_offer_rejected_without_deal() {
    let (addr, _handle) = start_test_server().await;
    let mut ws = connect(addr).await;

    join(&mut ws, "p2", Role::Vendor, "9000000002").await;

    // 25 < 75% of 40: reject branch quoting the MRP.
    send_message(&mut ws, "p2", Role::Vendor, "₹25/kg", "9000000002").await;
    expect_echo(&mut ws, "₹25/kg").await;

    let reply = expect_supplier_reply(&mut ws).await;
    assert!(reply.contains("bit low"), "got: {reply}");
    assert!(reply.contains("40"), "got: {reply}");

    assert_silent(&mut ws).await;
}

#[tokio::test]
async fn mid_offer_gets_counter_probe() {
    let (addr, _handle) = start_test_server().await;
    let mut ws = connect(addr).await;

    join(&mut ws, "p2", Role::Vendor, "9000000003").await;

    // 32 is between 75% and 90% of 40.
    send_message(&mut ws, "p2", Role::Vendor, "₹32/kg", "9000000003").await;
    expect_echo(&mut ws, "₹32/kg").await;

    let reply = expect_supplier_reply(&mut ws).await;
    assert!(reply.contains("quantity"), "got: {reply}");

    assert_silent(&mut ws).await;
}

#[tokio::test]
async fn greeting_reply_names_supplier_and_mrp() {
    let (addr, _handle) = start_test_server().await;
    let mut ws = connect(addr).await;

    join(&mut ws, "p2", Role::Vendor, "9000000004").await;

    send_message(&mut ws, "p2", Role::Vendor, "hello", "9000000004").await;
    expect_echo(&mut ws, "hello").await;

    let reply = expect_supplier_reply(&mut ws).await;
    assert!(reply.contains("Green Farms"), "got: {reply}");
    assert!(reply.contains("₹40"), "got: {reply}");

    assert_silent(&mut ws).await;
}

#[tokio::test]
async fn malformed_offer_gets_reprompt() {
    let (addr, _handle) = start_test_server().await;
    let mut ws = connect(addr).await;

    join(&mut ws, "p2", Role::Vendor, "9000000005").await;

    send_message(&mut ws, "p2", Role::Vendor, "₹ please", "9000000005").await;
    expect_echo(&mut ws, "₹ please").await;

    let reply = expect_supplier_reply(&mut ws).await;
    assert!(reply.contains("specify your price offer"), "got: {reply}");
}

#[tokio::test]
async fn unknown_product_join_gets_generic_welcome() {
    let (addr, _handle) = start_test_server().await;
    let mut ws = connect(addr).await;

    let welcome = join(&mut ws, "no-such-product", Role::Vendor, "9000000006").await;
    assert!(welcome.contains("this product"), "got: {welcome}");

    // The message still echoes, but no reply is simulated without a product.
    send_message(
        &mut ws,
        "no-such-product",
        Role::Vendor,
        "₹10/kg",
        "9000000006",
    )
    .await;
    expect_echo(&mut ws, "₹10/kg").await;
    assert_silent(&mut ws).await;
}

#[tokio::test]
async fn no_second_deal_after_finalization() {
    let (addr, _handle) = start_test_server().await;
    let mut ws = connect(addr).await;

    // p5 = Potatoes, mrp 20; 19 >= 90% of 20.
    join(&mut ws, "p5", Role::Vendor, "9000000007").await;
    send_message(&mut ws, "p5", Role::Vendor, "₹19/kg", "9000000007").await;
    expect_echo(&mut ws, "₹19/kg").await;
    let reply = expect_supplier_reply(&mut ws).await;
    assert!(reply.contains("I accept"), "got: {reply}");
    assert!(matches!(
        recv_event(&mut ws).await,
        ServerEvent::DealFinalized { final_price: 19, .. }
    ));

    // Another acceptable offer after finalization: the room relays it but
    // schedules no reply and emits no second deal.
    send_message(&mut ws, "p5", Role::Vendor, "₹20/kg", "9000000007").await;
    expect_echo(&mut ws, "₹20/kg").await;
    assert_silent(&mut ws).await;
}

#[tokio::test]
async fn sender_identity_comes_from_join_record() {
    let (addr, _handle) = start_test_server().await;
    let mut ws = connect(addr).await;

    join(&mut ws, "p2", Role::Vendor, "9000000009").await;

    // The payload claims a different role and contact; the join-time
    // participant record wins: the echo is attributed to the vendor, the
    // reply fires, and the deal reveals the registered mobile.
    send_message(&mut ws, "p2", Role::Supplier, "₹36/kg", "9999999999").await;
    expect_echo(&mut ws, "₹36/kg").await;

    let reply = expect_supplier_reply(&mut ws).await;
    assert!(reply.contains("I accept"), "got: {reply}");

    match recv_event(&mut ws).await {
        ServerEvent::DealFinalized { vendor_contact, .. } => {
            assert_eq!(vendor_contact, "9000000009");
        }
        other => panic!("expected deal_finalized, got {other:?}"),
    }
}

#[tokio::test]
async fn boundary_offers_split_exactly() {
    let (addr, _handle) = start_test_server().await;

    // Exactly 75% of 40: counter-probe, not reject.
    let mut ws = connect(addr).await;
    join(&mut ws, "p2", Role::Vendor, "9000000008").await;
    send_message(&mut ws, "p2", Role::Vendor, "₹30", "9000000008").await;
    expect_echo(&mut ws, "₹30").await;
    let reply = expect_supplier_reply(&mut ws).await;
    assert!(reply.contains("quantity"), "got: {reply}");
    assert_silent(&mut ws).await;
}
