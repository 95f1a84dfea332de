//! Client session wiring against a live server.
//!
//! Feeds real server traffic through the client's [`ChatView`] state
//! machine and checks the client-enforced terminal state: once a deal is
//! finalized, the input line closes.
//!
//! Verification command: `cargo test --test client_session`

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite;

use mandi_client::session::ChatView;
use mandi_proto::codec;
use mandi_proto::event::{ClientEvent, Role};
use mandi_server::api::start_server;
use mandi_server::catalog::CatalogStore;
use mandi_server::session::ServerState;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn start_test_server() -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
    let state = Arc::new(ServerState::with_reply_delay(
        CatalogStore::with_demo_data(),
        Duration::from_millis(100),
    ));
    start_server("127.0.0.1:0", state)
        .await
        .expect("failed to start test server")
}

async fn send_client_event(ws: &mut WsStream, event: &ClientEvent) {
    let text = codec::encode_client(event).unwrap();
    ws.send(tungstenite::Message::Text(text.into()))
        .await
        .unwrap();
}

/// Receives the next server event and applies it to the view.
async fn apply_next(ws: &mut WsStream, view: &mut ChatView) -> Vec<String> {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for server event")
        .expect("connection closed")
        .expect("WebSocket read failed");
    let tungstenite::Message::Text(text) = msg else {
        panic!("expected text frame");
    };
    view.apply(codec::decode_server(text.as_str()).unwrap())
}

#[tokio::test]
async fn deal_closes_client_input() {
    let (addr, _handle) = start_test_server().await;
    let url = format!("ws://{addr}/ws");
    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();

    let mut view = ChatView::new();

    send_client_event(
        &mut ws,
        &ClientEvent::JoinChat {
            chat_room: "p2".into(),
            product_name: "Premium Tomatoes".into(),
            role: Role::Vendor,
            mobile: "9000000021".into(),
        },
    )
    .await;

    // Welcome.
    let lines = apply_next(&mut ws, &mut view).await;
    assert!(lines[0].contains("Premium Tomatoes"), "got: {lines:?}");
    assert!(view.is_input_enabled());

    // Acceptable offer: echo, reply, deal.
    send_client_event(
        &mut ws,
        &ClientEvent::SendMessage {
            chat_room: "p2".into(),
            user: Role::Vendor,
            message: "₹36/kg".into(),
            mobile: "9000000021".into(),
        },
    )
    .await;

    apply_next(&mut ws, &mut view).await; // echo
    let reply = apply_next(&mut ws, &mut view).await;
    assert!(reply[0].starts_with("[Supplier]"), "got: {reply:?}");
    assert!(view.is_input_enabled());

    apply_next(&mut ws, &mut view).await; // deal_finalized
    assert!(!view.is_input_enabled());

    let deal = view.deal().expect("deal should be recorded");
    assert_eq!(deal.final_price, 36);
    assert_eq!(deal.vendor_contact, "9000000021");
}
