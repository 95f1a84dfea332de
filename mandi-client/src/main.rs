//! Mandi terminal client — line-oriented negotiation chat.
//!
//! Connects to the server's WebSocket endpoint, joins the chat room for a
//! product, relays stdin lines as chat messages, and prints room
//! broadcasts. Once a `deal_finalized` event arrives the input line is
//! closed and further offers are refused locally.
//!
//! ```bash
//! cargo run --bin mandi-client -- --room p2 --role vendor --mobile 9000000001
//! ```

use std::path::Path;

use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use tokio::io::AsyncBufReadExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing_appender::non_blocking::WorkerGuard;

use mandi_client::session::ChatView;
use mandi_proto::codec;
use mandi_proto::event::{ClientEvent, Role};

/// CLI arguments for the Mandi client.
#[derive(clap::Parser, Debug)]
#[command(version, about = "Mandi negotiation chat client")]
struct CliArgs {
    /// WebSocket URL of the Mandi server.
    #[arg(long, default_value = "ws://127.0.0.1:3000/ws", env = "MANDI_SERVER")]
    server_url: String,

    /// Product id of the chat room to join.
    #[arg(long)]
    room: String,

    /// Product name (display only, sent with the join).
    #[arg(long, default_value = "")]
    product_name: String,

    /// Role to join as: "vendor" or "supplier".
    #[arg(long, default_value = "vendor")]
    role: String,

    /// Mobile number revealed to the counterparty on deal finalization.
    #[arg(long)]
    mobile: String,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "MANDI_CLIENT_LOG")]
    log_level: String,

    /// Log file path (default: a temp-dir file; stdout belongs to the chat).
    #[arg(long)]
    log_file: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // Logs go to a file, never stdout — stdout is the chat surface.
    let _log_guard = init_logging(&args.log_level, args.log_file.as_deref());

    let Some(role) = parse_role(&args.role) else {
        eprintln!("Unknown role '{}': expected 'vendor' or 'supplier'", args.role);
        std::process::exit(2);
    };

    tracing::info!(url = %args.server_url, room = %args.room, "connecting");
    let (ws, _response) = match connect_async(&args.server_url).await {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("Could not connect to {}: {e}", args.server_url);
            std::process::exit(1);
        }
    };
    let (mut ws_sender, mut ws_reader) = ws.split();

    let join = ClientEvent::JoinChat {
        chat_room: args.room.clone(),
        product_name: args.product_name.clone(),
        role,
        mobile: args.mobile.clone(),
    };
    if let Err(e) = send_event(&mut ws_sender, &join).await {
        eprintln!("Failed to join chat: {e}");
        std::process::exit(1);
    }

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut input_lines = stdin.lines();
    let mut view = ChatView::new();

    loop {
        tokio::select! {
            line = input_lines.next_line() => {
                match line {
                    Ok(Some(text)) => {
                        let text = text.trim();
                        if text.is_empty() {
                            continue;
                        }
                        if !view.is_input_enabled() {
                            println!("Chat closed — the deal is already finalized.");
                            continue;
                        }
                        let event = ClientEvent::SendMessage {
                            chat_room: args.room.clone(),
                            user: role,
                            message: text.to_string(),
                            mobile: args.mobile.clone(),
                        };
                        if let Err(e) = send_event(&mut ws_sender, &event).await {
                            eprintln!("Send failed: {e}");
                            break;
                        }
                    }
                    Ok(None) | Err(_) => break, // stdin closed
                }
            }
            frame = ws_reader.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match codec::decode_server(text.as_str()) {
                            Ok(event) => {
                                for line in view.apply(event) {
                                    println!("{line}");
                                }
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "undecodable frame from server");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        println!("Disconnected from server.");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Ignore binary, ping, pong frames.
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "WebSocket read failed");
                        println!("Connection lost.");
                        break;
                    }
                }
            }
        }
    }

    tracing::info!("client exiting");
}

/// Parses a role argument, case-insensitively.
fn parse_role(text: &str) -> Option<Role> {
    match text.to_lowercase().as_str() {
        "vendor" => Some(Role::Vendor),
        "supplier" => Some(Role::Supplier),
        _ => None,
    }
}

/// Encodes and sends one client event as a text frame.
async fn send_event(
    ws_sender: &mut (impl SinkExt<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin),
    event: &ClientEvent,
) -> Result<(), String> {
    let text = codec::encode_client(event).map_err(|e| e.to_string())?;
    ws_sender
        .send(Message::Text(text.into()))
        .await
        .map_err(|e| format!("WebSocket send error: {e}"))
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure
/// all buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("mandi-client.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}
