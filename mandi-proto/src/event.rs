//! Chat channel event types for the Mandi wire protocol.
//!
//! Every frame on the WebSocket channel is a JSON object tagged with a
//! `type` field (`join_chat`, `send_message`, `chat_message`,
//! `deal_finalized`); payload fields are camelCase. [`ClientEvent`] covers
//! the client-to-server direction, [`ServerEvent`] the server-to-client
//! direction.

use serde::{Deserialize, Serialize};

/// The negotiating role a participant joins a room as.
///
/// Vendors initiate bargaining; supplier-role messages are relayed but
/// never trigger the simulated counterparty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// A buyer negotiating the price down.
    Vendor,
    /// A seller (simulated in this prototype).
    Supplier,
}

/// The author attributed to a broadcast chat line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    /// Server-generated text (welcomes, notices).
    System,
    /// A vendor participant.
    Vendor,
    /// A supplier participant or the simulated supplier.
    Supplier,
}

impl From<Role> for Sender {
    fn from(role: Role) -> Self {
        match role {
            Role::Vendor => Self::Vendor,
            Role::Supplier => Self::Supplier,
        }
    }
}

/// Events sent from a client to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Join the chat room for a product. The room id is the product id;
    /// role and mobile number are attached to the connection until it
    /// disconnects.
    JoinChat {
        /// Product id identifying the room.
        chat_room: String,
        /// Product name as the client knows it (display only).
        product_name: String,
        /// Role the participant joins as.
        role: Role,
        /// Participant's mobile number, revealed on deal finalization.
        mobile: String,
    },
    /// Send a free-text message (typically a price offer) to a room.
    SendMessage {
        /// Product id identifying the room.
        chat_room: String,
        /// Sender's role.
        user: Role,
        /// Free-text message body.
        message: String,
        /// Sender's mobile number.
        mobile: String,
    },
}

/// Events sent from the server to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// A chat line, either relayed from a participant or generated by the
    /// server (welcome messages, simulated supplier replies).
    ChatMessage {
        /// Attributed author of the line.
        user: Sender,
        /// Message text.
        message: String,
        /// True for server-generated system text.
        #[serde(default)]
        is_system: bool,
    },
    /// Terminal event of a negotiation: an offer was accepted and both
    /// parties' contact details are revealed. Broadcast at most once per
    /// room lifetime.
    DealFinalized {
        /// The accepted offer amount in whole rupees.
        final_price: u32,
        /// Supplier's contact number.
        supplier_contact: String,
        /// Vendor's contact number (from the accepted offer's sender).
        vendor_contact: String,
        /// Distance between the parties, display string.
        distance: String,
    },
}
