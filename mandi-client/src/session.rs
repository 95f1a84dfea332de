//! Client-side chat session state.
//!
//! [`ChatView`] applies decoded server events to pure display state:
//! chat lines to print and whether the input line is still open. Deal
//! finalization is terminal — the server keeps relaying, but this client
//! stops sending once a deal has closed the negotiation (the
//! client-enforced half of the protocol's terminal state).

use mandi_proto::event::{Sender, ServerEvent};

/// Contact details revealed when a deal is finalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealSummary {
    /// Accepted price in whole rupees.
    pub final_price: u32,
    /// Supplier's contact number.
    pub supplier_contact: String,
    /// Vendor's contact number.
    pub vendor_contact: String,
    /// Distance between the parties.
    pub distance: String,
}

/// Display-side state of one chat session.
pub struct ChatView {
    lines: Vec<String>,
    deal: Option<DealSummary>,
    input_enabled: bool,
}

impl Default for ChatView {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatView {
    /// Creates an empty view with input enabled.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: Vec::new(),
            deal: None,
            input_enabled: true,
        }
    }

    /// Applies one server event, returning the display lines it produced.
    pub fn apply(&mut self, event: ServerEvent) -> Vec<String> {
        let produced = match event {
            ServerEvent::ChatMessage {
                user,
                message,
                is_system,
            } => {
                let label = match user {
                    Sender::System => "System",
                    Sender::Vendor => "Vendor",
                    Sender::Supplier => "Supplier",
                };
                if is_system {
                    vec![format!("* {message}")]
                } else {
                    vec![format!("[{label}] {message}")]
                }
            }
            ServerEvent::DealFinalized {
                final_price,
                supplier_contact,
                vendor_contact,
                distance,
            } => {
                self.input_enabled = false;
                let summary = DealSummary {
                    final_price,
                    supplier_contact,
                    vendor_contact,
                    distance,
                };
                let lines = vec![
                    format!("*** Deal finalized at \u{20b9}{final_price} ***"),
                    format!("    Supplier contact: {}", summary.supplier_contact),
                    format!("    Vendor contact:   {}", summary.vendor_contact),
                    format!("    Distance:         {}", summary.distance),
                    "Chat closed — no further offers will be sent.".to_string(),
                ];
                // First finalization wins; the server never sends a second.
                self.deal.get_or_insert(summary);
                lines
            }
        };
        self.lines.extend(produced.iter().cloned());
        produced
    }

    /// Whether the input line is still open for new offers.
    #[must_use]
    pub const fn is_input_enabled(&self) -> bool {
        self.input_enabled
    }

    /// The finalized deal, if the negotiation has concluded.
    #[must_use]
    pub const fn deal(&self) -> Option<&DealSummary> {
        self.deal.as_ref()
    }

    /// All display lines accumulated so far.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}
