//! The negotiation engine.
//!
//! A stateless decision function: given one free-text offer and the
//! product it concerns, produce the simulated supplier's reply and,
//! possibly, an accepted deal. Timing (the simulated typing delay) is the
//! coordinator's concern, never this module's.
//!
//! Decision table for a parsed amount `a` against the reference price
//! `mrp`:
//!
//! | condition            | reply          | deal |
//! |----------------------|----------------|------|
//! | `a < 75% of mrp`     | reject as low  | no   |
//! | `75% <= a < 90%`     | counter-probe  | no   |
//! | `a >= 90% of mrp`    | accept         | yes  |
//!
//! Boundaries are exact: 75% falls in the counter-probe branch, 90% in
//! the accept branch. Comparisons use integer arithmetic (`a*100` vs
//! `mrp*75`/`mrp*90`) so no float rounding can move a boundary.

use mandi_proto::catalog::Product;
use mandi_proto::offer::{self, OfferKind};

/// Placeholder supplier contact revealed on deal finalization.
pub const SUPPLIER_CONTACT: &str = "9876543210";

/// Placeholder distance reported in the deal-finalized event.
pub const DEAL_DISTANCE: &str = "5 km";

/// The engine's verdict on one offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationOutcome {
    /// The simulated supplier's reply text.
    pub reply: String,
    /// `Some(final_price)` when the offer was accepted.
    pub deal: Option<u32>,
}

impl NegotiationOutcome {
    fn reply_only(reply: String) -> Self {
        Self { reply, deal: None }
    }
}

/// Evaluates one offer message against a product's reference price.
///
/// Pure and deterministic: the same `(offer_text, product)` pair always
/// yields the same outcome.
#[must_use]
pub fn evaluate(offer_text: &str, product: &Product) -> NegotiationOutcome {
    match offer::classify(offer_text) {
        OfferKind::PriceOffer(amount) => classify_amount(amount, product),
        OfferKind::Malformed => NegotiationOutcome::reply_only(
            "Please specify your price offer clearly (e.g., '\u{20b9}XX/kg').".to_string(),
        ),
        OfferKind::Greeting => NegotiationOutcome::reply_only(format!(
            "Hello! This is {}. The MRP for {} is \u{20b9}{}/{}. What is your offer?",
            product.supplier, product.name, product.mrp, product.unit
        )),
        OfferKind::Unclassified => NegotiationOutcome::reply_only(format!(
            "I'm here to help. The MRP is \u{20b9}{}/{}. What is your offer?",
            product.mrp, product.unit
        )),
    }
}

fn classify_amount(amount: u32, product: &Product) -> NegotiationOutcome {
    let scaled = u64::from(amount) * 100;
    let mrp = u64::from(product.mrp);

    if scaled < mrp * 75 {
        NegotiationOutcome::reply_only(format!(
            "Your offer of \u{20b9}{}/{} is a bit low. The MRP is \u{20b9}{}. Can you increase it?",
            amount, product.unit, product.mrp
        ))
    } else if scaled >= mrp * 90 {
        NegotiationOutcome {
            reply: format!(
                "That's a good offer of \u{20b9}{}/{}! I accept. Let's finalize this.",
                amount, product.unit
            ),
            deal: Some(amount),
        }
    } else {
        NegotiationOutcome::reply_only(format!(
            "Hmm, for \u{20b9}{}/{}, what quantity are you looking for? I can consider a little more.",
            amount, product.unit
        ))
    }
}
