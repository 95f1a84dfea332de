//! Free-text offer classification.
//!
//! Negotiation messages are plain chat text; this module turns them into a
//! tagged [`OfferKind`] so the negotiation engine's decision table stays
//! independent of string scanning. Classification is deterministic and the
//! first matching rule wins: currency-marked amount, then greeting, then
//! unclassified.

/// The currency marker that introduces a numeric offer (e.g. `₹450`).
pub const CURRENCY_MARKER: char = '₹';

/// The interpretation of one free-text chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferKind {
    /// A greeting ("hello"/"hi"), no price attached.
    Greeting,
    /// A currency-marked amount in whole rupees.
    PriceOffer(u32),
    /// A currency marker with no parseable number after it.
    Malformed,
    /// Anything else.
    Unclassified,
}

/// Classifies a chat message.
///
/// The first `₹` immediately followed by digits yields a
/// [`OfferKind::PriceOffer`] with that amount; later marked numbers in the
/// same message are ignored. A `₹` with no parseable number anywhere is
/// [`OfferKind::Malformed`]. Greeting detection is a case-insensitive
/// substring match on `hello` or `hi`, deliberately matching the original
/// prototype's loose semantics.
#[must_use]
pub fn classify(text: &str) -> OfferKind {
    let mut saw_marker = false;
    let mut rest = text;
    while let Some(pos) = rest.find(CURRENCY_MARKER) {
        saw_marker = true;
        let after = &rest[pos + CURRENCY_MARKER.len_utf8()..];
        let end = after
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(after.len());
        let digits = &after[..end];
        if !digits.is_empty()
            && let Ok(amount) = digits.parse::<u32>()
        {
            return OfferKind::PriceOffer(amount);
        }
        rest = after;
    }
    if saw_marker {
        return OfferKind::Malformed;
    }

    let lower = text.to_lowercase();
    if lower.contains("hello") || lower.contains("hi") {
        OfferKind::Greeting
    } else {
        OfferKind::Unclassified
    }
}
