//! Property-based tests for the offer classifier.
//!
//! Arbitrary inputs must never panic the classifier, a well-formed
//! currency-marked amount must always classify as a price offer with
//! that exact amount, and classification must be deterministic.
//!
//! Verification command: `cargo test --test offer_classify`

use proptest::prelude::*;

use mandi_proto::offer::{classify, OfferKind};

proptest! {
    /// Arbitrary text never panics the classifier.
    #[test]
    fn classify_never_panics(text in ".{0,200}") {
        let _ = classify(&text);
    }

    /// Classification is a pure function of the input text.
    #[test]
    fn classify_is_deterministic(text in ".{0,200}") {
        prop_assert_eq!(classify(&text), classify(&text));
    }

    /// A currency marker followed by digits always yields that amount,
    /// whatever surrounds it.
    #[test]
    fn marked_amount_always_price_offer(
        prefix in "[a-z ]{0,20}",
        amount in 0u32..10_000_000,
        suffix in "[a-z ]{0,20}",
    ) {
        let text = format!("{prefix}₹{amount}{suffix}");
        prop_assert_eq!(classify(&text), OfferKind::PriceOffer(amount));
    }

    /// The amount parsed is the digit run immediately after the marker;
    /// a non-digit separator cuts it off.
    #[test]
    fn amount_stops_at_first_non_digit(
        amount in 0u32..100_000,
        trailing in 0u32..100_000,
    ) {
        let text = format!("₹{amount}/kg for {trailing} units");
        prop_assert_eq!(classify(&text), OfferKind::PriceOffer(amount));
    }

    /// Without a currency marker or greeting word, text is unclassified.
    /// The alphabet here excludes 'h' and 'i' so no "hi"/"hello" can form.
    #[test]
    fn plain_text_is_unclassified(text in "[a-gj-z ]{0,40}") {
        prop_assert_eq!(classify(&text), OfferKind::Unclassified);
    }

    /// A greeting word anywhere classifies as a greeting when no offer
    /// is present.
    #[test]
    fn greeting_wins_without_marker(
        prefix in "[a-gj-z ]{0,20}",
        suffix in "[a-gj-z ]{0,20}",
    ) {
        let text = format!("{prefix}hello{suffix}");
        prop_assert_eq!(classify(&text), OfferKind::Greeting);
    }
}
