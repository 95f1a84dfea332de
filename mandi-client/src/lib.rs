//! Mandi terminal client library.
//!
//! Exposes the client-side chat session state machine for use by the
//! binary and by tests.

pub mod session;
