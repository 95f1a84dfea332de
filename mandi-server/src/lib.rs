//! Mandi marketplace server library.
//!
//! Exposes the HTTP/WebSocket server for use in tests and embedding:
//! a product catalog with keyword search, per-product chat rooms, and the
//! simulated-supplier negotiation protocol.

pub mod api;
pub mod catalog;
pub mod config;
pub mod negotiate;
pub mod rooms;
pub mod session;
