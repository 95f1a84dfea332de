//! Shared protocol definitions for the Mandi marketplace wire format.

pub mod catalog;
pub mod codec;
pub mod event;
pub mod offer;
