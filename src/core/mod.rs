//! Core reply orchestration
//!
//! Turns a conversation snapshot from the client into a single upstream
//! completion call.

mod reply;

pub use reply::{ReplyEngine, ReplyError};
