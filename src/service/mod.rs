//! # Service Layer
//!
//! The connection-scoped client that ties classification, the handshake gate,
//! the server directory and the dispatcher together.

pub mod client;
