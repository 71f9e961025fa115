//! # Protocol Layer
//!
//! Connection-scoped state and routing that sit on top of envelope
//! classification.
//!
//! ## Components
//! - **Handshake gate**: whether the encrypted session is up yet
//! - **Server directory**: deduplicated servers learned from server lists
//! - **Dispatcher**: routes envelopes to handlers by message kind

pub mod dispatcher;
pub mod handshake;
pub mod server_list;
