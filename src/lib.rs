//! # cm-protocol
//!
//! Client-side protocol core for connection-manager (CM) servers of an online
//! game platform.
//!
//! The crate classifies every received frame into one of three header
//! layouts, tracks whether the encryption handshake has completed, keeps a
//! deduplicated directory of announced servers, and provides the packed
//! 64-bit account identifier ([`SteamId`]) used throughout the protocol.
//!
//! Transport, encryption and message bodies beyond the server list are left
//! to the embedding application.
//!
//! ## Quick Start
//! ```rust
//! use cm_protocol::config::ProtocolConfig;
//! use cm_protocol::core::emsg::EMsg;
//! use cm_protocol::core::header::MsgHdr;
//! use cm_protocol::service::client::CmClient;
//!
//! let client = CmClient::new(ProtocolConfig::default());
//! let frame = MsgHdr::new(EMsg::ChannelEncryptRequest).to_bytes();
//! let envelope = client.on_bytes_received(&frame).unwrap();
//! assert_eq!(envelope.map(|e| e.kind()), Some(EMsg::ChannelEncryptRequest));
//! ```
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod utils;

pub use crate::config::{DecodeLimits, ProtocolConfig};
pub use crate::core::emsg::EMsg;
pub use crate::core::envelope::{classify, classify_with_limits, Envelope, EnvelopeShape};
pub use crate::core::steam_id::{AccountType, SteamId, Universe};
pub use crate::error::{DecodeFailure, ProtocolError, Result, SteamIdParseError};
pub use crate::protocol::dispatcher::Dispatcher;
pub use crate::protocol::handshake::HandshakeGate;
pub use crate::protocol::server_list::{ServerDirectory, ServerEntry, ServerKind};
pub use crate::service::client::CmClient;
