//! # Error Types
//!
//! Error handling for the protocol core.
//!
//! Decoding never panics on hostile input. Every failure to turn bytes into an
//! envelope is a [`DecodeFailure`] value that the receive loop logs and drops,
//! and every failure to read a textual account identifier is a
//! [`SteamIdParseError`]. Both convert into the crate-wide [`ProtocolError`].
//!
//! ## Error Categories
//! - **Decode**: truncated buffers, unknown message kinds, malformed header fields
//! - **Identifier**: legacy `STEAM_X:Y:Z` text that does not parse
//! - **Routing**: envelopes nobody registered a handler for
//! - **Configuration**: unreadable or invalid config files
//!
//! ## Example Usage
//! ```rust
//! use cm_protocol::core::envelope::classify;
//! use cm_protocol::error::DecodeFailure;
//! use tracing::warn;
//!
//! match classify(&[0x01, 0x02], false) {
//!     Ok(envelope) => println!("{:?}", envelope.kind()),
//!     Err(DecodeFailure::Truncated { .. }) => warn!("dropping short buffer"),
//!     Err(e) => warn!(error = %e, "dropping message"),
//! }
//! ```

use crate::core::emsg::EMsg;
use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Dispatcher-related error messages
    pub const ERR_DISPATCHER_WRITE_LOCK: &str = "Failed to acquire write lock on dispatcher";
    pub const ERR_DISPATCHER_READ_LOCK: &str = "Failed to acquire read lock on dispatcher";

    /// Server directory lock errors
    pub const ERR_DIRECTORY_WRITE_LOCK: &str = "Failed to acquire write lock on server directory";
    pub const ERR_DIRECTORY_READ_LOCK: &str = "Failed to acquire read lock on server directory";

    /// Header validation messages
    pub const ERR_NEGATIVE_HEADER_LENGTH: &str = "negative protobuf header length";
    pub const ERR_HEADER_LENGTH_OVERRUN: &str = "protobuf header length exceeds buffer";
    pub const ERR_HEADER_LENGTH_LIMIT: &str = "protobuf header length exceeds configured limit";
    pub const ERR_MESSAGE_SIZE_LIMIT: &str = "message exceeds configured size limit";
    pub const ERR_PROTO_HEADER_DECODE: &str = "protobuf header body failed to decode";
}

/// Why a received buffer produced no envelope.
///
/// All variants are recoverable: the caller drops the message and keeps
/// reading.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeFailure {
    /// Buffer shorter than the header shape it must contain.
    #[error("truncated message: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    /// Base message kind has no known mapping.
    #[error("unknown message kind: {0:#010x}")]
    UnknownKind(u32),

    /// A header field is structurally impossible.
    #[error("malformed header: {0}")]
    Malformed(&'static str),
}

/// Why a legacy `STEAM_X:Y:Z` string could not be read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SteamIdParseError {
    #[error("text does not match STEAM_<universe>:<authserver>:<accountid>")]
    NoMatch,

    #[error("account id out of range: {0}")]
    AccountIdOutOfRange(String),
}

// ProtocolError is the primary error type for all protocol operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Decode failure: {0}")]
    Decode(#[from] DecodeFailure),

    #[error("Invalid SteamID: {0}")]
    SteamIdParse(#[from] SteamIdParseError),

    #[error("Protobuf body decode failed: {0}")]
    ProtoDecode(String),

    #[error("No handler registered for {0:?}")]
    UnhandledMessage(EMsg),

    #[error("Encryption handshake has not completed")]
    HandshakeIncomplete,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl From<prost::DecodeError> for ProtocolError {
    fn from(err: prost::DecodeError) -> Self {
        ProtocolError::ProtoDecode(err.to_string())
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
