//! # Core Protocol Components
//!
//! Message kinds, header layouts, envelope classification and account
//! identifiers.
//!
//! Everything here is stateless: it turns bytes into typed values and back,
//! and reports malformed input as a [`DecodeFailure`](crate::error::DecodeFailure).
//!
//! ## Components
//! - **EMsg**: message kind catalogue and the protobuf bit
//! - **Header**: the three header layouts
//! - **Envelope**: classification of a frame into one of those layouts
//! - **Proto**: protobuf header and server-list bodies
//! - **SteamId**: 64-bit packed account identifier
//!
//! ## Wire Format
//! ```text
//! Handshake:  [Kind(4)] [TargetJob(8)] [SourceJob(8)] [Payload]
//! Structured: [Kind|0x80000000(4)] [HeaderLen(4)] [ProtoHeader(N)] [Payload]
//! Legacy:     [Kind(4)] [Size(1)] [Version(2)] [TargetJob(8)] [SourceJob(8)]
//!             [Canary(1)] [SteamId(8)] [Session(4)] [Payload]
//! ```
//!
//! All integers are little-endian.

pub mod emsg;
pub mod envelope;
pub mod header;
pub mod proto;
pub mod steam_id;
