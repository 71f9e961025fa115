//! # Envelope Classification
//!
//! Turns a received frame into a typed [`Envelope`] by looking at its first
//! four bytes only:
//!
//! 1. the three `ChannelEncrypt*` kinds always use [`MsgHdr`]
//! 2. kinds with the protobuf bit use [`MsgHdrProtoBuf`]
//! 3. everything else uses [`ExtendedClientMsgHdr`]
//!
//! Classification is stateless and has no side effects. Malformed input comes
//! back as a [`DecodeFailure`] the receive loop drops; it never panics.

use crate::config::DecodeLimits;
use crate::core::emsg::{get_msg, is_proto_buf, EMsg};
use crate::core::header::{
    ExtendedClientMsgHdr, MsgHdr, MsgHdrProtoBuf, JOB_ID_NONE, KIND_SIZE,
};
use crate::core::steam_id::SteamId;
use crate::error::{constants, DecodeFailure};
use bytes::Bytes;
use tracing::{instrument, trace};

/// Which header layout produced an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeShape {
    Handshake,
    Structured,
    Legacy,
}

/// A classified frame: header plus the bytes that follow it.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// Encryption handshake message with a basic header.
    Handshake { header: MsgHdr, payload: Bytes },
    /// Protobuf-framed message.
    Structured {
        header: MsgHdrProtoBuf,
        payload: Bytes,
    },
    /// Non-protobuf application message with an extended header.
    Legacy {
        header: ExtendedClientMsgHdr,
        payload: Bytes,
    },
}

impl Envelope {
    pub fn shape(&self) -> EnvelopeShape {
        match self {
            Envelope::Handshake { .. } => EnvelopeShape::Handshake,
            Envelope::Structured { .. } => EnvelopeShape::Structured,
            Envelope::Legacy { .. } => EnvelopeShape::Legacy,
        }
    }

    /// Base message kind, protobuf bit cleared.
    pub fn kind(&self) -> EMsg {
        match self {
            Envelope::Handshake { header, .. } => header.msg,
            Envelope::Structured { header, .. } => header.msg,
            Envelope::Legacy { header, .. } => header.msg,
        }
    }

    pub fn is_proto_buf(&self) -> bool {
        matches!(self, Envelope::Structured { .. })
    }

    pub fn target_job_id(&self) -> u64 {
        match self {
            Envelope::Handshake { header, .. } => header.target_job_id,
            Envelope::Structured { header, .. } => header.proto.target_job_id(),
            Envelope::Legacy { header, .. } => header.target_job_id,
        }
    }

    pub fn source_job_id(&self) -> u64 {
        match self {
            Envelope::Handshake { header, .. } => header.source_job_id,
            Envelope::Structured { header, .. } => header.proto.source_job_id(),
            Envelope::Legacy { header, .. } => header.source_job_id,
        }
    }

    /// Whether the sender expects a reply routed back to a job.
    pub fn has_source_job(&self) -> bool {
        self.source_job_id() != JOB_ID_NONE
    }

    /// Sender identifier; handshake headers carry none.
    pub fn steam_id(&self) -> Option<SteamId> {
        match self {
            Envelope::Handshake { .. } => None,
            Envelope::Structured { header, .. } => header.proto.steamid.map(SteamId::from_u64),
            Envelope::Legacy { header, .. } => Some(header.steam_id),
        }
    }

    /// Session id; handshake headers carry none.
    pub fn session_id(&self) -> Option<i32> {
        match self {
            Envelope::Handshake { .. } => None,
            Envelope::Structured { header, .. } => header.proto.client_sessionid,
            Envelope::Legacy { header, .. } => Some(header.session_id),
        }
    }

    pub fn payload(&self) -> &Bytes {
        match self {
            Envelope::Handshake { payload, .. }
            | Envelope::Structured { payload, .. }
            | Envelope::Legacy { payload, .. } => payload,
        }
    }

    pub fn into_payload(self) -> Bytes {
        match self {
            Envelope::Handshake { payload, .. }
            | Envelope::Structured { payload, .. }
            | Envelope::Legacy { payload, .. } => payload,
        }
    }
}

/// Classifies `data` with the default [`DecodeLimits`].
///
/// `handshake_complete` does not change which shape is chosen: handshake
/// kinds classify the same before and after the channel is encrypted.
pub fn classify(data: &[u8], handshake_complete: bool) -> Result<Envelope, DecodeFailure> {
    let limits = DecodeLimits::default();
    // Size limit is checked before the copy.
    if data.len() > limits.max_message_size {
        return Err(DecodeFailure::Malformed(constants::ERR_MESSAGE_SIZE_LIMIT));
    }
    classify_with_limits(Bytes::copy_from_slice(data), handshake_complete, &limits)
}

/// Classifies an owned frame. The returned payload shares `data`'s storage.
#[instrument(level = "trace", skip(data, limits), fields(len = data.len()))]
pub fn classify_with_limits(
    mut data: Bytes,
    handshake_complete: bool,
    limits: &DecodeLimits,
) -> Result<Envelope, DecodeFailure> {
    if data.len() < KIND_SIZE {
        return Err(DecodeFailure::Truncated {
            needed: KIND_SIZE,
            available: data.len(),
        });
    }
    if data.len() > limits.max_message_size {
        return Err(DecodeFailure::Malformed(constants::ERR_MESSAGE_SIZE_LIMIT));
    }

    let raw = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let kind = match get_msg(raw) {
        Some(EMsg::Invalid) | None => return Err(DecodeFailure::UnknownKind(raw)),
        Some(kind) => kind,
    };
    let structured = is_proto_buf(raw);
    trace!(?kind, structured, "Classifying frame");

    if kind.is_encryption_handshake() {
        let header = MsgHdr::decode(&mut data)?;
        return Ok(Envelope::Handshake {
            header,
            payload: data,
        });
    }

    if structured {
        let header = MsgHdrProtoBuf::decode(&mut data, limits.max_proto_header_len)?;
        return Ok(Envelope::Structured {
            header,
            payload: data,
        });
    }

    let header = ExtendedClientMsgHdr::decode(&mut data)?;
    Ok(Envelope::Legacy {
        header,
        payload: data,
    })
}
