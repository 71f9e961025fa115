//! Wire header shapes.
//!
//! ```text
//! MsgHdr                [kind:4][target_job:8][source_job:8]                               20 bytes
//! ExtendedClientMsgHdr  [kind:4][size:1][version:2][target_job:8][source_job:8]
//!                       [canary:1][steam_id:8][session_id:4]                               36 bytes
//! MsgHdrProtoBuf        [kind|0x80000000:4][header_len:i32][CMsgProtoBufHeader:header_len]  8+N bytes
//! ```
//!
//! All integers are little-endian. Decoders advance the given `Bytes` past the
//! header so what remains is the message body, without copying.

use crate::core::emsg::{get_msg, make_msg, EMsg};
use crate::core::proto::CMsgProtoBufHeader;
use crate::core::steam_id::SteamId;
use crate::error::{constants, DecodeFailure};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use prost::Message;
use tracing::debug;

/// Job id meaning "no job".
pub const JOB_ID_NONE: u64 = u64::MAX;

/// Size of the leading message kind.
pub const KIND_SIZE: usize = 4;
/// Size of [`MsgHdr`].
pub const MSG_HDR_SIZE: usize = 4 + 8 + 8;
/// Size of [`ExtendedClientMsgHdr`].
pub const EXTENDED_HDR_SIZE: usize = 4 + 1 + 2 + 8 + 8 + 1 + 8 + 4;
/// Fixed prefix of [`MsgHdrProtoBuf`] before the protobuf header body.
pub const PROTO_HDR_PREFIX_SIZE: usize = 4 + 4;

/// Version written into extended headers.
pub const EXTENDED_HDR_VERSION: u16 = 2;
/// Sentinel byte written into extended headers.
pub const EXTENDED_HDR_CANARY: u8 = 239;

fn ensure_len(buf: &Bytes, needed: usize) -> Result<(), DecodeFailure> {
    if buf.len() < needed {
        return Err(DecodeFailure::Truncated {
            needed,
            available: buf.len(),
        });
    }
    Ok(())
}

fn read_kind(buf: &mut Bytes) -> Result<EMsg, DecodeFailure> {
    let raw = buf.get_u32_le();
    get_msg(raw).ok_or(DecodeFailure::UnknownKind(raw))
}

/// Basic header used by the encryption handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsgHdr {
    pub msg: EMsg,
    pub target_job_id: u64,
    pub source_job_id: u64,
}

impl MsgHdr {
    pub const fn new(msg: EMsg) -> Self {
        Self {
            msg,
            target_job_id: JOB_ID_NONE,
            source_job_id: JOB_ID_NONE,
        }
    }

    pub fn decode(buf: &mut Bytes) -> Result<Self, DecodeFailure> {
        ensure_len(buf, MSG_HDR_SIZE)?;
        let msg = read_kind(buf)?;
        Ok(Self {
            msg,
            target_job_id: buf.get_u64_le(),
            source_job_id: buf.get_u64_le(),
        })
    }

    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.reserve(MSG_HDR_SIZE);
        buf.put_u32_le(self.msg.as_u32());
        buf.put_u64_le(self.target_job_id);
        buf.put_u64_le(self.source_job_id);
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(MSG_HDR_SIZE);
        self.write_to(&mut buf);
        buf.freeze()
    }
}

/// Fixed-size header of non-protobuf application messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedClientMsgHdr {
    pub msg: EMsg,
    pub header_size: u8,
    pub header_version: u16,
    pub target_job_id: u64,
    pub source_job_id: u64,
    pub header_canary: u8,
    pub steam_id: SteamId,
    pub session_id: i32,
}

impl ExtendedClientMsgHdr {
    pub const fn new(msg: EMsg) -> Self {
        Self {
            msg,
            header_size: EXTENDED_HDR_SIZE as u8,
            header_version: EXTENDED_HDR_VERSION,
            target_job_id: JOB_ID_NONE,
            source_job_id: JOB_ID_NONE,
            header_canary: EXTENDED_HDR_CANARY,
            steam_id: SteamId::from_u64(0),
            session_id: 0,
        }
    }

    /// Size, version and canary are read verbatim; mismatches are only logged.
    pub fn decode(buf: &mut Bytes) -> Result<Self, DecodeFailure> {
        ensure_len(buf, EXTENDED_HDR_SIZE)?;
        let msg = read_kind(buf)?;
        let header = Self {
            msg,
            header_size: buf.get_u8(),
            header_version: buf.get_u16_le(),
            target_job_id: buf.get_u64_le(),
            source_job_id: buf.get_u64_le(),
            header_canary: buf.get_u8(),
            steam_id: SteamId::from_u64(buf.get_u64_le()),
            session_id: buf.get_i32_le(),
        };

        if header.header_canary != EXTENDED_HDR_CANARY
            || usize::from(header.header_size) != EXTENDED_HDR_SIZE
            || header.header_version != EXTENDED_HDR_VERSION
        {
            debug!(
                ?msg,
                header_size = header.header_size,
                header_version = header.header_version,
                header_canary = header.header_canary,
                "Extended header carries unexpected framing values"
            );
        }

        Ok(header)
    }

    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.reserve(EXTENDED_HDR_SIZE);
        buf.put_u32_le(self.msg.as_u32());
        buf.put_u8(self.header_size);
        buf.put_u16_le(self.header_version);
        buf.put_u64_le(self.target_job_id);
        buf.put_u64_le(self.source_job_id);
        buf.put_u8(self.header_canary);
        buf.put_u64_le(self.steam_id.to_u64());
        buf.put_i32_le(self.session_id);
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(EXTENDED_HDR_SIZE);
        self.write_to(&mut buf);
        buf.freeze()
    }
}

/// Header of protobuf-framed messages.
#[derive(Debug, Clone, PartialEq)]
pub struct MsgHdrProtoBuf {
    pub msg: EMsg,
    pub proto: CMsgProtoBufHeader,
}

impl MsgHdrProtoBuf {
    pub fn new(msg: EMsg) -> Self {
        Self {
            msg,
            proto: CMsgProtoBufHeader::default(),
        }
    }

    /// Reads the prefix and the protobuf header body.
    ///
    /// A negative length, a length past the end of the buffer, or one above
    /// `max_header_len` is `Malformed`; so is a body `prost` cannot decode.
    pub fn decode(buf: &mut Bytes, max_header_len: usize) -> Result<Self, DecodeFailure> {
        ensure_len(buf, PROTO_HDR_PREFIX_SIZE)?;
        let msg = read_kind(buf)?;
        let header_len = buf.get_i32_le();

        let header_len = usize::try_from(header_len)
            .map_err(|_| DecodeFailure::Malformed(constants::ERR_NEGATIVE_HEADER_LENGTH))?;
        if header_len > max_header_len {
            return Err(DecodeFailure::Malformed(constants::ERR_HEADER_LENGTH_LIMIT));
        }
        if header_len > buf.len() {
            return Err(DecodeFailure::Malformed(constants::ERR_HEADER_LENGTH_OVERRUN));
        }

        let body = buf.split_to(header_len);
        let proto = CMsgProtoBufHeader::decode(body).map_err(|e| {
            debug!(?msg, error = %e, "Protobuf header body rejected");
            DecodeFailure::Malformed(constants::ERR_PROTO_HEADER_DECODE)
        })?;

        Ok(Self { msg, proto })
    }

    /// Writes the header.
    ///
    /// Assumes the encoded body fits the signed 32-bit length field, which
    /// holds for any header [`decode`](Self::decode) would accept. Use
    /// [`try_write_to`](Self::try_write_to) when the header fields come from
    /// untrusted input.
    pub fn write_to(&self, buf: &mut BytesMut) {
        let body = self.proto.encode_to_vec();
        Self::put_framed(self.msg, &body, buf);
    }

    /// Writes the header if its encoded body is at most `max_header_len`
    /// bytes and fits the length field. Leaves `buf` untouched otherwise.
    pub fn try_write_to(
        &self,
        buf: &mut BytesMut,
        max_header_len: usize,
    ) -> Result<(), DecodeFailure> {
        let body = self.proto.encode_to_vec();
        if body.len() > max_header_len || i32::try_from(body.len()).is_err() {
            return Err(DecodeFailure::Malformed(constants::ERR_HEADER_LENGTH_LIMIT));
        }
        Self::put_framed(self.msg, &body, buf);
        Ok(())
    }

    fn put_framed(msg: EMsg, body: &[u8], buf: &mut BytesMut) {
        let len = i32::try_from(body.len()).unwrap_or(i32::MAX);
        buf.reserve(PROTO_HDR_PREFIX_SIZE + body.len());
        buf.put_u32_le(make_msg(msg, true));
        buf.put_i32_le(len);
        buf.put_slice(body);
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.write_to(&mut buf);
        buf.freeze()
    }
}
