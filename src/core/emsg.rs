//! Message kind catalogue.
//!
//! The first four bytes of every frame carry the message kind. Bit 31 flags a
//! protobuf-framed message; the low 31 bits are the base kind looked up here.
//!
//! The catalogue is deliberately partial: it holds the handshake, session and
//! directory kinds this core routes, plus a few common client messages. Any
//! other base kind classifies as [`DecodeFailure::UnknownKind`] and is
//! dropped by the client before dispatch. Add a variant (and its
//! [`EMsg::from_raw`] arm) to receive a new kind.
//!
//! [`DecodeFailure::UnknownKind`]: crate::error::DecodeFailure::UnknownKind

/// Bit set on the wire kind when the header is protobuf framed.
pub const PROTO_MASK: u32 = 0x8000_0000;

/// Mask selecting the base kind.
pub const EMSG_MASK: u32 = !PROTO_MASK;

/// Known message kinds (base identifiers, protobuf bit cleared).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum EMsg {
    Invalid = 0,
    Multi = 1,
    DestJobFailed = 113,
    ServiceMethod = 146,
    ServiceMethodResponse = 147,
    ClientHeartBeat = 703,
    ClientLogOff = 706,
    ClientChangeStatus = 716,
    ClientLogOnResponse = 751,
    ClientLoggedOff = 757,
    ClientPersonaState = 766,
    ClientFriendsList = 767,
    ClientAccountInfo = 768,
    ClientLicenseList = 780,
    ClientCMList = 783,
    ClientSessionToken = 850,
    ClientServerList = 880,
    ChannelEncryptRequest = 1303,
    ChannelEncryptResponse = 1304,
    ChannelEncryptResult = 1305,
    ClientFriendMsgIncoming = 5427,
    ClientFromGC = 5452,
    ClientToGC = 5453,
    ClientEmailAddrInfo = 5456,
    ClientNewLoginKey = 5463,
    ClientNewLoginKeyAccepted = 5464,
    ClientServersAvailable = 5501,
    ClientLogon = 5514,
    ClientWalletInfoUpdate = 5528,
    ClientUpdateMachineAuth = 5537,
    ClientUpdateMachineAuthResponse = 5538,
}

impl EMsg {
    /// Looks up a base kind. The protobuf bit must already be cleared.
    pub fn from_raw(value: u32) -> Option<Self> {
        let kind = match value {
            0 => EMsg::Invalid,
            1 => EMsg::Multi,
            113 => EMsg::DestJobFailed,
            146 => EMsg::ServiceMethod,
            147 => EMsg::ServiceMethodResponse,
            703 => EMsg::ClientHeartBeat,
            706 => EMsg::ClientLogOff,
            716 => EMsg::ClientChangeStatus,
            751 => EMsg::ClientLogOnResponse,
            757 => EMsg::ClientLoggedOff,
            766 => EMsg::ClientPersonaState,
            767 => EMsg::ClientFriendsList,
            768 => EMsg::ClientAccountInfo,
            780 => EMsg::ClientLicenseList,
            783 => EMsg::ClientCMList,
            850 => EMsg::ClientSessionToken,
            880 => EMsg::ClientServerList,
            1303 => EMsg::ChannelEncryptRequest,
            1304 => EMsg::ChannelEncryptResponse,
            1305 => EMsg::ChannelEncryptResult,
            5427 => EMsg::ClientFriendMsgIncoming,
            5452 => EMsg::ClientFromGC,
            5453 => EMsg::ClientToGC,
            5456 => EMsg::ClientEmailAddrInfo,
            5463 => EMsg::ClientNewLoginKey,
            5464 => EMsg::ClientNewLoginKeyAccepted,
            5501 => EMsg::ClientServersAvailable,
            5514 => EMsg::ClientLogon,
            5528 => EMsg::ClientWalletInfoUpdate,
            5537 => EMsg::ClientUpdateMachineAuth,
            5538 => EMsg::ClientUpdateMachineAuthResponse,
            _ => return None,
        };
        Some(kind)
    }

    /// Numeric base value.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// The three kinds exchanged in the clear while the channel is being encrypted.
    #[inline]
    pub const fn is_encryption_handshake(self) -> bool {
        matches!(
            self,
            EMsg::ChannelEncryptRequest | EMsg::ChannelEncryptResponse | EMsg::ChannelEncryptResult
        )
    }
}

/// Builds the wire value for `kind`, setting the protobuf bit when requested.
#[inline]
pub const fn make_msg(kind: EMsg, protobuf: bool) -> u32 {
    if protobuf {
        kind.as_u32() | PROTO_MASK
    } else {
        kind.as_u32()
    }
}

/// Strips the protobuf bit and looks up the base kind.
#[inline]
pub fn get_msg(raw: u32) -> Option<EMsg> {
    EMsg::from_raw(raw & EMSG_MASK)
}

/// Whether the wire value carries the protobuf bit.
#[inline]
pub const fn is_proto_buf(raw: u32) -> bool {
    raw & PROTO_MASK != 0
}
