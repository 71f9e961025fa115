//! # Account Identifiers
//!
//! The platform identifies every account with a single 64-bit value that packs
//! four fields:
//!
//! ```text
//! 63        56 55    52 51                 32 31                          0
//! [ universe ] [ type  ] [     instance      ] [         account id        ]
//!     8 bits    4 bits         20 bits                   32 bits
//! ```
//!
//! Construction never validates. Wire data may be malformed and callers need
//! to inspect the individual fields to see why, so validity is a separate
//! predicate ([`SteamId::is_valid`]).
//!
//! The legacy text form `STEAM_<universe>:<authserver>:<accountid>` is only
//! meaningful for individual accounts; every other account type renders as the
//! raw 64-bit value.

use crate::error::SteamIdParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Instance used by desktop clients.
pub const DESKTOP_INSTANCE: u32 = 1;
/// Instance used by console clients.
pub const CONSOLE_INSTANCE: u32 = 2;

pub const ACCOUNT_ID_MASK: u64 = 0xFFFF_FFFF;
pub const ACCOUNT_INSTANCE_MASK: u64 = 0x000F_FFFF;
const ACCOUNT_TYPE_MASK: u64 = 0xF;
const UNIVERSE_MASK: u64 = 0xFF;

const ACCOUNT_ID_OFFSET: u32 = 0;
const INSTANCE_OFFSET: u32 = 32;
const ACCOUNT_TYPE_OFFSET: u32 = 52;
const UNIVERSE_OFFSET: u32 = 56;

/// Flags carried in the top of the instance field of chat identifiers.
pub mod instance_flags {
    use super::ACCOUNT_INSTANCE_MASK;

    pub const CLAN: u32 = ((ACCOUNT_INSTANCE_MASK + 1) >> 1) as u32;
    pub const LOBBY: u32 = ((ACCOUNT_INSTANCE_MASK + 1) >> 2) as u32;
    pub const MMS_LOBBY: u32 = ((ACCOUNT_INSTANCE_MASK + 1) >> 3) as u32;
}

static LEGACY_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)STEAM_(?P<universe>[0-5]):(?P<authserver>[0-1]):(?P<accountid>[0-9]+)")
        .unwrap_or_else(|e| unreachable!("legacy SteamID pattern is a literal: {e}"))
});

/// Account type stored in bits 52..56.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum AccountType {
    Invalid = 0,
    Individual = 1,
    Multiseat = 2,
    GameServer = 3,
    AnonGameServer = 4,
    Pending = 5,
    ContentServer = 6,
    Clan = 7,
    Chat = 8,
    P2PSuperSeeder = 9,
    AnonUser = 10,
    Max = 11,
}

impl AccountType {
    /// Maps a raw field value; anything at or past `Max` reads as `Max`.
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => AccountType::Invalid,
            1 => AccountType::Individual,
            2 => AccountType::Multiseat,
            3 => AccountType::GameServer,
            4 => AccountType::AnonGameServer,
            5 => AccountType::Pending,
            6 => AccountType::ContentServer,
            7 => AccountType::Clan,
            8 => AccountType::Chat,
            9 => AccountType::P2PSuperSeeder,
            10 => AccountType::AnonUser,
            _ => AccountType::Max,
        }
    }
}

/// Universe stored in bits 56..64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Universe {
    Invalid = 0,
    Public = 1,
    Beta = 2,
    Internal = 3,
    Dev = 4,
    Max = 5,
}

impl Universe {
    /// Maps a raw field value; anything at or past `Max` reads as `Max`.
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Universe::Invalid,
            1 => Universe::Public,
            2 => Universe::Beta,
            3 => Universe::Internal,
            4 => Universe::Dev,
            _ => Universe::Max,
        }
    }
}

/// A 64-bit word addressed as (offset, mask) bitfields.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
struct BitVector64(u64);

impl BitVector64 {
    #[inline]
    const fn get(self, offset: u32, mask: u64) -> u64 {
        (self.0 >> offset) & mask
    }

    #[inline]
    fn set(&mut self, offset: u32, mask: u64, value: u64) {
        self.0 = (self.0 & !(mask << offset)) | ((value & mask) << offset);
    }
}

/// Packed 64-bit account identifier.
///
/// Equality and hashing use the raw value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SteamId(BitVector64);

impl SteamId {
    /// Builds an identifier with the default instance for `account_type`:
    /// clans get instance 0, everything else the desktop instance.
    pub fn new(account_id: u32, universe: Universe, account_type: AccountType) -> Self {
        let mut id = Self::default();
        id.set(account_id, universe, account_type);
        id
    }

    /// Builds an identifier with an explicit instance; no default applied.
    pub fn with_instance(
        account_id: u32,
        instance: u32,
        universe: Universe,
        account_type: AccountType,
    ) -> Self {
        let mut id = Self::default();
        id.instanced_set(account_id, instance, universe, account_type);
        id
    }

    /// Reinterprets a raw 64-bit value. No validation is performed.
    #[inline]
    pub const fn from_u64(value: u64) -> Self {
        Self(BitVector64(value))
    }

    /// Raw 64-bit value.
    #[inline]
    pub const fn to_u64(self) -> u64 {
        self.0 .0
    }

    /// Parses the legacy `STEAM_X:Y:Z` form, case-insensitively.
    ///
    /// On success the identifier is an individual desktop account in
    /// `universe` with account id `(Z << 1) | Y`. The `X` digit is matched
    /// but not used.
    pub fn parse_legacy(text: &str, universe: Universe) -> Result<Self, SteamIdParseError> {
        let captures = LEGACY_TEXT
            .captures(text)
            .ok_or(SteamIdParseError::NoMatch)?;

        let account_text = &captures["accountid"];
        let account: u32 = account_text
            .parse()
            .map_err(|_| SteamIdParseError::AccountIdOutOfRange(account_text.to_string()))?;
        let auth_server = u32::from(&captures["authserver"] == "1");

        let mut id = Self::default();
        id.set_account_universe(universe);
        id.set_account_instance(DESKTOP_INSTANCE);
        id.set_account_type(AccountType::Individual);
        id.set_account_id((account << 1) | auth_server);
        Ok(id)
    }

    /// Legacy in-place parse. On failure `self` keeps its previous value and
    /// the error is returned so the caller can tell "account 0" from "no match".
    pub fn set_from_legacy(
        &mut self,
        text: &str,
        universe: Universe,
    ) -> Result<(), SteamIdParseError> {
        *self = Self::parse_legacy(text, universe)?;
        Ok(())
    }

    pub fn set(&mut self, account_id: u32, universe: Universe, account_type: AccountType) {
        self.set_account_id(account_id);
        self.set_account_universe(universe);
        self.set_account_type(account_type);

        if account_type == AccountType::Clan {
            self.set_account_instance(0);
        } else {
            self.set_account_instance(DESKTOP_INSTANCE);
        }
    }

    pub fn instanced_set(
        &mut self,
        account_id: u32,
        instance: u32,
        universe: Universe,
        account_type: AccountType,
    ) {
        self.set_account_id(account_id);
        self.set_account_universe(universe);
        self.set_account_type(account_type);
        self.set_account_instance(instance);
    }

    /// Sets account id and instance from the low 52 bits of `identifier`.
    pub fn full_set(&mut self, identifier: u64, universe: Universe, account_type: AccountType) {
        self.set_account_id((identifier & ACCOUNT_ID_MASK) as u32);
        self.set_account_instance(((identifier >> 32) & ACCOUNT_INSTANCE_MASK) as u32);
        self.set_account_universe(universe);
        self.set_account_type(account_type);
    }

    #[inline]
    pub fn set_from_u64(&mut self, value: u64) {
        self.0 = BitVector64(value);
    }

    pub fn create_blank_anon_logon(&mut self, universe: Universe) {
        self.set_account_id(0);
        self.set_account_type(AccountType::AnonGameServer);
        self.set_account_universe(universe);
        self.set_account_instance(0);
    }

    pub fn create_blank_anon_user_logon(&mut self, universe: Universe) {
        self.set_account_id(0);
        self.set_account_type(AccountType::AnonUser);
        self.set_account_universe(universe);
        self.set_account_instance(0);
    }

    #[inline]
    pub const fn account_id(self) -> u32 {
        self.0.get(ACCOUNT_ID_OFFSET, ACCOUNT_ID_MASK) as u32
    }

    #[inline]
    pub fn set_account_id(&mut self, account_id: u32) {
        self.0
            .set(ACCOUNT_ID_OFFSET, ACCOUNT_ID_MASK, u64::from(account_id));
    }

    #[inline]
    pub const fn account_instance(self) -> u32 {
        self.0.get(INSTANCE_OFFSET, ACCOUNT_INSTANCE_MASK) as u32
    }

    /// Bits above the 20-bit field are discarded.
    #[inline]
    pub fn set_account_instance(&mut self, instance: u32) {
        self.0
            .set(INSTANCE_OFFSET, ACCOUNT_INSTANCE_MASK, u64::from(instance));
    }

    #[inline]
    pub const fn account_type_raw(self) -> u8 {
        self.0.get(ACCOUNT_TYPE_OFFSET, ACCOUNT_TYPE_MASK) as u8
    }

    #[inline]
    pub const fn account_type(self) -> AccountType {
        AccountType::from_raw(self.account_type_raw())
    }

    #[inline]
    pub fn set_account_type(&mut self, account_type: AccountType) {
        self.0
            .set(ACCOUNT_TYPE_OFFSET, ACCOUNT_TYPE_MASK, account_type as u64);
    }

    #[inline]
    pub const fn universe_raw(self) -> u8 {
        self.0.get(UNIVERSE_OFFSET, UNIVERSE_MASK) as u8
    }

    #[inline]
    pub const fn account_universe(self) -> Universe {
        Universe::from_raw(self.universe_raw())
    }

    #[inline]
    pub fn set_account_universe(&mut self, universe: Universe) {
        self.0.set(UNIVERSE_OFFSET, UNIVERSE_MASK, universe as u64);
    }

    /// Identifier with the instance stripped: universe, type and account id.
    pub fn static_account_key(self) -> u64 {
        (u64::from(self.universe_raw()) << UNIVERSE_OFFSET)
            + (u64::from(self.account_type_raw()) << ACCOUNT_TYPE_OFFSET)
            + u64::from(self.account_id())
    }

    pub fn is_blank_anon_account(self) -> bool {
        self.account_id() == 0 && self.is_anon_account() && self.account_instance() == 0
    }

    pub fn is_game_server_account(self) -> bool {
        matches!(
            self.account_type(),
            AccountType::GameServer | AccountType::AnonGameServer
        )
    }

    pub fn is_content_server_account(self) -> bool {
        self.account_type() == AccountType::ContentServer
    }

    pub fn is_clan_account(self) -> bool {
        self.account_type() == AccountType::Clan
    }

    pub fn is_chat_account(self) -> bool {
        self.account_type() == AccountType::Chat
    }

    /// Chat identifier flagged as a lobby.
    pub fn is_lobby(self) -> bool {
        self.is_chat_account() && self.account_instance() & instance_flags::LOBBY != 0
    }

    pub fn is_individual_account(self) -> bool {
        self.account_type() == AccountType::Individual
    }

    pub fn is_anon_account(self) -> bool {
        matches!(
            self.account_type(),
            AccountType::AnonUser | AccountType::AnonGameServer
        )
    }

    pub fn is_anon_user_account(self) -> bool {
        self.account_type() == AccountType::AnonUser
    }

    /// Drops the instance of an individual account; other types are untouched.
    pub fn clear_individual_instance(&mut self) {
        if self.is_individual_account() {
            self.set_account_instance(0);
        }
    }

    /// Whether the fields describe an account the platform could issue.
    pub fn is_valid(self) -> bool {
        let account_type = self.account_type_raw();
        if account_type <= AccountType::Invalid as u8 || account_type >= AccountType::Max as u8 {
            return false;
        }

        let universe = self.universe_raw();
        if universe <= Universe::Invalid as u8 || universe >= Universe::Max as u8 {
            return false;
        }

        match self.account_type() {
            AccountType::Individual => {
                self.account_id() != 0 && self.account_instance() <= CONSOLE_INSTANCE
            }
            AccountType::Clan => self.account_id() != 0 && self.account_instance() == 0,
            _ => true,
        }
    }

    /// Legacy text form for individual (and invalid) accounts, raw decimal
    /// value for everything else.
    pub fn render_legacy(self) -> String {
        match self.account_type() {
            AccountType::Invalid | AccountType::Individual => {
                let account_id = self.account_id();
                let universe = self.universe_raw();
                if universe <= Universe::Public as u8 {
                    format!("STEAM_0:{}:{}", account_id & 1, account_id >> 1)
                } else {
                    format!("STEAM_{}:{}:{}", universe, account_id & 1, account_id >> 1)
                }
            }
            _ => self.to_u64().to_string(),
        }
    }
}

impl fmt::Display for SteamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_legacy())
    }
}

impl fmt::Debug for SteamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SteamId")
            .field("raw", &self.to_u64())
            .field("account_id", &self.account_id())
            .field("instance", &self.account_instance())
            .field("account_type", &self.account_type_raw())
            .field("universe", &self.universe_raw())
            .finish()
    }
}

impl FromStr for SteamId {
    type Err = SteamIdParseError;

    /// Parses legacy text in the public universe.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_legacy(s, Universe::Public)
    }
}

impl From<u64> for SteamId {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<SteamId> for u64 {
    fn from(id: SteamId) -> Self {
        id.to_u64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_instance_rule() {
        let individual = SteamId::new(123, Universe::Public, AccountType::Individual);
        assert_eq!(individual.account_instance(), DESKTOP_INSTANCE);

        let clan = SteamId::new(123, Universe::Public, AccountType::Clan);
        assert_eq!(clan.account_instance(), 0);

        let server = SteamId::new(9, Universe::Beta, AccountType::GameServer);
        assert_eq!(server.account_instance(), DESKTOP_INSTANCE);
    }

    #[test]
    fn explicit_instance_is_kept() {
        let clan = SteamId::with_instance(5, 7, Universe::Public, AccountType::Clan);
        assert_eq!(clan.account_instance(), 7);
        assert!(!clan.is_valid());
    }

    #[test]
    fn known_public_individual_packs_as_expected() {
        let id = SteamId::new(46_143_802, Universe::Public, AccountType::Individual);
        assert_eq!(id.to_u64(), 76_561_198_006_409_530);
        assert_eq!(SteamId::from_u64(76_561_198_006_409_530), id);
    }

    #[test]
    fn parse_and_render_legacy() {
        let id = SteamId::parse_legacy("STEAM_0:1:123", Universe::Public).unwrap();
        assert_eq!(id.account_id(), 247);
        assert_eq!(id.account_instance(), 1);
        assert_eq!(id.account_type(), AccountType::Individual);
        assert_eq!(id.account_universe(), Universe::Public);
        assert_eq!(id.render_legacy(), "STEAM_0:1:123");
    }

    #[test]
    fn parse_is_case_insensitive() {
        let upper = SteamId::parse_legacy("STEAM_0:0:4491990", Universe::Public).unwrap();
        let lower = SteamId::parse_legacy("steam_0:0:4491990", Universe::Public).unwrap();
        assert_eq!(upper, lower);
        assert_eq!(lower.account_id(), 8_983_980);
    }

    #[test]
    fn render_uses_numeric_universe_past_public() {
        let id = SteamId::parse_legacy("STEAM_0:1:10", Universe::Beta).unwrap();
        assert_eq!(id.render_legacy(), "STEAM_2:1:10");
    }

    #[test]
    fn render_of_non_individual_is_raw_value() {
        let clan = SteamId::new(4, Universe::Public, AccountType::Clan);
        assert_eq!(clan.render_legacy(), clan.to_u64().to_string());
        assert_eq!(clan.to_string(), clan.to_u64().to_string());
    }

    #[test]
    fn parse_failure_is_distinguishable() {
        assert_eq!(
            SteamId::parse_legacy("not an id", Universe::Public),
            Err(SteamIdParseError::NoMatch)
        );
        assert_eq!(
            SteamId::parse_legacy("STEAM_6:0:1", Universe::Public),
            Err(SteamIdParseError::NoMatch)
        );
        assert!(matches!(
            SteamId::parse_legacy("STEAM_0:0:99999999999", Universe::Public),
            Err(SteamIdParseError::AccountIdOutOfRange(_))
        ));
    }

    #[test]
    fn set_from_legacy_keeps_prior_state_on_failure() {
        let mut id = SteamId::default();
        assert!(id.set_from_legacy("garbage", Universe::Public).is_err());
        assert_eq!(id.to_u64(), 0);

        let mut id = SteamId::new(77, Universe::Public, AccountType::Individual);
        let before = id;
        assert!(id.set_from_legacy("STEAM_9:9:9", Universe::Public).is_err());
        assert_eq!(id, before);

        id.set_from_legacy("STEAM_0:0:5", Universe::Public).unwrap();
        assert_eq!(id.account_id(), 10);
    }

    #[test]
    fn validity_rules() {
        assert!(SteamId::new(1, Universe::Public, AccountType::Individual).is_valid());
        assert!(!SteamId::new(0, Universe::Public, AccountType::Individual).is_valid());
        assert!(
            SteamId::with_instance(1, CONSOLE_INSTANCE, Universe::Public, AccountType::Individual)
                .is_valid()
        );
        assert!(!SteamId::with_instance(1, 3, Universe::Public, AccountType::Individual).is_valid());

        assert!(SteamId::new(1, Universe::Public, AccountType::Clan).is_valid());
        assert!(!SteamId::with_instance(1, 1, Universe::Public, AccountType::Clan).is_valid());
        assert!(!SteamId::new(0, Universe::Public, AccountType::Clan).is_valid());

        assert!(!SteamId::new(1, Universe::Invalid, AccountType::Individual).is_valid());
        assert!(!SteamId::new(1, Universe::Max, AccountType::Individual).is_valid());
        assert!(!SteamId::new(1, Universe::Public, AccountType::Invalid).is_valid());
        assert!(!SteamId::new(1, Universe::Public, AccountType::Max).is_valid());
    }

    #[test]
    fn out_of_range_fields_read_as_max() {
        // type nibble 0xF, universe byte 0xFE
        let id = SteamId::from_u64(0xFEF0_0000_0000_0001);
        assert_eq!(id.account_type_raw(), 0xF);
        assert_eq!(id.account_type(), AccountType::Max);
        assert_eq!(id.universe_raw(), 0xFE);
        assert_eq!(id.account_universe(), Universe::Max);
        assert!(!id.is_valid());
    }

    #[test]
    fn setters_leave_other_fields_alone() {
        let mut id = SteamId::with_instance(
            0xFFFF_FFFF,
            0xF_FFFF,
            Universe::Dev,
            AccountType::AnonUser,
        );
        id.set_account_instance(0);
        assert_eq!(id.account_id(), 0xFFFF_FFFF);
        assert_eq!(id.account_type(), AccountType::AnonUser);
        assert_eq!(id.account_universe(), Universe::Dev);

        id.set_account_id(0);
        assert_eq!(id.account_instance(), 0);
        assert_eq!(id.account_type(), AccountType::AnonUser);
        assert_eq!(id.account_universe(), Universe::Dev);
    }

    #[test]
    fn instance_is_truncated_to_twenty_bits() {
        let mut id = SteamId::new(1, Universe::Public, AccountType::Chat);
        id.set_account_instance(0x0010_0003);
        assert_eq!(id.account_instance(), 3);
        assert_eq!(id.account_type(), AccountType::Chat);
    }

    #[test]
    fn full_set_splits_identifier() {
        let mut id = SteamId::default();
        id.full_set(0x0001_2345_0000_0042, Universe::Public, AccountType::Chat);
        assert_eq!(id.account_id(), 0x42);
        assert_eq!(id.account_instance(), 0x1_2345);
        assert_eq!(id.account_type(), AccountType::Chat);
        assert_eq!(id.account_universe(), Universe::Public);
    }

    #[test]
    fn anon_logons_and_predicates() {
        let mut id = SteamId::new(55, Universe::Public, AccountType::Individual);
        id.create_blank_anon_logon(Universe::Public);
        assert!(id.is_blank_anon_account());
        assert!(id.is_game_server_account());
        assert!(id.is_anon_account());
        assert!(!id.is_anon_user_account());

        id.create_blank_anon_user_logon(Universe::Beta);
        assert!(id.is_blank_anon_account());
        assert!(id.is_anon_user_account());
        assert!(!id.is_game_server_account());
        assert_eq!(id.account_universe(), Universe::Beta);
    }

    #[test]
    fn lobby_flag_on_chat_only() {
        let lobby = SteamId::with_instance(
            10,
            instance_flags::LOBBY,
            Universe::Public,
            AccountType::Chat,
        );
        assert!(lobby.is_lobby());
        assert!(lobby.is_chat_account());

        let not_chat = SteamId::with_instance(
            10,
            instance_flags::LOBBY,
            Universe::Public,
            AccountType::Clan,
        );
        assert!(!not_chat.is_lobby());
        assert_eq!(instance_flags::CLAN, 0x8_0000);
        assert_eq!(instance_flags::MMS_LOBBY, 0x2_0000);
    }

    #[test]
    fn clear_individual_instance_only_for_individuals() {
        let mut individual = SteamId::new(1, Universe::Public, AccountType::Individual);
        individual.clear_individual_instance();
        assert_eq!(individual.account_instance(), 0);

        let mut server = SteamId::new(1, Universe::Public, AccountType::GameServer);
        server.clear_individual_instance();
        assert_eq!(server.account_instance(), DESKTOP_INSTANCE);
    }

    #[test]
    fn static_account_key_ignores_instance() {
        let a = SteamId::with_instance(42, 1, Universe::Public, AccountType::Individual);
        let b = SteamId::with_instance(42, 2, Universe::Public, AccountType::Individual);
        assert_ne!(a, b);
        assert_eq!(a.static_account_key(), b.static_account_key());
        assert_eq!(a.static_account_key(), (1u64 << 56) + (1u64 << 52) + 42);
    }

    #[test]
    fn equality_and_hash_follow_raw_value() {
        let a = SteamId::from_u64(76_561_197_960_265_728);
        let b: SteamId = 76_561_197_960_265_728u64.into();
        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 1);
        assert_eq!(u64::from(a), 76_561_197_960_265_728);
    }

    #[test]
    fn from_str_assumes_public() {
        let id: SteamId = "STEAM_0:1:123".parse().unwrap();
        assert_eq!(id.account_universe(), Universe::Public);
        assert!("nope".parse::<SteamId>().is_err());
    }
}
