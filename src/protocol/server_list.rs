//! Known servers, grouped by server type.
//!
//! Server lists arrive repeatedly over a session and overlap. Merging is
//! idempotent per `(kind, address, port)` and purely additive: nothing is ever
//! evicted here.
//!
//! The directory holds no lock. Whoever shares it across threads wraps it
//! (the client keeps it in an `RwLock`).

use crate::core::proto::c_msg_client_server_list::Server;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::net::Ipv4Addr;
use tracing::{debug, trace};

/// Server type as sent on the wire.
///
/// Values without a named constant are kept as-is so unknown types still
/// deduplicate by value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServerKind(pub i32);

impl ServerKind {
    pub const INVALID: Self = Self(-1);
    pub const SHELL: Self = Self(0);
    pub const GM: Self = Self(1);
    pub const AM: Self = Self(3);
    pub const BS: Self = Self(4);
    pub const VS: Self = Self(5);
    pub const ATS: Self = Self(6);
    pub const CM: Self = Self(7);
    pub const FBS: Self = Self(8);
    pub const BOX_MONITOR: Self = Self(9);
    pub const SS: Self = Self(10);
    pub const DRMS: Self = Self(11);
    pub const CONSOLE: Self = Self(13);
    pub const PICS: Self = Self(14);
    pub const CLIENT: Self = Self(15);
    pub const DP: Self = Self(17);
    pub const WG: Self = Self(18);
    pub const SM: Self = Self(19);
    pub const UFS: Self = Self(21);
    pub const UTIL: Self = Self(23);
    pub const DSS: Self = Self(24);
    pub const APP_INFORMATION: Self = Self(26);
    pub const FTS: Self = Self(28);
    pub const CS: Self = Self(36);
    pub const GC: Self = Self(37);
    pub const WEB_API: Self = Self(40);
    pub const UDS: Self = Self(41);
    pub const MMS: Self = Self(42);

    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::INVALID => "Invalid",
            Self::SHELL => "Shell",
            Self::GM => "GM",
            Self::AM => "AM",
            Self::BS => "BS",
            Self::VS => "VS",
            Self::ATS => "ATS",
            Self::CM => "CM",
            Self::FBS => "FBS",
            Self::BOX_MONITOR => "BoxMonitor",
            Self::SS => "SS",
            Self::DRMS => "DRMS",
            Self::CONSOLE => "Console",
            Self::PICS => "PICS",
            Self::CLIENT => "Client",
            Self::DP => "DP",
            Self::WG => "WG",
            Self::SM => "SM",
            Self::UFS => "UFS",
            Self::UTIL => "Util",
            Self::DSS => "DSS",
            Self::APP_INFORMATION => "AppInformation",
            Self::FTS => "FTS",
            Self::CS => "CS",
            Self::GC => "GC",
            Self::WEB_API => "WebAPI",
            Self::UDS => "UDS",
            Self::MMS => "MMS",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Debug for ServerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "ServerKind::{name}"),
            None => write!(f, "ServerKind({})", self.0),
        }
    }
}

/// One server endpoint of a given type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServerEntry {
    pub kind: ServerKind,
    pub addr: Ipv4Addr,
    pub port: u16,
}

impl ServerEntry {
    pub const fn new(kind: ServerKind, addr: Ipv4Addr, port: u16) -> Self {
        Self { kind, addr, port }
    }

    /// Converts a server-list body entry. Entries without an address or
    /// port, or with a port that does not fit in 16 bits, are rejected.
    pub fn from_proto(server: &Server) -> Option<Self> {
        let ip = server.server_ip?;
        let port = u16::try_from(server.server_port?).ok()?;
        let kind = ServerKind(server.server_type.unwrap_or(ServerKind::INVALID.0));
        Some(Self::new(kind, Ipv4Addr::from(ip), port))
    }
}

/// Deduplicating registry of servers by type.
#[derive(Debug, Default, Clone)]
pub struct ServerDirectory {
    servers: HashMap<ServerKind, HashSet<ServerEntry>>,
}

impl ServerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds entries not already present. Returns how many were new.
    pub fn merge<I>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = ServerEntry>,
    {
        let mut added = 0;
        for entry in entries {
            if self.servers.entry(entry.kind).or_default().insert(entry) {
                trace!(?entry, "Server added to directory");
                added += 1;
            }
        }
        if added > 0 {
            debug!(added, total = self.len(), "Server directory updated");
        }
        added
    }

    /// Servers of `kind`; empty when none are known.
    pub fn lookup(&self, kind: ServerKind) -> HashSet<ServerEntry> {
        self.servers.get(&kind).cloned().unwrap_or_default()
    }

    /// Borrowing variant of [`lookup`](Self::lookup).
    pub fn get(&self, kind: ServerKind) -> Option<&HashSet<ServerEntry>> {
        self.servers.get(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = ServerKind> + '_ {
        self.servers.keys().copied()
    }

    /// Total entries across all kinds.
    pub fn len(&self) -> usize {
        self.servers.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
