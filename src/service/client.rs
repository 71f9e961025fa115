use crate::config::ProtocolConfig;
use crate::core::emsg::EMsg;
use crate::core::envelope::{classify_with_limits, Envelope};
use crate::core::proto::CMsgClientServerList;
use crate::core::steam_id::SteamId;
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::dispatcher::Dispatcher;
use crate::protocol::handshake::HandshakeGate;
use crate::protocol::server_list::{ServerDirectory, ServerEntry, ServerKind};
use crate::utils::metrics::Metrics;
use bytes::Bytes;
use prost::Message;
use std::collections::HashSet;
use std::sync::RwLock;
use tracing::{debug, instrument, trace, warn};

/// Receive side of one connection to a connection manager.
///
/// The transport hands every received frame to
/// [`on_bytes_received`](Self::on_bytes_received). The client classifies it,
/// holds back application traffic until the encryption handshake is done,
/// folds server lists into its directory and passes the envelope to the
/// dispatcher.
///
/// A client is built per connection. Reconnecting means building a new one.
#[derive(Debug)]
pub struct CmClient {
    config: ProtocolConfig,
    gate: HandshakeGate,
    servers: RwLock<ServerDirectory>,
    dispatcher: Dispatcher,
    metrics: Metrics,
}

impl CmClient {
    pub fn new(config: ProtocolConfig) -> Self {
        Self::with_gate(config, HandshakeGate::new())
    }

    /// Builds a client around an existing gate, e.g.
    /// `HandshakeGate::assume_complete()` in tests.
    pub fn with_gate(config: ProtocolConfig, gate: HandshakeGate) -> Self {
        Self {
            config,
            gate,
            servers: RwLock::new(ServerDirectory::new()),
            dispatcher: Dispatcher::new(),
            metrics: Metrics::new(),
        }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn handshake_gate(&self) -> &HandshakeGate {
        &self.gate
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Processes one received frame.
    ///
    /// Returns `Ok(None)` when the frame was dropped: it failed to classify,
    /// or it arrived before the handshake completed. Those are logged and
    /// counted, never returned as errors. Errors are reserved for lock
    /// poisoning and handler failures.
    #[instrument(level = "debug", skip(self, data), fields(len = data.len()))]
    pub fn on_bytes_received(&self, data: &[u8]) -> Result<Option<Envelope>> {
        self.metrics.frame_received(data.len());

        let envelope = match classify_with_limits(
            Bytes::copy_from_slice(data),
            self.gate.is_complete(),
            &self.config.limits,
        ) {
            Ok(envelope) => envelope,
            Err(failure) => {
                warn!(error = %failure, "Dropping undecodable frame");
                self.metrics.decode_failed(&failure);
                return Ok(None);
            }
        };
        self.metrics.envelope_classified(envelope.shape());

        let kind = envelope.kind();
        if self.config.client.enforce_handshake_gate && !kind.is_encryption_handshake() {
            if let Err(e) = self.gate.ensure_complete() {
                debug!(?kind, reason = %e, "Dropping message");
                self.metrics.gate_drop();
                return Ok(None);
            }
        }

        if kind == EMsg::ClientServerList && self.config.client.track_server_list {
            self.merge_server_list(&envelope)?;
        }

        match self.dispatcher.dispatch(&envelope) {
            Ok(()) => {}
            Err(ProtocolError::UnhandledMessage(kind)) => {
                trace!(?kind, "No handler registered");
                self.metrics.unhandled();
            }
            Err(e) => {
                self.metrics.handler_error();
                return Err(e);
            }
        }

        Ok(Some(envelope))
    }

    /// Known servers of `kind`; empty when none have been announced.
    pub fn servers_of_type(&self, kind: ServerKind) -> Result<HashSet<ServerEntry>> {
        let servers = self
            .servers
            .read()
            .map_err(|_| ProtocolError::Custom(constants::ERR_DIRECTORY_READ_LOCK.to_string()))?;
        Ok(servers.lookup(kind))
    }

    /// Total servers known across all kinds.
    pub fn server_count(&self) -> Result<usize> {
        let servers = self
            .servers
            .read()
            .map_err(|_| ProtocolError::Custom(constants::ERR_DIRECTORY_READ_LOCK.to_string()))?;
        Ok(servers.len())
    }

    /// Reads legacy `STEAM_X:Y:Z` text in the configured default universe.
    pub fn parse_steam_id(&self, text: &str) -> Result<SteamId> {
        Ok(SteamId::parse_legacy(
            text,
            self.config.client.default_universe,
        )?)
    }

    fn merge_server_list(&self, envelope: &Envelope) -> Result<()> {
        // Only the structured form carries a decodable body.
        if !envelope.is_proto_buf() {
            debug!("Ignoring non-protobuf server list");
            return Ok(());
        }

        let body = match CMsgClientServerList::decode(envelope.payload().clone()) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Server list body failed to decode");
                return Ok(());
            }
        };

        let entries: Vec<ServerEntry> = body
            .servers
            .iter()
            .filter_map(|server| {
                let entry = ServerEntry::from_proto(server);
                if entry.is_none() {
                    trace!(?server, "Skipping incomplete server entry");
                }
                entry
            })
            .collect();

        let mut servers = self
            .servers
            .write()
            .map_err(|_| ProtocolError::Custom(constants::ERR_DIRECTORY_WRITE_LOCK.to_string()))?;
        let added = servers.merge(entries);
        self.metrics.servers_added(added);
        debug!(added, total = servers.len(), "Merged server list");
        Ok(())
    }
}
