//! Encryption handshake gate.
//!
//! The key exchange itself lives outside this crate. All the core tracks is
//! whether it has finished for the connection: before that, only the three
//! `ChannelEncrypt*` messages are legitimate traffic.
//!
//! The gate is connection-scoped. It is owned by the connection object and
//! never reset; a reconnect builds a new one.

use crate::error::{ProtocolError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Tracks completion of the encrypted-session handshake.
#[derive(Debug, Default)]
pub struct HandshakeGate {
    complete: AtomicBool,
}

impl HandshakeGate {
    /// A gate for a fresh connection: incomplete.
    pub const fn new() -> Self {
        Self {
            complete: AtomicBool::new(false),
        }
    }

    /// A gate that starts complete, for test doubles that skip the key exchange.
    #[cfg(any(test, feature = "test-util"))]
    pub const fn assume_complete() -> Self {
        Self {
            complete: AtomicBool::new(true),
        }
    }

    /// Marks the handshake as finished. Called once by the encryption procedure.
    pub fn complete(&self) {
        if self.complete.swap(true, Ordering::AcqRel) {
            warn!("Handshake gate completed more than once");
        } else {
            debug!("Encryption handshake complete");
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }

    /// `Err(HandshakeIncomplete)` until [`complete`](Self::complete) has run.
    pub fn ensure_complete(&self) -> Result<()> {
        if self.is_complete() {
            Ok(())
        } else {
            Err(ProtocolError::HandshakeIncomplete)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn starts_incomplete() {
        assert!(!HandshakeGate::new().is_complete());
        assert!(!HandshakeGate::default().is_complete());
    }

    #[test]
    fn complete_is_sticky() {
        let gate = HandshakeGate::new();
        gate.complete();
        assert!(gate.is_complete());
        gate.complete();
        assert!(gate.is_complete());
    }

    #[test]
    fn ensure_complete_reports_pending_handshake() {
        let gate = HandshakeGate::new();
        assert!(matches!(
            gate.ensure_complete(),
            Err(ProtocolError::HandshakeIncomplete)
        ));
        gate.complete();
        assert!(gate.ensure_complete().is_ok());
    }

    #[test]
    fn assumed_complete_gate() {
        assert!(HandshakeGate::assume_complete().is_complete());
    }

    #[test]
    fn completion_is_visible_across_threads() {
        let gate = Arc::new(HandshakeGate::new());
        let writer = Arc::clone(&gate);
        thread::spawn(move || writer.complete()).join().unwrap();
        assert!(gate.is_complete());
    }
}
