//! Observability and Metrics
//!
//! Counters for the receive path: what was classified, what was dropped and
//! why, and how the server directory grew.
//!
//! Uses atomic counters for thread-safe metrics collection.

use crate::core::envelope::EnvelopeShape;
use crate::error::DecodeFailure;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Metrics collector for receive-path operations
#[derive(Debug)]
pub struct Metrics {
    /// Total frames handed to the receive path
    pub frames_received: AtomicU64,
    /// Total bytes handed to the receive path
    pub bytes_received: AtomicU64,
    /// Envelopes classified with the basic header
    pub handshake_envelopes: AtomicU64,
    /// Envelopes classified with the protobuf header
    pub structured_envelopes: AtomicU64,
    /// Envelopes classified with the extended header
    pub legacy_envelopes: AtomicU64,
    /// Frames too short for the header they claimed
    pub truncated_frames: AtomicU64,
    /// Frames whose kind is not in the catalogue
    pub unknown_kind_frames: AtomicU64,
    /// Frames with an invalid header
    pub malformed_frames: AtomicU64,
    /// Frames dropped because the handshake had not completed
    pub gate_drops: AtomicU64,
    /// Envelopes without a registered handler
    pub unhandled_messages: AtomicU64,
    /// Handlers that returned an error
    pub handler_errors: AtomicU64,
    /// New entries added to the server directory
    pub servers_merged: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            frames_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            handshake_envelopes: AtomicU64::new(0),
            structured_envelopes: AtomicU64::new(0),
            legacy_envelopes: AtomicU64::new(0),
            truncated_frames: AtomicU64::new(0),
            unknown_kind_frames: AtomicU64::new(0),
            malformed_frames: AtomicU64::new(0),
            gate_drops: AtomicU64::new(0),
            unhandled_messages: AtomicU64::new(0),
            handler_errors: AtomicU64::new(0),
            servers_merged: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a frame entering the receive path
    pub fn frame_received(&self, bytes: usize) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Record a successful classification
    pub fn envelope_classified(&self, shape: EnvelopeShape) {
        let counter = match shape {
            EnvelopeShape::Handshake => &self.handshake_envelopes,
            EnvelopeShape::Structured => &self.structured_envelopes,
            EnvelopeShape::Legacy => &self.legacy_envelopes,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed classification
    pub fn decode_failed(&self, failure: &DecodeFailure) {
        let counter = match failure {
            DecodeFailure::Truncated { .. } => &self.truncated_frames,
            DecodeFailure::UnknownKind(_) => &self.unknown_kind_frames,
            DecodeFailure::Malformed(_) => &self.malformed_frames,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a frame dropped before the handshake completed
    pub fn gate_drop(&self) {
        self.gate_drops.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an envelope nobody handled
    pub fn unhandled(&self) {
        self.unhandled_messages.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a handler error
    pub fn handler_error(&self) {
        self.handler_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record servers added to the directory
    pub fn servers_added(&self, count: usize) {
        self.servers_merged
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Get current snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            handshake_envelopes: self.handshake_envelopes.load(Ordering::Relaxed),
            structured_envelopes: self.structured_envelopes.load(Ordering::Relaxed),
            legacy_envelopes: self.legacy_envelopes.load(Ordering::Relaxed),
            truncated_frames: self.truncated_frames.load(Ordering::Relaxed),
            unknown_kind_frames: self.unknown_kind_frames.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
            gate_drops: self.gate_drops.load(Ordering::Relaxed),
            unhandled_messages: self.unhandled_messages.load(Ordering::Relaxed),
            handler_errors: self.handler_errors.load(Ordering::Relaxed),
            servers_merged: self.servers_merged.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            frames_received = snapshot.frames_received,
            bytes_received = snapshot.bytes_received,
            handshake_envelopes = snapshot.handshake_envelopes,
            structured_envelopes = snapshot.structured_envelopes,
            legacy_envelopes = snapshot.legacy_envelopes,
            decode_failures = snapshot.decode_failures(),
            gate_drops = snapshot.gate_drops,
            unhandled_messages = snapshot.unhandled_messages,
            handler_errors = snapshot.handler_errors,
            servers_merged = snapshot.servers_merged,
            uptime_seconds = snapshot.uptime_seconds,
            "Protocol metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub frames_received: u64,
    pub bytes_received: u64,
    pub handshake_envelopes: u64,
    pub structured_envelopes: u64,
    pub legacy_envelopes: u64,
    pub truncated_frames: u64,
    pub unknown_kind_frames: u64,
    pub malformed_frames: u64,
    pub gate_drops: u64,
    pub unhandled_messages: u64,
    pub handler_errors: u64,
    pub servers_merged: u64,
    pub uptime_seconds: u64,
}

impl MetricsSnapshot {
    pub fn envelopes(&self) -> u64 {
        self.handshake_envelopes + self.structured_envelopes + self.legacy_envelopes
    }

    pub fn decode_failures(&self) -> u64 {
        self.truncated_frames + self.unknown_kind_frames + self.malformed_frames
    }
}

/// Global metrics instance (lazy static for simplicity)
static METRICS: once_cell::sync::Lazy<Metrics> = once_cell::sync::Lazy::new(Metrics::new);

/// Get the global metrics instance
pub fn global_metrics() -> &'static Metrics {
    &METRICS
}

/// Initialize metrics collection (call once at startup)
pub fn init_metrics() {
    let _ = global_metrics();
    debug!("Metrics collection initialized");
}
