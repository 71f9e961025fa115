//! # Utility Modules
//!
//! Supporting utilities for logging and metrics.
//!
//! ## Components
//! - **Logging**: Structured logging setup from [`LoggingConfig`](crate::config::LoggingConfig)
//! - **Metrics**: Thread-safe receive-path counters

pub mod logging;
pub mod metrics;
