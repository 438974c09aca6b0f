//! Logging utilities.
//!
//! The engine only emits through the `log` facade. Binaries and tests that want
//! to see adapter selection, pipeline creation and per-call layouts install the
//! `env_logger` backend here.

mod init;

pub use init::{LoggingConfig, init_logging};
