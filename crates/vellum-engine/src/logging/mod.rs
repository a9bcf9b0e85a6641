//! Logging utilities.
//!
//! Everything logs through the `log` facade; this module only installs the
//! `env_logger` backend for binaries.

mod init;

pub use init::{LoggingConfig, init_logging};
