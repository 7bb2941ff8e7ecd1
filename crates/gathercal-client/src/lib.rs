//! Command-line interface for gathercal.
//!
//! This crate provides the `gathercal` binary: rule inspection, one-shot
//! expansion, calendar rendering and the foreground daemon.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod render;

pub use cli::Cli;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
