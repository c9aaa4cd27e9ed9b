//! Command line argument parsing
//!
//! This module handles CLI argument parsing with subcommands:
//! - `status`: Show health, queue and rate-limit state for every service
//! - `probe`: Issue one request through the full pipeline
//! - `show-config`: Show configuration discovery information

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "outbound")]
#[command(author = "Operations Dashboard Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Resilient outbound API client layer: per-service rate limiting, circuit breaking and retries"
)]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show health, queue and rate-limit state for every configured service
    Status {
        /// Configuration file path
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,
    },
    /// Issue one request through the full pipeline against a configured service
    Probe {
        /// Service name (shopify, publer, chatwoot)
        service: String,
        /// Request path relative to the service base URL
        path: String,
        /// HTTP method
        #[arg(short = 'X', long = "method", default_value = "GET")]
        method: String,
        /// JSON request body
        #[arg(short = 'd', long = "data")]
        body: Option<String>,
        /// Overall deadline in milliseconds
        #[arg(long = "deadline-ms")]
        deadline_ms: Option<u64>,
        /// Configuration file path
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,
    },
    /// Show configuration discovery information
    ShowConfig,
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }
}
