// ============================================
// File: crates/stls-client/src/main.rs
// ============================================
//! # stls Client Entry Point
//!
//! ## Creation Reason
//! Command-line client: fetch the payload a server streams over stls and
//! write it to a file or standard output.
//!
//! ## Usage
//! ```bash
//! stls-client image                       # writes image.png
//! stls-client - --host 10.0.0.5 -p 9000   # writes to stdout
//! stls-client image -c client.toml -v     # config file, debug logging
//! stls-client image --legacy-framing      # reference server compatibility
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Logs go to stderr; stdout may carry the payload
//! - Exit code 1 on any failure that produces no output
//!
//! ## Last Modified
//! v0.1.0 - Initial CLI implementation

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stls_client::{Client, ClientConfig, ClientError, Sink};
use stls_core::protocol::FrameLayout;

// ============================================
// CLI Definition
// ============================================

/// Fetch a payload from an stls server.
#[derive(Parser, Debug)]
#[command(name = "stls-client")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output name (the configured extension is appended); "-" for stdout
    file: String,

    /// Server host
    #[arg(long)]
    host: Option<String>,

    /// Server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use the header layout of the reference server
    #[arg(long)]
    legacy_framing: bool,
}

// ============================================
// Main
// ============================================

fn main() {
    let cli = Cli::parse();

    let config = cli
        .config
        .as_ref()
        .map_or_else(|| Ok(ClientConfig::default()), ClientConfig::load);

    let level = if cli.verbose {
        "debug"
    } else {
        config.as_ref().map_or("info", |c| c.logging.level.as_str())
    };
    init_logging(level);

    let result = config
        .map_err(anyhow::Error::from)
        .and_then(|config| run(&cli, config));

    if let Err(e) = result {
        if matches!(e.downcast_ref::<ClientError>(), Some(ClientError::Connect { .. })) {
            eprintln!("Could not make a connection to the server");
        }
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli, mut config: ClientConfig) -> anyhow::Result<()> {
    if let Some(host) = &cli.host {
        config.connection.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.connection.port = port;
    }
    if cli.legacy_framing {
        config.protocol.frame_layout = FrameLayout::Legacy;
    }
    config.validate()?;

    let sink = Sink::from_arg(&cli.file, &config.output.extension);
    info!(server = %config.server_addr(), output = %sink, "Starting transfer");

    let transfer = Client::new(config).run()?;
    let report = &transfer.report;
    if report.end.is_abnormal() {
        warn!(end = ?report.end, "Transfer ended early, output may be incomplete");
    }
    match report.last_sequence() {
        Some(last) => info!(last_sequence = last, bytes = report.bytes, "Transfer complete"),
        None => warn!("No records were accepted"),
    }

    sink.write(&transfer.data)?;
    Ok(())
}

/// Initializes the tracing subscriber on stderr.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok();
}
