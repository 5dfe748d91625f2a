//! bytebridge
//!
//! Point-to-point byte relay between TCP client, single-peer TCP server, and
//! serial endpoints, with optional traffic mirroring.

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing::info;

use bytebridge_core::config::{self, Settings};
use bytebridge_core::tracing_init::{default_filter, init_tracing};
use bytebridge_core::{ConnectionSpec, SniffSpec};
use bytebridge_relay::{RelayEngine, Topology, TopologySpec};

const CONNECTION_HELP: &str = "\
CONNECTION1 and CONNECTION2 are specified by a string of the form \"type:details\":
    <type>      <details>
    ipclient    host:port
    ipserver    host:port
    serial      portname:baudrate

SNIFF mirrors the traffic received on one connection. It is specified like a
connection, prefixed with the connection to mirror: \"conn:type:details\":
    <conn>      <type>      <details>
    1           as above    as above
    2";

#[derive(Parser, Debug)]
#[command(name = "bytebridge")]
#[command(
    version,
    about = "bytebridge - bidirectional byte relay between TCP and serial endpoints",
    after_help = CONNECTION_HELP,
    arg_required_else_help = true
)]
struct Args {
    /// First connection (type:details).
    connection1: ConnectionSpec,

    /// Second connection (type:details).
    connection2: ConnectionSpec,

    /// Sniff connections (conn:type:details), at most one per connection.
    #[arg(num_args = 0..=2)]
    sniff: Vec<SniffSpec>,

    /// Path to a JSON settings file.
    #[arg(long, env = "BYTEBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Relay tick period in milliseconds.
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Maximum bytes buffered per connection while its peer is not ready;
    /// the oldest bytes are dropped beyond this. Unbounded when unset.
    #[arg(long)]
    max_buffer: Option<usize>,

    /// Log level filter (e.g. "info", "debug", "trace").
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, env = "BYTEBRIDGE_LOG_JSON")]
    log_json: bool,
}

impl Args {
    fn settings(&self) -> bytebridge_core::Result<Settings> {
        let mut settings = config::load_settings(self.config.as_deref())?;
        if let Some(tick_ms) = self.tick_ms {
            settings.relay.tick_interval_ms = tick_ms;
        }
        if let Some(max_buffer) = self.max_buffer {
            settings.relay.max_buffered_bytes = Some(max_buffer);
        }
        if let Some(level) = &self.log_level {
            settings.logging.level.clone_from(level);
        }
        settings.logging.json |= self.log_json;
        config::validate(&settings)?;
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (args, topology_spec) = parse_args();
    let settings = args.settings()?;

    init_tracing(
        &default_filter(&settings.logging.level),
        settings.logging.json,
    );

    info!(
        version = env!("CARGO_PKG_VERSION"),
        conn1 = %topology_spec.conn1,
        conn2 = %topology_spec.conn2,
        tick_ms = settings.relay.tick_interval_ms,
        max_buffered_bytes = ?settings.relay.max_buffered_bytes,
        "Starting bytebridge"
    );

    let topology = Topology::build(&topology_spec, settings.relay.max_buffered_bytes).await;
    let engine = RelayEngine::new(topology, settings.relay.tick_interval());

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let relay = tokio::spawn(engine.run(shutdown_rx));

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal");
    let _ = shutdown_tx.send(true);
    let stats = relay.await?;

    info!(
        ticks = stats.ticks,
        forwarded_1_to_2 = stats.first_to_second.forwarded_bytes,
        forwarded_2_to_1 = stats.second_to_first.forwarded_bytes,
        "Relay stopped"
    );
    Ok(())
}

/// Parse the command line, exiting with status 1 and usage on stdout for any
/// argument error.
fn parse_args() -> (Args, TopologySpec) {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                usage_and_exit("Argument must be provided.")
            }
            _ => usage_and_exit(&err.render().to_string()),
        },
    };
    match TopologySpec::new(
        args.connection1.clone(),
        args.connection2.clone(),
        args.sniff.clone(),
    ) {
        Ok(spec) => (args, spec),
        Err(e) => usage_and_exit(&format!("error: {e}")),
    }
}

#[allow(clippy::print_stdout)]
fn usage_and_exit(message: &str) -> ! {
    println!("{}\n", message.trim_end());
    println!("{}", Args::command().render_long_help());
    std::process::exit(1);
}
