//! ARQ Sender - reliable file transfer over UDP
//!
//! Sends one file to an `arq-recv` peer using stop-and-wait or Go-Back-N.

use anyhow::Context;
use arq::{SenderSession, UdpChannel};
use arq_cli::{init_logging, local_bind_addr, print_send_summary, resolve_peer, Config, ModeName};
use clap::Parser;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "arq-send")]
#[command(about = "Send a file over UDP with stop-and-wait or Go-Back-N ARQ", long_about = None)]
struct Args {
    /// Host address of the receiver
    host: String,

    /// UDP port the receiver takes data on
    peer_port: u16,

    /// Local UDP port acks are received on
    local_port: u16,

    /// File to transfer
    file: PathBuf,

    /// Go-Back-N window size (1-127)
    #[arg(short, long)]
    window: Option<usize>,

    /// ARQ discipline
    #[arg(short, long, value_enum)]
    mode: Option<ModeName>,

    /// Retransmission timeout in milliseconds
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// TOML configuration file ([sender] section)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut settings = Config::load_optional(args.config.as_ref())
        .context("failed to load configuration")?
        .sender
        .unwrap_or_default();
    if let Some(mode) = args.mode {
        settings.mode = mode;
    }
    if let Some(window) = args.window {
        settings.window = window;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        settings.timeout_ms = timeout_ms;
    }
    let config = settings.transfer_config()?;

    let file = File::open(&args.file)
        .with_context(|| format!("failed to open {}", args.file.display()))?;

    let peer = resolve_peer(&args.host, args.peer_port)?;
    let local = local_bind_addr(peer, args.local_port);
    let channel = UdpChannel::bind(local, peer)
        .with_context(|| format!("failed to bind {}", local))?;

    tracing::info!(%local, %peer, file = %args.file.display(), mode = %config.mode, "ARQ sender starting");

    let report = SenderSession::new(Arc::new(channel), config).send(BufReader::new(file))?;

    print_send_summary(&args.file, config.retransmit_timeout, config.mode, &report);
    Ok(())
}
