//! ARQ Receiver - reliable file transfer over UDP
//!
//! Receives one file from an `arq-send` peer and writes it to disk. A non-zero
//! reliability number drops roughly one valid frame in that many, to exercise
//! the sender's retransmission path.

use anyhow::Context;
use arq::{DivisorLoss, ReceiverSession, UdpChannel};
use arq_cli::{init_logging, local_bind_addr, print_receive_summary, resolve_peer, Config, ModeName};
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "arq-recv")]
#[command(about = "Receive a file over UDP with stop-and-wait or Go-Back-N ARQ", long_about = None)]
struct Args {
    /// Host address of the sender
    host: String,

    /// UDP port the sender takes acks on
    peer_port: u16,

    /// Local UDP port data is received on
    local_port: u16,

    /// Reliability number: drop about one frame in N (0 = no drops)
    reliability: u32,

    /// File to write received data to
    file: PathBuf,

    /// ARQ discipline; must match the sender
    #[arg(short, long, value_enum)]
    mode: Option<ModeName>,

    /// Seed for the simulated loss generator
    #[arg(long)]
    seed: Option<u64>,

    /// TOML configuration file ([receiver] section)
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
        .receiver
        .unwrap_or_default();
    if let Some(mode) = args.mode {
        settings.mode = mode;
    }
    if args.seed.is_some() {
        settings.seed = args.seed;
    }
    settings.reliability = args.reliability;
    let config = settings.transfer_config()?;

    let loss = match settings.seed {
        Some(seed) => DivisorLoss::with_seed(settings.reliability, seed),
        None => DivisorLoss::new(settings.reliability),
    };

    let file = File::create(&args.file)
        .with_context(|| format!("failed to create {}", args.file.display()))?;

    let peer = resolve_peer(&args.host, args.peer_port)?;
    let local = local_bind_addr(peer, args.local_port);
    let channel = UdpChannel::bind(local, peer)
        .with_context(|| format!("failed to bind {}", local))?;

    tracing::info!(
        %local,
        %peer,
        file = %args.file.display(),
        mode = %config.mode,
        reliability = settings.reliability,
        "ARQ receiver starting"
    );

    let report = ReceiverSession::new(Arc::new(channel), config)
        .with_loss_policy(loss)
        .receive(BufWriter::new(file))?;

    print_receive_summary(&args.file, &report);
    Ok(())
}
