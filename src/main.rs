//! Entry point for `gbn-transfer`.
//!
//! Parses CLI arguments and dispatches into either **server** (receive a
//! file) or **client** (send a file) mode.  All protocol work is delegated
//! to library modules; this file owns only process setup (logging, argument
//! parsing), file I/O at the edges, and the final statistics printout.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::process;

use clap::{ArgGroup, Parser, ValueEnum};
use tokio::fs;

use gbn_transfer::config;
use gbn_transfer::fault::{FaultPolicy, NoFault, SkipSendOnce, WithholdAckOnce};
use gbn_transfer::packet::MAX_PAYLOAD;
use gbn_transfer::report::throughput_mbps;
use gbn_transfer::session::Session;
use gbn_transfer::socket::Socket;

/// Chunk index used for staged losses when `--discard` is not given.
const DEFAULT_FAULT_INDEX: u16 = 4;

/// Reliable file transfer over UDP using Go-Back-N.
#[derive(Parser)]
#[command(author, version, about)]
#[command(group(ArgGroup::new("mode").required(true).args(["server", "client"])))]
struct Cli {
    /// Run in server mode (receive and save a file).
    #[arg(short = 's', long)]
    server: bool,

    /// Run in client mode (send a file).
    #[arg(short = 'c', long)]
    client: bool,

    /// Server IP to bind to (server) or connect to (client).
    #[arg(short = 'i', long = "serverIP", default_value = "127.0.0.1",
          value_parser = config::parse_ip)]
    server_ip: IpAddr,

    /// Port number to listen on / connect to, in [1024, 65535].
    #[arg(short = 'p', long, default_value = "8080", value_parser = config::parse_port)]
    port: u16,

    /// Window size used for reliable transmission (3, 5, or 10).
    #[arg(short = 'w', long = "windowSize", default_value = "5",
          value_parser = config::parse_window_size)]
    window_size: u16,

    /// File to transfer (client) or destination path (server).
    #[arg(short = 'f', long)]
    file: PathBuf,

    /// Staged-loss demonstration to run.
    #[arg(short = 't', long = "testCase", value_enum)]
    test_case: Option<TestCase>,

    /// Chunk index for the staged loss (negative disables; with --testCase
    /// the index defaults to 4).
    #[arg(short = 'd', long, default_value_t = -1, allow_negative_numbers = true)]
    discard: i64,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TestCase {
    /// The receiver withholds one ACK, forcing a window retransmit.
    #[value(name = "skip_ack")]
    SkipAck,
    /// The sender suppresses one first transmission.
    #[value(name = "skip_seq_num")]
    SkipSeqNum,
}

#[tokio::main]
async fn main() {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();

    let result = if cli.server {
        run_server(&cli).await
    } else {
        run_client(&cli).await
    };

    if let Err(e) = result {
        log::error!("{e}");
        process::exit(1);
    }
}

/// Chunk index at which a staged loss fires.
fn fault_index(cli: &Cli) -> u16 {
    u16::try_from(cli.discard).unwrap_or(DEFAULT_FAULT_INDEX)
}

/// `true` when no fault injection is active, so the run's throughput figure
/// is meaningful.
fn report_stats(cli: &Cli) -> bool {
    cli.test_case.is_none() && cli.discard < 0
}

async fn run_client(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(&cli.file)
        .await
        .map_err(|e| format!("unable to read {}: {e}", cli.file.display()))?;
    if data.is_empty() {
        return Err(format!("the file {} is empty", cli.file.display()).into());
    }
    let chunks: Vec<Vec<u8>> = data.chunks(MAX_PAYLOAD).map(|c| c.to_vec()).collect();
    log::info!("sending {} as {} chunk(s)", cli.file.display(), chunks.len());

    let socket = Socket::bind(SocketAddr::from(([0, 0, 0, 0], 0))).await?;
    let peer = SocketAddr::new(cli.server_ip, cli.port);
    let session = Session::connect(socket, peer, cli.window_size).await?;

    let mut fault: Box<dyn FaultPolicy> = match cli.test_case {
        Some(TestCase::SkipSeqNum) => Box::new(SkipSendOnce::new(fault_index(cli))),
        _ => Box::new(NoFault),
    };
    let stats = session.send_file(&chunks, fault.as_mut()).await?;

    if report_stats(cli) {
        println!("Sent bytes: {}", stats.bytes_sent);
        println!("{:.2} Mbps", throughput_mbps(stats.bytes_sent, stats.elapsed));
    }
    Ok(())
}

async fn run_server(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr = SocketAddr::new(cli.server_ip, cli.port);
    let socket = Socket::bind(bind_addr)
        .await
        .map_err(|e| format!("bind to {bind_addr} failed: {e}"))?;
    log::info!("listening on {bind_addr}");

    let session = Session::accept(socket, cli.window_size).await?;

    let mut fault: Box<dyn FaultPolicy> = match cli.test_case {
        Some(TestCase::SkipAck) => Box::new(WithholdAckOnce::new(fault_index(cli))),
        None if cli.discard >= 0 => Box::new(WithholdAckOnce::new(fault_index(cli))),
        _ => Box::new(NoFault),
    };
    let stats = session.recv_file(fault.as_mut()).await?;

    fs::write(&cli.file, &stats.data)
        .await
        .map_err(|e| format!("unable to write {}: {e}", cli.file.display()))?;
    log::info!("saved {} bytes to {}", stats.data.len(), cli.file.display());

    if report_stats(cli) {
        println!("Received bytes: {}", stats.bytes_received);
        println!(
            "{:.2} Mbps",
            throughput_mbps(stats.bytes_received, stats.elapsed)
        );
    }
    Ok(())
}
