//! send - send numbered messages to the echo server on localhost:8080.
//!
//! Usage:
//!   send pooled  [MESSAGE_COUNT] [THREADS]   Fixed pool of sender tasks
//!   send virtual [MESSAGE_COUNT]             One task per message

use std::time::Instant;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use tracing_subscriber::EnvFilter;

use fanout_net::{DEFAULT_MESSAGE_COUNT, SendConfig, Sender, Threading, default_workers};

#[derive(Parser)]
#[command(name = "send", version, about = "Send a batch of messages and wait for the echoes")]
struct Cli {
    /// Threading strategy: pooled or virtual
    threading: Threading,

    /// Number of messages to send
    #[arg(default_value_t = DEFAULT_MESSAGE_COUNT)]
    message_count: usize,

    /// Number of worker tasks for the pooled sender
    #[arg(default_value_t = default_workers())]
    threads: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    setup_logging();

    let config = SendConfig::builder()
        .message_count(cli.message_count)
        .threading(cli.threading)
        .workers(cli.threads)
        .build()
        .context("Invalid configuration")?;

    println!(
        "Sender up - start sending {} messages...",
        config.message_count
    );
    let sender = Sender::new(config);

    let start = Instant::now();
    let report = sender.send_messages().await.context("Sending failed")?;
    let elapsed = start.elapsed();

    println!(
        "Done in {}ms\n(NOTE: This measurement is very unreliable for various reasons! E.g. logging itself.)",
        elapsed.as_millis()
    );
    if report.failed > 0 {
        println!("{} of {} messages failed", report.failed, report.sent + report.failed);
    }

    Ok(())
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("send=info,fanout_net=info,warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
