//! echo - line echo server on localhost:8080.
//!
//! Usage:
//!   echo pooled  [ECHO_WAIT_MS] [THREADS]   Fixed pool of worker tasks
//!   echo virtual [ECHO_WAIT_MS]             One task per connection

use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use fanout_net::{DEFAULT_ECHO_WAIT, EchoConfig, EchoServer, Threading, default_workers};

#[derive(Parser)]
#[command(name = "echo", version, about = "Echo one line per connection back to the sender")]
struct Cli {
    /// Threading strategy: pooled or virtual
    threading: Threading,

    /// Time to wait before echoing, in milliseconds
    #[arg(default_value_t = DEFAULT_ECHO_WAIT.as_millis() as u64)]
    echo_wait_ms: u64,

    /// Number of worker tasks for the pooled server
    #[arg(default_value_t = default_workers())]
    threads: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    setup_logging();

    let config = EchoConfig::builder()
        .echo_wait(Duration::from_millis(cli.echo_wait_ms))
        .threading(cli.threading)
        .workers(cli.threads)
        .build()
        .context("Invalid configuration")?;

    let server = EchoServer::new(config);
    let listener = server
        .bind()
        .await
        .with_context(|| format!("Failed to listen on {}", server.config().addr))?;

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupt received, shutting down...");
        }
        on_signal.cancel();
    });

    println!(
        "Server up - start listening on {}...",
        server.config().addr.port()
    );
    let stats = server.serve(listener, shutdown).await;
    println!(
        "Served {} connections ({} echoed, {} failed)",
        stats.accepted, stats.echoed, stats.failed
    );

    Ok(())
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("echo=info,fanout_net=info,warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
