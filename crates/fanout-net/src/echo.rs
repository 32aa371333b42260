//! Line echo server.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{EchoConfig, Threading};
use crate::error::{NetError, NetResult};

/// Counters collected while serving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeStats {
    /// Connections accepted.
    pub accepted: u64,
    /// Connections that got their line echoed.
    pub echoed: u64,
    /// Connections that failed.
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    accepted: AtomicU64,
    echoed: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn record(&self, result: NetResult<String>) {
        match result {
            Ok(_) => {
                self.echoed.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                warn!(error = %err, "connection failed");
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn record_join(&self, joined: Result<NetResult<String>, JoinError>) {
        match joined {
            Ok(result) => self.record(result),
            Err(err) => self.record(Err(NetError::TaskPanicked {
                message: err.to_string(),
            })),
        }
    }

    fn snapshot(&self) -> ServeStats {
        ServeStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            echoed: self.echoed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Read one line from `stream`, wait, write it back and close.
pub async fn echo(mut stream: TcpStream, wait: Duration) -> NetResult<String> {
    let (reader, mut writer) = stream.split();
    let mut line = String::new();
    if BufReader::new(reader).read_line(&mut line).await? == 0 {
        return Err(NetError::ConnectionClosed);
    }
    let message = line.trim_end_matches(['\r', '\n']).to_string();
    info!(line = %message, "echoed");

    tokio::time::sleep(wait).await;
    writer.write_all(message.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(message)
}

/// Echo server with a pooled or per-connection task strategy.
pub struct EchoServer {
    config: EchoConfig,
}

impl EchoServer {
    pub fn new(config: EchoConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EchoConfig {
        &self.config
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> NetResult<TcpListener> {
        Ok(TcpListener::bind(self.config.addr).await?)
    }

    /// Accept connections until `shutdown` is cancelled, then wait for the
    /// connections already accepted.
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> ServeStats {
        let counters = Arc::new(Counters::default());
        match self.config.threading {
            Threading::Pooled => self.serve_pooled(listener, shutdown, &counters).await,
            Threading::Virtual => self.serve_per_connection(listener, shutdown, &counters).await,
        }
        let stats = counters.snapshot();
        info!(
            accepted = stats.accepted,
            echoed = stats.echoed,
            failed = stats.failed,
            "server stopped"
        );
        stats
    }

    async fn serve_pooled(
        &self,
        listener: TcpListener,
        shutdown: CancellationToken,
        counters: &Arc<Counters>,
    ) {
        let workers = self.config.workers.max(1);
        let (tx, rx) = mpsc::channel::<TcpStream>(workers * 4);
        let rx = Arc::new(Mutex::new(rx));

        let mut pool = JoinSet::new();
        for worker in 0..workers {
            let rx = Arc::clone(&rx);
            let counters = Arc::clone(counters);
            let wait = self.config.echo_wait;
            pool.spawn(async move {
                loop {
                    let next = rx.lock().await.recv().await;
                    let Some(stream) = next else { break };
                    debug!(worker, "handling connection");
                    counters.record(echo(stream, wait).await);
                }
            });
        }

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!(%peer, "accepted");
                        counters.accepted.fetch_add(1, Ordering::Relaxed);
                        if tx.send(stream).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!(error = %err, "accept failed"),
                },
            }
        }

        // Closing the channel lets the workers drain the queue and exit.
        drop(tx);
        while let Some(joined) = pool.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "worker stopped abnormally");
            }
        }
    }

    async fn serve_per_connection(
        &self,
        listener: TcpListener,
        shutdown: CancellationToken,
        counters: &Arc<Counters>,
    ) {
        let wait = self.config.echo_wait;
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!(%peer, "accepted");
                        counters.accepted.fetch_add(1, Ordering::Relaxed);
                        connections.spawn(echo(stream, wait));
                    }
                    Err(err) => warn!(error = %err, "accept failed"),
                },
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    counters.record_join(joined);
                }
            }
        }

        while let Some(joined) = connections.join_next().await {
            counters.record_join(joined);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_single_line() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            echo(stream, Duration::ZERO).await
        });

        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(b"hello there\n").await.unwrap();
        let mut reply = String::new();
        BufReader::new(&mut client).read_line(&mut reply).await.unwrap();

        assert_eq!(reply, "hello there\n");
        assert_eq!(server.await.unwrap().unwrap(), "hello there");
    }

    #[tokio::test]
    async fn test_echo_closed_without_line() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = TcpStream::connect(addr).await.unwrap();
        let (stream, _) = listener.accept().await.unwrap();
        drop(client);

        assert!(matches!(
            echo(stream, Duration::ZERO).await,
            Err(NetError::ConnectionClosed)
        ));
    }
}
