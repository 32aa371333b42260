//! Load generator that sends numbered messages to an echo server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use fanout_core::TaskScope;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{SendConfig, Threading};
use crate::error::{NetError, NetResult};

/// Outcome of a send run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendReport {
    /// Messages that got a reply.
    pub sent: u64,
    /// Messages that failed.
    pub failed: u64,
}

/// Connect, send `message` as one line, and wait for the reply line.
pub async fn send_message_and_wait_for_reply(addr: SocketAddr, message: &str) -> NetResult<String> {
    info!(line = message, "sending");
    let mut stream = TcpStream::connect(addr).await?;
    let (reader, mut writer) = stream.split();

    writer.write_all(message.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;

    let mut reply = String::new();
    if BufReader::new(reader).read_line(&mut reply).await? == 0 {
        return Err(NetError::ConnectionClosed);
    }
    let reply = reply.trim_end_matches(['\r', '\n']).to_string();
    info!(reply = %reply, "received");
    Ok(reply)
}

/// Sends `message_count` messages using the configured strategy.
pub struct Sender {
    config: SendConfig,
}

impl Sender {
    pub fn new(config: SendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SendConfig {
        &self.config
    }

    fn message(&self, index: usize) -> String {
        format!("{} {index}", self.config.message_root)
    }

    /// Send every message.
    ///
    /// The pooled strategy keeps going after a failure and counts it. The
    /// virtual strategy runs one task per message under a single scope and
    /// stops at the first failure, which it returns.
    pub async fn send_messages(&self) -> NetResult<SendReport> {
        match self.config.threading {
            Threading::Pooled => Ok(self.send_pooled().await),
            Threading::Virtual => self.send_per_message().await,
        }
    }

    async fn send_pooled(&self) -> SendReport {
        let count = self.config.message_count;
        let workers = self.config.workers.max(1).min(count.max(1));
        let next = Arc::new(AtomicUsize::new(0));
        let sent = Arc::new(AtomicU64::new(0));
        let failed = Arc::new(AtomicU64::new(0));

        let mut pool = JoinSet::new();
        for _ in 0..workers {
            let next = Arc::clone(&next);
            let sent = Arc::clone(&sent);
            let failed = Arc::clone(&failed);
            let addr = self.config.addr;
            let root = self.config.message_root.clone();
            pool.spawn(async move {
                loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    if index >= count {
                        break;
                    }
                    let message = format!("{root} {index}");
                    match send_message_and_wait_for_reply(addr, &message).await {
                        Ok(_) => {
                            sent.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(err) => {
                            warn!(line = %message, error = %err, "send failed");
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            });
        }
        while let Some(joined) = pool.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "sender worker stopped abnormally");
            }
        }

        SendReport {
            sent: sent.load(Ordering::Relaxed),
            failed: failed.load(Ordering::Relaxed),
        }
    }

    async fn send_per_message(&self) -> NetResult<SendReport> {
        let root = CancellationToken::new();
        let mut scope: TaskScope<String, NetError> = TaskScope::new(&root);

        for index in 0..self.config.message_count {
            let token = scope.token().clone();
            let addr = self.config.addr;
            let message = self.message(index);
            let spawned = scope.spawn(async move {
                tokio::select! {
                    _ = token.cancelled() => Err(NetError::Cancelled),
                    reply = send_message_and_wait_for_reply(addr, &message) => reply,
                }
            });
            if !spawned {
                break;
            }
        }

        let replies = scope.join().await?;
        Ok(SendReport {
            sent: replies.len() as u64,
            failed: 0,
        })
    }
}
