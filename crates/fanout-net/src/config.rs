//! Configuration for the echo server and the sender.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use derive_builder::Builder;
use strum::{Display, EnumString};

/// Port both demos use unless told otherwise.
pub const DEFAULT_PORT: u16 = 8080;

/// How long the server waits before echoing a line.
pub const DEFAULT_ECHO_WAIT: Duration = Duration::from_millis(100);

/// Number of messages the sender sends.
pub const DEFAULT_MESSAGE_COUNT: usize = 100;

/// Text every message starts with.
pub const DEFAULT_MESSAGE_ROOT: &str = "fOo bAR";

/// How connections or messages are mapped to tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Threading {
    /// A fixed number of worker tasks share the work.
    Pooled,
    /// One task per connection or message.
    #[default]
    Virtual,
}

/// `localhost:8080`.
pub fn default_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT))
}

/// Pool size when none is given: the available parallelism.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Echo server configuration.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct EchoConfig {
    /// Address to listen on.
    #[builder(default = "default_addr()")]
    pub addr: SocketAddr,

    /// Delay before each echo.
    #[builder(default = "DEFAULT_ECHO_WAIT")]
    pub echo_wait: Duration,

    /// Task strategy.
    #[builder(default)]
    pub threading: Threading,

    /// Worker count for the pooled strategy.
    #[builder(default = "default_workers()")]
    pub workers: usize,
}

impl EchoConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.workers == Some(0) {
            return Err("Worker count must be at least 1".to_string());
        }
        Ok(())
    }
}

impl EchoConfig {
    pub fn builder() -> EchoConfigBuilder {
        EchoConfigBuilder::default()
    }
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            echo_wait: DEFAULT_ECHO_WAIT,
            threading: Threading::default(),
            workers: default_workers(),
        }
    }
}

/// Sender configuration.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct SendConfig {
    /// Address of the echo server.
    #[builder(default = "default_addr()")]
    pub addr: SocketAddr,

    /// Number of messages to send.
    #[builder(default = "DEFAULT_MESSAGE_COUNT")]
    pub message_count: usize,

    /// Text every message starts with; the message index is appended.
    #[builder(default = "DEFAULT_MESSAGE_ROOT.to_string()")]
    pub message_root: String,

    /// Task strategy.
    #[builder(default)]
    pub threading: Threading,

    /// Worker count for the pooled strategy.
    #[builder(default = "default_workers()")]
    pub workers: usize,
}

impl SendConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.workers == Some(0) {
            return Err("Worker count must be at least 1".to_string());
        }
        Ok(())
    }
}

impl SendConfig {
    pub fn builder() -> SendConfigBuilder {
        SendConfigBuilder::default()
    }
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            message_count: DEFAULT_MESSAGE_COUNT,
            message_root: DEFAULT_MESSAGE_ROOT.to_string(),
            threading: Threading::default(),
            workers: default_workers(),
        }
    }
}
