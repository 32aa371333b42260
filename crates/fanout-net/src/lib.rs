//! Echo server and load generator for fanout.
//!
//! Both sides come in two flavors: a fixed pool of worker tasks, or one task
//! per connection (server) or per message (sender). They exist to compare the
//! two strategies under load and share nothing with the analyzers beyond
//! [`fanout_core::TaskScope`].

mod config;
mod echo;
mod error;
mod send;

pub use config::{
    DEFAULT_ECHO_WAIT, DEFAULT_MESSAGE_COUNT, DEFAULT_MESSAGE_ROOT, DEFAULT_PORT, EchoConfig,
    EchoConfigBuilder, SendConfig, SendConfigBuilder, Threading, default_addr, default_workers,
};
pub use echo::{EchoServer, ServeStats, echo};
pub use error::{NetError, NetResult};
pub use send::{SendReport, Sender, send_message_and_wait_for_reply};
