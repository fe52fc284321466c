//! A Redis client speaking RESP over a single TCP connection.
//!
//! The major components are:
//! * `reply`: the tagged value returned by every command.
//! * `frame`: encodes commands into request bytes and decodes reply bytes.
//! * `connection`: owns the socket, its buffers and the connection state machine.
//! * `dispatcher`: serializes concurrent callers onto one connection, in FIFO order.
//! * `error`: the error taxonomy and the classifier mapping outcomes onto it.
//! * `clients`: the typed convenience surface built on `execute(name, args)`.

#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod clients;
pub use clients::{BlockingClient, Client};

pub mod cmd;
pub use cmd::IntoCommand;

mod config;
pub use config::{Config, ConfigError};

pub mod connection;
pub use connection::Connection;

mod convert;
pub use convert::FromReply;

pub mod dispatcher;
pub use dispatcher::{Dispatcher, Pipeline};

pub mod error;
pub use error::{classify, CommandError, ConnectError, TransportError};

pub mod frame;
pub use frame::{Command, IntoArg};

mod reply;
pub use reply::{Reply, ServerError};

/// Default port that a redis server listens on.
pub const DEFAULT_PORT: u16 = 6379;

/// Boxed error used by the binaries, where typed errors are only reported.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, Error>;
