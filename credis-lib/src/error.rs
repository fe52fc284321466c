//! Error taxonomy and the classifier that maps replies and I/O outcomes onto it.
//!
//! * [`ConnectError`]: the connection could not be established.
//! * [`CommandError::ServerRejected`]: the server answered with a `-` reply.
//!   The connection stays usable.
//! * [`CommandError::Transport`]: the socket failed or timed out. The
//!   connection is faulted and must be reopened.
//! * [`CommandError::Protocol`]: the server sent bytes that are not RESP. The
//!   connection is faulted.
//!
//! Nothing here is retried; every failure is returned to the caller.

use crate::frame;
use crate::reply::{Reply, ServerError};
use std::io;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    #[error("failed to resolve `{addr}`: {message}")]
    Resolve { addr: String, message: String },

    #[error("connection to {addr} refused")]
    Refused { addr: String },

    #[error("connecting to {addr} timed out after {timeout:?}")]
    Timeout { addr: String, timeout: Duration },

    #[error("failed to connect to {addr}: {message}")]
    Io {
        addr: String,
        kind: io::ErrorKind,
        message: String,
    },

    /// The server refused the configured credentials.
    #[error("authentication with {addr} failed: {message}")]
    Auth { addr: String, message: String },

    #[error("connection is already open")]
    AlreadyConnected,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The peer closed the socket (a read returned zero bytes).
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// The connection was closed by this client.
    #[error("connection closed")]
    Closed,

    #[error("connection is not open")]
    NotConnected,

    #[error("read timed out after {0:?}")]
    ReadTimeout(Duration),

    #[error("write timed out after {0:?}")]
    WriteTimeout(Duration),

    #[error("{message}")]
    Io { kind: io::ErrorKind, message: String },

    /// The last `open` failed; the connection never reached `Connected`.
    #[error("connect failed: {0}")]
    Connect(ConnectError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The server processed the command and rejected it with an error reply.
    #[error("{kind} {message}")]
    ServerRejected { kind: String, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server sent bytes that are not valid RESP.
    #[error("{0}")]
    Protocol(String),

    /// A well-formed reply whose shape does not fit the requested type.
    #[error("unexpected reply; expected {expected}, got {actual}")]
    UnexpectedReply {
        expected: &'static str,
        actual: &'static str,
    },
}

impl CommandError {
    /// `true` when the error left the connection faulted.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CommandError::Transport(_) | CommandError::Protocol(_))
    }

    /// The error kind of a server rejection, e.g. `WRONGTYPE`.
    pub fn server_kind(&self) -> Option<&str> {
        match self {
            CommandError::ServerRejected { kind, .. } => Some(kind),
            _ => None,
        }
    }

    pub(crate) fn unexpected(expected: &'static str, reply: &Reply) -> CommandError {
        match reply {
            Reply::Error(err) => err.clone().into(),
            other => CommandError::UnexpectedReply {
                expected,
                actual: other.type_name(),
            },
        }
    }
}

impl From<ServerError> for CommandError {
    fn from(err: ServerError) -> CommandError {
        CommandError::ServerRejected {
            kind: err.kind().to_string(),
            message: err.message().to_string(),
        }
    }
}

impl From<frame::Error> for CommandError {
    fn from(err: frame::Error) -> CommandError {
        match err {
            frame::Error::Incomplete => {
                CommandError::Protocol("protocol error; stream ended mid-reply".to_string())
            }
            frame::Error::Invalid(detail) => CommandError::Protocol(detail),
        }
    }
}

impl From<ConnectError> for TransportError {
    fn from(err: ConnectError) -> TransportError {
        TransportError::Connect(err)
    }
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> TransportError {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => TransportError::ConnectionClosed,
            kind => TransportError::Io {
                kind,
                message: err.to_string(),
            },
        }
    }
}

/// Separate a server rejection from a successful reply.
///
/// Only the top-level reply is inspected: error entries nested in a multi-bulk
/// (as returned by `EXEC`) stay part of the reply.
pub fn classify(reply: Reply) -> Result<Reply, CommandError> {
    match reply {
        Reply::Error(err) => Err(err.into()),
        reply => Ok(reply),
    }
}

pub(crate) fn connect_error(addr: &str, err: &io::Error) -> ConnectError {
    let addr = addr.to_string();

    match err.kind() {
        io::ErrorKind::ConnectionRefused => ConnectError::Refused { addr },
        kind => ConnectError::Io {
            addr,
            kind,
            message: err.to_string(),
        },
    }
}
