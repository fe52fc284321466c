use crate::config::Config;
use crate::error::{classify, connect_error, CommandError, ConnectError, TransportError};
use crate::frame::{self, Command};
use crate::reply::Reply;
use bytes::BytesMut;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::{self, TcpStream};
use tokio::time;
use tracing::{debug, instrument, warn};

const BUF_SIZE: usize = 4 * 1024;

/// `Connection` sends request bytes and receives `Reply` values over one
/// `TcpStream`.
///
/// ```text
/// Disconnected --open--> Connecting --ok--> Connected
///                             |                 |
///                             +--error--> Faulted <--I/O, decode, timeout, close
/// ```
///
/// `Faulted` keeps the error that caused it; every later `send` or
/// `receive_reply` fails with that error until `open` is called again.
///
/// A `Connection` is not meant for concurrent use; share it through a
/// [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Default)]
pub struct Connection {
    state: State,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Disconnected,
    Connecting,
    Connected(Stream),
    Faulted(CommandError),
}

/// The socket and its buffers. Only exists while connected.
#[derive(Debug)]
struct Stream {
    socket: BufWriter<TcpStream>,
    // `read_buf` is filled until it holds a whole reply. Bytes past the end
    // of that reply stay here for the next call.
    read_buf: BytesMut,
    peer: SocketAddr,
}

/// Observable state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Disconnected,
    Connecting,
    Connected,
    Faulted,
}

impl Connection {
    /// A connection in the `Disconnected` state.
    pub fn new() -> Connection {
        Connection::default()
    }

    /// Create a connection and `open` it.
    pub async fn connect(config: &Config) -> Result<Connection, ConnectError> {
        let mut connection = Connection::new();
        connection.open(config).await?;

        Ok(connection)
    }

    /// Establish the TCP connection described by `config`.
    ///
    /// Resolution and the handshake together must finish within
    /// `config.connect_timeout`. With a password configured, `AUTH` is sent
    /// before the connection is handed out; a rejection faults it. Calling
    /// `open` on a faulted connection starts over with fresh buffers.
    #[instrument(skip(self, config), fields(addr = %config.addr()))]
    pub async fn open(&mut self, config: &Config) -> Result<(), ConnectError> {
        if let State::Connected(_) = self.state {
            return Err(ConnectError::AlreadyConnected);
        }

        self.state = State::Connecting;
        self.read_timeout = config.read_timeout;
        self.write_timeout = config.write_timeout;

        let addr = config.addr();
        let result = match time::timeout(config.connect_timeout, connect_any(config)).await {
            Ok(result) => result,
            Err(_) => Err(ConnectError::Timeout {
                addr,
                timeout: config.connect_timeout,
            }),
        };

        match result {
            Ok((socket, peer)) => {
                debug!(%peer, "connected");
                self.state = State::Connected(Stream {
                    socket: BufWriter::new(socket),
                    read_buf: BytesMut::with_capacity(BUF_SIZE),
                    peer,
                });

                match config.password.as_deref() {
                    Some(password) => self.authenticate(config, password).await,
                    None => Ok(()),
                }
            }
            Err(err) => {
                warn!(cause = %err, "connect failed");
                self.state = State::Faulted(TransportError::from(err.clone()).into());
                Err(err)
            }
        }
    }

    async fn authenticate(&mut self, config: &Config, password: &str) -> Result<(), ConnectError> {
        let mut auth = Command::new("AUTH");
        if let Some(username) = &config.username {
            auth.push_arg(username);
        }
        auth.push_arg(password);

        let result = match self.send(&auth.to_bytes()).await {
            Ok(()) => self.receive_reply().await.and_then(classify),
            Err(err) => Err(err),
        };

        match result {
            Ok(_) => Ok(()),
            Err(err) => {
                let err = ConnectError::Auth {
                    addr: config.addr(),
                    message: err.to_string(),
                };
                warn!(cause = %err, "authentication failed");
                self.close().await;
                self.state = State::Faulted(TransportError::from(err.clone()).into());
                Err(err)
            }
        }
    }

    pub fn status(&self) -> Status {
        match self.state {
            State::Disconnected => Status::Disconnected,
            State::Connecting => Status::Connecting,
            State::Connected(_) => Status::Connected,
            State::Faulted(_) => Status::Faulted,
        }
    }

    /// The error that faulted the connection, if it is faulted.
    pub fn fault(&self) -> Option<&CommandError> {
        match &self.state {
            State::Faulted(err) => Some(err),
            _ => None,
        }
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        match &self.state {
            State::Connected(stream) => Some(stream.peer),
            _ => None,
        }
    }

    /// Write all of `bytes` to the socket and flush.
    pub async fn send(&mut self, bytes: &[u8]) -> Result<(), CommandError> {
        let timeout = self.write_timeout;

        let result = match &mut self.state {
            State::Connected(stream) => {
                let write = async {
                    stream.socket.write_all(bytes).await?;
                    stream.socket.flush().await
                };
                with_timeout(timeout, write, TransportError::WriteTimeout).await
            }
            state => return Err(state.rejection()),
        };

        result.map_err(|err| self.fault_with(err.into()))
    }

    /// Read a single `Reply` from the socket, waiting until it is complete.
    ///
    /// Server error replies are returned as `Reply::Error`; they do not fault
    /// the connection. A peer close, an I/O error, a read timeout or bytes
    /// that are not RESP do.
    pub async fn receive_reply(&mut self) -> Result<Reply, CommandError> {
        let timeout = self.read_timeout;

        let result = match &mut self.state {
            State::Connected(stream) => match timeout {
                Some(duration) => match time::timeout(duration, stream.read_reply()).await {
                    Ok(result) => result,
                    Err(_) => Err(TransportError::ReadTimeout(duration).into()),
                },
                None => stream.read_reply().await,
            },
            state => return Err(state.rejection()),
        };

        match result {
            Ok(reply) => {
                debug!(?reply);
                Ok(reply)
            }
            Err(err) => Err(self.fault_with(err)),
        }
    }

    /// Shut the socket down. A connected connection becomes
    /// `Faulted(Closed)`; a connection that is already faulted keeps its
    /// original fault.
    pub async fn close(&mut self) {
        match &mut self.state {
            State::Connected(stream) => {
                if let Err(err) = stream.socket.shutdown().await {
                    debug!(cause = %err, "shutdown failed");
                }
            }
            State::Connecting => {}
            State::Disconnected | State::Faulted(_) => return,
        }

        self.state = State::Faulted(TransportError::Closed.into());
    }

    fn fault_with(&mut self, err: CommandError) -> CommandError {
        warn!(cause = %err, "connection faulted");
        self.state = State::Faulted(err.clone());
        err
    }
}

impl State {
    fn rejection(&self) -> CommandError {
        match self {
            State::Faulted(err) => err.clone(),
            _ => TransportError::NotConnected.into(),
        }
    }
}

impl Stream {
    async fn read_reply(&mut self) -> Result<Reply, CommandError> {
        loop {
            // Attempt to decode a reply from the buffered data.
            if let Some(reply) = frame::decode(&mut self.read_buf)? {
                return Ok(reply);
            }

            // Not enough buffered data. `0` indicates "end of stream".
            let n = self
                .socket
                .read_buf(&mut self.read_buf)
                .await
                .map_err(TransportError::from)?;
            if n == 0 {
                if !self.read_buf.is_empty() {
                    debug!(pending = self.read_buf.len(), "peer closed mid-reply");
                }
                return Err(TransportError::ConnectionClosed.into());
            }
        }
    }
}

async fn with_timeout<F>(
    timeout: Option<Duration>,
    fut: F,
    on_elapsed: fn(Duration) -> TransportError,
) -> Result<(), TransportError>
where
    F: Future<Output = std::io::Result<()>>,
{
    match timeout {
        Some(duration) => match time::timeout(duration, fut).await {
            Ok(result) => result.map_err(TransportError::from),
            Err(_) => Err(on_elapsed(duration)),
        },
        None => fut.await.map_err(TransportError::from),
    }
}

/// Resolve `config.host` and try each address in turn.
async fn connect_any(config: &Config) -> Result<(TcpStream, SocketAddr), ConnectError> {
    let addr = config.addr();
    let addrs = net::lookup_host((config.host.as_str(), config.port))
        .await
        .map_err(|err| ConnectError::Resolve {
            addr: addr.clone(),
            message: err.to_string(),
        })?;

    let mut last_err = None;
    for peer in addrs {
        match TcpStream::connect(peer).await {
            Ok(socket) => {
                if let Err(err) = socket.set_nodelay(true) {
                    debug!(cause = %err, "failed to set TCP_NODELAY");
                }
                return Ok((socket, peer));
            }
            Err(err) => {
                debug!(%peer, cause = %err, "connect attempt failed");
                last_err = Some(connect_error(&addr, &err));
            }
        }
    }

    Err(last_err.unwrap_or(ConnectError::Resolve {
        addr,
        message: "no addresses found".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn listener() -> (TcpListener, Config) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        (listener, Config::new("127.0.0.1", port))
    }

    #[tokio::test]
    async fn open_moves_to_connected() {
        let (listener, config) = listener().await;
        let mut connection = Connection::new();
        assert_eq!(connection.status(), Status::Disconnected);

        connection.open(&config).await.unwrap();
        let _ = listener.accept().await.unwrap();

        assert_eq!(connection.status(), Status::Connected);
        assert!(connection.peer_addr().is_some());
        assert_eq!(
            connection.open(&config).await,
            Err(ConnectError::AlreadyConnected)
        );
    }

    #[tokio::test]
    async fn disconnected_rejects_io() {
        let mut connection = Connection::new();

        assert_eq!(
            connection.send(b"*1\r\n$4\r\nPING\r\n").await,
            Err(TransportError::NotConnected.into())
        );
        assert_eq!(
            connection.receive_reply().await,
            Err(TransportError::NotConnected.into())
        );
        assert_eq!(connection.status(), Status::Disconnected);
    }

    #[tokio::test]
    async fn refused_connect_faults() {
        // Bind then drop to find a port nobody listens on.
        let (listener, config) = listener().await;
        drop(listener);

        let err = Connection::new().open(&config).await.unwrap_err();
        assert!(matches!(err, ConnectError::Refused { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn failed_open_keeps_the_reason() {
        let (listener, config) = listener().await;
        drop(listener);

        let mut connection = Connection::new();
        let err = connection.open(&config).await.unwrap_err();

        assert_eq!(connection.status(), Status::Faulted);
        assert_eq!(
            connection.send(b"x").await,
            Err(TransportError::Connect(err).into())
        );
    }

    #[tokio::test]
    async fn close_faults_with_closed() {
        let (listener, config) = listener().await;
        let mut connection = Connection::connect(&config).await.unwrap();
        let _peer = listener.accept().await.unwrap();

        connection.close().await;

        assert_eq!(connection.status(), Status::Faulted);
        assert_eq!(connection.fault(), Some(&TransportError::Closed.into()));
        assert_eq!(
            connection.receive_reply().await,
            Err(TransportError::Closed.into())
        );
    }

    #[tokio::test]
    async fn reopen_after_fault() {
        let (listener, config) = listener().await;
        let mut connection = Connection::connect(&config).await.unwrap();
        connection.close().await;

        connection.open(&config).await.unwrap();
        let _peer = listener.accept().await.unwrap();
        assert_eq!(connection.status(), Status::Connected);
    }
}
