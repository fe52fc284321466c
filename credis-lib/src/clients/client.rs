//! Redis client implementation
//!
//! Provides an async connect and methods for issuing commands. Every method
//! goes through [`Client::execute`]; the typed methods only shape arguments
//! and convert replies.

use crate::cmd::IntoCommand;
use crate::config::Config;
use crate::connection::Connection;
use crate::convert::FromReply;
use crate::dispatcher::{Dispatcher, Pipeline};
use crate::error::{CommandError, ConnectError};
use crate::frame::{Command, IntoArg};
use crate::reply::Reply;
use bytes::Bytes;
use tracing::{debug, instrument};

/// Backed by a single `TcpStream`, shared through a [`Dispatcher`].
///
/// `Client` is cheap to clone and every clone may issue commands
/// concurrently; they are answered in the order they were issued.
#[derive(Clone, Debug)]
pub struct Client {
    dispatcher: Dispatcher,
}

impl Client {
    /// Establish a connection with the Redis server described by `config`.
    pub async fn connect(config: &Config) -> Result<Client, ConnectError> {
        let connection = Connection::connect(config).await?;

        Ok(Client::new(connection))
    }

    /// Wrap an already opened connection.
    pub fn new(connection: Connection) -> Client {
        Client {
            dispatcher: Dispatcher::new(connection),
        }
    }

    /// Issue `name` with `args` and return the raw reply.
    ///
    /// ```no_run
    /// # async fn demo() -> credis_lib::Result<()> {
    /// use credis_lib::{Client, Config};
    ///
    /// let client = Client::connect(&Config::default()).await?;
    /// let reply = client.execute("SET", ["greeting", "hello"]).await?;
    /// assert_eq!(reply, "OK");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute<I>(&self, name: &str, args: I) -> Result<Reply, CommandError>
    where
        I: IntoIterator,
        I::Item: IntoArg,
    {
        self.dispatcher.execute(Command::new(name).args(args)).await
    }

    /// Issue `cmd` and convert the reply into `T`.
    pub async fn query<T: FromReply>(&self, cmd: impl IntoCommand) -> Result<T, CommandError> {
        let reply = self.dispatcher.execute(cmd.into_command()).await?;

        T::from_reply(reply)
    }

    pub fn pipeline(&self) -> Pipeline {
        self.dispatcher.pipeline()
    }

    /// Close the connection after every command issued before this call.
    pub async fn close(&self) {
        self.dispatcher.close().await;
    }

    /// The error that faulted the connection, if any.
    pub fn fault(&self) -> Option<CommandError> {
        self.dispatcher.fault()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// `PING`, optionally with a message to echo.
    #[instrument(skip(self))]
    pub async fn ping(&self, msg: Option<Bytes>) -> Result<Bytes, CommandError> {
        let mut cmd = Command::new("PING");
        if let Some(msg) = msg {
            cmd.push_arg(msg);
        }

        let pong: Bytes = self.query(cmd).await?;
        debug!(?pong);

        Ok(pong)
    }
}
