use crate::dispatcher::Dispatcher;
use crate::error::{classify, CommandError};
use crate::frame::{Command, IntoArg};
use crate::reply::Reply;
use bytes::BytesMut;
use tracing::{debug, instrument};

/// A batch of commands written with a single `send`.
///
/// The whole batch is one in-flight unit: no other caller's request is
/// interleaved between its commands, and its replies are read back in order.
///
/// ```no_run
/// # async fn demo(client: credis_lib::Client) -> Result<(), credis_lib::CommandError> {
/// let mut pipe = client.pipeline();
/// pipe.cmd("INCR", ["hits"]).cmd("GET", ["hits"]);
///
/// for result in pipe.execute().await? {
///     println!("{}", result?);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Pipeline {
    dispatcher: Dispatcher,
    commands: Vec<Command>,
}

impl Pipeline {
    pub(crate) fn new(dispatcher: Dispatcher) -> Pipeline {
        Pipeline {
            dispatcher,
            commands: Vec::new(),
        }
    }

    pub fn add(&mut self, cmd: Command) -> &mut Pipeline {
        self.commands.push(cmd);
        self
    }

    /// Queue `name` with `args`.
    pub fn cmd<I>(&mut self, name: &str, args: I) -> &mut Pipeline
    where
        I: IntoIterator,
        I::Item: IntoArg,
    {
        self.add(Command::new(name).args(args))
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Send every queued command and collect their replies.
    ///
    /// The outer `Err` is a transport or protocol failure that lost the whole
    /// batch. Each inner result is one command's reply, with error replies
    /// classified as `ServerRejected` independently of the others.
    #[instrument(skip(self), fields(len = self.commands.len()))]
    pub async fn execute(self) -> Result<Vec<Result<Reply, CommandError>>, CommandError> {
        if self.commands.is_empty() {
            return Ok(Vec::new());
        }

        let mut frame = BytesMut::new();
        for cmd in &self.commands {
            debug!(request = ?cmd);
            cmd.encode(&mut frame);
        }

        let replies = self
            .dispatcher
            .submit(frame.freeze(), self.commands.len())
            .await?;

        Ok(replies.into_iter().map(classify).collect())
    }
}
