//! Serializes commands from many callers onto one connection.
//!
//! A single background task owns the `Connection`. Callers hand it encoded
//! requests through a bounded `mpsc` channel and wait on a `oneshot` for the
//! reply. The channel is FIFO and the task finishes one round trip before it
//! takes the next request, so replies reach callers in submission order and
//! at most one request is ever in flight.

use crate::connection::Connection;
use crate::error::{classify, CommandError, TransportError};
use crate::frame::Command;
use crate::reply::Reply;
use bytes::Bytes;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

mod pipeline;
pub use pipeline::Pipeline;

/// Requests that may wait for admission before callers are suspended.
const QUEUE_DEPTH: usize = 32;

/// Handle to the dispatcher task. Cloning is cheap; every clone feeds the same
/// queue.
///
/// The task exits, closing the connection, once every handle is dropped.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    tx: mpsc::Sender<Message>,
    shared: Arc<Shared>,
}

/// State shared by the handles and the task.
#[derive(Debug, Default)]
struct Shared {
    /// Set once the connection faults. New requests fail with it immediately
    /// instead of being queued.
    fault: Mutex<Option<CommandError>>,
}

#[derive(Debug)]
enum Message {
    Execute(PendingRequest),
    Close(oneshot::Sender<()>),
}

/// A request awaiting its replies.
#[derive(Debug)]
struct PendingRequest {
    frame: Bytes,
    /// Number of replies the frame produces: 1, or the length of a pipeline.
    replies: usize,
    slot: oneshot::Sender<Result<Vec<Reply>, CommandError>>,
}

impl Dispatcher {
    /// Spawn the task driving `connection`.
    ///
    /// Must be called from within a Tokio runtime. A connection that is not
    /// connected yields a dispatcher that rejects every request.
    pub fn new(connection: Connection) -> Dispatcher {
        Dispatcher::with_queue_depth(connection, QUEUE_DEPTH)
    }

    pub fn with_queue_depth(connection: Connection, depth: usize) -> Dispatcher {
        let (tx, rx) = mpsc::channel(depth.max(1));
        let shared = Arc::new(Shared::default());

        if connection.status() != crate::connection::Status::Connected {
            let fault = connection
                .fault()
                .cloned()
                .unwrap_or(TransportError::NotConnected.into());
            shared.set_fault(fault);
        }

        tokio::spawn(run(connection, rx, shared.clone()));

        Dispatcher { tx, shared }
    }

    /// Send `cmd` and wait for its reply.
    ///
    /// An error reply from the server becomes `CommandError::ServerRejected`.
    /// Dropping the returned future abandons the request; if its bytes were
    /// already written, the reply is still read and discarded.
    #[instrument(skip(self, cmd), fields(cmd = %String::from_utf8_lossy(cmd.name())))]
    pub async fn execute(&self, cmd: Command) -> Result<Reply, CommandError> {
        debug!(request = ?cmd);

        let reply = self
            .submit(cmd.to_bytes(), 1)
            .await?
            .pop()
            .ok_or_else(|| CommandError::Protocol("missing reply".to_string()))?;

        classify(reply)
    }

    /// Start an empty pipeline on this connection.
    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(self.clone())
    }

    /// Close the connection once every request queued before this call has
    /// completed. Later requests fail with `TransportError::Closed`.
    pub async fn close(&self) {
        let (done, wait) = oneshot::channel();

        if self.tx.send(Message::Close(done)).await.is_ok() {
            let _ = wait.await;
        }
    }

    /// The error that faulted the connection, if any.
    pub fn fault(&self) -> Option<CommandError> {
        self.shared.fault()
    }

    /// Queue an encoded frame that produces `replies` replies.
    pub(crate) async fn submit(
        &self,
        frame: Bytes,
        replies: usize,
    ) -> Result<Vec<Reply>, CommandError> {
        if let Some(fault) = self.shared.fault() {
            return Err(fault);
        }

        let (slot, response) = oneshot::channel();
        let request = PendingRequest {
            frame,
            replies,
            slot,
        };

        if self.tx.send(Message::Execute(request)).await.is_err() {
            return Err(self.gone());
        }

        match response.await {
            Ok(result) => result,
            Err(_) => Err(self.gone()),
        }
    }

    /// The task is no longer running.
    fn gone(&self) -> CommandError {
        self.shared
            .fault()
            .unwrap_or(TransportError::Closed.into())
    }
}

impl Shared {
    fn fault(&self) -> Option<CommandError> {
        self.fault
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Record `err` unless an earlier fault is already recorded.
    fn set_fault(&self, err: CommandError) {
        let mut fault = self.fault.lock().unwrap_or_else(PoisonError::into_inner);
        if fault.is_none() {
            *fault = Some(err);
        }
    }
}

/// The dispatcher task: one round trip at a time, in queue order.
async fn run(mut connection: Connection, mut rx: mpsc::Receiver<Message>, shared: Arc<Shared>) {
    while let Some(message) = rx.recv().await {
        match message {
            Message::Execute(request) => {
                // A faulted connection answers everything queued behind the
                // fault without touching the socket.
                if let Some(fault) = shared.fault() {
                    let _ = request.slot.send(Err(fault));
                    continue;
                }

                // Nothing was written yet, so skipping keeps the stream aligned.
                if request.slot.is_closed() {
                    debug!("request abandoned before it was sent");
                    continue;
                }

                let result = round_trip(&mut connection, &request).await;
                if let Err(err) = &result {
                    shared.set_fault(err.clone());
                }

                if request.slot.send(result).is_err() {
                    debug!("caller abandoned request; reply drained");
                }
            }
            Message::Close(done) => {
                connection.close().await;
                shared.set_fault(TransportError::Closed.into());
                let _ = done.send(());
            }
        }
    }

    // Every handle is gone.
    connection.close().await;
}

async fn round_trip(
    connection: &mut Connection,
    request: &PendingRequest,
) -> Result<Vec<Reply>, CommandError> {
    connection.send(&request.frame).await?;

    let mut replies = Vec::with_capacity(request.replies);
    for _ in 0..request.replies {
        replies.push(connection.receive_reply().await?);
    }

    Ok(replies)
}
