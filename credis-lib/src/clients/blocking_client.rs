//! Minimal blocking Redis client implementation
//!
//! Provides a blocking connect and methods for issuing commands, for callers
//! that do not run an async runtime of their own.

use crate::clients::Client;
use crate::config::Config;
use crate::error::{CommandError, ConnectError};
use crate::frame::IntoArg;
use crate::reply::Reply;
use bytes::Bytes;
use std::time::Duration;
use tokio::runtime::Runtime;

/// Wraps an async [`Client`] and drives it on a private current-thread
/// runtime. The dispatcher task only makes progress while a method of this
/// type is blocked on it, which is exactly when it has work to do.
pub struct BlockingClient {
    inner: Client,

    rt: Runtime,
}

impl BlockingClient {
    /// Establish a connection with the Redis server described by `config`.
    pub fn connect(config: &Config) -> Result<BlockingClient, ConnectError> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| ConnectError::Io {
                addr: config.addr(),
                kind: err.kind(),
                message: err.to_string(),
            })?;

        let inner = rt.block_on(Client::connect(config))?;

        Ok(BlockingClient { inner, rt })
    }

    pub fn execute<I>(&self, name: &str, args: I) -> Result<Reply, CommandError>
    where
        I: IntoIterator,
        I::Item: IntoArg,
    {
        self.rt.block_on(self.inner.execute(name, args))
    }

    pub fn ping(&self, msg: Option<Bytes>) -> Result<Bytes, CommandError> {
        self.rt.block_on(self.inner.ping(msg))
    }

    pub fn get(&self, key: &str) -> Result<Option<Bytes>, CommandError> {
        self.rt.block_on(self.inner.get(key))
    }

    pub fn set(&self, key: &str, value: Bytes) -> Result<(), CommandError> {
        self.rt.block_on(self.inner.set(key, value))
    }

    pub fn set_expires(
        &self,
        key: &str,
        value: Bytes,
        expiration: Duration,
    ) -> Result<(), CommandError> {
        self.rt.block_on(self.inner.set_expires(key, value, expiration))
    }

    pub fn del(&self, keys: &[&str]) -> Result<u64, CommandError> {
        self.rt.block_on(self.inner.del(keys))
    }

    pub fn close(&self) {
        self.rt.block_on(self.inner.close());
    }
}
