use crate::clients::Client;
use crate::cmd::Set;
use crate::error::CommandError;
use crate::frame::Command;
use bytes::Bytes;
use std::time::Duration;
use tracing::instrument;

impl Client {
    /// Get the value of key.
    ///
    /// # return
    ///
    /// If the key does not exist `None` is returned.
    #[instrument(skip(self))]
    pub async fn get(&self, key: &str) -> Result<Option<Bytes>, CommandError> {
        self.query(Command::new("GET").arg(key)).await
    }

    /// Set `key` to hold the given `value`.
    ///
    /// If key already holds a value, it is overwritten. Any previous time to
    /// live associated with the key is discarded on successful SET operation.
    #[instrument(skip(self, value))]
    pub async fn set(&self, key: &str, value: Bytes) -> Result<(), CommandError> {
        self.query(Set::new(key, value)).await
    }

    /// Set `key` to hold the given `value`. The value expires after `expiration`.
    #[instrument(skip(self, value))]
    pub async fn set_expires(
        &self,
        key: &str,
        value: Bytes,
        expiration: Duration,
    ) -> Result<(), CommandError> {
        self.query(Set::new(key, value).expire(expiration)).await
    }

    /// Issue a `SET` built with options.
    ///
    /// Returns `false` when an `NX`/`XX` condition prevented the write.
    pub async fn set_with(&self, cmd: Set) -> Result<bool, CommandError> {
        self.query(cmd).await
    }

    /// Set `key` to `value` and return the old value.
    #[instrument(skip(self, value))]
    pub async fn getset(&self, key: &str, value: Bytes) -> Result<Option<Bytes>, CommandError> {
        self.query(Command::new("GETSET").arg(key).arg(value)).await
    }

    /// The values of all `keys`; missing keys are `None`.
    #[instrument(skip(self))]
    pub async fn mget(&self, keys: &[&str]) -> Result<Vec<Option<Bytes>>, CommandError> {
        self.query(Command::new("MGET").args(keys.iter().copied())).await
    }

    /// Set `key` only if it does not exist. Returns whether it was set.
    #[instrument(skip(self, value))]
    pub async fn setnx(&self, key: &str, value: Bytes) -> Result<bool, CommandError> {
        self.query(Command::new("SETNX").arg(key).arg(value)).await
    }

    /// Increment and return the new value. A missing key counts as `0`.
    #[instrument(skip(self))]
    pub async fn incr(&self, key: &str) -> Result<i64, CommandError> {
        self.query(Command::new("INCR").arg(key)).await
    }

    #[instrument(skip(self))]
    pub async fn incrby(&self, key: &str, by: i64) -> Result<i64, CommandError> {
        self.query(Command::new("INCRBY").arg(key).arg(by)).await
    }

    #[instrument(skip(self))]
    pub async fn decr(&self, key: &str) -> Result<i64, CommandError> {
        self.query(Command::new("DECR").arg(key)).await
    }

    #[instrument(skip(self))]
    pub async fn decrby(&self, key: &str, by: i64) -> Result<i64, CommandError> {
        self.query(Command::new("DECRBY").arg(key).arg(by)).await
    }

    /// Append `value` to the string at `key`, returning the new length.
    #[instrument(skip(self, value))]
    pub async fn append(&self, key: &str, value: Bytes) -> Result<u64, CommandError> {
        self.query(Command::new("APPEND").arg(key).arg(value)).await
    }

    /// The substring between the inclusive offsets `start` and `end`.
    /// Negative offsets count from the end. A missing key yields an empty
    /// string.
    #[instrument(skip(self))]
    pub async fn substr(&self, key: &str, start: i64, end: i64) -> Result<Bytes, CommandError> {
        self.query(Command::new("GETRANGE").arg(key).arg(start).arg(end)).await
    }
}
