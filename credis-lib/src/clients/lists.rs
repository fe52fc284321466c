use crate::clients::Client;
use crate::error::CommandError;
use crate::frame::Command;
use bytes::Bytes;
use tracing::instrument;

impl Client {
    /// Append `value` to the list at `key`, returning the new length.
    #[instrument(skip(self, value))]
    pub async fn rpush(&self, key: &str, value: Bytes) -> Result<u64, CommandError> {
        self.query(Command::new("RPUSH").arg(key).arg(value)).await
    }

    /// Prepend `value` to the list at `key`, returning the new length.
    #[instrument(skip(self, value))]
    pub async fn lpush(&self, key: &str, value: Bytes) -> Result<u64, CommandError> {
        self.query(Command::new("LPUSH").arg(key).arg(value)).await
    }

    #[instrument(skip(self))]
    pub async fn llen(&self, key: &str) -> Result<u64, CommandError> {
        self.query(Command::new("LLEN").arg(key)).await
    }

    /// Elements between the inclusive indexes `start` and `stop`.
    #[instrument(skip(self))]
    pub async fn lrange(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<Bytes>, CommandError> {
        self.query(Command::new("LRANGE").arg(key).arg(start).arg(stop)).await
    }

    #[instrument(skip(self))]
    pub async fn ltrim(&self, key: &str, start: i64, stop: i64) -> Result<(), CommandError> {
        self.query(Command::new("LTRIM").arg(key).arg(start).arg(stop)).await
    }

    #[instrument(skip(self))]
    pub async fn lindex(&self, key: &str, index: i64) -> Result<Option<Bytes>, CommandError> {
        self.query(Command::new("LINDEX").arg(key).arg(index)).await
    }

    #[instrument(skip(self, value))]
    pub async fn lset(&self, key: &str, index: i64, value: Bytes) -> Result<(), CommandError> {
        self.query(Command::new("LSET").arg(key).arg(index).arg(value)).await
    }

    /// Remove up to `count` occurrences of `value` (all when `0`, from the
    /// tail when negative). Returns how many were removed.
    #[instrument(skip(self, value))]
    pub async fn lrem(&self, key: &str, count: i64, value: Bytes) -> Result<u64, CommandError> {
        self.query(Command::new("LREM").arg(key).arg(count).arg(value)).await
    }

    #[instrument(skip(self))]
    pub async fn lpop(&self, key: &str) -> Result<Option<Bytes>, CommandError> {
        self.query(Command::new("LPOP").arg(key)).await
    }

    #[instrument(skip(self))]
    pub async fn rpop(&self, key: &str) -> Result<Option<Bytes>, CommandError> {
        self.query(Command::new("RPOP").arg(key)).await
    }
}
