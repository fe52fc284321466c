use crate::clients::Client;
use crate::cmd::ZStore;
use crate::error::CommandError;
use crate::frame::Command;
use bytes::Bytes;
use tracing::instrument;

impl Client {
    /// Add `member` with `score`, or update its score. Returns `true` if the
    /// member was added.
    #[instrument(skip(self, member))]
    pub async fn zadd(&self, key: &str, score: f64, member: Bytes) -> Result<bool, CommandError> {
        self.query(Command::new("ZADD").arg(key).arg(score).arg(member)).await
    }

    #[instrument(skip(self, member))]
    pub async fn zrem(&self, key: &str, member: Bytes) -> Result<bool, CommandError> {
        self.query(Command::new("ZREM").arg(key).arg(member)).await
    }

    /// Add `increment` to the score of `member`, returning the new score.
    #[instrument(skip(self, member))]
    pub async fn zincrby(
        &self,
        key: &str,
        increment: f64,
        member: Bytes,
    ) -> Result<f64, CommandError> {
        self.query(Command::new("ZINCRBY").arg(key).arg(increment).arg(member)).await
    }

    /// Rank of `member` by ascending score, or `None` if it is not a member.
    #[instrument(skip(self, member))]
    pub async fn zrank(&self, key: &str, member: Bytes) -> Result<Option<u64>, CommandError> {
        self.query(Command::new("ZRANK").arg(key).arg(member)).await
    }

    #[instrument(skip(self, member))]
    pub async fn zrevrank(&self, key: &str, member: Bytes) -> Result<Option<u64>, CommandError> {
        self.query(Command::new("ZREVRANK").arg(key).arg(member)).await
    }

    #[instrument(skip(self))]
    pub async fn zrange(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<Bytes>, CommandError> {
        self.query(Command::new("ZRANGE").arg(key).arg(start).arg(stop)).await
    }

    #[instrument(skip(self))]
    pub async fn zrevrange(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<Bytes>, CommandError> {
        self.query(Command::new("ZREVRANGE").arg(key).arg(start).arg(stop)).await
    }

    #[instrument(skip(self))]
    pub async fn zcard(&self, key: &str) -> Result<u64, CommandError> {
        self.query(Command::new("ZCARD").arg(key)).await
    }

    /// Score of `member`, or `None` if it is not a member.
    #[instrument(skip(self, member))]
    pub async fn zscore(&self, key: &str, member: Bytes) -> Result<Option<f64>, CommandError> {
        self.query(Command::new("ZSCORE").arg(key).arg(member)).await
    }

    /// Remove members with a score within `min..=max`, returning how many.
    #[instrument(skip(self))]
    pub async fn zremrangebyscore(
        &self,
        key: &str,
        min: f64,
        max: f64,
    ) -> Result<u64, CommandError> {
        self.query(Command::new("ZREMRANGEBYSCORE").arg(key).arg(min).arg(max)).await
    }

    #[instrument(skip(self))]
    pub async fn zremrangebyrank(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<u64, CommandError> {
        self.query(Command::new("ZREMRANGEBYRANK").arg(key).arg(start).arg(stop)).await
    }

    /// Store the intersection of `keys` in `destination`, returning its size.
    #[instrument(skip(self))]
    pub async fn zinterstore(&self, destination: &str, keys: &[&str]) -> Result<u64, CommandError> {
        self.zstore(ZStore::inter(destination, keys)).await
    }

    #[instrument(skip(self))]
    pub async fn zunionstore(&self, destination: &str, keys: &[&str]) -> Result<u64, CommandError> {
        self.zstore(ZStore::union(destination, keys)).await
    }

    /// Issue a weighted `ZUNIONSTORE` or `ZINTERSTORE`.
    ///
    /// ```no_run
    /// # async fn demo(client: credis_lib::Client) -> Result<(), credis_lib::CommandError> {
    /// use credis_lib::cmd::{Aggregate, ZStore};
    ///
    /// let cmd = ZStore::union("out", ["a", "b"])
    ///     .weights([1.0, 2.0])
    ///     .aggregate(Aggregate::Max);
    /// let size = client.zstore(cmd).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn zstore(&self, cmd: ZStore) -> Result<u64, CommandError> {
        self.query(cmd).await
    }
}
