use crate::clients::Client;
use crate::error::CommandError;
use crate::frame::Command;
use bytes::Bytes;
use std::collections::HashSet;
use tracing::instrument;

impl Client {
    /// Add `member`. Returns `false` if it was already present.
    #[instrument(skip(self, member))]
    pub async fn sadd(&self, key: &str, member: Bytes) -> Result<bool, CommandError> {
        self.query(Command::new("SADD").arg(key).arg(member)).await
    }

    /// Remove `member`. Returns `false` if it was not present.
    #[instrument(skip(self, member))]
    pub async fn srem(&self, key: &str, member: Bytes) -> Result<bool, CommandError> {
        self.query(Command::new("SREM").arg(key).arg(member)).await
    }

    #[instrument(skip(self))]
    pub async fn spop(&self, key: &str) -> Result<Option<Bytes>, CommandError> {
        self.query(Command::new("SPOP").arg(key)).await
    }

    /// Move `member` from `source` to `destination`. Returns `false` if it
    /// was not a member of `source`.
    #[instrument(skip(self, member))]
    pub async fn smove(
        &self,
        source: &str,
        destination: &str,
        member: Bytes,
    ) -> Result<bool, CommandError> {
        self.query(
            Command::new("SMOVE")
                .arg(source)
                .arg(destination)
                .arg(member),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn scard(&self, key: &str) -> Result<u64, CommandError> {
        self.query(Command::new("SCARD").arg(key)).await
    }

    #[instrument(skip(self, member))]
    pub async fn sismember(&self, key: &str, member: Bytes) -> Result<bool, CommandError> {
        self.query(Command::new("SISMEMBER").arg(key).arg(member)).await
    }

    #[instrument(skip(self))]
    pub async fn smembers(&self, key: &str) -> Result<HashSet<Bytes>, CommandError> {
        self.query(Command::new("SMEMBERS").arg(key)).await
    }

    #[instrument(skip(self))]
    pub async fn sinter(&self, keys: &[&str]) -> Result<HashSet<Bytes>, CommandError> {
        self.set_op("SINTER", keys).await
    }

    #[instrument(skip(self))]
    pub async fn sunion(&self, keys: &[&str]) -> Result<HashSet<Bytes>, CommandError> {
        self.set_op("SUNION", keys).await
    }

    /// Members of the first set that are in none of the others.
    #[instrument(skip(self))]
    pub async fn sdiff(&self, keys: &[&str]) -> Result<HashSet<Bytes>, CommandError> {
        self.set_op("SDIFF", keys).await
    }

    /// Store the intersection in `destination`, returning its size.
    #[instrument(skip(self))]
    pub async fn sinterstore(&self, destination: &str, keys: &[&str]) -> Result<u64, CommandError> {
        self.set_store("SINTERSTORE", destination, keys).await
    }

    #[instrument(skip(self))]
    pub async fn sunionstore(&self, destination: &str, keys: &[&str]) -> Result<u64, CommandError> {
        self.set_store("SUNIONSTORE", destination, keys).await
    }

    #[instrument(skip(self))]
    pub async fn sdiffstore(&self, destination: &str, keys: &[&str]) -> Result<u64, CommandError> {
        self.set_store("SDIFFSTORE", destination, keys).await
    }

    async fn set_op(&self, name: &str, keys: &[&str]) -> Result<HashSet<Bytes>, CommandError> {
        self.query(Command::new(name).args(keys.iter().copied())).await
    }

    async fn set_store(
        &self,
        name: &str,
        destination: &str,
        keys: &[&str],
    ) -> Result<u64, CommandError> {
        self.query(
            Command::new(name)
                .arg(destination)
                .args(keys.iter().copied()),
        )
        .await
    }
}
