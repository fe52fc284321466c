use crate::clients::Client;
use crate::convert::FromReply;
use crate::error::CommandError;
use crate::frame::Command;
use crate::reply::Reply;
use std::time::Duration;
use tracing::instrument;

/// The type of the value stored at a key, as reported by `TYPE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyType {
    /// The key does not exist.
    None,
    String,
    List,
    Set,
    ZSet,
    Hash,
    Stream,
    Other(String),
}

impl FromReply for KeyType {
    fn from_reply(reply: Reply) -> Result<KeyType, CommandError> {
        let name = String::from_reply(reply)?;

        Ok(match name.as_str() {
            "none" => KeyType::None,
            "string" => KeyType::String,
            "list" => KeyType::List,
            "set" => KeyType::Set,
            "zset" => KeyType::ZSet,
            "hash" => KeyType::Hash,
            "stream" => KeyType::Stream,
            _ => KeyType::Other(name),
        })
    }
}

/// Remaining time to live of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    Expires(Duration),
    /// The key exists and has no expiration (`-1`).
    Persistent,
    /// The key does not exist (`-2`).
    Missing,
}

impl FromReply for Ttl {
    fn from_reply(reply: Reply) -> Result<Ttl, CommandError> {
        Ok(match i64::from_reply(reply)? {
            -1 => Ttl::Persistent,
            secs if secs < 0 => Ttl::Missing,
            secs => Ttl::Expires(Duration::from_secs(secs.unsigned_abs())),
        })
    }
}

impl Client {
    #[instrument(skip(self))]
    pub async fn exists(&self, key: &str) -> Result<bool, CommandError> {
        self.query(Command::new("EXISTS").arg(key)).await
    }

    /// Remove `keys`, returning how many existed.
    #[instrument(skip(self))]
    pub async fn del(&self, keys: &[&str]) -> Result<u64, CommandError> {
        self.query(Command::new("DEL").args(keys.iter().copied())).await
    }

    #[instrument(skip(self))]
    pub async fn key_type(&self, key: &str) -> Result<KeyType, CommandError> {
        self.query(Command::new("TYPE").arg(key)).await
    }

    #[instrument(skip(self))]
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>, CommandError> {
        self.query(Command::new("KEYS").arg(pattern)).await
    }

    /// A random key, or `None` when the database is empty.
    #[instrument(skip(self))]
    pub async fn randomkey(&self) -> Result<Option<String>, CommandError> {
        self.query(Command::new("RANDOMKEY")).await
    }

    #[instrument(skip(self))]
    pub async fn rename(&self, key: &str, new_key: &str) -> Result<(), CommandError> {
        self.query(Command::new("RENAME").arg(key).arg(new_key)).await
    }

    /// Rename only if `new_key` does not exist. Returns `false` if it did.
    #[instrument(skip(self))]
    pub async fn renamenx(&self, key: &str, new_key: &str) -> Result<bool, CommandError> {
        self.query(Command::new("RENAMENX").arg(key).arg(new_key)).await
    }

    #[instrument(skip(self))]
    pub async fn dbsize(&self) -> Result<u64, CommandError> {
        self.query(Command::new("DBSIZE")).await
    }

    /// Set a timeout on `key`, sent as `PEXPIRE` in milliseconds. A `ttl`
    /// under one millisecond is sent as `1`; `0` would delete the key.
    ///
    /// Returns the server's answer: `false` when the timeout was not set,
    /// which covers a missing key.
    #[instrument(skip(self))]
    pub async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CommandError> {
        let ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        self.query(Command::new("PEXPIRE").arg(key).arg(ms)).await
    }

    #[instrument(skip(self))]
    pub async fn ttl(&self, key: &str) -> Result<Ttl, CommandError> {
        self.query(Command::new("TTL").arg(key)).await
    }

    #[instrument(skip(self))]
    pub async fn select(&self, index: u32) -> Result<(), CommandError> {
        self.query(Command::new("SELECT").arg(index)).await
    }

    /// Move `key` to database `db`. Returns `false` if it was not moved,
    /// either because it is missing or already present in `db`.
    #[instrument(skip(self))]
    pub async fn move_key(&self, key: &str, db: u32) -> Result<bool, CommandError> {
        self.query(Command::new("MOVE").arg(key).arg(db)).await
    }

    #[instrument(skip(self))]
    pub async fn flushdb(&self) -> Result<(), CommandError> {
        self.query(Command::new("FLUSHDB")).await
    }

    #[instrument(skip(self))]
    pub async fn flushall(&self) -> Result<(), CommandError> {
        self.query(Command::new("FLUSHALL")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn key_types() {
        assert_eq!(
            KeyType::from_reply(Reply::Status("zset".into())),
            Ok(KeyType::ZSet)
        );
        assert_eq!(
            KeyType::from_reply(Reply::Status("none".into())),
            Ok(KeyType::None)
        );
        assert_eq!(
            KeyType::from_reply(Reply::Status("vectorset".into())),
            Ok(KeyType::Other("vectorset".into()))
        );
        assert!(KeyType::from_reply(Reply::Integer(1)).is_err());
    }

    #[test]
    fn ttl_sentinels() {
        assert_eq!(Ttl::from_reply(Reply::Integer(-2)), Ok(Ttl::Missing));
        assert_eq!(Ttl::from_reply(Reply::Integer(-1)), Ok(Ttl::Persistent));
        assert_eq!(
            Ttl::from_reply(Reply::Integer(30)),
            Ok(Ttl::Expires(Duration::from_secs(30)))
        );
        assert!(Ttl::from_reply(Reply::Bulk(Bytes::from_static(b"x"))).is_err());
    }
}
