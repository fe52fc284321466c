use crate::cmd::IntoCommand;
use crate::frame::Command;
use bytes::Bytes;
use std::time::Duration;

/// Set `key` to hold `value`.
///
/// If `key` already holds a value, it is overwritten, regardless of its type.
/// Any previous time to live associated with the key is discarded on successful
/// SET operation.
///
/// # Options
///
/// * PX `milliseconds` -- Set the specified expire time, in milliseconds.
/// * NX -- Only set the key if it does not already exist.
/// * XX -- Only set the key if it already exists.
///
/// ```text
/// SET key value [PX milliseconds] [NX|XX]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Set {
    key: String,
    value: Bytes,
    /// When to expire the key
    expire: Option<Duration>,
    condition: Option<SetCondition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetCondition {
    /// `NX`
    IfMissing,
    /// `XX`
    IfExists,
}

impl Set {
    pub fn new(key: impl ToString, value: Bytes) -> Set {
        Set {
            key: key.to_string(),
            value,
            expire: None,
            condition: None,
        }
    }

    #[must_use]
    pub fn expire(mut self, expire: Duration) -> Set {
        self.expire = Some(expire);
        self
    }

    #[must_use]
    pub fn condition(mut self, condition: SetCondition) -> Set {
        self.condition = Some(condition);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &Bytes {
        &self.value
    }
}

impl IntoCommand for Set {
    fn into_command(self) -> Command {
        let mut cmd = Command::new("SET").arg(self.key).arg(self.value);

        if let Some(expire) = self.expire {
            // Sub-millisecond expirations would be rejected by the server.
            let ms = u64::try_from(expire.as_millis()).unwrap_or(u64::MAX).max(1);
            cmd = cmd.arg("PX").arg(ms);
        }
        match self.condition {
            Some(SetCondition::IfMissing) => cmd.push_arg("NX"),
            Some(SetCondition::IfExists) => cmd.push_arg("XX"),
            None => {}
        }

        cmd
    }
}
