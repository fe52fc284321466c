//!
//! Conversions from `Reply` into the shapes the typed client methods return.
//!

use crate::error::CommandError;
use crate::frame::parse_i64;
use crate::reply::Reply;
use bytes::Bytes;
use std::collections::HashSet;
use std::hash::Hash;
use std::str;

/// Converts a reply into a Rust value.
///
/// Error replies convert into `CommandError::ServerRejected`, so error
/// entries inside a multi-bulk are reported rather than silently skipped.
pub trait FromReply: Sized {
    fn from_reply(reply: Reply) -> Result<Self, CommandError>;
}

impl FromReply for Reply {
    fn from_reply(reply: Reply) -> Result<Reply, CommandError> {
        Ok(reply)
    }
}

/// Any status reply, typically `OK`.
impl FromReply for () {
    fn from_reply(reply: Reply) -> Result<(), CommandError> {
        match reply {
            Reply::Status(_) => Ok(()),
            other => Err(CommandError::unexpected("status", &other)),
        }
    }
}

/// `Integer(0)` and `Nil` are `false`, any other integer and any status are
/// `true`.
impl FromReply for bool {
    fn from_reply(reply: Reply) -> Result<bool, CommandError> {
        match reply {
            Reply::Integer(n) => Ok(n != 0),
            Reply::Status(_) => Ok(true),
            Reply::Nil => Ok(false),
            other => Err(CommandError::unexpected("integer", &other)),
        }
    }
}

impl FromReply for i64 {
    fn from_reply(reply: Reply) -> Result<i64, CommandError> {
        match reply {
            Reply::Integer(n) => Ok(n),
            // Bulk and status replies must be parsed as integers.
            Reply::Bulk(ref data) => parse_i64(data).ok_or_else(|| invalid_number(&reply)),
            Reply::Status(ref s) => parse_i64(s.as_bytes()).ok_or_else(|| invalid_number(&reply)),
            other => Err(CommandError::unexpected("integer", &other)),
        }
    }
}

impl FromReply for u64 {
    fn from_reply(reply: Reply) -> Result<u64, CommandError> {
        let n = i64::from_reply(reply)?;

        u64::try_from(n).map_err(|_| CommandError::UnexpectedReply {
            expected: "non-negative integer",
            actual: "negative integer",
        })
    }
}

impl FromReply for f64 {
    fn from_reply(reply: Reply) -> Result<f64, CommandError> {
        match reply {
            #[allow(clippy::cast_precision_loss)]
            Reply::Integer(n) => Ok(n as f64),
            Reply::Bulk(ref data) => str::from_utf8(data)
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .ok_or_else(|| invalid_number(&reply)),
            other => Err(CommandError::unexpected("float", &other)),
        }
    }
}

impl FromReply for Bytes {
    fn from_reply(reply: Reply) -> Result<Bytes, CommandError> {
        match reply {
            Reply::Bulk(data) => Ok(data),
            Reply::Status(s) => Ok(Bytes::from(s.into_bytes())),
            other => Err(CommandError::unexpected("bulk", &other)),
        }
    }
}

impl FromReply for String {
    fn from_reply(reply: Reply) -> Result<String, CommandError> {
        match reply {
            Reply::Status(s) => Ok(s),
            Reply::Bulk(data) => String::from_utf8(data.to_vec()).map_err(|_| {
                CommandError::UnexpectedReply {
                    expected: "UTF-8 string",
                    actual: "binary bulk",
                }
            }),
            other => Err(CommandError::unexpected("string", &other)),
        }
    }
}

/// `Nil` is `None`.
impl<T: FromReply> FromReply for Option<T> {
    fn from_reply(reply: Reply) -> Result<Option<T>, CommandError> {
        match reply {
            Reply::Nil => Ok(None),
            other => T::from_reply(other).map(Some),
        }
    }
}

/// A null multi-bulk converts to an empty vector.
impl<T: FromReply> FromReply for Vec<T> {
    fn from_reply(reply: Reply) -> Result<Vec<T>, CommandError> {
        match reply {
            Reply::Multi(items) => items.into_iter().map(T::from_reply).collect(),
            Reply::Nil => Ok(Vec::new()),
            other => Err(CommandError::unexpected("multi-bulk", &other)),
        }
    }
}

impl<T: FromReply + Eq + Hash> FromReply for HashSet<T> {
    fn from_reply(reply: Reply) -> Result<HashSet<T>, CommandError> {
        match reply {
            Reply::Multi(items) => items.into_iter().map(T::from_reply).collect(),
            Reply::Nil => Ok(HashSet::new()),
            other => Err(CommandError::unexpected("multi-bulk", &other)),
        }
    }
}

fn invalid_number(reply: &Reply) -> CommandError {
    CommandError::UnexpectedReply {
        expected: "number",
        actual: reply.type_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::ServerError;

    fn bulk(s: &'static str) -> Reply {
        Reply::Bulk(Bytes::from_static(s.as_bytes()))
    }

    #[test]
    fn integers() {
        assert_eq!(i64::from_reply(Reply::Integer(-1)), Ok(-1));
        assert_eq!(i64::from_reply(bulk("42")), Ok(42));
        assert!(i64::from_reply(bulk("4x")).is_err());
        assert_eq!(u64::from_reply(Reply::Integer(7)), Ok(7));
        assert!(u64::from_reply(Reply::Integer(-7)).is_err());
    }

    #[test]
    fn booleans() {
        assert_eq!(bool::from_reply(Reply::Integer(0)), Ok(false));
        assert_eq!(bool::from_reply(Reply::Integer(1)), Ok(true));
        assert_eq!(bool::from_reply(Reply::Status("OK".into())), Ok(true));
        assert_eq!(bool::from_reply(Reply::Nil), Ok(false));
    }

    #[test]
    fn floats() {
        assert_eq!(f64::from_reply(bulk("1.5")), Ok(1.5));
        assert_eq!(f64::from_reply(bulk("inf")), Ok(f64::INFINITY));
        assert_eq!(f64::from_reply(bulk("-inf")), Ok(f64::NEG_INFINITY));
        assert!(f64::from_reply(bulk("abc")).is_err());
    }

    #[test]
    fn nil_is_none_not_a_failure() {
        assert_eq!(Option::<Bytes>::from_reply(Reply::Nil), Ok(None));
        assert_eq!(
            Option::<Bytes>::from_reply(bulk("v")),
            Ok(Some(Bytes::from_static(b"v")))
        );
        assert_eq!(Vec::<Bytes>::from_reply(Reply::Nil), Ok(vec![]));
    }

    #[test]
    fn collections() {
        let reply = Reply::Multi(vec![bulk("a"), Reply::Nil, bulk("b")]);
        assert_eq!(
            Vec::<Option<String>>::from_reply(reply),
            Ok(vec![Some("a".into()), None, Some("b".into())])
        );

        let reply = Reply::Multi(vec![bulk("a"), bulk("a"), bulk("b")]);
        let set = HashSet::<String>::from_reply(reply).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn type_mismatch_is_not_a_protocol_error() {
        let err = i64::from_reply(Reply::Multi(vec![])).unwrap_err();
        assert_eq!(
            err,
            CommandError::UnexpectedReply {
                expected: "integer",
                actual: "multi-bulk"
            }
        );
        assert!(!err.is_fatal());
    }

    #[test]
    fn nested_error_entries_are_reported() {
        let reply = Reply::Multi(vec![
            Reply::Integer(1),
            Reply::Error(ServerError::parse("WRONGTYPE nope")),
        ]);

        let err = Vec::<i64>::from_reply(reply).unwrap_err();
        assert_eq!(err.server_kind(), Some("WRONGTYPE"));
    }
}
