//! RESP framing: request encoding and incremental reply decoding.
//!
//! Requests are always sent as a multi-bulk of bulk strings:
//!
//! ```text
//! *<argc>\r\n$<len>\r\n<arg>\r\n...
//! ```
//!
//! Replies are decoded in two passes. `check` walks the buffered bytes to find
//! out whether a whole reply is available without allocating anything; only then
//! does `parse` build the `Reply`.

use crate::reply::{Reply, ServerError};
use atoi::FromRadix10SignedChecked;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;

/// Largest bulk payload accepted from the server (Redis' `proto-max-bulk-len`).
pub const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Deepest multi-bulk nesting accepted from the server.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Not enough data is available to decode an entire reply.
    #[error("stream ended early")]
    Incomplete,

    /// The bytes do not form a valid reply.
    #[error("{0}")]
    Invalid(String),
}

impl From<String> for Error {
    fn from(src: String) -> Error {
        Error::Invalid(src)
    }
}

impl From<&str> for Error {
    fn from(src: &str) -> Error {
        src.to_string().into()
    }
}

/// Converts a value into a single binary-safe command argument.
pub trait IntoArg {
    fn into_arg(self) -> Bytes;
}

impl IntoArg for Bytes {
    fn into_arg(self) -> Bytes {
        self
    }
}

impl IntoArg for &Bytes {
    fn into_arg(self) -> Bytes {
        self.clone()
    }
}

impl IntoArg for &str {
    fn into_arg(self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl IntoArg for &String {
    fn into_arg(self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl IntoArg for String {
    fn into_arg(self) -> Bytes {
        Bytes::from(self)
    }
}

impl IntoArg for &[u8] {
    fn into_arg(self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl<const N: usize> IntoArg for &[u8; N] {
    fn into_arg(self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl IntoArg for Vec<u8> {
    fn into_arg(self) -> Bytes {
        Bytes::from(self)
    }
}

macro_rules! display_arg {
    ($($t:ty),*) => {
        $(
            impl IntoArg for $t {
                fn into_arg(self) -> Bytes {
                    Bytes::from(self.to_string())
                }
            }
        )*
    };
}

display_arg!(i32, i64, u32, u64, usize, f64);

/// A command: the name followed by its arguments, each an opaque byte string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Command {
    args: Vec<Bytes>,
}

impl Command {
    pub fn new(name: impl IntoArg) -> Command {
        Command {
            args: vec![name.into_arg()],
        }
    }

    /// Append an argument, builder style.
    #[must_use]
    pub fn arg(mut self, arg: impl IntoArg) -> Command {
        self.push_arg(arg);
        self
    }

    /// Append every item of `args`.
    #[must_use]
    pub fn args<I>(mut self, args: I) -> Command
    where
        I: IntoIterator,
        I::Item: IntoArg,
    {
        self.args.extend(args.into_iter().map(IntoArg::into_arg));
        self
    }

    pub fn push_arg(&mut self, arg: impl IntoArg) {
        self.args.push(arg.into_arg());
    }

    /// The command name (argument 0).
    pub fn name(&self) -> &[u8] {
        self.args.first().map_or(&[], |name| &name[..])
    }

    /// All arguments, including the name.
    pub fn as_args(&self) -> &[Bytes] {
        &self.args
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Append the request framing of this command to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        let payload: usize = self.args.iter().map(|arg| arg.len() + 16).sum();
        dst.reserve(payload + 16);

        dst.put_u8(b'*');
        put_decimal(dst, self.args.len() as i64);

        for arg in &self.args {
            dst.put_u8(b'$');
            put_decimal(dst, arg.len() as i64);
            dst.put_slice(arg);
            dst.put_slice(b"\r\n");
        }
    }

    /// The request bytes of this command.
    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::new();
        self.encode(&mut dst);
        dst.freeze()
    }
}

/// Decode one reply from the front of `src`.
///
/// Returns `Ok(None)` when `src` ends mid-reply; nothing is consumed in that
/// case and the call should be repeated once more bytes have arrived. On
/// success the reply's bytes are removed from `src`, leaving the start of any
/// following reply in place.
pub fn decode(src: &mut BytesMut) -> Result<Option<Reply>, Error> {
    let mut buf = Cursor::new(&src[..]);

    match check(&mut buf, 0) {
        Ok(()) => {
            // `check` advanced the cursor to the end of the reply.
            let len = buf.position() as usize;

            buf.set_position(0);
            let reply = parse(&mut buf)?;

            src.advance(len);
            Ok(Some(reply))
        }
        Err(Error::Incomplete) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Append the wire form of `reply` to `dst`.
///
/// A client never sends replies; this is what test doubles and proxies use to
/// answer requests.
pub fn encode_reply(reply: &Reply, dst: &mut BytesMut) {
    match reply {
        Reply::Nil => dst.put_slice(b"$-1\r\n"),
        Reply::Status(s) => {
            dst.put_u8(b'+');
            dst.put_slice(s.as_bytes());
            dst.put_slice(b"\r\n");
        }
        Reply::Error(err) => {
            dst.put_u8(b'-');
            dst.put_slice(err.to_line().as_bytes());
            dst.put_slice(b"\r\n");
        }
        Reply::Integer(n) => {
            dst.put_u8(b':');
            put_decimal(dst, *n);
        }
        Reply::Bulk(data) => {
            dst.put_u8(b'$');
            put_decimal(dst, data.len() as i64);
            dst.put_slice(data);
            dst.put_slice(b"\r\n");
        }
        Reply::Multi(items) => {
            dst.put_u8(b'*');
            put_decimal(dst, items.len() as i64);
            for item in items {
                encode_reply(item, dst);
            }
        }
    }
}

/// Write `val` followed by `\r\n`.
fn put_decimal(dst: &mut BytesMut, val: i64) {
    use std::fmt::Write;

    // Writing into a `BytesMut` cannot fail.
    let _ = write!(dst, "{val}\r\n");
}

/// Check whether an entire reply can be decoded from `src`.
fn check(src: &mut Cursor<&[u8]>, depth: usize) -> Result<(), Error> {
    match get_u8(src)? {
        b'+' | b'-' => {
            get_line(src)?;
            Ok(())
        }
        b':' => {
            get_decimal(src)?;
            Ok(())
        }
        b'$' => match get_length(src)? {
            None => Ok(()),
            Some(len) => {
                if len > MAX_BULK_LEN {
                    return Err(format!("protocol error; bulk length {len} exceeds limit").into());
                }
                skip(src, len)?;
                expect_crlf(src)
            }
        },
        b'*' => {
            if depth >= MAX_DEPTH {
                return Err(format!("protocol error; nesting deeper than {MAX_DEPTH}").into());
            }
            if let Some(len) = get_length(src)? {
                for _ in 0..len {
                    check(src, depth + 1)?;
                }
            }
            Ok(())
        }
        actual => Err(format!("protocol error; invalid reply type byte `{actual:#04x}`").into()),
    }
}

/// Build the reply. Must only be called after `check` succeeded.
fn parse(src: &mut Cursor<&[u8]>) -> Result<Reply, Error> {
    match get_u8(src)? {
        b'+' => {
            let line = get_line(src)?.to_vec();
            let status = String::from_utf8(line)
                .map_err(|_| "protocol error; status line is not valid UTF-8")?;

            Ok(Reply::Status(status))
        }
        b'-' => {
            let line = String::from_utf8_lossy(get_line(src)?);

            Ok(Reply::Error(ServerError::parse(&line)))
        }
        b':' => Ok(Reply::Integer(get_decimal(src)?)),
        b'$' => match get_length(src)? {
            None => Ok(Reply::Nil),
            Some(len) => {
                if src.remaining() < len + 2 {
                    return Err(Error::Incomplete);
                }
                let data = Bytes::copy_from_slice(&src.chunk()[..len]);
                skip(src, len + 2)?;

                Ok(Reply::Bulk(data))
            }
        },
        b'*' => match get_length(src)? {
            None => Ok(Reply::Nil),
            Some(len) => {
                // `check` proved every element is buffered, each taking at
                // least three bytes, so `len` is bounded by the buffer size.
                let mut items = Vec::with_capacity(len.min(src.remaining() / 3));
                for _ in 0..len {
                    items.push(parse(src)?);
                }

                Ok(Reply::Multi(items))
            }
        },
        actual => Err(format!("protocol error; invalid reply type byte `{actual:#04x}`").into()),
    }
}

/// Parse a strict signed decimal: an optional sign followed by digits only.
pub(crate) fn parse_i64(text: &[u8]) -> Option<i64> {
    match i64::from_radix_10_signed_checked(text) {
        (Some(n), used) if used == text.len() && text.last().is_some_and(u8::is_ascii_digit) => {
            Some(n)
        }
        _ => None,
    }
}

fn get_u8(src: &mut Cursor<&[u8]>) -> Result<u8, Error> {
    if !src.has_remaining() {
        return Err(Error::Incomplete);
    }

    Ok(src.get_u8())
}

fn skip(src: &mut Cursor<&[u8]>, n: usize) -> Result<(), Error> {
    if src.remaining() < n {
        return Err(Error::Incomplete);
    }

    src.advance(n);
    Ok(())
}

fn expect_crlf(src: &mut Cursor<&[u8]>) -> Result<(), Error> {
    if src.remaining() < 2 {
        return Err(Error::Incomplete);
    }
    if &src.chunk()[..2] != b"\r\n" {
        return Err("protocol error; bulk payload not terminated by CRLF".into());
    }

    src.advance(2);
    Ok(())
}

/// Read a signed decimal line.
fn get_decimal(src: &mut Cursor<&[u8]>) -> Result<i64, Error> {
    let line = get_line(src)?;

    parse_i64(line).ok_or_else(|| {
        format!(
            "protocol error; invalid integer `{}`",
            String::from_utf8_lossy(line)
        )
        .into()
    })
}

/// Read a bulk or multi-bulk length. `-1` (the null reply) yields `None`.
fn get_length(src: &mut Cursor<&[u8]>) -> Result<Option<usize>, Error> {
    match get_decimal(src)? {
        -1 => Ok(None),
        n if n < 0 => Err(format!("protocol error; invalid length {n}").into()),
        n => usize::try_from(n)
            .map(Some)
            .map_err(|_| format!("protocol error; length {n} out of range").into()),
    }
}

/// Find a line: the bytes up to the next `\r\n`, which is consumed.
fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let end = src.get_ref().len();

    for i in start..end.saturating_sub(1) {
        if src.get_ref()[i] == b'\r' && src.get_ref()[i + 1] == b'\n' {
            src.set_position((i + 2) as u64);

            return Ok(&src.get_ref()[start..i]);
        }
    }

    Err(Error::Incomplete)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn decode_all(bytes: &[u8]) -> Result<Option<Reply>, Error> {
        let mut buf = BytesMut::from(bytes);
        decode(&mut buf)
    }

    #[test]
    fn encodes_multi_bulk_request() {
        let cmd = Command::new("SET").arg("k").arg(&b"a\r\n\0b"[..]);

        assert_eq!(
            &cmd.to_bytes()[..],
            b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$5\r\na\r\n\0b\r\n"
        );
        assert_eq!(cmd.name(), b"SET");
        assert_eq!(cmd.len(), 3);
    }

    #[test]
    fn encodes_empty_and_numeric_arguments() {
        let cmd = Command::new("ZADD").arg("z").arg(1.5).arg(-3i64).arg("");

        assert_eq!(
            &cmd.to_bytes()[..],
            b"*5\r\n$4\r\nZADD\r\n$1\r\nz\r\n$3\r\n1.5\r\n$2\r\n-3\r\n$0\r\n\r\n"
        );
    }

    #[test]
    fn decodes_scalars() {
        assert_eq!(decode_all(b"+OK\r\n"), Ok(Some(Reply::Status("OK".into()))));
        assert_eq!(decode_all(b":123\r\n"), Ok(Some(Reply::Integer(123))));
        assert_eq!(decode_all(b":-1\r\n"), Ok(Some(Reply::Integer(-1))));
        assert_eq!(
            decode_all(b"$5\r\nhello\r\n"),
            Ok(Some(Reply::Bulk(Bytes::from_static(b"hello"))))
        );
        assert_eq!(
            decode_all(b"$0\r\n\r\n"),
            Ok(Some(Reply::Bulk(Bytes::new())))
        );
    }

    #[test]
    fn null_replies_are_nil_and_not_integers() {
        assert_eq!(decode_all(b"$-1\r\n"), Ok(Some(Reply::Nil)));
        assert_eq!(decode_all(b"*-1\r\n"), Ok(Some(Reply::Nil)));
        assert_eq!(decode_all(b"*0\r\n"), Ok(Some(Reply::Multi(vec![]))));
        assert_ne!(decode_all(b":-1\r\n"), decode_all(b"$-1\r\n"));
    }

    #[test]
    fn decodes_error_kind() {
        let reply = decode_all(b"-WRONGTYPE Operation against a key\r\n");
        assert_eq!(
            reply,
            Ok(Some(Reply::Error(ServerError::new(
                "WRONGTYPE",
                "Operation against a key"
            ))))
        );
    }

    #[test]
    fn bulk_is_binary_safe() {
        let reply = decode_all(b"$6\r\n\r\n\0\r\n\0\r\n");
        assert_eq!(
            reply,
            Ok(Some(Reply::Bulk(Bytes::from_static(b"\r\n\0\r\n\0"))))
        );
    }

    #[test]
    fn decodes_nested_multi() {
        let reply = decode_all(b"*3\r\n$1\r\na\r\n*2\r\n:1\r\n$-1\r\n*-1\r\n");
        assert_eq!(
            reply,
            Ok(Some(Reply::Multi(vec![
                Reply::Bulk(Bytes::from_static(b"a")),
                Reply::Multi(vec![Reply::Integer(1), Reply::Nil]),
                Reply::Nil,
            ])))
        );
    }

    #[test]
    fn partial_frames_need_more_bytes() {
        for partial in [
            &b""[..],
            b"+OK",
            b"+OK\r",
            b":12",
            b"$5\r\nhel",
            b"$5\r\nhello\r",
            b"*2\r\n$1\r\na\r\n",
            b"*2\r\n$1\r\na\r\n*1\r\n",
        ] {
            let mut buf = BytesMut::from(partial);
            assert_eq!(decode(&mut buf), Ok(None), "{partial:?}");
            assert_eq!(&buf[..], partial, "nothing consumed for {partial:?}");
        }
    }

    #[test]
    fn leftover_bytes_stay_buffered() {
        let mut buf = BytesMut::from(&b"+OK\r\n$1\r\nv\r\n:4"[..]);

        assert_eq!(decode(&mut buf), Ok(Some(Reply::Status("OK".into()))));
        assert_eq!(decode(&mut buf), Ok(Some(Reply::Bulk(Bytes::from_static(b"v")))));
        assert_eq!(decode(&mut buf), Ok(None));
        assert_eq!(&buf[..], b":4");
    }

    #[test]
    fn malformed_bytes_are_errors() {
        for bad in [
            &b"?what\r\n"[..],
            b":12a\r\n",
            b":\r\n",
            b":-\r\n",
            b"$-2\r\n",
            b"$abc\r\n",
            b"$3\r\nabcde\r\n",
            b"*-5\r\n",
            b"*1\r\n!oops\r\n",
        ] {
            assert!(
                matches!(decode_all(bad), Err(Error::Invalid(_))),
                "{bad:?} should not decode"
            );
        }
    }

    #[test]
    fn nesting_is_bounded() {
        let mut bytes = b"*1\r\n".repeat(MAX_DEPTH + 1);
        bytes.extend_from_slice(b":1\r\n");

        assert!(matches!(decode_all(&bytes), Err(Error::Invalid(_))));
    }

    #[test]
    fn strict_integers() {
        assert_eq!(parse_i64(b"0"), Some(0));
        assert_eq!(parse_i64(b"-42"), Some(-42));
        assert_eq!(parse_i64(b"+7"), Some(7));
        assert_eq!(parse_i64(b"9223372036854775807"), Some(i64::MAX));
        assert_eq!(parse_i64(b"9223372036854775808"), None);
        assert_eq!(parse_i64(b"1 "), None);
        assert_eq!(parse_i64(b""), None);
    }

    fn arb_reply() -> impl Strategy<Value = Reply> {
        let leaf = prop_oneof![
            Just(Reply::Nil),
            "[a-zA-Z0-9 ]{0,12}".prop_map(Reply::Status),
            any::<i64>().prop_map(Reply::Integer),
            proptest::collection::vec(any::<u8>(), 0..24).prop_map(|b| Reply::Bulk(b.into())),
            ("(ERR|WRONGTYPE|NOAUTH)", "[a-z][a-z ]{0,16}")
                .prop_map(|(kind, msg)| Reply::Error(ServerError::new(kind, msg))),
        ];

        leaf.prop_recursive(3, 32, 6, |inner| {
            proptest::collection::vec(inner, 0..6).prop_map(Reply::Multi)
        })
    }

    proptest! {
        #[test]
        fn request_round_trips_through_decoder(
            args in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..32), 1..8)
        ) {
            let cmd = Command::new(args[0].clone()).args(args[1..].iter().cloned());
            let mut buf = BytesMut::new();
            cmd.encode(&mut buf);

            let decoded = decode(&mut buf).unwrap().unwrap();
            let expected = Reply::Multi(args.into_iter().map(|a| Reply::Bulk(a.into())).collect());

            prop_assert_eq!(decoded, expected);
            prop_assert!(buf.is_empty());
        }

        #[test]
        fn decoding_is_insensitive_to_split_points(
            replies in proptest::collection::vec(arb_reply(), 1..6),
            cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..8),
        ) {
            let mut stream = BytesMut::new();
            for reply in &replies {
                encode_reply(reply, &mut stream);
            }
            let stream = stream.freeze();

            let mut cuts: Vec<usize> = cuts.iter().map(|i| i.index(stream.len() + 1)).collect();
            cuts.push(stream.len());
            cuts.sort_unstable();

            let mut buf = BytesMut::new();
            let mut decoded = Vec::new();
            let mut start = 0;
            for cut in cuts {
                buf.extend_from_slice(&stream[start..cut]);
                start = cut;
                while let Some(reply) = decode(&mut buf).unwrap() {
                    decoded.push(reply);
                }
            }

            prop_assert_eq!(decoded, replies);
            prop_assert!(buf.is_empty());
        }
    }
}
