use bytes::Bytes;
use std::fmt;

/// Kind used for error replies that do not start with an upper-case token.
const GENERIC_KIND: &str = "ERR";

/// A reply decoded from the server.
///
/// `Nil` is produced by both the null bulk (`$-1`) and the null multi-bulk
/// (`*-1`) replies. `Integer(-1)` is a regular value and never means absent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Nil,
    Status(String),
    Integer(i64),
    Bulk(Bytes),
    Multi(Vec<Reply>),
    Error(ServerError),
}

/// A `-` reply: the server processed the request and rejected it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerError {
    kind: String,
    message: String,
}

impl ServerError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> ServerError {
        ServerError {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Split an error line into its kind token and message.
    ///
    /// `WRONGTYPE Operation against ...` has kind `WRONGTYPE`. A line whose
    /// first word is not an upper-case token keeps the whole line as its
    /// message and gets the generic `ERR` kind.
    pub fn parse(line: &str) -> ServerError {
        let (head, rest) = match line.split_once(' ') {
            Some((head, rest)) => (head, rest),
            None => (line, ""),
        };

        if is_kind_token(head) {
            ServerError::new(head, rest)
        } else {
            ServerError::new(GENERIC_KIND, line)
        }
    }

    /// The error kind, e.g. `ERR` or `WRONGTYPE`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The error line as it appears on the wire, without the `-` prefix.
    pub fn to_line(&self) -> String {
        if self.message.is_empty() {
            self.kind.clone()
        } else {
            format!("{} {}", self.kind, self.message)
        }
    }
}

fn is_kind_token(word: &str) -> bool {
    let mut chars = word.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_line().fmt(f)
    }
}

impl Reply {
    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Nil)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    /// The payload of a `Bulk` or `Status` reply.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Reply::Bulk(data) => Some(data),
            Reply::Status(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Reply::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// A short name for the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Reply::Nil => "nil",
            Reply::Status(_) => "status",
            Reply::Integer(_) => "integer",
            Reply::Bulk(_) => "bulk",
            Reply::Multi(_) => "multi-bulk",
            Reply::Error(_) => "error",
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        match self {
            Reply::Nil => write!(f, "(nil)"),
            Reply::Status(s) => write!(f, "{s}"),
            Reply::Integer(n) => write!(f, "(integer) {n}"),
            Reply::Bulk(data) => write!(f, "\"{}\"", data.escape_ascii()),
            Reply::Error(err) => write!(f, "(error) {err}"),
            Reply::Multi(items) if items.is_empty() => write!(f, "(empty array)"),
            Reply::Multi(items) => {
                let width = items.len().to_string().len();
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, "\n{:indent$}", "")?;
                    }
                    write!(f, "{:>width$}) ", i + 1)?;
                    item.fmt_indented(f, indent + width + 2)?;
                }
                Ok(())
            }
        }
    }
}

/// Renders replies the way `redis-cli` does.
impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

impl PartialEq<&str> for Reply {
    fn eq(&self, other: &&str) -> bool {
        match self {
            Reply::Status(s) => s.eq(other),
            Reply::Bulk(s) => s.eq(other),
            _ => false,
        }
    }
}

impl From<ServerError> for Reply {
    fn from(err: ServerError) -> Reply {
        Reply::Error(err)
    }
}
