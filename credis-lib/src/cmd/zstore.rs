use crate::cmd::IntoCommand;
use crate::frame::Command;

/// How scores of an element present in several input sets are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Aggregate {
    #[default]
    Sum,
    Min,
    Max,
}

impl Aggregate {
    fn as_str(self) -> &'static str {
        match self {
            Aggregate::Sum => "SUM",
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Union,
    Inter,
}

/// `ZUNIONSTORE` / `ZINTERSTORE`.
///
/// ```text
/// ZUNIONSTORE destination numkeys key [key ...] [WEIGHTS weight ...] [AGGREGATE SUM|MIN|MAX]
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ZStore {
    op: Op,
    destination: String,
    keys: Vec<String>,
    weights: Vec<f64>,
    aggregate: Option<Aggregate>,
}

impl ZStore {
    pub fn union<I, K>(destination: impl ToString, keys: I) -> ZStore
    where
        I: IntoIterator<Item = K>,
        K: ToString,
    {
        ZStore::new(Op::Union, destination, keys)
    }

    pub fn inter<I, K>(destination: impl ToString, keys: I) -> ZStore
    where
        I: IntoIterator<Item = K>,
        K: ToString,
    {
        ZStore::new(Op::Inter, destination, keys)
    }

    fn new<I, K>(op: Op, destination: impl ToString, keys: I) -> ZStore
    where
        I: IntoIterator<Item = K>,
        K: ToString,
    {
        ZStore {
            op,
            destination: destination.to_string(),
            keys: keys.into_iter().map(|k| k.to_string()).collect(),
            weights: Vec::new(),
            aggregate: None,
        }
    }

    /// One weight per key, in key order.
    #[must_use]
    pub fn weights(mut self, weights: impl IntoIterator<Item = f64>) -> ZStore {
        self.weights = weights.into_iter().collect();
        self
    }

    #[must_use]
    pub fn aggregate(mut self, aggregate: Aggregate) -> ZStore {
        self.aggregate = Some(aggregate);
        self
    }
}

impl IntoCommand for ZStore {
    fn into_command(self) -> Command {
        let name = match self.op {
            Op::Union => "ZUNIONSTORE",
            Op::Inter => "ZINTERSTORE",
        };

        let mut cmd = Command::new(name)
            .arg(self.destination)
            .arg(self.keys.len())
            .args(self.keys);

        if !self.weights.is_empty() {
            cmd = cmd.arg("WEIGHTS").args(self.weights);
        }
        if let Some(aggregate) = self.aggregate {
            cmd = cmd.arg("AGGREGATE").arg(aggregate.as_str());
        }

        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_with_weights_and_aggregate() {
        let cmd = ZStore::union("out", ["a", "b"])
            .weights([1.0, 2.5])
            .aggregate(Aggregate::Max)
            .into_command();

        assert_eq!(
            cmd,
            Command::new("ZUNIONSTORE")
                .args(["out", "2", "a", "b", "WEIGHTS", "1", "2.5", "AGGREGATE", "MAX"])
        );
    }

    #[test]
    fn plain_inter() {
        let cmd = ZStore::inter("out", ["a"]).into_command();
        assert_eq!(cmd, Command::new("ZINTERSTORE").args(["out", "1", "a"]));
    }
}
