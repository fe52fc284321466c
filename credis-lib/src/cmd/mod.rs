//! Builders for commands whose arguments are more than a flat list.
//!
//! Most commands are a name followed by keys and values and are built
//! directly with [`Command`]. The types here cover optional clauses and
//! weighted key lists.

mod set;
pub use set::{Set, SetCondition};

mod zstore;
pub use zstore::{Aggregate, ZStore};

use crate::frame::Command;

/// Converts a command description into the argument list sent to the server.
pub trait IntoCommand {
    fn into_command(self) -> Command;
}

impl IntoCommand for Command {
    fn into_command(self) -> Command {
        self
    }
}
