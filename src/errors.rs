//! Errors detected before any command is launched.
//!
//! Runtime failures of spawned commands are never reported through this type;
//! they only turn the run's verdict into a failure without detail.

use thiserror::Error;

/// Input validation failures for a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// The command list was empty.
    #[error("No command provided")]
    NoCommands,

    /// A name list was supplied whose length differs from the command list.
    #[error("--names options provided, but {names} names were given for {commands} commands")]
    NameCountMismatch { names: usize, commands: usize },
}
