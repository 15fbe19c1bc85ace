//! Simulta: run several shell commands at once and merge their output.
//!
//! The stdout of every command is merged into one sink and the stderr into
//! another, optionally with an aligned `[label]` prefix per line. The run's
//! `Verdict` is a success only when every command exited with status 0.

pub mod config;
pub mod errors;
pub mod framing;
pub mod logging;
pub mod multiplex;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod runner;

pub use errors::RunError;
pub use framing::FramingPolicy;
pub use runner::{run, RunRequest, Verdict};
