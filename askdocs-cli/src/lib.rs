//! Library half of the `askdocs` binary: argument parsing, component wiring
//! and the subcommands themselves.

pub mod cli;
pub mod commands;
pub mod wiring;

pub use cli::{Cli, Command, EmbedderKind, Settings};
