//! CLI interface for ringdump
//!
//! This crate provides the command-line interface for ringdump,
//! including argument parsing and help text.

pub mod args;

pub use args::{Cli, DirectionArg};
