//! Command-line interface for the CAT processor
//!
//! Argument definitions live in [`args`]; [`commands`] runs them against the
//! library.

pub mod args;
pub mod commands;

pub use args::Args;
