//! Command-line interface for autoverify.

mod commands;

pub use commands::run;
