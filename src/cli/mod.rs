//! Command-line interface: `serve`, `migrate` and `users`.

pub mod args;

pub use args::{Cli, Commands};
