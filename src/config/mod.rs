//! Application configuration module
//!
//! Environment-driven settings plus the constants every layer shares.

mod constants;
mod settings;

pub use constants::*;
pub use settings::Config;
