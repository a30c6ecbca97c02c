//! Configuration for the settlement tooling.

mod config;
mod errors;

pub use config::Config;
pub use errors::ConfigError;
