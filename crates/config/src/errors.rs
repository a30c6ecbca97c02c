use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("config parse: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("invalid policy: {0}")]
    InvalidPolicy(&'static str),
}
