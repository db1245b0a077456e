//! Error types for the voltage follower

use thiserror::Error;

/// Voltage follower error type
#[derive(Error, Debug)]
pub enum FollowerError {
    #[error("Link error: {0}")]
    Link(#[from] bb3_link::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Channel {channel} has module {model:?}, this tool requires {required}")]
    IncompatibleModule {
        channel: u8,
        model: String,
        required: String,
    },
}

impl From<toml::de::Error> for FollowerError {
    fn from(e: toml::de::Error) -> Self {
        FollowerError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FollowerError>;
