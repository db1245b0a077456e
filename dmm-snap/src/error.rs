//! Error types for the DMM6500 screenshot tool

use thiserror::Error;

/// Screenshot tool error type
#[derive(Error, Debug)]
pub enum SnapError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebDriver error: {0}")]
    WebDriver(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image data decode failed: {0}")]
    Decode(#[from] base64::DecodeError),
}

pub type Result<T> = std::result::Result<T, SnapError>;
