// src/error.rs
//! Error kinds surfaced by the library. Startup/config code uses `anyhow` instead.

use thiserror::Error;

/// The upstream model returned something that does not fit the declared response shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("empty upstream response")]
    Empty,

    #[error("upstream contract violation: {0}")]
    Violation(String),
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("settings IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings file is corrupt: {0}")]
    Corrupt(String),

    #[error("invalid settings input: {0}")]
    Invalid(String),

    #[error("settings serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    #[error("a request is already in flight")]
    AlreadyPending,
}
