//! Error types for veremin

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VereminError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Unknown note name: {0}")]
    NoteName(String),
    #[error("Note sink error: {0}")]
    Sink(String),
}

pub type Result<T> = std::result::Result<T, VereminError>;
