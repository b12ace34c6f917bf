//! Errors raised while constructing shared types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CofferError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("{0}")]
    Other(String),
}
