use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("chain configuration invalid: {0}")]
    InvalidConfig(String),
    #[error("proof payload must be a JSON object, got {found}")]
    PayloadNotObject { found: &'static str },
    #[error("failed to canonicalise proof payload: {0}")]
    Canonical(#[from] serde_json::Error),
    #[error("proof {0} is not part of this chain")]
    UnknownProof(String),
}

pub type Result<T> = std::result::Result<T, ChainError>;
