use crate::models::BlockTag;
use crate::numeric::BlockNumber;

/// Failure reading a single block or the chain label.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("block {0} not found")]
    NotFound(BlockTag),
    #[error("chain client unavailable: {0}")]
    Transport(String),
}

/// A confirmed block in the window could not be read; the whole window is void.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to fetch confirmed block {number}")]
pub struct WindowFetchError {
    pub number: BlockNumber,
    #[source]
    pub source: FetchError,
}
