use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::{Block, BlockTag};

/// Read access to a chain node.
///
/// Implementations must return blocks with their full transaction lists and
/// must not cache: every call reflects the live chain.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn fetch_block(&self, tag: &BlockTag) -> Result<Block, FetchError>;

    /// Human-readable name of the connected network.
    async fn chain_label(&self) -> Result<String, FetchError>;
}
