use std::sync::Arc;

use futures_util::future::{join, join_all};
use tracing::{debug, warn};

use crate::{
    client::ChainClient,
    error::{FetchError, WindowFetchError},
    models::{BlockTag, Window},
    numeric::BlockNumber,
};

pub const DEFAULT_WINDOW_SIZE: u64 = 10;
/// Upper bound on confirmed blocks fetched per cycle.
pub const MAX_WINDOW_SIZE: u64 = 1024;

/// Confirmed heights in `[max(0, latest - size), latest)`, ascending.
pub fn confirmed_range(latest: &BlockNumber, size: u64) -> Vec<BlockNumber> {
    let mut next = latest.saturating_sub(size);
    let mut out = Vec::new();
    while &next < latest {
        let following = next.successor();
        out.push(next);
        next = following;
    }
    out
}

/// Fetches the recent confirmed blocks and the pending block in one fan-out.
pub struct WindowBuilder<C> {
    client: Arc<C>,
    size: u64,
}

impl<C: ChainClient> WindowBuilder<C> {
    /// `size` is capped at [`MAX_WINDOW_SIZE`].
    pub fn new(client: Arc<C>, size: u64) -> Self {
        Self {
            client,
            size: size.min(MAX_WINDOW_SIZE),
        }
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Waits for every fetch to settle. A missing pending block leaves the
    /// slot empty; any failed confirmed block fails the window.
    pub async fn build_window(&self, latest: &BlockNumber) -> Result<Window, WindowFetchError> {
        let numbers = confirmed_range(latest, self.size);
        let confirmed = join_all(numbers.iter().map(|number| async move {
            self.client
                .fetch_block(&BlockTag::Number(number.clone()))
                .await
        }));
        let (confirmed, pending) = join(confirmed, self.client.fetch_block(&BlockTag::Pending)).await;

        let mut blocks = Vec::with_capacity(numbers.len());
        for (number, result) in numbers.into_iter().zip(confirmed) {
            match result {
                Ok(block) => blocks.push(block),
                Err(source) => return Err(WindowFetchError { number, source }),
            }
        }

        let pending = match pending {
            Ok(block) => Some(block),
            Err(FetchError::NotFound(_)) => {
                debug!(latest = %latest, "no pending block");
                None
            }
            Err(err) => {
                warn!(latest = %latest, error = %err, "pending block fetch failed");
                None
            }
        };

        Ok(Window::new(blocks, pending))
    }
}
