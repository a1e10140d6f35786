#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc::UnboundedReceiver, Semaphore};

use eth_block_window::client::ChainClient;
use eth_block_window::error::FetchError;
use eth_block_window::models::{Block, BlockTag, Transaction};
use eth_block_window::numeric::BigNum;
use eth_block_window::observer::DashboardEvent;

pub const PENDING_TIMESTAMP: u64 = 1_700_009_999;

/// In-memory chain. Block `n` carries one transaction priced `10 * (n + 1)`.
pub struct FakeChain {
    blocks: Mutex<HashMap<u64, Block>>,
    pending: Mutex<Option<Block>>,
    pending_error: Mutex<Option<FetchError>>,
    failing: Mutex<HashSet<u64>>,
    label: Mutex<Result<String, FetchError>>,
    calls: Mutex<Vec<BlockTag>>,
    pending_gate: Option<Arc<Semaphore>>,
}

impl FakeChain {
    pub fn new(head: u64) -> Self {
        let blocks = (0..head).map(|n| (n, block(n, &[10 * (n + 1)]))).collect();
        Self {
            blocks: Mutex::new(blocks),
            pending: Mutex::new(Some(pending_block(&[7, 9]))),
            pending_error: Mutex::new(None),
            failing: Mutex::new(HashSet::new()),
            label: Mutex::new(Ok("kovan".to_string())),
            calls: Mutex::new(Vec::new()),
            pending_gate: None,
        }
    }

    /// Pending reads block until a permit is added to the returned semaphore.
    pub fn gated(head: u64) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let mut chain = Self::new(head);
        chain.pending_gate = Some(Arc::clone(&gate));
        (chain, gate)
    }

    pub fn set_pending(&self, pending: Option<Block>) {
        *self.pending.lock().unwrap() = pending;
    }

    pub fn set_pending_error(&self, error: Option<FetchError>) {
        *self.pending_error.lock().unwrap() = error;
    }

    pub fn fail_block(&self, number: u64) {
        self.failing.lock().unwrap().insert(number);
    }

    pub fn heal_block(&self, number: u64) {
        self.failing.lock().unwrap().remove(&number);
    }

    pub fn set_label(&self, label: Result<String, FetchError>) {
        *self.label.lock().unwrap() = label;
    }

    pub fn calls(&self) -> Vec<BlockTag> {
        self.calls.lock().unwrap().clone()
    }

    pub fn confirmed_calls(&self) -> Vec<u64> {
        let mut numbers: Vec<u64> = self
            .calls()
            .iter()
            .filter_map(|tag| tag.number().and_then(|n| n.to_u64()))
            .collect();
        numbers.sort_unstable();
        numbers
    }

    pub fn pending_calls(&self) -> usize {
        self.calls().iter().filter(|tag| tag.is_pending()).count()
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn fetch_block(&self, tag: &BlockTag) -> Result<Block, FetchError> {
        self.calls.lock().unwrap().push(tag.clone());

        match tag {
            BlockTag::Pending => {
                if let Some(gate) = &self.pending_gate {
                    gate.acquire().await.expect("gate closed").forget();
                }
                let error = self.pending_error.lock().unwrap().clone();
                if let Some(error) = error {
                    return Err(error);
                }
                let pending = self.pending.lock().unwrap().clone();
                pending.ok_or_else(|| FetchError::NotFound(tag.clone()))
            }
            BlockTag::Number(number) => {
                let number = number
                    .to_u64()
                    .ok_or_else(|| FetchError::NotFound(tag.clone()))?;
                if self.failing.lock().unwrap().contains(&number) {
                    return Err(FetchError::Transport("connection reset".to_string()));
                }
                let found = self.blocks.lock().unwrap().get(&number).cloned();
                found.ok_or_else(|| FetchError::NotFound(tag.clone()))
            }
        }
    }

    async fn chain_label(&self) -> Result<String, FetchError> {
        self.label.lock().unwrap().clone()
    }
}

pub fn block(number: u64, gas_prices: &[u64]) -> Block {
    Block {
        number: BlockTag::Number(BigNum::from(number)),
        hash: format!("0x{:064x}", number + 1),
        author: "0x00000000000000000000000000000000000000aa".to_string(),
        timestamp: 1_700_000_000 + number * 12,
        gas_used: BigNum::from(21_000 * gas_prices.len() as u64),
        gas_limit: BigNum::from(30_000_000u64),
        transactions: transactions(number, gas_prices),
    }
}

pub fn pending_block(gas_prices: &[u64]) -> Block {
    Block {
        number: BlockTag::Pending,
        hash: String::new(),
        author: "0x00000000000000000000000000000000000000bb".to_string(),
        timestamp: PENDING_TIMESTAMP,
        gas_used: BigNum::from(21_000 * gas_prices.len() as u64),
        gas_limit: BigNum::from(30_000_000u64),
        transactions: transactions(u64::MAX, gas_prices),
    }
}

fn transactions(number: u64, gas_prices: &[u64]) -> Vec<Transaction> {
    gas_prices
        .iter()
        .enumerate()
        .map(|(i, price)| Transaction {
            hash: format!("0x{:x}{:04x}", number, i),
            gas_price: BigNum::from(*price),
        })
        .collect()
}

pub async fn next_event(rx: &mut UnboundedReceiver<DashboardEvent>) -> DashboardEvent {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for dashboard event")
        .expect("observer channel closed")
}

pub async fn assert_quiet(rx: &mut UnboundedReceiver<DashboardEvent>) {
    let next = tokio::time::timeout(Duration::from_millis(150), rx.recv()).await;
    assert!(next.is_err(), "unexpected event: {:?}", next);
}

pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
