use serde::Serialize;

use crate::models::Block;
use crate::numeric::{Average, BigNum};

/// Aggregates over the confirmed part of a window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub average_transactions_per_block: f64,
    pub average_gas_price: Average,
}

impl Statistics {
    /// Recomputes both averages from scratch. Empty input yields zeros.
    pub fn aggregate(blocks: &[Block]) -> Self {
        let gas_prices: Vec<&BigNum> = blocks
            .iter()
            .flat_map(|block| block.transactions.iter())
            .map(|tx| &tx.gas_price)
            .collect();

        let tx_count = gas_prices.len() as u64;
        let total_gas_price: BigNum = gas_prices.into_iter().sum();

        let average_transactions_per_block = if blocks.is_empty() {
            0.0
        } else {
            tx_count as f64 / blocks.len() as f64
        };

        Self {
            average_transactions_per_block,
            average_gas_price: Average::new(total_gas_price, tx_count),
        }
    }

    pub fn average_gas_price_gwei(&self) -> f64 {
        self.average_gas_price.to_f64() / 1e9
    }
}
