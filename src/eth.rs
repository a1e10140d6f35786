use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers_core::types::{
    Block as EthBlock, BlockId, BlockNumber as EthBlockNumber, Chain, Transaction as EthTransaction,
    H160, U256, U64,
};
use ethers_providers::{Middleware, Provider, ProviderError, Ws};
use futures_util::{future, Stream, StreamExt};

use crate::{
    client::ChainClient,
    error::FetchError,
    models::{Block, BlockTag, Transaction},
    numeric::{BigNum, BlockNumber},
};

/// Chain client over a single WebSocket connection.
///
/// Both the head subscription and block reads share the connection.
#[derive(Clone)]
pub struct EthClient {
    provider: Provider<Ws>,
}

impl EthClient {
    pub async fn connect(ws_url: &str) -> Result<Self> {
        let provider = Provider::<Ws>::connect(ws_url)
            .await
            .with_context(|| format!("failed to connect to {}", ws_url))?;
        Ok(Self { provider })
    }

    pub async fn latest_block_number(&self) -> Result<BlockNumber> {
        let latest = self
            .provider
            .get_block_number()
            .await
            .context("failed to fetch latest block number")?;
        Ok(BigNum::from(latest.as_u64()))
    }

    /// Stream of chain-head numbers from `eth_subscribe("newHeads")`.
    pub async fn subscribe_block_numbers(&self) -> Result<impl Stream<Item = BlockNumber> + '_> {
        let sub = self
            .provider
            .subscribe_blocks()
            .await
            .context("failed to subscribe to new heads")?;
        Ok(sub.filter_map(|head| future::ready(head.number.map(|n| BigNum::from(n.as_u64())))))
    }

    async fn chain_id_label(&self) -> Result<String, FetchError> {
        let id = self.provider.get_chainid().await.map_err(transport)?;
        let label = match u64::try_from(id) {
            Ok(id) => Chain::try_from(id)
                .map(|chain| chain.to_string())
                .unwrap_or_else(|_| format!("chain-{}", id)),
            Err(_) => format!("chain-{}", id),
        };
        Ok(label)
    }
}

#[async_trait]
impl ChainClient for EthClient {
    async fn fetch_block(&self, tag: &BlockTag) -> Result<Block, FetchError> {
        let block_id = match tag {
            BlockTag::Pending => BlockId::Number(EthBlockNumber::Pending),
            BlockTag::Number(number) => {
                // Heights beyond u64 cannot exist on an EVM chain.
                let number = number
                    .to_u64()
                    .ok_or_else(|| FetchError::NotFound(tag.clone()))?;
                BlockId::Number(EthBlockNumber::Number(U64::from(number)))
            }
        };

        let block = self
            .provider
            .get_block_with_txs(block_id)
            .await
            .map_err(transport)?
            .ok_or_else(|| FetchError::NotFound(tag.clone()))?;

        Ok(normalize_block(tag, block))
    }

    async fn chain_label(&self) -> Result<String, FetchError> {
        match self.provider.request::<_, String>("parity_chain", ()).await {
            Ok(label) if !label.is_empty() => Ok(label),
            Ok(_) => self.chain_id_label().await,
            Err(err) => {
                tracing::debug!("parity_chain unavailable ({}), falling back to chain id", err);
                self.chain_id_label().await
            }
        }
    }
}

fn transport(err: ProviderError) -> FetchError {
    FetchError::Transport(err.to_string())
}

fn normalize_block(tag: &BlockTag, block: EthBlock<EthTransaction>) -> Block {
    Block {
        number: tag.clone(),
        hash: block
            .hash
            .map(|hash| format!("0x{:x}", hash))
            .unwrap_or_default(),
        author: block.author.map(address_to_lower_hex).unwrap_or_default(),
        timestamp: u256_to_u64_lossy(block.timestamp),
        gas_used: u256_to_bignum(block.gas_used),
        gas_limit: u256_to_bignum(block.gas_limit),
        transactions: block.transactions.into_iter().map(normalize_tx).collect(),
    }
}

fn normalize_tx(tx: EthTransaction) -> Transaction {
    let gas_price = tx
        .gas_price
        .or(tx.max_fee_per_gas)
        .map(u256_to_bignum)
        .unwrap_or_else(BigNum::zero);
    Transaction {
        hash: format!("0x{:x}", tx.hash),
        gas_price,
    }
}

fn address_to_lower_hex(addr: H160) -> String {
    format!("0x{:x}", addr)
}

fn u256_to_bignum(value: U256) -> BigNum {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    BigNum::from_be_bytes(&buf)
}

fn u256_to_u64_lossy(value: U256) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers_core::types::H256;

    fn tx(gas_price: Option<u64>, max_fee: Option<u64>) -> EthTransaction {
        let mut tx = EthTransaction::default();
        tx.hash = H256::from_low_u64_be(1);
        tx.from = H160::from_low_u64_be(2);
        tx.gas = U256::from(21_000u64);
        tx.gas_price = gas_price.map(U256::from);
        tx.max_fee_per_gas = max_fee.map(U256::from);
        tx
    }

    #[test]
    fn normalize_legacy_tx_uses_gas_price() {
        let normalized = normalize_tx(tx(Some(1000), None));
        assert_eq!(normalized.gas_price, BigNum::from(1000u64));
        assert_eq!(
            normalized.hash,
            "0x0000000000000000000000000000000000000000000000000000000000000001"
        );
    }

    #[test]
    fn normalize_eip1559_tx_falls_back_to_max_fee() {
        let normalized = normalize_tx(tx(None, Some(2_000_000_000)));
        assert_eq!(normalized.gas_price, BigNum::from(2_000_000_000u64));
    }

    #[test]
    fn normalize_tx_without_price_is_zero() {
        assert!(normalize_tx(tx(None, None)).gas_price.is_zero());
    }

    #[test]
    fn normalize_block_keeps_full_precision_gas() {
        let mut block: EthBlock<EthTransaction> = EthBlock::default();
        block.number = Some(U64::from(10u64));
        block.hash = Some(H256::from_low_u64_be(0xabc));
        block.author = Some(H160::from_low_u64_be(0xdef));
        block.timestamp = U256::from(1_700_000_000u64);
        block.gas_used = U256::MAX;
        block.gas_limit = U256::from(30_000_000u64);
        block.transactions = vec![tx(Some(5), None), tx(Some(7), None)];

        let tag = BlockTag::Number(BigNum::from(10u64));
        let normalized = normalize_block(&tag, block);
        assert_eq!(normalized.number, tag);
        assert_eq!(normalized.timestamp, 1_700_000_000);
        assert_eq!(normalized.author, "0x0000000000000000000000000000000000000def");
        assert_eq!(normalized.gas_used.to_u64(), None);
        assert_eq!(
            normalized.gas_used.to_string(),
            "115792089237316195423570985008687907853269984665640564039457584007913129639935"
        );
        assert_eq!(normalized.gas_limit, BigNum::from(30_000_000u64));
        assert_eq!(normalized.transactions.len(), 2);
    }

    #[test]
    fn normalize_pending_block_without_hash() {
        let block: EthBlock<EthTransaction> = EthBlock::default();
        let normalized = normalize_block(&BlockTag::Pending, block);
        assert!(normalized.number.is_pending());
        assert_eq!(normalized.hash, "");
        assert!(normalized.transactions.is_empty());
    }
}
