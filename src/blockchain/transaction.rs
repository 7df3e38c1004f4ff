//! Transaction building and confirmation monitoring.
//!
//! # Responsibilities
//! - Build contract calls with explicit nonce, gas estimation and price caps
//! - Monitor confirmations
//!
//! Failed broadcasts are never retried here; the caller decides.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Bytes, TxHash};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use std::time::{Duration, Instant};
use tokio::time::{interval, timeout};

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::types::{ChainError, ChainResult, ConfirmationStatus};

/// Extra gas on top of the node's estimate, in percent.
const GAS_LIMIT_BUFFER_PERCENT: u64 = 20;

/// Count of confirmations for a transaction mined in `tx_block`, the
/// inclusion block counting as the first one.
pub fn confirmations(current_block: u64, tx_block: u64) -> u32 {
    if current_block < tx_block {
        return 0;
    }
    u32::try_from(current_block - tx_block + 1).unwrap_or(u32::MAX)
}

const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Apply the configured multiplier to a node gas price.
pub fn adjusted_gas_price(gas_price: u128, multiplier: f64) -> u128 {
    (gas_price as f64 * multiplier) as u128
}

/// The price the transaction will actually pay, refused when it exceeds the cap.
pub fn capped_gas_price(node_price: u128, multiplier: f64, max_gwei: u64) -> ChainResult<u128> {
    let price = adjusted_gas_price(node_price, multiplier);
    if price > max_gwei as u128 * WEI_PER_GWEI {
        return Err(ChainError::GasPriceTooHigh {
            current_gwei: u64::try_from(price.div_ceil(WEI_PER_GWEI)).unwrap_or(u64::MAX),
            max_gwei,
        });
    }
    Ok(price)
}

impl BlockchainClient {
    /// Build a contract call from the signing account.
    ///
    /// The nonce is the node's pending count, so a transaction that was
    /// broadcast but never confirmed is not reused.
    /// Gas estimation doubles as a dry run: a call that would revert fails
    /// here with [`ChainError::Reverted`] and is never broadcast.
    pub async fn build_transaction(&self, data: Bytes) -> ChainResult<TransactionRequest> {
        let from = self.wallet.address();

        let nonce = match timeout(self.timeout_duration, async {
            self.signer.get_transaction_count(from).pending().await
        })
        .await
        {
            Ok(Ok(nonce)) => nonce,
            Ok(Err(e)) => return Err(ChainError::Rpc(format!("Nonce lookup failed: {}", e))),
            Err(_) => return Err(ChainError::Timeout(self.config.rpc_timeout_secs)),
        };

        let gas_price = match timeout(self.timeout_duration, self.signer.get_gas_price()).await {
            Ok(Ok(price)) => price,
            Ok(Err(e)) => return Err(ChainError::Rpc(format!("Gas price lookup failed: {}", e))),
            Err(_) => return Err(ChainError::Timeout(self.config.rpc_timeout_secs)),
        };
        let gas_price = capped_gas_price(
            gas_price,
            self.config.gas_price_multiplier,
            self.config.max_gas_price_gwei,
        )?;

        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(self.contract)
            .with_input(data)
            .with_chain_id(self.wallet.chain_id());

        let estimated_gas = match timeout(self.timeout_duration, async {
            self.signer.estimate_gas(tx.clone()).await
        })
        .await
        {
            Ok(Ok(gas)) => gas,
            Ok(Err(e)) => {
                let reason = e
                    .as_error_resp()
                    .map(|payload| payload.message.to_string())
                    .unwrap_or_else(|| e.to_string());
                return Err(ChainError::Reverted(reason));
            }
            Err(_) => return Err(ChainError::Timeout(self.config.rpc_timeout_secs)),
        };
        let gas_limit = estimated_gas + estimated_gas * GAS_LIMIT_BUFFER_PERCENT / 100;

        Ok(tx
            .with_nonce(nonce)
            .with_gas_price(gas_price)
            .with_gas_limit(gas_limit))
    }

    /// Wait for a transaction to be confirmed.
    ///
    /// # Arguments
    /// * `tx_hash` - Transaction hash to monitor
    /// * `timeout_secs` - Maximum time to wait for confirmation
    pub async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
        timeout_secs: u64,
    ) -> ChainResult<ConfirmationStatus> {
        let required_confirmations = self.confirmation_blocks();
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);
        let started = Instant::now();

        let result = timeout(Duration::from_secs(timeout_secs), async {
            let mut ticker = interval(poll_interval);

            loop {
                ticker.tick().await;

                let receipt = match self.get_transaction_receipt(tx_hash).await {
                    Ok(Some(r)) => r,
                    Ok(None) => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt lookup failed");
                        continue;
                    }
                };

                if !receipt.status() {
                    return Ok(ConfirmationStatus::Failed(format!(
                        "transaction {} reverted",
                        tx_hash
                    )));
                }

                let current_block = match self.get_block_number().await {
                    Ok(block) => block,
                    Err(e) => {
                        tracing::warn!(tx_hash = %tx_hash, error = %e, "Block number lookup failed");
                        continue;
                    }
                };
                let tx_block = receipt.block_number.unwrap_or(current_block);
                let status = match confirmations(current_block, tx_block) {
                    n if n >= required_confirmations => ConfirmationStatus::Confirmed {
                        block_number: tx_block,
                    },
                    n => ConfirmationStatus::Confirming {
                        current: n,
                        required: required_confirmations,
                    },
                };

                if let ConfirmationStatus::Confirmed { .. } = status {
                    return Ok(status);
                }
                tracing::debug!(tx_hash = %tx_hash, status = ?status, "Waiting for confirmations");
            }
        })
        .await;

        match result {
            Ok(status) => status,
            Err(_) => Err(ChainError::ConfirmationTimeout {
                tx_hash,
                waited_secs: started.elapsed().as_secs(),
            }),
        }
    }
}
