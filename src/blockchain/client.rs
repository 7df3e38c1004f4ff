//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoints (signing primary, read-only failovers)
//! - Query contract state (reports, user report ids, receipts)
//! - Broadcast contract writes from the configured wallet
//! - Handle timeouts and network errors gracefully
//! - Provide health check for blockchain connectivity

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::network::TransactionBuilder;
use alloy::transports::TransportResult;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::chain::{ensure_transition, ChainClient, TxStatus};
use crate::blockchain::contract;
use crate::blockchain::types::{
    BlockchainConfig, ChainError, ChainId, ChainResult, ConfirmationStatus,
};
use crate::blockchain::wallet::Wallet;
use crate::observability::metrics;
use crate::reports::types::{BugReport, WriteIntent};

type DynProvider = Arc<dyn Provider + Send + Sync>;

/// Contract client bound to one wallet, with read failover.
#[derive(Clone)]
pub struct BlockchainClient {
    /// Read providers (primary + failovers).
    pub(crate) providers: Vec<DynProvider>,
    /// Primary provider with the wallet attached; every write goes through it.
    pub(crate) signer: DynProvider,
    pub(crate) wallet: Wallet,
    pub(crate) contract: Address,
    pub(crate) config: BlockchainConfig,
    /// Request timeout duration.
    pub(crate) timeout_duration: Duration,
}

impl BlockchainClient {
    /// Create a new blockchain client.
    ///
    /// No network I/O is required to succeed; a chain ID mismatch or an
    /// unreachable node is logged and the client is still returned.
    pub async fn new(config: BlockchainConfig, wallet: Wallet) -> ChainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);

        let contract: Address = config.contract_address.parse().map_err(|e| {
            ChainError::Rpc(format!(
                "Invalid contract address '{}': {}",
                config.contract_address, e
            ))
        })?;

        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            ChainError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;

        let signer = Arc::new(
            ProviderBuilder::new()
                .wallet(wallet.ethereum_wallet())
                .connect_http(primary_url.clone()),
        ) as DynProvider;

        let mut providers = vec![Arc::new(ProviderBuilder::new().connect_http(primary_url)) as DynProvider];
        for url_str in &config.failover_urls {
            match url_str.parse::<url::Url>() {
                Ok(url) => providers.push(Arc::new(ProviderBuilder::new().connect_http(url)) as DynProvider),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL"),
            }
        }

        let client = Self {
            providers,
            signer,
            wallet,
            contract,
            config: config.clone(),
            timeout_duration,
        };

        match client.verify_chain_id().await {
            Ok(()) => {
                tracing::info!(
                    rpc_url = %config.rpc_url,
                    chain_id = config.chain_id,
                    contract = %contract,
                    signer = %client.wallet.address(),
                    "Blockchain client initialized"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Blockchain client initialized but chain verification failed"
                );
            }
        }

        Ok(client)
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> ChainResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != self.config.chain_id {
            return Err(ChainError::ChainMismatch {
                expected: self.config.chain_id,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    /// Run a read against each provider in turn until one answers.
    ///
    /// Transport failures and timeouts fall through to the next provider. A
    /// JSON-RPC error response is the node's answer and is returned as is,
    /// mapped through `node_error`.
    async fn read<T, F, Fut>(
        &self,
        op: &'static str,
        node_error: fn(String) -> ChainError,
        f: F,
    ) -> ChainResult<T>
    where
        F: Fn(DynProvider) -> Fut,
        Fut: Future<Output = TransportResult<T>>,
    {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, f(provider.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    if let Some(payload) = e.as_error_resp() {
                        return Err(node_error(payload.message.to_string()));
                    }
                    tracing::warn!(provider_idx = i, op, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, op, "RPC timeout, trying next provider");
                }
            }
        }
        Err(ChainError::Rpc(format!("All RPC providers failed to {}", op)))
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> ChainResult<ChainId> {
        self.read("get chain id", ChainError::Rpc, |p| async move { p.get_chain_id().await })
            .await
            .map(ChainId)
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> ChainResult<u64> {
        self.read("get block number", ChainError::Rpc, |p| async move {
            p.get_block_number().await
        })
        .await
    }

    /// Get a transaction receipt by hash.
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> ChainResult<Option<TransactionReceipt>> {
        self.read("get receipt", ChainError::Rpc, |p| async move {
            p.get_transaction_receipt(tx_hash).await
        })
        .await
    }

    /// `eth_call` against the contract at the latest block.
    async fn call_contract(&self, op: &'static str, data: Bytes) -> ChainResult<Bytes> {
        let request = TransactionRequest::default()
            .with_to(self.contract)
            .with_input(data);
        self.read(op, ChainError::Reverted, |p| {
            let request = request.clone();
            async move { p.call(request).await }
        })
        .await
    }

    /// Get the signing account address.
    pub fn signer_address(&self) -> Address {
        self.wallet.address()
    }

    /// Get the number of confirmation blocks required.
    pub fn confirmation_blocks(&self) -> u32 {
        self.config.confirmation_blocks
    }
}

#[async_trait]
impl ChainClient for BlockchainClient {
    async fn send(&self, intent: &WriteIntent) -> ChainResult<TxHash> {
        if let Some(report_id) = intent.report_id() {
            let report = self.get_report(report_id).await?;
            ensure_transition(&report, intent)?;
        }

        let tx = self.build_transaction(contract::encode_write(intent)).await?;
        let nonce = tx.nonce;

        match timeout(self.timeout_duration, self.signer.send_transaction(tx)).await {
            Ok(Ok(pending)) => {
                let tx_hash = *pending.tx_hash();
                tracing::info!(
                    tx_hash = %tx_hash,
                    intent = %intent.kind(),
                    nonce = ?nonce,
                    "Transaction broadcast"
                );
                Ok(tx_hash)
            }
            Ok(Err(e)) => Err(ChainError::Rpc(format!("Broadcast failed: {}", e))),
            Err(_) => Err(ChainError::Timeout(self.config.rpc_timeout_secs)),
        }
    }

    async fn confirm(&self, tx_hash: TxHash) -> ChainResult<u64> {
        match self
            .wait_for_confirmation(tx_hash, self.config.confirmation_timeout_secs)
            .await?
        {
            ConfirmationStatus::Confirmed { block_number } => Ok(block_number),
            ConfirmationStatus::Failed(reason) => Err(ChainError::Reverted(reason)),
            status => Err(ChainError::Rpc(format!(
                "Unexpected confirmation status for {}: {:?}",
                tx_hash, status
            ))),
        }
    }

    async fn get_report(&self, report_id: U256) -> ChainResult<BugReport> {
        let data = self
            .call_contract("read report", contract::encode_get_bug_report(report_id))
            .await?;
        contract::decode_bug_report(report_id, &data)
    }

    async fn get_user_reports(&self, reporter: Address) -> ChainResult<Vec<U256>> {
        let data = self
            .call_contract("read user reports", contract::encode_get_user_reports(reporter))
            .await?;
        contract::decode_user_reports(&data)
    }

    async fn transaction_status(&self, tx_hash: TxHash) -> ChainResult<TxStatus> {
        let status = match self.get_transaction_receipt(tx_hash).await? {
            None => TxStatus::Unknown,
            Some(receipt) => {
                let block_number = receipt.block_number.unwrap_or_default();
                if receipt.status() {
                    TxStatus::Confirmed { block_number }
                } else {
                    TxStatus::Reverted { block_number }
                }
            }
        };
        Ok(status)
    }

    async fn is_healthy(&self) -> bool {
        let healthy = self.get_block_number().await.is_ok();
        metrics::record_chain_health(healthy);
        healthy
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("contract", &self.contract)
            .field("signer", &self.wallet.address())
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
