//! The gateway's signing account.
//!
//! The key comes from `PRIVATE_KEY` and nowhere else. It is never logged or
//! serialized; `Debug` shows the address only. Nonces are not tracked here:
//! each write takes the node's pending count, and the sequencer guarantees
//! only one write is ever being built.

use std::fmt;

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;

use crate::blockchain::types::{ChainError, ChainResult};

/// Environment variable holding the hex private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "PRIVATE_KEY";

/// The single account that authorizes every write.
#[derive(Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
    /// EIP-155 chain id stamped on every transaction.
    chain_id: u64,
}

impl Wallet {
    /// Parse a hex key, with or without `0x`, surrounding whitespace ignored.
    pub fn from_private_key(private_key_hex: &str, chain_id: u64) -> ChainResult<Self> {
        let signer = parse_signer(private_key_hex)?;
        tracing::info!(address = %signer.address(), chain_id, "Signing account loaded");
        Ok(Self { signer, chain_id })
    }

    /// Load the key from `PRIVATE_KEY`.
    pub fn from_env(chain_id: u64) -> ChainResult<Self> {
        match std::env::var(PRIVATE_KEY_ENV_VAR) {
            Ok(key) => Self::from_private_key(&key, chain_id),
            Err(_) => Err(ChainError::Wallet(format!(
                "{} must be set to the signing account's private key",
                PRIVATE_KEY_ENV_VAR
            ))),
        }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Network wallet for the signing provider.
    pub fn ethereum_wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

fn parse_signer(raw: &str) -> ChainResult<PrivateKeySigner> {
    let trimmed = raw.trim();
    let key = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if key.is_empty() {
        return Err(ChainError::Wallet(format!("{} is empty", PRIVATE_KEY_ENV_VAR)));
    }

    // The parse error never echoes the key.
    key.parse()
        .map_err(|e| ChainError::Wallet(format!("Invalid private key format: {}", e)))
}
