// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 BandPay

//! Chain gateway: the only module that talks to the blockchain RPC.
//!
//! Every fallible call returns a [`ChainOutcome`] instead of propagating a
//! fault, so the orchestrator can treat chain unavailability as a
//! business-level failure with a clean rollback point. No local state
//! changes on failure; every call is safe to retry.
//!
//! Nonce and fee data are read fresh from the chain per submission (the
//! alloy filler stack). The owner key signs both gas top-ups and mints, so
//! owner-signed submissions are serialized through [`RpcGateway::owner_lock`]
//! to keep two of them from racing for one nonce.

use std::str::FromStr;
use std::time::Duration;

use alloy::{
    network::EthereumWallet,
    primitives::{Address, TxHash},
    providers::{Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::config::ChainSettings;

use super::token::{from_base_units, to_base_units, IMintableToken, NATIVE_DECIMALS, TOKEN_DECIMALS};

/// Interval between receipt polls while awaiting confirmation.
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Tagged result of a gateway call.
///
/// `Unavailable` is a retryable connectivity failure; `Rejected` is a
/// permanent refusal (bad address, revert, nonce conflict).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOutcome<T> {
    Confirmed(T),
    Unavailable(String),
    Rejected(String),
}

impl<T> ChainOutcome<T> {
    pub fn confirmed(self) -> Option<T> {
        match self {
            Self::Confirmed(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }

    /// The failure reason, for the taxonomy mapping at the orchestrator.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Confirmed(_) => None,
            Self::Unavailable(reason) | Self::Rejected(reason) => Some(reason),
        }
    }
}

/// Receipt of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub block_number: u64,
    pub gas_used: u64,
    pub success: bool,
}

/// Blockchain operations required by the ledger orchestrator.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Native-currency balance of an address.
    async fn native_balance(&self, address: &str) -> ChainOutcome<Decimal>;

    /// Payment-token balance of an address.
    async fn token_balance(&self, address: &str) -> ChainOutcome<Decimal>;

    /// Owner-signed native transfer sized to cover future transaction fees.
    async fn send_gas(&self, to: &str, amount: Decimal) -> ChainOutcome<String>;

    /// Owner-signed mint crediting a custodial address.
    async fn mint_tokens(&self, to: &str, amount: Decimal) -> ChainOutcome<String>;

    /// Token transfer signed with a user's custodial key.
    async fn transfer_tokens(
        &self,
        from_private_key: &str,
        to: &str,
        amount: Decimal,
    ) -> ChainOutcome<String>;

    /// Block until the transaction is mined or the timeout elapses.
    async fn await_confirmation(&self, tx_hash: &str, timeout: Duration) -> ChainOutcome<TxReceipt>;
}

/// Gateway backed by an EVM JSON-RPC endpoint via alloy.
pub struct RpcGateway {
    settings: ChainSettings,
    /// Serializes owner-signed submissions (shared nonce source).
    owner_lock: Mutex<()>,
}

impl RpcGateway {
    pub fn new(settings: ChainSettings) -> Self {
        Self {
            settings,
            owner_lock: Mutex::new(()),
        }
    }

    fn token_address(&self) -> Result<Address, String> {
        Address::from_str(&self.settings.token_address)
            .map_err(|e| format!("invalid token contract address: {e}"))
    }

    fn read_provider(&self) -> impl Provider + Clone {
        ProviderBuilder::new().connect_http(self.settings.rpc_url.clone())
    }

    /// Provider with a wallet filler for the given hex private key.
    fn signing_provider(&self, private_key_hex: &str) -> Result<impl Provider + Clone, String> {
        let key_bytes =
            alloy::hex::decode(private_key_hex).map_err(|e| format!("invalid private key: {e}"))?;
        let signer = PrivateKeySigner::from_slice(&key_bytes)
            .map_err(|e| format!("invalid private key: {e}"))?;
        let wallet = EthereumWallet::from(signer);
        Ok(ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(self.settings.rpc_url.clone()))
    }

    async fn submit_token_transfer(
        &self,
        private_key_hex: &str,
        to: &str,
        amount: Decimal,
    ) -> ChainOutcome<String> {
        let to_addr = match Address::from_str(to) {
            Ok(addr) => addr,
            Err(e) => return ChainOutcome::Rejected(format!("invalid recipient address: {e}")),
        };
        let token_addr = match self.token_address() {
            Ok(addr) => addr,
            Err(e) => return ChainOutcome::Rejected(e),
        };
        let units = match to_base_units(amount, TOKEN_DECIMALS) {
            Ok(units) => units,
            Err(e) => return ChainOutcome::Rejected(e),
        };
        let provider = match self.signing_provider(private_key_hex) {
            Ok(provider) => provider,
            Err(e) => return ChainOutcome::Rejected(e),
        };

        let contract = IMintableToken::new(token_addr, provider);
        match contract.transfer(to_addr, units).send().await {
            Ok(pending) => ChainOutcome::Confirmed(pending.tx_hash().to_string()),
            Err(e) => classify_rpc_error(e.to_string()),
        }
    }
}

#[async_trait]
impl ChainGateway for RpcGateway {
    async fn native_balance(&self, address: &str) -> ChainOutcome<Decimal> {
        let addr = match Address::from_str(address) {
            Ok(addr) => addr,
            Err(e) => return ChainOutcome::Rejected(format!("invalid address: {e}")),
        };

        match self.read_provider().get_balance(addr).await {
            Ok(wei) => ChainOutcome::Confirmed(from_base_units(wei, NATIVE_DECIMALS)),
            Err(e) => ChainOutcome::Unavailable(e.to_string()),
        }
    }

    async fn token_balance(&self, address: &str) -> ChainOutcome<Decimal> {
        let addr = match Address::from_str(address) {
            Ok(addr) => addr,
            Err(e) => return ChainOutcome::Rejected(format!("invalid address: {e}")),
        };
        let token_addr = match self.token_address() {
            Ok(addr) => addr,
            Err(e) => return ChainOutcome::Rejected(e),
        };

        let contract = IMintableToken::new(token_addr, self.read_provider());
        match contract.balanceOf(addr).call().await {
            Ok(units) => ChainOutcome::Confirmed(from_base_units(units, TOKEN_DECIMALS)),
            Err(e) => ChainOutcome::Unavailable(e.to_string()),
        }
    }

    async fn send_gas(&self, to: &str, amount: Decimal) -> ChainOutcome<String> {
        let to_addr = match Address::from_str(to) {
            Ok(addr) => addr,
            Err(e) => return ChainOutcome::Rejected(format!("invalid address: {e}")),
        };
        let wei = match to_base_units(amount, NATIVE_DECIMALS) {
            Ok(wei) => wei,
            Err(e) => return ChainOutcome::Rejected(e),
        };
        let provider = match self.signing_provider(&self.settings.owner_private_key) {
            Ok(provider) => provider,
            Err(e) => return ChainOutcome::Rejected(e),
        };

        let _owner = self.owner_lock.lock().await;
        let tx = TransactionRequest::default().to(to_addr).value(wei);
        match provider.send_transaction(tx).await {
            Ok(pending) => ChainOutcome::Confirmed(pending.tx_hash().to_string()),
            Err(e) => classify_rpc_error(e.to_string()),
        }
    }

    async fn mint_tokens(&self, to: &str, amount: Decimal) -> ChainOutcome<String> {
        let to_addr = match Address::from_str(to) {
            Ok(addr) => addr,
            Err(e) => return ChainOutcome::Rejected(format!("invalid address: {e}")),
        };
        let token_addr = match self.token_address() {
            Ok(addr) => addr,
            Err(e) => return ChainOutcome::Rejected(e),
        };
        let units = match to_base_units(amount, TOKEN_DECIMALS) {
            Ok(units) => units,
            Err(e) => return ChainOutcome::Rejected(e),
        };
        let provider = match self.signing_provider(&self.settings.owner_private_key) {
            Ok(provider) => provider,
            Err(e) => return ChainOutcome::Rejected(e),
        };

        let _owner = self.owner_lock.lock().await;
        let contract = IMintableToken::new(token_addr, provider);
        match contract.mint(to_addr, units).send().await {
            Ok(pending) => ChainOutcome::Confirmed(pending.tx_hash().to_string()),
            Err(e) => classify_rpc_error(e.to_string()),
        }
    }

    async fn transfer_tokens(
        &self,
        from_private_key: &str,
        to: &str,
        amount: Decimal,
    ) -> ChainOutcome<String> {
        self.submit_token_transfer(from_private_key, to, amount).await
    }

    async fn await_confirmation(&self, tx_hash: &str, timeout: Duration) -> ChainOutcome<TxReceipt> {
        let hash = match TxHash::from_str(tx_hash) {
            Ok(hash) => hash,
            Err(e) => return ChainOutcome::Rejected(format!("invalid tx hash: {e}")),
        };

        let provider = self.read_provider();
        let deadline = Instant::now() + timeout;

        loop {
            match provider.get_transaction_receipt(hash).await {
                Ok(Some(receipt)) => {
                    return ChainOutcome::Confirmed(TxReceipt {
                        tx_hash: tx_hash.to_string(),
                        block_number: receipt.block_number.unwrap_or(0),
                        gas_used: receipt.gas_used as u64,
                        success: receipt.status(),
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    // Lookup errors are retried until the deadline.
                    tracing::debug!(tx_hash, error = %e, "receipt lookup failed, retrying");
                }
            }

            if Instant::now() + RECEIPT_POLL_INTERVAL > deadline {
                return ChainOutcome::Unavailable(format!(
                    "transaction {tx_hash} not mined within {}s",
                    timeout.as_secs()
                ));
            }
            sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}

/// Sort an RPC submission error into the retryable/permanent buckets.
fn classify_rpc_error<T>(message: String) -> ChainOutcome<T> {
    let lowered = message.to_lowercase();
    let permanent = ["revert", "rejected", "nonce", "insufficient funds", "underpriced"];
    if permanent.iter().any(|needle| lowered.contains(needle)) {
        ChainOutcome::Rejected(message)
    } else {
        ChainOutcome::Unavailable(message)
    }
}
