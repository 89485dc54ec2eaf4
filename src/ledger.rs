// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 BandPay

//! # Ledger Orchestrator
//!
//! Fund and spend state machines. Each operation combines the balance
//! record, PIN check, lazy wallet/gas provisioning, a chain transaction,
//! and a ledger append into one logically-atomic unit: the off-chain
//! balance moves if and only if the paired chain call returned a
//! transaction hash.
//!
//! A per-account mutex (keyed by the normalized band id) is held across
//! the whole validate → chain-call → commit sequence, so a concurrent
//! fund/spend on the same account cannot interleave between the balance
//! check and the balance write.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::StatusCode;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::chain::{ChainGateway, ChainOutcome};
use crate::config::{ChainSettings, CONFIRMATION_TIMEOUT};
use crate::error::ApiError;
use crate::models::{Account, EntryKind};
use crate::storage::{
    normalize_band_id, AccountRepository, LedgerRepository, MerchantRepository, Storage,
    StorageError,
};

/// Failure taxonomy of fund/spend operations.
///
/// Validation and authorization errors are raised before any chain call
/// and leave no side effect. `ChainFailure` is only reachable afterwards
/// and also leaves state untouched.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("User not found")]
    NotFound,

    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Band is blocked")]
    Forbidden,

    #[error("Invalid User PIN")]
    Unauthorized,

    #[error("Insufficient balance")]
    InsufficientFunds,

    #[error("Blockchain transaction failed: {0}")]
    ChainFailure(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound => ApiError::not_found("User not found"),
            LedgerError::InvalidAmount => ApiError::bad_request("Invalid amount"),
            LedgerError::Forbidden => ApiError::forbidden("Band is blocked"),
            LedgerError::Unauthorized => ApiError::unauthorized("Invalid User PIN"),
            LedgerError::InsufficientFunds => ApiError::bad_request("Insufficient balance"),
            LedgerError::ChainFailure(reason) => {
                tracing::error!(%reason, "chain transaction failed");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Blockchain transaction failed",
                )
            }
            LedgerError::InvalidInput(message) => ApiError::bad_request(message),
            LedgerError::Storage(source) => {
                tracing::error!(error = %source, "storage failure in ledger operation");
                ApiError::internal("Storage failure")
            }
        }
    }
}

/// Result of a committed fund/spend operation.
#[derive(Debug, Clone)]
pub struct Settled {
    pub current_balance: Decimal,
    pub tx_hash: String,
}

/// The fund/spend orchestrator.
pub struct Ledger {
    storage: Arc<Storage>,
    chain: Arc<dyn ChainGateway>,
    settings: ChainSettings,
    /// One mutex per account, keyed by normalized band id.
    account_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Ledger {
    pub fn new(storage: Arc<Storage>, chain: Arc<dyn ChainGateway>, settings: ChainSettings) -> Self {
        Self {
            storage,
            chain,
            settings,
            account_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Credit a band: mint tokens to its custodial wallet, then move the
    /// off-chain balance.
    pub async fn fund(
        &self,
        band_id: &str,
        amount_raw: &serde_json::Value,
    ) -> Result<Settled, LedgerError> {
        let key = normalize_band_id(band_id);
        let lock = self.lock_for(&key).await;
        let _guard = lock.lock().await;

        let accounts = AccountRepository::new(&self.storage);
        let mut account = accounts.get(band_id).map_err(map_user_lookup)?;
        let amount = parse_amount(amount_raw)?;

        let wallet_address = self.ensure_wallet(&mut account, &accounts)?;
        self.ensure_gas(&wallet_address).await;

        let tx_hash = match self.chain.mint_tokens(&wallet_address, amount).await {
            ChainOutcome::Confirmed(hash) => hash,
            outcome => {
                return Err(LedgerError::ChainFailure(
                    outcome.reason().unwrap_or("mint returned no hash").to_string(),
                ))
            }
        };

        account.balance = (account.balance + amount).round_dp(2);
        accounts.update(&account)?;

        LedgerRepository::new(&self.storage).append(
            &account.band_id,
            amount,
            EntryKind::Credit,
            "Top-up via Mint",
            Some(tx_hash.clone()),
        )?;

        tracing::info!(band_id = %account.band_id, %amount, %tx_hash, "band funded");
        Ok(Settled {
            current_balance: account.balance,
            tx_hash,
        })
    }

    /// Debit a band: transfer tokens from its custodial wallet to the
    /// resolved merchant (or the store wallet), then move the off-chain
    /// balance.
    pub async fn spend(
        &self,
        band_id: &str,
        amount_raw: &serde_json::Value,
        pin: &str,
        description: Option<&str>,
        seller_id: Option<&str>,
    ) -> Result<Settled, LedgerError> {
        let target_address = self.resolve_target(seller_id)?;

        let key = normalize_band_id(band_id);
        let lock = self.lock_for(&key).await;
        let _guard = lock.lock().await;

        let accounts = AccountRepository::new(&self.storage);
        let mut account = accounts.get(band_id).map_err(map_user_lookup)?;
        let amount = parse_amount(amount_raw)?;

        if account.is_blocked {
            return Err(LedgerError::Forbidden);
        }
        if account.pin != pin {
            return Err(LedgerError::Unauthorized);
        }
        if account.balance < amount {
            return Err(LedgerError::InsufficientFunds);
        }

        let wallet_address = self.ensure_wallet(&mut account, &accounts)?;
        self.ensure_gas(&wallet_address).await;

        let private_key = account
            .private_key
            .clone()
            .ok_or_else(|| LedgerError::ChainFailure("custodial key missing".to_string()))?;

        let tx_hash = match self
            .chain
            .transfer_tokens(&private_key, &target_address, amount)
            .await
        {
            ChainOutcome::Confirmed(hash) => hash,
            outcome => {
                return Err(LedgerError::ChainFailure(
                    outcome
                        .reason()
                        .unwrap_or("transfer returned no hash")
                        .to_string(),
                ))
            }
        };

        account.balance = (account.balance - amount).round_dp(2);
        accounts.update(&account)?;

        LedgerRepository::new(&self.storage).append(
            &account.band_id,
            amount,
            EntryKind::Debit,
            description.unwrap_or("Payment"),
            Some(tx_hash.clone()),
        )?;

        tracing::info!(band_id = %account.band_id, %amount, %tx_hash, "payment settled");
        Ok(Settled {
            current_balance: account.balance,
            tx_hash,
        })
    }

    /// Settlement target: a walleted merchant if one resolves, otherwise
    /// the store wallet.
    fn resolve_target(&self, seller_id: Option<&str>) -> Result<String, LedgerError> {
        if let Some(id) = seller_id {
            let merchants = MerchantRepository::new(&self.storage);
            match merchants.get(id) {
                Ok(merchant) => {
                    if let Some(address) = merchant.wallet_address {
                        return Ok(address);
                    }
                }
                Err(StorageError::NotFound(_)) => {}
                Err(other) => return Err(other.into()),
            }
        }
        Ok(self.settings.owner_address.clone())
    }

    /// Lazily provision a custodial wallet for pre-existing accounts.
    fn ensure_wallet(
        &self,
        account: &mut Account,
        accounts: &AccountRepository<'_>,
    ) -> Result<String, LedgerError> {
        if account.wallet_address.is_none() || account.private_key.is_none() {
            let (address, private_key) = crate::wallet::generate_keypair();
            account.wallet_address = Some(address);
            account.private_key = Some(private_key);
            accounts.update(account)?;
            tracing::info!(band_id = %account.band_id, "custodial wallet provisioned lazily");
        }
        // Both fields are Some after the branch above.
        account
            .wallet_address
            .clone()
            .ok_or_else(|| LedgerError::ChainFailure("wallet provisioning failed".to_string()))
    }

    /// Best-effort gas top-up. Failures are logged and swallowed: gas may
    /// already suffice, and the primary operation decides success.
    async fn ensure_gas(&self, wallet_address: &str) {
        let needs_gas = match self.chain.native_balance(wallet_address).await {
            ChainOutcome::Confirmed(balance) => balance < self.settings.gas_topup_threshold,
            outcome => {
                tracing::warn!(
                    wallet_address,
                    reason = outcome.reason().unwrap_or_default(),
                    "gas balance unreadable, assuming empty"
                );
                true
            }
        };
        if !needs_gas {
            return;
        }

        match self
            .chain
            .send_gas(wallet_address, self.settings.gas_topup_amount)
            .await
        {
            ChainOutcome::Confirmed(tx_hash) => {
                tracing::info!(wallet_address, %tx_hash, "gas top-up submitted");
                if let outcome @ (ChainOutcome::Unavailable(_) | ChainOutcome::Rejected(_)) =
                    self.chain.await_confirmation(&tx_hash, CONFIRMATION_TIMEOUT).await
                {
                    tracing::warn!(
                        wallet_address,
                        %tx_hash,
                        reason = outcome.reason().unwrap_or_default(),
                        "gas top-up unconfirmed, proceeding anyway"
                    );
                }
            }
            outcome => {
                tracing::warn!(
                    wallet_address,
                    reason = outcome.reason().unwrap_or_default(),
                    "gas top-up failed, proceeding anyway"
                );
            }
        }
    }

    /// Delete an account under its lock, so a deletion cannot land in the
    /// middle of an in-flight fund/spend on the same band.
    pub async fn delete_account(&self, band_id: &str) -> Result<(), LedgerError> {
        let key = normalize_band_id(band_id);
        let lock = self.lock_for(&key).await;
        let _guard = lock.lock().await;

        AccountRepository::new(&self.storage)
            .delete(band_id)
            .map_err(map_user_lookup)?;
        tracing::info!(band_id, "account deleted");
        Ok(())
    }

    async fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.account_locks.lock().await;
        // Keys are caller-chosen; entries with no in-flight holder are
        // pruned so failed lookups cannot grow the map without bound.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(key.to_string()).or_default().clone()
    }
}

/// Normalize a JSON amount (string or number) to a positive 2-decimal
/// value.
pub fn parse_amount(raw: &serde_json::Value) -> Result<Decimal, LedgerError> {
    let text = match raw {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return Err(LedgerError::InvalidAmount),
    };

    let amount: Decimal = text.parse().map_err(|_| LedgerError::InvalidAmount)?;
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount);
    }
    Ok(amount.round_dp(2))
}

fn map_user_lookup(err: StorageError) -> LedgerError {
    match err {
        StorageError::NotFound(_) => LedgerError::NotFound,
        other => LedgerError::Storage(other),
    }
}
