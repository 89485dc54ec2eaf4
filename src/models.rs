// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 BandPay

//! # Data Models
//!
//! Stored records and the request/response shapes of the REST API.
//! Stored types serialize everything (including custodial secrets) for the
//! embedded database; the `*Response` counterparts are what leaves the
//! service — `pin` and `private_key` never appear in them.

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// =============================================================================
// Stored Records
// =============================================================================

/// A band holder. Stored record — includes custodial secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    /// Opaque band identifier, e.g. `NKM-4F7Q2ZK`. Unique, matched
    /// case-insensitively.
    pub band_id: String,
    /// Off-chain balance, 2 decimal places. Mutated only by the ledger
    /// orchestrator after a confirmed chain transaction.
    pub balance: Decimal,
    pub is_blocked: bool,
    /// 4-digit code, compared as an opaque string.
    pub pin: String,
    /// Custodial wallet address; `None` until first provisioning.
    pub wallet_address: Option<String>,
    /// Custodial private key, hex without `0x`. Never serialized out.
    pub private_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(name: String, phone: String, pin: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            phone,
            band_id: generate_band_id(),
            balance: Decimal::ZERO,
            is_blocked: false,
            pin,
            wallet_address: None,
            private_key: None,
            created_at: Utc::now(),
        }
    }
}

/// A seller. Settlement target only — no balance field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Merchant {
    pub id: Uuid,
    pub name: String,
    pub business_name: String,
    pub phone: String,
    pub pin: String,
    pub wallet_address: Option<String>,
    pub private_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryKind {
    Credit,
    Debit,
}

/// A transaction record. Append-only; created exclusively by the ledger
/// orchestrator as the last step of a successful fund/pay operation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LedgerEntry {
    /// Monotonic append id, assigned by storage.
    pub id: u64,
    pub band_id: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub kind: EntryKind,
    pub description: String,
    /// Chain transaction hash; a simulated hash is filled in on append
    /// when the chain call was bypassed.
    pub tx_hash: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A band scan reported by a terminal device.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScanEvent {
    /// Monotonic append id; consumers track the last id seen.
    pub id: u64,
    pub band_id: String,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Wire Shapes
// =============================================================================

/// Account as serialized to API clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub band_id: String,
    #[schema(value_type = String)]
    pub balance: Decimal,
    pub is_blocked: bool,
    pub wallet_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            phone: account.phone,
            band_id: account.band_id,
            balance: account.balance,
            is_blocked: account.is_blocked,
            wallet_address: account.wallet_address,
            created_at: account.created_at,
        }
    }
}

/// Merchant as serialized to API clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MerchantResponse {
    pub id: Uuid,
    pub name: String,
    pub business_name: String,
    pub phone: String,
    pub wallet_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Merchant> for MerchantResponse {
    fn from(merchant: Merchant) -> Self {
        Self {
            id: merchant.id,
            name: merchant.name,
            business_name: merchant.business_name,
            phone: merchant.phone,
            wallet_address: merchant.wallet_address,
            created_at: merchant.created_at,
        }
    }
}

/// Request to create an account. The band id and wallet are
/// server-generated.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateAccountRequest {
    pub name: String,
    pub phone: String,
    pub pin: String,
}

/// Request carrying only a band identifier (delete, block).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BandRequest {
    #[serde(rename = "bandId")]
    pub band_id: String,
}

/// Request to fund a band. `amount` accepts a JSON string or number.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FundRequest {
    #[serde(rename = "bandId")]
    pub band_id: String,
    #[schema(value_type = String)]
    pub amount: serde_json::Value,
}

/// Request to spend from a band at a seller terminal.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentRequest {
    #[serde(rename = "bandId")]
    pub band_id: String,
    #[schema(value_type = String)]
    pub amount: serde_json::Value,
    pub pin: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "sellerId", default)]
    pub seller_id: Option<String>,
}

/// Request to register a seller.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterMerchantRequest {
    pub name: String,
    pub business_name: String,
    pub phone: String,
    pub pin: String,
}

/// Seller terminal login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MerchantLoginRequest {
    pub phone: String,
    pub pin: String,
}

/// Outcome of a fund or payment operation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SettlementResponse {
    pub message: String,
    #[schema(value_type = String)]
    pub current_balance: Decimal,
    pub tx_hash: String,
}

/// Outcome of a block toggle.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlockResponse {
    pub message: String,
    #[serde(rename = "isBlocked")]
    pub is_blocked: bool,
}

/// Generic acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Dashboard statistics.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_users: u64,
    #[schema(value_type = String)]
    pub total_balance: Decimal,
    pub active_bands: u64,
    pub blocked_bands: u64,
    pub today_transactions: u64,
    #[schema(value_type = String)]
    pub today_volume: Decimal,
}

// =============================================================================
// Helpers
// =============================================================================

const BAND_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a fresh band identifier: `NKM-` + 7 uppercase alphanumerics.
pub fn generate_band_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..7)
        .map(|_| BAND_ID_ALPHABET[rng.gen_range(0..BAND_ID_ALPHABET.len())] as char)
        .collect();
    format!("NKM-{suffix}")
}

/// PIN rule shared by account creation and seller registration.
pub fn pin_is_valid(pin: &str) -> bool {
    pin.len() == 4 && pin.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_ids_have_expected_shape() {
        let id = generate_band_id();
        assert_eq!(id.len(), 11);
        assert!(id.starts_with("NKM-"));
        assert!(id[4..]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn pin_validation_requires_four_digits() {
        assert!(pin_is_valid("0000"));
        assert!(pin_is_valid("5678"));
        assert!(!pin_is_valid("123"));
        assert!(!pin_is_valid("12345"));
        assert!(!pin_is_valid("12a4"));
        assert!(!pin_is_valid(""));
    }

    #[test]
    fn account_response_hides_secrets() {
        let account = Account::new("Asha".into(), "9990001111".into(), "1234".into());
        let response: AccountResponse = account.into();
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("pin").is_none());
        assert!(json.get("private_key").is_none());
        assert_eq!(json["balance"], serde_json::json!("0"));
    }

    #[test]
    fn new_account_starts_unprovisioned() {
        let account = Account::new("Asha".into(), "9990001111".into(), "1234".into());
        assert_eq!(account.balance, Decimal::ZERO);
        assert!(!account.is_blocked);
        assert!(account.wallet_address.is_none());
        assert!(account.private_key.is_none());
    }

    #[test]
    fn entry_kind_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&EntryKind::Credit).unwrap(),
            r#""CREDIT""#
        );
        assert_eq!(
            serde_json::to_string(&EntryKind::Debit).unwrap(),
            r#""DEBIT""#
        );
    }

    #[test]
    fn payment_request_accepts_optional_fields() {
        let json = r#"{"bandId":"NKM-AAAAAAA","amount":"200","pin":"5678"}"#;
        let request: PaymentRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.band_id, "NKM-AAAAAAA");
        assert!(request.description.is_none());
        assert!(request.seller_id.is_none());
    }
}
