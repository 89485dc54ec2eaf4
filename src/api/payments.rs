// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 BandPay

//! Funding, payment and band blocking endpoints. The heavy lifting lives
//! in the ledger orchestrator; these handlers only shape requests and
//! responses.

use axum::{extract::State, Json};

use crate::{
    error::ApiError,
    models::{BandRequest, BlockResponse, FundRequest, PaymentRequest, SettlementResponse},
    state::AppState,
    storage::{AccountRepository, StorageError},
};

/// Credit a band. Mints tokens to the holder's custodial wallet and
/// raises the off-chain balance on confirmation.
#[utoipa::path(
    post,
    path = "/api/fund",
    tag = "Payments",
    request_body = FundRequest,
    responses(
        (status = 200, description = "Fund settled", body = SettlementResponse),
        (status = 400, description = "Invalid amount"),
        (status = 404, description = "Unknown band"),
        (status = 500, description = "Chain transaction failed"),
    )
)]
pub async fn fund_band(
    State(state): State<AppState>,
    Json(request): Json<FundRequest>,
) -> Result<Json<SettlementResponse>, ApiError> {
    let settled = state.ledger.fund(&request.band_id, &request.amount).await?;
    Ok(Json(SettlementResponse {
        message: "Fund added successfully".to_string(),
        current_balance: settled.current_balance,
        tx_hash: settled.tx_hash,
    }))
}

/// Toggle a band's blocked flag.
#[utoipa::path(
    post,
    path = "/api/block",
    tag = "Payments",
    request_body = BandRequest,
    responses(
        (status = 200, description = "Toggled", body = BlockResponse),
        (status = 404, description = "Unknown band"),
    )
)]
pub async fn block_band(
    State(state): State<AppState>,
    Json(request): Json<BandRequest>,
) -> Result<Json<BlockResponse>, ApiError> {
    let accounts = AccountRepository::new(&state.storage);
    let mut account = match accounts.get(&request.band_id) {
        Ok(account) => account,
        Err(StorageError::NotFound(_)) => return Err(ApiError::not_found("User not found")),
        Err(other) => {
            tracing::error!(error = %other, "storage failure toggling block");
            return Err(ApiError::internal("Storage failure"));
        }
    };

    account.is_blocked = !account.is_blocked;
    accounts.update(&account).map_err(|err| {
        tracing::error!(error = %err, "storage failure toggling block");
        ApiError::internal("Storage failure")
    })?;

    let verb = if account.is_blocked { "blocked" } else { "unblocked" };
    tracing::info!(band_id = %account.band_id, blocked = account.is_blocked, "block toggled");
    Ok(Json(BlockResponse {
        message: format!("Band {verb} successfully"),
        is_blocked: account.is_blocked,
    }))
}

/// Debit a band at a seller terminal. Transfers tokens from the holder's
/// custodial wallet to the seller (or the store wallet) and lowers the
/// off-chain balance on confirmation.
#[utoipa::path(
    post,
    path = "/api/payment",
    tag = "Payments",
    request_body = PaymentRequest,
    responses(
        (status = 200, description = "Payment settled", body = SettlementResponse),
        (status = 400, description = "Invalid amount or insufficient balance"),
        (status = 401, description = "Wrong PIN"),
        (status = 403, description = "Band blocked"),
        (status = 404, description = "Unknown band"),
        (status = 500, description = "Chain transaction failed"),
    )
)]
pub async fn process_payment(
    State(state): State<AppState>,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<SettlementResponse>, ApiError> {
    let settled = state
        .ledger
        .spend(
            &request.band_id,
            &request.amount,
            &request.pin,
            request.description.as_deref(),
            request.seller_id.as_deref(),
        )
        .await?;
    Ok(Json(SettlementResponse {
        message: "Payment processed".to_string(),
        current_balance: settled.current_balance,
        tx_hash: settled.tx_hash,
    }))
}
