// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 BandPay

//! Dashboard statistics.

use axum::{extract::State, Json};
use chrono::Utc;
use rust_decimal::Decimal;

use crate::{
    error::ApiError,
    models::StatsResponse,
    state::AppState,
    storage::{AccountRepository, LedgerRepository, StorageError},
};

/// Aggregate totals over accounts and today's ledger entries.
#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "Stats",
    responses(
        (status = 200, description = "Dashboard totals", body = StatsResponse),
    )
)]
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let accounts = AccountRepository::new(&state.storage)
        .list_all()
        .map_err(internal)?;

    let total_users = accounts.len() as u64;
    let total_balance: Decimal = accounts.iter().map(|a| a.balance).sum();
    let blocked_bands = accounts.iter().filter(|a| a.is_blocked).count() as u64;
    let active_bands = total_users - blocked_bands;

    let (today_transactions, today_volume) = LedgerRepository::new(&state.storage)
        .daily_totals(Utc::now().date_naive())
        .map_err(internal)?;

    Ok(Json(StatsResponse {
        total_users,
        total_balance,
        active_bands,
        blocked_bands,
        today_transactions,
        today_volume,
    }))
}

fn internal(err: StorageError) -> ApiError {
    tracing::error!(error = %err, "storage failure computing stats");
    ApiError::internal("Storage failure")
}
