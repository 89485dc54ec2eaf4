// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 BandPay

//! Band holder endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::ApiError,
    models::{
        pin_is_valid, Account, AccountResponse, BandRequest, CreateAccountRequest,
        MessageResponse,
    },
    state::AppState,
    storage::{AccountRepository, StorageError},
};

/// List all band holders, newest first.
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "All accounts", body = Vec<AccountResponse>),
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<AccountResponse>>, ApiError> {
    let accounts = AccountRepository::new(&state.storage)
        .list_all()
        .map_err(internal)?;
    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

/// Register a band holder. A band id and custodial wallet are generated
/// server-side; the new account starts with a zero balance.
#[utoipa::path(
    post,
    path = "/api/users/create",
    tag = "Users",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 400, description = "Validation failure"),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    if request.phone.trim().is_empty() {
        return Err(ApiError::bad_request("Phone is required"));
    }
    if !pin_is_valid(&request.pin) {
        return Err(ApiError::bad_request("PIN must be exactly 4 digits."));
    }

    let mut account = Account::new(
        request.name.trim().to_string(),
        request.phone.trim().to_string(),
        request.pin,
    );
    let (wallet_address, private_key) = crate::wallet::generate_keypair();
    account.wallet_address = Some(wallet_address);
    account.private_key = Some(private_key);

    match AccountRepository::new(&state.storage).create(&account) {
        Ok(()) => {
            tracing::info!(band_id = %account.band_id, "account created");
            Ok((StatusCode::CREATED, Json(account.into())))
        }
        Err(StorageError::AlreadyExists(_)) => {
            Err(ApiError::bad_request("Phone number already registered"))
        }
        Err(other) => Err(internal(other)),
    }
}

/// Delete a band holder by band id.
#[utoipa::path(
    post,
    path = "/api/users/delete",
    tag = "Users",
    request_body = BandRequest,
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 404, description = "Unknown band"),
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Json(request): Json<BandRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    // Deletion shares the per-account lock with fund/spend, so it cannot
    // land between a confirmed chain call and its balance commit.
    state.ledger.delete_account(&request.band_id).await?;
    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}

/// Fetch one band holder. The band id matches case-insensitively.
#[utoipa::path(
    get,
    path = "/api/users/{band_id}",
    tag = "Users",
    params(("band_id" = String, Path, description = "Band identifier")),
    responses(
        (status = 200, description = "Account", body = AccountResponse),
        (status = 404, description = "Unknown band"),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(band_id): Path<String>,
) -> Result<Json<AccountResponse>, ApiError> {
    match AccountRepository::new(&state.storage).get(&band_id) {
        Ok(account) => Ok(Json(account.into())),
        Err(StorageError::NotFound(_)) => Err(ApiError::not_found("User not found")),
        Err(other) => Err(internal(other)),
    }
}

fn internal(err: StorageError) -> ApiError {
    tracing::error!(error = %err, "storage failure");
    ApiError::internal("Storage failure")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_state;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn create_then_fetch_round_trip() {
        let (state, _dir) = test_state();

        let (status, Json(created)) = create_user(
            State(state.clone()),
            Json(CreateAccountRequest {
                name: "Asha".into(),
                phone: "9990001111".into(),
                pin: "1234".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert!(created.wallet_address.is_some());
        assert!(created.band_id.starts_with("NKM-"));

        // Case-insensitive fetch.
        let Json(fetched) = get_user(
            State(state),
            Path(created.band_id.to_lowercase()),
        )
        .await
        .unwrap();
        assert_eq!(fetched.id, created.id);
    }

    #[tokio::test]
    async fn create_rejects_bad_pin_and_duplicate_phone() {
        let (state, _dir) = test_state();

        let err = create_user(
            State(state.clone()),
            Json(CreateAccountRequest {
                name: "Asha".into(),
                phone: "111".into(),
                pin: "12".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        create_user(
            State(state.clone()),
            Json(CreateAccountRequest {
                name: "Asha".into(),
                phone: "111".into(),
                pin: "1234".into(),
            }),
        )
        .await
        .unwrap();

        let duplicate = create_user(
            State(state),
            Json(CreateAccountRequest {
                name: "Ravi".into(),
                phone: "111".into(),
                pin: "4321".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_then_fetch_is_not_found() {
        let (state, _dir) = test_state();

        let (_, Json(created)) = create_user(
            State(state.clone()),
            Json(CreateAccountRequest {
                name: "Asha".into(),
                phone: "111".into(),
                pin: "1234".into(),
            }),
        )
        .await
        .unwrap();

        let Json(deleted) = delete_user(
            State(state.clone()),
            Json(BandRequest {
                band_id: created.band_id.clone(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(deleted.message, "User deleted successfully");

        let err = get_user(State(state), Path(created.band_id))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "User not found");
    }
}
