// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 BandPay

//! Seller registration and terminal login.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{pin_is_valid, Merchant, MerchantLoginRequest, MerchantResponse, RegisterMerchantRequest},
    state::AppState,
    storage::{MerchantRepository, StorageError},
};

/// Register a seller. A custodial wallet is generated so payments can
/// settle to the seller's own address.
#[utoipa::path(
    post,
    path = "/api/sellers/register",
    tag = "Sellers",
    request_body = RegisterMerchantRequest,
    responses(
        (status = 201, description = "Seller registered", body = MerchantResponse),
        (status = 400, description = "Validation failure"),
    )
)]
pub async fn register_seller(
    State(state): State<AppState>,
    Json(request): Json<RegisterMerchantRequest>,
) -> Result<(StatusCode, Json<MerchantResponse>), ApiError> {
    if request.name.trim().is_empty() || request.business_name.trim().is_empty() {
        return Err(ApiError::bad_request("Name and business name are required"));
    }
    if request.phone.trim().is_empty() {
        return Err(ApiError::bad_request("Phone is required"));
    }
    if !pin_is_valid(&request.pin) {
        return Err(ApiError::bad_request("PIN must be exactly 4 digits."));
    }

    let (wallet_address, private_key) = crate::wallet::generate_keypair();
    let merchant = Merchant {
        id: Uuid::new_v4(),
        name: request.name.trim().to_string(),
        business_name: request.business_name.trim().to_string(),
        phone: request.phone.trim().to_string(),
        pin: request.pin,
        wallet_address: Some(wallet_address),
        private_key: Some(private_key),
        created_at: Utc::now(),
    };

    match MerchantRepository::new(&state.storage).create(&merchant) {
        Ok(()) => {
            tracing::info!(merchant_id = %merchant.id, "seller registered");
            Ok((StatusCode::CREATED, Json(merchant.into())))
        }
        Err(StorageError::AlreadyExists(_)) => {
            Err(ApiError::bad_request("Phone number already registered"))
        }
        Err(other) => {
            tracing::error!(error = %other, "storage failure registering seller");
            Err(ApiError::internal("Storage failure"))
        }
    }
}

/// Terminal login by phone and PIN.
#[utoipa::path(
    post,
    path = "/api/sellers/login",
    tag = "Sellers",
    request_body = MerchantLoginRequest,
    responses(
        (status = 200, description = "Seller", body = MerchantResponse),
        (status = 401, description = "Wrong PIN"),
        (status = 404, description = "Unknown phone"),
    )
)]
pub async fn seller_login(
    State(state): State<AppState>,
    Json(request): Json<MerchantLoginRequest>,
) -> Result<Json<MerchantResponse>, ApiError> {
    let merchant = MerchantRepository::new(&state.storage)
        .find_by_phone(request.phone.trim())
        .map_err(|err| {
            tracing::error!(error = %err, "storage failure during seller login");
            ApiError::internal("Storage failure")
        })?
        .ok_or_else(|| ApiError::not_found("Seller not found"))?;

    if merchant.pin != request.pin {
        return Err(ApiError::unauthorized("Invalid PIN"));
    }
    Ok(Json(merchant.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_state;
    use axum::extract::State;

    async fn register(state: &AppState) -> MerchantResponse {
        let (status, Json(merchant)) = register_seller(
            State(state.clone()),
            Json(RegisterMerchantRequest {
                name: "Ravi".into(),
                business_name: "Chai Point".into(),
                phone: "555".into(),
                pin: "4321".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        merchant
    }

    #[tokio::test]
    async fn register_provisions_wallet() {
        let (state, _dir) = test_state();
        let merchant = register(&state).await;
        assert!(merchant.wallet_address.is_some());
    }

    #[tokio::test]
    async fn login_distinguishes_unknown_phone_from_bad_pin() {
        let (state, _dir) = test_state();
        let registered = register(&state).await;

        let unknown = seller_login(
            State(state.clone()),
            Json(MerchantLoginRequest {
                phone: "000".into(),
                pin: "4321".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(unknown.status, StatusCode::NOT_FOUND);
        assert_eq!(unknown.message, "Seller not found");

        let bad_pin = seller_login(
            State(state.clone()),
            Json(MerchantLoginRequest {
                phone: "555".into(),
                pin: "0000".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(bad_pin.status, StatusCode::UNAUTHORIZED);
        assert_eq!(bad_pin.message, "Invalid PIN");

        let Json(logged_in) = seller_login(
            State(state),
            Json(MerchantLoginRequest {
                phone: "555".into(),
                pin: "4321".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(logged_in.id, registered.id);
    }
}
