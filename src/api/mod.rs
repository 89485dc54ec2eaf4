// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 BandPay

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        AccountResponse, BandRequest, BlockResponse, CreateAccountRequest, EntryKind, FundRequest,
        LedgerEntry, MerchantLoginRequest, MerchantResponse, MessageResponse, PaymentRequest,
        RegisterMerchantRequest, ScanEvent, SettlementResponse, StatsResponse,
    },
    state::AppState,
};

pub mod payments;
pub mod scan;
pub mod sellers;
pub mod stats;
pub mod users;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/stats", get(stats::get_stats))
        .route("/users", get(users::list_users))
        .route("/users/create", post(users::create_user))
        .route("/users/delete", post(users::delete_user))
        .route("/users/{band_id}", get(users::get_user))
        .route("/fund", post(payments::fund_band))
        .route("/block", post(payments::block_band))
        .route("/payment", post(payments::process_payment))
        .route("/sellers/register", post(sellers::register_seller))
        .route("/sellers/login", post(sellers::seller_login))
        .route(
            "/scan",
            post(scan::receive_scan).get(scan::stream_scans),
        )
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        stats::get_stats,
        users::list_users,
        users::create_user,
        users::delete_user,
        users::get_user,
        payments::fund_band,
        payments::block_band,
        payments::process_payment,
        sellers::register_seller,
        sellers::seller_login,
        scan::receive_scan,
        scan::stream_scans
    ),
    components(
        schemas(
            AccountResponse,
            MerchantResponse,
            EntryKind,
            LedgerEntry,
            ScanEvent,
            CreateAccountRequest,
            BandRequest,
            FundRequest,
            PaymentRequest,
            RegisterMerchantRequest,
            MerchantLoginRequest,
            SettlementResponse,
            BlockResponse,
            MessageResponse,
            StatsResponse
        )
    ),
    tags(
        (name = "Stats", description = "Dashboard statistics"),
        (name = "Users", description = "Band holder management"),
        (name = "Payments", description = "Funding, payments and band blocking"),
        (name = "Sellers", description = "Seller registration and terminal login"),
        (name = "Scan", description = "Band scan ingestion and live stream")
    )
)]
struct ApiDoc;
