// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 BandPay

//! Scan ingestion and the live SSE feed.

use std::convert::Infallible;

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::Stream;
use tokio::sync::broadcast::error::RecvError;

use crate::{
    error::ApiError,
    models::{BandRequest, MessageResponse},
    state::AppState,
};

/// Ingest a band scan from a terminal device.
#[utoipa::path(
    post,
    path = "/api/scan",
    tag = "Scan",
    request_body = BandRequest,
    responses(
        (status = 201, description = "Scan recorded", body = MessageResponse),
        (status = 400, description = "Missing band id"),
    )
)]
pub async fn receive_scan(
    State(state): State<AppState>,
    Json(request): Json<BandRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    state.relay.record(&request.band_id)?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Scan received".to_string(),
        }),
    ))
}

/// Live feed of band scans as server-sent events. Each new scan arrives
/// as `{"bandId": ...}`; history is never replayed.
#[utoipa::path(
    get,
    path = "/api/scan",
    tag = "Scan",
    responses(
        (status = 200, description = "SSE stream of scans", content_type = "text/event-stream"),
    )
)]
pub async fn stream_scans(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut receiver = state.relay.subscribe();

    let stream = async_stream::stream! {
        loop {
            match receiver.recv().await {
                Ok(scan) => {
                    let payload = serde_json::json!({ "bandId": scan.band_id });
                    yield Ok(Event::default().data(payload.to_string()));
                }
                // A slow consumer skips ahead instead of ending the feed.
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "scan stream lagged behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
