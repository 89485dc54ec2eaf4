// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 BandPay

//! Scan relay: hardware scanners POST band scans, kiosk clients follow
//! them over SSE. Events are persisted for the monotonic id, then fanned
//! out over a broadcast channel so subscribers see each scan exactly once
//! without polling.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::error::ApiError;
use crate::models::ScanEvent;
use crate::storage::{ScanRepository, Storage, StorageError};

/// Slow subscribers miss events past this backlog instead of blocking
/// scanners.
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Band ID is required")]
    InvalidInput,

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::InvalidInput => ApiError::bad_request("Band ID is required"),
            RelayError::Storage(source) => {
                tracing::error!(error = %source, "storage failure recording scan");
                ApiError::internal("Storage failure")
            }
        }
    }
}

pub struct ScanRelay {
    storage: Arc<Storage>,
    sender: broadcast::Sender<ScanEvent>,
    /// Held across append + broadcast so events reach subscribers in id
    /// order.
    ingest: std::sync::Mutex<()>,
}

impl ScanRelay {
    pub fn new(storage: Arc<Storage>) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            storage,
            sender,
            ingest: std::sync::Mutex::new(()),
        }
    }

    /// Persist a scan and push it to every live subscriber.
    pub fn record(&self, band_id: &str) -> Result<ScanEvent, RelayError> {
        let band_id = band_id.trim();
        if band_id.is_empty() {
            return Err(RelayError::InvalidInput);
        }

        let _guard = self
            .ingest
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let event = ScanRepository::new(&self.storage).append(band_id)?;
        tracing::debug!(band_id, id = event.id, "scan recorded");

        // Send only errors when nobody is subscribed.
        let _ = self.sender.send(event.clone());
        Ok(event)
    }

    /// Live feed of scans recorded after this call. No replay of history.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::temp_storage;

    fn relay() -> (ScanRelay, tempfile::TempDir) {
        let (storage, dir) = temp_storage();
        (ScanRelay::new(Arc::new(storage)), dir)
    }

    #[tokio::test]
    async fn subscriber_sees_each_scan_once() {
        let (relay, _dir) = relay();
        let mut rx = relay.subscribe();

        relay.record("NKM-AAAAAAA").unwrap();
        relay.record("NKM-BBBBBBB").unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.band_id, "NKM-AAAAAAA");
        assert_eq!(second.band_id, "NKM-BBBBBBB");
        assert!(second.id > first.id);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn no_replay_for_late_subscribers() {
        let (relay, _dir) = relay();

        relay.record("NKM-AAAAAAA").unwrap();
        let mut rx = relay.subscribe();
        relay.record("NKM-BBBBBBB").unwrap();

        let only = rx.recv().await.unwrap();
        assert_eq!(only.band_id, "NKM-BBBBBBB");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn empty_band_id_is_rejected() {
        let (relay, _dir) = relay();
        assert!(matches!(relay.record("  "), Err(RelayError::InvalidInput)));
        assert!(matches!(relay.record(""), Err(RelayError::InvalidInput)));
    }

    #[tokio::test]
    async fn concurrent_scans_arrive_in_id_order() {
        let (relay, _dir) = relay();
        let relay = Arc::new(relay);
        let mut rx = relay.subscribe();

        let mut tasks = Vec::new();
        for i in 0..16 {
            let relay = relay.clone();
            tasks.push(tokio::task::spawn_blocking(move || {
                relay.record(&format!("NKM-{i:07}")).unwrap()
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let mut last_id = 0;
        for _ in 0..16 {
            let event = rx.recv().await.unwrap();
            assert!(event.id > last_id, "id {} after {}", event.id, last_id);
            last_id = event.id;
        }
    }

    #[tokio::test]
    async fn recording_without_subscribers_still_persists() {
        let (relay, _dir) = relay();
        let event = relay.record("NKM-AAAAAAA").unwrap();
        assert_eq!(event.id, 1);
    }
}
