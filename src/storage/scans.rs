// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 BandPay

//! Scan event repository. Append-only sequence ordered by a monotonically
//! increasing id.

use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable, TableDefinition};

use crate::models::ScanEvent;

use super::{Storage, StorageResult};

/// monotonic append id → serialized ScanEvent (JSON bytes).
pub(super) const SCAN_EVENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("scan_events");

pub struct ScanRepository<'a> {
    storage: &'a Storage,
}

impl<'a> ScanRepository<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Append a scan with a server-assigned timestamp and the next id.
    pub fn append(&self, band_id: &str) -> StorageResult<ScanEvent> {
        let txn = self.storage.db().begin_write()?;
        let event;
        {
            let mut table = txn.open_table(SCAN_EVENTS)?;
            let next_id = match table.last()? {
                Some((key, _)) => key.value() + 1,
                None => 1,
            };

            event = ScanEvent {
                id: next_id,
                band_id: band_id.to_string(),
                timestamp: Utc::now(),
            };

            let bytes = serde_json::to_vec(&event)?;
            table.insert(next_id, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(event)
    }

    /// Id of the newest event, 0 when empty.
    pub fn latest_id(&self) -> StorageResult<u64> {
        let txn = self.storage.db().begin_read()?;
        let table = txn.open_table(SCAN_EVENTS)?;
        let latest = table.last()?.map(|(key, _)| key.value()).unwrap_or(0);
        Ok(latest)
    }
}
