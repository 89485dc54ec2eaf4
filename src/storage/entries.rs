// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 BandPay

//! Ledger entry repository. Append-only: entries are never updated or
//! deleted.

use chrono::{NaiveDate, Utc};
use rand::Rng;
use redb::{ReadableDatabase, ReadableTable, TableDefinition};
use rust_decimal::Decimal;

use crate::models::{EntryKind, LedgerEntry};

use super::{Storage, StorageResult};

/// monotonic append id → serialized LedgerEntry (JSON bytes).
pub(super) const LEDGER_ENTRIES: TableDefinition<u64, &[u8]> =
    TableDefinition::new("ledger_entries");

pub struct LedgerRepository<'a> {
    storage: &'a Storage,
}

impl<'a> LedgerRepository<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Append a new entry. The id is assigned inside the write transaction;
    /// a missing tx hash gets a simulated one, matching the bypassed-chain
    /// path.
    pub fn append(
        &self,
        band_id: &str,
        amount: Decimal,
        kind: EntryKind,
        description: &str,
        tx_hash: Option<String>,
    ) -> StorageResult<LedgerEntry> {
        let txn = self.storage.db().begin_write()?;
        let entry;
        {
            let mut table = txn.open_table(LEDGER_ENTRIES)?;
            let next_id = match table.last()? {
                Some((key, _)) => key.value() + 1,
                None => 1,
            };

            entry = LedgerEntry {
                id: next_id,
                band_id: band_id.to_string(),
                amount,
                kind,
                description: description.to_string(),
                tx_hash: Some(tx_hash.unwrap_or_else(simulated_tx_hash)),
                timestamp: Utc::now(),
            };

            let bytes = serde_json::to_vec(&entry)?;
            table.insert(next_id, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(entry)
    }

    /// Entries for one band, oldest first.
    pub fn list_for_band(&self, band_id: &str) -> StorageResult<Vec<LedgerEntry>> {
        let key = super::normalize_band_id(band_id);
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|entry| super::normalize_band_id(&entry.band_id) == key)
            .collect())
    }

    pub fn list_all(&self) -> StorageResult<Vec<LedgerEntry>> {
        let txn = self.storage.db().begin_read()?;
        let table = txn.open_table(LEDGER_ENTRIES)?;

        let mut entries = Vec::new();
        for row in table.iter()? {
            let (_, value) = row?;
            entries.push(serde_json::from_slice::<LedgerEntry>(value.value())?);
        }
        Ok(entries)
    }

    /// Count and total volume of entries appended on the given date.
    pub fn daily_totals(&self, date: NaiveDate) -> StorageResult<(u64, Decimal)> {
        let mut count = 0u64;
        let mut volume = Decimal::ZERO;
        for entry in self.list_all()? {
            if entry.timestamp.date_naive() == date {
                count += 1;
                volume += entry.amount;
            }
        }
        Ok((count, volume))
    }
}

/// `0x` + 64 hex characters, used when a chain call was bypassed.
fn simulated_tx_hash() -> String {
    let mut rng = rand::thread_rng();
    let mut hash = String::with_capacity(66);
    hash.push_str("0x");
    for _ in 0..64 {
        let nibble: u8 = rng.gen_range(0..16);
        hash.push(char::from_digit(u32::from(nibble), 16).unwrap_or('0'));
    }
    hash
}
