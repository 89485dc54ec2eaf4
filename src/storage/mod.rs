// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 BandPay

//! # Embedded Storage
//!
//! Persistent records live in a single redb database (pure Rust, ACID).
//! One repository type per record family; values are JSON bytes keyed by
//! string or u64 tables.
//!
//! ## Table Layout
//!
//! - `accounts`: lowercased band_id → serialized Account
//! - `merchants`: merchant id (UUID) → serialized Merchant
//! - `ledger_entries`: monotonic u64 → serialized LedgerEntry
//! - `scan_events`: monotonic u64 → serialized ScanEvent

pub mod accounts;
pub mod entries;
pub mod merchants;
pub mod scans;

use std::path::Path;

use redb::Database;

pub use accounts::{normalize_band_id, AccountRepository};
pub use entries::LedgerRepository;
pub use merchants::MerchantRepository;
pub use scans::ScanRepository;

/// Database file name under `DATA_DIR`.
const DB_FILE: &str = "bandpay.redb";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Shared handle to the embedded database.
pub struct Storage {
    db: Database,
}

impl Storage {
    /// Open (or create) the database under `data_dir` and make sure every
    /// table exists, so read transactions never see a missing table.
    pub fn open(data_dir: &Path) -> StorageResult<Self> {
        std::fs::create_dir_all(data_dir)?;
        let db = Database::create(data_dir.join(DB_FILE))?;

        let txn = db.begin_write()?;
        {
            txn.open_table(accounts::ACCOUNTS)?;
            txn.open_table(merchants::MERCHANTS)?;
            txn.open_table(entries::LEDGER_ENTRIES)?;
            txn.open_table(scans::SCAN_EVENTS)?;
        }
        txn.commit()?;

        Ok(Self { db })
    }

    pub(crate) fn db(&self) -> &Database {
        &self.db
    }
}
