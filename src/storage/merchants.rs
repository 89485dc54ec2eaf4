// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 BandPay

//! Merchant repository.

use redb::{ReadableDatabase, ReadableTable, TableDefinition};

use crate::models::Merchant;

use super::{Storage, StorageError, StorageResult};

/// merchant id (UUID string) → serialized Merchant (JSON bytes).
pub(super) const MERCHANTS: TableDefinition<&str, &[u8]> = TableDefinition::new("merchants");

pub struct MerchantRepository<'a> {
    storage: &'a Storage,
}

impl<'a> MerchantRepository<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Insert a new merchant. Fails if the phone is taken.
    pub fn create(&self, merchant: &Merchant) -> StorageResult<()> {
        let key = merchant.id.to_string();
        let bytes = serde_json::to_vec(merchant)?;

        let txn = self.storage.db().begin_write()?;
        {
            let mut table = txn.open_table(MERCHANTS)?;
            for row in table.iter()? {
                let (_, value) = row?;
                let existing: Merchant = serde_json::from_slice(value.value())?;
                if existing.phone == merchant.phone {
                    return Err(StorageError::AlreadyExists(format!(
                        "phone {}",
                        merchant.phone
                    )));
                }
            }
            table.insert(key.as_str(), bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get(&self, merchant_id: &str) -> StorageResult<Merchant> {
        let txn = self.storage.db().begin_read()?;
        let table = txn.open_table(MERCHANTS)?;
        match table.get(merchant_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StorageError::NotFound(format!("merchant {merchant_id}"))),
        }
    }

    /// Terminal login lookup.
    pub fn find_by_phone(&self, phone: &str) -> StorageResult<Option<Merchant>> {
        let txn = self.storage.db().begin_read()?;
        let table = txn.open_table(MERCHANTS)?;
        for row in table.iter()? {
            let (_, value) = row?;
            let merchant: Merchant = serde_json::from_slice(value.value())?;
            if merchant.phone == phone {
                return Ok(Some(merchant));
            }
        }
        Ok(None)
    }
}
