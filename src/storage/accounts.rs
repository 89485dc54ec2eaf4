// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 BandPay

//! Account repository.
//!
//! Accounts are keyed by the lowercased band id so lookups are
//! case-insensitive; the stored record keeps the original casing.

use redb::{ReadableDatabase, ReadableTable, TableDefinition};

use crate::models::Account;

use super::{Storage, StorageError, StorageResult};

/// lowercased band_id → serialized Account (JSON bytes).
pub(super) const ACCOUNTS: TableDefinition<&str, &[u8]> = TableDefinition::new("accounts");

/// Canonical lookup/lock key for a band identifier.
pub fn normalize_band_id(band_id: &str) -> String {
    band_id.trim().to_lowercase()
}

pub struct AccountRepository<'a> {
    storage: &'a Storage,
}

impl<'a> AccountRepository<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Insert a new account. Fails if the band id or phone is taken.
    pub fn create(&self, account: &Account) -> StorageResult<()> {
        let key = normalize_band_id(&account.band_id);
        let bytes = serde_json::to_vec(account)?;

        let txn = self.storage.db().begin_write()?;
        {
            let mut table = txn.open_table(ACCOUNTS)?;
            if table.get(key.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!(
                    "band {}",
                    account.band_id
                )));
            }
            for row in table.iter()? {
                let (_, value) = row?;
                let existing: Account = serde_json::from_slice(value.value())?;
                if existing.phone == account.phone {
                    return Err(StorageError::AlreadyExists(format!(
                        "phone {}",
                        account.phone
                    )));
                }
            }
            table.insert(key.as_str(), bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Fetch by band id, case-insensitively.
    pub fn get(&self, band_id: &str) -> StorageResult<Account> {
        let key = normalize_band_id(band_id);
        let txn = self.storage.db().begin_read()?;
        let table = txn.open_table(ACCOUNTS)?;
        match table.get(key.as_str())? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StorageError::NotFound(format!("band {band_id}"))),
        }
    }

    /// Overwrite an existing account record.
    pub fn update(&self, account: &Account) -> StorageResult<()> {
        let key = normalize_band_id(&account.band_id);
        let bytes = serde_json::to_vec(account)?;

        let txn = self.storage.db().begin_write()?;
        {
            let mut table = txn.open_table(ACCOUNTS)?;
            if table.get(key.as_str())?.is_none() {
                return Err(StorageError::NotFound(format!("band {}", account.band_id)));
            }
            table.insert(key.as_str(), bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn delete(&self, band_id: &str) -> StorageResult<()> {
        let key = normalize_band_id(band_id);
        let txn = self.storage.db().begin_write()?;
        {
            let mut table = txn.open_table(ACCOUNTS)?;
            if table.remove(key.as_str())?.is_none() {
                return Err(StorageError::NotFound(format!("band {band_id}")));
            }
        }
        txn.commit()?;
        Ok(())
    }

    /// All accounts, newest first.
    pub fn list_all(&self) -> StorageResult<Vec<Account>> {
        let txn = self.storage.db().begin_read()?;
        let table = txn.open_table(ACCOUNTS)?;

        let mut accounts = Vec::new();
        for row in table.iter()? {
            let (_, value) = row?;
            accounts.push(serde_json::from_slice::<Account>(value.value())?);
        }
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::temp_storage;

    fn account(band_id: &str, phone: &str) -> Account {
        let mut account = Account::new("Asha".into(), phone.into(), "1234".into());
        account.band_id = band_id.into();
        account
    }

    #[test]
    fn create_and_get_case_insensitive() {
        let (storage, _dir) = temp_storage();
        let repo = AccountRepository::new(&storage);

        repo.create(&account("NKM-AB12CD3", "111")).unwrap();

        let exact = repo.get("NKM-AB12CD3").unwrap();
        assert_eq!(exact.band_id, "NKM-AB12CD3");

        let lowered = repo.get("nkm-ab12cd3").unwrap();
        assert_eq!(lowered.band_id, "NKM-AB12CD3");
    }

    #[test]
    fn duplicate_band_or_phone_rejected() {
        let (storage, _dir) = temp_storage();
        let repo = AccountRepository::new(&storage);

        repo.create(&account("NKM-AAAAAAA", "111")).unwrap();

        let same_band = repo.create(&account("nkm-aaaaaaa", "222"));
        assert!(matches!(same_band, Err(StorageError::AlreadyExists(_))));

        let same_phone = repo.create(&account("NKM-BBBBBBB", "111"));
        assert!(matches!(same_phone, Err(StorageError::AlreadyExists(_))));
    }

    #[test]
    fn get_missing_is_not_found() {
        let (storage, _dir) = temp_storage();
        let repo = AccountRepository::new(&storage);
        assert!(matches!(
            repo.get("NKM-ZZZZZZZ"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn update_persists_balance_change() {
        let (storage, _dir) = temp_storage();
        let repo = AccountRepository::new(&storage);

        let mut acct = account("NKM-AAAAAAA", "111");
        repo.create(&acct).unwrap();

        acct.balance = "1000.00".parse().unwrap();
        repo.update(&acct).unwrap();

        let loaded = repo.get("NKM-AAAAAAA").unwrap();
        assert_eq!(loaded.balance, "1000.00".parse().unwrap());
    }

    #[test]
    fn delete_removes_account() {
        let (storage, _dir) = temp_storage();
        let repo = AccountRepository::new(&storage);

        repo.create(&account("NKM-AAAAAAA", "111")).unwrap();
        repo.delete("nkm-aaaaaaa").unwrap();
        assert!(matches!(
            repo.get("NKM-AAAAAAA"),
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            repo.delete("NKM-AAAAAAA"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn list_all_is_newest_first() {
        let (storage, _dir) = temp_storage();
        let repo = AccountRepository::new(&storage);

        let mut first = account("NKM-AAAAAAA", "111");
        first.created_at = chrono::Utc::now() - chrono::Duration::hours(1);
        repo.create(&first).unwrap();
        repo.create(&account("NKM-BBBBBBB", "222")).unwrap();

        let all = repo.list_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].band_id, "NKM-BBBBBBB");
    }
}
