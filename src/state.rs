// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 BandPay

use std::sync::Arc;

use crate::chain::ChainGateway;
use crate::config::Settings;
use crate::ledger::Ledger;
use crate::relay::ScanRelay;
use crate::storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
    pub ledger: Arc<Ledger>,
    pub relay: Arc<ScanRelay>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: Settings, storage: Storage, chain: Arc<dyn ChainGateway>) -> Self {
        let storage = Arc::new(storage);
        let ledger = Arc::new(Ledger::new(
            storage.clone(),
            chain,
            settings.chain.clone(),
        ));
        let relay = Arc::new(ScanRelay::new(storage.clone()));
        Self {
            storage,
            ledger,
            relay,
            settings: Arc::new(settings),
        }
    }
}
