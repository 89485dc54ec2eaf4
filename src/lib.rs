// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 BandPay

//! BandPay - Custodial NFC Band Payment Service
//!
//! Off-chain balances for NFC payment bands, mirrored onto an ERC-20
//! token through per-account custodial wallets. Funding mints tokens,
//! payments transfer them, and a scan relay streams band taps to kiosk
//! clients over SSE.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `chain` - EVM gateway (Alloy): gas, mint, transfer, confirmation
//! - `ledger` - fund/spend orchestration and balance invariants
//! - `relay` - scan ingestion and broadcast fan-out
//! - `storage` - embedded persistence (redb)

pub mod api;
pub mod chain;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod relay;
pub mod state;
pub mod storage;
pub mod wallet;
