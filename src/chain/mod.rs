// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 BandPay

//! EVM chain integration.

pub mod gateway;
pub mod token;

pub use gateway::{ChainGateway, ChainOutcome, RpcGateway, TxReceipt};
pub use token::{from_base_units, to_base_units, NATIVE_DECIMALS, TOKEN_DECIMALS};
