// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 BandPay

//! Custodial keypair generation.
//!
//! Pure generation, no I/O: the caller persists the pair. Keys are held
//! custodially on behalf of band holders and sellers.

use alloy::signers::local::PrivateKeySigner;

/// Generate a fresh keypair: checksummed address and private key as hex
/// without `0x`. Every call produces a cryptographically independent key.
pub fn generate_keypair() -> (String, String) {
    let signer = PrivateKeySigner::random();
    let address = signer.address().to_string();
    let private_key_hex = alloy::hex::encode(signer.to_bytes());
    (address, private_key_hex)
}
