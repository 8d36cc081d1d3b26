// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use opcua_types::ByteString;
use rand::RngCore;

/// Fills `bytes` with cryptographically random data, e.g. for nonces used in
/// `make_secure_channel_keys`.
pub fn bytes(bytes: &mut [u8]) {
    rand::thread_rng().fill_bytes(bytes);
}

/// Produces a random `ByteString` of length `n`.
pub fn byte_string(n: usize) -> ByteString {
    let mut v = vec![0u8; n];
    bytes(&mut v);
    ByteString::from(v)
}
