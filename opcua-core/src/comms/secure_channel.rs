// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use opcua_crypto::{AesKey, Certificate, PrivateKey, PublicKey, SecurityPolicy};

/// How much of the chunk construction pipeline is applied: nothing, signing
/// only, or signing and encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSecurityMode {
    None,
    Sign,
    SignAndEncrypt,
}

impl MessageSecurityMode {
    pub fn is_signing_enabled(self) -> bool {
        !matches!(self, MessageSecurityMode::None)
    }

    pub fn is_encryption_enabled(self) -> bool {
        matches!(self, MessageSecurityMode::SignAndEncrypt)
    }
}

/// Derived symmetric key material for one token epoch: the signing key used
/// for HMAC, the AES key, and its IV. Channels hold their own copy (derived
/// from nonces exchanged at channel-open/renew time); key derivation itself
/// is out of this crate's scope.
#[derive(Debug, Clone)]
pub struct SymmetricKeys {
    pub signing_key: Vec<u8>,
    pub encrypting_key: AesKey,
    pub iv: Vec<u8>,
}

/// Everything the chunk encoder needs to know about a secure channel: its
/// identity, negotiated policy and mode, the keys for whichever security
/// variant is in play, and the counters that are exclusively owned by this
/// channel's encoder.
///
/// This is an encoding-only view: verifying/decrypting inbound chunks is out
/// of scope, so no remote/decrypt key material is modeled here.
pub struct SecureChannel {
    pub channel_id: u32,
    pub security_policy: SecurityPolicy,
    pub security_mode: MessageSecurityMode,

    /// Our own certificate and private key, used by the asymmetric delegate
    /// to sign and to carry in the security header.
    pub local_cert: Option<Certificate>,
    pub local_private_key: Option<PrivateKey>,

    /// The peer's certificate, used by the asymmetric delegate to encrypt
    /// and to compute the thumbprint carried in the security header.
    pub remote_cert: Option<Certificate>,
    pub remote_public_key: Option<PublicKey>,

    /// Current symmetric token id and keys. `None` until the channel has
    /// completed at least one key derivation (i.e. during the initial
    /// asymmetric OpenSecureChannel exchange).
    pub token_id: u32,
    pub local_keys: Option<SymmetricKeys>,

    pub sequence_counter: super::sequence::SequenceCounter,
    pub request_id_generator: super::sequence::RequestIdGenerator,
}

impl SecureChannel {
    /// A fresh, unsecured channel: `SecurityPolicy::None`, no certificates,
    /// no keys. Used for the very first Hello/Acknowledge exchange.
    pub fn new_unsecured(channel_id: u32) -> Self {
        Self {
            channel_id,
            security_policy: SecurityPolicy::None,
            security_mode: MessageSecurityMode::None,
            local_cert: None,
            local_private_key: None,
            remote_cert: None,
            remote_public_key: None,
            token_id: 0,
            local_keys: None,
            sequence_counter: super::sequence::SequenceCounter::new(),
            request_id_generator: super::sequence::RequestIdGenerator::new(),
        }
    }

    /// Allocates the next request id for an outbound request on this
    /// channel. See §6.2 `nextRequestId`.
    pub fn next_request_id(&mut self) -> Result<u32, crate::error::Error> {
        self.request_id_generator.next()
    }
}
