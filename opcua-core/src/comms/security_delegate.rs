// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use opcua_types::encoding::SimpleBinaryEncodable;
use opcua_types::ByteString;

use crate::comms::secure_channel::{SecureChannel, SymmetricKeys};
use crate::comms::security_header::{
    AsymmetricSecurityHeader, SymmetricSecurityHeader, SYMMETRIC_SECURITY_HEADER_SIZE,
};
use crate::error::Error;

/// Per-chunk key material captured at `encode_security_header` time and
/// threaded explicitly through `sign_chunk`/`encrypt` for that same chunk.
///
/// This is the per-chunk local value the design notes call for in place of
/// a mutable field on the delegate: a token rollover between
/// `encode_security_header` and `encrypt` on the same chunk cannot split the
/// signing key from the encrypting key, because both calls are handed the
/// same owned snapshot rather than re-reading channel state.
pub enum ChunkSecrets {
    Asymmetric,
    Symmetric(SymmetricKeys),
}

/// The part of chunk construction that differs between the asymmetric
/// (channel-open) and symmetric (steady-state) security variants. Expressed
/// as a tagged enum matched once per chunk rather than as a trait object,
/// since there are exactly two variants and all the state they need already
/// lives on [`SecureChannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityDelegate {
    Asymmetric,
    Symmetric,
}

impl SecurityDelegate {
    pub fn is_encryption_enabled(self, channel: &SecureChannel) -> bool {
        channel.security_mode.is_encryption_enabled()
    }

    pub fn is_signing_enabled(self, channel: &SecureChannel) -> bool {
        channel.security_mode.is_signing_enabled()
    }

    pub fn security_header_size(self, channel: &SecureChannel) -> usize {
        match self {
            SecurityDelegate::Symmetric => SYMMETRIC_SECURITY_HEADER_SIZE,
            SecurityDelegate::Asymmetric => asymmetric_header(channel).byte_len(),
        }
    }

    /// Ciphertext bytes produced per cipher operation: the RSA modulus size
    /// for asymmetric, the AES block size for symmetric.
    pub fn cipher_text_block_size(self, channel: &SecureChannel) -> usize {
        match self {
            SecurityDelegate::Symmetric => channel.security_policy.plain_block_size(),
            SecurityDelegate::Asymmetric => channel
                .remote_public_key
                .as_ref()
                .map(|k| k.size())
                .unwrap_or(0),
        }
    }

    /// Plaintext bytes consumed per cipher operation before expansion.
    pub fn plain_text_block_size(self, channel: &SecureChannel) -> usize {
        match self {
            SecurityDelegate::Symmetric => channel.security_policy.plain_block_size(),
            SecurityDelegate::Asymmetric => channel
                .remote_public_key
                .as_ref()
                .map(|k| k.plain_text_block_size(channel.security_policy.asymmetric_encryption_padding()))
                .unwrap_or(0),
        }
    }

    pub fn signature_size(self, channel: &SecureChannel) -> usize {
        if !self.is_signing_enabled(channel) {
            return 0;
        }
        match self {
            SecurityDelegate::Symmetric => channel.security_policy.symmetric_signature_size(),
            SecurityDelegate::Asymmetric => channel
                .local_private_key
                .as_ref()
                .map(|k| k.size())
                .unwrap_or(0),
        }
    }

    /// Writes the security header and returns the bytes written plus, for
    /// the symmetric variant, a snapshot of the channel's current keys to
    /// use for the rest of this chunk.
    pub fn encode_security_header(
        self,
        channel: &SecureChannel,
        out: &mut dyn std::io::Write,
    ) -> Result<(usize, ChunkSecrets), Error> {
        match self {
            SecurityDelegate::Asymmetric => {
                let header = asymmetric_header(channel);
                let n = header
                    .encode(out)
                    .map_err(|e| Error::SecurityChecksFailed(e.to_string()))?;
                Ok((n, ChunkSecrets::Asymmetric))
            }
            SecurityDelegate::Symmetric => {
                let keys = channel
                    .local_keys
                    .clone()
                    .ok_or_else(|| Error::InvalidConfiguration("no symmetric keys derived".into()))?;
                let header = SymmetricSecurityHeader {
                    token_id: channel.token_id,
                };
                let n = header
                    .encode(out)
                    .map_err(|e| Error::SecurityChecksFailed(e.to_string()))?;
                Ok((n, ChunkSecrets::Symmetric(keys)))
            }
        }
    }

    /// Signs `data` (the chunk bytes written so far, from the start of the
    /// chunk) with the local private key (asymmetric) or the snapshotted
    /// HMAC key (symmetric).
    pub fn sign_chunk(
        self,
        channel: &SecureChannel,
        secrets: &ChunkSecrets,
        data: &[u8],
    ) -> Result<Vec<u8>, Error> {
        match (self, secrets) {
            (SecurityDelegate::Asymmetric, ChunkSecrets::Asymmetric) => {
                let key = channel
                    .local_private_key
                    .as_ref()
                    .ok_or_else(|| Error::InvalidConfiguration("no local private key".into()))?;
                channel
                    .security_policy
                    .asymmetric_sign(key, data)
                    .map_err(Error::from)
            }
            (SecurityDelegate::Symmetric, ChunkSecrets::Symmetric(keys)) => {
                let mut signature = vec![0u8; channel.security_policy.symmetric_signature_size()];
                channel
                    .security_policy
                    .symmetric_sign(&keys.signing_key, data, &mut signature)
                    .map_err(Error::from)?;
                Ok(signature)
            }
            _ => Err(Error::InvalidConfiguration(
                "security delegate and chunk secrets variant mismatch".into(),
            )),
        }
    }

    /// Encrypts `data` in place: asymmetric encrypts each `plainTextBlockSize`
    /// block independently (RSA operates per-block and expands each block to
    /// `cipherTextBlockSize`); symmetric runs AES-CBC over the whole region
    /// as a single pass.
    pub fn encrypt(
        self,
        channel: &SecureChannel,
        secrets: &ChunkSecrets,
        data: &[u8],
    ) -> Result<Vec<u8>, Error> {
        match (self, secrets) {
            (SecurityDelegate::Asymmetric, ChunkSecrets::Asymmetric) => {
                let key = channel
                    .remote_public_key
                    .as_ref()
                    .ok_or_else(|| Error::InvalidConfiguration("no remote public key".into()))?;
                let plain_block = self.plain_text_block_size(channel);
                if plain_block == 0 || data.len() % plain_block != 0 {
                    return Err(Error::InvalidGeometry(
                        "asymmetric plaintext is not a multiple of the block size".into(),
                    ));
                }
                let mut out = Vec::with_capacity(data.len() / plain_block * self.cipher_text_block_size(channel));
                for block in data.chunks(plain_block) {
                    let cipher_block = channel
                        .security_policy
                        .asymmetric_encrypt(key, block)
                        .map_err(Error::from)?;
                    out.extend_from_slice(&cipher_block);
                }
                Ok(out)
            }
            (SecurityDelegate::Symmetric, ChunkSecrets::Symmetric(keys)) => {
                let mut out = vec![0u8; data.len()];
                channel
                    .security_policy
                    .symmetric_encrypt(&keys.encrypting_key, &keys.iv, data, &mut out)
                    .map_err(Error::from)?;
                Ok(out)
            }
            _ => Err(Error::InvalidConfiguration(
                "security delegate and chunk secrets variant mismatch".into(),
            )),
        }
    }
}

fn asymmetric_header(channel: &SecureChannel) -> AsymmetricSecurityHeader {
    let sender_certificate = channel
        .local_cert
        .as_ref()
        .map(|c| c.as_byte_string())
        .unwrap_or_else(ByteString::null);
    let receiver_certificate_thumbprint = channel
        .remote_cert
        .as_ref()
        .map(|c| ByteString::from(c.thumbprint().to_vec()))
        .unwrap_or_else(ByteString::null);
    AsymmetricSecurityHeader::new(
        channel.security_policy.to_uri(),
        sender_certificate,
        receiver_certificate_thumbprint,
    )
}
