// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::{Aes128, Aes256};
use cbc::{Decryptor, Encryptor};

use opcua_types::{Error, StatusCode};

use crate::security_policy::SecurityPolicy;

pub const AES_BLOCK_SIZE: usize = 16;
pub const AES128_KEY_SIZE: usize = 16;
pub const AES256_KEY_SIZE: usize = 32;

type Aes128CbcEnc = Encryptor<Aes128>;
type Aes128CbcDec = Decryptor<Aes128>;
type Aes256CbcEnc = Encryptor<Aes256>;
type Aes256CbcDec = Decryptor<Aes256>;

/// A symmetric key plus the policy it belongs to, dispatching to `aes`/`cbc`
/// for AES-CBC encrypt/decrypt. Padding is the chunk encoder's job (§4.5), so
/// the cipher itself always runs with `NoPadding`.
#[derive(Clone, PartialEq, Eq)]
pub struct AesKey {
    value: Vec<u8>,
    security_policy: SecurityPolicy,
}

impl std::fmt::Debug for AesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesKey")
            .field("security_policy", &self.security_policy)
            .field("key_length", &self.value.len())
            .finish()
    }
}

impl AesKey {
    pub fn new(security_policy: SecurityPolicy, value: Vec<u8>) -> Self {
        Self {
            value,
            security_policy,
        }
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn key_length(&self) -> usize {
        self.value.len()
    }

    pub fn block_size(&self) -> usize {
        AES_BLOCK_SIZE
    }

    pub fn iv_length(&self) -> usize {
        AES_BLOCK_SIZE
    }

    pub fn encrypt(&self, src: &[u8], iv: &[u8], dst: &mut [u8]) -> Result<usize, Error> {
        validate_aes_args(src, iv, dst, self.value.len())?;
        match self.value.len() {
            AES128_KEY_SIZE => {
                let enc = Aes128CbcEnc::new_from_slices(&self.value, iv).map_err(|e| {
                    Error::new(StatusCode::BadSecurityChecksFailed, e.to_string())
                })?;
                enc.encrypt_padded_b2b_mut::<NoPadding>(src, dst)
                    .map_err(|e| Error::new(StatusCode::BadSecurityChecksFailed, e.to_string()))?;
            }
            AES256_KEY_SIZE => {
                let enc = Aes256CbcEnc::new_from_slices(&self.value, iv).map_err(|e| {
                    Error::new(StatusCode::BadSecurityChecksFailed, e.to_string())
                })?;
                enc.encrypt_padded_b2b_mut::<NoPadding>(src, dst)
                    .map_err(|e| Error::new(StatusCode::BadSecurityChecksFailed, e.to_string()))?;
            }
            n => {
                return Err(Error::new(
                    StatusCode::BadSecurityChecksFailed,
                    format!("unsupported AES key length {n}"),
                ))
            }
        }
        Ok(src.len())
    }

    pub fn decrypt(&self, src: &[u8], iv: &[u8], dst: &mut [u8]) -> Result<usize, Error> {
        validate_aes_args(src, iv, dst, self.value.len())?;
        match self.value.len() {
            AES128_KEY_SIZE => {
                let dec = Aes128CbcDec::new_from_slices(&self.value, iv).map_err(|e| {
                    Error::new(StatusCode::BadSecurityChecksFailed, e.to_string())
                })?;
                dec.decrypt_padded_b2b_mut::<NoPadding>(src, dst)
                    .map_err(|e| Error::new(StatusCode::BadSecurityChecksFailed, e.to_string()))?;
            }
            AES256_KEY_SIZE => {
                let dec = Aes256CbcDec::new_from_slices(&self.value, iv).map_err(|e| {
                    Error::new(StatusCode::BadSecurityChecksFailed, e.to_string())
                })?;
                dec.decrypt_padded_b2b_mut::<NoPadding>(src, dst)
                    .map_err(|e| Error::new(StatusCode::BadSecurityChecksFailed, e.to_string()))?;
            }
            n => {
                return Err(Error::new(
                    StatusCode::BadSecurityChecksFailed,
                    format!("unsupported AES key length {n}"),
                ))
            }
        }
        Ok(src.len())
    }
}

fn validate_aes_args(src: &[u8], iv: &[u8], dst: &[u8], key_len: usize) -> Result<(), Error> {
    if src.len() % AES_BLOCK_SIZE != 0 {
        return Err(Error::new(
            StatusCode::BadSecurityChecksFailed,
            "AES-CBC input is not a multiple of the block size",
        ));
    }
    if dst.len() < src.len() {
        return Err(Error::new(
            StatusCode::BadSecurityChecksFailed,
            "AES-CBC output buffer is too small",
        ));
    }
    if iv.len() != AES_BLOCK_SIZE {
        return Err(Error::new(
            StatusCode::BadSecurityChecksFailed,
            "AES-CBC IV has the wrong length",
        ));
    }
    if key_len != AES128_KEY_SIZE && key_len != AES256_KEY_SIZE {
        return Err(Error::new(
            StatusCode::BadSecurityChecksFailed,
            "AES key has an unsupported length",
        ));
    }
    Ok(())
}
