// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use std::fmt;

use hmac::{Hmac, Mac};
use rsa::pkcs1v15;
use rsa::pss;
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::{Oaep, Pkcs1v15Encrypt};
use sha1::Sha1;
use sha2::Sha256;

use opcua_types::{Error, StatusCode};

use crate::aeskey::AesKey;
use crate::pkey::{PrivateKey, PublicKey};

/// Asymmetric encryption scheme a [`SecurityPolicy`] selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsymmetricEncryptionPadding {
    Pkcs1V15,
    OaepSha1,
    OaepSha256,
}

/// Asymmetric signature scheme a [`SecurityPolicy`] selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AsymmetricSignatureScheme {
    Pkcs1v15Sha1,
    Pkcs1v15Sha256,
    PssSha256,
}

/// The named OPC-UA security policies. Each bundles a signature algorithm, an
/// asymmetric encryption padding scheme, and a symmetric cipher, matching the
/// `SecurityPolicy` dispatch table a `SecureChannel` drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityPolicy {
    None,
    Basic128Rsa15,
    Basic256,
    Basic256Sha256,
    Aes128Sha256RsaOaep,
    Aes256Sha256RsaPss,
    Unknown,
}

impl fmt::Display for SecurityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uri())
    }
}

const BASIC128RSA15_URI: &str = "http://opcfoundation.org/UA/SecurityPolicy#Basic128Rsa15";
const BASIC256_URI: &str = "http://opcfoundation.org/UA/SecurityPolicy#Basic256";
const BASIC256SHA256_URI: &str = "http://opcfoundation.org/UA/SecurityPolicy#Basic256Sha256";
const AES128SHA256RSAOAEP_URI: &str =
    "http://opcfoundation.org/UA/SecurityPolicy#Aes128_Sha256_RsaOaep";
const AES256SHA256RSAPSS_URI: &str =
    "http://opcfoundation.org/UA/SecurityPolicy#Aes256_Sha256_RsaPss";
const NONE_URI: &str = "http://opcfoundation.org/UA/SecurityPolicy#None";

impl SecurityPolicy {
    pub fn to_uri(self) -> &'static str {
        match self {
            SecurityPolicy::None => NONE_URI,
            SecurityPolicy::Basic128Rsa15 => BASIC128RSA15_URI,
            SecurityPolicy::Basic256 => BASIC256_URI,
            SecurityPolicy::Basic256Sha256 => BASIC256SHA256_URI,
            SecurityPolicy::Aes128Sha256RsaOaep => AES128SHA256RSAOAEP_URI,
            SecurityPolicy::Aes256Sha256RsaPss => AES256SHA256RSAPSS_URI,
            SecurityPolicy::Unknown => "",
        }
    }

    pub fn from_uri(uri: &str) -> SecurityPolicy {
        match uri {
            NONE_URI => SecurityPolicy::None,
            BASIC128RSA15_URI => SecurityPolicy::Basic128Rsa15,
            BASIC256_URI => SecurityPolicy::Basic256,
            BASIC256SHA256_URI => SecurityPolicy::Basic256Sha256,
            AES128SHA256RSAOAEP_URI => SecurityPolicy::Aes128Sha256RsaOaep,
            AES256SHA256RSAPSS_URI => SecurityPolicy::Aes256Sha256RsaPss,
            _ => SecurityPolicy::Unknown,
        }
    }

    /// Whether the encoder will sign/encrypt anything under this policy.
    pub fn is_supported(self) -> bool {
        matches!(
            self,
            SecurityPolicy::Basic128Rsa15
                | SecurityPolicy::Basic256
                | SecurityPolicy::Basic256Sha256
                | SecurityPolicy::Aes128Sha256RsaOaep
                | SecurityPolicy::Aes256Sha256RsaPss
        )
    }

    /// AES-CBC plaintext block size used by the symmetric cipher. 16 for every
    /// supported policy; `None` has no cipher at all.
    pub fn plain_block_size(self) -> usize {
        match self {
            SecurityPolicy::None => 1,
            _ => 16,
        }
    }

    pub fn symmetric_signature_size(self) -> usize {
        match self {
            SecurityPolicy::None => 0,
            SecurityPolicy::Basic128Rsa15 | SecurityPolicy::Basic256 => 20,
            _ => 32,
        }
    }

    pub fn asymmetric_encryption_padding(self) -> AsymmetricEncryptionPadding {
        match self {
            SecurityPolicy::Basic128Rsa15 => AsymmetricEncryptionPadding::Pkcs1V15,
            SecurityPolicy::Basic256 | SecurityPolicy::Basic256Sha256 => {
                AsymmetricEncryptionPadding::OaepSha1
            }
            SecurityPolicy::Aes128Sha256RsaOaep | SecurityPolicy::Aes256Sha256RsaPss => {
                AsymmetricEncryptionPadding::OaepSha256
            }
            _ => AsymmetricEncryptionPadding::Pkcs1V15,
        }
    }

    /// Nonce length used by `make_secure_channel_keys` (Part 6 Table 33).
    pub fn secure_channel_nonce_length(self) -> usize {
        match self {
            SecurityPolicy::Basic128Rsa15 => 16,
            SecurityPolicy::Basic256 => 32,
            SecurityPolicy::Basic256Sha256
            | SecurityPolicy::Aes128Sha256RsaOaep
            | SecurityPolicy::Aes256Sha256RsaPss => 32,
            _ => 0,
        }
    }

    fn use_sha256_symmetric_signature(self) -> bool {
        !matches!(self, SecurityPolicy::Basic128Rsa15 | SecurityPolicy::Basic256)
    }

    /// Asymmetric signature scheme, which for `Aes256Sha256RsaPss` is RSA-PSS
    /// rather than the PKCS#1 v1.5 padding every other policy uses.
    fn asymmetric_signature_scheme(self) -> AsymmetricSignatureScheme {
        match self {
            SecurityPolicy::Basic128Rsa15 | SecurityPolicy::Basic256 => {
                AsymmetricSignatureScheme::Pkcs1v15Sha1
            }
            SecurityPolicy::Aes256Sha256RsaPss => AsymmetricSignatureScheme::PssSha256,
            _ => AsymmetricSignatureScheme::Pkcs1v15Sha256,
        }
    }

    /// HMAC-SHA1 or HMAC-SHA256 over `data` using the derived signing key,
    /// written into `signature` which must be exactly
    /// `symmetric_signature_size()` bytes.
    pub fn symmetric_sign(self, key: &[u8], data: &[u8], signature: &mut [u8]) -> Result<(), Error> {
        if signature.len() != self.symmetric_signature_size() {
            return Err(Error::new(
                StatusCode::BadSecurityChecksFailed,
                "signature buffer has the wrong length",
            ));
        }
        if self.use_sha256_symmetric_signature() {
            let mut mac = Hmac::<Sha256>::new_from_slice(key)
                .map_err(|e| Error::new(StatusCode::BadSecurityChecksFailed, e.to_string()))?;
            mac.update(data);
            signature.copy_from_slice(&mac.finalize().into_bytes());
        } else {
            let mut mac = Hmac::<Sha1>::new_from_slice(key)
                .map_err(|e| Error::new(StatusCode::BadSecurityChecksFailed, e.to_string()))?;
            mac.update(data);
            signature.copy_from_slice(&mac.finalize().into_bytes());
        }
        Ok(())
    }

    pub fn symmetric_verify_signature(
        self,
        key: &[u8],
        data: &[u8],
        signature: &[u8],
    ) -> Result<bool, Error> {
        let mut expected = vec![0u8; self.symmetric_signature_size()];
        self.symmetric_sign(key, data, &mut expected)?;
        Ok(expected == signature)
    }

    /// AES-CBC encrypt `src` into `dst` (same length) using `key`/`iv`.
    pub fn symmetric_encrypt(
        self,
        key: &AesKey,
        iv: &[u8],
        src: &[u8],
        dst: &mut [u8],
    ) -> Result<usize, Error> {
        key.encrypt(src, iv, dst)
    }

    pub fn symmetric_decrypt(
        self,
        key: &AesKey,
        iv: &[u8],
        src: &[u8],
        dst: &mut [u8],
    ) -> Result<usize, Error> {
        key.decrypt(src, iv, dst)
    }

    /// RSA-sign `data` with the local private key using the policy's
    /// asymmetric signature algorithm: PKCS#1 v1.5 with SHA-1
    /// (Basic128Rsa15/Basic256), PKCS#1 v1.5 with SHA-256 (the other
    /// SHA-256 policies), or RSA-PSS with SHA-256 (`Aes256Sha256RsaPss`).
    pub fn asymmetric_sign(self, key: &PrivateKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        let mut rng = rand::thread_rng();
        let sig = match self.asymmetric_signature_scheme() {
            AsymmetricSignatureScheme::Pkcs1v15Sha1 => {
                let signing_key = pkcs1v15::SigningKey::<Sha1>::new(key.as_rsa().clone());
                signing_key.sign_with_rng(&mut rng, data).to_vec()
            }
            AsymmetricSignatureScheme::Pkcs1v15Sha256 => {
                let signing_key = pkcs1v15::SigningKey::<Sha256>::new(key.as_rsa().clone());
                signing_key.sign_with_rng(&mut rng, data).to_vec()
            }
            AsymmetricSignatureScheme::PssSha256 => {
                let signing_key = pss::SigningKey::<Sha256>::new(key.as_rsa().clone());
                signing_key.sign_with_rng(&mut rng, data).to_vec()
            }
        };
        Ok(sig)
    }

    pub fn asymmetric_verify_signature(
        self,
        key: &PublicKey,
        data: &[u8],
        signature: &[u8],
    ) -> Result<bool, Error> {
        let ok = match self.asymmetric_signature_scheme() {
            AsymmetricSignatureScheme::Pkcs1v15Sha1 => {
                let verifying_key = pkcs1v15::VerifyingKey::<Sha1>::new(key.as_rsa().clone());
                let sig = pkcs1v15::Signature::try_from(signature)
                    .map_err(|e| Error::new(StatusCode::BadSecurityChecksFailed, e.to_string()))?;
                verifying_key.verify(data, &sig).is_ok()
            }
            AsymmetricSignatureScheme::Pkcs1v15Sha256 => {
                let verifying_key = pkcs1v15::VerifyingKey::<Sha256>::new(key.as_rsa().clone());
                let sig = pkcs1v15::Signature::try_from(signature)
                    .map_err(|e| Error::new(StatusCode::BadSecurityChecksFailed, e.to_string()))?;
                verifying_key.verify(data, &sig).is_ok()
            }
            AsymmetricSignatureScheme::PssSha256 => {
                let verifying_key = pss::VerifyingKey::<Sha256>::new(key.as_rsa().clone());
                let sig = pss::Signature::try_from(signature)
                    .map_err(|e| Error::new(StatusCode::BadSecurityChecksFailed, e.to_string()))?;
                verifying_key.verify(data, &sig).is_ok()
            }
        };
        Ok(ok)
    }

    /// Encrypts a single `plain_text_block_size()`-or-smaller block with the
    /// peer's public key.
    pub fn asymmetric_encrypt(self, key: &PublicKey, src: &[u8]) -> Result<Vec<u8>, Error> {
        let mut rng = rand::thread_rng();
        let out = match self.asymmetric_encryption_padding() {
            AsymmetricEncryptionPadding::Pkcs1V15 => {
                key.as_rsa().encrypt(&mut rng, Pkcs1v15Encrypt, src)
            }
            AsymmetricEncryptionPadding::OaepSha1 => {
                key.as_rsa().encrypt(&mut rng, Oaep::new::<Sha1>(), src)
            }
            AsymmetricEncryptionPadding::OaepSha256 => {
                key.as_rsa().encrypt(&mut rng, Oaep::new::<Sha256>(), src)
            }
        }
        .map_err(|e| Error::new(StatusCode::BadSecurityChecksFailed, e.to_string()))?;
        Ok(out)
    }

    pub fn asymmetric_decrypt(self, key: &PrivateKey, src: &[u8]) -> Result<Vec<u8>, Error> {
        let out = match self.asymmetric_encryption_padding() {
            AsymmetricEncryptionPadding::Pkcs1V15 => key.as_rsa().decrypt(Pkcs1v15Encrypt, src),
            AsymmetricEncryptionPadding::OaepSha1 => key.as_rsa().decrypt(Oaep::new::<Sha1>(), src),
            AsymmetricEncryptionPadding::OaepSha256 => {
                key.as_rsa().decrypt(Oaep::new::<Sha256>(), src)
            }
        }
        .map_err(|e| Error::new(StatusCode::BadSecurityChecksFailed, e.to_string()))?;
        Ok(out)
    }

    /// Derives `(signing_key, encrypting_key, iv)` from a secret/seed nonce
    /// pair per Part 6 Table 33's `P_SHA1`/`P_SHA256` pseudo-random function.
    pub fn make_secure_channel_keys(self, secret: &[u8], seed: &[u8]) -> (Vec<u8>, AesKey, Vec<u8>) {
        let signing_key_len = self.symmetric_signature_size();
        let encrypting_key_len = match self {
            SecurityPolicy::Aes256Sha256RsaPss => 32,
            _ => 16,
        };
        let iv_len = self.plain_block_size();
        let total = signing_key_len + encrypting_key_len + iv_len;
        let bytes = if self.use_sha256_symmetric_signature() {
            p_hash_sha256(secret, seed, total)
        } else {
            p_hash_sha1(secret, seed, total)
        };
        let signing_key = bytes[..signing_key_len].to_vec();
        let encrypting_key = bytes[signing_key_len..signing_key_len + encrypting_key_len].to_vec();
        let iv = bytes[signing_key_len + encrypting_key_len..total].to_vec();
        (signing_key, AesKey::new(self, encrypting_key), iv)
    }
}

/// TLS-style `P_hash` pseudo-random function: `HMAC(secret, A(i) || seed)`
/// chained until `length` bytes have been produced (Part 6 Table 33).
fn p_hash_sha1(secret: &[u8], seed: &[u8], length: usize) -> Vec<u8> {
    let mut result = Vec::with_capacity(length + 64);
    let mut a = seed.to_vec();
    while result.len() < length {
        let mut mac = Hmac::<Sha1>::new_from_slice(secret).expect("HMAC accepts any key length");
        mac.update(&a);
        a = mac.finalize().into_bytes().to_vec();

        let mut mac = Hmac::<Sha1>::new_from_slice(secret).expect("HMAC accepts any key length");
        mac.update(&a);
        mac.update(seed);
        result.extend_from_slice(&mac.finalize().into_bytes());
    }
    result.truncate(length);
    result
}

fn p_hash_sha256(secret: &[u8], seed: &[u8], length: usize) -> Vec<u8> {
    let mut result = Vec::with_capacity(length + 64);
    let mut a = seed.to_vec();
    while result.len() < length {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret).expect("HMAC accepts any key length");
        mac.update(&a);
        a = mac.finalize().into_bytes().to_vec();

        let mut mac = Hmac::<Sha256>::new_from_slice(secret).expect("HMAC accepts any key length");
        mac.update(&a);
        mac.update(seed);
        result.extend_from_slice(&mac.finalize().into_bytes());
    }
    result.truncate(length);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_round_trips() {
        for policy in [
            SecurityPolicy::Basic128Rsa15,
            SecurityPolicy::Basic256,
            SecurityPolicy::Basic256Sha256,
            SecurityPolicy::Aes128Sha256RsaOaep,
            SecurityPolicy::Aes256Sha256RsaPss,
        ] {
            assert_eq!(SecurityPolicy::from_uri(policy.to_uri()), policy);
        }
    }

    #[test]
    fn unknown_uri_maps_to_unknown_policy() {
        assert_eq!(SecurityPolicy::from_uri("bogus"), SecurityPolicy::Unknown);
    }

    #[test]
    fn symmetric_signature_sizes_match_hmac_algorithm() {
        assert_eq!(SecurityPolicy::Basic128Rsa15.symmetric_signature_size(), 20);
        assert_eq!(SecurityPolicy::Basic256.symmetric_signature_size(), 20);
        assert_eq!(SecurityPolicy::Basic256Sha256.symmetric_signature_size(), 32);
    }

    #[test]
    fn derived_keys_have_expected_lengths() {
        let policy = SecurityPolicy::Basic256Sha256;
        let (signing_key, encrypting_key, iv) =
            policy.make_secure_channel_keys(b"client-nonce-2222222222", b"server-nonce-2222222222");
        assert_eq!(signing_key.len(), policy.symmetric_signature_size());
        assert_eq!(encrypting_key.key_length(), 16);
        assert_eq!(iv.len(), policy.plain_block_size());
    }

    #[test]
    fn symmetric_sign_then_verify_round_trips() {
        let policy = SecurityPolicy::Basic128Rsa15;
        let key = vec![9u8; 16];
        let data = b"some chunk bytes to authenticate";
        let mut sig = vec![0u8; policy.symmetric_signature_size()];
        policy.symmetric_sign(&key, data, &mut sig).unwrap();
        assert!(policy.symmetric_verify_signature(&key, data, &sig).unwrap());
    }

    #[test]
    fn asymmetric_sign_then_verify_round_trips_for_every_supported_policy() {
        let mut rng = rand::thread_rng();
        let rsa_key = rsa::RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let private_key = crate::pkey::PrivateKey::new(rsa_key);
        let public_key = private_key.public_key();
        let data = b"chunk bytes from the start of the message up to the signature";

        for policy in [
            SecurityPolicy::Basic128Rsa15,
            SecurityPolicy::Basic256,
            SecurityPolicy::Basic256Sha256,
            SecurityPolicy::Aes128Sha256RsaOaep,
            SecurityPolicy::Aes256Sha256RsaPss,
        ] {
            let sig = policy.asymmetric_sign(&private_key, data).unwrap();
            assert!(policy
                .asymmetric_verify_signature(&public_key, data, &sig)
                .unwrap());
        }
    }

    #[test]
    fn aes256_sha256_rsa_pss_signature_does_not_verify_as_pkcs1v15() {
        let mut rng = rand::thread_rng();
        let rsa_key = rsa::RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let private_key = crate::pkey::PrivateKey::new(rsa_key);
        let public_key = private_key.public_key();
        let data = b"some payload";

        let sig = SecurityPolicy::Aes256Sha256RsaPss
            .asymmetric_sign(&private_key, data)
            .unwrap();
        assert!(!SecurityPolicy::Aes128Sha256RsaOaep
            .asymmetric_verify_signature(&public_key, data, &sig)
            .unwrap());
    }
}
