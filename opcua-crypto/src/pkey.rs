// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};

use opcua_types::{Error, StatusCode};

use crate::security_policy::AsymmetricEncryptionPadding;

/// Overhead, in bytes, that each asymmetric padding scheme subtracts from the
/// RSA modulus size to get the usable plaintext block size.
fn padding_overhead(padding: AsymmetricEncryptionPadding) -> usize {
    match padding {
        AsymmetricEncryptionPadding::Pkcs1V15 => 11,
        AsymmetricEncryptionPadding::OaepSha1 => 42,
        AsymmetricEncryptionPadding::OaepSha256 => 66,
    }
}

/// Wraps an RSA private key, exposed for asymmetric signing and decryption.
#[derive(Clone)]
pub struct PrivateKey(RsaPrivateKey);

impl PrivateKey {
    pub fn new(key: RsaPrivateKey) -> Self {
        Self(key)
    }

    pub fn as_rsa(&self) -> &RsaPrivateKey {
        &self.0
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.to_public_key())
    }

    /// RSA modulus size in bytes (e.g. 256 for a 2048-bit key).
    pub fn size(&self) -> usize {
        self.0.size()
    }
}

/// Wraps an RSA public key, exposed for asymmetric verification and
/// encryption against a peer's certificate.
#[derive(Clone)]
pub struct PublicKey(RsaPublicKey);

impl PublicKey {
    pub fn new(key: RsaPublicKey) -> Self {
        Self(key)
    }

    pub fn as_rsa(&self) -> &RsaPublicKey {
        &self.0
    }

    /// RSA modulus size in bytes; this is `cipherTextBlockSize` for the
    /// asymmetric security delegate.
    pub fn size(&self) -> usize {
        self.0.size()
    }

    /// Maximum plaintext bytes encryptable in a single RSA operation under
    /// `padding`; this is `plainTextBlockSize` for the asymmetric delegate.
    pub fn plain_text_block_size(&self, padding: AsymmetricEncryptionPadding) -> usize {
        self.size() - padding_overhead(padding)
    }

    /// Number of ciphertext bytes produced for a `plain_text_size`-byte
    /// message, rounding up to whole RSA blocks.
    pub fn cipher_text_size(
        &self,
        plain_text_size: usize,
        padding: AsymmetricEncryptionPadding,
    ) -> usize {
        let block = self.plain_text_block_size(padding);
        let blocks = plain_text_size.div_ceil(block).max(1);
        blocks * self.size()
    }
}

/// Parses a DER-encoded PKCS#8 private key, the format a configuration
/// loader would produce after decoding a PEM file.
pub fn private_key_from_pkcs8_der(der: &[u8]) -> Result<PrivateKey, Error> {
    use rsa::pkcs8::DecodePrivateKey;
    RsaPrivateKey::from_pkcs8_der(der)
        .map(PrivateKey::new)
        .map_err(|e| Error::new(StatusCode::BadSecurityChecksFailed, e.to_string()))
}

/// Parses a DER-encoded PKCS#1 RSA public key, as found embedded in an X.509
/// `SubjectPublicKeyInfo`.
pub fn public_key_from_pkcs1_der(der: &[u8]) -> Result<PublicKey, Error> {
    use rsa::pkcs1::DecodeRsaPublicKey;
    RsaPublicKey::from_pkcs1_der(der)
        .map(PublicKey::new)
        .map_err(|e| Error::new(StatusCode::BadSecurityChecksFailed, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> RsaPrivateKey {
        let mut rng = rand::thread_rng();
        RsaPrivateKey::new(&mut rng, 2048).unwrap()
    }

    #[test]
    fn plain_text_block_size_accounts_for_padding() {
        let key = PrivateKey::new(test_key());
        let public = key.public_key();
        assert_eq!(public.size(), 256);
        assert_eq!(
            public.plain_text_block_size(AsymmetricEncryptionPadding::Pkcs1V15),
            245
        );
        assert_eq!(
            public.plain_text_block_size(AsymmetricEncryptionPadding::OaepSha1),
            214
        );
    }

    #[test]
    fn cipher_text_size_rounds_up_to_whole_blocks() {
        let key = PrivateKey::new(test_key());
        let public = key.public_key();
        let padding = AsymmetricEncryptionPadding::OaepSha1;
        let block = public.plain_text_block_size(padding);
        assert_eq!(public.cipher_text_size(block, padding), 256);
        assert_eq!(public.cipher_text_size(block + 1, padding), 512);
        assert_eq!(public.cipher_text_size(0, padding), 256);
    }
}
