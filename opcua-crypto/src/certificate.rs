// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use sha1::{Digest, Sha1};

use opcua_types::ByteString;

use crate::pkey::{public_key_from_pkcs1_der, PublicKey};

/// An X.509 certificate, modeled as an opaque DER blob plus the RSA public
/// key extracted from it. Full certificate parsing and chain validation are
/// out of scope here; this crate only needs the DER bytes (to embed in the
/// asymmetric security header) and the public key (to encrypt/verify
/// against).
#[derive(Clone)]
pub struct Certificate {
    der: Vec<u8>,
    public_key: PublicKey,
}

impl Certificate {
    pub fn new(der: Vec<u8>, public_key: PublicKey) -> Self {
        Self { der, public_key }
    }

    /// Builds a certificate from DER bytes, extracting the public key from a
    /// PKCS#1 `RSAPublicKey` embedded at a known offset.
    ///
    /// Real X.509 parsing (ASN.1 `SubjectPublicKeyInfo` traversal) lives
    /// outside this crate's scope; callers that need it should parse the
    /// certificate themselves and construct a `Certificate` directly with
    /// [`Certificate::new`].
    pub fn from_der_with_public_key(der: Vec<u8>, public_key_der: &[u8]) -> Result<Self, opcua_types::Error> {
        let public_key = public_key_from_pkcs1_der(public_key_der)?;
        Ok(Self::new(der, public_key))
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn as_byte_string(&self) -> ByteString {
        ByteString::from(self.der.clone())
    }

    /// SHA-1 thumbprint of the DER bytes (20 bytes), used in the asymmetric
    /// security header to identify the receiver's certificate.
    pub fn thumbprint(&self) -> [u8; 20] {
        let mut hasher = Sha1::new();
        hasher.update(&self.der);
        let digest = hasher.finalize();
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thumbprint_is_twenty_bytes_and_stable() {
        let mut rng = rand::thread_rng();
        let key = rsa::RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let public_key = crate::pkey::PrivateKey::new(key).public_key();
        let cert = Certificate::new(vec![1, 2, 3, 4, 5], public_key);
        let t1 = cert.thumbprint();
        let t2 = cert.thumbprint();
        assert_eq!(t1.len(), 20);
        assert_eq!(t1, t2);
    }
}
