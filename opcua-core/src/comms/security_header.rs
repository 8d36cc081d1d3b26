// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use opcua_types::encoding::{write_u32, SimpleBinaryEncodable};
use opcua_types::{ByteString, EncodingResult, UAString};

/// Size in bytes of a [`SymmetricSecurityHeader`].
pub const SYMMETRIC_SECURITY_HEADER_SIZE: usize = 4;

/// Size in bytes of a [`SequenceHeader`].
pub const SEQUENCE_HEADER_SIZE: usize = 8;

/// Security header carried by `OpenSecureChannel`/`CloseSecureChannel`
/// chunks: the negotiated policy URI, the sender's certificate, and the
/// thumbprint of the certificate the sender encrypted/signed for.
#[derive(Debug, Clone)]
pub struct AsymmetricSecurityHeader {
    pub security_policy_uri: UAString,
    pub sender_certificate: ByteString,
    pub receiver_certificate_thumbprint: ByteString,
}

impl AsymmetricSecurityHeader {
    /// A header with no certificates, used when the policy is `None`.
    pub fn none() -> Self {
        Self {
            security_policy_uri: UAString::from(
                "http://opcfoundation.org/UA/SecurityPolicy#None",
            ),
            sender_certificate: ByteString::null(),
            receiver_certificate_thumbprint: ByteString::null(),
        }
    }

    pub fn new(
        security_policy_uri: impl Into<UAString>,
        sender_certificate: ByteString,
        receiver_certificate_thumbprint: ByteString,
    ) -> Self {
        Self {
            security_policy_uri: security_policy_uri.into(),
            sender_certificate,
            receiver_certificate_thumbprint,
        }
    }
}

impl SimpleBinaryEncodable for AsymmetricSecurityHeader {
    fn byte_len(&self) -> usize {
        self.security_policy_uri.byte_len()
            + self.sender_certificate.byte_len()
            + self.receiver_certificate_thumbprint.byte_len()
    }

    fn encode(&self, stream: &mut dyn std::io::Write) -> EncodingResult<usize> {
        let mut size = self.security_policy_uri.encode(stream)?;
        size += self.sender_certificate.encode(stream)?;
        size += self.receiver_certificate_thumbprint.encode(stream)?;
        Ok(size)
    }
}

/// Security header carried by steady-state `Message` chunks: just the
/// current token id, which tells the receiver which derived key epoch to use.
#[derive(Debug, Clone, Copy)]
pub struct SymmetricSecurityHeader {
    pub token_id: u32,
}

impl SimpleBinaryEncodable for SymmetricSecurityHeader {
    fn byte_len(&self) -> usize {
        SYMMETRIC_SECURITY_HEADER_SIZE
    }

    fn encode(&self, stream: &mut dyn std::io::Write) -> EncodingResult<usize> {
        write_u32(stream, self.token_id)
    }
}

/// The per-chunk sequence number and the request id it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct SequenceHeader {
    pub sequence_number: u32,
    pub request_id: u32,
}

impl SimpleBinaryEncodable for SequenceHeader {
    fn byte_len(&self) -> usize {
        SEQUENCE_HEADER_SIZE
    }

    fn encode(&self, stream: &mut dyn std::io::Write) -> EncodingResult<usize> {
        let mut size = write_u32(stream, self.sequence_number)?;
        size += write_u32(stream, self.request_id)?;
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_header_is_four_bytes() {
        let header = SymmetricSecurityHeader { token_id: 9 };
        assert_eq!(header.byte_len(), 4);
        let mut out = Vec::new();
        header.encode(&mut out).unwrap();
        assert_eq!(out, 9u32.to_le_bytes());
    }

    #[test]
    fn sequence_header_is_eight_bytes() {
        let header = SequenceHeader {
            sequence_number: 5,
            request_id: 1,
        };
        let mut out = Vec::new();
        let n = header.encode(&mut out).unwrap();
        assert_eq!(n, 8);
        assert_eq!(&out[0..4], &5u32.to_le_bytes());
        assert_eq!(&out[4..8], &1u32.to_le_bytes());
    }

    #[test]
    fn asymmetric_header_size_matches_scenario_s3() {
        // S3: policy URI 51 bytes, cert DER 1000 bytes, thumbprint 20 bytes.
        let header = AsymmetricSecurityHeader::new(
            "http://opcfoundation.org/UA/SecurityPolicy#Basic256",
            ByteString::from(vec![0u8; 1000]),
            ByteString::from(vec![0u8; 20]),
        );
        assert_eq!(header.byte_len(), 4 + 51 + 4 + 1000 + 4 + 20);
    }
}
