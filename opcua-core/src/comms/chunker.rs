// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use log::trace;
use opcua_types::encoding::SimpleBinaryEncodable;

use crate::comms::chunk_header::{ChunkType, MessageType, SecureMessageHeader, SECURE_MESSAGE_HEADER_SIZE};
use crate::comms::geometry;
use crate::comms::secure_channel::SecureChannel;
use crate::comms::security_delegate::SecurityDelegate;
use crate::comms::security_header::SequenceHeader;
use crate::config::ChannelParameters;
use crate::debug::log_buffer;
use crate::error::Error;

/// Drives message fragmentation: given a security delegate, a channel, and a
/// payload, produces the ordered sequence of wire chunks per §4.4.
pub struct ChunkEncoder;

impl ChunkEncoder {
    /// Encodes `payload` using the asymmetric security variant (channel-open
    /// traffic: `OpenSecureChannel`, and `CloseSecureChannel` sent before any
    /// symmetric keys exist).
    pub fn encode_asymmetric(
        channel: &mut SecureChannel,
        channel_params: &ChannelParameters,
        message_type: MessageType,
        payload: &[u8],
        request_id: u32,
    ) -> Result<Vec<Vec<u8>>, Error> {
        Self::encode_inner(
            SecurityDelegate::Asymmetric,
            channel,
            channel_params,
            message_type,
            ChunkType::Final,
            payload,
            request_id,
        )
    }

    /// Encodes `payload` using the symmetric security variant (steady-state
    /// `Message` traffic, and `CloseSecureChannel` once keys exist).
    pub fn encode_symmetric(
        channel: &mut SecureChannel,
        channel_params: &ChannelParameters,
        message_type: MessageType,
        payload: &[u8],
        request_id: u32,
    ) -> Result<Vec<Vec<u8>>, Error> {
        Self::encode_inner(
            SecurityDelegate::Symmetric,
            channel,
            channel_params,
            message_type,
            ChunkType::Final,
            payload,
            request_id,
        )
    }

    /// Encodes a caller-initiated abort: always exactly one chunk, finality
    /// `'A'`, `payload` is the status-code body. Uses the same pipeline as a
    /// normal send (§4.4 tie-breaks). `delegate` must match the phase the
    /// abort is raised in: `Asymmetric` during `OpenSecureChannel`, before
    /// any symmetric keys exist, `Symmetric` once they do.
    pub fn encode_abort(
        delegate: SecurityDelegate,
        channel: &mut SecureChannel,
        channel_params: &ChannelParameters,
        message_type: MessageType,
        payload: &[u8],
        request_id: u32,
    ) -> Result<Vec<Vec<u8>>, Error> {
        Self::encode_inner(
            delegate,
            channel,
            channel_params,
            message_type,
            ChunkType::Abort,
            payload,
            request_id,
        )
    }

    fn encode_inner(
        delegate: SecurityDelegate,
        channel: &mut SecureChannel,
        channel_params: &ChannelParameters,
        message_type: MessageType,
        forced_final_chunk_type: ChunkType,
        payload: &[u8],
        request_id: u32,
    ) -> Result<Vec<Vec<u8>>, Error> {
        let is_encrypted = delegate.is_encryption_enabled(channel);
        let is_signed = delegate.is_signing_enabled(channel);
        let security_header_size = delegate.security_header_size(channel);
        let signature_size = delegate.signature_size(channel);
        let cipher_text_block_size = delegate.cipher_text_block_size(channel);
        let plain_text_block_size = if is_encrypted {
            delegate.plain_text_block_size(channel)
        } else {
            1
        };
        let header_sizes = SECURE_MESSAGE_HEADER_SIZE + security_header_size;

        let max_body_size = geometry::max_body_size(
            channel_params.local_send_buffer_size,
            header_sizes,
            signature_size,
            if is_encrypted { cipher_text_block_size } else { 1 },
            plain_text_block_size,
            is_encrypted,
        )
        .ok_or_else(|| {
            Error::InvalidConfiguration(
                "send buffer is too small for the negotiated security overhead".into(),
            )
        })?;

        if channel_params.max_chunk_count > 0 {
            let projected = payload.len().div_ceil(max_body_size).max(1);
            if projected > channel_params.max_chunk_count {
                return Err(Error::PayloadTooLarge(format!(
                    "message would require {projected} chunks, exceeding the limit of {}",
                    channel_params.max_chunk_count
                )));
            }
        }

        trace!(
            "encoding message of {} bytes, max_body_size={}, header_sizes={}",
            payload.len(),
            max_body_size,
            header_sizes
        );

        let mut chunks = Vec::new();
        let mut offset = 0usize;
        loop {
            let remaining = payload.len() - offset;
            let body_size = remaining.min(max_body_size);
            let body = &payload[offset..offset + body_size];
            let more_remains = offset + body_size < payload.len();

            let chunk_type = if forced_final_chunk_type == ChunkType::Abort {
                ChunkType::Abort
            } else if more_remains {
                ChunkType::Intermediate
            } else {
                ChunkType::Final
            };

            let padding_size = geometry::padding_size(
                body_size,
                signature_size,
                plain_text_block_size,
                is_encrypted,
                cipher_text_block_size,
            );
            let padding_overhead = geometry::padding_overhead(is_encrypted, cipher_text_block_size);
            let plain_text_content_size = geometry::plain_text_content_size(
                body_size,
                signature_size,
                padding_size,
                padding_overhead,
                plain_text_block_size,
            )?;
            let total_chunk_size = geometry::chunk_size(
                header_sizes,
                plain_text_content_size,
                plain_text_block_size,
                if is_encrypted { cipher_text_block_size } else { 1 },
            );

            let mut chunk = Vec::with_capacity(total_chunk_size);

            let message_header = SecureMessageHeader {
                message_type,
                chunk_type,
                chunk_length: total_chunk_size as u32,
                channel_id: channel.channel_id,
            };
            message_header
                .encode(&mut chunk)
                .map_err(|e| Error::SecurityChecksFailed(e.to_string()))?;

            let (_, secrets) = delegate.encode_security_header(channel, &mut chunk)?;

            // Everything from here to the end of the chunk (sequence header,
            // body, padding, signature) is the `plainTextContentSize` region
            // that gets encrypted as a unit (§3).
            let plain_text_start = chunk.len();

            let sequence_number = channel.sequence_counter.next();
            let sequence_header = SequenceHeader {
                sequence_number,
                request_id,
            };
            sequence_header
                .encode(&mut chunk)
                .map_err(|e| Error::SecurityChecksFailed(e.to_string()))?;

            chunk.extend_from_slice(body);

            if is_encrypted {
                write_padding(&mut chunk, padding_size, padding_overhead);
            }

            if is_signed {
                let signature = delegate.sign_chunk(channel, &secrets, &chunk)?;
                if signature.len() != signature_size {
                    return Err(Error::InvalidGeometry(format!(
                        "signature length {} does not match expected size {}",
                        signature.len(),
                        signature_size
                    )));
                }
                chunk.extend_from_slice(&signature);
            }

            debug_assert_eq!(chunk.len() - plain_text_start, plain_text_content_size);

            if is_encrypted {
                log_buffer("plaintext region before encryption:", &chunk[plain_text_start..]);
                let cipher_text = delegate.encrypt(channel, &secrets, &chunk[plain_text_start..])?;
                chunk.truncate(plain_text_start);
                chunk.extend_from_slice(&cipher_text);
                log_buffer("ciphertext region after encryption:", &chunk[plain_text_start..]);
            }

            debug_assert_eq!(chunk.len(), total_chunk_size);
            chunks.push(chunk);

            offset += body_size;
            if !more_remains {
                break;
            }
        }

        Ok(chunks)
    }
}

/// Writes the `PaddingSize || PaddingBytes || ExtraPaddingSize` region per
/// §4.5.
fn write_padding(chunk: &mut Vec<u8>, padding_size: usize, padding_overhead: usize) {
    if padding_overhead == 0 {
        return;
    }
    let low_byte = (padding_size & 0xff) as u8;
    if padding_overhead == 1 {
        chunk.push(low_byte);
        chunk.extend(std::iter::repeat(low_byte).take(padding_size));
    } else {
        let high_byte = ((padding_size >> 8) & 0xff) as u8;
        chunk.push(low_byte);
        chunk.extend(std::iter::repeat(low_byte).take(padding_size));
        chunk.push(high_byte);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comms::chunk_header::MessageType;
    use crate::comms::secure_channel::{MessageSecurityMode, SymmetricKeys};
    use opcua_crypto::{AesKey, SecurityPolicy};

    fn symmetric_channel(policy: SecurityPolicy, mode: MessageSecurityMode) -> SecureChannel {
        let mut channel = SecureChannel::new_unsecured(7);
        channel.security_policy = policy;
        channel.security_mode = mode;
        channel.token_id = 1;
        if mode != MessageSecurityMode::None {
            let signing_key = vec![1u8; policy.symmetric_signature_size().max(1)];
            let encrypting_key = AesKey::new(policy, vec![2u8; 16]);
            let iv = vec![3u8; 16];
            channel.local_keys = Some(SymmetricKeys {
                signing_key,
                encrypting_key,
                iv,
            });
        }
        channel
    }

    #[test]
    fn scenario_s1_signed_unencrypted_single_chunk() {
        let mut channel = symmetric_channel(SecurityPolicy::Basic128Rsa15, MessageSecurityMode::Sign);
        let params = ChannelParameters {
            local_send_buffer_size: 8192,
            max_chunk_count: 0,
        };
        let payload = vec![0xABu8; 100];
        let chunks = ChunkEncoder::encode_symmetric(
            &mut channel,
            &params,
            MessageType::Message,
            &payload,
            1,
        )
        .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 144);
        assert_eq!(chunks[0][3], b'F');
    }

    #[test]
    fn scenario_s2_sign_and_encrypt_splits_into_two_chunks() {
        let mut channel =
            symmetric_channel(SecurityPolicy::Basic128Rsa15, MessageSecurityMode::SignAndEncrypt);
        let params = ChannelParameters {
            local_send_buffer_size: 8192,
            max_chunk_count: 0,
        };
        let payload = vec![0x11u8; 10000];
        let chunks = ChunkEncoder::encode_symmetric(
            &mut channel,
            &params,
            MessageType::Message,
            &payload,
            42,
        )
        .unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0][3], b'C');
        assert_eq!(chunks[1][3], b'F');
        for chunk in &chunks {
            assert!(chunk.len() <= 8192);
        }
    }

    #[test]
    fn sequence_numbers_increase_across_chunks() {
        let mut channel =
            symmetric_channel(SecurityPolicy::Basic128Rsa15, MessageSecurityMode::SignAndEncrypt);
        let params = ChannelParameters {
            local_send_buffer_size: 8192,
            max_chunk_count: 0,
        };
        let payload = vec![0x11u8; 10000];
        let chunks = ChunkEncoder::encode_symmetric(
            &mut channel,
            &params,
            MessageType::Message,
            &payload,
            1,
        )
        .unwrap();
        let seq = |c: &[u8]| u32::from_le_bytes([c[16], c[17], c[18], c[19]]);
        assert!(seq(&chunks[0]) < seq(&chunks[1]));
    }

    #[test]
    fn payload_too_large_is_rejected_before_building_chunks() {
        let mut channel =
            symmetric_channel(SecurityPolicy::Basic128Rsa15, MessageSecurityMode::SignAndEncrypt);
        let params = ChannelParameters {
            local_send_buffer_size: 8192,
            max_chunk_count: 1,
        };
        let payload = vec![0x11u8; 10000];
        let err = ChunkEncoder::encode_symmetric(
            &mut channel,
            &params,
            MessageType::Message,
            &payload,
            1,
        )
        .unwrap_err();
        assert!(matches!(err, Error::PayloadTooLarge(_)));
    }

    #[test]
    fn zero_length_payload_still_produces_one_chunk() {
        let mut channel = symmetric_channel(SecurityPolicy::Basic128Rsa15, MessageSecurityMode::Sign);
        let params = ChannelParameters {
            local_send_buffer_size: 8192,
            max_chunk_count: 0,
        };
        let chunks =
            ChunkEncoder::encode_symmetric(&mut channel, &params, MessageType::Message, &[], 1)
                .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0][3], b'F');
    }

    #[test]
    fn abort_chunk_is_marked_with_abort_flag() {
        let mut channel = symmetric_channel(SecurityPolicy::Basic128Rsa15, MessageSecurityMode::Sign);
        let params = ChannelParameters {
            local_send_buffer_size: 8192,
            max_chunk_count: 0,
        };
        let status_payload = 0x8001_0000u32.to_le_bytes();
        let chunks = ChunkEncoder::encode_abort(
            SecurityDelegate::Symmetric,
            &mut channel,
            &params,
            MessageType::Message,
            &status_payload,
            1,
        )
        .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0][3], b'A');
    }

    #[test]
    fn abort_during_asymmetric_open_secure_channel_phase_does_not_require_symmetric_keys() {
        let mut channel = SecureChannel::new_unsecured(9);
        channel.security_policy = SecurityPolicy::None;
        channel.security_mode = MessageSecurityMode::None;
        let params = ChannelParameters {
            local_send_buffer_size: 8192,
            max_chunk_count: 0,
        };
        let status_payload = 0x8004_0000u32.to_le_bytes();
        let chunks = ChunkEncoder::encode_abort(
            SecurityDelegate::Asymmetric,
            &mut channel,
            &params,
            MessageType::OpenSecureChannel,
            &status_payload,
            1,
        )
        .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(&chunks[0][0..3], b"OPN");
        assert_eq!(chunks[0][3], b'A');
    }

    #[test]
    fn unencrypted_unsigned_round_trips_through_plain_chunk() {
        let mut channel = symmetric_channel(SecurityPolicy::None, MessageSecurityMode::None);
        let params = ChannelParameters {
            local_send_buffer_size: 8192,
            max_chunk_count: 0,
        };
        let payload = b"hello world".to_vec();
        let chunks = ChunkEncoder::encode_symmetric(
            &mut channel,
            &params,
            MessageType::Message,
            &payload,
            1,
        )
        .unwrap();
        assert_eq!(chunks.len(), 1);
        let body_start = SECURE_MESSAGE_HEADER_SIZE + 4 + 8;
        assert_eq!(&chunks[0][body_start..body_start + payload.len()], &payload[..]);
    }
}
