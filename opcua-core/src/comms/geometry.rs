// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use crate::comms::security_header::SEQUENCE_HEADER_SIZE;
use crate::error::Error;

/// 1 byte of padding-length prefix when the cipher's ciphertext block is
/// small, 2 bytes (plus an "extra padding size" byte) when it's large enough
/// that a single byte can't express the padding length. See §4.5.
pub fn padding_overhead(is_encrypted: bool, cipher_text_block_size: usize) -> usize {
    if !is_encrypted {
        0
    } else if cipher_text_block_size > 256 {
        2
    } else {
        1
    }
}

/// Maximum payload bytes ("body") that fit in one chunk, given the fixed
/// header sizes and the delegate's block/signature sizes (§4.2).
///
/// Returns `None` (mapped by the caller to `InvalidConfiguration`) if the
/// send buffer is too small to fit even a zero-body chunk.
pub fn max_body_size(
    max_chunk_size: usize,
    header_sizes: usize,
    signature_size: usize,
    cipher_text_block_size: usize,
    plain_text_block_size: usize,
    is_encrypted: bool,
) -> Option<usize> {
    let overhead = padding_overhead(is_encrypted, cipher_text_block_size);
    let available = max_chunk_size
        .checked_sub(header_sizes)?
        .checked_sub(signature_size)?
        .checked_sub(overhead)?;
    let max_block_count = available / cipher_text_block_size;
    if max_block_count == 0 {
        return None;
    }
    let gross = plain_text_block_size * max_block_count;
    gross.checked_sub(SEQUENCE_HEADER_SIZE).filter(|&n| n > 0)
}

/// Bytes of padding needed so that `SequenceHeaderSize + bodySize +
/// signatureSize + paddingSize + paddingOverhead` is a multiple of
/// `plainTextBlockSize` (§4.2). Zero when unencrypted.
pub fn padding_size(
    body_size: usize,
    signature_size: usize,
    plain_text_block_size: usize,
    is_encrypted: bool,
    cipher_text_block_size: usize,
) -> usize {
    if !is_encrypted {
        return 0;
    }
    let overhead = padding_overhead(true, cipher_text_block_size);
    let used = SEQUENCE_HEADER_SIZE + body_size + signature_size + overhead;
    let remainder = used % plain_text_block_size;
    if remainder == 0 {
        0
    } else {
        plain_text_block_size - remainder
    }
}

/// Computes `plainTextContentSize` for a chunk and validates it divides
/// `plainTextBlockSize` exactly (§3 invariant), returning
/// `Error::InvalidGeometry` otherwise.
pub fn plain_text_content_size(
    body_size: usize,
    signature_size: usize,
    padding_size: usize,
    padding_overhead: usize,
    plain_text_block_size: usize,
) -> Result<usize, Error> {
    let size = SEQUENCE_HEADER_SIZE + body_size + signature_size + padding_size + padding_overhead;
    if size % plain_text_block_size != 0 {
        return Err(Error::InvalidGeometry(format!(
            "plaintext content size {size} is not a multiple of block size {plain_text_block_size}"
        )));
    }
    Ok(size)
}

/// Total on-wire chunk size: headers, plus the ciphertext produced from the
/// plaintext content (§3).
pub fn chunk_size(
    header_sizes: usize,
    plain_text_content_size: usize,
    plain_text_block_size: usize,
    cipher_text_block_size: usize,
) -> usize {
    header_sizes + (plain_text_content_size / plain_text_block_size) * cipher_text_block_size
}
