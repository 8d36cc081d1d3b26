// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use crate::encoding::{write_i32, write_slice, SimpleBinaryEncodable};
use crate::errors::EncodingResult;

/// An OPC-UA `ByteString`: an opaque byte buffer with a distinguished null
/// value, wire-encoded as `LE i32 length || bytes` with length `-1` for null.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ByteString {
    pub value: Option<Vec<u8>>,
}

impl ByteString {
    pub fn null() -> Self {
        Self { value: None }
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    pub fn len(&self) -> i32 {
        match &self.value {
            None => -1,
            Some(v) => v.len() as i32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.as_ref().map(|v| v.is_empty()).unwrap_or(true)
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(value: Vec<u8>) -> Self {
        Self { value: Some(value) }
    }
}

impl From<&[u8]> for ByteString {
    fn from(value: &[u8]) -> Self {
        Self {
            value: Some(value.to_vec()),
        }
    }
}

impl AsRef<[u8]> for ByteString {
    fn as_ref(&self) -> &[u8] {
        self.value.as_deref().unwrap_or(&[])
    }
}

impl SimpleBinaryEncodable for ByteString {
    fn byte_len(&self) -> usize {
        4 + self.value.as_ref().map(|v| v.len()).unwrap_or(0)
    }

    fn encode(&self, stream: &mut dyn std::io::Write) -> EncodingResult<usize> {
        let mut size = write_i32(stream, self.len())?;
        if let Some(v) = &self.value {
            size += write_slice(stream, v)?;
        }
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_byte_string_has_length_minus_one() {
        let bs = ByteString::null();
        assert_eq!(bs.len(), -1);
        assert_eq!(bs.byte_len(), 4);
    }

    #[test]
    fn encode_writes_length_prefix_then_bytes() {
        let bs = ByteString::from(vec![1u8, 2, 3]);
        let mut out = Vec::new();
        let n = bs.encode(&mut out).unwrap();
        assert_eq!(n, 7);
        assert_eq!(out, vec![3, 0, 0, 0, 1, 2, 3]);
    }
}
