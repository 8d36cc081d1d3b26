// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use crate::encoding::{write_i32, write_slice, SimpleBinaryEncodable};
use crate::errors::EncodingResult;

/// An OPC-UA `String`: UTF-8 text with a distinguished null value, wire
/// encoded as `LE i32 length || utf8 bytes` with length `-1` for null.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UAString {
    value: Option<String>,
}

impl UAString {
    pub fn null() -> Self {
        Self { value: None }
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    pub fn as_str(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }

    pub fn len(&self) -> i32 {
        match &self.value {
            None => -1,
            Some(v) => v.len() as i32,
        }
    }
}

impl From<&str> for UAString {
    fn from(value: &str) -> Self {
        Self {
            value: Some(value.to_string()),
        }
    }
}

impl From<String> for UAString {
    fn from(value: String) -> Self {
        Self { value: Some(value) }
    }
}

impl SimpleBinaryEncodable for UAString {
    fn byte_len(&self) -> usize {
        4 + self.value.as_ref().map(|v| v.len()).unwrap_or(0)
    }

    fn encode(&self, stream: &mut dyn std::io::Write) -> EncodingResult<usize> {
        let mut size = write_i32(stream, self.len())?;
        if let Some(v) = &self.value {
            size += write_slice(stream, v.as_bytes())?;
        }
        Ok(size)
    }
}
