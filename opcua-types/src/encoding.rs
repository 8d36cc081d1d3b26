// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::errors::{EncodingResult, Error};
use crate::status_code::StatusCode;

fn map_io_err(e: std::io::Error) -> Error {
    Error::new(StatusCode::BadEncodingLimitsExceeded, e.to_string())
}

/// Writes `value` repeated `count` times, e.g. padding bytes.
pub fn write_bytes(stream: &mut dyn Write, value: u8, count: usize) -> EncodingResult<usize> {
    for _ in 0..count {
        stream.write_u8(value).map_err(map_io_err)?;
    }
    Ok(count)
}

pub fn write_u8(stream: &mut dyn Write, value: u8) -> EncodingResult<usize> {
    stream.write_u8(value).map_err(map_io_err)?;
    Ok(1)
}

pub fn write_u16(stream: &mut dyn Write, value: u16) -> EncodingResult<usize> {
    stream.write_u16::<LittleEndian>(value).map_err(map_io_err)?;
    Ok(2)
}

pub fn write_u32(stream: &mut dyn Write, value: u32) -> EncodingResult<usize> {
    stream.write_u32::<LittleEndian>(value).map_err(map_io_err)?;
    Ok(4)
}

pub fn write_i32(stream: &mut dyn Write, value: i32) -> EncodingResult<usize> {
    stream.write_i32::<LittleEndian>(value).map_err(map_io_err)?;
    Ok(4)
}

pub fn write_u64(stream: &mut dyn Write, value: u64) -> EncodingResult<usize> {
    stream.write_u64::<LittleEndian>(value).map_err(map_io_err)?;
    Ok(8)
}

/// Writes a raw byte slice and returns the number of bytes written.
pub fn write_slice(stream: &mut dyn Write, bytes: &[u8]) -> EncodingResult<usize> {
    stream.write_all(bytes).map_err(map_io_err)?;
    Ok(bytes.len())
}

/// Implemented by the fixed-layout wire types this crate encodes (headers,
/// strings, byte strings). There is no matching decode trait: decoding a
/// chunk stream back into structured headers is outside this crate's scope.
pub trait SimpleBinaryEncodable {
    /// Exact number of bytes `encode` will write.
    fn byte_len(&self) -> usize;

    fn encode(&self, stream: &mut dyn Write) -> EncodingResult<usize>;
}
