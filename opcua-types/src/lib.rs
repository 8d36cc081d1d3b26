// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Minimal OPC-UA wire primitives shared by `opcua-crypto` and `opcua-core`.
//!
//! This is a deliberately small slice of the full OPC-UA type system: just
//! enough string/byte-string/status-code/error machinery for a secure
//! channel chunk encoder. Decoding, the `Variant` type system, and the
//! generated service request/response types are out of scope here.

pub mod byte_string;
pub mod encoding;
pub mod errors;
pub mod status_code;
pub mod string;

pub use byte_string::ByteString;
pub use encoding::{
    write_bytes, write_i32, write_slice, write_u16, write_u32, write_u64, write_u8,
    SimpleBinaryEncodable,
};
pub use errors::{EncodingResult, Error};
pub use status_code::StatusCode;
pub use string::UAString;
