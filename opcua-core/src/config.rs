// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Plain configuration structs. Loading them from a file (YAML, in the
//! surrounding server) is out of scope here; this crate only owns the types
//! that hold the already-loaded values.

/// Per-channel knobs the chunk encoder consults. Populated by whatever
/// negotiated the secure channel (Hello/Acknowledge, OpenSecureChannel).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelParameters {
    /// Maximum number of bytes the encoder will put in a single chunk,
    /// including all headers, padding, and signature.
    pub local_send_buffer_size: usize,
    /// Maximum number of chunks a single `encode` call may produce before it
    /// is rejected with `PayloadTooLarge`. `0` means unlimited.
    pub max_chunk_count: usize,
}

impl Default for ChannelParameters {
    fn default() -> Self {
        Self {
            local_send_buffer_size: 65535,
            max_chunk_count: 0,
        }
    }
}

/// Endpoint demultiplexer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointConfig {
    /// When `false`, a lookup miss falls back to the only registered server
    /// if exactly one is registered, regardless of the path it was reached
    /// under.
    pub strict_endpoint_urls: bool,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            strict_endpoint_urls: true,
        }
    }
}
