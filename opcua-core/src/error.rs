// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use opcua_types::StatusCode;

/// Errors the chunk encoder and endpoint demultiplexer can raise. Every
/// variant is propagated to the caller; none is silently swallowed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Computed `maxBodySize` was non-positive: the send buffer is too small
    /// for the configured security overhead.
    #[error("invalid channel configuration: {0}")]
    InvalidConfiguration(String),

    /// `plainTextContentSize` was not divisible by `plainTextBlockSize`; a
    /// contract violation in the geometry computation, never the wire.
    #[error("invalid chunk geometry: {0}")]
    InvalidGeometry(String),

    /// A cryptographic primitive (cipher init, sign, encrypt) failed.
    #[error("security checks failed: {0}")]
    SecurityChecksFailed(String),

    /// The projected chunk count for a message exceeded `max_chunk_count`.
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// `EndpointDemultiplexer::lookup` found no registered server.
    #[error("endpoint url invalid: {0}")]
    EndpointUrlInvalid(String),

    /// The 64-bit request-id counter wrapped (practically unreachable).
    #[error("request id counter exhausted")]
    RequestIdExhausted,
}

impl Error {
    /// The OPC-UA status a caller should close the channel/connection with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidConfiguration(_) => StatusCode::BadSecurityChecksFailed,
            Error::InvalidGeometry(_) => StatusCode::BadEncodingLimitsExceeded,
            Error::SecurityChecksFailed(_) => StatusCode::BadSecurityChecksFailed,
            Error::PayloadTooLarge(_) => StatusCode::BadRequestTooLarge,
            Error::EndpointUrlInvalid(_) => StatusCode::BadTcpEndpointUrlInvalid,
            Error::RequestIdExhausted => StatusCode::BadSecurityChecksFailed,
        }
    }
}

impl From<opcua_types::Error> for Error {
    fn from(e: opcua_types::Error) -> Self {
        Error::SecurityChecksFailed(e.to_string())
    }
}
