// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use std::io;

use crate::status_code::StatusCode;

/// An error carrying the OPC-UA status code it should be reported as.
///
/// Pairs every fallible wire operation with the status the far end would be
/// told about, rather than a bare string.
#[derive(Debug, thiserror::Error)]
#[error("{status}: {message}")]
pub struct Error {
    status: StatusCode,
    message: String,
}

impl Error {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::new(StatusCode::BadUnexpectedError, e.to_string())
    }
}

/// Result alias used throughout the encoding path.
pub type EncodingResult<T> = Result<T, Error>;
