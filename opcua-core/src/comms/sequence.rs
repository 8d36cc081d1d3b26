// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use crate::error::Error;

/// Last valid sequence number before wrap; the final 1024 values of the u32
/// space are skipped so a receiver can always tell a wrapped value apart
/// from a corrupted one.
const SEQUENCE_NUMBER_WRAP_AT: u32 = 4_294_966_271;

/// Monotonic 32-bit sequence number with the OPC-UA wrap rule: cycles
/// through `[1, 4294966271]`, never emitting the last 1024 values of the u32
/// space.
#[derive(Debug, Clone, Copy)]
pub struct SequenceCounter {
    next: u32,
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the counter at a specific value, for tests that exercise the
    /// wrap boundary directly (scenario S4).
    pub fn starting_at(value: u32) -> Self {
        Self { next: value }
    }

    /// Returns the current value and advances, wrapping from
    /// `SEQUENCE_NUMBER_WRAP_AT` back to `1`.
    pub fn next(&mut self) -> u32 {
        let value = self.next;
        self.next = if value >= SEQUENCE_NUMBER_WRAP_AT {
            1
        } else {
            value + 1
        };
        value
    }
}

/// 64-bit monotonic request-id counter. Starts at 1; wrap is treated as a
/// fatal, typed error rather than silently truncating onto the wire.
#[derive(Debug, Clone, Copy)]
pub struct RequestIdGenerator {
    next: u64,
}

impl Default for RequestIdGenerator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl RequestIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self) -> Result<u32, Error> {
        if self.next > u32::MAX as u64 {
            return Err(Error::RequestIdExhausted);
        }
        let value = self.next as u32;
        self.next += 1;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_one() {
        let mut counter = SequenceCounter::new();
        assert_eq!(counter.next(), 1);
        assert_eq!(counter.next(), 2);
    }

    #[test]
    fn wraps_from_max_back_to_one() {
        // Scenario S4.
        let mut counter = SequenceCounter::starting_at(4_294_966_270);
        assert_eq!(counter.next(), 4_294_966_270);
        assert_eq!(counter.next(), 4_294_966_271);
        assert_eq!(counter.next(), 1);
    }

    #[test]
    fn request_id_starts_at_one_and_increments() {
        let mut gen = RequestIdGenerator::new();
        assert_eq!(gen.next().unwrap(), 1);
        assert_eq!(gen.next().unwrap(), 2);
    }

    #[test]
    fn request_id_exhaustion_is_a_typed_error() {
        let mut gen = RequestIdGenerator {
            next: u32::MAX as u64 + 1,
        };
        assert!(matches!(gen.next(), Err(Error::RequestIdExhausted)));
    }
}
