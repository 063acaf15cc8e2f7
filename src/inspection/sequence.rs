//! Sequence Tracker
//!
//! Each full record carries an 8-bit counter. The tracker keeps a 32-bit
//! expected count and compares its low byte with the received counter.
//! A mismatch is reported but never rejects the record. The expected count
//! advances on every observation and follows the stream across a gap, so
//! one skipped counter is reported once.

use defmt::{warn, Format};
use serde::{Deserialize, Serialize};

/// Result of checking one sequence byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format, Serialize, Deserialize)]
pub struct SequenceCheck {
    pub expected: u8,
    pub received: u8,
}

impl SequenceCheck {
    /// True when the received counter is not the expected one
    pub fn is_gap(&self) -> bool {
        self.expected != self.received
    }

    /// Counters missing between the expected and the received one, modulo 256
    pub fn skipped(&self) -> u8 {
        self.received.wrapping_sub(self.expected)
    }
}

/// Expected-counter state for one session
#[derive(Debug, Default, Format)]
pub struct SequenceTracker {
    expected: u32,
    gaps: u32,
}

impl SequenceTracker {
    pub const fn new() -> Self {
        Self { expected: 0, gaps: 0 }
    }

    /// Compare `received` with the expected counter, then advance past it
    pub fn observe(&mut self, received: u8) -> SequenceCheck {
        let check = SequenceCheck {
            expected: (self.expected & 0xFF) as u8,
            received,
        };

        if check.is_gap() {
            self.gaps = self.gaps.wrapping_add(1);
            warn!(
                "Sequence gap: expected {}, got {} ({} skipped)",
                check.expected,
                check.received,
                check.skipped()
            );
            self.expected = self.expected.wrapping_add(check.skipped() as u32);
        }

        self.expected = self.expected.wrapping_add(1);
        check
    }

    /// Full 32-bit expected counter
    pub fn expected(&self) -> u32 {
        self.expected
    }

    /// Number of gaps seen since the last reset
    pub fn gaps(&self) -> u32 {
        self.gaps
    }

    pub fn reset(&mut self) {
        self.expected = 0;
        self.gaps = 0;
    }
}
