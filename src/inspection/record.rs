//! Processed measurement record
//!
//! The pipeline's per-write output: decoded fields, derived dimensions,
//! the verdict and the sequence check.

use core::fmt::Write;

use defmt::Format;
use heapless::String;
use serde::{Deserialize, Serialize};

use crate::config::{Tolerances, COLOR_PLACEHOLDER};
use crate::core::protocol::MeasurementFields;
use crate::inspection::classifier::{classify_with, Verdict};
use crate::inspection::sequence::SequenceCheck;

/// Rendered log line, large enough for every field at its maximum width
pub type JsonLine = String<96>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Format, Serialize, Deserialize)]
pub struct ProcessedRecord {
    pub length_raw: u8,
    pub width_raw: u8,
    pub mass: u8,
    pub actual_length: u8,
    pub actual_width: u8,
    pub color: u8,
    pub verdict: Verdict,
    /// Bytes accepted from the write that produced this record
    pub accepted: u16,
    /// Present when the decoded bytes carried a sequence counter
    pub sequence: Option<SequenceCheck>,
}

impl ProcessedRecord {
    /// Classify decoded fields and assemble the record
    pub fn classify(
        fields: &MeasurementFields,
        tolerances: &Tolerances,
        accepted: u16,
        sequence: Option<SequenceCheck>,
    ) -> Self {
        let actual_length = fields.actual_length();
        let actual_width = fields.actual_width();

        Self {
            length_raw: fields.length_raw,
            width_raw: fields.width_raw,
            mass: fields.mass,
            actual_length,
            actual_width,
            color: COLOR_PLACEHOLDER,
            verdict: classify_with(tolerances, actual_length, actual_width),
            accepted,
            sequence,
        }
    }

    /// True if this record's sequence byte did not match the expected one
    pub fn sequence_gap(&self) -> bool {
        self.sequence.is_some_and(|check| check.is_gap())
    }

    /// Render the structured line `{"length": .., "width": .., "mass": .., "color": .., "defective": ..}`
    pub fn json_line(&self) -> Result<JsonLine, core::fmt::Error> {
        let mut line = JsonLine::new();
        write!(
            line,
            "{{\"length\": {}, \"width\": {}, \"mass\": {}, \"color\": {}, \"defective\": {}}}",
            self.actual_length,
            self.actual_width,
            self.mass,
            self.color,
            self.verdict.to_u8()
        )?;
        Ok(line)
    }
}
