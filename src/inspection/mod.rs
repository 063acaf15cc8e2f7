//! Measurement Inspection
//!
//! Application layer of the firmware: classification of decoded
//! measurements, sequence tracking, the processed record and its sinks.

pub mod classifier;
pub mod record;
pub mod sequence;
pub mod sink;

pub use classifier::{classify, classify_with, Verdict};
pub use record::ProcessedRecord;
pub use sequence::{SequenceCheck, SequenceTracker};
pub use sink::{FrameSink, LogSink, RecordSink, Tee};
