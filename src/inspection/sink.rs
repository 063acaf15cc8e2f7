//! Record Sinks
//!
//! Every classified write produces one `ProcessedRecord`, which the session
//! hands to a `RecordSink`. Sinks never fail the write: delivery problems
//! are logged and counted.

use defmt::{error, info, warn, Format};

use crate::core::memory::FramePacket;
use crate::core::protocol::FrameError;
use crate::core::transport::{try_send_frame, FrameChannel, TransportError};
use crate::inspection::record::ProcessedRecord;

/// Destination for processed records
pub trait RecordSink {
    fn emit(&mut self, record: &ProcessedRecord);
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn emit(&mut self, record: &ProcessedRecord) {
        (**self).emit(record)
    }
}

/// Logs each record as one structured line
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl RecordSink for LogSink {
    fn emit(&mut self, record: &ProcessedRecord) {
        match record.json_line() {
            Ok(line) => info!("{=str}", line.as_str()),
            Err(_) => error!("Record line overflow: {:?}", record),
        }
    }
}

/// Frame sink errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum SinkError {
    Frame(FrameError),
    Transport(TransportError),
}

impl From<FrameError> for SinkError {
    fn from(err: FrameError) -> Self {
        SinkError::Frame(err)
    }
}

impl From<TransportError> for SinkError {
    fn from(err: TransportError) -> Self {
        SinkError::Transport(err)
    }
}

/// Encodes records into CRC-protected frames and queues them for sending
pub struct FrameSink<'a> {
    channel: &'a FrameChannel,
    dropped: u32,
}

impl<'a> FrameSink<'a> {
    pub const fn new(channel: &'a FrameChannel) -> Self {
        Self { channel, dropped: 0 }
    }

    /// Encode one record and queue it
    pub fn forward(&self, record: &ProcessedRecord) -> Result<(), SinkError> {
        let packet = FramePacket::encode(record)?;
        try_send_frame(self.channel, packet)?;
        Ok(())
    }

    /// Frames dropped because encoding, the pool or the queue failed
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl RecordSink for FrameSink<'_> {
    fn emit(&mut self, record: &ProcessedRecord) {
        if let Err(e) = self.forward(record) {
            self.dropped = self.dropped.wrapping_add(1);
            warn!("Record frame dropped: {:?}", e);
        }
    }
}

/// Sends every record to two sinks, first `A` then `B`
pub struct Tee<A, B>(pub A, pub B);

impl<A: RecordSink, B: RecordSink> RecordSink for Tee<A, B> {
    fn emit(&mut self, record: &ProcessedRecord) {
        self.0.emit(record);
        self.1.emit(record);
    }
}
