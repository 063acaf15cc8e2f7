//! Session Controller
//!
//! Owns the state of the single connected peer: its identity, the
//! reassembly buffer and the sequence tracker. Every characteristic write
//! passes through `on_write`, which validates it, stores it, checks the
//! sequence counter, classifies the measurement and hands the resulting
//! record to the configured sink.
//!
//! The controller holds no global state; the GATT server owns one instance
//! and feeds it transport events.

use defmt::{debug, info, warn, Format};

use crate::ble::events::{
    PeerId, TransportEvent, WriteResponse, ATT_ERR_INVALID_ATTRIBUTE_LEN, ATT_ERR_INVALID_HANDLE,
    ATT_ERR_INVALID_OFFSET,
};
use crate::config::{ClassificationSource, PipelineConfig, RECORD_LEN};
use crate::core::memory::{BufferError, ReassemblyBuffer};
use crate::core::protocol::{DecodeError, MeasurementFields};
use crate::inspection::{ProcessedRecord, RecordSink, SequenceTracker};

/// Write rejection reasons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum SessionError {
    /// No active session, empty write, or write from another peer
    InvalidHandle,
    /// Write would end past the buffer capacity
    OffsetOverflow,
    /// Too few bytes to decode a measurement
    ShortRecord,
}

impl SessionError {
    /// ATT error code reported back to the peer
    pub fn att_error_code(self) -> u8 {
        match self {
            SessionError::InvalidHandle => ATT_ERR_INVALID_HANDLE,
            SessionError::OffsetOverflow => ATT_ERR_INVALID_OFFSET,
            SessionError::ShortRecord => ATT_ERR_INVALID_ATTRIBUTE_LEN,
        }
    }
}

impl From<BufferError> for SessionError {
    fn from(_: BufferError) -> Self {
        // Reassembly writes only fail on bounds
        SessionError::OffsetOverflow
    }
}

impl From<DecodeError> for SessionError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::ShortRecord => SessionError::ShortRecord,
        }
    }
}

/// Per-session counters, cleared on connect and disconnect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Format)]
pub struct SessionStats {
    pub accepted: u32,
    pub rejected: u32,
    pub defective: u32,
    pub sequence_gaps: u32,
}

/// Single-peer measurement session
pub struct SessionController<S, P = PeerId> {
    peer: Option<P>,
    buffer: ReassemblyBuffer,
    sequence: SequenceTracker,
    stats: SessionStats,
    config: PipelineConfig,
    sink: S,
}

impl<S: RecordSink, P: Copy + PartialEq + Format> SessionController<S, P> {
    pub fn new(sink: S, config: PipelineConfig) -> Self {
        Self {
            peer: None,
            buffer: ReassemblyBuffer::new(),
            sequence: SequenceTracker::new(),
            stats: SessionStats::default(),
            config,
            sink,
        }
    }

    /// Start a session with `peer`, replacing any previous one
    pub fn on_connect(&mut self, peer: P) {
        if let Some(previous) = self.peer.take() {
            debug!("SESSION: releasing previous peer {:?}", previous);
        }

        self.reset();
        self.peer = Some(peer);
        info!("SESSION: started for peer {:?}", peer);
    }

    /// End the active session
    ///
    /// The state is cleared whichever peer disconnected.
    pub fn on_disconnect(&mut self, peer: P, reason: Option<u8>) {
        match self.peer.take() {
            Some(active) if active != peer => {
                warn!(
                    "SESSION: disconnect from {:?} while {:?} is active, clearing anyway",
                    peer, active
                );
            }
            Some(_) => {}
            None => debug!("SESSION: disconnect from {:?} with no active session", peer),
        }

        info!(
            "SESSION: ended (reason {:?}), stats {:?}",
            reason, self.stats
        );
        self.reset();
    }

    /// Validate, store and classify one write
    ///
    /// Returns `Ok(None)` for a stored fragment that does not yet complete
    /// a reassembled record; such writes are neither emitted nor counted.
    pub fn on_write(
        &mut self,
        peer: P,
        offset: u16,
        data: &[u8],
    ) -> Result<Option<ProcessedRecord>, SessionError> {
        match self.process_write(peer, offset, data) {
            Ok(Some(record)) => {
                self.stats.accepted = self.stats.accepted.wrapping_add(1);
                if record.verdict.is_defective() {
                    self.stats.defective = self.stats.defective.wrapping_add(1);
                }
                if record.sequence_gap() {
                    self.stats.sequence_gaps = self.stats.sequence_gaps.wrapping_add(1);
                }
                self.sink.emit(&record);
                Ok(Some(record))
            }
            Ok(None) => {
                debug!(
                    "SESSION: {} bytes at offset {} stored, record incomplete",
                    data.len(),
                    offset
                );
                Ok(None)
            }
            Err(e) => {
                self.stats.rejected = self.stats.rejected.wrapping_add(1);
                warn!(
                    "SESSION: write rejected ({} bytes at offset {}): {:?}",
                    data.len(),
                    offset,
                    e
                );
                Err(e)
            }
        }
    }

    /// Dispatch a transport event; writes get a response
    pub fn handle_event(&mut self, event: TransportEvent<'_, P>) -> Option<WriteResponse> {
        match event {
            TransportEvent::Connected { peer } => {
                self.on_connect(peer);
                None
            }
            TransportEvent::Disconnected { peer, reason } => {
                self.on_disconnect(peer, reason);
                None
            }
            TransportEvent::WriteRequest {
                peer,
                attribute,
                offset,
                data,
                flags,
            } => {
                debug!(
                    "SESSION: write on attribute {}, {} bytes, flags {:#04x}",
                    attribute,
                    data.len(),
                    flags
                );
                let response = match self.on_write(peer, offset, data) {
                    Ok(Some(record)) => WriteResponse::Accepted(record.accepted),
                    // Bounded by the buffer capacity
                    Ok(None) => WriteResponse::Accepted(data.len() as u16),
                    Err(e) => WriteResponse::Rejected(e.att_error_code()),
                };
                Some(response)
            }
        }
    }

    fn process_write(
        &mut self,
        peer: P,
        offset: u16,
        data: &[u8],
    ) -> Result<Option<ProcessedRecord>, SessionError> {
        let active = self.peer.ok_or(SessionError::InvalidHandle)?;
        if data.is_empty() || active != peer {
            return Err(SessionError::InvalidHandle);
        }

        self.buffer.write(offset, data)?;
        // Bounded by the buffer capacity from here on
        let accepted = data.len() as u16;

        let fields = match self.config.classify_from {
            ClassificationSource::Fragment => MeasurementFields::decode(data)?,
            ClassificationSource::Reassembled => {
                let Some(record) = self.buffer.written_prefix(RECORD_LEN) else {
                    return Ok(None);
                };
                let fields = MeasurementFields::decode(record)?;
                // The next record has to arrive in full again
                self.buffer.release_prefix();
                fields
            }
        };

        let sequence = fields.sequence.map(|received| self.sequence.observe(received));

        Ok(Some(ProcessedRecord::classify(
            &fields,
            &self.config.tolerances,
            accepted,
            sequence,
        )))
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.sequence.reset();
        self.stats = SessionStats::default();
    }

    /// Peer of the active session
    pub fn active_peer(&self) -> Option<P> {
        self.peer
    }

    pub fn is_active(&self) -> bool {
        self.peer.is_some()
    }

    /// Valid prefix of the reassembly buffer
    pub fn buffer(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Full 32-bit expected sequence counter
    pub fn expected_sequence(&self) -> u32 {
        self.sequence.expected()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
