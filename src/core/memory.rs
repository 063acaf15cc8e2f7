//! Buffer Management
//!
//! This module provides the statically sized storage used by the pipeline:
//! - `ReassemblyBuffer`: bounded store that incoming fragments are written into
//! - `FramePacket`: record frames encoded straight into pooled buffers
//!
//! Nothing here allocates after initialization.

use atomic_pool::{pool, Box};
use defmt::Format;
use serde::{de::DeserializeOwned, Serialize};

use crate::config::BUFFER_CAPACITY;
use crate::core::protocol::{decode_frame, encode_frame_into, FrameError, CRC_LEN};

/// Outbound frame size: encoded record plus CRC trailer, with headroom
pub const FRAME_SIZE: usize = 32;

/// Number of frame buffers in the pool
pub const FRAME_POOL_SIZE: usize = 8;

// Frame buffer pool - 8 buffers of 32 bytes each (doc comment not supported on macros)
pool!(FramePool: [[u8; FRAME_SIZE]; FRAME_POOL_SIZE]);

/// Leading bytes of the reassembly buffer whose write coverage is tracked
pub const TRACKED_PREFIX: usize = 32;

/// Buffer errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum BufferError {
    /// Write would end past the buffer capacity
    OffsetOverflow,
}

/// Fixed-capacity store for fragments written at caller-supplied offsets
///
/// `valid_length` follows the last write: it is set to the end of every
/// accepted write, so a later write that ends earlier shrinks it.
///
/// Independently of `valid_length`, the buffer remembers which of its
/// first `TRACKED_PREFIX` bytes were written since the last `clear` or
/// `release_prefix`, so a record is only read back once all of its bytes
/// have arrived.
pub struct ReassemblyBuffer<const C: usize = BUFFER_CAPACITY> {
    data: [u8; C],
    valid_length: usize,
    written: u32,
}

/// Bit mask covering bytes `0..len` of the tracked prefix
const fn prefix_mask(len: usize) -> u32 {
    if len >= TRACKED_PREFIX {
        u32::MAX
    } else {
        (1u32 << len) - 1
    }
}

impl<const C: usize> ReassemblyBuffer<C> {
    /// Create an empty buffer
    pub const fn new() -> Self {
        Self {
            data: [0; C],
            valid_length: 0,
            written: 0,
        }
    }

    /// Buffer capacity in bytes
    pub const fn capacity(&self) -> usize {
        C
    }

    /// Check that a write of `len` bytes at `offset` fits
    fn check_bounds(&self, offset: u16, len: usize) -> Result<(), BufferError> {
        match (offset as usize).checked_add(len) {
            Some(end) if end <= C => Ok(()),
            _ => Err(BufferError::OffsetOverflow),
        }
    }

    /// Copy `data` in at `offset` and return the new valid length
    ///
    /// A rejected write leaves the buffer untouched.
    pub fn write(&mut self, offset: u16, data: &[u8]) -> Result<usize, BufferError> {
        self.check_bounds(offset, data.len())?;

        let start = offset as usize;
        let end = start + data.len();
        self.data[start..end].copy_from_slice(data);
        self.valid_length = end;
        self.written |= prefix_mask(end) & !prefix_mask(start);

        Ok(end)
    }

    /// Bytes written so far, up to the valid length
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.valid_length]
    }

    /// First `len` bytes, if every one of them was written since the last
    /// clear or release
    pub fn written_prefix(&self, len: usize) -> Option<&[u8]> {
        if len > TRACKED_PREFIX || len > C {
            return None;
        }
        let mask = prefix_mask(len);
        (self.written & mask == mask).then(|| &self.data[..len])
    }

    /// Forget which prefix bytes were written; contents stay in place
    pub fn release_prefix(&mut self) {
        self.written = 0;
    }

    /// Current valid length
    pub fn len(&self) -> usize {
        self.valid_length
    }

    /// Check if no bytes are valid
    pub fn is_empty(&self) -> bool {
        self.valid_length == 0
    }

    /// Discard the contents
    pub fn clear(&mut self) {
        self.data.fill(0);
        self.valid_length = 0;
        self.written = 0;
    }
}

impl<const C: usize> Default for ReassemblyBuffer<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// CRC-protected record frame held in a pooled buffer
///
/// The frame is encoded in place: postcard payload, then the big-endian
/// CRC trailer. Dropping the packet returns its buffer to the pool.
pub struct FramePacket {
    data: Box<FramePool>,
    len: usize,
}

impl FramePacket {
    /// Take a buffer from the pool and encode `value` into it
    pub fn encode<T: Serialize>(value: &T) -> Result<Self, FrameError> {
        let mut data = Box::<FramePool>::new([0; FRAME_SIZE]).ok_or(FrameError::PoolExhausted)?;
        let len = encode_frame_into(value, &mut data[..])?;

        Ok(Self { data, len })
    }

    /// Whole frame, trailer included
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Frame length on the wire
    pub fn len(&self) -> usize {
        self.len
    }

    /// Encoded payload without the trailer
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len - CRC_LEN]
    }

    /// CRC carried in the trailer
    pub fn crc(&self) -> u16 {
        u16::from_be_bytes([self.data[self.len - 2], self.data[self.len - 1]])
    }

    /// Verify the trailer and decode the payload
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, FrameError> {
        decode_frame(self.as_slice())
    }
}
