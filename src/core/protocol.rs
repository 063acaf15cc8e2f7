//! Measurement Wire Protocol
//!
//! Inbound record layout (one characteristic write):
//! - `[0]` length, raw (`51 - actual`)
//! - `[1]` width, raw (`51 - actual`)
//! - `[2]` mass
//! - `[3]` reserved
//! - `[4]` sequence number, present only in writes of 5 bytes or more
//!
//! Outbound frame layout: `[postcard payload] [CRC-16 (2 bytes, big-endian)]`

use crc::{Crc, CRC_16_IBM_3740};
use defmt::Format;
use serde::{de::DeserializeOwned, Serialize};

use crate::config::{DIMENSION_REFERENCE, MIN_RECORD_LEN, SEQUENCE_INDEX};

/// CRC-16/CCITT-FALSE, used for the frame trailer
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Byte index of the raw length field
pub const LENGTH_INDEX: usize = 0;
/// Byte index of the raw width field
pub const WIDTH_INDEX: usize = 1;
/// Byte index of the mass field
pub const MASS_INDEX: usize = 2;

/// Length of the CRC trailer
pub const CRC_LEN: usize = 2;

/// Decoder errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum DecodeError {
    /// Fewer bytes than needed for length, width and mass
    ShortRecord,
}

/// Frame codec errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum FrameError {
    /// postcard could not encode or decode the payload
    Serialization,
    /// Frame shorter than the CRC trailer
    Truncated,
    /// CRC trailer does not match the payload
    Crc,
    /// No frame buffers left in the pool
    PoolExhausted,
}

impl From<postcard::Error> for FrameError {
    fn from(_: postcard::Error) -> Self {
        FrameError::Serialization
    }
}

/// Raw fields of one measurement record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub struct MeasurementFields {
    pub length_raw: u8,
    pub width_raw: u8,
    pub mass: u8,
    pub sequence: Option<u8>,
}

impl MeasurementFields {
    /// Decode a record from the front of `data`
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < MIN_RECORD_LEN {
            return Err(DecodeError::ShortRecord);
        }

        Ok(Self {
            length_raw: data[LENGTH_INDEX],
            width_raw: data[WIDTH_INDEX],
            mass: data[MASS_INDEX],
            sequence: sequence_byte(data),
        })
    }

    /// Physical length; wraps for raw values above the reference
    pub fn actual_length(&self) -> u8 {
        actual_dimension(self.length_raw)
    }

    /// Physical width; wraps for raw values above the reference
    pub fn actual_width(&self) -> u8 {
        actual_dimension(self.width_raw)
    }
}

/// Convert a raw dimension byte into the physical value
pub const fn actual_dimension(raw: u8) -> u8 {
    DIMENSION_REFERENCE.wrapping_sub(raw)
}

/// Sequence byte of a record, if the write is long enough to carry one
pub fn sequence_byte(data: &[u8]) -> Option<u8> {
    data.get(SEQUENCE_INDEX).copied()
}

/// Calculate the frame CRC over `data`
pub fn calculate_crc16(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

/// Check `data` against an expected CRC
pub fn validate_crc16(data: &[u8], expected: u16) -> bool {
    calculate_crc16(data) == expected
}

/// Encode `value` into `buf` followed by the CRC trailer
///
/// Returns the frame length.
pub fn encode_frame_into<T: Serialize>(value: &T, buf: &mut [u8]) -> Result<usize, FrameError> {
    let Some(capacity) = buf.len().checked_sub(CRC_LEN) else {
        return Err(FrameError::Truncated);
    };
    let payload_len = postcard::to_slice(value, &mut buf[..capacity])?.len();

    let crc = calculate_crc16(&buf[..payload_len]);
    buf[payload_len..payload_len + CRC_LEN].copy_from_slice(&crc.to_be_bytes());

    Ok(payload_len + CRC_LEN)
}

/// Verify the CRC trailer and decode the payload
pub fn decode_frame<T: DeserializeOwned>(frame: &[u8]) -> Result<T, FrameError> {
    if frame.len() < CRC_LEN {
        return Err(FrameError::Truncated);
    }

    let (payload, trailer) = frame.split_at(frame.len() - CRC_LEN);
    let crc = u16::from_be_bytes([trailer[0], trailer[1]]);
    if !validate_crc16(payload, crc) {
        return Err(FrameError::Crc);
    }

    Ok(postcard::from_bytes(payload)?)
}
