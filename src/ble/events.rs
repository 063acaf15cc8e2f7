//! Transport Event Boundary
//!
//! The BLE stack reports connection lifecycle and characteristic writes
//! as `TransportEvent`s. The session controller consumes them and answers
//! every write with a `WriteResponse`.
//!
//! Based on nrf-softdevice patterns, events originate from:
//! - Connection events from peripheral::advertise_connectable()
//! - GATT server write callbacks from gatt_server::run()

use defmt::Format;
use nrf_softdevice::ble::gatt_server::WriteOp;
use nrf_softdevice::ble::Connection;

/// ATT error: invalid attribute handle
pub const ATT_ERR_INVALID_HANDLE: u8 = 0x01;
/// ATT error: offset past the end of the attribute
pub const ATT_ERR_INVALID_OFFSET: u8 = 0x07;
/// ATT error: invalid attribute value length
pub const ATT_ERR_INVALID_ATTRIBUTE_LEN: u8 = 0x0D;

/// Write flag: write without response
pub const WRITE_FLAG_CMD: u8 = 0x02;

/// Identity of a connected peer (the SoftDevice connection handle)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub struct PeerId(pub u16);

impl PeerId {
    /// Identity of a live connection; `None` once the link is gone
    pub fn of(conn: &Connection) -> Option<Self> {
        conn.handle().map(PeerId)
    }
}

/// Events delivered by the transport
#[derive(Debug, Clone, Copy, Format)]
pub enum TransportEvent<'a, P = PeerId> {
    Connected {
        peer: P,
    },
    Disconnected {
        peer: P,
        /// HCI reason, when the stack reports one
        reason: Option<u8>,
    },
    WriteRequest {
        peer: P,
        attribute: u16,
        offset: u16,
        data: &'a [u8],
        flags: u8,
    },
}

/// Answer to a write request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum WriteResponse {
    /// Number of bytes written
    Accepted(u16),
    /// ATT error code
    Rejected(u8),
}

/// Translate a SoftDevice write operation into write flags
pub fn write_flags(op: WriteOp) -> u8 {
    match op {
        WriteOp::Command => WRITE_FLAG_CMD,
        _ => 0,
    }
}
