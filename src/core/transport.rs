//! Outbound Frame Transport
//!
//! Bounded queue between the pipeline, which produces encoded record
//! frames inside a GATT write callback, and the connection task that
//! sends them to the peer as notifications.

use defmt::debug;
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};

use crate::core::memory::FramePacket;

/// Depth of the outbound frame queue
pub const FRAME_QUEUE_DEPTH: usize = 8;

/// Outbound frame queue
pub type FrameChannel = Channel<CriticalSectionRawMutex, FramePacket, FRAME_QUEUE_DEPTH>;

/// Channel for encoded frames (from the pipeline to the connection task)
pub static FRAME_CHANNEL: FrameChannel = Channel::new();

/// Transport errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum TransportError {
    /// Queue full, frame dropped
    QueueFull,
}

/// Enqueue a frame without waiting
pub fn try_send_frame(channel: &FrameChannel, frame: FramePacket) -> Result<(), TransportError> {
    channel.try_send(frame).map_err(|_| TransportError::QueueFull)?;
    debug!("Frame queued, {} pending", channel.len());
    Ok(())
}

/// Wait for the next frame
pub async fn receive_frame(channel: &FrameChannel) -> FramePacket {
    channel.receive().await
}

/// Try to take a frame (non-blocking)
pub fn try_receive_frame(channel: &FrameChannel) -> Option<FramePacket> {
    channel.try_receive().ok()
}

/// Drop every pending frame, e.g. when the peer goes away
pub fn discard_pending(channel: &FrameChannel) -> usize {
    let mut dropped = 0;
    while channel.try_receive().is_ok() {
        dropped += 1;
    }
    if dropped > 0 {
        debug!("Discarded {} pending frames", dropped);
    }
    dropped
}
