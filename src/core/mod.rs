//! Core System Infrastructure
//!
//! Provides fundamental services that are not BLE-specific:
//! fixed-capacity buffers, the measurement wire format and the outbound
//! frame queue.

pub mod memory;
pub mod protocol;
pub mod transport;
