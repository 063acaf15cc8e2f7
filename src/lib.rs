#![no_std]

//! Line Inspector BLE Firmware Library
//!
//! Receives item measurements (length, width, mass) over a BLE
//! characteristic, reassembles them, tracks their sequence counter and
//! classifies each item as defective or acceptable.
//!
//! - `core`: System infrastructure (buffers, wire protocol, frame transport)
//! - `inspection`: Classification, sequence tracking, records and sinks
//! - `ble`: Session controller and the SoftDevice shell around it
//! - `config`: Constants and default settings

pub mod ble;
pub mod config;
pub mod core;
pub mod inspection;
