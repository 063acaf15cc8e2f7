//! BLE Integration
//!
//! Thin shell around the SoftDevice: advertising, connection parameter
//! requests and the measurement GATT service, plus the session
//! controller that turns transport events into processed records.

pub mod advertising;
pub mod connection;
pub mod events;
pub mod services;
pub mod session;
