//! Connection Management
//!
//! Requests the preferred connection parameters once a central connects.

use defmt::{debug, info, warn};
use embassy_time::{Duration, Timer};
use nrf_softdevice::ble::Connection;
use nrf_softdevice::raw;

use crate::config::{ConnectionParams, CONN_PARAM_UPDATE_DELAY_MS};

impl From<ConnectionParams> for raw::ble_gap_conn_params_t {
    fn from(params: ConnectionParams) -> Self {
        raw::ble_gap_conn_params_t {
            min_conn_interval: params.min_conn_interval,
            max_conn_interval: params.max_conn_interval,
            slave_latency: params.slave_latency,
            conn_sup_timeout: params.supervision_timeout,
        }
    }
}

/// Wait briefly, then ask the central for `params`
///
/// A refused update keeps the link on the central's parameters.
pub async fn request_preferred_params(conn: &Connection, params: ConnectionParams) {
    Timer::after(Duration::from_millis(CONN_PARAM_UPDATE_DELAY_MS)).await;

    debug!("CONNECTION: requesting params {:?}", params);
    match conn.set_conn_params(params.into()) {
        Ok(()) => info!(
            "CONNECTION: parameter update requested ({}-{} x 1.25ms, timeout {} x 10ms)",
            params.min_conn_interval, params.max_conn_interval, params.supervision_timeout
        ),
        Err(e) => warn!(
            "CONNECTION: failed to update connection parameters: {:?}",
            defmt::Debug2Format(&e)
        ),
    }
}
