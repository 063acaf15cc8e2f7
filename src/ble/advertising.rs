//! Advertising
//!
//! Connectable undirected advertising of the measurement service.

use defmt::{error, info};
use embassy_time::{Duration, Timer};
use nrf_softdevice::ble::advertisement_builder::{
    Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload, ServiceList,
};
use nrf_softdevice::ble::peripheral::{self, ConnectableAdvertisement};
use nrf_softdevice::ble::Connection;
use nrf_softdevice::Softdevice;

use crate::config::{ADV_INTERVAL, DEVICE_NAME, SERVICE_UUID};

static ADV_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
    .services_128(ServiceList::Complete, &[SERVICE_UUID])
    .build();

static SCAN_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .full_name(DEVICE_NAME)
    .build();

/// Advertise until a central connects
///
/// Advertising failures are retried after one second.
pub async fn advertise_until_connected(sd: &Softdevice) -> Connection {
    loop {
        // Fresh config per attempt, as in the nrf-softdevice examples
        let config = peripheral::Config {
            interval: ADV_INTERVAL,
            ..Default::default()
        };

        let adv = ConnectableAdvertisement::ScannableUndirected {
            adv_data: &ADV_DATA,
            scan_data: &SCAN_DATA,
        };

        info!("Advertising started, waiting for connections...");
        match peripheral::advertise_connectable(sd, adv, &config).await {
            Ok(conn) => return conn,
            Err(e) => {
                error!("BLE advertising failed: {:?}", defmt::Debug2Format(&e));
                Timer::after(Duration::from_secs(1)).await;
            }
        }
    }
}
