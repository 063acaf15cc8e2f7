#![no_std]
#![no_main]

use defmt::*;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::select::select;
use embassy_nrf::{config::Config, interrupt};
use embassy_time::{Duration, Timer};
use nrf_softdevice::ble::gatt_server;
use nrf_softdevice::{raw, Config as SdConfig, Softdevice};
use panic_probe as _;

use line_inspector_firmware::ble::advertising::advertise_until_connected;
use line_inspector_firmware::ble::connection::request_preferred_params;
use line_inspector_firmware::ble::events::{PeerId, TransportEvent, WriteResponse};
use line_inspector_firmware::ble::services::InspectionServer;
use line_inspector_firmware::config::{
    ConnectionParams, PipelineConfig, ADV_START_DELAY_MS, DEVICE_NAME, STACK_SETTLE_MS,
};
use line_inspector_firmware::core::transport::{discard_pending, FRAME_CHANNEL};
use line_inspector_firmware::inspection::{FrameSink, LogSink, Tee};

/// Records are logged and also queued as notification frames
type FirmwareSink = Tee<LogSink, FrameSink<'static>>;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Starting line inspector firmware");

    // Configure nRF peripherals
    let mut nrf_config = Config::default();
    // Configure interrupt priorities to avoid SoftDevice reserved levels (0, 1, 4)
    nrf_config.gpiote_interrupt_priority = interrupt::Priority::P2;
    nrf_config.time_interrupt_priority = interrupt::Priority::P2;

    let _peripherals = embassy_nrf::init(nrf_config);

    info!("Embassy initialized, configuring SoftDevice...");

    // Single peripheral link, long MTU for 512 byte characteristic writes
    let sd_config = SdConfig {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 247 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: DEVICE_NAME.as_ptr() as _,
            current_len: DEVICE_NAME.len() as u16,
            max_len: DEVICE_NAME.len() as u16,
            // All-zero security mode is "no access": peers cannot rename the device
            write_perm: unsafe { core::mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(raw::BLE_GATTS_VLOC_STACK as u8),
        }),
        ..Default::default()
    };

    let sd = Softdevice::enable(&sd_config);
    info!("SoftDevice enabled");

    let sink: FirmwareSink = Tee(LogSink, FrameSink::new(&FRAME_CHANNEL));
    let server = unwrap!(InspectionServer::new(sd, sink, PipelineConfig::default()));

    // Spawn SoftDevice task (CRITICAL!)
    unwrap!(spawner.spawn(softdevice_task(sd)));

    Timer::after(Duration::from_millis(STACK_SETTLE_MS)).await;
    info!("Bluetooth initialized");

    Timer::after(Duration::from_millis(ADV_START_DELAY_MS)).await;
    unwrap!(spawner.spawn(ble_task(sd, server)));
}

#[embassy_executor::task]
async fn ble_task(sd: &'static Softdevice, server: InspectionServer<FirmwareSink>) {
    loop {
        let conn = advertise_until_connected(sd).await;

        let Some(peer) = PeerId::of(&conn) else {
            warn!("Connection closed before it could be used");
            continue;
        };

        info!("Connected to {:?}", peer);
        discard_pending(&FRAME_CHANNEL);
        server.handle_event(TransportEvent::Connected { peer });

        // Run the GATT server on the connection. This returns when the connection gets disconnected.
        let gatt = gatt_server::run(&conn, &server, |response| {
            if let WriteResponse::Rejected(code) = response {
                debug!("Write rejected with ATT error {:#04x}", code);
            }
        });
        let link = async {
            request_preferred_params(&conn, ConnectionParams::default()).await;
            server.forward_frames(&conn, &FRAME_CHANNEL).await;
        };
        select(gatt, link).await;

        server.handle_event(TransportEvent::Disconnected { peer, reason: None });
        info!("Disconnected from {:?}", peer);
    }
}

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}
