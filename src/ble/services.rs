//! Measurement GATT Service
//!
//! One primary service with a single write+notify characteristic. Writes
//! to the characteristic value are routed into the session controller;
//! encoded record frames go back to the peer as notifications.

use core::cell::RefCell;

use defmt::{debug, info, warn};
use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};
use nrf_softdevice::ble::gatt_server::builder::ServiceBuilder;
use nrf_softdevice::ble::gatt_server::characteristic::{Attribute, Metadata, Properties};
use nrf_softdevice::ble::gatt_server::{self, RegisterError, WriteOp};
use nrf_softdevice::ble::{Connection, Uuid};
use nrf_softdevice::Softdevice;

use crate::ble::events::{write_flags, PeerId, TransportEvent, WriteResponse};
use crate::ble::session::{SessionController, SessionStats};
use crate::config::{PipelineConfig, BUFFER_CAPACITY, MEASUREMENT_CHAR_UUID, SERVICE_UUID};
use crate::core::transport::{receive_frame, FrameChannel};
use crate::inspection::RecordSink;

/// GATT server owning the measurement session
pub struct InspectionServer<S> {
    value_handle: u16,
    cccd_handle: u16,
    session: Mutex<CriticalSectionRawMutex, RefCell<SessionController<S>>>,
}

impl<S: RecordSink> InspectionServer<S> {
    /// Register the measurement service and create the session controller
    pub fn new(sd: &mut Softdevice, sink: S, config: PipelineConfig) -> Result<Self, RegisterError> {
        info!("Registering measurement service");

        let mut service = ServiceBuilder::new(sd, Uuid::new_128(&SERVICE_UUID))?;

        let attr = Attribute::new(&[] as &[u8]).variable_len(BUFFER_CAPACITY as u16);
        let metadata = Metadata::new(Properties::new().write().notify());
        let handles = service
            .add_characteristic(Uuid::new_128(&MEASUREMENT_CHAR_UUID), attr, metadata)?
            .build();
        let _service = service.build();

        info!(
            "Measurement characteristic: value handle {}, cccd handle {}",
            handles.value_handle, handles.cccd_handle
        );

        Ok(Self {
            value_handle: handles.value_handle,
            cccd_handle: handles.cccd_handle,
            session: Mutex::new(RefCell::new(SessionController::new(sink, config))),
        })
    }

    /// Feed one transport event to the session
    pub fn handle_event(&self, event: TransportEvent<'_>) -> Option<WriteResponse> {
        self.with_session(|session| session.handle_event(event))
    }

    /// Run `f` with exclusive access to the session
    pub fn with_session<R>(&self, f: impl FnOnce(&mut SessionController<S>) -> R) -> R {
        self.session.lock(|session| f(&mut session.borrow_mut()))
    }

    pub fn stats(&self) -> SessionStats {
        self.with_session(|session| session.stats())
    }

    /// Send queued record frames to `conn` as notifications
    ///
    /// Runs until the connection task drops it. Frames the peer has not
    /// subscribed to are dropped.
    pub async fn forward_frames(&self, conn: &Connection, channel: &FrameChannel) {
        loop {
            let frame = receive_frame(channel).await;
            match gatt_server::notify_value(conn, self.value_handle, frame.as_slice()) {
                Ok(()) => debug!("Notified {} byte frame", frame.len()),
                Err(e) => debug!("Frame not notified: {:?}", defmt::Debug2Format(&e)),
            }
        }
    }
}

impl<S: RecordSink> gatt_server::Server for InspectionServer<S> {
    type Event = WriteResponse;

    fn on_write(
        &self,
        conn: &Connection,
        handle: u16,
        op: WriteOp,
        offset: usize,
        data: &[u8],
    ) -> Option<Self::Event> {
        if handle == self.cccd_handle {
            debug!("CCCD write: {=[u8]:02x}", data);
            return None;
        }
        if handle != self.value_handle {
            debug!("Write to unknown handle {}", handle);
            return None;
        }

        let Some(peer) = PeerId::of(conn) else {
            warn!("Write on a connection that is already gone");
            return None;
        };

        // Offsets past u16 can never fit the buffer; saturate so the bounds check rejects them
        let offset = u16::try_from(offset).unwrap_or(u16::MAX);

        self.handle_event(TransportEvent::WriteRequest {
            peer,
            attribute: handle,
            offset,
            data,
            flags: write_flags(op),
        })
    }
}
