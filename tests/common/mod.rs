//! Common test utilities and setup for embedded tests
//!
//! This module provides shared functionality for all defmt-test based tests:
//! - Critical section implementation
//! - Common imports
//! - Test helpers (record builders, capture sink)

// Re-export commonly used items for tests (except conflicting macros)
pub use defmt_rtt as _; // global logger
// Also need the same embassy dependencies as the main firmware
pub use embassy_executor as _;
// Use nrf-softdevice which provides both interrupt vectors and critical section
pub use nrf_softdevice as _;
pub use panic_probe as _; // panic handler
pub use {embassy_nrf as _, embassy_sync as _, embassy_time as _};

// Global allocator for proptest (required for alloc feature in no_std)
pub extern crate alloc;
#[allow(unused)]
pub use alloc::vec;
use core::sync::atomic::{AtomicBool, Ordering};

pub use defmt::info;
pub use embedded_alloc::LlffHeap as Heap;

use line_inspector_firmware::ble::events::PeerId;
use line_inspector_firmware::inspection::{ProcessedRecord, RecordSink};

#[global_allocator]
pub static HEAP: Heap = Heap::empty();

// Define the global allocator backing store - 8KB heap for proptest
pub static mut HEAP_MEM: [u8; 8192] = [0; 8192];

// Global flag to ensure heap is only initialized once
static HEAP_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Ensure heap is initialized exactly once (thread-safe)
pub fn ensure_heap_initialized() {
    if !HEAP_INITIALIZED.swap(true, Ordering::Relaxed) {
        unsafe {
            let ptr = core::ptr::addr_of_mut!(HEAP_MEM) as usize;
            HEAP.init(ptr, 8192);
        }
    }
}

pub fn log_test_start(name: &str) {
    defmt::info!("TEST START: {=str}", name);
}

pub fn log_test_pass(name: &str) {
    defmt::info!("TEST PASS: {=str}", name);
}

/// Test helper to create test data arrays
pub fn create_test_data(size: usize, pattern: u8) -> heapless::Vec<u8, 512> {
    let mut data = heapless::Vec::new();
    for i in 0..size {
        data.push(pattern.wrapping_add(i as u8)).unwrap();
    }
    data
}

/// Full five byte record: length, width, mass, reserved, sequence
pub fn record_bytes(length_raw: u8, width_raw: u8, mass: u8, sequence: u8) -> [u8; 5] {
    [length_raw, width_raw, mass, 0, sequence]
}

pub const PEER_A: PeerId = PeerId(1);
pub const PEER_B: PeerId = PeerId(2);

/// Sink that keeps every emitted record
#[derive(Default)]
pub struct CaptureSink {
    pub records: heapless::Vec<ProcessedRecord, 32>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&ProcessedRecord> {
        self.records.last()
    }
}

impl RecordSink for CaptureSink {
    fn emit(&mut self, record: &ProcessedRecord) {
        // Oldest records are dropped once full
        if self.records.is_full() {
            self.records.remove(0);
        }
        let _ = self.records.push(*record);
    }
}

/// Test helper to compare byte arrays
pub fn arrays_equal(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
}
