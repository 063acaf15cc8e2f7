//! Firmware Configuration
//!
//! Compile-time constants and default settings for the measurement
//! pipeline and the thin radio shell around it.

use defmt::Format;

// Measurement pipeline

/// Capacity of the reassembly buffer (maximum characteristic value length)
pub const BUFFER_CAPACITY: usize = 512;

/// Length of a full measurement record: length, width, mass, reserved, sequence
pub const RECORD_LEN: usize = 5;

/// Minimum bytes needed to decode length, width and mass
pub const MIN_RECORD_LEN: usize = 3;

/// Index of the sequence byte inside a record
pub const SEQUENCE_INDEX: usize = 4;

/// Raw dimensions are encoded as `DIMENSION_REFERENCE - actual`
pub const DIMENSION_REFERENCE: u8 = 51;

/// Color is not measured; every record carries this placeholder
pub const COLOR_PLACEHOLDER: u8 = 0xFF;

// Radio shell

/// Advertised device name (scan response)
pub const DEVICE_NAME: &str = "LineInspector";

/// Measurement service UUID 12345678-1234-5678-1234-56789abcdef0, little-endian
pub const SERVICE_UUID: [u8; 16] = 0x12345678_1234_5678_1234_56789abcdef0u128.to_le_bytes();

/// Measurement characteristic UUID 87654321-4321-8765-4321-56789abcdef0, little-endian
pub const MEASUREMENT_CHAR_UUID: [u8; 16] = 0x87654321_4321_8765_4321_56789abcdef0u128.to_le_bytes();

/// Advertising interval in 0.625ms units (1000ms)
pub const ADV_INTERVAL: u32 = 1600;

/// Delay after SoftDevice enable before advertising starts
pub const STACK_SETTLE_MS: u64 = 500;

/// Delay between stack settle and the first advertisement
pub const ADV_START_DELAY_MS: u64 = 100;

/// Delay after connecting before requesting preferred connection parameters
pub const CONN_PARAM_UPDATE_DELAY_MS: u64 = 100;

/// Inclusive tolerance band for one dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub struct ToleranceBand {
    pub min: u8,
    pub max: u8,
}

impl ToleranceBand {
    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    /// Check whether a value lies inside the band (bounds included)
    pub const fn contains(&self, value: u8) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Dimensional tolerances for an acceptable item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub struct Tolerances {
    pub length: ToleranceBand,
    pub width: ToleranceBand,
}

impl Tolerances {
    /// Product 1: length 12..=16, width 19..=23
    pub const PRODUCT_1: Tolerances = Tolerances {
        length: ToleranceBand::new(12, 16),
        width: ToleranceBand::new(19, 23),
    };
}

impl Default for Tolerances {
    fn default() -> Self {
        Self::PRODUCT_1
    }
}

/// Which bytes the decoder and sequence tracker look at after a write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Format)]
pub enum ClassificationSource {
    /// The bytes of the incoming write only
    #[default]
    Fragment,
    /// The valid prefix of the reassembly buffer
    Reassembled,
}

/// Pipeline configuration
#[derive(Debug, Clone, Copy, Default, Format)]
pub struct PipelineConfig {
    pub classify_from: ClassificationSource,
    pub tolerances: Tolerances,
}

/// Preferred connection parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub struct ConnectionParams {
    /// Minimum connection interval (units of 1.25ms)
    pub min_conn_interval: u16,
    /// Maximum connection interval (units of 1.25ms)
    pub max_conn_interval: u16,
    /// Slave latency
    pub slave_latency: u16,
    /// Supervision timeout (units of 10ms)
    pub supervision_timeout: u16,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            min_conn_interval: 0x0050, // 100ms
            max_conn_interval: 0x0070, // 140ms
            slave_latency: 0,
            supervision_timeout: 400, // 4s
        }
    }
}
