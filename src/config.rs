//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and protocol
//! constants live here so they can be tuned in one place.

// BLE

/// Advertised name of the display node. Eight characters keep flags,
/// name and one 128-bit service UUID inside a single 31-byte packet.
pub const DISPLAY_NODE_NAME: &str = "VoltDisp";

/// Advertised name of the voltmeter node.
pub const VOLTMETER_NODE_NAME: &str = "VoltMetr";

/// Primary service exposed by the display node.
pub const DISPLAY_SERVICE_UUID: u128 = 0x12345678_1234_1234_1234_123456789abc;

/// Primary service exposed by the voltmeter node.
pub const VOLTMETER_SERVICE_UUID: u128 = 0x87654321_4321_4321_4321_cba987654321;

/// Display node: current display contents (read, notify).
pub const DISPLAY_OUT_CHAR_UUID: u128 = 0x12345678_1234_1234_1234_123456789abd;

/// Voltage triple characteristic. Same UUID on both nodes: `voltage-in`
/// on the display node, `voltage-out` on the voltmeter node.
pub const VOLTAGE_CHAR_UUID: u128 = 0x87654321_4321_4321_4321_cba987654322;

/// Text command characteristic (both nodes).
pub const COMMAND_CHAR_UUID: u128 = 0x11111111_1111_1111_1111_111111111111;

/// Peripheral-role connections accepted at once.
pub const MAX_CONNECTIONS: usize = 3;

/// Central-role links (voltmeter → display node).
pub const MAX_CENTRAL_LINKS: usize = 1;

/// Largest attribute value we store or send (bytes).
pub const ATT_VALUE_MAX_LEN: usize = 64;

/// Advertising interval (in 0.625 ms units). 160 = 100 ms.
pub const BLE_ADV_INTERVAL: u32 = 160;

/// BLE connection interval range (in 1.25 ms units).
pub const BLE_CONN_INTERVAL_MIN: u16 = 24;
pub const BLE_CONN_INTERVAL_MAX: u16 = 40;

/// BLE slave latency (number of connection events the peripheral can skip).
pub const BLE_SLAVE_LATENCY: u16 = 0;

/// BLE supervision timeout (in 10 ms units). 400 = 4 s.
pub const BLE_SUP_TIMEOUT: u16 = 400;

/// Duration of one scan window when looking for the display node (seconds).
pub const BLE_SCAN_DURATION_SECS: u64 = 8;

/// Pause between scans while the display node is not found (seconds).
pub const BLE_RESCAN_INTERVAL_SECS: u64 = 30;

// Radio bring-up

/// Activation attempts before bring-up is declared failed.
pub const RADIO_ACTIVATION_ATTEMPTS: u8 = 5;

/// Base delay between activation attempts (ms).
pub const RADIO_ACTIVATION_DELAY_MS: u32 = 500;

// Display

/// Number of physical seven-segment displays.
pub const DISPLAY_COUNT: usize = 3;

/// Digit positions per display.
pub const DIGITS_PER_DISPLAY: usize = 4;

/// Total multiplexed positions.
pub const DIGIT_POSITIONS: usize = DISPLAY_COUNT * DIGITS_PER_DISPLAY;

/// Full refresh rate of each digit (Hz).
pub const MULTIPLEX_FREQUENCY_HZ: u32 = 200;

/// Rate of the multiplexing tick: every position once per refresh.
pub const MULTIPLEX_TICK_HZ: u32 = MULTIPLEX_FREQUENCY_HZ * DIGIT_POSITIONS as u32;

/// Dwell time of one self-test frame (ms).
pub const SELF_TEST_STEP_MS: u32 = 250;

// GPIO pin assignments (nRF52840-DK defaults)
//
// These are logical names; actual `embassy_nrf::peripherals::*` types are
// selected in `board.rs`.  Adjust for your custom PCB.
//
//   Segments a..g, dp     → P1.01 .. P1.08
//   Digit select 1..12    → P0.03, P0.04, P0.28 .. P0.31, P1.10 .. P1.15
//   Status LED            → P0.13 (LED1, active low)
//   ADC channel 0/1/2     → P0.02 (AIN0), P0.03 (AIN1), P0.04 (AIN2), voltmeter board

// Voltmeter

/// Analog channels sampled by the voltmeter node.
pub const ADC_CHANNEL_COUNT: usize = 3;

/// Full-scale raw reading (12-bit converter).
pub const ADC_MAX_RAW: u16 = 4095;

/// Voltage at full scale.
pub const ADC_REFERENCE_VOLTS: f32 = 3.3;

/// Moving-average window (samples).
pub const FILTER_WINDOW: usize = 10;

/// Sampling period (ms).
pub const READING_INTERVAL_MS: u64 = 500;

/// A conversion taking longer than this counts as a converter fault (ms).
pub const ADC_CONVERSION_TIMEOUT_MS: u64 = 50;

/// Default period for pushing readings to the display node (ms).
pub const SEND_INTERVAL_MS: u32 = 1000;

/// Shortest push period accepted over the command characteristic (ms).
pub const MIN_SEND_INTERVAL_MS: u32 = 100;

// Status / heartbeat

/// Status LED toggle period while at least one peer is linked (ms).
pub const HEARTBEAT_LINKED_MS: u64 = 1000;

/// Status LED toggle period while waiting for peers (ms).
pub const HEARTBEAT_IDLE_MS: u64 = 2000;

/// Status LED toggle period after a bring-up failure (ms).
pub const HEARTBEAT_FAULT_MS: u64 = 100;

/// Periodic status report, display node (seconds).
pub const DISPLAY_STATUS_INTERVAL_SECS: u64 = 10;

/// Periodic status report, voltmeter node (seconds).
pub const VOLTMETER_STATUS_INTERVAL_SECS: u64 = 15;

// Calibration storage

/// Flash page index where calibration storage starts (4 KB per page on nRF52840).
pub const STORAGE_FLASH_PAGE_START: u32 = 240;

/// Number of flash pages reserved for calibration storage.
pub const STORAGE_FLASH_PAGE_COUNT: u32 = 2;
