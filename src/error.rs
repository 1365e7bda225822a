//! Unified error types for voltlink.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.

use core::fmt;

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // BLE
    /// A call into the radio stack failed.
    Radio(RadioError),

    /// The GATT session refused an operation.
    Gatt(GattError),

    // Wire
    /// A payload received over the link could not be decoded.
    Decode(DecodeError),

    /// A text command could not be parsed.
    Command(CommandError),

    // Sampling
    /// Auto-calibration did not produce a usable factor.
    Calibration(CalibrationError),

    /// The analog sampler reported a fault.
    HardwareRead(HardwareReadFault),

    // Storage
    /// Flash read/write/erase failed.
    Storage,
}

/// Failures reported by the radio platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioError {
    /// Radio is off or could not be turned on.
    Unavailable,
    /// Peer has not enabled notifications on the characteristic.
    NotSubscribed,
    /// The platform rejected the call (raw platform error code).
    Rejected(u32),
}

/// Failures of the GATT session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GattError {
    /// The radio is not active, or a radio call failed.
    RadioUnavailable,
    /// Service registration was refused.
    ServiceRegistration(RegistrationError),
    /// The role's connection set is full.
    CapacityReached,
    /// No characteristic is registered under the requested key or handle.
    UnknownHandle,
    /// The central role has no ready link to write to.
    NoRemoteLink,
}

/// Why a service registration was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistrationError {
    /// The radio is not active.
    Inactive,
    /// A service or characteristic UUID is already registered.
    DuplicateUuid,
    /// The handle table has no room for more characteristics.
    TableFull,
    /// The radio platform rejected the service.
    Rejected(RadioError),
}

/// Malformed wire payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Binary payload has the wrong size.
    InvalidLength { expected: usize, actual: usize },
    /// Text payload is not valid UTF-8.
    InvalidUtf8,
    /// More comma-separated fields than the format allows.
    TooManyFields,
    /// A single field does not fit its buffer.
    FieldTooLong,
    /// A numeric field failed to parse.
    InvalidNumber,
    /// Text does not follow the expected layout.
    Malformed,
}

/// Command parsing failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// The payload does not match the verb's grammar.
    InvalidFormat,
    /// The payload parsed but a value is out of range.
    InvalidArgument,
    /// The verb is not recognised.
    UnknownCommand,
}

/// Auto-calibration failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// Measured voltage was zero; the prior factor was kept.
    CalibrationFailed,
    /// Channel index out of range.
    InvalidChannel,
}

/// The sampler could not produce a reading for `channel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HardwareReadFault {
    pub channel: u8,
}

// Convenience conversions

impl From<RadioError> for Error {
    fn from(e: RadioError) -> Self {
        Error::Radio(e)
    }
}

impl From<GattError> for Error {
    fn from(e: GattError) -> Self {
        Error::Gatt(e)
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Error::Decode(e)
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Error::Command(e)
    }
}

impl From<CalibrationError> for Error {
    fn from(e: CalibrationError) -> Self {
        Error::Calibration(e)
    }
}

impl From<HardwareReadFault> for Error {
    fn from(e: HardwareReadFault) -> Self {
        Error::HardwareRead(e)
    }
}

impl From<RadioError> for GattError {
    fn from(_: RadioError) -> Self {
        GattError::RadioUnavailable
    }
}

impl From<RegistrationError> for GattError {
    fn from(e: RegistrationError) -> Self {
        GattError::ServiceRegistration(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Radio(e) => write!(f, "radio: {:?}", e),
            Error::Gatt(e) => write!(f, "gatt: {:?}", e),
            Error::Decode(e) => write!(f, "decode: {:?}", e),
            Error::Command(e) => write!(f, "command: {:?}", e),
            Error::Calibration(e) => write!(f, "calibration: {:?}", e),
            Error::HardwareRead(e) => write!(f, "sampler fault on channel {}", e.channel),
            Error::Storage => f.write_str("storage"),
        }
    }
}
