//! Wire formats exchanged between the two nodes.
//!
//! Everything here is pure: no radio access, no allocation.
//!
//! - [`voltage`] - 12-byte float triple and its `V1:..` text variant.
//! - [`display`] - comma-joined display contents.
//! - [`advertising`] - AD structure building and parsing.
//! - [`uuid`] - 16/32/128-bit UUIDs.

pub mod advertising;
pub mod display;
pub mod uuid;
pub mod voltage;

pub use advertising::{build_advertising_payload, Advertisement};
pub use display::{
    decode_display_values, decode_display_values_or_blank, encode_display_values, DisplayValues,
    FieldText,
};
pub use uuid::Uuid;
pub use voltage::{
    decode_voltage_payload, decode_voltages, decode_voltages_or_zero, encode_voltage_text,
    encode_voltages, VOLTAGE_PAYLOAD_LEN,
};
