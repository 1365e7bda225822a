//! Voltage triple payloads.
//!
//! Binary form (12 bytes):
//! ```text
//! Byte 0..4:  channel 0, f32 little-endian
//! Byte 4..8:  channel 1, f32 little-endian
//! Byte 8..12: channel 2, f32 little-endian
//! ```
//!
//! Text form: `V1:1.23,V2:0.00,V3:3.30`.

use core::fmt::Write;

use heapless::String;

use crate::error::DecodeError;

/// Size of the binary voltage payload.
pub const VOLTAGE_PAYLOAD_LEN: usize = 12;

/// Capacity of the text voltage payload.
pub const VOLTAGE_TEXT_MAX_LEN: usize = 48;

/// Text voltage payload.
pub type VoltageText = String<VOLTAGE_TEXT_MAX_LEN>;

/// Encode three voltages as the fixed 12-byte little-endian triple.
pub fn encode_voltages(voltages: [f32; 3]) -> [u8; VOLTAGE_PAYLOAD_LEN] {
    let mut out = [0u8; VOLTAGE_PAYLOAD_LEN];
    for (chunk, v) in out.chunks_exact_mut(4).zip(voltages) {
        chunk.copy_from_slice(&v.to_le_bytes());
    }
    out
}

/// Decode the 12-byte little-endian triple.
pub fn decode_voltages(bytes: &[u8]) -> Result<[f32; 3], DecodeError> {
    if bytes.len() != VOLTAGE_PAYLOAD_LEN {
        return Err(DecodeError::InvalidLength {
            expected: VOLTAGE_PAYLOAD_LEN,
            actual: bytes.len(),
        });
    }
    let mut out = [0.0f32; 3];
    for (v, chunk) in out.iter_mut().zip(bytes.chunks_exact(4)) {
        *v = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    Ok(out)
}

/// Decode the binary triple, substituting zeros for a malformed payload.
pub fn decode_voltages_or_zero(bytes: &[u8]) -> [f32; 3] {
    match decode_voltages(bytes) {
        Ok(v) => v,
        Err(e) => {
            warn!("voltage payload rejected: {}", e);
            [0.0; 3]
        }
    }
}

/// Render the `V1:x.xx,V2:x.xx,V3:x.xx` text variant.
pub fn encode_voltage_text(voltages: [f32; 3]) -> VoltageText {
    let mut s = VoltageText::new();
    // Values outside the sensor range may overflow the buffer; what fits is kept.
    let _ = write!(
        s,
        "V1:{:.2},V2:{:.2},V3:{:.2}",
        voltages[0], voltages[1], voltages[2]
    );
    s
}

/// Parse the text variant. Labels must be `V1`, `V2`, `V3` in order.
pub fn decode_voltage_text(bytes: &[u8]) -> Result<[f32; 3], DecodeError> {
    let text = core::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)?;
    let mut out = [0.0f32; 3];
    let mut fields = text.trim().split(',');

    for (i, slot) in out.iter_mut().enumerate() {
        let field = fields.next().ok_or(DecodeError::Malformed)?;
        let (label, value) = field.split_once(':').ok_or(DecodeError::Malformed)?;
        let expected = [b'V', b'1' + i as u8];
        if label.trim().as_bytes() != expected {
            return Err(DecodeError::Malformed);
        }
        *slot = parse_finite(value)?;
    }

    if fields.next().is_some() {
        return Err(DecodeError::TooManyFields);
    }
    Ok(out)
}

/// Accept either wire form. Twelve bytes are always the binary triple;
/// the shortest valid text payload is longer than that.
pub fn decode_voltage_payload(bytes: &[u8]) -> Result<[f32; 3], DecodeError> {
    if bytes.len() == VOLTAGE_PAYLOAD_LEN {
        decode_voltages(bytes)
    } else if bytes.starts_with(b"V1:") {
        decode_voltage_text(bytes)
    } else {
        Err(DecodeError::InvalidLength {
            expected: VOLTAGE_PAYLOAD_LEN,
            actual: bytes.len(),
        })
    }
}

/// Parse a float, rejecting NaN and infinities.
pub(crate) fn parse_finite(field: &str) -> Result<f32, DecodeError> {
    let v: f32 = field
        .trim()
        .parse()
        .map_err(|_| DecodeError::InvalidNumber)?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(DecodeError::InvalidNumber)
    }
}
