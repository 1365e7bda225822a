//! Display contents payload: three UTF-8 fields joined by commas.

use heapless::{String, Vec};

use crate::error::DecodeError;

/// Capacity of one field (four cells, room for multi-byte characters).
pub const FIELD_MAX_LEN: usize = 16;

/// Largest encoded payload: three full fields and two separators.
pub const DISPLAY_PAYLOAD_MAX_LEN: usize = FIELD_MAX_LEN * 3 + 2;

/// One display's text.
pub type FieldText = String<FIELD_MAX_LEN>;

/// Text of all three displays.
pub type DisplayValues = [FieldText; 3];

/// Encoded display payload.
pub type DisplayPayload = Vec<u8, DISPLAY_PAYLOAD_MAX_LEN>;

/// Three empty fields.
pub fn blank_values() -> DisplayValues {
    [FieldText::new(), FieldText::new(), FieldText::new()]
}

/// Join the three fields with commas.
pub fn encode_display_values(values: &DisplayValues) -> DisplayPayload {
    let mut out = DisplayPayload::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            let _ = out.push(b',');
        }
        // Capacity covers three full fields; cannot fail.
        let _ = out.extend_from_slice(value.as_bytes());
    }
    out
}

/// Split a payload back into three fields.
///
/// Fewer than three fields are padded with empty strings.
pub fn decode_display_values(bytes: &[u8]) -> Result<DisplayValues, DecodeError> {
    let text = core::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)?;
    let mut values = blank_values();
    let mut fields = text.split(',');

    for slot in values.iter_mut() {
        match fields.next() {
            Some(field) => slot
                .push_str(field)
                .map_err(|_| DecodeError::FieldTooLong)?,
            None => break,
        }
    }

    if fields.next().is_some() {
        return Err(DecodeError::TooManyFields);
    }
    Ok(values)
}

/// Decode, falling back to three empty fields on malformed input.
pub fn decode_display_values_or_blank(bytes: &[u8]) -> DisplayValues {
    decode_display_values(bytes).unwrap_or_else(|e| {
        warn!("display payload rejected: {}", e);
        blank_values()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn values(a: &str, b: &str, c: &str) -> DisplayValues {
        [
            FieldText::try_from(a).unwrap(),
            FieldText::try_from(b).unwrap(),
            FieldText::try_from(c).unwrap(),
        ]
    }

    #[test]
    fn joins_with_commas() {
        let payload = encode_display_values(&values("1.65", "0.00", "Err"));
        assert_eq!(payload.as_slice(), b"1.65,0.00,Err");
    }

    #[test]
    fn all_blank_encodes_to_two_separators() {
        assert_eq!(encode_display_values(&blank_values()).as_slice(), b",,");
        assert_eq!(decode_display_values(b",,").unwrap(), blank_values());
    }

    #[test]
    fn short_payload_pads_with_empty_fields() {
        assert_eq!(decode_display_values(b"12").unwrap(), values("12", "", ""));
        assert_eq!(decode_display_values(b"").unwrap(), blank_values());
    }

    #[test]
    fn malformed_payload_falls_back_to_blank() {
        assert_eq!(decode_display_values_or_blank(&[0xff, 0xfe]), blank_values());
        assert_eq!(decode_display_values_or_blank(b"a,b,c,d"), blank_values());
        assert_eq!(
            decode_display_values_or_blank(b"this field is far too long,b,c"),
            blank_values()
        );
    }

    proptest! {
        #[test]
        fn round_trip_without_commas(
            a in "[^,]{0,4}",
            b in "[^,]{0,4}",
            c in "[^,]{0,4}",
        ) {
            let original = values(&a, &b, &c);
            let decoded = decode_display_values(&encode_display_values(&original)).unwrap();
            prop_assert_eq!(decoded, original);
        }
    }
}
