//! Advertising data: building and parsing AD structures.
//!
//! Each element is `[length][type][data...]` where `length` counts the
//! type byte plus data. Legacy advertising packets carry at most 31 bytes.

use heapless::{String, Vec};

use super::uuid::Uuid;

/// Legacy advertising / scan-response payload limit.
pub const ADV_PAYLOAD_MAX_LEN: usize = 31;

/// AD type codes used here.
pub mod ad_type {
    pub const FLAGS: u8 = 0x01;
    pub const INCOMPLETE_UUID16: u8 = 0x02;
    pub const COMPLETE_UUID16: u8 = 0x03;
    pub const INCOMPLETE_UUID32: u8 = 0x04;
    pub const COMPLETE_UUID32: u8 = 0x05;
    pub const INCOMPLETE_UUID128: u8 = 0x06;
    pub const COMPLETE_UUID128: u8 = 0x07;
    pub const SHORTENED_NAME: u8 = 0x08;
    pub const COMPLETE_NAME: u8 = 0x09;
}

/// LE General Discoverable Mode.
pub const FLAG_LE_GENERAL_DISCOVERABLE: u8 = 0x02;
/// BR/EDR Not Supported.
pub const FLAG_BR_EDR_NOT_SUPPORTED: u8 = 0x04;

/// One advertising or scan-response packet.
pub type AdPayload = Vec<u8, ADV_PAYLOAD_MAX_LEN>;

/// Appends AD structures while they fit.
struct AdWriter {
    buf: AdPayload,
}

impl AdWriter {
    fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn remaining(&self) -> usize {
        ADV_PAYLOAD_MAX_LEN - self.buf.len()
    }

    /// Append one element; returns false (and writes nothing) if it does not fit.
    fn push(&mut self, ty: u8, data: &[u8]) -> bool {
        if data.len() + 2 > self.remaining() {
            return false;
        }
        let _ = self.buf.push(data.len() as u8 + 1);
        let _ = self.buf.push(ty);
        let _ = self.buf.extend_from_slice(data);
        true
    }

    fn flags(&mut self) {
        self.push(
            ad_type::FLAGS,
            &[FLAG_LE_GENERAL_DISCOVERABLE | FLAG_BR_EDR_NOT_SUPPORTED],
        );
    }

    fn name(&mut self, name: &str) -> bool {
        name.is_empty() || self.push(ad_type::COMPLETE_NAME, name.as_bytes())
    }

    /// One complete-list element per UUID width, in first-seen order.
    fn uuids(&mut self, uuids: &[Uuid]) -> bool {
        let mut all_fit = true;
        for width in [2usize, 4, 16] {
            let mut data: Vec<u8, ADV_PAYLOAD_MAX_LEN> = Vec::new();
            for uuid in uuids.iter().filter(|u| u.byte_len() == width) {
                let mut le = [0u8; 16];
                let n = uuid.write_le(&mut le);
                if data.extend_from_slice(&le[..n]).is_err() {
                    data.clear();
                    all_fit = false;
                    break;
                }
            }
            if data.is_empty() {
                continue;
            }
            let ty = match width {
                2 => ad_type::COMPLETE_UUID16,
                4 => ad_type::COMPLETE_UUID32,
                _ => ad_type::COMPLETE_UUID128,
            };
            all_fit &= self.push(ty, &data);
        }
        all_fit
    }
}

/// Build an advertising packet: flags first, then the complete local
/// name, then the service UUID lists. Elements that would overflow the
/// 31-byte limit are left out.
pub fn build_advertising_payload(name: &str, service_uuids: &[Uuid]) -> AdPayload {
    let mut w = AdWriter::new();
    w.flags();
    if !w.name(name) {
        warn!("advertising name does not fit, omitted");
    }
    if !w.uuids(service_uuids) {
        warn!("advertised service list truncated");
    }
    w.buf
}

/// Advertising packet plus scan response.
///
/// The name is placed in the advertising packet when everything fits,
/// otherwise it moves to the scan response so the UUID list stays visible
/// to passive scanners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    data: AdPayload,
    scan_response: AdPayload,
}

impl Advertisement {
    pub fn new(name: &str, service_uuids: &[Uuid]) -> Self {
        let uuid_bytes: usize = [2usize, 4, 16]
            .iter()
            .map(|&w| {
                let n = service_uuids.iter().filter(|u| u.byte_len() == w).count();
                if n == 0 {
                    0
                } else {
                    2 + n * w
                }
            })
            .sum();
        let name_bytes = if name.is_empty() { 0 } else { 2 + name.len() };

        if 3 + name_bytes + uuid_bytes <= ADV_PAYLOAD_MAX_LEN {
            return Self {
                data: build_advertising_payload(name, service_uuids),
                scan_response: AdPayload::new(),
            };
        }

        let mut scan = AdWriter::new();
        if !scan.name(name) {
            warn!("advertising name does not fit scan response, omitted");
        }
        Self {
            data: build_advertising_payload("", service_uuids),
            scan_response: scan.buf,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn scan_response(&self) -> &[u8] {
        &self.scan_response
    }
}

/// Iterator over `(type, data)` pairs of raw advertising data.
///
/// Stops at the first zero-length or truncated element.
pub struct AdStructures<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> AdStructures<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl<'a> Iterator for AdStructures<'a> {
    type Item = (u8, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.pos;
        let len = *self.data.get(i)? as usize;
        if len == 0 || i + len >= self.data.len() {
            return None;
        }
        self.pos = i + len + 1;
        Some((self.data[i + 1], &self.data[i + 2..i + 1 + len]))
    }
}

/// Extract complete/shortened local name from advertisement data.
///
/// Names are UTF-8; invalid sequences become U+FFFD. Long names are cut at
/// a character boundary.
pub fn extract_device_name(data: &[u8]) -> Option<String<32>> {
    AdStructures::new(data)
        .find(|(ty, _)| *ty == ad_type::SHORTENED_NAME || *ty == ad_type::COMPLETE_NAME)
        .map(|(_, name_bytes)| {
            let mut name = String::new();
            push_utf8_lossy(&mut name, name_bytes);
            name
        })
}

fn push_utf8_lossy<const N: usize>(out: &mut String<N>, mut bytes: &[u8]) {
    loop {
        match core::str::from_utf8(bytes) {
            Ok(text) => {
                push_truncated(out, text);
                return;
            }
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                let valid = core::str::from_utf8(valid).unwrap_or_default();
                if !push_truncated(out, valid) || out.push(char::REPLACEMENT_CHARACTER).is_err() {
                    return;
                }
                // `None` means the input ends mid-sequence.
                let Some(bad) = e.error_len() else { return };
                bytes = &rest[bad..];
            }
        }
    }
}

/// Push as many whole characters as fit. False if some were left out.
fn push_truncated<const N: usize>(out: &mut String<N>, text: &str) -> bool {
    for c in text.chars() {
        if out.push(c).is_err() {
            return false;
        }
    }
    true
}

/// Check if advertisement data lists `uuid` in a service UUID element.
pub fn contains_service_uuid(data: &[u8], uuid: &Uuid) -> bool {
    let width = uuid.byte_len();
    let (incomplete, complete) = match width {
        2 => (ad_type::INCOMPLETE_UUID16, ad_type::COMPLETE_UUID16),
        4 => (ad_type::INCOMPLETE_UUID32, ad_type::COMPLETE_UUID32),
        _ => (ad_type::INCOMPLETE_UUID128, ad_type::COMPLETE_UUID128),
    };
    AdStructures::new(data)
        .filter(|(ty, _)| *ty == incomplete || *ty == complete)
        .any(|(_, list)| list.chunks_exact(width).any(|chunk| uuid.matches_le(chunk)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DISPLAY_NODE_NAME, DISPLAY_SERVICE_UUID};

    #[test]
    fn flags_element_is_always_first() {
        let payload = build_advertising_payload("Node", &[Uuid::U16(0x180f)]);
        assert_eq!(&payload[..3], &[0x02, ad_type::FLAGS, 0x06]);
    }

    #[test]
    fn name_and_16_bit_list_layout() {
        let payload = build_advertising_payload("Hi", &[Uuid::U16(0x180f), Uuid::U16(0x1812)]);
        assert_eq!(
            payload.as_slice(),
            &[
                0x02, 0x01, 0x06, // flags
                0x03, 0x09, b'H', b'i', // complete name
                0x05, 0x03, 0x0f, 0x18, 0x12, 0x18, // 16-bit list
            ]
        );
    }

    #[test]
    fn uuid_list_type_follows_width() {
        let p32 = build_advertising_payload("", &[Uuid::U32(0x0000_abcd)]);
        assert_eq!(p32[4], ad_type::COMPLETE_UUID32);

        let p128 = build_advertising_payload("", &[Uuid::U128(DISPLAY_SERVICE_UUID)]);
        assert_eq!(p128[3], 17);
        assert_eq!(p128[4], ad_type::COMPLETE_UUID128);
    }

    #[test]
    fn node_advertisement_fits_one_packet() {
        let adv = Advertisement::new(DISPLAY_NODE_NAME, &[Uuid::U128(DISPLAY_SERVICE_UUID)]);
        assert_eq!(adv.data().len(), ADV_PAYLOAD_MAX_LEN);
        assert!(adv.scan_response().is_empty());
        assert_eq!(
            extract_device_name(adv.data()).as_deref(),
            Some(DISPLAY_NODE_NAME)
        );
        assert!(contains_service_uuid(
            adv.data(),
            &Uuid::U128(DISPLAY_SERVICE_UUID)
        ));
    }

    #[test]
    fn long_name_moves_to_scan_response() {
        let adv = Advertisement::new("A rather long node name", &[Uuid::U128(DISPLAY_SERVICE_UUID)]);
        assert!(adv.data().len() <= ADV_PAYLOAD_MAX_LEN);
        assert!(extract_device_name(adv.data()).is_none());
        assert!(contains_service_uuid(
            adv.data(),
            &Uuid::U128(DISPLAY_SERVICE_UUID)
        ));
        assert_eq!(
            extract_device_name(adv.scan_response()).as_deref(),
            Some("A rather long node name")
        );
    }

    #[test]
    fn oversized_elements_are_dropped_not_split() {
        let payload = build_advertising_payload(
            "Name",
            &[Uuid::U128(1), Uuid::U128(2)],
        );
        // 3 flags + 6 name; two 128-bit UUIDs (34 bytes) cannot fit.
        assert_eq!(payload.len(), 9);
    }

    #[test]
    fn detect_uuid_in_incomplete_list() {
        let ad_data = [0x03, ad_type::INCOMPLETE_UUID16, 0x12, 0x18];
        assert!(contains_service_uuid(&ad_data, &Uuid::U16(0x1812)));
        assert!(!contains_service_uuid(&ad_data, &Uuid::U16(0x180f)));
    }

    #[test]
    fn malformed_ad_length_zero() {
        let ad_data = [0x00, 0x03, 0x12, 0x18];
        assert!(!contains_service_uuid(&ad_data, &Uuid::U16(0x1812)));
        assert!(extract_device_name(&ad_data).is_none());
    }

    #[test]
    fn truncated_element_stops_parsing() {
        let ad_data = [0x05, ad_type::COMPLETE_NAME, b'a'];
        assert!(extract_device_name(&ad_data).is_none());
    }

    #[test]
    fn extract_shortened_local_name() {
        let ad_data = [0x05, 0x08, b'B', b'T', b' ', b'K'];
        assert_eq!(extract_device_name(&ad_data).as_deref(), Some("BT K"));
    }

    #[test]
    fn utf8_name_is_kept_intact() {
        let name = "Volt\u{e9}";
        let mut ad_data = [0u8; 8];
        ad_data[0] = 1 + name.len() as u8;
        ad_data[1] = ad_type::COMPLETE_NAME;
        ad_data[2..].copy_from_slice(name.as_bytes());
        assert_eq!(extract_device_name(&ad_data).as_deref(), Some("Volt\u{e9}"));
    }

    #[test]
    fn invalid_utf8_name_is_replaced_not_dropped() {
        let ad_data = [0x05, ad_type::COMPLETE_NAME, b'V', 0xff, b'L', 0xc3];
        assert_eq!(
            extract_device_name(&ad_data).as_deref(),
            Some("V\u{fffd}L\u{fffd}")
        );
    }

    #[test]
    fn name_truncated_to_32_chars() {
        let mut ad_data = [b'X'; 40];
        ad_data[0] = 35;
        ad_data[1] = ad_type::COMPLETE_NAME;
        let name = extract_device_name(&ad_data).unwrap();
        assert_eq!(name.len(), 32);
    }
}
