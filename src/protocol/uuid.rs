//! Bluetooth UUIDs in the three widths that appear on air.

/// `0000xxxx-0000-1000-8000-00805F9B34FB`, the base for 16/32-bit aliases.
const BLUETOOTH_BASE_UUID: u128 = 0x00000000_0000_1000_8000_00805f9b34fb;

/// A service or characteristic UUID.
///
/// 16- and 32-bit values are short aliases of the Bluetooth base UUID.
/// All widths are transmitted little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Uuid {
    U16(u16),
    U32(u32),
    U128(u128),
}

impl Uuid {
    /// Number of bytes this UUID occupies on air.
    pub const fn byte_len(&self) -> usize {
        match self {
            Uuid::U16(_) => 2,
            Uuid::U32(_) => 4,
            Uuid::U128(_) => 16,
        }
    }

    /// Write the little-endian wire form into `out`.
    ///
    /// Returns the number of bytes written, or 0 if `out` is too short.
    pub fn write_le(&self, out: &mut [u8]) -> usize {
        let len = self.byte_len();
        if out.len() < len {
            return 0;
        }
        match self {
            Uuid::U16(v) => out[..2].copy_from_slice(&v.to_le_bytes()),
            Uuid::U32(v) => out[..4].copy_from_slice(&v.to_le_bytes()),
            Uuid::U128(v) => out[..16].copy_from_slice(&v.to_le_bytes()),
        }
        len
    }

    /// Full 128-bit value, expanding short aliases over the base UUID.
    pub const fn to_u128(&self) -> u128 {
        match *self {
            Uuid::U16(v) => BLUETOOTH_BASE_UUID | ((v as u128) << 96),
            Uuid::U32(v) => BLUETOOTH_BASE_UUID | ((v as u128) << 96),
            Uuid::U128(v) => v,
        }
    }

    /// True when both values name the same UUID, regardless of width.
    pub const fn same_as(&self, other: &Uuid) -> bool {
        self.to_u128() == other.to_u128()
    }

    /// True when `bytes` is this UUID's little-endian wire form.
    pub fn matches_le(&self, bytes: &[u8]) -> bool {
        let mut buf = [0u8; 16];
        let len = self.write_le(&mut buf);
        bytes == &buf[..len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form_is_little_endian() {
        let mut buf = [0u8; 16];
        assert_eq!(Uuid::U16(0x1812).write_le(&mut buf), 2);
        assert_eq!(&buf[..2], &[0x12, 0x18]);

        let uuid = Uuid::U128(0x12345678_1234_1234_1234_123456789abc);
        assert_eq!(uuid.write_le(&mut buf), 16);
        assert_eq!(buf[0], 0xbc);
        assert_eq!(buf[15], 0x12);
    }

    #[test]
    fn short_buffer_writes_nothing() {
        let mut buf = [0u8; 3];
        assert_eq!(Uuid::U32(1).write_le(&mut buf), 0);
    }

    #[test]
    fn short_alias_equals_expanded_form() {
        let short = Uuid::U16(0x180f);
        let long = Uuid::U128(0x0000180f_0000_1000_8000_00805f9b34fb);
        assert!(short.same_as(&long));
        assert!(!short.same_as(&Uuid::U16(0x1812)));
    }

    #[test]
    fn matches_le_checks_width_and_value() {
        let uuid = Uuid::U16(0x1812);
        assert!(uuid.matches_le(&[0x12, 0x18]));
        assert!(!uuid.matches_le(&[0x12, 0x18, 0x00, 0x00]));
        assert!(!uuid.matches_le(&[0x0f, 0x18]));
    }
}
