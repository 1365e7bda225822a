//! Seven-segment glyph table and line polarity.
//!
//! Masks are defined lit-high: bit set = segment on.
//! ```text
//!      a            bit 0 = a    bit 4 = e
//!    f   b          bit 1 = b    bit 5 = f
//!      g            bit 2 = c    bit 6 = g
//!    e   c          bit 3 = d    bit 7 = dp
//!      d   dp
//! ```

pub const SEG_A: u8 = 1 << 0;
pub const SEG_B: u8 = 1 << 1;
pub const SEG_C: u8 = 1 << 2;
pub const SEG_D: u8 = 1 << 3;
pub const SEG_E: u8 = 1 << 4;
pub const SEG_F: u8 = 1 << 5;
pub const SEG_G: u8 = 1 << 6;
pub const SEG_DP: u8 = 1 << 7;

/// Number of segment lines (a..g plus dp).
pub const SEGMENT_LINES: usize = 8;

/// Cell codes 0x01..=0x08 light a single segment (a..dp) and 0x09 lights
/// all of them. They sit below the printable range so text never
/// produces them.
pub const PROBE_SEGMENT_FIRST: u8 = 0x01;
pub const PROBE_ALL: u8 = 0x09;

/// Cell code lighting only segment `index` (0 = a .. 7 = dp).
pub const fn probe_code(index: u8) -> u8 {
    PROBE_SEGMENT_FIRST + (index & 0x07)
}

/// Segment mask for a cell. Unknown codes are blank.
pub const fn segment_mask(cell: u8) -> u8 {
    match cell {
        b'0' => SEG_A | SEG_B | SEG_C | SEG_D | SEG_E | SEG_F,
        b'1' => SEG_B | SEG_C,
        b'2' => SEG_A | SEG_B | SEG_D | SEG_E | SEG_G,
        b'3' => SEG_A | SEG_B | SEG_C | SEG_D | SEG_G,
        b'4' => SEG_B | SEG_C | SEG_F | SEG_G,
        b'5' => SEG_A | SEG_C | SEG_D | SEG_F | SEG_G,
        b'6' => SEG_A | SEG_C | SEG_D | SEG_E | SEG_F | SEG_G,
        b'7' => SEG_A | SEG_B | SEG_C,
        b'8' => SEG_A | SEG_B | SEG_C | SEG_D | SEG_E | SEG_F | SEG_G,
        b'9' => SEG_A | SEG_B | SEG_C | SEG_D | SEG_F | SEG_G,
        b'.' => SEG_DP,
        b'-' => SEG_G,
        b'E' => SEG_A | SEG_D | SEG_E | SEG_F | SEG_G,
        b'r' => SEG_E | SEG_G,
        PROBE_SEGMENT_FIRST..=0x08 => 1 << (cell - PROBE_SEGMENT_FIRST),
        PROBE_ALL => 0xFF,
        _ => 0,
    }
}

/// Display wiring. Decides the electrical level of both line groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Segments lit high, digit selected low.
    CommonCathode,
    /// Segments lit low, digit selected high.
    #[default]
    CommonAnode,
}

impl Polarity {
    /// Line levels (bit set = drive high) for a lit-high segment mask.
    pub const fn segment_levels(self, mask: u8) -> u8 {
        match self {
            Polarity::CommonCathode => mask,
            Polarity::CommonAnode => !mask,
        }
    }

    /// Level of a digit-select line.
    pub const fn digit_level(self, selected: bool) -> bool {
        match self {
            Polarity::CommonCathode => !selected,
            Polarity::CommonAnode => selected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_match_reference_patterns() {
        assert_eq!(segment_mask(b'0'), 0x3F);
        assert_eq!(segment_mask(b'1'), 0x06);
        assert_eq!(segment_mask(b'4'), 0x66);
        assert_eq!(segment_mask(b'8'), 0x7F);
        assert_eq!(segment_mask(b'9'), 0x6F);
    }

    #[test]
    fn unknown_characters_are_blank() {
        assert_eq!(segment_mask(b' '), 0);
        assert_eq!(segment_mask(b'H'), 0);
        assert_eq!(segment_mask(0), 0);
        assert_eq!(segment_mask(0xFF), 0);
    }

    #[test]
    fn probe_codes_light_one_segment_each() {
        for i in 0..8u8 {
            assert_eq!(segment_mask(probe_code(i)), 1 << i);
        }
        assert_eq!(segment_mask(PROBE_ALL), 0xFF);
    }

    #[test]
    fn polarity_inverts_at_the_line_boundary() {
        let mask = segment_mask(b'7');
        assert_eq!(Polarity::CommonCathode.segment_levels(mask), mask);
        assert_eq!(Polarity::CommonAnode.segment_levels(mask), !mask);
        assert!(Polarity::CommonAnode.digit_level(true));
        assert!(!Polarity::CommonCathode.digit_level(true));
    }
}
