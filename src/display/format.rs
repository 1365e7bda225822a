//! Text layout for four-cell displays.

use core::fmt::Write;

use heapless::String;

use super::buffer::{Cells, BLANK_CELLS};
use crate::config::DIGITS_PER_DISPLAY;

/// Shown when a value cannot fit four cells at any precision.
pub const OVERFLOW_MARKER: &str = "----";

/// Shown on every display when bring-up fails.
pub const ERROR_MARKER: &str = "Err ";

/// Formatted voltage (at most four characters).
pub type VoltageLabel = String<DIGITS_PER_DISPLAY>;

/// Digits with an optional sign and decimal point.
pub fn is_numeric(text: &str) -> bool {
    !text.is_empty()
        && text.bytes().any(|b| b.is_ascii_digit())
        && text.bytes().all(|b| b.is_ascii_digit() || b == b'.' || b == b'-')
}

/// Lay `text` out over four cells.
///
/// Only the first four characters are kept. Numeric text is
/// right-justified with leading spaces, anything else left-justified with
/// trailing spaces. Characters outside ASCII become blank cells.
pub fn justify(text: &str) -> Cells {
    let mut cells = BLANK_CELLS;
    let mut len = 0;
    for ch in text.chars().take(DIGITS_PER_DISPLAY) {
        cells[len] = if ch.is_ascii() { ch as u8 } else { b' ' };
        len += 1;
    }

    let kept_end = text
        .char_indices()
        .nth(DIGITS_PER_DISPLAY)
        .map_or(text.len(), |(i, _)| i);
    if is_numeric(&text[..kept_end]) && len < DIGITS_PER_DISPLAY {
        let shift = DIGITS_PER_DISPLAY - len;
        cells.copy_within(0..len, shift);
        cells[..shift].fill(b' ');
    }
    cells
}

/// Narrowest rendering of `volts` that fits four cells.
///
/// Tries two decimals, then one, then none, then gives the overflow marker.
pub fn format_voltage(volts: f32) -> VoltageLabel {
    // Fold negative zero so it does not cost a cell.
    let volts = if volts == 0.0 { 0.0 } else { volts };
    if volts.is_finite() {
        for precision in [2usize, 1, 0] {
            let mut s: String<16> = String::new();
            if write!(s, "{:.*}", precision, volts).is_ok() && s.len() <= DIGITS_PER_DISPLAY {
                let mut out = VoltageLabel::new();
                let _ = out.push_str(&s);
                return out;
            }
        }
    }
    let mut out = VoltageLabel::new();
    let _ = out.push_str(OVERFLOW_MARKER);
    out
}

/// Cells rendered back to text with surrounding blanks removed.
pub fn cells_to_text(cells: &Cells) -> String<DIGITS_PER_DISPLAY> {
    let mut s: String<DIGITS_PER_DISPLAY> = String::new();
    for &c in cells {
        let ch = if c.is_ascii_graphic() { c as char } else { ' ' };
        let _ = s.push(ch);
    }
    let mut out = String::new();
    let _ = out.push_str(s.trim());
    out
}
