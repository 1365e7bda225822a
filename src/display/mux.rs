//! Time-division multiplexing of the 12 digit positions.
//!
//! One tick lights one position. Per tick:
//! 1. release every digit-select line (no ghosting while segments change),
//! 2. advance the cursor,
//! 3. drive the segment lines for the cell under the cursor,
//! 4. select that digit.
//!
//! The tick runs in a higher-priority context than the code that writes
//! the buffer, touches only the shared buffer and the lines, and cannot
//! panic: bad positions read as blank.

use embedded_hal::digital::{OutputPin, PinState};

use super::buffer::SharedDisplay;
use super::glyph::{segment_mask, Polarity, SEGMENT_LINES};
use crate::config::{DIGITS_PER_DISPLAY, DIGIT_POSITIONS, MULTIPLEX_FREQUENCY_HZ};

/// Physical segment and digit-select lines.
///
/// Implementations receive electrical levels; polarity has already been
/// applied.
pub trait DriveLines {
    /// Drive all segment lines at once (bit set = high, bit 0 = a).
    fn set_segments(&mut self, levels: u8);

    /// Drive one digit-select line (`position` 0..12, display-major).
    fn set_digit(&mut self, position: usize, high: bool);
}

/// Multiplexer tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MultiplexConfig {
    /// Full refresh rate of each digit (Hz).
    pub frequency_hz: u32,
    /// Display wiring.
    pub polarity: Polarity,
}

impl MultiplexConfig {
    /// Rate at which [`Multiplexer::tick`] must be called.
    pub const fn tick_hz(&self) -> u32 {
        self.frequency_hz * DIGIT_POSITIONS as u32
    }
}

impl Default for MultiplexConfig {
    fn default() -> Self {
        Self {
            frequency_hz: MULTIPLEX_FREQUENCY_HZ,
            polarity: Polarity::default(),
        }
    }
}

/// Tick-context half of the renderer.
pub struct Multiplexer<'a, L> {
    shared: &'a SharedDisplay,
    lines: L,
    polarity: Polarity,
    cursor: usize,
    blanked: bool,
}

impl<'a, L: DriveLines> Multiplexer<'a, L> {
    pub fn new(shared: &'a SharedDisplay, lines: L, config: MultiplexConfig) -> Self {
        let mut mux = Self {
            shared,
            lines,
            polarity: config.polarity,
            // First tick lands on position 0.
            cursor: DIGIT_POSITIONS - 1,
            blanked: false,
        };
        mux.blank();
        mux
    }

    /// One multiplex step. Returns the `(display, digit)` that was lit, or
    /// `None` while stopped.
    pub fn tick(&mut self) -> Option<(usize, usize)> {
        if !self.shared.is_running() {
            if !self.blanked {
                self.blank();
            }
            return None;
        }
        self.blanked = false;

        self.release_digits();

        self.cursor = (self.cursor + 1) % DIGIT_POSITIONS;
        let display = self.cursor / DIGITS_PER_DISPLAY;
        let digit = self.cursor % DIGITS_PER_DISPLAY;

        let cell = self.shared.buffer().cell(display, digit);
        self.lines
            .set_segments(self.polarity.segment_levels(segment_mask(cell)));
        self.lines
            .set_digit(self.cursor, self.polarity.digit_level(true));

        Some((display, digit))
    }

    fn release_digits(&mut self) {
        let off = self.polarity.digit_level(false);
        for position in 0..DIGIT_POSITIONS {
            self.lines.set_digit(position, off);
        }
    }

    fn blank(&mut self) {
        self.release_digits();
        self.lines.set_segments(self.polarity.segment_levels(0));
        self.blanked = true;
    }
}

/// [`DriveLines`] over embedded-hal output pins.
pub struct GpioDriveLines<P> {
    segments: [P; SEGMENT_LINES],
    digits: [P; DIGIT_POSITIONS],
}

impl<P: OutputPin> GpioDriveLines<P> {
    /// `segments` in a..g, dp order; `digits` display-major.
    pub fn new(segments: [P; SEGMENT_LINES], digits: [P; DIGIT_POSITIONS]) -> Self {
        Self { segments, digits }
    }
}

impl<P: OutputPin> DriveLines for GpioDriveLines<P> {
    fn set_segments(&mut self, levels: u8) {
        for (i, pin) in self.segments.iter_mut().enumerate() {
            // A failing pin only affects its own segment.
            let _ = pin.set_state(PinState::from(levels & (1 << i) != 0));
        }
    }

    fn set_digit(&mut self, position: usize, high: bool) {
        if let Some(pin) = self.digits.get_mut(position) {
            let _ = pin.set_state(PinState::from(high));
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::display::glyph::{Polarity, SEG_DP};
    use core::convert::Infallible;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records line levels and checks the "one digit at a time" rule
    /// after every write.
    #[derive(Default)]
    pub struct RecordingLines {
        pub segments: u8,
        pub digits: [bool; DIGIT_POSITIONS],
        pub selected_high: bool,
        pub max_selected: usize,
        pub writes: usize,
    }

    impl RecordingLines {
        pub fn new(polarity: Polarity) -> Self {
            let off = polarity.digit_level(false);
            Self {
                digits: [off; DIGIT_POSITIONS],
                selected_high: polarity.digit_level(true),
                ..Default::default()
            }
        }

        pub fn selected(&self) -> Vec<usize> {
            (0..DIGIT_POSITIONS)
                .filter(|&i| self.digits[i] == self.selected_high)
                .collect()
        }
    }

    impl DriveLines for RecordingLines {
        fn set_segments(&mut self, levels: u8) {
            self.segments = levels;
            self.writes += 1;
        }

        fn set_digit(&mut self, position: usize, high: bool) {
            self.digits[position] = high;
            self.writes += 1;
            let n = self.selected().len();
            self.max_selected = self.max_selected.max(n);
        }
    }

    impl DriveLines for &mut RecordingLines {
        fn set_segments(&mut self, levels: u8) {
            (**self).set_segments(levels)
        }

        fn set_digit(&mut self, position: usize, high: bool) {
            (**self).set_digit(position, high)
        }
    }

    fn running() -> SharedDisplay {
        let shared = SharedDisplay::new();
        shared.set_running(true);
        shared
    }

    #[test]
    fn one_cycle_selects_every_position_once() {
        let shared = running();
        let mut lines = RecordingLines::new(Polarity::CommonAnode);
        let mut mux = Multiplexer::new(&shared, &mut lines, MultiplexConfig::default());

        let mut seen = [0u8; DIGIT_POSITIONS];
        for _ in 0..DIGIT_POSITIONS {
            let (display, digit) = mux.tick().unwrap();
            seen[display * DIGITS_PER_DISPLAY + digit] += 1;
        }
        assert_eq!(seen, [1; DIGIT_POSITIONS]);
        drop(mux);
        assert!(lines.max_selected <= 1);
    }

    #[test]
    fn lit_digit_matches_cursor() {
        let shared = running();
        let mut lines = RecordingLines::new(Polarity::CommonCathode);
        let mut mux = Multiplexer::new(&shared, &mut lines, MultiplexConfig {
            polarity: Polarity::CommonCathode,
            ..Default::default()
        });
        for _ in 0..5 {
            mux.tick();
        }
        drop(mux);
        // Fifth tick lights position 4: display 1, digit 0.
        assert_eq!(lines.selected(), vec![4]);
    }

    #[test]
    fn segments_follow_buffer_and_polarity() {
        let shared = running();
        shared.buffer().store(0, *b"1.65");
        let mut lines = RecordingLines::new(Polarity::CommonAnode);
        let mut mux = Multiplexer::new(&shared, &mut lines, MultiplexConfig::default());

        mux.tick();
        mux.tick();
        drop(mux);
        // Second position is the decimal point, active low.
        assert_eq!(lines.segments, !SEG_DP);
    }

    #[test]
    fn stopped_mux_blanks_once_then_idles() {
        let shared = running();
        let mut lines = RecordingLines::new(Polarity::CommonAnode);
        let mut mux = Multiplexer::new(&shared, &mut lines, MultiplexConfig::default());
        mux.tick();

        shared.set_running(false);
        assert_eq!(mux.tick(), None);
        assert_eq!(mux.tick(), None);
        drop(mux);
        assert!(lines.selected().is_empty());
        assert_eq!(lines.segments, Polarity::CommonAnode.segment_levels(0));
    }

    #[test]
    fn stopped_mux_does_not_touch_lines_again() {
        let shared = SharedDisplay::new();
        let mut lines = RecordingLines::new(Polarity::CommonAnode);
        let mut mux = Multiplexer::new(&shared, &mut lines, MultiplexConfig::default());
        for _ in 0..10 {
            assert_eq!(mux.tick(), None);
        }
        drop(mux);
        // Construction blanks once; idle ticks write nothing.
        assert_eq!(lines.writes, DIGIT_POSITIONS + 1);
    }

    #[test]
    fn tick_rate_covers_all_positions() {
        assert_eq!(MultiplexConfig::default().tick_hz(), 2400);
    }

    struct SharedPin(Rc<RefCell<bool>>);

    impl embedded_hal::digital::ErrorType for SharedPin {
        type Error = Infallible;
    }

    impl OutputPin for SharedPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            *self.0.borrow_mut() = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            *self.0.borrow_mut() = true;
            Ok(())
        }
    }

    #[test]
    fn gpio_lines_map_bits_to_pins() {
        let seg_state: [Rc<RefCell<bool>>; SEGMENT_LINES] = Default::default();
        let dig_state: [Rc<RefCell<bool>>; DIGIT_POSITIONS] = Default::default();
        let segments = seg_state.clone().map(SharedPin);
        let digits = dig_state.clone().map(SharedPin);
        let mut lines = GpioDriveLines::new(segments, digits);

        lines.set_segments(0b1000_0001);
        lines.set_digit(11, true);
        lines.set_digit(12, true);

        assert!(*seg_state[0].borrow());
        assert!(!*seg_state[1].borrow());
        assert!(*seg_state[7].borrow());
        assert!(*dig_state[11].borrow());
    }
}
