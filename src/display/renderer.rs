//! Main-context half of the renderer: writes the shared buffer and
//! starts/stops the multiplex tick.

use super::buffer::{Cells, SharedDisplay};
use super::format::{cells_to_text, format_voltage, justify, ERROR_MARKER};
use super::self_test::Frame;
use crate::config::DISPLAY_COUNT;
use crate::protocol::display::{blank_values, DisplayValues};

/// Shown while the node is coming up.
pub const BOOT_PATTERN: &str = "8888";

/// Handle for writing the displays. Cheap to copy; all state lives in the
/// [`SharedDisplay`].
#[derive(Clone, Copy)]
pub struct Renderer<'a> {
    shared: &'a SharedDisplay,
}

impl<'a> Renderer<'a> {
    pub const fn new(shared: &'a SharedDisplay) -> Self {
        Self { shared }
    }

    /// `Stopped` → `Running`.
    pub fn start_multiplexing(&self) {
        if !self.shared.is_running() {
            info!("display: multiplexing started");
        }
        self.shared.set_running(true);
    }

    /// `Running` → `Stopped`.
    ///
    /// The tick runs at a higher priority than every caller of this method,
    /// so once the flag is stored no tick can be half-way through driving
    /// a digit; the next one only blanks the lines.
    pub fn stop_multiplexing(&self) {
        if self.shared.is_running() {
            info!("display: multiplexing stopped");
        }
        self.shared.set_running(false);
    }

    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    /// Write up to four characters; see [`justify`] for the layout.
    /// Returns false for an invalid display index.
    pub fn set_text(&self, display: usize, text: &str) -> bool {
        let ok = self.shared.buffer().store(display, justify(text));
        if !ok {
            warn!("display: index {} out of range", display);
        }
        ok
    }

    /// Write a voltage at the widest precision that fits.
    pub fn set_voltage(&self, display: usize, volts: f32) -> bool {
        self.set_text(display, &format_voltage(volts))
    }

    pub fn set_voltages(&self, volts: [f32; DISPLAY_COUNT]) {
        for (display, v) in volts.into_iter().enumerate() {
            self.set_voltage(display, v);
        }
    }

    /// Write raw cells, bypassing layout.
    pub fn set_cells(&self, display: usize, cells: Cells) -> bool {
        self.shared.buffer().store(display, cells)
    }

    pub fn show_frame(&self, frame: &Frame) {
        for (display, cells) in frame.iter().enumerate() {
            self.set_cells(display, *cells);
        }
    }

    /// Same text on every display.
    pub fn fill(&self, text: &str) {
        let cells = justify(text);
        for display in 0..DISPLAY_COUNT {
            self.set_cells(display, cells);
        }
    }

    pub fn show_boot_pattern(&self) {
        self.fill(BOOT_PATTERN);
    }

    /// Distinct pattern for a failed bring-up.
    pub fn show_error(&self) {
        self.fill(ERROR_MARKER);
    }

    pub fn clear(&self) {
        self.shared.buffer().clear();
    }

    /// What each display currently shows, blanks trimmed.
    pub fn current_values(&self) -> DisplayValues {
        let mut values = blank_values();
        for (display, value) in values.iter_mut().enumerate() {
            if let Some(cells) = self.shared.buffer().load(display) {
                let _ = value.push_str(&cells_to_text(&cells));
            }
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::buffer::BLANK_CELLS;
    use crate::display::mux::tests::RecordingLines;
    use crate::display::mux::{MultiplexConfig, Multiplexer};
    use crate::display::glyph::Polarity;

    #[test]
    fn voltage_renders_two_decimals() {
        let shared = SharedDisplay::new();
        let r = Renderer::new(&shared);
        r.set_voltage(0, 1.6499);
        assert_eq!(shared.buffer().load(0), Some(*b"1.65"));
    }

    #[test]
    fn short_voltage_is_right_justified() {
        let shared = SharedDisplay::new();
        let r = Renderer::new(&shared);
        r.set_voltage(2, 123.4);
        assert_eq!(shared.buffer().load(2), Some(*b" 123"));
    }

    #[test]
    fn bad_index_is_ignored() {
        let shared = SharedDisplay::new();
        let r = Renderer::new(&shared);
        assert!(!r.set_text(3, "Hi"));
        assert!(!r.set_voltage(9, 1.0));
    }

    #[test]
    fn clear_twice_equals_clear_once() {
        let shared = SharedDisplay::new();
        let r = Renderer::new(&shared);
        r.fill("8888");
        r.clear();
        let once = r.current_values();
        r.clear();
        assert_eq!(r.current_values(), once);
        assert_eq!(shared.buffer().load(1), Some(BLANK_CELLS));
    }

    #[test]
    fn current_values_are_trimmed() {
        let shared = SharedDisplay::new();
        let r = Renderer::new(&shared);
        r.set_text(0, "Hi");
        r.set_text(1, "12");
        let values = r.current_values();
        assert_eq!(values[0].as_str(), "Hi");
        assert_eq!(values[1].as_str(), "12");
        assert_eq!(values[2].as_str(), "");
    }

    #[test]
    fn error_pattern_on_every_display() {
        let shared = SharedDisplay::new();
        let r = Renderer::new(&shared);
        r.show_error();
        for d in 0..DISPLAY_COUNT {
            assert_eq!(shared.buffer().load(d), Some(*b"Err "));
        }
    }

    #[test]
    fn no_digit_driven_after_stop_returns() {
        let shared = SharedDisplay::new();
        let r = Renderer::new(&shared);
        let mut lines = RecordingLines::new(Polarity::CommonAnode);
        let mut mux = Multiplexer::new(&shared, &mut lines, MultiplexConfig::default());

        r.start_multiplexing();
        assert!(mux.tick().is_some());
        r.stop_multiplexing();
        for _ in 0..24 {
            assert!(mux.tick().is_none());
        }
        drop(mux);
        assert!(lines.selected().is_empty());
    }
}
