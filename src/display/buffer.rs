//! Display buffer shared between the command path and the multiplex tick.
//!
//! Each display's four cells are packed into one `AtomicU32` (cell 0 in the
//! low byte), so writing a display is a single store and the tick can never
//! observe a half-written display.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::config::{DIGITS_PER_DISPLAY, DISPLAY_COUNT};

/// Four character cells of one display.
pub type Cells = [u8; DIGITS_PER_DISPLAY];

/// Four spaces.
pub const BLANK_CELLS: Cells = [b' '; DIGITS_PER_DISPLAY];

const BLANK_WORD: u32 = u32::from_le_bytes(BLANK_CELLS);

#[allow(clippy::declare_interior_mutable_const)]
const BLANK_ATOMIC: AtomicU32 = AtomicU32::new(BLANK_WORD);

/// Fixed 3 × 4 cell buffer.
pub struct DisplayBuffer {
    words: [AtomicU32; DISPLAY_COUNT],
}

impl DisplayBuffer {
    pub const fn new() -> Self {
        Self {
            words: [BLANK_ATOMIC; DISPLAY_COUNT],
        }
    }

    /// Replace all four cells of `display`. Returns false for a bad index.
    pub fn store(&self, display: usize, cells: Cells) -> bool {
        match self.words.get(display) {
            Some(word) => {
                word.store(u32::from_le_bytes(cells), Ordering::Release);
                true
            }
            None => false,
        }
    }

    /// All four cells of `display`.
    pub fn load(&self, display: usize) -> Option<Cells> {
        self.words
            .get(display)
            .map(|word| word.load(Ordering::Acquire).to_le_bytes())
    }

    /// One cell; out-of-range positions read as blank.
    pub fn cell(&self, display: usize, digit: usize) -> u8 {
        self.load(display)
            .and_then(|cells| cells.get(digit).copied())
            .unwrap_or(b' ')
    }

    pub fn clear(&self) {
        for word in &self.words {
            word.store(BLANK_WORD, Ordering::Release);
        }
    }
}

impl Default for DisplayBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the tick context reads: the buffer and the run flag.
///
/// Meant to live in a `static` so both execution contexts can borrow it.
pub struct SharedDisplay {
    buffer: DisplayBuffer,
    running: AtomicBool,
}

impl SharedDisplay {
    pub const fn new() -> Self {
        Self {
            buffer: DisplayBuffer::new(),
            running: AtomicBool::new(false),
        }
    }

    pub fn buffer(&self) -> &DisplayBuffer {
        &self.buffer
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }
}

impl Default for SharedDisplay {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_blank() {
        let buf = DisplayBuffer::new();
        for d in 0..DISPLAY_COUNT {
            assert_eq!(buf.load(d), Some(BLANK_CELLS));
        }
    }

    #[test]
    fn store_and_load_whole_display() {
        let buf = DisplayBuffer::new();
        assert!(buf.store(1, *b"1.65"));
        assert_eq!(buf.load(1), Some(*b"1.65"));
        assert_eq!(buf.cell(1, 0), b'1');
        assert_eq!(buf.cell(1, 3), b'5');
        assert_eq!(buf.load(0), Some(BLANK_CELLS));
    }

    #[test]
    fn out_of_range_is_harmless() {
        let buf = DisplayBuffer::new();
        assert!(!buf.store(3, *b"8888"));
        assert_eq!(buf.load(3), None);
        assert_eq!(buf.cell(7, 0), b' ');
        assert_eq!(buf.cell(0, 9), b' ');
    }

    #[test]
    fn clear_is_idempotent() {
        let buf = DisplayBuffer::new();
        buf.store(0, *b"Err ");
        buf.clear();
        let once: [Option<Cells>; 3] = [buf.load(0), buf.load(1), buf.load(2)];
        buf.clear();
        let twice: [Option<Cells>; 3] = [buf.load(0), buf.load(1), buf.load(2)];
        assert_eq!(once, twice);
        assert_eq!(once, [Some(BLANK_CELLS); 3]);
    }
}
