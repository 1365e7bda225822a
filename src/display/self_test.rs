//! Bounded display self-test.
//!
//! A test is a finite sequence of frames: each segment in turn, the digits
//! 0-9, then the decimal point, dash and blank. The caller shows one frame
//! per step and decides the dwell time, so a running test never blocks and
//! can be dropped at any point.

use super::buffer::{Cells, BLANK_CELLS};
use super::glyph::{probe_code, SEGMENT_LINES};
use crate::config::DISPLAY_COUNT;

/// Contents of all three displays for one step.
pub type Frame = [Cells; DISPLAY_COUNT];

const DIGIT_STEPS: usize = 10;
const SPECIAL_GLYPHS: [u8; 3] = [b'.', b'-', b' '];

/// Which displays a test covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TestScope {
    AllDisplays,
    Display(usize),
}

/// Frame generator for a self-test run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfTest {
    scope: TestScope,
    step: usize,
}

impl SelfTest {
    /// Segment walk on each display in turn, then digits and glyphs on all.
    pub fn all_displays() -> Self {
        Self {
            scope: TestScope::AllDisplays,
            step: 0,
        }
    }

    /// Same sequence on a single display. `None` for an invalid index.
    pub fn single(display: usize) -> Option<Self> {
        (display < DISPLAY_COUNT).then_some(Self {
            scope: TestScope::Display(display),
            step: 0,
        })
    }

    pub fn scope(&self) -> TestScope {
        self.scope
    }

    /// Number of frames in the whole run.
    pub fn total_steps(&self) -> usize {
        let segment_steps = match self.scope {
            TestScope::AllDisplays => SEGMENT_LINES * DISPLAY_COUNT,
            TestScope::Display(_) => SEGMENT_LINES,
        };
        segment_steps + DIGIT_STEPS + SPECIAL_GLYPHS.len()
    }

    /// Frames not yet produced.
    pub fn remaining(&self) -> usize {
        self.total_steps().saturating_sub(self.step)
    }

    fn frame(&self, step: usize) -> Option<Frame> {
        let mut frame = [BLANK_CELLS; DISPLAY_COUNT];
        let (targets, segment_steps) = match self.scope {
            TestScope::AllDisplays => (0..DISPLAY_COUNT, SEGMENT_LINES * DISPLAY_COUNT),
            TestScope::Display(d) => (d..d + 1, SEGMENT_LINES),
        };

        if step < segment_steps {
            let (display, segment) = match self.scope {
                TestScope::AllDisplays => (step / SEGMENT_LINES, step % SEGMENT_LINES),
                TestScope::Display(d) => (d, step),
            };
            *frame.get_mut(display)? = [probe_code(segment as u8); 4];
            return Some(frame);
        }

        let step = step - segment_steps;
        let glyph = if step < DIGIT_STEPS {
            b'0' + step as u8
        } else {
            *SPECIAL_GLYPHS.get(step - DIGIT_STEPS)?
        };
        for display in targets {
            *frame.get_mut(display)? = [glyph; 4];
        }
        Some(frame)
    }
}

impl Iterator for SelfTest {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        let frame = self.frame(self.step)?;
        self.step += 1;
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::glyph::segment_mask;

    #[test]
    fn full_run_is_bounded() {
        let test = SelfTest::all_displays();
        assert_eq!(test.total_steps(), 37);
        assert_eq!(test.count(), 37);
    }

    #[test]
    fn single_display_run_is_shorter() {
        let test = SelfTest::single(2).unwrap();
        assert_eq!(test.total_steps(), 21);
        assert_eq!(test.count(), 21);
    }

    #[test]
    fn single_rejects_bad_index() {
        assert!(SelfTest::single(3).is_none());
    }

    #[test]
    fn segment_walk_lights_one_segment_on_one_display() {
        let mut test = SelfTest::all_displays();
        let first = test.next().unwrap();
        assert_eq!(segment_mask(first[0][0]), 1);
        assert_eq!(first[1], BLANK_CELLS);

        // Ninth frame: display 1, segment a.
        let ninth = test.nth(7).unwrap();
        assert_eq!(ninth[0], BLANK_CELLS);
        assert_eq!(segment_mask(ninth[1][3]), 1);
    }

    #[test]
    fn digits_follow_segments() {
        let mut test = SelfTest::all_displays();
        let frame = test.nth(24).unwrap();
        assert_eq!(frame, [*b"0000"; 3]);
        let frame = test.nth(8).unwrap();
        assert_eq!(frame, [*b"9999"; 3]);
        assert_eq!(test.next().unwrap(), [*b"...."; 3]);
        assert_eq!(test.next().unwrap(), [*b"----"; 3]);
        assert_eq!(test.next().unwrap(), [BLANK_CELLS; 3]);
        assert!(test.next().is_none());
    }

    #[test]
    fn single_display_leaves_others_blank() {
        for frame in SelfTest::single(1).unwrap() {
            assert_eq!(frame[0], BLANK_CELLS);
            assert_eq!(frame[2], BLANK_CELLS);
        }
    }

    #[test]
    fn remaining_counts_down() {
        let mut test = SelfTest::single(0).unwrap();
        assert_eq!(test.remaining(), 21);
        test.next();
        assert_eq!(test.remaining(), 20);
    }
}
