//! Seven-segment display renderer.
//!
//! Three 4-digit displays share eight segment lines and are multiplexed
//! through twelve digit-select lines. The renderer is split by execution
//! context:
//!
//! - [`Renderer`] runs in the main context and writes the buffer.
//! - [`Multiplexer`] runs in the timer context and drives the lines.
//!
//! They meet in a [`SharedDisplay`], which holds one atomic word per
//! display and the run flag.

pub mod buffer;
pub mod format;
pub mod glyph;
pub mod mux;
pub mod renderer;
pub mod self_test;

pub use buffer::{Cells, DisplayBuffer, SharedDisplay};
pub use format::format_voltage;
pub use glyph::Polarity;
pub use mux::{DriveLines, GpioDriveLines, MultiplexConfig, Multiplexer};
pub use renderer::Renderer;
pub use self_test::{Frame, SelfTest, TestScope};
