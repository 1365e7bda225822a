//! Node orchestrators.
//!
//! Each firmware binary owns one orchestrator and feeds it radio events,
//! timer ticks and samples. The orchestrators hold no hardware handles, so
//! a whole node runs on the host against a mock radio.

pub mod display;
pub mod heartbeat;
pub mod meter;
pub mod status;

pub use display::DisplayNode;
pub use heartbeat::{Heartbeat, LinkMode};
pub use meter::{MeterEffect, MeterNode, MeterSettings, DISPLAY_TARGET};
pub use status::{LogSink, StatusEvent, StatusSink};
