//! Analog sampling: scale, calibrate, then smooth each channel.

pub mod calibration;
pub mod filter;
pub mod pipeline;
pub mod snapshot;

pub use calibration::{decode_calibration, encode_calibration, CalibrationStore};
pub use filter::MovingAverage;
pub use pipeline::{PipelineConfig, SamplePipeline, SampleSource, VoltageSample};
pub use snapshot::AdcSnapshot;
