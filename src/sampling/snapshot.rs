//! Last converter result as a [`SampleSource`].
//!
//! The converter is sampled asynchronously, all channels at once; the
//! pipeline reads channels one by one. The snapshot sits between the two.

use super::pipeline::SampleSource;
use crate::config::ADC_CHANNEL_COUNT;
use crate::error::HardwareReadFault;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdcSnapshot {
    raw: [i16; ADC_CHANNEL_COUNT],
    fresh: bool,
}

impl AdcSnapshot {
    pub const fn new() -> Self {
        Self {
            raw: [0; ADC_CHANNEL_COUNT],
            fresh: false,
        }
    }

    /// Store one conversion of every channel.
    pub fn update(&mut self, raw: [i16; ADC_CHANNEL_COUNT]) {
        self.raw = raw;
        self.fresh = true;
    }

    /// Mark the stored conversion unusable after a failed conversion.
    pub fn invalidate(&mut self) {
        self.fresh = false;
    }
}

impl Default for AdcSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSource for AdcSnapshot {
    fn read(&mut self, channel: usize) -> Result<u16, HardwareReadFault> {
        let fault = HardwareReadFault {
            channel: channel as u8,
        };
        if !self.fresh {
            return Err(fault);
        }
        // Single-ended inputs dip slightly below zero around ground.
        self.raw
            .get(channel)
            .map(|&raw| raw.max(0) as u16)
            .ok_or(fault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::{PipelineConfig, SamplePipeline};

    #[test]
    fn unread_snapshot_faults() {
        let mut snapshot = AdcSnapshot::new();
        assert!(snapshot.read(0).is_err());
    }

    #[test]
    fn negative_readings_clamp_to_zero() {
        let mut snapshot = AdcSnapshot::new();
        snapshot.update([-4, 2048, 4095]);
        assert_eq!(snapshot.read(0), Ok(0));
        assert_eq!(snapshot.read(1), Ok(2048));
        assert_eq!(snapshot.read(2), Ok(4095));
    }

    #[test]
    fn out_of_range_channel_faults() {
        let mut snapshot = AdcSnapshot::new();
        snapshot.update([1, 2, 3]);
        assert_eq!(snapshot.read(3), Err(HardwareReadFault { channel: 3 }));
    }

    #[test]
    fn invalidated_snapshot_faults_until_next_update() {
        let mut snapshot = AdcSnapshot::new();
        snapshot.update([1, 2, 3]);
        snapshot.invalidate();
        assert!(snapshot.read(1).is_err());
        snapshot.update([1, 2, 3]);
        assert_eq!(snapshot.read(1), Ok(2));
    }

    #[test]
    fn failed_conversion_reads_as_zero_in_pipeline() {
        let mut pipeline = SamplePipeline::new(AdcSnapshot::new(), PipelineConfig::default());
        pipeline.source_mut().update([4095, 4095, 4095]);
        assert_eq!(pipeline.read_raw(0), 4095);

        pipeline.source_mut().invalidate();
        assert_eq!(pipeline.read_raw(0), 0);
        assert_eq!(pipeline.read_raw(2), 0);
    }
}
