//! Raw reading → voltage → calibrated → filtered.

use super::calibration::{is_valid_factor, DEFAULT_FACTOR};
use super::filter::MovingAverage;
use crate::config::{ADC_CHANNEL_COUNT, ADC_MAX_RAW, ADC_REFERENCE_VOLTS, FILTER_WINDOW};
use crate::error::{CalibrationError, HardwareReadFault};

/// One analog converter with [`ADC_CHANNEL_COUNT`] channels.
pub trait SampleSource {
    fn read(&mut self, channel: usize) -> Result<u16, HardwareReadFault>;
}

impl<S: SampleSource + ?Sized> SampleSource for &mut S {
    fn read(&mut self, channel: usize) -> Result<u16, HardwareReadFault> {
        (**self).read(channel)
    }
}

/// Converter scale.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PipelineConfig {
    pub full_scale_raw: u16,
    pub reference_volts: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            full_scale_raw: ADC_MAX_RAW,
            reference_volts: ADC_REFERENCE_VOLTS,
        }
    }
}

/// Everything known about the latest reading of one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VoltageSample {
    pub channel: u8,
    pub raw: u16,
    pub voltage: f32,
    pub calibration_factor: f32,
    pub filtered_voltage: f32,
}

impl VoltageSample {
    const fn empty(channel: u8) -> Self {
        Self {
            channel,
            raw: 0,
            voltage: 0.0,
            calibration_factor: DEFAULT_FACTOR,
            filtered_voltage: 0.0,
        }
    }
}

pub struct SamplePipeline<S> {
    source: S,
    config: PipelineConfig,
    factors: [f32; ADC_CHANNEL_COUNT],
    filters: [MovingAverage<FILTER_WINDOW>; ADC_CHANNEL_COUNT],
    last: [VoltageSample; ADC_CHANNEL_COUNT],
}

impl<S: SampleSource> SamplePipeline<S> {
    pub fn new(source: S, config: PipelineConfig) -> Self {
        Self {
            source,
            config,
            factors: [DEFAULT_FACTOR; ADC_CHANNEL_COUNT],
            filters: core::array::from_fn(|_| MovingAverage::new()),
            last: core::array::from_fn(|channel| VoltageSample::empty(channel as u8)),
        }
    }

    /// Raw converter value in `0..=full_scale_raw`. A fault or an unknown
    /// channel reads as 0.
    pub fn read_raw(&mut self, channel: usize) -> u16 {
        if channel >= ADC_CHANNEL_COUNT {
            warn!("sampling: channel {} out of range", channel);
            return 0;
        }
        match self.source.read(channel) {
            Ok(raw) => raw.min(self.config.full_scale_raw),
            Err(fault) => {
                warn!("sampling: read fault on channel {}", fault.channel);
                0
            }
        }
    }

    pub fn to_voltage(&self, raw: u16) -> f32 {
        if self.config.full_scale_raw == 0 {
            return 0.0;
        }
        raw as f32 / self.config.full_scale_raw as f32 * self.config.reference_volts
    }

    pub fn apply_calibration(&self, channel: usize, volts: f32) -> f32 {
        volts * self.factors.get(channel).copied().unwrap_or(DEFAULT_FACTOR)
    }

    /// Push into the channel's window and return the new mean.
    pub fn filter(&mut self, channel: usize, volts: f32) -> f32 {
        match self.filters.get_mut(channel) {
            Some(f) => f.push(volts),
            None => volts,
        }
    }

    /// Full chain for one channel. The result is also kept as the
    /// channel's last reading.
    pub fn sample(&mut self, channel: usize) -> VoltageSample {
        let raw = self.read_raw(channel);
        let voltage = self.apply_calibration(channel, self.to_voltage(raw));
        let filtered_voltage = self.filter(channel, voltage);
        let sample = VoltageSample {
            channel: channel as u8,
            raw,
            voltage,
            calibration_factor: self.factors.get(channel).copied().unwrap_or(DEFAULT_FACTOR),
            filtered_voltage,
        };
        if let Some(slot) = self.last.get_mut(channel) {
            *slot = sample;
        }
        sample
    }

    /// Filtered voltage of every channel.
    pub fn read_all_voltages(&mut self) -> [f32; ADC_CHANNEL_COUNT] {
        let mut out = [0.0; ADC_CHANNEL_COUNT];
        for (channel, v) in out.iter_mut().enumerate() {
            *v = self.sample(channel).filtered_voltage;
        }
        out
    }

    /// Derive the factor that makes `channel` read `known_volts`.
    ///
    /// The factor is reset to 1.0 and one filtered reading taken. If that
    /// reading is not positive, the prior factor is restored. The filter
    /// history is not cleared, so calibrate against a settled input.
    pub fn auto_calibrate(
        &mut self,
        channel: usize,
        known_volts: f32,
    ) -> Result<f32, CalibrationError> {
        if channel >= ADC_CHANNEL_COUNT {
            return Err(CalibrationError::InvalidChannel);
        }
        if !is_valid_factor(known_volts) {
            return Err(CalibrationError::CalibrationFailed);
        }
        let prior = self.factors[channel];
        self.factors[channel] = DEFAULT_FACTOR;
        let measured = self.sample(channel).filtered_voltage;

        let factor = known_volts / measured;
        if measured <= 0.0 || !is_valid_factor(factor) {
            self.factors[channel] = prior;
            warn!("sampling: calibration of channel {} failed, measured {}", channel, measured);
            return Err(CalibrationError::CalibrationFailed);
        }
        self.factors[channel] = factor;
        info!("sampling: channel {} factor {}", channel, factor);
        Ok(factor)
    }

    pub fn set_calibration(&mut self, channel: usize, factor: f32) -> Result<(), CalibrationError> {
        let slot = self
            .factors
            .get_mut(channel)
            .ok_or(CalibrationError::InvalidChannel)?;
        if !is_valid_factor(factor) {
            return Err(CalibrationError::CalibrationFailed);
        }
        *slot = factor;
        Ok(())
    }

    /// Replace every factor, e.g. after loading from flash. Unusable
    /// values fall back to 1.0.
    pub fn restore_calibration(&mut self, factors: [f32; ADC_CHANNEL_COUNT]) {
        for (slot, f) in self.factors.iter_mut().zip(factors) {
            *slot = if is_valid_factor(f) { f } else { DEFAULT_FACTOR };
        }
    }

    pub fn calibration(&self) -> [f32; ADC_CHANNEL_COUNT] {
        self.factors
    }

    pub fn last_readings(&self) -> &[VoltageSample; ADC_CHANNEL_COUNT] {
        &self.last
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}
