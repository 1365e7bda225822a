//! Calibration factor persistence.
//!
//! Record layout (13 bytes):
//! ```text
//! Byte 0:     format version (1)
//! Byte 1..13: three f32 factors, little-endian
//! ```

use crate::config::ADC_CHANNEL_COUNT;

/// Serialized record size.
pub const CALIBRATION_RECORD_LEN: usize = 1 + 4 * ADC_CHANNEL_COUNT;

const RECORD_VERSION: u8 = 1;

/// Factor every channel starts with.
pub const DEFAULT_FACTOR: f32 = 1.0;

/// True for a factor that can be applied to a reading.
pub fn is_valid_factor(factor: f32) -> bool {
    factor.is_finite() && factor > 0.0
}

/// Serialize the factors for flash storage.
pub fn encode_calibration(factors: [f32; ADC_CHANNEL_COUNT]) -> [u8; CALIBRATION_RECORD_LEN] {
    let mut out = [0u8; CALIBRATION_RECORD_LEN];
    out[0] = RECORD_VERSION;
    for (chunk, f) in out[1..].chunks_exact_mut(4).zip(factors) {
        chunk.copy_from_slice(&f.to_le_bytes());
    }
    out
}

/// Deserialize. Returns `None` for an unknown version, a wrong length,
/// or any factor that is not a positive finite number.
pub fn decode_calibration(data: &[u8]) -> Option<[f32; ADC_CHANNEL_COUNT]> {
    if data.len() != CALIBRATION_RECORD_LEN || data[0] != RECORD_VERSION {
        return None;
    }
    let mut factors = [DEFAULT_FACTOR; ADC_CHANNEL_COUNT];
    for (f, chunk) in factors.iter_mut().zip(data[1..].chunks_exact(4)) {
        *f = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        if !is_valid_factor(*f) {
            return None;
        }
    }
    Some(factors)
}

/// Where calibration factors live between resets.
#[allow(async_fn_in_trait)]
pub trait CalibrationStore {
    /// Stored factors, or all [`DEFAULT_FACTOR`] when nothing usable is stored.
    async fn load(&mut self) -> [f32; ADC_CHANNEL_COUNT];

    /// Persist the factors. Failures are logged by the implementation.
    async fn save(&mut self, factors: [f32; ADC_CHANNEL_COUNT]);
}
