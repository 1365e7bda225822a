//! Persistent storage for the voltmeter calibration factors.
//!
//! Uses the nRF52840's internal flash via the `sequential-storage` crate.
//! One record under [`KEY_CALIBRATION`] holds all three factors; the
//! record layout lives in [`crate::sampling::calibration`].

use crate::config::{ADC_CHANNEL_COUNT, STORAGE_FLASH_PAGE_COUNT, STORAGE_FLASH_PAGE_START};
use crate::sampling::calibration::{
    decode_calibration, encode_calibration, CalibrationStore, CALIBRATION_RECORD_LEN,
    DEFAULT_FACTOR,
};
use embedded_storage_async::nor_flash::NorFlash;

/// Flash page size for nRF52840 (4 KB).
const FLASH_PAGE_SIZE: u32 = 4096;

/// Start address of our storage region.
const STORAGE_START: u32 = STORAGE_FLASH_PAGE_START * FLASH_PAGE_SIZE;

/// End address (exclusive) of our storage region.
const STORAGE_END: u32 = (STORAGE_FLASH_PAGE_START + STORAGE_FLASH_PAGE_COUNT) * FLASH_PAGE_SIZE;

/// Key of the calibration record in the map storage.
const KEY_CALIBRATION: u8 = 0x01;

/// Scratch buffer for sequential-storage (record plus item header).
const SCRATCH_SIZE: usize = 64;

/// Calibration factors backed by a flash region.
///
/// Keeps the last value written so an unchanged set is not rewritten.
pub struct FlashCalibrationStore<F> {
    flash: F,
    saved: Option<[f32; ADC_CHANNEL_COUNT]>,
}

impl<F: NorFlash> FlashCalibrationStore<F> {
    pub fn new(flash: F) -> Self {
        Self { flash, saved: None }
    }
}

impl<F: NorFlash> CalibrationStore for FlashCalibrationStore<F> {
    async fn load(&mut self) -> [f32; ADC_CHANNEL_COUNT] {
        let mut buf = [0u8; SCRATCH_SIZE];

        let factors = match sequential_storage::map::fetch_item::<u8, &[u8], _>(
            &mut self.flash,
            STORAGE_START..STORAGE_END,
            &mut sequential_storage::cache::NoCache::new(),
            &mut buf,
            &KEY_CALIBRATION,
        )
        .await
        {
            Ok(Some(data)) => match decode_calibration(data) {
                Some(factors) => {
                    info!("Loaded calibration from flash: {}", factors);
                    Some(factors)
                }
                None => {
                    warn!("Calibration record malformed ({} bytes)", data.len());
                    None
                }
            },
            Ok(None) => {
                info!("No calibration in flash");
                None
            }
            Err(e) => {
                error!("Flash read error: {:?}", defmt::Debug2Format(&e));
                None
            }
        };

        self.saved = factors;
        factors.unwrap_or([DEFAULT_FACTOR; ADC_CHANNEL_COUNT])
    }

    async fn save(&mut self, factors: [f32; ADC_CHANNEL_COUNT]) {
        if self.saved == Some(factors) {
            debug!("Calibration unchanged, not saving");
            return;
        }

        let mut buf = [0u8; SCRATCH_SIZE];
        let record: [u8; CALIBRATION_RECORD_LEN] = encode_calibration(factors);
        let item: &[u8] = &record;

        match sequential_storage::map::store_item::<u8, &[u8], _>(
            &mut self.flash,
            STORAGE_START..STORAGE_END,
            &mut sequential_storage::cache::NoCache::new(),
            &mut buf,
            &KEY_CALIBRATION,
            &item,
        )
        .await
        {
            Ok(_) => {
                info!("Saved calibration to flash: {}", factors);
                self.saved = Some(factors);
            }
            Err(e) => {
                error!("Flash write error: {:?}", defmt::Debug2Format(&e));
            }
        }
    }
}

