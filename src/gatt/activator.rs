//! Retry wrapper around radio activation.
//!
//! [`GattSession::activate`](super::GattSession::activate) makes one
//! attempt. Bring-up code wraps it in a [`RadioActivator`] with whatever
//! [`RetryStrategy`] suits the board.

use embedded_hal_async::delay::DelayNs;

use crate::config::{RADIO_ACTIVATION_ATTEMPTS, RADIO_ACTIVATION_DELAY_MS};
use crate::error::GattError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RetryStrategy {
    Once,
    FixedDelay { attempts: u8, delay_ms: u32 },
    /// Delay doubles after each failure, capped at `max_ms`.
    Exponential { attempts: u8, base_ms: u32, max_ms: u32 },
}

impl Default for RetryStrategy {
    fn default() -> Self {
        RetryStrategy::FixedDelay {
            attempts: RADIO_ACTIVATION_ATTEMPTS,
            delay_ms: RADIO_ACTIVATION_DELAY_MS,
        }
    }
}

impl RetryStrategy {
    /// Total attempts, never less than one.
    pub fn attempts(&self) -> u8 {
        match *self {
            RetryStrategy::Once => 1,
            RetryStrategy::FixedDelay { attempts, .. }
            | RetryStrategy::Exponential { attempts, .. } => attempts.max(1),
        }
    }

    /// Wait after failed attempt number `failed` (1-based).
    pub fn delay_after(&self, failed: u8) -> u32 {
        match *self {
            RetryStrategy::Once => 0,
            RetryStrategy::FixedDelay { delay_ms, .. } => delay_ms,
            RetryStrategy::Exponential {
                base_ms, max_ms, ..
            } => {
                let shift = u32::from(failed.saturating_sub(1)).min(31);
                base_ms.saturating_mul(1u32 << shift).min(max_ms)
            }
        }
    }
}

pub struct RadioActivator<D> {
    delay: D,
    strategy: RetryStrategy,
}

impl<D: DelayNs> RadioActivator<D> {
    pub fn new(delay: D, strategy: RetryStrategy) -> Self {
        Self { delay, strategy }
    }

    pub fn strategy(&self) -> RetryStrategy {
        self.strategy
    }

    /// Run `attempt` until it succeeds or the strategy gives up. Returns
    /// the number of attempts used, or the last error.
    pub async fn activate<F>(&mut self, mut attempt: F) -> Result<u8, GattError>
    where
        F: FnMut() -> Result<(), GattError>,
    {
        let total = self.strategy.attempts();
        let mut n = 1;
        loop {
            match attempt() {
                Ok(()) => return Ok(n),
                Err(e) if n >= total => {
                    error!("radio: activation failed after {} attempts", n);
                    return Err(e);
                }
                Err(_) => {
                    let wait = self.strategy.delay_after(n);
                    warn!("radio: activation attempt {} failed, retrying in {} ms", n, wait);
                    self.delay.delay_ms(wait).await;
                    n += 1;
                }
            }
        }
    }
}
