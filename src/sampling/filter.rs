//! Bounded moving average.

use heapless::HistoryBuffer;

/// Mean of the last `N` values pushed.
///
/// Before `N` values have arrived the mean is over what exists.
pub struct MovingAverage<const N: usize> {
    history: HistoryBuffer<f32, N>,
}

impl<const N: usize> MovingAverage<N> {
    pub const fn new() -> Self {
        Self {
            history: HistoryBuffer::new(),
        }
    }

    /// Push a value and return the new mean.
    pub fn push(&mut self, value: f32) -> f32 {
        self.history.write(value);
        self.mean()
    }

    /// Mean of the held values, 0.0 when empty.
    pub fn mean(&self) -> f32 {
        let held = self.history.as_slice();
        if held.is_empty() {
            return 0.0;
        }
        held.iter().sum::<f32>() / held.len() as f32
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.len() == 0
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

impl<const N: usize> Default for MovingAverage<N> {
    fn default() -> Self {
        Self::new()
    }
}
