//! Fixed-capacity FIFO moving average.
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct MovingAverage {
    window: VecDeque<f64>,
    capacity: usize,
}

impl MovingAverage {
    /// A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert `v`, evicting the oldest value when full, and return the mean.
    pub fn push(&mut self, v: f64) -> f64 {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(v);
        self.window.iter().sum::<f64>() / self.window.len() as f64
    }

    pub fn mean(&self) -> Option<f64> {
        if self.window.is_empty() {
            None
        } else {
            Some(self.window.iter().sum::<f64>() / self.window.len() as f64)
        }
    }

    /// Oldest first.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.window.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_first() {
        let mut ma = MovingAverage::new(5);
        let mut last = 0.0;
        for v in [10.0, 20.0, 30.0, 40.0, 50.0, 60.0] {
            last = ma.push(v);
        }
        assert_eq!(ma.values().collect::<Vec<_>>(), vec![20.0, 30.0, 40.0, 50.0, 60.0]);
        assert_eq!(last, 40.0);
        assert_eq!(ma.mean(), Some(40.0));
    }

    #[test]
    fn partial_window_averages_what_it_has() {
        let mut ma = MovingAverage::new(5);
        assert_eq!(ma.mean(), None);
        ma.push(2.0);
        assert_eq!(ma.push(4.0), 3.0);
        assert_eq!(ma.len(), 2);
    }

    #[test]
    fn zero_capacity_holds_one() {
        let mut ma = MovingAverage::new(0);
        ma.push(1.0);
        assert_eq!(ma.push(7.0), 7.0);
        assert_eq!(ma.capacity(), 1);
    }
}
