//! Incrementally maintained median over a trailing window.

use std::collections::VecDeque;

/// Median of the most recent values, updated one value at a time.
///
/// Keeps a sorted copy of the window so each push is a binary search plus
/// one insertion (and one removal once the window is full).
#[derive(Debug, Clone, Default)]
pub struct RunningMedian {
    window: Option<usize>,
    history: VecDeque<f64>,
    sorted: Vec<f64>,
}

impl RunningMedian {
    /// `None` keeps every value pushed.
    pub fn new(window: Option<usize>) -> Self {
        Self {
            window,
            history: VecDeque::new(),
            sorted: Vec::new(),
        }
    }

    pub fn push(&mut self, value: f64) {
        let at = self.sorted.partition_point(|v| v.total_cmp(&value).is_lt());
        self.sorted.insert(at, value);
        self.history.push_back(value);

        if let Some(window) = self.window {
            while self.history.len() > window {
                if let Some(oldest) = self.history.pop_front() {
                    let at = self.sorted.partition_point(|v| v.total_cmp(&oldest).is_lt());
                    self.sorted.remove(at);
                }
            }
        }
    }

    /// Median of the values in the window, `None` when empty.
    pub fn median(&self) -> Option<f64> {
        let n = self.sorted.len();
        if n == 0 {
            return None;
        }
        if n % 2 == 1 {
            Some(self.sorted[n / 2])
        } else {
            Some((self.sorted[n / 2 - 1] + self.sorted[n / 2]) / 2.0)
        }
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }
}
