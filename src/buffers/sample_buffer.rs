use crate::core::Sample;
use std::collections::VecDeque;

/// FIFO accumulator of decoded samples owned by one stage.
///
/// Samples are appended at the tail and leave only as whole windows from the
/// head. There is no capacity cap; crossing `warn_threshold` is reported once
/// until the backlog drains below it again.
#[derive(Debug)]
pub struct SampleBuffer {
    samples: VecDeque<Sample>,
    warn_threshold: usize,
    over_threshold: bool,
}

impl SampleBuffer {
    pub fn new(warn_threshold: usize) -> Self {
        Self {
            samples: VecDeque::new(),
            warn_threshold,
            over_threshold: false,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Append a decoded chunk.
    ///
    /// Returns true when this append pushed the backlog past the warning
    /// threshold.
    pub fn extend(&mut self, chunk: impl IntoIterator<Item = Sample>) -> bool {
        self.samples.extend(chunk);
        if self.samples.len() > self.warn_threshold && !self.over_threshold {
            self.over_threshold = true;
            return true;
        }
        false
    }

    /// Remove exactly `size` samples from the head, or nothing if fewer are buffered
    pub fn take_window(&mut self, size: usize) -> Option<Vec<Sample>> {
        if size == 0 || self.samples.len() < size {
            return None;
        }
        let window: Vec<Sample> = self.samples.drain(..size).collect();
        if self.samples.len() <= self.warn_threshold {
            self.over_threshold = false;
        }
        Some(window)
    }

    /// Drop everything buffered, returning how many samples were discarded
    pub fn clear(&mut self) -> usize {
        let discarded = self.samples.len();
        self.samples.clear();
        self.over_threshold = false;
        discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(start: usize, len: usize) -> Vec<Sample> {
        (start..start + len)
            .map(|n| Sample::new(n as f32, -(n as f32)))
            .collect()
    }

    #[test]
    fn test_take_window_requires_full_window() {
        let mut buffer = SampleBuffer::new(usize::MAX);
        buffer.extend(ramp(0, 5));
        assert!(buffer.take_window(6).is_none());
        assert_eq!(buffer.len(), 5);
    }

    #[test]
    fn test_take_window_is_fifo() {
        let mut buffer = SampleBuffer::new(usize::MAX);
        buffer.extend(ramp(0, 7));

        let window = buffer.take_window(4).unwrap();
        assert_eq!(window, ramp(0, 4));
        assert_eq!(buffer.len(), 3);

        buffer.extend(ramp(7, 1));
        assert_eq!(buffer.take_window(4).unwrap(), ramp(4, 4));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_warning_fires_once_until_drained() {
        let mut buffer = SampleBuffer::new(10);
        assert!(!buffer.extend(ramp(0, 8)));
        assert!(buffer.extend(ramp(8, 4)));
        assert!(!buffer.extend(ramp(12, 4)));

        buffer.take_window(8).unwrap();
        assert!(buffer.extend(ramp(16, 8)));
    }

    #[test]
    fn test_clear_reports_discarded() {
        let mut buffer = SampleBuffer::new(usize::MAX);
        buffer.extend(ramp(0, 3));
        assert_eq!(buffer.clear(), 3);
        assert!(buffer.is_empty());
    }
}
