use std::{collections::VecDeque, time::Duration};

/// a fixed-capacity, time-ordered buffer of samples.
///
/// once the window is full, pushing a new sample evicts the oldest one.
#[derive(Clone, Debug, PartialEq)]
pub struct Window<T> {
    samples: VecDeque<T>,
    capacity: usize,
}

// === impl Window ===

impl<T> Window<T> {
    /// creates an empty window holding at most `capacity` samples.
    ///
    /// a window always has room for at least one sample.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// creates a window covering `duration` when sampled every `interval`.
    pub fn spanning(duration: Duration, interval: Duration) -> Self {
        Self::with_capacity(Self::capacity_for(duration, interval))
    }

    /// the number of samples needed to cover `duration` at the given `interval`.
    pub fn capacity_for(duration: Duration, interval: Duration) -> usize {
        if interval.is_zero() {
            return 1;
        }

        // small epsilon so that e.g. 10s / 0.5s isn't floored to 19.
        let ratio = duration.as_secs_f64() / interval.as_secs_f64();
        ((ratio + 1e-9).floor() as usize).max(1)
    }

    /// appends a sample, evicting the oldest one if the window is full.
    pub fn push(&mut self, sample: T) {
        let Self { samples, capacity } = self;

        if samples.len() == *capacity {
            samples.pop_front();
        }
        samples.push_back(sample);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// the most recent sample, if any.
    pub fn latest(&self) -> Option<&T> {
        self.samples.back()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.samples.get(index)
    }

    /// iterates from the oldest to the most recent sample.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.samples.iter()
    }
}

impl<'a, T> IntoIterator for &'a Window<T> {
    type Item = &'a T;
    type IntoIter = std::collections::vec_deque::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_up_to_capacity() {
        let mut window = Window::with_capacity(4);
        for x in [1, 2, 3] {
            window.push(x);
        }
        assert_eq!(window.iter().copied().collect::<Vec<_>>(), [1, 2, 3]);
        assert_eq!(window.latest(), Some(&3));
    }

    #[test]
    fn evicts_oldest_first() {
        let mut window = Window::with_capacity(3);
        for x in 1..=7 {
            window.push(x);
            assert!(window.len() <= window.capacity());
        }
        assert_eq!(window.iter().copied().collect::<Vec<_>>(), [5, 6, 7]);
    }

    #[test]
    fn capacity_is_never_zero() {
        let mut window = Window::with_capacity(0);
        window.push("a");
        window.push("b");
        assert_eq!(window.capacity(), 1);
        assert_eq!(window.latest(), Some(&"b"));
    }

    #[test]
    fn capacity_from_durations() {
        let secs = Duration::from_secs_f64;
        assert_eq!(Window::<f64>::capacity_for(secs(10.0), secs(0.5)), 20);
        assert_eq!(Window::<f64>::capacity_for(secs(10.0), secs(2.0)), 5);
        assert_eq!(Window::<f64>::capacity_for(secs(10.0), secs(3.0)), 3);
        assert_eq!(Window::<f64>::capacity_for(secs(1.0), secs(2.0)), 1);
        assert_eq!(Window::<f64>::capacity_for(secs(1.0), Duration::ZERO), 1);
    }

    #[test]
    fn empty_window() {
        let window = Window::<f64>::spanning(Duration::from_secs(10), Duration::from_secs(1));
        assert!(window.is_empty());
        assert_eq!(window.latest(), None);
        assert_eq!(window.capacity(), 10);
    }
}
