//! Append-only series of sensor readings.

use std::collections::VecDeque;

/// The accumulated history of accepted readings and their positional labels.
///
/// Labels are assigned sequentially starting at 1. Both sequences always have
/// the same length and grow by exactly one element per [`Series::ingest`].
///
/// By default the series is unbounded. A retention cap can be set with
/// [`Series::bounded`], in which case the oldest point is evicted from both
/// sequences once the cap is reached. Labels keep counting from the total
/// number of accepted readings, so they are never reused.
#[derive(Debug, Clone, Default)]
pub struct Series {
    labels: VecDeque<u64>,
    values: VecDeque<f64>,
    /// Total readings accepted since creation (including evicted ones).
    accepted: u64,
    capacity: Option<usize>,
}

impl Series {
    /// Create an empty, unbounded series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty series that retains at most `max_points` readings.
    ///
    /// A cap of zero is treated as one; the latest reading is always kept.
    pub fn bounded(max_points: usize) -> Self {
        Self {
            capacity: Some(max_points.max(1)),
            ..Self::default()
        }
    }

    /// Create a series with an optional retention cap.
    pub fn with_capacity_limit(max_points: Option<usize>) -> Self {
        match max_points {
            Some(n) => Self::bounded(n),
            None => Self::new(),
        }
    }

    /// Append one reading and return the label assigned to it.
    pub fn ingest(&mut self, value: f64) -> u64 {
        self.accepted += 1;
        let label = self.accepted;

        self.labels.push_back(label);
        self.values.push_back(value);

        if let Some(cap) = self.capacity {
            while self.values.len() > cap {
                self.labels.pop_front();
                self.values.pop_front();
            }
        }

        label
    }

    /// Labels of the retained readings, oldest first.
    pub fn labels(&self) -> &VecDeque<u64> {
        &self.labels
    }

    /// Values of the retained readings, oldest first.
    pub fn values(&self) -> &VecDeque<f64> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Total number of readings accepted, including any evicted by the cap.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// The retention cap, if one is set.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// The most recent `(label, value)` pair.
    pub fn latest(&self) -> Option<(u64, f64)> {
        Some((*self.labels.back()?, *self.values.back()?))
    }

    /// Minimum and maximum of the retained values.
    ///
    /// Returns `None` for an empty series.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        let mut iter = self.values.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// Retained readings as `(label, value)` points for charting.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.labels
            .iter()
            .zip(self.values.iter())
            .map(|(&label, &value)| (label as f64, value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(series: &Series) -> Vec<u64> {
        series.labels().iter().copied().collect()
    }

    fn values(series: &Series) -> Vec<f64> {
        series.values().iter().copied().collect()
    }

    #[test]
    fn test_new_series_is_empty() {
        let series = Series::new();
        assert!(series.is_empty());
        assert!(labels(&series).is_empty());
        assert!(values(&series).is_empty());
        assert_eq!(series.latest(), None);
        assert_eq!(series.bounds(), None);
    }

    #[test]
    fn test_ingest_assigns_sequential_labels() {
        let mut series = Series::new();
        assert_eq!(series.ingest(10.0), 1);
        assert_eq!(series.ingest(20.0), 2);
        assert_eq!(series.ingest(15.0), 3);

        assert_eq!(labels(&series), vec![1, 2, 3]);
        assert_eq!(values(&series), vec![10.0, 20.0, 15.0]);
        assert_eq!(series.latest(), Some((3, 15.0)));
    }

    #[test]
    fn test_next_label_is_length_plus_one_when_unbounded() {
        let mut series = Series::new();
        for i in 0..50 {
            let before = series.len();
            let label = series.ingest(i as f64);
            assert_eq!(label, before as u64 + 1);
            assert_eq!(series.len(), before + 1);
            assert_eq!(series.labels().len(), series.values().len());
        }
    }

    #[test]
    fn test_bounds() {
        let mut series = Series::new();
        series.ingest(3.0);
        series.ingest(-1.5);
        series.ingest(7.25);
        assert_eq!(series.bounds(), Some((-1.5, 7.25)));
    }

    #[test]
    fn test_points_pair_labels_with_values() {
        let mut series = Series::new();
        series.ingest(42.5);
        series.ingest(40.0);
        assert_eq!(series.points(), vec![(1.0, 42.5), (2.0, 40.0)]);
    }

    #[test]
    fn test_bounded_series_evicts_oldest() {
        let mut series = Series::bounded(3);
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            series.ingest(v);
        }

        assert_eq!(series.len(), 3);
        assert_eq!(series.accepted(), 5);
        assert_eq!(labels(&series), vec![3, 4, 5]);
        assert_eq!(values(&series), vec![3.0, 4.0, 5.0]);
        assert_eq!(series.capacity(), Some(3));
    }

    #[test]
    fn test_zero_capacity_keeps_latest() {
        let mut series = Series::bounded(0);
        series.ingest(1.0);
        series.ingest(2.0);
        assert_eq!(series.latest(), Some((2, 2.0)));
        assert_eq!(series.len(), 1);
    }
}
