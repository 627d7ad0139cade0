//! Weighted categorical selection from a single uniform draw.

/// Cumulative-threshold table.
///
/// Weights are normalized at construction; `pick(u)` with `u` in `[0, 1)`
/// returns the first entry whose cumulative weight exceeds `u`.
#[derive(Clone, Debug)]
pub struct WeightedTable<T> {
    entries: Vec<(f32, T)>,
    /// Returned when `u` lands on or past 1.0
    last: T,
}

impl<T: Copy> WeightedTable<T> {
    /// Build from `(value, weight)` pairs.
    ///
    /// Returns `None` if the list is empty or any weight is not positive.
    pub fn new(weights: &[(T, f32)]) -> Option<Self> {
        if weights.is_empty() || weights.iter().any(|(_, w)| !(*w > 0.0) || !w.is_finite()) {
            return None;
        }
        let total: f32 = weights.iter().map(|(_, w)| w).sum();

        let mut acc = 0.0;
        let mut entries: Vec<(f32, T)> = weights
            .iter()
            .map(|(value, w)| {
                acc += w / total;
                (acc, *value)
            })
            .collect();
        // Float drift must not leave a gap below 1.0
        let tail = entries.last_mut()?;
        tail.0 = 1.0;
        let last = tail.1;
        Some(Self { entries, last })
    }

    /// Select by a uniform sample in `[0, 1)`.
    pub fn pick(&self, u: f32) -> T {
        self.entries
            .iter()
            .find(|(threshold, _)| u < *threshold)
            .map_or(self.last, |(_, value)| *value)
    }

    /// Normalized probability of each entry, in declaration order
    pub fn probabilities(&self) -> impl Iterator<Item = (T, f32)> + '_ {
        let mut prev = 0.0;
        self.entries.iter().map(move |(threshold, value)| {
            let p = threshold - prev;
            prev = *threshold;
            (*value, p)
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        let table = WeightedTable::new(&[('a', 0.45), ('b', 0.30), ('c', 0.25)]).unwrap();
        assert_eq!(table.pick(0.0), 'a');
        assert_eq!(table.pick(0.449), 'a');
        assert_eq!(table.pick(0.45), 'b');
        assert_eq!(table.pick(0.749), 'b');
        assert_eq!(table.pick(0.75), 'c');
        assert_eq!(table.pick(0.9999), 'c');
    }

    #[test]
    fn test_normalizes() {
        let table = WeightedTable::new(&[(1, 2.0), (2, 6.0)]).unwrap();
        let probs: Vec<_> = table.probabilities().collect();
        assert!((probs[0].1 - 0.25).abs() < 1e-6);
        assert!((probs[1].1 - 0.75).abs() < 1e-6);
        assert_eq!(table.pick(0.2), 1);
        assert_eq!(table.pick(0.3), 2);
    }

    #[test]
    fn test_rejects_bad_weights() {
        assert!(WeightedTable::<u8>::new(&[]).is_none());
        assert!(WeightedTable::new(&[(1, 0.0)]).is_none());
        assert!(WeightedTable::new(&[(1, 1.0), (2, -0.5)]).is_none());
        assert!(WeightedTable::new(&[(1, f32::NAN)]).is_none());
    }
}
