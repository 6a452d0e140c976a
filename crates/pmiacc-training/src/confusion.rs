//! Binary confusion matrix.

use serde::Serialize;

/// Counts of predicted versus actual labels (`counts[actual][predicted]`,
/// index 0 = `false`, 1 = `true`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    counts: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one prediction.
    pub fn add(&mut self, actual: bool, predicted: bool) {
        self.counts[usize::from(actual)][usize::from(predicted)] += 1;
    }

    #[must_use]
    pub fn get(&self, actual: bool, predicted: bool) -> usize {
        self.counts[usize::from(actual)][usize::from(predicted)]
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    #[must_use]
    pub fn correct(&self) -> usize {
        self.counts[0][0] + self.counts[1][1]
    }

    /// Fraction of correct predictions, `None` when nothing was recorded.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| self.correct() as f64 / total as f64)
    }

    /// Misclassification rate, `None` when nothing was recorded.
    #[must_use]
    pub fn error_rate(&self) -> Option<f64> {
        self.accuracy().map(|acc| 1.0 - acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_cell() {
        let mut matrix = ConfusionMatrix::new();
        matrix.add(true, true);
        matrix.add(true, true);
        matrix.add(true, false);
        matrix.add(false, true);
        assert_eq!(matrix.get(true, true), 2);
        assert_eq!(matrix.get(true, false), 1);
        assert_eq!(matrix.get(false, true), 1);
        assert_eq!(matrix.get(false, false), 0);
        assert_eq!(matrix.total(), 4);
        assert_eq!(matrix.accuracy(), Some(0.5));
    }

    #[test]
    fn test_empty_matrix_has_no_accuracy() {
        let matrix = ConfusionMatrix::new();
        assert_eq!(matrix.total(), 0);
        assert_eq!(matrix.accuracy(), None);
        assert_eq!(matrix.error_rate(), None);
    }

    #[test]
    fn test_serializes_as_nested_counts() {
        let mut matrix = ConfusionMatrix::new();
        matrix.add(false, true);
        let json = serde_json::to_string(&matrix).unwrap();
        assert_eq!(json, r#"{"counts":[[0,1],[0,0]]}"#);
    }
}
