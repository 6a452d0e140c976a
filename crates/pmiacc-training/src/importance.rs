//! Permutation feature importance from out-of-bag samples.
//!
//! For each tree and each feature:
//!
//! 1. Compute the tree's accuracy on its out-of-bag (OOB) rows
//! 2. Shuffle the feature's values among those OOB rows
//! 3. Recompute the accuracy with the shuffled values
//! 4. The drop (baseline minus shuffled) is the tree's importance for that feature
//!
//! The reported importance is the mean drop over all trees with a non-empty
//! OOB set. The model is never refit, so a feature that no split uses always
//! scores exactly zero.

use rand::{Rng, seq::SliceRandom};
use serde::Serialize;

use crate::{dataset::Dataset, tree::DecisionTree};

/// Permutation importance of one feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermutationImportance {
    /// Feature name
    pub name: String,
    /// Mean OOB accuracy drop when the feature is shuffled
    pub importance: f64,
    /// Standard deviation of the drop across trees
    pub std: f64,
    /// Rank (1 = most important)
    pub rank: usize,
}

#[expect(clippy::cast_precision_loss)]
fn accuracy<I>(hits: I, total: usize) -> f64
where
    I: IntoIterator<Item = bool>,
{
    hits.into_iter().filter(|hit| *hit).count() as f64 / total as f64
}

/// Computes one tree's accuracy drop for every feature.
///
/// `oob` must not be empty.
pub(crate) fn permutation_drops<R>(
    tree: &DecisionTree,
    dataset: &Dataset,
    oob: &[usize],
    rng: &mut R,
) -> Vec<f64>
where
    R: Rng + ?Sized,
{
    debug_assert!(!oob.is_empty());
    let baseline = accuracy(
        oob.iter()
            .map(|&row| tree.predict_row(dataset, row) == dataset.label(row)),
        oob.len(),
    );

    (0..dataset.num_features())
        .map(|permuted| {
            let mut donors = oob.to_vec();
            donors.shuffle(rng);
            let shuffled = accuracy(
                oob.iter().zip(&donors).map(|(&row, &donor)| {
                    let predicted = tree.predict(|feature| {
                        let source = if feature == permuted { donor } else { row };
                        dataset.value(source, feature)
                    });
                    predicted == dataset.label(row)
                }),
                oob.len(),
            );
            baseline - shuffled
        })
        .collect()
}

/// Running mean and spread of the per-tree drops of every feature.
///
/// Trees are folded in one at a time (Welford's update), so per-tree drop
/// vectors can be released as soon as they are added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DropTotals {
    trees: usize,
    mean: Vec<f64>,
    m2: Vec<f64>,
}

impl DropTotals {
    #[must_use]
    pub fn new(num_features: usize) -> Self {
        Self {
            trees: 0,
            mean: vec![0.0; num_features],
            m2: vec![0.0; num_features],
        }
    }

    /// Number of trees folded in so far.
    #[must_use]
    pub fn trees(&self) -> usize {
        self.trees
    }

    /// Folds in one tree's drops, one entry per feature.
    #[expect(clippy::cast_precision_loss)]
    pub fn add(&mut self, drops: &[f64]) {
        debug_assert_eq!(drops.len(), self.mean.len());
        self.trees += 1;
        let n = self.trees as f64;
        for ((mean, m2), &drop) in self.mean.iter_mut().zip(&mut self.m2).zip(drops) {
            let delta = drop - *mean;
            *mean += delta / n;
            *m2 += delta * (drop - *mean);
        }
    }
}

/// Turns accumulated drops into ranked importances (descending).
///
/// `totals` must hold one entry per feature in `names` order. The standard
/// deviation is the population one over contributing trees. With no
/// contributing tree every feature scores zero.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn summarize(names: &[String], totals: &DropTotals) -> Vec<PermutationImportance> {
    let n_trees = totals.trees as f64;
    let mut results = names
        .iter()
        .enumerate()
        .map(|(feature, name)| {
            let (importance, std) = if totals.trees == 0 {
                (0.0, 0.0)
            } else {
                (totals.mean[feature], (totals.m2[feature] / n_trees).sqrt())
            };
            PermutationImportance {
                name: name.clone(),
                importance,
                std,
                rank: 0,
            }
        })
        .collect::<Vec<_>>();

    results.sort_by(|a, b| {
        b.importance
            .total_cmp(&a.importance)
            .then_with(|| a.name.cmp(&b.name))
    });
    for (i, result) in results.iter_mut().enumerate() {
        result.rank = i + 1;
    }
    results
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64Mcg;

    use super::*;
    use crate::{dataset::FeatureColumn, tree::TreeBuilder};

    #[test]
    fn test_summarize_sorts_descending() {
        let names = vec!["a".to_owned(), "b".to_owned()];
        let mut totals = DropTotals::new(2);
        totals.add(&[0.1, 0.3]);
        totals.add(&[0.1, 0.5]);
        assert_eq!(totals.trees(), 2);
        let result = summarize(&names, &totals);
        assert_eq!(result[0].name, "b");
        assert_eq!(result[0].rank, 1);
        assert!((result[0].importance - 0.4).abs() < 1e-12);
        assert!((result[0].std - 0.1).abs() < 1e-12);
        assert_eq!(result[1].name, "a");
        assert_eq!(result[1].rank, 2);
        assert!(result[1].std.abs() < 1e-12);
    }

    #[test]
    fn test_summarize_without_trees_is_zero() {
        let names = vec!["relation".to_owned()];
        let result = summarize(&names, &DropTotals::new(1));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].importance, 0.0);
        assert_eq!(result[0].rank, 1);
    }

    #[test]
    fn test_unused_feature_has_zero_drop() {
        let signal = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let constant = vec![5.0; 6];
        let labels = vec![false, false, false, true, true, true];
        let dataset = Dataset::new(
            vec![
                FeatureColumn::numeric("signal", signal),
                FeatureColumn::numeric("constant", constant),
            ],
            labels,
        )
        .unwrap();
        let builder = TreeBuilder {
            mtry: 2,
            min_node_size: 1,
            max_depth: None,
        };
        let mut rng = Pcg64Mcg::seed_from_u64(3);
        let tree = builder.grow(&dataset, (0..6).collect(), &mut rng);
        let drops = permutation_drops(&tree, &dataset, &[0, 1, 2, 3, 4, 5], &mut rng);
        assert_eq!(drops.len(), 2);
        assert_eq!(drops[1], 0.0);
        assert!(drops[0] >= 0.0);
    }
}
