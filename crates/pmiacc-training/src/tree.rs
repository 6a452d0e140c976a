//! Binary classification trees.
//!
//! Trees are grown with Gini impurity on a bootstrap sample of a
//! [`Dataset`]. At every node a random subset of `mtry` features is
//! considered.
//!
//! # Split Rules
//!
//! - **Numeric** features split on a threshold halfway between two adjacent
//!   observed values (`value <= threshold` goes left).
//! - **Categorical** features split on a subset of levels (levels in the set
//!   go left). Levels are treated as unordered: for a binary target the best
//!   subset is found by ordering the levels present at the node by their
//!   proportion of positive labels and scanning the prefixes of that order,
//!   which yields the optimal partition without enumerating all subsets.
//!   Levels not seen at the node during training go right.

use std::collections::BTreeMap;

use rand::{Rng, seq::index};
use serde::Serialize;

use crate::dataset::{ColumnData, Dataset, FeatureValue};

/// Minimum impurity decrease for a split to be accepted.
const MIN_DECREASE: f64 = 1e-12;

/// How a split node routes a feature value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SplitRule {
    /// Numeric values `<= threshold` go left.
    LessOrEqual(f64),
    /// Categorical level codes in the (sorted) set go left.
    InCategories(Vec<u32>),
}

impl SplitRule {
    #[must_use]
    pub fn goes_left(&self, value: FeatureValue) -> bool {
        match (self, value) {
            (Self::LessOrEqual(threshold), FeatureValue::Number(x)) => x <= *threshold,
            (Self::InCategories(set), FeatureValue::Category(code)) => {
                set.binary_search(&code).is_ok()
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Node {
    Leaf {
        prediction: bool,
    },
    Split {
        feature: usize,
        rule: SplitRule,
        left: usize,
        right: usize,
    },
}

/// A fitted classification tree stored as a flat node array (root at 0).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Predicts a label, reading feature values through `value_of`.
    ///
    /// `value_of` receives a feature index and returns that feature's value
    /// for the observation being classified. Permutation importance uses this
    /// to substitute a single feature without copying the row.
    pub fn predict<F>(&self, mut value_of: F) -> bool
    where
        F: FnMut(usize) -> FeatureValue,
    {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { prediction } => return *prediction,
                Node::Split {
                    feature,
                    rule,
                    left,
                    right,
                } => {
                    idx = if rule.goes_left(value_of(*feature)) {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Predicts the label of a dataset row.
    #[must_use]
    pub fn predict_row(&self, dataset: &Dataset, row: usize) -> bool {
        self.predict(|feature| dataset.value(row, feature))
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn num_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Leaf { .. }))
            .count()
    }
}

/// Tree growing parameters.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    /// Number of features sampled as split candidates at each node
    pub mtry: usize,
    /// Nodes with this many samples or fewer are not split
    pub min_node_size: usize,
    /// Maximum depth (`None` = unlimited)
    pub max_depth: Option<usize>,
}

struct CandidateSplit {
    feature: usize,
    rule: SplitRule,
    child_impurity: f64,
}

impl TreeBuilder {
    /// Grows a tree on the given sample (row indices, duplicates allowed).
    pub fn grow<R>(&self, dataset: &Dataset, samples: Vec<usize>, rng: &mut R) -> DecisionTree
    where
        R: Rng + ?Sized,
    {
        let mut nodes = vec![Node::Leaf { prediction: false }];
        let mut stack = vec![(0, samples, 0)];

        while let Some((node_idx, samples, depth)) = stack.pop() {
            let positives = count_positives(dataset, &samples);
            let prediction = majority(positives, samples.len());

            let splittable = samples.len() > self.min_node_size
                && positives != 0
                && positives != samples.len()
                && self.max_depth.is_none_or(|max| depth < max);
            let split = if splittable {
                self.find_best_split(dataset, &samples, positives, rng)
            } else {
                None
            };

            let Some(split) = split else {
                nodes[node_idx] = Node::Leaf { prediction };
                continue;
            };

            let column = dataset.column(split.feature);
            let (left_samples, right_samples): (Vec<_>, Vec<_>) = samples
                .into_iter()
                .partition(|&row| split.rule.goes_left(column.value(row)));

            let left = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf { prediction });
            nodes.push(Node::Leaf { prediction });
            nodes[node_idx] = Node::Split {
                feature: split.feature,
                rule: split.rule,
                left,
                right,
            };
            stack.push((right, right_samples, depth + 1));
            stack.push((left, left_samples, depth + 1));
        }

        DecisionTree { nodes }
    }

    fn find_best_split<R>(
        &self,
        dataset: &Dataset,
        samples: &[usize],
        positives: usize,
        rng: &mut R,
    ) -> Option<CandidateSplit>
    where
        R: Rng + ?Sized,
    {
        let num_features = dataset.num_features();
        let parent_impurity = weighted_gini(samples.len(), positives);
        let mut best: Option<CandidateSplit> = None;

        for feature in index::sample(rng, num_features, self.mtry.min(num_features)) {
            let candidate = match dataset.column(feature).data() {
                ColumnData::Categorical { codes, .. } => {
                    best_category_split(dataset, samples, codes)
                }
                ColumnData::Numeric(values) => best_threshold_split(dataset, samples, values),
            };
            let Some((rule, child_impurity)) = candidate else {
                continue;
            };
            if child_impurity > parent_impurity - MIN_DECREASE {
                continue;
            }
            if best
                .as_ref()
                .is_none_or(|b| child_impurity < b.child_impurity)
            {
                best = Some(CandidateSplit {
                    feature,
                    rule,
                    child_impurity,
                });
            }
        }

        best
    }
}

fn count_positives(dataset: &Dataset, samples: &[usize]) -> usize {
    samples.iter().filter(|&&row| dataset.label(row)).count()
}

fn majority(positives: usize, total: usize) -> bool {
    positives * 2 > total
}

/// Gini impurity scaled by node size: `n * 2p(1-p)`.
#[expect(clippy::cast_precision_loss)]
fn weighted_gini(total: usize, positives: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let negatives = total - positives;
    2.0 * positives as f64 * negatives as f64 / total as f64
}

fn best_category_split(
    dataset: &Dataset,
    samples: &[usize],
    codes: &[u32],
) -> Option<(SplitRule, f64)> {
    // level -> (count, positives)
    let mut counts = BTreeMap::<u32, (usize, usize)>::new();
    for &row in samples {
        let entry = counts.entry(codes[row]).or_default();
        entry.0 += 1;
        entry.1 += usize::from(dataset.label(row));
    }
    if counts.len() < 2 {
        return None;
    }

    let mut levels = counts.into_iter().collect::<Vec<_>>();
    // compare p_a < p_b as pos_a * n_b < pos_b * n_a to stay exact
    levels.sort_by(|(code_a, (n_a, pos_a)), (code_b, (n_b, pos_b))| {
        (pos_a * n_b)
            .cmp(&(pos_b * n_a))
            .then(code_a.cmp(code_b))
    });

    let total = samples.len();
    let total_pos = levels.iter().map(|(_, (_, pos))| pos).sum::<usize>();
    let mut left_n = 0;
    let mut left_pos = 0;
    let mut best: Option<(usize, f64)> = None;
    for (k, (_, (n, pos))) in levels.iter().enumerate().take(levels.len() - 1) {
        left_n += n;
        left_pos += pos;
        let impurity =
            weighted_gini(left_n, left_pos) + weighted_gini(total - left_n, total_pos - left_pos);
        if best.is_none_or(|(_, b)| impurity < b) {
            best = Some((k + 1, impurity));
        }
    }

    let (prefix_len, impurity) = best?;
    let mut left_levels = levels[..prefix_len]
        .iter()
        .map(|(code, _)| *code)
        .collect::<Vec<_>>();
    left_levels.sort_unstable();
    Some((SplitRule::InCategories(left_levels), impurity))
}

fn best_threshold_split(
    dataset: &Dataset,
    samples: &[usize],
    values: &[f64],
) -> Option<(SplitRule, f64)> {
    let mut pairs = samples
        .iter()
        .map(|&row| (values[row], dataset.label(row)))
        .collect::<Vec<_>>();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let total = pairs.len();
    let total_pos = pairs.iter().filter(|(_, label)| *label).count();
    let mut left_pos = 0;
    let mut best: Option<(f64, f64)> = None;
    for (i, window) in pairs.windows(2).enumerate() {
        let (lo, label) = window[0];
        let hi = window[1].0;
        left_pos += usize::from(label);
        if lo >= hi {
            continue;
        }
        let left_n = i + 1;
        let impurity =
            weighted_gini(left_n, left_pos) + weighted_gini(total - left_n, total_pos - left_pos);
        if best.is_none_or(|(_, b)| impurity < b) {
            let mid = f64::midpoint(lo, hi);
            let threshold = if mid < hi { mid } else { lo };
            best = Some((threshold, impurity));
        }
    }

    best.map(|(threshold, impurity)| (SplitRule::LessOrEqual(threshold), impurity))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64Mcg;

    use super::*;
    use crate::dataset::FeatureColumn;

    fn builder(mtry: usize) -> TreeBuilder {
        TreeBuilder {
            mtry,
            min_node_size: 1,
            max_depth: None,
        }
    }

    #[test]
    fn test_learns_categorical_partition() {
        // A and C are positive, B and D negative: no ordinal threshold on
        // the sorted codes separates them, a level subset does.
        let labels = ["A", "B", "C", "D", "A", "B", "C", "D"];
        let column = FeatureColumn::categorical("relation", labels);
        let targets = labels.iter().map(|l| *l == "A" || *l == "C").collect();
        let dataset = Dataset::new(vec![column], targets).unwrap();

        let mut rng = Pcg64Mcg::seed_from_u64(1);
        let tree = builder(1).grow(&dataset, (0..dataset.len()).collect(), &mut rng);

        assert_eq!(tree.num_leaves(), 2);
        for row in 0..dataset.len() {
            assert_eq!(tree.predict_row(&dataset, row), dataset.label(row));
        }
    }

    #[test]
    fn test_learns_numeric_threshold() {
        let values = vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0];
        let targets = vec![false, false, false, true, true, true];
        let dataset =
            Dataset::new(vec![FeatureColumn::numeric("lin_dist", values)], targets).unwrap();

        let mut rng = Pcg64Mcg::seed_from_u64(7);
        let tree = builder(1).grow(&dataset, (0..dataset.len()).collect(), &mut rng);

        let Node::Split { rule, .. } = &tree.nodes()[0] else {
            panic!("root should split");
        };
        assert_eq!(rule, &SplitRule::LessOrEqual(6.5));
        assert!(!tree.predict(|_| FeatureValue::Number(4.0)));
        assert!(tree.predict(|_| FeatureValue::Number(9.0)));
    }

    #[test]
    fn test_pure_node_is_leaf() {
        let dataset = Dataset::new(
            vec![FeatureColumn::numeric("lin_dist", vec![1.0, 2.0, 3.0])],
            vec![true, true, true],
        )
        .unwrap();
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let tree = builder(1).grow(&dataset, vec![0, 1, 2], &mut rng);
        assert_eq!(tree.nodes(), &[Node::Leaf { prediction: true }]);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let values = (0..16).map(f64::from).collect::<Vec<_>>();
        let targets = (0..16).map(|i| i % 2 == 0).collect();
        let dataset =
            Dataset::new(vec![FeatureColumn::numeric("x", values)], targets).unwrap();
        let builder = TreeBuilder {
            mtry: 1,
            min_node_size: 1,
            max_depth: Some(1),
        };
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let tree = builder.grow(&dataset, (0..16).collect(), &mut rng);
        assert!(tree.num_leaves() <= 2);
    }

    #[test]
    fn test_unseen_category_goes_right() {
        let rule = SplitRule::InCategories(vec![0, 2]);
        assert!(rule.goes_left(FeatureValue::Category(2)));
        assert!(!rule.goes_left(FeatureValue::Category(5)));
        assert!(!rule.goes_left(FeatureValue::Number(0.0)));
    }
}
