//! Bagged decision-tree ensemble with out-of-bag evaluation.
//!
//! [`fit`] grows `n_trees` trees, each on a bootstrap sample of the dataset
//! with per-split feature subsampling, and evaluates the ensemble on the
//! rows each tree did not see:
//!
//! - **OOB confusion matrix**: majority vote over the trees for which a row
//!   was out of bag, compared to the row's label
//! - **Permutation importance**: see [`importance`](crate::importance)
//!
//! # Parallelization
//!
//! Trees are independent. By default they are grown on scoped worker threads
//! and every tree's OOB results are kept until all trees are done. With
//! [`ForestParams::memory_saving`] set, trees are grown one after another on
//! the calling thread and each tree's bootstrap sample and OOB results are
//! folded into the running totals and released before the next tree starts.
//!
//! # Reproducibility
//!
//! Tree `i` draws all of its randomness (bootstrap, feature subsampling,
//! permutations) from a generator seeded with `seed + i`, so results do not
//! depend on the number of worker threads or on `memory_saving`.

use std::{num::NonZeroUsize, panic, thread};

use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

use crate::{
    confusion::ConfusionMatrix,
    dataset::{Dataset, TrainError},
    importance::{self, DropTotals, PermutationImportance},
    tree::{DecisionTree, TreeBuilder},
};

/// Ensemble training parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    /// Number of trees
    pub n_trees: usize,
    /// Features tried per split (`None` = `floor(sqrt(num_features))`)
    pub mtry: Option<usize>,
    /// Nodes with this many samples or fewer become leaves
    pub min_node_size: usize,
    /// Maximum tree depth (`None` = unlimited)
    pub max_depth: Option<usize>,
    /// Base random seed
    pub seed: u64,
    /// Grow trees sequentially and discard per-tree buffers eagerly
    pub memory_saving: bool,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 500,
            mtry: None,
            min_node_size: 1,
            max_depth: None,
            seed: 42,
            memory_saving: false,
        }
    }
}

impl ForestParams {
    /// Resolves the number of split candidates for `num_features` features.
    pub fn resolve_mtry(&self, num_features: usize) -> Result<usize, TrainError> {
        #[expect(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let mtry = self
            .mtry
            .unwrap_or_else(|| ((num_features as f64).sqrt().floor() as usize).max(1));
        if mtry == 0 || mtry > num_features {
            return Err(TrainError::InvalidMtry {
                mtry,
                features: num_features,
            });
        }
        Ok(mtry)
    }
}

/// A fitted ensemble.
#[derive(Debug, Clone, Serialize)]
pub struct RandomForest {
    feature_names: Vec<String>,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Majority-vote prediction for a dataset row.
    ///
    /// The dataset must have the same feature columns, in the same order and
    /// with the same level encoding, as the training set.
    #[must_use]
    pub fn predict_row(&self, dataset: &Dataset, row: usize) -> bool {
        let positive = self
            .trees
            .iter()
            .filter(|tree| tree.predict_row(dataset, row))
            .count();
        positive * 2 > self.trees.len()
    }
}

/// Result of [`fit`].
#[derive(Debug, Clone, Serialize)]
pub struct ForestFit {
    pub forest: RandomForest,
    /// Permutation importances, most important first
    pub importance: Vec<PermutationImportance>,
    /// OOB majority-vote predictions versus labels
    pub oob_confusion: ConfusionMatrix,
}

impl ForestFit {
    /// OOB misclassification rate.
    #[must_use]
    pub fn oob_error(&self) -> Option<f64> {
        self.oob_confusion.error_rate()
    }
}

struct TreeOutcome {
    tree: DecisionTree,
    oob_predictions: Vec<(usize, bool)>,
    drops: Option<Vec<f64>>,
}

struct OobAccumulator {
    // per row: [negative votes, positive votes]
    votes: Vec<[u32; 2]>,
    drops: DropTotals,
}

impl OobAccumulator {
    fn new(rows: usize, features: usize) -> Self {
        Self {
            votes: vec![[0; 2]; rows],
            drops: DropTotals::new(features),
        }
    }

    fn record(&mut self, outcome: TreeOutcome) -> DecisionTree {
        for (row, predicted) in outcome.oob_predictions {
            self.votes[row][usize::from(predicted)] += 1;
        }
        if let Some(drops) = &outcome.drops {
            self.drops.add(drops);
        }
        outcome.tree
    }

    fn confusion(&self, dataset: &Dataset) -> ConfusionMatrix {
        let mut matrix = ConfusionMatrix::new();
        for (row, [negative, positive]) in self.votes.iter().enumerate() {
            if negative + positive == 0 {
                continue;
            }
            matrix.add(dataset.label(row), positive > negative);
        }
        matrix
    }
}

/// Draws a bootstrap sample of `n` rows; returns (in-bag, out-of-bag).
fn bootstrap<R>(n: usize, rng: &mut R) -> (Vec<usize>, Vec<usize>)
where
    R: Rng + ?Sized,
{
    let mut in_bag_flags = vec![false; n];
    let in_bag = (0..n)
        .map(|_| {
            let row = rng.random_range(0..n);
            in_bag_flags[row] = true;
            row
        })
        .collect();
    let oob = (0..n).filter(|&row| !in_bag_flags[row]).collect();
    (in_bag, oob)
}

fn train_tree(
    dataset: &Dataset,
    builder: &TreeBuilder,
    seed: u64,
    tree_index: usize,
) -> TreeOutcome {
    let mut rng = Pcg64Mcg::seed_from_u64(seed.wrapping_add(tree_index as u64));
    let (in_bag, oob) = bootstrap(dataset.len(), &mut rng);
    let tree = builder.grow(dataset, in_bag, &mut rng);
    let oob_predictions = oob
        .iter()
        .map(|&row| (row, tree.predict_row(dataset, row)))
        .collect();
    let drops = (!oob.is_empty())
        .then(|| importance::permutation_drops(&tree, dataset, &oob, &mut rng));
    TreeOutcome {
        tree,
        oob_predictions,
        drops,
    }
}

fn train_parallel(
    dataset: &Dataset,
    builder: &TreeBuilder,
    params: &ForestParams,
) -> Vec<TreeOutcome> {
    let n_trees = params.n_trees;
    let workers = thread::available_parallelism()
        .map_or(1, NonZeroUsize::get)
        .min(n_trees);
    log::debug!("growing {n_trees} trees on {workers} threads");

    let mut outcomes = thread::scope(|s| {
        let handles = (0..workers)
            .map(|worker| {
                s.spawn(move || {
                    (worker..n_trees)
                        .step_by(workers)
                        .map(|i| (i, train_tree(dataset, builder, params.seed, i)))
                        .collect::<Vec<_>>()
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap_or_else(|e| panic::resume_unwind(e)))
            .collect::<Vec<_>>()
    });
    outcomes.sort_by_key(|(i, _)| *i);
    outcomes.into_iter().map(|(_, outcome)| outcome).collect()
}

/// Fits a bagged tree ensemble and evaluates it out of bag.
///
/// # Examples
///
/// ```
/// use pmiacc_training::{
///     dataset::{Dataset, FeatureColumn},
///     forest::{self, ForestParams},
/// };
///
/// let relation = FeatureColumn::categorical("relation", ["nsubj", "det"].repeat(20));
/// let labels = [true, false].repeat(20);
/// let dataset = Dataset::new(vec![relation], labels).unwrap();
///
/// let params = ForestParams { n_trees: 20, ..ForestParams::default() };
/// let fit = forest::fit(&dataset, &params).unwrap();
/// assert_eq!(fit.importance[0].name, "relation");
/// assert_eq!(fit.oob_error(), Some(0.0));
/// ```
pub fn fit(dataset: &Dataset, params: &ForestParams) -> Result<ForestFit, TrainError> {
    if params.n_trees == 0 {
        return Err(TrainError::NoTrees);
    }
    let builder = TreeBuilder {
        mtry: params.resolve_mtry(dataset.num_features())?,
        min_node_size: params.min_node_size,
        max_depth: params.max_depth,
    };
    log::debug!(
        "fitting {} trees on {} rows x {} features (mtry = {}, memory_saving = {})",
        params.n_trees,
        dataset.len(),
        dataset.num_features(),
        builder.mtry,
        params.memory_saving
    );

    let mut acc = OobAccumulator::new(dataset.len(), dataset.num_features());
    let trees: Vec<DecisionTree> = if params.memory_saving {
        (0..params.n_trees)
            .map(|i| acc.record(train_tree(dataset, &builder, params.seed, i)))
            .collect()
    } else {
        train_parallel(dataset, &builder, params)
            .into_iter()
            .map(|outcome| acc.record(outcome))
            .collect()
    };

    let feature_names = dataset
        .feature_names()
        .into_iter()
        .map(str::to_owned)
        .collect::<Vec<_>>();
    let importance = importance::summarize(&feature_names, &acc.drops);
    let oob_confusion = acc.confusion(dataset);

    Ok(ForestFit {
        forest: RandomForest {
            feature_names,
            trees,
        },
        importance,
        oob_confusion,
    })
}
