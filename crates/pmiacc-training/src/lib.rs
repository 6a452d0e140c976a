//! Tree-ensemble training for feature-importance analysis.
//!
//! This crate implements a bagged ensemble of binary classification trees
//! (a random forest) together with the out-of-bag (OOB) diagnostics used to
//! interpret it. It knows nothing about dependency records: callers encode
//! their data as a [`dataset::Dataset`] of categorical and numeric columns
//! with one boolean label per row.
//!
//! # How Training Works
//!
//! 1. **Bootstrap** - Each tree draws `n` rows with replacement; rows never
//!    drawn are that tree's OOB rows
//! 2. **Grow** - The tree is grown with Gini impurity, considering `mtry`
//!    randomly chosen features at every node
//! 3. **Evaluate** - The tree predicts its OOB rows; votes are accumulated per row
//! 4. **Permute** - For each feature, the OOB values are shuffled and the
//!    accuracy drop is recorded
//! 5. **Summarize** - Drops are averaged over trees and ranked; OOB votes
//!    become a confusion matrix
//!
//! # Modules
//!
//! - [`dataset`]: Encoded feature columns and labels
//! - [`tree`]: Single classification tree
//! - [`forest`]: Ensemble fitting and OOB evaluation
//! - [`importance`]: Permutation importance
//! - [`confusion`]: Binary confusion matrix
//!
//! # Example
//!
//! ```
//! use pmiacc_training::{
//!     dataset::{Dataset, FeatureColumn},
//!     forest::{self, ForestParams},
//! };
//!
//! let upos = FeatureColumn::categorical("UPOS1", ["NOUN", "DET", "NOUN", "DET"].repeat(10));
//! let dist = FeatureColumn::numeric("lin_dist", [1.0, 1.0, 2.0, 2.0].repeat(10));
//! let labels = [true, false, true, false].repeat(10);
//! let dataset = Dataset::new(vec![upos, dist], labels).unwrap();
//!
//! let params = ForestParams { n_trees: 25, ..ForestParams::default() };
//! let fit = forest::fit(&dataset, &params).unwrap();
//! assert_eq!(fit.importance[0].name, "UPOS1");
//! ```
//!
//! # Current Limitations
//!
//! - **Binary targets only**: splits and the confusion matrix assume two classes
//! - **No sample weights or class balancing**
//! - **Gini only**: no alternative split criteria

pub mod confusion;
pub mod dataset;
pub mod forest;
pub mod importance;
pub mod tree;
