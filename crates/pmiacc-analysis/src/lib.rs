//! Accuracy analysis of PMI-derived dependency edges
//!
//! This crate turns per-word-pair prediction records into the tables and
//! models used to compare dependency-structure predictions across language
//! models.
//!
//! # Workflows
//!
//! ## Per-Model Aggregation
//!
//! 1. **Load Records** ([`record::RawRecord`]): One row per sentence and word pair
//! 2. **By Relation** ([`relation::aggregate_by_relation`]): Accuracy and
//!    distance statistics per gold relation label
//! 3. **By Distance** ([`length::aggregate_by_length`]): Accuracy and PMI
//!    statistics per linear distance
//!
//! ## Cross-Model Comparison
//!
//! 1. **Lower** ([`table::StatTable::from_rows`]): Typed statistic rows become a
//!    column-oriented table
//! 2. **Merge** ([`merge::merge`]): Per-model tables are outer-joined on a key
//!    set and unpivoted into one row per key tuple and model
//!
//! ## Feature Importance
//!
//! 1. **Configure** ([`importance::ImportanceConfig`]): Target edge method,
//!    feature columns and exclusions
//! 2. **Fit** ([`importance::fit_importance`]): Bagged tree ensemble with
//!    out-of-bag permutation importance and confusion matrix
//!
//! ## Attachment Scores
//!
//! - [`uuas::summarize_uuas`]: Per-sentence UUAS for every symmetrization method
//!
//! # Correctness
//!
//! A record is *correct* under a symmetrization method when the predicted edge
//! agrees with the gold edge: both present or both absent. All accuracy
//! figures in this crate are fractions of correct records.
//!
//! # Example
//!
//! ```
//! use pmiacc_analysis::{
//!     merge,
//!     record::{EdgeMethod, RawRecord},
//!     relation::{self, RELATION_JOIN_KEYS},
//!     table::StatTable,
//! };
//!
//! let models: Vec<(String, Vec<RawRecord>)> = vec![]; // Load from CSV
//!
//! let tables = models
//!     .iter()
//!     .map(|(name, records)| {
//!         let stats = relation::aggregate_by_relation(records, EdgeMethod::Sum, 0);
//!         (name.clone(), StatTable::from_rows(&stats))
//!     })
//!     .collect::<Vec<_>>();
//! let comparison = merge::merge(&tables, RELATION_JOIN_KEYS).unwrap();
//! assert!(comparison.is_empty());
//! ```

mod group;

pub mod importance;
pub mod length;
pub mod merge;
pub mod record;
pub mod relation;
pub mod table;
pub mod uuas;
