//! Accuracy statistics per dependency relation
//!
//! [`aggregate_by_relation`] summarizes how often the PMI-derived edges agree
//! with the gold parse for each gold relation label, together with the
//! linear distance distribution of the pairs carrying that label.
//!
//! # Passes
//!
//! 1. **Overall**: group the filtered records by relation and compute the
//!    record count and the median/mean `lin_dist`
//! 2. **Accuracy-conditioned**: group by `(relation, correct)` and compute the
//!    same statistics per correctness bucket
//! 3. **Join**: each relation yields one row carrying both passes; a bucket
//!    with no records counts 0 and leaves its length statistics missing
//!
//! ```
//! use pmiacc_analysis::{record::{EdgeMethod, RawRecord}, relation::aggregate_by_relation};
//! # fn pair(lin_dist: u32, gold_edge: bool, predicted: bool) -> RawRecord {
//! #     RawRecord {
//! #         sentence_index: 0, lin_dist, relation: Some("dobj".into()), gold_edge,
//! #         pmi_edge_sum: predicted, pmi_edge_none: predicted, pmi_edge_tril: predicted,
//! #         pmi_edge_triu: predicted, pmi_sum: 0.0, upos1: "VERB".into(),
//! #         upos2: "NOUN".into(), xpos1: "VB".into(), xpos2: "NN".into(),
//! #     }
//! # }
//!
//! let records = [pair(2, true, true), pair(4, true, false)];
//! let stats = aggregate_by_relation(&records, EdgeMethod::Sum, 0);
//!
//! assert_eq!(stats.len(), 1);
//! assert_eq!(stats[0].relation, "dobj");
//! assert_eq!((stats[0].n, stats[0].n_pmi_true, stats[0].n_pmi_false), (2, 1, 1));
//! assert_eq!(stats[0].medlen, 3.0);
//! assert_eq!(stats[0].pct_acc, 0.5);
//! ```

use serde::Serialize;

use crate::{
    group::{self, BucketStats},
    record::{EdgeMethod, RawRecord},
    table::{Cell, StatColumns},
};

/// Statistics of one relation label.
///
/// Invariant: `n_pmi_true + n_pmi_false == n`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationStat {
    pub relation: String,
    pub n: usize,
    /// Median `lin_dist` over all records of the relation
    pub medlen: f64,
    /// Mean `lin_dist` over all records of the relation
    pub meanlen: f64,
    #[serde(rename = "n_pmiTRUE")]
    pub n_pmi_true: usize,
    #[serde(rename = "n_pmiFALSE")]
    pub n_pmi_false: usize,
    #[serde(rename = "medlen_pmiTRUE")]
    pub medlen_pmi_true: Option<f64>,
    #[serde(rename = "medlen_pmiFALSE")]
    pub medlen_pmi_false: Option<f64>,
    #[serde(rename = "meanlen_pmiTRUE")]
    pub meanlen_pmi_true: Option<f64>,
    #[serde(rename = "meanlen_pmiFALSE")]
    pub meanlen_pmi_false: Option<f64>,
    /// `n_pmi_true / n`
    pub pct_acc: f64,
}

impl StatColumns for RelationStat {
    const COLUMNS: &'static [&'static str] = &[
        "relation",
        "n",
        "medlen",
        "meanlen",
        "n_pmiTRUE",
        "n_pmiFALSE",
        "medlen_pmiTRUE",
        "medlen_pmiFALSE",
        "meanlen_pmiTRUE",
        "meanlen_pmiFALSE",
        "pct_acc",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::from(self.relation.as_str()),
            Cell::from(self.n),
            Cell::from(self.medlen),
            Cell::from(self.meanlen),
            Cell::from(self.n_pmi_true),
            Cell::from(self.n_pmi_false),
            Cell::from(self.medlen_pmi_true),
            Cell::from(self.medlen_pmi_false),
            Cell::from(self.meanlen_pmi_true),
            Cell::from(self.meanlen_pmi_false),
            Cell::from(self.pct_acc),
        ]
    }
}

/// Join keys used when comparing relation statistics across models.
pub const RELATION_JOIN_KEYS: &[&str] = &["relation", "n", "medlen", "meanlen"];

/// Aggregates records by gold relation.
///
/// Records with a missing relation or with `lin_dist <= min_distance` are
/// dropped first. Rows are ordered by relation label; an input without any
/// qualifying record yields an empty result.
#[must_use]
pub fn aggregate_by_relation(
    records: &[RawRecord],
    edge: EdgeMethod,
    min_distance: u32,
) -> Vec<RelationStat> {
    let filtered = records
        .iter()
        .filter(|r| r.relation.is_some() && r.lin_dist > min_distance)
        .collect::<Vec<_>>();

    let overall = group::collect_by_group(filtered.iter().copied(), |r| r.relation.clone());
    let by_accuracy = group::collect_by_group(filtered.iter().copied(), |r| {
        Some((r.relation.clone()?, r.is_correct(edge)))
    });
    log::debug!(
        "aggregate_by_relation: {} of {} records kept, {} relations, {} accuracy buckets",
        filtered.len(),
        records.len(),
        overall.len(),
        by_accuracy.len()
    );

    overall
        .into_iter()
        .map(|(relation, members)| {
            let bucket = |correct: bool| {
                by_accuracy
                    .get(&(relation.clone(), correct))
                    .map(|records| BucketStats::from_records(records))
                    .unwrap_or_default()
            };
            let all = BucketStats::from_records(&members);
            let correct = bucket(true);
            let incorrect = bucket(false);
            RelationStat {
                n: all.count,
                medlen: all.medlen.unwrap_or(f64::NAN),
                meanlen: all.meanlen.unwrap_or(f64::NAN),
                n_pmi_true: correct.count,
                n_pmi_false: incorrect.count,
                medlen_pmi_true: correct.medlen,
                medlen_pmi_false: incorrect.medlen,
                meanlen_pmi_true: correct.meanlen,
                meanlen_pmi_false: incorrect.meanlen,
                pct_acc: group::fraction(correct.count, all.count),
                relation,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::record;

    #[test]
    fn test_dobj_scenario() {
        let records = vec![
            record(Some("dobj"), 2, true, true),
            record(Some("dobj"), 4, true, false),
        ];
        let stats = aggregate_by_relation(&records, EdgeMethod::Sum, 0);
        assert_eq!(stats.len(), 1);
        let dobj = &stats[0];
        assert_eq!(dobj.relation, "dobj");
        assert_eq!(dobj.n, 2);
        assert_eq!(dobj.n_pmi_true, 1);
        assert_eq!(dobj.n_pmi_false, 1);
        assert_eq!(dobj.pct_acc, 0.5);
        assert_eq!(dobj.meanlen, 3.0);
        assert_eq!(dobj.medlen, 3.0);
        assert_eq!(dobj.medlen_pmi_true, Some(2.0));
        assert_eq!(dobj.meanlen_pmi_false, Some(4.0));
    }

    #[test]
    fn test_absent_bucket_fills_count_and_leaves_lengths_missing() {
        let records = vec![
            record(Some("det"), 1, true, true),
            record(Some("det"), 1, false, false),
        ];
        let stats = aggregate_by_relation(&records, EdgeMethod::Sum, 0);
        assert_eq!(stats[0].n_pmi_true, 2);
        assert_eq!(stats[0].n_pmi_false, 0);
        assert_eq!(stats[0].medlen_pmi_false, None);
        assert_eq!(stats[0].meanlen_pmi_false, None);
        assert_eq!(stats[0].pct_acc, 1.0);
    }

    #[test]
    fn test_null_relation_is_excluded() {
        let records = vec![
            record(None, 3, false, true),
            record(Some("amod"), 1, true, true),
        ];
        let stats = aggregate_by_relation(&records, EdgeMethod::Sum, 0);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].relation, "amod");
        assert_eq!(stats[0].n, 1);
    }

    #[test]
    fn test_min_distance_filter() {
        let records = vec![
            record(Some("nsubj"), 1, true, true),
            record(Some("nsubj"), 2, true, false),
            record(Some("nsubj"), 5, true, true),
        ];
        let stats = aggregate_by_relation(&records, EdgeMethod::Sum, 1);
        assert_eq!(stats[0].n, 2);
        assert_eq!(stats[0].medlen, 3.5);

        assert!(aggregate_by_relation(&records, EdgeMethod::Sum, 5).is_empty());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let records = vec![
            record(Some("nsubj"), 1, true, true),
            record(Some("obj"), 2, true, false),
            record(Some("nsubj"), 3, false, false),
            record(None, 4, false, true),
        ];
        let once = aggregate_by_relation(&records, EdgeMethod::Sum, 1);
        let prefiltered = records
            .iter()
            .filter(|r| r.relation.is_some() && r.lin_dist > 1)
            .cloned()
            .collect::<Vec<_>>();
        let twice = aggregate_by_relation(&prefiltered, EdgeMethod::Sum, 1);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_counts_partition_n() {
        let records = (0_u32..40)
            .map(|i| {
                let relation = ["nsubj", "obj", "amod", "case"][(i % 4) as usize];
                record(Some(relation), 1 + i % 7, i % 3 == 0, i % 5 < 2)
            })
            .collect::<Vec<_>>();
        for edge in EdgeMethod::ALL {
            for stat in aggregate_by_relation(&records, edge, 0) {
                assert_eq!(stat.n_pmi_true + stat.n_pmi_false, stat.n);
                assert!((0.0..=1.0).contains(&stat.pct_acc));
            }
        }
    }

    #[test]
    fn test_rows_ordered_by_relation() {
        let records = vec![
            record(Some("obj"), 1, true, true),
            record(Some("amod"), 1, true, true),
            record(Some("nsubj"), 1, true, true),
        ];
        let relations = aggregate_by_relation(&records, EdgeMethod::Tril, 0)
            .into_iter()
            .map(|s| s.relation)
            .collect::<Vec<_>>();
        assert_eq!(relations, ["amod", "nsubj", "obj"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate_by_relation(&[], EdgeMethod::Sum, 0).is_empty());
    }
}
