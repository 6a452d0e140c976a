//! Accuracy statistics per linear distance
//!
//! Same two-pass shape as [`crate::relation`], keyed by `lin_dist` instead of
//! relation. The overall pass also summarizes the PMI score at each distance.
//! Records without a gold relation are dropped; there is no distance filter.

use serde::Serialize;

use pmiacc_stats::descriptive;

use crate::{
    group,
    record::{EdgeMethod, RawRecord},
    table::{Cell, StatColumns},
};

/// Statistics of one linear distance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LengthStat {
    pub lin_dist: u32,
    pub n: usize,
    /// Mean `pmi_sum`
    pub meanpmi: f64,
    /// Sample variance of `pmi_sum`, missing for single-record groups
    pub varpmi: Option<f64>,
    #[serde(rename = "n_pmiTRUE")]
    pub n_pmi_true: usize,
    #[serde(rename = "n_pmiFALSE")]
    pub n_pmi_false: usize,
    pub pct_acc: f64,
}

impl StatColumns for LengthStat {
    const COLUMNS: &'static [&'static str] = &[
        "lin_dist",
        "n",
        "meanpmi",
        "varpmi",
        "n_pmiTRUE",
        "n_pmiFALSE",
        "pct_acc",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::from(self.lin_dist),
            Cell::from(self.n),
            Cell::from(self.meanpmi),
            Cell::from(self.varpmi),
            Cell::from(self.n_pmi_true),
            Cell::from(self.n_pmi_false),
            Cell::from(self.pct_acc),
        ]
    }
}

/// Join keys used when comparing length statistics across models.
pub const LENGTH_JOIN_KEYS: &[&str] = &["n", "lin_dist"];

/// Aggregates records by linear distance, ordered by `lin_dist`.
#[must_use]
pub fn aggregate_by_length(records: &[RawRecord], edge: EdgeMethod) -> Vec<LengthStat> {
    let filtered = records
        .iter()
        .filter(|r| r.relation.is_some())
        .collect::<Vec<_>>();

    let overall = group::collect_by_group(filtered.iter().copied(), |r| Some(r.lin_dist));
    let by_accuracy =
        group::collect_by_group(filtered.iter().copied(), |r| Some((r.lin_dist, r.is_correct(edge))));
    log::debug!(
        "aggregate_by_length: {} of {} records kept, {} distances",
        filtered.len(),
        records.len(),
        overall.len()
    );

    overall
        .into_iter()
        .map(|(lin_dist, members)| {
            let count = |correct: bool| by_accuracy.get(&(lin_dist, correct)).map_or(0, Vec::len);
            let pmi = || members.iter().map(|r| r.pmi_sum);
            let n = members.len();
            let n_pmi_true = count(true);
            LengthStat {
                lin_dist,
                n,
                meanpmi: descriptive::mean(pmi()).unwrap_or(f64::NAN),
                varpmi: descriptive::sample_variance(pmi()),
                n_pmi_true,
                n_pmi_false: count(false),
                pct_acc: group::fraction(n_pmi_true, n),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::record;

    fn with_pmi(mut record: RawRecord, pmi_sum: f64) -> RawRecord {
        record.pmi_sum = pmi_sum;
        record
    }

    #[test]
    fn test_groups_by_distance() {
        let records = vec![
            with_pmi(record(Some("det"), 1, true, true), 1.0),
            with_pmi(record(Some("amod"), 1, true, false), 3.0),
            with_pmi(record(Some("nsubj"), 1, false, false), 5.0),
            with_pmi(record(Some("obj"), 3, true, true), 2.0),
        ];
        let stats = aggregate_by_length(&records, EdgeMethod::Sum);
        assert_eq!(stats.len(), 2);

        let one = &stats[0];
        assert_eq!(one.lin_dist, 1);
        assert_eq!(one.n, 3);
        assert_eq!(one.n_pmi_true, 2);
        assert_eq!(one.n_pmi_false, 1);
        assert_eq!(one.meanpmi, 3.0);
        assert_eq!(one.varpmi, Some(4.0));
        assert!((one.pct_acc - 2.0 / 3.0).abs() < 1e-12);

        let three = &stats[1];
        assert_eq!(three.lin_dist, 3);
        assert_eq!(three.varpmi, None);
        assert_eq!(three.n_pmi_false, 0);
        assert_eq!(three.pct_acc, 1.0);
    }

    #[test]
    fn test_null_relation_is_excluded() {
        let records = vec![record(None, 2, false, false), record(Some("obj"), 5, true, true)];
        let stats = aggregate_by_length(&records, EdgeMethod::Sum);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].lin_dist, 5);
    }

    #[test]
    fn test_edge_method_selects_prediction_column() {
        let mut r = record(Some("obj"), 2, true, false);
        r.pmi_edge_triu = true;
        let sum = aggregate_by_length(std::slice::from_ref(&r), EdgeMethod::Sum);
        let triu = aggregate_by_length(std::slice::from_ref(&r), EdgeMethod::Triu);
        assert_eq!(sum[0].n_pmi_true, 0);
        assert_eq!(triu[0].n_pmi_true, 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate_by_length(&[], EdgeMethod::Sum).is_empty());
    }
}
