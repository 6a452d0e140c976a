//! Grouping helpers shared by the aggregators.

use std::collections::BTreeMap;

use pmiacc_stats::descriptive::DescriptiveStats;

use crate::record::RawRecord;

/// Groups records by a key computed from each record.
///
/// Records for which `group` returns `None` are skipped. Groups are ordered by
/// key and keep the input order of their records.
pub(crate) fn collect_by_group<'a, I, K, F>(
    records: I,
    mut group: F,
) -> BTreeMap<K, Vec<&'a RawRecord>>
where
    I: IntoIterator<Item = &'a RawRecord>,
    K: Ord,
    F: FnMut(&RawRecord) -> Option<K>,
{
    let mut map: BTreeMap<K, Vec<&RawRecord>> = BTreeMap::new();
    for record in records {
        if let Some(key) = group(record) {
            map.entry(key).or_default().push(record);
        }
    }
    map
}

/// Count and length statistics of one correctness bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct BucketStats {
    pub count: usize,
    pub medlen: Option<f64>,
    pub meanlen: Option<f64>,
}

impl BucketStats {
    pub(crate) fn from_records(records: &[&RawRecord]) -> Self {
        let stats = DescriptiveStats::new(lin_dists(records));
        Self {
            count: records.len(),
            medlen: stats.as_ref().map(|s| s.median),
            meanlen: stats.as_ref().map(|s| s.mean),
        }
    }
}

pub(crate) fn lin_dists<'a>(records: &'a [&RawRecord]) -> impl Iterator<Item = f64> + 'a {
    records.iter().map(|record| f64::from(record.lin_dist))
}

/// `n_true / n`; callers guarantee `n > 0`.
#[expect(clippy::cast_precision_loss)]
pub(crate) fn fraction(n_true: usize, n: usize) -> f64 {
    n_true as f64 / n as f64
}
