//! Unlabeled undirected attachment score per sentence.
//!
//! For a sentence and a symmetrization method, UUAS is the fraction of gold
//! edges that the method also predicts. A sentence without gold edges has no
//! score. The corpus-level score of a method is the mean over the sentences
//! that have one.

use std::collections::BTreeMap;

use serde::Serialize;

use pmiacc_stats::descriptive;

use crate::{
    group,
    record::{EdgeMethod, RawRecord},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentenceUuas {
    pub sentence_index: usize,
    /// Word pairs scored in the sentence
    pub num_pairs: usize,
    pub num_gold_edges: usize,
    pub uuas: BTreeMap<EdgeMethod, Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UuasSummary {
    /// One entry per sentence, ordered by sentence index
    pub sentences: Vec<SentenceUuas>,
    /// Mean over sentences with a defined score, per method
    pub mean: BTreeMap<EdgeMethod, Option<f64>>,
}

/// Scores every sentence under every symmetrization method.
///
/// ```
/// use pmiacc_analysis::{record::EdgeMethod, uuas::summarize_uuas};
///
/// let summary = summarize_uuas(&[]);
/// assert!(summary.sentences.is_empty());
/// assert_eq!(summary.mean[&EdgeMethod::Sum], None);
/// ```
#[must_use]
pub fn summarize_uuas(records: &[RawRecord]) -> UuasSummary {
    let sentences = group::collect_by_group(records, |r| Some(r.sentence_index))
        .into_iter()
        .map(|(sentence_index, pairs)| {
            let gold = pairs.iter().filter(|r| r.gold_edge).collect::<Vec<_>>();
            let uuas = EdgeMethod::ALL
                .into_iter()
                .map(|method| {
                    let found = gold.iter().filter(|r| r.predicted_edge(method)).count();
                    let score = (!gold.is_empty()).then(|| group::fraction(found, gold.len()));
                    (method, score)
                })
                .collect();
            SentenceUuas {
                sentence_index,
                num_pairs: pairs.len(),
                num_gold_edges: gold.len(),
                uuas,
            }
        })
        .collect::<Vec<_>>();

    let mean = EdgeMethod::ALL
        .into_iter()
        .map(|method| {
            let scores = sentences.iter().filter_map(|s| s.uuas[&method]);
            (method, descriptive::mean(scores))
        })
        .collect();
    log::debug!("summarize_uuas: {} sentences", sentences.len());

    UuasSummary { sentences, mean }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::record;

    fn in_sentence(mut r: RawRecord, sentence_index: usize) -> RawRecord {
        r.sentence_index = sentence_index;
        r
    }

    #[test]
    fn test_per_sentence_scores() {
        let mut partial = in_sentence(record(Some("obj"), 2, true, false), 0);
        partial.pmi_edge_triu = true;
        let records = vec![
            in_sentence(record(Some("nsubj"), 1, true, true), 0),
            partial,
            in_sentence(record(None, 3, false, true), 0),
            in_sentence(record(Some("det"), 1, true, true), 1),
        ];
        let summary = summarize_uuas(&records);
        assert_eq!(summary.sentences.len(), 2);

        let first = &summary.sentences[0];
        assert_eq!(first.num_pairs, 3);
        assert_eq!(first.num_gold_edges, 2);
        assert_eq!(first.uuas[&EdgeMethod::Sum], Some(0.5));
        assert_eq!(first.uuas[&EdgeMethod::Triu], Some(1.0));

        assert_eq!(summary.sentences[1].uuas[&EdgeMethod::Sum], Some(1.0));
        assert_eq!(summary.mean[&EdgeMethod::Sum], Some(0.75));
        assert_eq!(summary.mean[&EdgeMethod::Triu], Some(1.0));
    }

    #[test]
    fn test_sentence_without_gold_edges_is_skipped_in_mean() {
        let records = vec![
            in_sentence(record(None, 1, false, true), 0),
            in_sentence(record(Some("det"), 1, true, false), 1),
        ];
        let summary = summarize_uuas(&records);
        assert_eq!(summary.sentences[0].uuas[&EdgeMethod::Sum], None);
        assert_eq!(summary.mean[&EdgeMethod::Sum], Some(0.0));
    }

    #[test]
    fn test_serializes_method_names() {
        let summary = summarize_uuas(&[in_sentence(record(Some("det"), 1, true, true), 4)]);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["sentences"][0]["sentence_index"], 4);
        assert_eq!(json["mean"]["none"], 1.0);
        assert_eq!(json["mean"]["sum"], 1.0);
    }
}
