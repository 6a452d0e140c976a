//! Word-pair prediction records
//!
//! This module defines the input schema of the analysis pipeline: one
//! [`RawRecord`] per sentence and word pair, as emitted by a PMI-based
//! dependency scorer.
//!
//! # Schema
//!
//! ```text
//! RawRecord
//! ├─ sentence_index   sentence the pair belongs to
//! ├─ lin_dist         linear token distance (positive)
//! ├─ relation         gold dependency relation (nullable)
//! ├─ gold_edge        whether the gold parse contains the edge
//! ├─ pmi_edge_*       predicted edge, one per symmetrization method
//! ├─ pmi_sum          PMI score of the pair
//! └─ UPOS1/2, XPOS1/2 POS tags of the two tokens
//! ```
//!
//! # Serialization
//!
//! Records deserialize from the scorer's CSV output (one row per pair, with
//! a header line) as well as from JSON. Boolean columns accept
//! `TRUE`/`FALSE`, `True`/`False`, `true`/`false` and `1`/`0`; a relation of
//! `NA` or an empty cell is read as missing.
//!
//! ```
//! use pmiacc_analysis::record::{EdgeMethod, RawRecord};
//!
//! let json = r#"{
//!     "sentence_index": 0, "lin_dist": 2, "relation": "NA",
//!     "gold_edge": "FALSE", "pmi_edge_sum": "TRUE", "pmi_edge_none": "FALSE",
//!     "pmi_edge_tril": "FALSE", "pmi_edge_triu": "TRUE", "pmi_sum": 1.25,
//!     "UPOS1": "DET", "UPOS2": "NOUN", "XPOS1": "DT", "XPOS2": "NN"
//! }"#;
//! let record: RawRecord = serde_json::from_str(json).unwrap();
//! assert_eq!(record.relation, None);
//! assert!(record.predicted_edge(EdgeMethod::Sum));
//! assert!(!record.is_correct(EdgeMethod::Sum));
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, de};

/// Rule used to turn the directional PMI matrix into undirected edges.
///
/// Each method yields its own predicted-edge column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EdgeMethod {
    /// Matrix summed with its transpose
    #[default]
    Sum,
    /// Upper triangle only
    Triu,
    /// Lower triangle only
    Tril,
    /// Best of the two directions for each pair
    #[serde(rename = "none")]
    Unsymmetrized,
}

impl EdgeMethod {
    pub const ALL: [EdgeMethod; 4] = [
        EdgeMethod::Sum,
        EdgeMethod::Triu,
        EdgeMethod::Tril,
        EdgeMethod::Unsymmetrized,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeMethod::Sum => "sum",
            EdgeMethod::Triu => "triu",
            EdgeMethod::Tril => "tril",
            EdgeMethod::Unsymmetrized => "none",
        }
    }

    /// Name of the predicted-edge column for this method.
    #[must_use]
    pub fn column_name(self) -> &'static str {
        match self {
            EdgeMethod::Sum => "pmi_edge_sum",
            EdgeMethod::Triu => "pmi_edge_triu",
            EdgeMethod::Tril => "pmi_edge_tril",
            EdgeMethod::Unsymmetrized => "pmi_edge_none",
        }
    }
}

impl fmt::Display for EdgeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_str(), f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown symmetrization method '{name}' (expected sum, triu, tril or none)")]
pub struct UnknownEdgeMethod {
    #[error(not(source))]
    pub name: String,
}

impl std::str::FromStr for EdgeMethod {
    type Err = UnknownEdgeMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EdgeMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == s || method.column_name() == s)
            .ok_or_else(|| UnknownEdgeMethod { name: s.to_owned() })
    }
}

/// One scored word pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Index of the sentence the pair belongs to
    pub sentence_index: usize,
    /// Linear distance between the two tokens
    pub lin_dist: u32,
    /// Gold dependency relation, `None` when the pair is not a gold arc
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub relation: Option<String>,
    /// Whether the gold parse contains this edge
    #[serde(deserialize_with = "deserialize_flag")]
    pub gold_edge: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    pub pmi_edge_sum: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    pub pmi_edge_none: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    pub pmi_edge_tril: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    pub pmi_edge_triu: bool,
    /// PMI score of the pair
    pub pmi_sum: f64,
    #[serde(rename = "UPOS1")]
    pub upos1: String,
    #[serde(rename = "UPOS2")]
    pub upos2: String,
    #[serde(rename = "XPOS1")]
    pub xpos1: String,
    #[serde(rename = "XPOS2")]
    pub xpos2: String,
}

impl RawRecord {
    /// Predicted edge under the given symmetrization method.
    #[must_use]
    pub fn predicted_edge(&self, method: EdgeMethod) -> bool {
        match method {
            EdgeMethod::Sum => self.pmi_edge_sum,
            EdgeMethod::Triu => self.pmi_edge_triu,
            EdgeMethod::Tril => self.pmi_edge_tril,
            EdgeMethod::Unsymmetrized => self.pmi_edge_none,
        }
    }

    /// Correctness flag: prediction agrees with the gold parse.
    #[must_use]
    pub fn is_correct(&self, method: EdgeMethod) -> bool {
        self.gold_edge == self.predicted_edge(method)
    }

    /// Derived `UPOS12` category: both universal POS tags joined by `-`.
    #[must_use]
    pub fn upos_pair(&self) -> String {
        format!("{}-{}", self.upos1, self.upos2)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum RecordError {
    #[display("record {record} (sentence {sentence_index}) has lin_dist 0, expected a positive distance")]
    ZeroDistance {
        record: usize,
        sentence_index: usize,
    },
}

/// Checks the invariants the deserializer cannot express.
pub fn validate_records(records: &[RawRecord]) -> Result<(), RecordError> {
    for (i, record) in records.iter().enumerate() {
        if record.lin_dist == 0 {
            return Err(RecordError::ZeroDistance {
                record: i,
                sentence_index: record.sentence_index,
            });
        }
    }
    Ok(())
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct FlagVisitor;

    impl de::Visitor<'_> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a boolean (TRUE/FALSE, true/false or 1/0)")
        }

        fn visit_bool<E>(self, v: bool) -> Result<bool, E> {
            Ok(v)
        }

        fn visit_u64<E>(self, v: u64) -> Result<bool, E>
        where
            E: de::Error,
        {
            match v {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(de::Unexpected::Unsigned(v), &self)),
            }
        }

        fn visit_i64<E>(self, v: i64) -> Result<bool, E>
        where
            E: de::Error,
        {
            match v {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(de::Unexpected::Signed(v), &self)),
            }
        }

        fn visit_str<E>(self, v: &str) -> Result<bool, E>
        where
            E: de::Error,
        {
            match v {
                "TRUE" | "True" | "true" | "1" => Ok(true),
                "FALSE" | "False" | "false" | "0" => Ok(false),
                _ => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
            }
        }
    }

    deserializer.deserialize_any(FlagVisitor)
}

fn deserialize_nullable<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_empty() && v != "NA"))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a record for tests; all predicted-edge columns share `predicted`.
    pub(crate) fn record(
        relation: Option<&str>,
        lin_dist: u32,
        gold_edge: bool,
        predicted: bool,
    ) -> RawRecord {
        RawRecord {
            sentence_index: 0,
            lin_dist,
            relation: relation.map(str::to_owned),
            gold_edge,
            pmi_edge_sum: predicted,
            pmi_edge_none: predicted,
            pmi_edge_tril: predicted,
            pmi_edge_triu: predicted,
            pmi_sum: 0.0,
            upos1: "NOUN".to_owned(),
            upos2: "VERB".to_owned(),
            xpos1: "NN".to_owned(),
            xpos2: "VB".to_owned(),
        }
    }

    #[test]
    fn test_correctness_flag() {
        assert!(record(Some("dobj"), 2, true, true).is_correct(EdgeMethod::Sum));
        assert!(record(Some("dobj"), 2, false, false).is_correct(EdgeMethod::Sum));
        assert!(!record(Some("dobj"), 2, true, false).is_correct(EdgeMethod::Sum));
    }

    #[test]
    fn test_predicted_edge_by_method() {
        let mut r = record(None, 1, true, false);
        r.pmi_edge_triu = true;
        assert!(r.predicted_edge(EdgeMethod::Triu));
        assert!(!r.predicted_edge(EdgeMethod::Tril));
        assert!(!r.predicted_edge(EdgeMethod::Unsymmetrized));
    }

    #[test]
    fn test_upos_pair() {
        assert_eq!(record(None, 1, false, false).upos_pair(), "NOUN-VERB");
    }

    #[test]
    fn test_edge_method_from_str() {
        assert_eq!("none".parse(), Ok(EdgeMethod::Unsymmetrized));
        assert_eq!("pmi_edge_tril".parse(), Ok(EdgeMethod::Tril));
        assert!("max".parse::<EdgeMethod>().is_err());
    }

    #[test]
    fn test_flag_accepts_r_and_python_spellings() {
        #[derive(Deserialize)]
        struct Flag {
            #[serde(deserialize_with = "deserialize_flag")]
            value: bool,
        }
        for (input, expected) in [
            (r#"{"value": "TRUE"}"#, true),
            (r#"{"value": "False"}"#, false),
            (r#"{"value": true}"#, true),
            (r#"{"value": 0}"#, false),
        ] {
            let flag: Flag = serde_json::from_str(input).unwrap();
            assert_eq!(flag.value, expected, "{input}");
        }
        assert!(serde_json::from_str::<Flag>(r#"{"value": "yes"}"#).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_distance() {
        let records = vec![record(Some("det"), 1, true, true), record(None, 0, false, false)];
        assert_eq!(
            validate_records(&records),
            Err(RecordError::ZeroDistance {
                record: 1,
                sentence_index: 0
            })
        );
    }
}
