//! Which word-pair attributes predict whether a PMI edge is correct?
//!
//! [`fit_importance`] encodes the selected record columns as features, uses
//! the correctness of the chosen predicted-edge column as the label, fits a
//! bagged tree ensemble and reports permutation importances together with the
//! out-of-bag confusion matrix.
//!
//! Unlike the aggregators, records without a gold relation are kept: their
//! relation is encoded as the category [`NO_RELATION`].
//!
//! Columns that carry the label (`gold_edge` and every `pmi_edge_*`) are
//! rejected as features; they must be left out of `features` or listed in
//! `exclude`.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use pmiacc_training::{
    confusion::ConfusionMatrix,
    dataset::{Dataset, FeatureColumn, TrainError},
    forest::{self, ForestParams, RandomForest},
    importance::PermutationImportance,
};

use crate::record::{EdgeMethod, RawRecord};

/// Category used for records without a gold relation.
pub const NO_RELATION: &str = "NONE";

/// A record column, or a column derived from record columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Column {
    SentenceIndex,
    LinDist,
    Relation,
    GoldEdge,
    PmiEdge(EdgeMethod),
    PmiSum,
    Upos1,
    Upos2,
    Xpos1,
    Xpos2,
    /// `UPOS1` and `UPOS2` joined by `-`
    Upos12,
}

impl Column {
    pub const ALL: [Column; 14] = [
        Column::SentenceIndex,
        Column::LinDist,
        Column::Relation,
        Column::GoldEdge,
        Column::PmiEdge(EdgeMethod::Sum),
        Column::PmiEdge(EdgeMethod::Triu),
        Column::PmiEdge(EdgeMethod::Tril),
        Column::PmiEdge(EdgeMethod::Unsymmetrized),
        Column::PmiSum,
        Column::Upos1,
        Column::Upos2,
        Column::Xpos1,
        Column::Xpos2,
        Column::Upos12,
    ];

    /// POS tags, relation and distance.
    pub const DEFAULT_FEATURES: [Column; 6] = [
        Column::Relation,
        Column::Upos1,
        Column::Upos2,
        Column::Xpos1,
        Column::Xpos2,
        Column::LinDist,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Column::SentenceIndex => "sentence_index",
            Column::LinDist => "lin_dist",
            Column::Relation => "relation",
            Column::GoldEdge => "gold_edge",
            Column::PmiEdge(method) => method.column_name(),
            Column::PmiSum => "pmi_sum",
            Column::Upos1 => "UPOS1",
            Column::Upos2 => "UPOS2",
            Column::Xpos1 => "XPOS1",
            Column::Xpos2 => "XPOS2",
            Column::Upos12 => "UPOS12",
        }
    }

    /// Whether the column determines the correctness label.
    #[must_use]
    pub fn is_label_bearing(self) -> bool {
        matches!(self, Column::GoldEdge | Column::PmiEdge(_))
    }

    #[expect(clippy::cast_precision_loss)]
    fn encode(self, records: &[RawRecord]) -> FeatureColumn {
        let name = self.name();
        match self {
            Column::SentenceIndex => FeatureColumn::numeric(
                name,
                records.iter().map(|r| r.sentence_index as f64).collect(),
            ),
            Column::LinDist => {
                FeatureColumn::numeric(name, records.iter().map(|r| f64::from(r.lin_dist)).collect())
            }
            Column::PmiSum => FeatureColumn::numeric(name, records.iter().map(|r| r.pmi_sum).collect()),
            Column::Relation => FeatureColumn::categorical(
                name,
                records
                    .iter()
                    .map(|r| r.relation.as_deref().unwrap_or(NO_RELATION)),
            ),
            Column::Upos1 => FeatureColumn::categorical(name, records.iter().map(|r| &r.upos1)),
            Column::Upos2 => FeatureColumn::categorical(name, records.iter().map(|r| &r.upos2)),
            Column::Xpos1 => FeatureColumn::categorical(name, records.iter().map(|r| &r.xpos1)),
            Column::Xpos2 => FeatureColumn::categorical(name, records.iter().map(|r| &r.xpos2)),
            Column::Upos12 => FeatureColumn::categorical(name, records.iter().map(RawRecord::upos_pair)),
            Column::GoldEdge => flag_column(name, records, |r| r.gold_edge),
            Column::PmiEdge(EdgeMethod::Sum) => flag_column(name, records, |r| r.pmi_edge_sum),
            Column::PmiEdge(EdgeMethod::Triu) => flag_column(name, records, |r| r.pmi_edge_triu),
            Column::PmiEdge(EdgeMethod::Tril) => flag_column(name, records, |r| r.pmi_edge_tril),
            Column::PmiEdge(EdgeMethod::Unsymmetrized) => flag_column(name, records, |r| r.pmi_edge_none),
        }
    }
}

fn flag_column(name: &str, records: &[RawRecord], flag: fn(&RawRecord) -> bool) -> FeatureColumn {
    FeatureColumn::categorical(
        name,
        records.iter().map(|r| if flag(r) { "TRUE" } else { "FALSE" }),
    )
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.name(), f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown column '{name}'")]
pub struct UnknownColumn {
    #[error(not(source))]
    pub name: String,
}

impl FromStr for Column {
    type Err = UnknownColumn;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::ALL
            .into_iter()
            .find(|column| column.name() == s)
            .ok_or_else(|| UnknownColumn { name: s.to_owned() })
    }
}

impl TryFrom<String> for Column {
    type Error = UnknownColumn;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Column> for String {
    fn from(column: Column) -> Self {
        column.name().to_owned()
    }
}

/// One importance experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportanceConfig {
    /// Predicted-edge column whose correctness is the label
    pub target: EdgeMethod,
    /// Candidate feature columns
    pub features: Vec<Column>,
    /// Columns removed from `features`
    pub exclude: Vec<Column>,
    pub forest: ForestParams,
}

impl Default for ImportanceConfig {
    fn default() -> Self {
        Self {
            target: EdgeMethod::default(),
            features: Column::DEFAULT_FEATURES.to_vec(),
            exclude: vec![],
            forest: ForestParams::default(),
        }
    }
}

impl ImportanceConfig {
    /// `features` minus `exclude`, first occurrence order, without repeats.
    #[must_use]
    pub fn effective_features(&self) -> Vec<Column> {
        let mut effective = vec![];
        for &column in &self.features {
            if !self.exclude.contains(&column) && !effective.contains(&column) {
                effective.push(column);
            }
        }
        effective
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ImportanceError {
    #[display("label-bearing columns in the feature set: {}", join(columns))]
    LabelLeakage {
        #[error(not(source))]
        columns: Vec<Column>,
    },
    #[display("no records to train on")]
    EmptyTrainingSet,
    #[display("no feature columns left after exclusions")]
    NoFeatures,
    #[display("training failed: {source}")]
    Train { source: TrainError },
}

impl From<TrainError> for ImportanceError {
    fn from(source: TrainError) -> Self {
        ImportanceError::Train { source }
    }
}

fn join(columns: &[Column]) -> String {
    columns
        .iter()
        .copied()
        .map(Column::name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A fitted importance experiment.
#[derive(Debug, Clone, Serialize)]
pub struct ImportanceModel {
    pub target: EdgeMethod,
    pub features: Vec<Column>,
    pub num_records: usize,
    /// Most important first
    pub importance: Vec<PermutationImportance>,
    pub oob_confusion: ConfusionMatrix,
    #[serde(skip)]
    pub forest: RandomForest,
}

impl ImportanceModel {
    #[must_use]
    pub fn oob_error(&self) -> Option<f64> {
        self.oob_confusion.error_rate()
    }

    #[must_use]
    pub fn importance_of(&self, column: Column) -> Option<&PermutationImportance> {
        self.importance.iter().find(|imp| imp.name == column.name())
    }
}

/// Fits a tree ensemble predicting edge correctness and ranks the features.
///
/// # Errors
///
/// - [`ImportanceError::LabelLeakage`] if a label-bearing column survives the
///   exclusions
/// - [`ImportanceError::NoFeatures`] if no feature survives the exclusions
/// - [`ImportanceError::EmptyTrainingSet`] for an empty input
/// - [`ImportanceError::Train`] for invalid training parameters or NaN scores
pub fn fit_importance(
    records: &[RawRecord],
    config: &ImportanceConfig,
) -> Result<ImportanceModel, ImportanceError> {
    let features = config.effective_features();
    let leaked = features
        .iter()
        .copied()
        .filter(|c| c.is_label_bearing())
        .collect::<Vec<_>>();
    if !leaked.is_empty() {
        return Err(ImportanceError::LabelLeakage { columns: leaked });
    }
    if features.is_empty() {
        return Err(ImportanceError::NoFeatures);
    }
    if records.is_empty() {
        return Err(ImportanceError::EmptyTrainingSet);
    }

    let columns = features.iter().map(|c| c.encode(records)).collect();
    let labels = records.iter().map(|r| r.is_correct(config.target)).collect();
    let dataset = Dataset::new(columns, labels)?;

    log::info!(
        "Fitting {} trees on {} records, target {}, features [{}]",
        config.forest.n_trees,
        dataset.len(),
        config.target.column_name(),
        join(&features)
    );
    let fit = forest::fit(&dataset, &config.forest)?;
    if let Some(error) = fit.oob_error() {
        log::info!("OOB error rate: {:.2}%", error * 100.0);
    }

    Ok(ImportanceModel {
        target: config.target,
        features,
        num_records: records.len(),
        importance: fit.importance,
        oob_confusion: fit.oob_confusion,
        forest: fit.forest,
    })
}
