//! Feature importance command
//!
//! Runs one importance experiment from the command-line flags, or one per
//! variant listed in a JSON file:
//!
//! ```json
//! [
//!   { "name": "pos", "features": ["UPOS1", "UPOS2", "XPOS1", "XPOS2"] },
//!   { "name": "upos-pair", "features": ["relation", "UPOS12"] },
//!   { "name": "relation-only", "features": ["relation"] }
//! ]
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use pmiacc_analysis::{
    importance::{self, Column, ImportanceConfig, ImportanceModel},
    record::EdgeMethod,
};
use pmiacc_training::forest::ForestParams;
use serde::{Deserialize, Serialize};

use crate::{command::table, util};

#[derive(Debug, Clone, Args)]
pub(crate) struct ImportanceArg {
    /// Path to the records CSV file
    pub records: PathBuf,

    /// Symmetrization method whose correctness is predicted
    #[arg(long, default_value = "sum")]
    pub target: EdgeMethod,

    /// Feature columns (comma-separated; default: relation, POS tags and lin_dist)
    #[arg(long, value_delimiter = ',', conflicts_with = "variants")]
    pub features: Vec<Column>,

    /// Columns to remove from the feature set (comma-separated)
    #[arg(long, value_delimiter = ',', conflicts_with = "variants")]
    pub exclude: Vec<Column>,

    /// JSON file listing experiment variants to run
    #[arg(long)]
    pub variants: Option<PathBuf>,

    #[clap(flatten)]
    pub forest: ForestArg,

    /// Print JSON instead of text tables
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct ForestArg {
    /// JSON file with training parameters; flags below override its values
    #[arg(long)]
    pub forest_config: Option<PathBuf>,

    /// Number of trees
    #[arg(long)]
    pub n_trees: Option<usize>,

    /// Features tried per split [default: floor(sqrt(number of features))]
    #[arg(long)]
    pub mtry: Option<usize>,

    /// Nodes with at most this many samples become leaves
    #[arg(long)]
    pub min_node_size: Option<usize>,

    /// Maximum tree depth
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Grow trees one at a time and release per-tree buffers eagerly
    #[arg(long)]
    pub memory_saving: bool,
}

impl ForestArg {
    fn to_params(&self) -> anyhow::Result<ForestParams> {
        let mut params = match &self.forest_config {
            Some(path) => util::read_json_file::<ForestParams, _>("forest config", path)?,
            None => ForestParams::default(),
        };
        if let Some(n_trees) = self.n_trees {
            params.n_trees = n_trees;
        }
        if let Some(mtry) = self.mtry {
            params.mtry = Some(mtry);
        }
        if let Some(min_node_size) = self.min_node_size {
            params.min_node_size = min_node_size;
        }
        if let Some(max_depth) = self.max_depth {
            params.max_depth = Some(max_depth);
        }
        if let Some(seed) = self.seed {
            params.seed = seed;
        }
        params.memory_saving |= self.memory_saving;
        Ok(params)
    }
}

/// One entry of a variants file.
#[derive(Debug, Clone, Deserialize)]
struct ImportanceVariant {
    name: String,
    features: Vec<Column>,
    #[serde(default)]
    exclude: Vec<Column>,
}

#[derive(Debug, Serialize)]
struct VariantResult<'a> {
    name: &'a str,
    model: &'a ImportanceModel,
}

pub(crate) fn run(arg: &ImportanceArg) -> anyhow::Result<()> {
    let forest = arg.forest.to_params()?;
    let variants = match &arg.variants {
        Some(path) => {
            util::read_json_file::<Vec<ImportanceVariant>, _>("importance variants", path)?
        }
        None => vec![ImportanceVariant {
            name: "default".to_owned(),
            features: if arg.features.is_empty() {
                Column::DEFAULT_FEATURES.to_vec()
            } else {
                arg.features.clone()
            },
            exclude: arg.exclude.clone(),
        }],
    };
    let records = util::read_records_file(&arg.records)?;

    let mut results = vec![];
    for variant in variants {
        log::info!("Running importance variant '{}'", variant.name);
        let config = ImportanceConfig {
            target: arg.target,
            features: variant.features,
            exclude: variant.exclude,
            forest: forest.clone(),
        };
        let model = importance::fit_importance(&records, &config)
            .with_context(|| format!("Importance variant '{}' failed", variant.name))?;
        results.push((variant.name, model));
    }

    if arg.json {
        let json = results
            .iter()
            .map(|(name, model)| VariantResult { name, model })
            .collect::<Vec<_>>();
        return util::print_json(&json);
    }

    for (name, model) in &results {
        print_model(name, model, &forest);
        println!();
    }
    Ok(())
}

fn print_model(name: &str, model: &ImportanceModel, forest: &ForestParams) {
    println!(
        "Feature Importance: {name} (target {}, {} records, {} trees)",
        model.target.column_name(),
        model.num_records,
        forest.n_trees
    );
    let rows = model
        .importance
        .iter()
        .map(|imp| {
            vec![
                imp.name.clone(),
                imp.rank.to_string(),
                format!("{:.5}", imp.importance),
                format!("{:.5}", imp.std),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&["Feature", "Rank", "MeanDecreaseAcc", "Std"], &rows);
    println!();

    println!("OOB Confusion Matrix (rows: actual, columns: predicted)");
    let rows = [false, true]
        .into_iter()
        .map(|actual| {
            vec![
                label(actual).to_owned(),
                model.oob_confusion.get(actual, false).to_string(),
                model.oob_confusion.get(actual, true).to_string(),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&["", label(false), label(true)], &rows);
    match model.oob_error() {
        Some(error) => println!("  OOB error rate: {:.2}%", error * 100.0),
        None => println!("  OOB error rate: N/A (no out-of-bag predictions)"),
    }
}

fn label(value: bool) -> &'static str {
    if value { "TRUE" } else { "FALSE" }
}
