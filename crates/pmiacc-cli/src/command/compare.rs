//! Cross-model comparison commands
//!
//! Each model's records are loaded and aggregated on its own scoped thread;
//! the resulting tables are then merged on the comparison's join keys.

use std::{panic, thread};

use anyhow::Context;
use clap::Args;
use pmiacc_analysis::{
    length::{self, LENGTH_JOIN_KEYS},
    merge,
    record::{EdgeMethod, RawRecord},
    relation::{self, RELATION_JOIN_KEYS},
    table::StatTable,
};

use crate::{
    command::table,
    util::{self, ModelInput},
};

#[derive(Debug, Clone, Args)]
pub(crate) struct CompareRelationsArg {
    /// Models to compare, as NAME=PATH pairs
    #[arg(required = true)]
    pub models: Vec<ModelInput>,

    /// Symmetrization method whose predicted edges are scored
    #[arg(long, default_value = "sum")]
    pub edge: EdgeMethod,

    /// Ignore pairs with a linear distance of at most this value
    #[arg(long, default_value_t = 0)]
    pub min_distance: u32,

    #[clap(flatten)]
    pub output: CompareOutputArg,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct CompareLengthsArg {
    /// Models to compare, as NAME=PATH pairs
    #[arg(required = true)]
    pub models: Vec<ModelInput>,

    /// Symmetrization method whose predicted edges are scored
    #[arg(long, default_value = "sum")]
    pub edge: EdgeMethod,

    #[clap(flatten)]
    pub output: CompareOutputArg,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct CompareOutputArg {
    /// Print the joined table with one column per model instead of the long form
    #[arg(long)]
    pub wide: bool,

    /// Print JSON instead of a text table (long form only)
    #[arg(long, conflicts_with = "wide")]
    pub json: bool,
}

pub(crate) fn run_relations(arg: &CompareRelationsArg) -> anyhow::Result<()> {
    let tables = aggregate_models(&arg.models, |records| {
        StatTable::from_rows(&relation::aggregate_by_relation(
            records,
            arg.edge,
            arg.min_distance,
        ))
    })?;
    let title = format!(
        "Relation Comparison ({}, lin_dist > {})",
        arg.edge.column_name(),
        arg.min_distance
    );
    print_merged(&title, &tables, RELATION_JOIN_KEYS, &arg.output)
}

pub(crate) fn run_lengths(arg: &CompareLengthsArg) -> anyhow::Result<()> {
    let tables = aggregate_models(&arg.models, |records| {
        StatTable::from_rows(&length::aggregate_by_length(records, arg.edge))
    })?;
    let title = format!("Linear Distance Comparison ({})", arg.edge.column_name());
    print_merged(&title, &tables, LENGTH_JOIN_KEYS, &arg.output)
}

fn aggregate_models<F>(
    models: &[ModelInput],
    aggregate: F,
) -> anyhow::Result<Vec<(String, StatTable)>>
where
    F: Fn(&[RawRecord]) -> StatTable + Sync,
{
    let aggregate = &aggregate;
    thread::scope(|s| {
        let handles = models
            .iter()
            .map(|model| {
                s.spawn(move || -> anyhow::Result<(String, StatTable)> {
                    let records = util::read_records_file(&model.path)?;
                    let table = aggregate(&records);
                    log::info!("Aggregated model {}: {} rows", model.name, table.len());
                    Ok((model.name.clone(), table))
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_else(|e| panic::resume_unwind(e)))
            .collect()
    })
}

fn print_merged(
    title: &str,
    tables: &[(String, StatTable)],
    join_keys: &[&str],
    output: &CompareOutputArg,
) -> anyhow::Result<()> {
    let wide = merge::merge_wide(tables, join_keys).context("Failed to merge model tables")?;
    if output.wide {
        println!("{title}");
        table::print_wide_table(&wide);
        return Ok(());
    }

    let comparison = wide
        .unpivot()
        .context("Failed to unpivot merged table")?;
    if output.json {
        return util::print_json(&comparison);
    }
    println!("{title}");
    table::print_comparison_table(&comparison);
    Ok(())
}
