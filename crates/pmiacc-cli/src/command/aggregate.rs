//! Single-model aggregation commands

use std::path::PathBuf;

use clap::Args;
use pmiacc_analysis::{length, record::EdgeMethod, relation, table::StatTable};

use crate::{command::table, util};

#[derive(Debug, Clone, Args)]
pub(crate) struct RelationArg {
    /// Path to the records CSV file
    pub records: PathBuf,

    /// Symmetrization method whose predicted edges are scored
    #[arg(long, default_value = "sum")]
    pub edge: EdgeMethod,

    /// Ignore pairs with a linear distance of at most this value
    #[arg(long, default_value_t = 0)]
    pub min_distance: u32,

    /// Print JSON instead of a text table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct LengthArg {
    /// Path to the records CSV file
    pub records: PathBuf,

    /// Symmetrization method whose predicted edges are scored
    #[arg(long, default_value = "sum")]
    pub edge: EdgeMethod,

    /// Print JSON instead of a text table
    #[arg(long)]
    pub json: bool,
}

pub(crate) fn run_relation(arg: &RelationArg) -> anyhow::Result<()> {
    let records = util::read_records_file(&arg.records)?;
    let stats = relation::aggregate_by_relation(&records, arg.edge, arg.min_distance);

    if arg.json {
        return util::print_json(&stats);
    }
    println!(
        "Accuracy by Relation ({}, lin_dist > {})",
        arg.edge.column_name(),
        arg.min_distance
    );
    table::print_stat_table(&StatTable::from_rows(&stats));
    Ok(())
}

pub(crate) fn run_length(arg: &LengthArg) -> anyhow::Result<()> {
    let records = util::read_records_file(&arg.records)?;
    let stats = length::aggregate_by_length(&records, arg.edge);

    if arg.json {
        return util::print_json(&stats);
    }
    println!("Accuracy by Linear Distance ({})", arg.edge.column_name());
    table::print_stat_table(&StatTable::from_rows(&stats));
    Ok(())
}
