use clap::{Parser, Subcommand};

use self::{
    aggregate::{LengthArg, RelationArg},
    compare::{CompareLengthsArg, CompareRelationsArg},
    importance::ImportanceArg,
    uuas::UuasArg,
};

mod aggregate;
mod compare;
mod importance;
mod table;
mod uuas;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What analysis to run
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Accuracy statistics per gold relation for one model
    Relation(#[clap(flatten)] RelationArg),
    /// Accuracy statistics per linear distance for one model
    Length(#[clap(flatten)] LengthArg),
    /// Compare per-relation statistics across models
    CompareRelations(#[clap(flatten)] CompareRelationsArg),
    /// Compare per-distance statistics across models
    CompareLengths(#[clap(flatten)] CompareLengthsArg),
    /// Rank word-pair attributes by how well they predict edge correctness
    Importance(#[clap(flatten)] ImportanceArg),
    /// Unlabeled undirected attachment scores per sentence
    Uuas(#[clap(flatten)] UuasArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Relation(arg) => aggregate::run_relation(&arg)?,
        Mode::Length(arg) => aggregate::run_length(&arg)?,
        Mode::CompareRelations(arg) => compare::run_relations(&arg)?,
        Mode::CompareLengths(arg) => compare::run_lengths(&arg)?,
        Mode::Importance(arg) => importance::run(&arg)?,
        Mode::Uuas(arg) => uuas::run(&arg)?,
    }
    Ok(())
}
