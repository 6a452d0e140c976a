use std::path::PathBuf;

use clap::Args;
use pmiacc_analysis::{
    record::EdgeMethod,
    table::Cell,
    uuas::{self, UuasSummary},
};

use crate::{command::table, util};

#[derive(Debug, Clone, Args)]
pub(crate) struct UuasArg {
    /// Path to the records CSV file
    pub records: PathBuf,

    /// Also print the score of every sentence
    #[arg(long)]
    pub per_sentence: bool,

    /// Print JSON instead of text tables
    #[arg(long)]
    pub json: bool,
}

pub(crate) fn run(arg: &UuasArg) -> anyhow::Result<()> {
    let records = util::read_records_file(&arg.records)?;
    let summary = uuas::summarize_uuas(&records);

    if arg.json {
        return util::print_json(&summary);
    }

    if arg.per_sentence {
        print_sentences(&summary);
        println!();
    }

    let scored = |method: EdgeMethod| {
        summary
            .sentences
            .iter()
            .filter(|s| s.uuas[&method].is_some())
            .count()
    };
    println!("Mean UUAS over {} sentences", summary.sentences.len());
    let rows = EdgeMethod::ALL
        .into_iter()
        .map(|method| {
            vec![
                method.to_string(),
                table::format_cell(&Cell::from(summary.mean[&method])),
                scored(method).to_string(),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&["Method", "UUAS", "Scored"], &rows);
    Ok(())
}

fn print_sentences(summary: &UuasSummary) {
    let header = ["Sentence", "Pairs", "Gold"]
        .into_iter()
        .map(str::to_owned)
        .chain(EdgeMethod::ALL.into_iter().map(|m| m.to_string()))
        .collect::<Vec<_>>();
    let rows = summary
        .sentences
        .iter()
        .map(|s| {
            [
                s.sentence_index.to_string(),
                s.num_pairs.to_string(),
                s.num_gold_edges.to_string(),
            ]
            .into_iter()
            .chain(
                EdgeMethod::ALL
                    .into_iter()
                    .map(|m| table::format_cell(&Cell::from(s.uuas[&m]))),
            )
            .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    println!("UUAS per Sentence");
    table::print_table(&header, &rows);
}
