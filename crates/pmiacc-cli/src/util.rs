use std::{
    fs::File,
    io::{self, Write as _},
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Context;
use pmiacc_analysis::record::{self, RawRecord};

/// A model name paired with its records file, given as `NAME=PATH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ModelInput {
    pub name: String,
    pub path: PathBuf,
}

impl FromStr for ModelInput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, path) = s
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=PATH, got '{s}'"))?;
        if name.is_empty() || path.is_empty() {
            return Err(format!("expected NAME=PATH, got '{s}'"));
        }
        Ok(Self {
            name: name.to_owned(),
            path: PathBuf::from(path),
        })
    }
}

pub(crate) fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Read word-pair records from a CSV file with a header line
///
/// Columns not part of the record schema are ignored.
///
/// # Errors
///
/// Returns error if the file cannot be opened, a row cannot be parsed, or a
/// record violates the schema (e.g. zero distance)
pub(crate) fn read_records_file<P>(path: P) -> anyhow::Result<Vec<RawRecord>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open records file: {}", path.display()))?;

    let records = reader
        .deserialize::<RawRecord>()
        .enumerate()
        .map(|(i, result)| {
            result.with_context(|| format!("Failed to parse record {} in {}", i + 1, path.display()))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    record::validate_records(&records)
        .with_context(|| format!("Invalid records in {}", path.display()))?;

    log::info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Write a value to stdout as pretty-printed JSON
pub(crate) fn print_json<T>(value: &T) -> anyhow::Result<()>
where
    T: serde::Serialize,
{
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).context("Failed to write JSON to stdout")?;
    writeln!(stdout).context("Failed to write newline after JSON to stdout")?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}
