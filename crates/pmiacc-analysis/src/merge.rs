//! Cross-model comparison of statistic tables
//!
//! Each model produces a same-shaped [`StatTable`]. Merging turns the set of
//! per-model tables into one long-format [`ComparisonTable`] with an explicit
//! `model` column:
//!
//! 1. **Suffix**: every non-key column `c` of model `m` becomes `c.m`
//! 2. **Outer join**: tables are joined on the key columns; a key tuple present
//!    in only some models keeps its row, other models' cells stay missing
//! 3. **Unpivot**: for each declared base column and each model, the suffixed
//!    cell is read back, giving one row per `(key tuple, model)`
//!
//! Rows are ordered by key tuple and then by model name, so the result does
//! not depend on the order of the input tables.
//!
//! ```
//! use pmiacc_analysis::{
//!     merge,
//!     table::{Cell, StatTable},
//! };
//!
//! let table = |n: usize| {
//!     StatTable::new(
//!         vec!["relation".into(), "n".into()],
//!         vec![vec![Cell::from("nsubj"), Cell::from(n)]],
//!     )
//!     .unwrap()
//! };
//! let tables = vec![("A".to_owned(), table(100)), ("B".to_owned(), table(120))];
//!
//! let merged = merge::merge(&tables, &["relation"]).unwrap();
//! assert_eq!(merged.columns(), ["relation", "model", "n"]);
//! assert_eq!(merged.len(), 2);
//! assert_eq!(merged.rows()[1].model, "B");
//! assert_eq!(merged.get(1, "n"), Some(&Cell::Integer(120)));
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Serialize, ser::SerializeMap, ser::SerializeSeq};

use crate::table::{Cell, StatTable};

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum MergeError {
    #[display("model '{model}' appears more than once")]
    DuplicateModel {
        #[error(not(source))]
        model: String,
    },
    #[display("join key '{key}' is not a column of model '{model}'")]
    UnknownJoinKey { model: String, key: String },
    #[display("model '{model}' has value columns [{}], expected [{}]", found.join(", "), expected.join(", "))]
    SchemaMismatch {
        model: String,
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[display("model '{model}' has more than one row for key ({key})")]
    DuplicateJoinKey { model: String, key: String },
    #[display("suffixed column '{column}' is produced more than once")]
    SuffixCollision {
        #[error(not(source))]
        column: String,
    },
    #[display("wide table has no column '{column}'")]
    MissingColumn {
        #[error(not(source))]
        column: String,
    },
}

/// Name of a per-model column in the wide table.
#[must_use]
pub fn suffixed(column: &str, model: &str) -> String {
    format!("{column}.{model}")
}

/// Outer-joined table with one suffixed value column per (base column, model).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideTable {
    key_columns: Vec<String>,
    base_columns: Vec<String>,
    models: Vec<String>,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl WideTable {
    /// Key columns followed by the suffixed value columns.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    /// Value columns without suffix.
    #[must_use]
    pub fn base_columns(&self) -> &[String] {
        &self.base_columns
    }

    /// Model names in output order.
    #[must_use]
    pub fn models(&self) -> &[String] {
        &self.models
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).map(|cells| &cells[index])
    }

    /// Converts to long form: one row per key tuple and model.
    pub fn unpivot(&self) -> Result<ComparisonTable, MergeError> {
        let index = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect::<HashMap<_, _>>();
        let lookup = |column: &str| {
            index
                .get(column)
                .copied()
                .ok_or_else(|| MergeError::MissingColumn {
                    column: column.to_owned(),
                })
        };

        let key_indices = self
            .key_columns
            .iter()
            .map(|key| lookup(key.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        let value_indices = self
            .models
            .iter()
            .map(|model| {
                self.base_columns
                    .iter()
                    .map(|base| lookup(suffixed(base, model).as_str()))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = Vec::with_capacity(self.rows.len() * self.models.len());
        for cells in &self.rows {
            let key = key_indices.iter().map(|&i| cells[i].clone()).collect::<Vec<_>>();
            for (model, indices) in self.models.iter().zip(&value_indices) {
                rows.push(ModelComparisonRow {
                    key: key.clone(),
                    model: model.clone(),
                    values: indices.iter().map(|&i| cells[i].clone()).collect(),
                });
            }
        }

        Ok(ComparisonTable {
            key_columns: self.key_columns.clone(),
            value_columns: self.base_columns.clone(),
            rows,
        })
    }
}

/// One `(key tuple, model)` row of a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelComparisonRow {
    pub key: Vec<Cell>,
    pub model: String,
    /// One cell per value column, missing when the model lacks this key
    pub values: Vec<Cell>,
}

/// Long-format comparison table: key columns, `model`, value columns.
///
/// Serializes as a sequence of objects keyed by column name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComparisonTable {
    key_columns: Vec<String>,
    value_columns: Vec<String>,
    rows: Vec<ModelComparisonRow>,
}

impl ComparisonTable {
    /// Column names: join keys, `model`, then value columns.
    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        self.key_columns
            .iter()
            .map(String::as_str)
            .chain(["model"])
            .chain(self.value_columns.iter().map(String::as_str))
            .collect()
    }

    #[must_use]
    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    #[must_use]
    pub fn value_columns(&self) -> &[String] {
        &self.value_columns
    }

    #[must_use]
    pub fn rows(&self) -> &[ModelComparisonRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All cells of a row in [`Self::columns`] order.
    #[must_use]
    pub fn row_cells(&self, row: &ModelComparisonRow) -> Vec<Cell> {
        row.key
            .iter()
            .cloned()
            .chain([Cell::from(row.model.as_str())])
            .chain(row.values.iter().cloned())
            .collect()
    }

    /// Cell at `row` in the named key or value column.
    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let row = self.rows.get(row)?;
        if let Some(i) = self.key_columns.iter().position(|c| c == column) {
            return row.key.get(i);
        }
        let i = self.value_columns.iter().position(|c| c == column)?;
        row.values.get(i)
    }

    /// Cell in the named column of the row for `key` and `model`.
    #[must_use]
    pub fn find(&self, key: &[Cell], model: &str, column: &str) -> Option<&Cell> {
        let row = self
            .rows
            .iter()
            .position(|r| r.model == model && r.key == key)?;
        self.get(row, column)
    }
}

impl Serialize for ComparisonTable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        struct RowRef<'a> {
            columns: &'a [&'a str],
            cells: Vec<Cell>,
        }

        impl Serialize for RowRef<'_> {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                let mut map = serializer.serialize_map(Some(self.columns.len()))?;
                for (column, cell) in self.columns.iter().zip(&self.cells) {
                    map.serialize_entry(column, cell)?;
                }
                map.end()
            }
        }

        let columns = self.columns();
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&RowRef {
                columns: &columns,
                cells: self.row_cells(row),
            })?;
        }
        seq.end()
    }
}

/// Outer-joins the per-model tables on `join_keys`, suffixing value columns
/// with the model name.
///
/// Models are processed in name order; the first model's column order defines
/// the base column order. Repeated entries in `join_keys` are ignored.
///
/// Fails with [`MergeError::SuffixCollision`] when two (column, model) pairs,
/// or a key column and a suffixed column, produce the same name (e.g. `n.x`
/// of model `y` and `n` of model `x.y`).
pub fn merge_wide(tables: &[(String, StatTable)], join_keys: &[&str]) -> Result<WideTable, MergeError> {
    let mut sorted = tables.iter().collect::<Vec<_>>();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    for pair in sorted.windows(2) {
        if pair[0].0 == pair[1].0 {
            return Err(MergeError::DuplicateModel {
                model: pair[0].0.clone(),
            });
        }
    }

    let mut key_columns: Vec<String> = vec![];
    for key in join_keys {
        if !key_columns.iter().any(|k| k == key) {
            key_columns.push((*key).to_owned());
        }
    }

    // (key indices, value indices in base column order) per model
    let mut layouts = Vec::with_capacity(sorted.len());
    let mut base_columns: Option<Vec<String>> = None;
    for (model, table) in &sorted {
        let key_indices = key_columns
            .iter()
            .map(|key| {
                table
                    .column_index(key)
                    .ok_or_else(|| MergeError::UnknownJoinKey {
                        model: model.clone(),
                        key: key.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let values = table
            .columns()
            .iter()
            .filter(|c| !key_columns.contains(*c))
            .cloned()
            .collect::<Vec<_>>();
        let base = base_columns.get_or_insert_with(|| values.clone());
        if values.iter().collect::<BTreeSet<_>>() != base.iter().collect::<BTreeSet<_>>() {
            return Err(MergeError::SchemaMismatch {
                model: model.clone(),
                expected: base.clone(),
                found: values,
            });
        }
        let value_indices = base
            .iter()
            .filter_map(|column| table.column_index(column))
            .collect::<Vec<_>>();
        layouts.push((key_indices, value_indices));
    }
    let base_columns = base_columns.unwrap_or_default();
    let models = sorted.iter().map(|(model, _)| model.clone()).collect::<Vec<_>>();

    let width = base_columns.len();
    let mut joined: BTreeMap<Vec<Cell>, Vec<Cell>> = BTreeMap::new();
    for (m, ((model, table), (key_indices, value_indices))) in sorted.iter().zip(&layouts).enumerate() {
        let mut seen = BTreeSet::new();
        for cells in table.rows() {
            let key = key_indices.iter().map(|&i| cells[i].clone()).collect::<Vec<_>>();
            if !seen.insert(key.clone()) {
                return Err(duplicate_key(model, key_indices, cells));
            }
            let row = joined
                .entry(key)
                .or_insert_with(|| vec![Cell::Missing; models.len() * width]);
            for (dst, &src) in row[m * width..(m + 1) * width].iter_mut().zip(value_indices) {
                *dst = cells[src].clone();
            }
        }
    }
    log::debug!(
        "merge_wide: {} models, {} distinct keys, {} value columns",
        models.len(),
        joined.len(),
        width
    );

    let mut columns = key_columns.clone();
    for model in &models {
        columns.extend(base_columns.iter().map(|base| suffixed(base, model)));
    }
    let mut names = BTreeSet::new();
    if let Some(column) = columns.iter().find(|c| !names.insert(c.as_str())) {
        return Err(MergeError::SuffixCollision {
            column: column.clone(),
        });
    }
    let rows = joined
        .into_iter()
        .map(|(mut key, values)| {
            key.extend(values);
            key
        })
        .collect();

    Ok(WideTable {
        key_columns,
        base_columns,
        models,
        columns,
        rows,
    })
}

fn duplicate_key(model: &str, key_indices: &[usize], cells: &[Cell]) -> MergeError {
    MergeError::DuplicateJoinKey {
        model: model.to_owned(),
        key: key_indices
            .iter()
            .map(|&i| cells[i].to_string())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Merges per-model tables into one long-format comparison table.
pub fn merge(tables: &[(String, StatTable)], join_keys: &[&str]) -> Result<ComparisonTable, MergeError> {
    merge_wide(tables, join_keys)?.unpivot()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        length::{LENGTH_JOIN_KEYS, LengthStat},
        relation::RELATION_JOIN_KEYS,
        table::StatColumns,
    };

    fn relation_table(rows: &[(&str, usize, f64)]) -> StatTable {
        StatTable::new(
            ["relation", "n", "medlen", "meanlen", "pct_acc"]
                .map(str::to_owned)
                .to_vec(),
            rows.iter()
                .map(|&(relation, n, pct_acc)| {
                    vec![
                        Cell::from(relation),
                        Cell::from(n),
                        Cell::from(3.0),
                        Cell::from(3.2),
                        Cell::from(pct_acc),
                    ]
                })
                .collect(),
        )
        .unwrap()
    }

    fn named(tables: Vec<(&str, StatTable)>) -> Vec<(String, StatTable)> {
        tables
            .into_iter()
            .map(|(name, table)| (name.to_owned(), table))
            .collect()
    }

    #[test]
    fn test_nsubj_scenario() {
        let tables = named(vec![
            ("A", relation_table(&[("nsubj", 100, 0.8)])),
            ("B", relation_table(&[("nsubj", 120, 0.75)])),
            ("C", relation_table(&[("obj", 50, 0.5)])),
        ]);
        let merged = merge(&tables, &["relation", "medlen", "meanlen"]).unwrap();
        assert_eq!(merged.columns(), ["relation", "medlen", "meanlen", "model", "n", "pct_acc"]);

        let key = [Cell::from("nsubj"), Cell::from(3.0), Cell::from(3.2)];
        let rows = merged.rows().iter().filter(|r| r.key == key).collect::<Vec<_>>();
        assert_eq!(rows.len(), 3);
        assert_eq!(merged.find(&key, "A", "n"), Some(&Cell::Integer(100)));
        assert_eq!(merged.find(&key, "A", "pct_acc"), Some(&Cell::Real(0.8)));
        assert_eq!(merged.find(&key, "B", "n"), Some(&Cell::Integer(120)));
        assert_eq!(merged.find(&key, "B", "pct_acc"), Some(&Cell::Real(0.75)));
        assert_eq!(merged.find(&key, "C", "n"), Some(&Cell::Missing));
        assert_eq!(merged.find(&key, "C", "pct_acc"), Some(&Cell::Missing));
    }

    #[test]
    fn test_row_count_is_keys_times_models() {
        let tables = named(vec![
            ("A", relation_table(&[("nsubj", 100, 0.8), ("obj", 10, 0.1)])),
            ("B", relation_table(&[("nsubj", 100, 0.7), ("amod", 5, 0.2)])),
        ]);
        let merged = merge(&tables, RELATION_JOIN_KEYS).unwrap();
        // keys: (amod,5), (nsubj,100), (obj,10)
        assert_eq!(merged.len(), 3 * 2);
        assert_eq!(merged.value_columns(), ["pct_acc"]);
    }

    #[test]
    fn test_order_invariance() {
        let a = ("A", relation_table(&[("nsubj", 100, 0.8), ("obj", 10, 0.1)]));
        let b = ("B", relation_table(&[("nsubj", 120, 0.75)]));
        let c = ("C", relation_table(&[("amod", 7, 0.3)]));
        let forward = merge(&named(vec![a.clone(), b.clone(), c.clone()]), &["relation"]).unwrap();
        let backward = merge(&named(vec![c, a, b]), &["relation"]).unwrap();
        assert_eq!(forward, backward);
        let models = forward.rows().iter().map(|r| r.model.as_str()).collect::<Vec<_>>();
        assert_eq!(models, ["A", "B", "C", "A", "B", "C", "A", "B", "C"]);
    }

    #[test]
    fn test_wide_table_suffixes_value_columns() {
        let tables = named(vec![
            ("gpt2", relation_table(&[("nsubj", 100, 0.8)])),
            ("bert", relation_table(&[("nsubj", 90, 0.6)])),
        ]);
        let wide = merge_wide(&tables, &["relation"]).unwrap();
        assert_eq!(
            wide.columns(),
            [
                "relation",
                "n.bert",
                "medlen.bert",
                "meanlen.bert",
                "pct_acc.bert",
                "n.gpt2",
                "medlen.gpt2",
                "meanlen.gpt2",
                "pct_acc.gpt2",
            ]
        );
        assert_eq!(wide.len(), 1);
        assert_eq!(wide.get(0, "n.gpt2"), Some(&Cell::Integer(100)));
    }

    #[test]
    fn test_schema_mismatch() {
        let other = StatTable::new(
            vec!["relation".into(), "n".into()],
            vec![vec![Cell::from("nsubj"), Cell::from(1_usize)]],
        )
        .unwrap();
        let tables = named(vec![("A", relation_table(&[("nsubj", 100, 0.8)])), ("B", other)]);
        let err = merge(&tables, &["relation"]).unwrap_err();
        assert!(matches!(err, MergeError::SchemaMismatch { ref model, .. } if model == "B"));
    }

    #[test]
    fn test_same_columns_in_different_order_are_aligned() {
        let reordered = StatTable::new(
            ["pct_acc", "meanlen", "relation", "medlen", "n"].map(str::to_owned).to_vec(),
            vec![vec![
                Cell::from(0.5),
                Cell::from(3.2),
                Cell::from("nsubj"),
                Cell::from(3.0),
                Cell::from(7_usize),
            ]],
        )
        .unwrap();
        let tables = named(vec![("A", relation_table(&[("nsubj", 100, 0.8)])), ("B", reordered)]);
        let merged = merge(&tables, &["relation"]).unwrap();
        let key = [Cell::from("nsubj")];
        assert_eq!(merged.find(&key, "B", "n"), Some(&Cell::Integer(7)));
        assert_eq!(merged.find(&key, "B", "pct_acc"), Some(&Cell::Real(0.5)));
    }

    #[test]
    fn test_unknown_join_key() {
        let tables = named(vec![("A", relation_table(&[("nsubj", 100, 0.8)]))]);
        assert_eq!(
            merge(&tables, &["lin_dist"]),
            Err(MergeError::UnknownJoinKey {
                model: "A".into(),
                key: "lin_dist".into()
            })
        );
    }

    #[test]
    fn test_duplicate_model() {
        let tables = named(vec![
            ("A", relation_table(&[("nsubj", 100, 0.8)])),
            ("A", relation_table(&[("obj", 1, 0.8)])),
        ]);
        assert_eq!(
            merge(&tables, &["relation"]),
            Err(MergeError::DuplicateModel { model: "A".into() })
        );
    }

    #[test]
    fn test_duplicate_join_key() {
        let tables = named(vec![(
            "A",
            relation_table(&[("nsubj", 100, 0.8), ("nsubj", 90, 0.7)]),
        )]);
        let err = merge(&tables, &["relation"]).unwrap_err();
        assert_eq!(
            err,
            MergeError::DuplicateJoinKey {
                model: "A".into(),
                key: "nsubj".into()
            }
        );
    }

    #[test]
    fn test_suffix_collision() {
        let table = |n: usize, nx: usize| {
            StatTable::new(
                ["k", "n", "n.x"].map(str::to_owned).to_vec(),
                vec![vec![Cell::from("a"), Cell::from(n), Cell::from(nx)]],
            )
            .unwrap()
        };
        let tables = named(vec![("y", table(1, 2)), ("x.y", table(3, 4))]);
        assert_eq!(
            merge_wide(&tables, &["k"]),
            Err(MergeError::SuffixCollision {
                column: "n.x.y".into()
            })
        );

        let tables = named(vec![("y", table(1, 2)), ("z", table(3, 4))]);
        let wide = merge_wide(&tables, &["k"]).unwrap();
        assert_eq!(wide.models(), ["y", "z"]);
        assert_eq!(wide.get(0, "n.x.y"), Some(&Cell::Integer(2)));
        assert_eq!(wide.get(0, "n.z"), Some(&Cell::Integer(3)));
    }

    #[test]
    fn test_no_tables() {
        let merged = merge(&[], &["relation"]).unwrap();
        assert!(merged.is_empty());
        assert_eq!(merged.columns(), ["relation", "model"]);
    }

    #[test]
    fn test_length_stats_merge() {
        let stat = |n, pct_acc| LengthStat {
            lin_dist: 1,
            n,
            meanpmi: 0.0,
            varpmi: None,
            n_pmi_true: 0,
            n_pmi_false: n,
            pct_acc,
        };
        let tables = vec![
            ("A".to_owned(), StatTable::from_rows(&[stat(4, 0.5)])),
            ("B".to_owned(), StatTable::from_rows(&[stat(4, 0.25)])),
        ];
        let merged = merge(&tables, LENGTH_JOIN_KEYS).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.key_columns(), ["n", "lin_dist"]);
        assert_eq!(merged.value_columns().len(), LengthStat::COLUMNS.len() - 2);
        let key = [Cell::Integer(4), Cell::Integer(1)];
        assert_eq!(merged.find(&key, "B", "pct_acc"), Some(&Cell::Real(0.25)));
        assert_eq!(merged.find(&key, "A", "varpmi"), Some(&Cell::Missing));
    }

    #[test]
    fn test_serializes_rows_as_objects() {
        let tables = named(vec![("A", relation_table(&[("obj", 3, 0.5)]))]);
        let merged = merge(&tables, &["relation", "n", "medlen", "meanlen"]).unwrap();
        let json = serde_json::to_string(&merged).unwrap();
        assert_eq!(
            json,
            r#"[{"relation":"obj","n":3,"medlen":3.0,"meanlen":3.2,"model":"A","pct_acc":0.5}]"#
        );
    }
}
