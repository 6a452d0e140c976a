//! Column-oriented view of typed statistic rows
//!
//! Aggregators produce strongly typed rows ([`RelationStat`],
//! [`LengthStat`]). The model merger works on any same-shaped table, so rows
//! are lowered into a [`StatTable`]: a list of named columns and rows of
//! [`Cell`]s. The column list of each row type is declared statically through
//! [`StatColumns`].
//!
//! [`RelationStat`]: crate::relation::RelationStat
//! [`LengthStat`]: crate::length::LengthStat

use std::{cmp::Ordering, collections::BTreeSet, fmt};

use serde::Serialize;

/// One value of a statistic table.
///
/// Cells are totally ordered so that tuples of cells can key a join:
/// variants compare by declaration order first, reals use
/// [`f64::total_cmp`], and two missing cells are equal.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Missing,
    /// Non-negative integer (counts, distances)
    Integer(u64),
    Real(f64),
    Text(String),
}

impl Cell {
    fn rank(&self) -> u8 {
        match self {
            Cell::Missing => 0,
            Cell::Integer(_) => 1,
            Cell::Real(_) => 2,
            Cell::Text(_) => 3,
        }
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::Integer(value as u64)
    }
}

impl From<u32> for Cell {
    fn from(value: u32) -> Self {
        Cell::Integer(u64::from(value))
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Real(value)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Cell::Missing, Cell::Real)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_owned())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Cell {}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Cell::Integer(a), Cell::Integer(b)) => a.cmp(b),
            (Cell::Real(a), Cell::Real(b)) => a.total_cmp(b),
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Formats `NA` for missing cells; honors the precision flag for reals.
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => f.write_str("NA"),
            Cell::Integer(v) => write!(f, "{v}"),
            Cell::Real(v) => match f.precision() {
                Some(p) => write!(f, "{v:.p$}"),
                None => write!(f, "{v}"),
            },
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// Statically declared column layout of a statistic row type.
pub trait StatColumns {
    /// Column names, in output order.
    const COLUMNS: &'static [&'static str];

    /// Cells of this row, one per entry of [`Self::COLUMNS`].
    fn cells(&self) -> Vec<Cell>;
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum TableError {
    #[display("duplicate column '{column}'")]
    DuplicateColumn { column: String },
    #[display("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Named columns with rows of cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl StatTable {
    /// Builds a table, checking that column names are unique and every row
    /// has one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, TableError> {
        let mut seen = BTreeSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(TableError::DuplicateColumn {
                    column: column.clone(),
                });
            }
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TableError::RaggedRow {
                    row: i,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Lowers typed rows into a table with the row type's declared columns.
    ///
    /// ```
    /// use pmiacc_analysis::{
    ///     length::LengthStat,
    ///     table::{Cell, StatTable},
    /// };
    ///
    /// let row = LengthStat {
    ///     lin_dist: 1,
    ///     n: 4,
    ///     meanpmi: 0.5,
    ///     varpmi: None,
    ///     n_pmi_true: 3,
    ///     n_pmi_false: 1,
    ///     pct_acc: 0.75,
    /// };
    /// let table = StatTable::from_rows(&[row]);
    /// assert_eq!(table.get(0, "varpmi"), Some(&Cell::Missing));
    /// assert_eq!(table.get(0, "n_pmiTRUE"), Some(&Cell::Integer(3)));
    /// ```
    #[must_use]
    pub fn from_rows<T>(rows: &[T]) -> Self
    where
        T: StatColumns,
    {
        Self {
            columns: T::COLUMNS.iter().map(|&c| c.to_owned()).collect(),
            rows: rows.iter().map(StatColumns::cells).collect(),
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
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
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|cells| &cells[index])
    }
}
