//! Aligned text table display
//!
//! The first column is left-aligned, all other columns are right-aligned.
//! Real-valued cells are printed with four decimals and missing cells as `NA`.

use pmiacc_analysis::{
    merge::{ComparisonTable, WideTable},
    table::{Cell, StatTable},
};

const REAL_PRECISION: usize = 4;

pub(super) fn format_cell(cell: &Cell) -> String {
    format!("{cell:.REAL_PRECISION$}")
}

fn column_widths<H>(header: &[H], rows: &[Vec<String>]) -> Vec<usize>
where
    H: AsRef<str>,
{
    let mut widths = header.iter().map(|h| h.as_ref().len()).collect::<Vec<_>>();
    for row in rows {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.chars().count());
        }
    }
    widths
}

fn format_line<S>(values: &[S], widths: &[usize]) -> String
where
    S: AsRef<str>,
{
    values
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (value, &width))| {
            let value = value.as_ref();
            if i == 0 {
                format!("{value:<width$}")
            } else {
                format!("{value:>width$}")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Print a formatted table
///
/// # Arguments
/// * `header` - Column names
/// * `rows` - Formatted cells, one vector per row
pub(super) fn print_table<H>(header: &[H], rows: &[Vec<String>])
where
    H: AsRef<str>,
{
    let widths = column_widths(header, rows);
    let total_width = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);

    println!("  {}", format_line(header, &widths));
    println!("  {}", "-".repeat(total_width));
    for row in rows {
        println!("  {}", format_line(row, &widths));
    }
}

pub(super) fn print_stat_table(table: &StatTable) {
    let rows = table
        .rows()
        .iter()
        .map(|cells| cells.iter().map(format_cell).collect())
        .collect::<Vec<_>>();
    print_table(table.columns(), &rows);
}

pub(super) fn print_wide_table(table: &WideTable) {
    let rows = table
        .rows()
        .iter()
        .map(|cells| cells.iter().map(format_cell).collect())
        .collect::<Vec<_>>();
    print_table(table.columns(), &rows);
}

pub(super) fn print_comparison_table(table: &ComparisonTable) {
    let rows = table
        .rows()
        .iter()
        .map(|row| table.row_cells(row).iter().map(format_cell).collect())
        .collect::<Vec<_>>();
    print_table(&table.columns(), &rows);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(&Cell::Real(0.123_456)), "0.1235");
        assert_eq!(format_cell(&Cell::Integer(12)), "12");
        assert_eq!(format_cell(&Cell::Missing), "NA");
    }

    #[test]
    fn test_format_line_alignment() {
        let header = ["relation", "n"];
        let rows = vec![vec!["nsubj".to_owned(), "1200".to_owned()]];
        let widths = column_widths(&header, &rows);
        assert_eq!(widths, [8, 4]);
        assert_eq!(format_line(&header, &widths), "relation    n");
        assert_eq!(format_line(&rows[0], &widths), "nsubj    1200");
    }
}
