use std::collections::BTreeMap;

use itertools::Itertools;

use crate::keys::{Epsilon, RunKey};

/// Immutable row/column view of the nested run data: rows on an ascending
/// integer axis (`d` or `depth`), columns labeled by ε in descending order.
/// A missing `(row, ε)` combination stays an explicit `None`, never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    row_axis: &'static str,
    rows: Vec<u32>,
    cols: Vec<Epsilon>,
    cells: Vec<Option<f64>>, // row-major
}

impl Table {
    /// Reshapes `(d, ε) → value` into a table with `d` rows.
    pub fn from_runs<I>(row_axis: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = (RunKey, f64)>,
    {
        let entries = values
            .into_iter()
            .map(|(key, value)| (key.d, key.eps, value))
            .collect();
        Self::build(row_axis, entries)
    }

    fn build(row_axis: &'static str, entries: Vec<(u32, Epsilon, f64)>) -> Self {
        let rows: Vec<u32> = entries.iter().map(|&(r, _, _)| r).sorted().dedup().collect();
        let cols: Vec<Epsilon> = entries
            .iter()
            .map(|&(_, c, _)| c)
            .sorted_by(|a, b| b.cmp(a))
            .dedup()
            .collect();

        let mut cells = vec![None; rows.len() * cols.len()];
        for (row, col, value) in entries {
            let ri = rows.iter().position(|&r| r == row).expect("row from entries");
            let ci = cols.iter().position(|&c| c == col).expect("col from entries");
            cells[ri * cols.len() + ci] = Some(value);
        }

        Table {
            row_axis,
            rows,
            cols,
            cells,
        }
    }

    pub fn row_axis(&self) -> &'static str {
        self.row_axis
    }

    /// Row labels, ascending.
    pub fn rows(&self) -> &[u32] {
        &self.rows
    }

    /// Column labels, descending ε.
    pub fn cols(&self) -> &[Epsilon] {
        &self.cols
    }

    /// Cell lookup; `None` both for unknown labels and for missing data.
    pub fn get(&self, row: u32, col: Epsilon) -> Option<f64> {
        let ri = self.rows.iter().position(|&r| r == row)?;
        let ci = self.cols.iter().position(|&c| c == col)?;
        self.cells[ri * self.cols.len() + ci]
    }

    pub fn has_row(&self, row: u32) -> bool {
        self.rows.contains(&row)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reshapes `(d, ε) → depth → value` into one table per `d`, with `depth`
/// rows and ε columns.
pub fn depth_tables(values: &BTreeMap<RunKey, BTreeMap<u32, u64>>) -> BTreeMap<u32, Table> {
    let mut grouped: BTreeMap<u32, Vec<(u32, Epsilon, f64)>> = BTreeMap::new();
    for (key, hist) in values {
        let entries = grouped.entry(key.d).or_default();
        for (&depth, &count) in hist {
            entries.push((depth, key.eps, count as f64));
        }
    }
    grouped
        .into_iter()
        .map(|(d, entries)| (d, Table::build("depth", entries)))
        .collect()
}
