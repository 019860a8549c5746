//! Tabular input for a model fit.

use crate::error::{MarginalError, Result};
use std::collections::BTreeMap;

/// Named numeric columns of equal length, one row per observation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: BTreeMap<String, Vec<f64>>,
    rows: usize,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Returns `InvalidInput` if the column length differs from the existing columns or
    /// the name is already taken.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if self.columns.contains_key(&name) {
            return Err(MarginalError::invalid(format!("duplicate column `{name}`")));
        }
        if !self.columns.is_empty() && values.len() != self.rows {
            return Err(MarginalError::invalid(format!(
                "column `{name}` has {} rows, expected {}",
                values.len(),
                self.rows
            )));
        }
        self.rows = values.len();
        self.columns.insert(name, values);
        Ok(())
    }

    /// Builder form of [`insert_column`](Self::insert_column).
    ///
    /// # Errors
    /// Same conditions as [`insert_column`](Self::insert_column).
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    /// # Errors
    /// Returns `InvalidInput` if the column does not exist.
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| MarginalError::invalid(format!("no column named `{name}`")))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}

/// 1-based time index of each row, assigned by the sort order of `keys`.
///
/// Equal keys keep their row order, so the assignment is deterministic and every row gets a
/// distinct index. ISO-8601 date strings (`"2019-03-01"`) sort chronologically and can be
/// passed directly.
///
/// ```rust
/// use posterior_marginals::time_index;
///
/// let dates = ["2020-01-03", "2020-01-01", "2020-01-02", "2020-01-01"];
/// assert_eq!(time_index(&dates), vec![4, 1, 3, 2]);
/// ```
pub fn time_index<K: Ord>(keys: &[K]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));
    let mut index = vec![0; keys.len()];
    for (rank, row) in order.into_iter().enumerate() {
        index[row] = rank + 1;
    }
    index
}
