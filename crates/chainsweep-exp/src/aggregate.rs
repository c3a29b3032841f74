use std::fs;
use std::path::Path;

use chainsweep_core::{ErrorInfo, RawResult, SweepError};
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};

use crate::sweep::SweepOutcomes;

/// One successfully loaded parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepRow {
    pub n: u32,
    pub chain_length: u64,
    pub non_unique_choices: u64,
}

impl SweepRow {
    pub fn from_raw(n: u32, raw: &RawResult) -> Self {
        Self {
            n,
            chain_length: raw.chain_data.length_chain,
            non_unique_choices: raw.chain_data.length_non_unique,
        }
    }
}

/// Row of the summary table with its derived ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub n: u32,
    pub chain_length: u64,
    pub non_unique_choices: u64,
    /// `non_unique_choices / chain_length`; NaN when the chain is empty.
    pub ratio: f64,
}

/// Non-unique choices per chain element. NaN for an empty chain.
pub fn choice_ratio(non_unique_choices: u64, chain_length: u64) -> f64 {
    if chain_length == 0 {
        f64::NAN
    } else {
        non_unique_choices as f64 / chain_length as f64
    }
}

const BASE_COLUMNS: [&str; 3] = ["n", "chain_length", "non_unique_choices"];

/// Ordered rows of a finished sweep.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SummaryTable {
    rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Sorts rows by `n` and derives the ratio column.
    ///
    /// Rows arrive in whatever order tasks completed; sorting here is the
    /// single point where order is imposed.
    pub fn from_rows(mut rows: Vec<SweepRow>) -> Self {
        rows.sort_by_key(|row| row.n);
        rows.dedup_by_key(|row| row.n);
        let rows = rows
            .into_iter()
            .map(|row| SummaryRow {
                n: row.n,
                chain_length: row.chain_length,
                non_unique_choices: row.non_unique_choices,
                ratio: choice_ratio(row.non_unique_choices, row.chain_length),
            })
            .collect();
        Self { rows }
    }

    /// Keeps loaded outcomes only; skipped parameters produce no row.
    pub fn from_outcomes(outcomes: &SweepOutcomes) -> Self {
        let rows = outcomes
            .iter()
            .filter_map(|(n, outcome)| outcome.loaded().map(|raw| SweepRow::from_raw(n, raw)))
            .collect();
        Self::from_rows(rows)
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names as written by [`SummaryTable::write_csv`].
    pub fn columns(persist_ratio: bool) -> Vec<&'static str> {
        let mut columns = BASE_COLUMNS.to_vec();
        if persist_ratio {
            columns.push("ratio");
        }
        columns
    }

    /// Writes the table, overwriting any previous file. The header is always written.
    pub fn write_csv(&self, path: &Path, persist_ratio: bool) -> Result<(), SweepError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                SweepError::Persist(
                    ErrorInfo::new("table-create", "failed to create table directory")
                        .with_context("path", parent.display().to_string())
                        .with_hint(err.to_string()),
                )
            })?;
        }
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(|err| wrap_csv("table-open", path, err))?;
        writer
            .write_record(Self::columns(persist_ratio))
            .map_err(|err| wrap_csv("table-write", path, err))?;
        for row in &self.rows {
            let mut record = vec![
                row.n.to_string(),
                row.chain_length.to_string(),
                row.non_unique_choices.to_string(),
            ];
            if persist_ratio {
                record.push(row.ratio.to_string());
            }
            writer
                .write_record(&record)
                .map_err(|err| wrap_csv("table-write", path, err))?;
        }
        writer.flush().map_err(|err| {
            SweepError::Persist(
                ErrorInfo::new("table-flush", "failed to flush table")
                    .with_context("path", path.display().to_string())
                    .with_hint(err.to_string()),
            )
        })
    }
}

fn wrap_csv(code: &str, path: &Path, err: csv::Error) -> SweepError {
    SweepError::Persist(
        ErrorInfo::new(code, "failed to write summary table")
            .with_context("path", path.display().to_string())
            .with_hint(err.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_of_empty_chain_is_nan() {
        assert!(choice_ratio(3, 0).is_nan());
        assert!(choice_ratio(0, 0).is_nan());
        assert_eq!(choice_ratio(4, 10), 0.4);
    }

    #[test]
    fn columns_follow_ratio_flag() {
        assert_eq!(
            SummaryTable::columns(false),
            vec!["n", "chain_length", "non_unique_choices"]
        );
        assert_eq!(SummaryTable::columns(true).last(), Some(&"ratio"));
    }
}
