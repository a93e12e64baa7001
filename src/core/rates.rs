use crate::domain::model::{RateKey, RateRow};
use crate::domain::settings::DuplicateRatePolicy;
use crate::utils::error::{QuoteError, Result};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Hours-per-unit table indexed by rate key.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rows: Vec<RateRow>,
    index: HashMap<RateKey, usize>,
}

impl RateTable {
    pub fn from_path<P: AsRef<Path>>(path: P, policy: DuplicateRatePolicy) -> Result<Self> {
        let file = std::fs::File::open(&path)?;
        tracing::debug!("Reading rate table from {}", path.as_ref().display());
        Self::from_reader(file, policy)
    }

    /// Parses CSV with a header row. Columns may come in any order and extra
    /// columns are ignored.
    pub fn from_reader<R: Read>(reader: R, policy: DuplicateRatePolicy) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();

        let mut table = Self::default();
        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let row: RateRow = record.deserialize(Some(&headers))?;
            table.insert(row, line, policy)?;
        }

        tracing::debug!("Rate table holds {} keys", table.index.len());
        Ok(table)
    }

    pub fn from_rows(rows: Vec<RateRow>, policy: DuplicateRatePolicy) -> Result<Self> {
        let mut table = Self::default();
        for (i, row) in rows.into_iter().enumerate() {
            // header is line 1
            table.insert(row, i as u64 + 2, policy)?;
        }
        Ok(table)
    }

    fn insert(&mut self, row: RateRow, line: u64, policy: DuplicateRatePolicy) -> Result<()> {
        let key = row.key();
        if self.index.contains_key(&key) {
            match policy {
                DuplicateRatePolicy::Reject => {
                    return Err(QuoteError::DuplicateRateKey {
                        key: key.to_string(),
                        line,
                    })
                }
                DuplicateRatePolicy::FirstWins => {
                    tracing::warn!(
                        "⚠️ Duplicate rate row for {} on line {}; keeping the first one",
                        key,
                        line
                    );
                }
            }
        } else {
            self.index.insert(key, self.rows.len());
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn lookup(&self, key: &RateKey) -> Option<&RateRow> {
        self.index.get(key).map(|&i| &self.rows[i])
    }

    /// Every parsed row, duplicates included, in file order.
    pub fn rows(&self) -> &[RateRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
