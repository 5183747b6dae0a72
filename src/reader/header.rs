use crate::error::{CustomError, Result};

/// CHROM through FORMAT; sample columns follow.
pub const FIXED_COLUMNS: usize = 9;

#[derive(Debug, Clone)]
pub struct Header {
    columns: Vec<String>,
}

impl Header {
    /// Parse the `#CHROM` line (without its terminator).
    pub fn parse(line: &str) -> Result<Self> {
        let columns: Vec<String> = line
            .split('\t')
            .enumerate()
            .map(|(idx, name)| {
                if idx < FIXED_COLUMNS {
                    name.to_string()
                } else {
                    normalize_sample_name(name)
                }
            })
            .collect();
        if columns.len() < FIXED_COLUMNS {
            return Err(CustomError::HeaderColumns {
                n_columns: columns.len(),
                expected: FIXED_COLUMNS,
            });
        }
        if columns.len() == FIXED_COLUMNS {
            tracing::info!("header has no sample columns; sample statistics will be empty");
        }
        Ok(Self { columns })
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn samples(&self) -> &[String] {
        &self.columns[FIXED_COLUMNS..]
    }

    pub fn n_samples(&self) -> usize {
        self.columns.len() - FIXED_COLUMNS
    }
}

/// Downstream tooling treats `.` as a separator, so sample names use `_`.
pub fn normalize_sample_name(name: &str) -> String {
    name.replace('.', "_")
}
