use std::path::{Path, PathBuf};

use super::model::RawMatrix;

// ---------------------------------------------------------------------------
// FormatError – file cannot be read as a two-column numeric table
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("cannot open {path}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("{path}: line {line} has {got} columns, expected 2")]
    ColumnCount { path: PathBuf, line: u64, got: usize },

    #[error("{path}: line {line}, column {column}: '{raw}' is not a finite number")]
    NotNumeric {
        path: PathBuf,
        /// 1-based line in the file, counting skipped blank lines.
        line: u64,
        column: usize,
        raw: String,
    },

    #[error("{path} contains no data rows")]
    Empty { path: PathBuf },
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a headerless, comma-delimited two-column numeric file.
///
/// Blank lines are skipped and cells are trimmed. A file with exactly one
/// data row is padded to two rows (see [`RawMatrix::from_rows`]).
pub fn load_matrix(path: &Path) -> Result<RawMatrix, FormatError> {
    let file = std::fs::File::open(path).map_err(|source| FormatError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_matrix(file, path)
}

/// Parse a matrix from any reader. `origin` is only used in error messages.
pub fn read_matrix<R: std::io::Read>(reader: R, origin: &Path) -> Result<RawMatrix, FormatError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result.map_err(|source| FormatError::Csv {
            path: origin.to_path_buf(),
            source,
        })?;
        let line = record.position().map_or(0, |p| p.line());

        if record.len() != 2 {
            return Err(FormatError::ColumnCount {
                path: origin.to_path_buf(),
                line,
                got: record.len(),
            });
        }

        let mut parsed = [0.0; 2];
        for (column, raw) in record.iter().enumerate() {
            parsed[column] = parse_cell(raw).ok_or_else(|| FormatError::NotNumeric {
                path: origin.to_path_buf(),
                line,
                column,
                raw: raw.to_string(),
            })?;
        }
        rows.push(parsed);
    }

    if rows.is_empty() {
        return Err(FormatError::Empty {
            path: origin.to_path_buf(),
        });
    }

    log::debug!("{}: parsed {} rows", origin.display(), rows.len());
    Ok(RawMatrix::from_rows(rows))
}

fn parse_cell(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}
