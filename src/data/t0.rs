use std::path::{Path, PathBuf};

use super::loader::{load_matrix, FormatError};
use super::model::RawMatrix;

/// Default reserved file name that carries T0 data instead of telemetry.
pub const DEFAULT_MARKER_NAME: &str = "t0.csv";

// ---------------------------------------------------------------------------
// Marker table
// ---------------------------------------------------------------------------

/// `(time, flag)` rows read from the marker file, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerTable {
    rows: Vec<(f64, f64)>,
}

impl MarkerTable {
    pub fn from_matrix(matrix: &RawMatrix) -> Self {
        MarkerTable {
            rows: matrix.rows().iter().map(|r| (r[0], r[1])).collect(),
        }
    }

    pub fn rows(&self) -> &[(f64, f64)] {
        &self.rows
    }

    /// Time of the first row whose flag is strictly positive.
    pub fn first_positive(&self) -> Option<f64> {
        self.rows
            .iter()
            .find(|(_, flag)| *flag > 0.0)
            .map(|(time, _)| *time)
    }
}

/// Load and parse a marker file.
pub fn load_marker(path: &Path) -> Result<MarkerTable, FormatError> {
    load_matrix(path).map(|m| MarkerTable::from_matrix(&m))
}

// ---------------------------------------------------------------------------
// Discovery split
// ---------------------------------------------------------------------------

/// Data files separated from the reserved marker file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partitioned {
    pub data_files: Vec<PathBuf>,
    pub marker: Option<PathBuf>,
}

/// Split `paths` into plotted data files and the marker file.
///
/// Matching is on the file name only, ignoring ASCII case. Only the first
/// marker is kept; any further markers are dropped from both lists.
pub fn partition_marker(paths: &[PathBuf], marker_name: &str) -> Partitioned {
    let mut out = Partitioned::default();
    for path in paths {
        if !is_marker(path, marker_name) {
            out.data_files.push(path.clone());
            continue;
        }
        match &out.marker {
            None => out.marker = Some(path.clone()),
            Some(kept) => log::warn!(
                "Ignoring extra T0 marker {} (using {})",
                path.display(),
                kept.display()
            ),
        }
    }
    out
}

fn is_marker(path: &Path, marker_name: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.eq_ignore_ascii_case(marker_name))
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Determine the batch alignment offset.
///
/// An explicit `override_t0` wins and the marker table is not consulted.
/// Otherwise the first positive-flag row of the marker decides; with no such
/// row (or no marker) the offset is 0.
pub fn resolve_t0(override_t0: Option<f64>, marker: Option<&MarkerTable>) -> f64 {
    if let Some(t0) = override_t0 {
        return t0;
    }
    marker.and_then(MarkerTable::first_positive).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[(f64, f64)]) -> MarkerTable {
        MarkerTable {
            rows: rows.to_vec(),
        }
    }

    #[test]
    fn first_positive_flag_wins() {
        let marker = table(&[(10.0, 0.0), (25.0, 1.0), (40.0, 1.0)]);
        assert_eq!(resolve_t0(None, Some(&marker)), 25.0);
    }

    #[test]
    fn negative_and_zero_flags_are_not_positive() {
        let marker = table(&[(1.0, -1.0), (2.0, 0.0), (3.0, 0.5)]);
        assert_eq!(resolve_t0(None, Some(&marker)), 3.0);
    }

    #[test]
    fn no_positive_flag_keeps_zero() {
        let marker = table(&[(10.0, 0.0), (20.0, 0.0)]);
        assert_eq!(resolve_t0(None, Some(&marker)), 0.0);
        assert_eq!(resolve_t0(None, None), 0.0);
    }

    #[test]
    fn override_ignores_marker() {
        let marker = table(&[(25.0, 1.0)]);
        assert_eq!(resolve_t0(Some(3.5), Some(&marker)), 3.5);
        assert_eq!(resolve_t0(Some(0.0), Some(&marker)), 0.0);
    }

    #[test]
    fn padded_single_row_marker_still_resolves() {
        let m = RawMatrix::from_rows(vec![[12.0, 1.0]]);
        let marker = MarkerTable::from_matrix(&m);
        assert_eq!(marker.rows().len(), 2);
        assert_eq!(resolve_t0(None, Some(&marker)), 12.0);
    }

    #[test]
    fn marker_is_split_out_case_insensitively() {
        let paths = vec![
            PathBuf::from("/run/Thrust.csv"),
            PathBuf::from("/run/T0.CSV"),
            PathBuf::from("/run/Chamber.csv"),
            PathBuf::from("/run/sub/t0.csv"),
        ];
        let p = partition_marker(&paths, DEFAULT_MARKER_NAME);
        assert_eq!(
            p.data_files,
            vec![PathBuf::from("/run/Thrust.csv"), PathBuf::from("/run/Chamber.csv")]
        );
        assert_eq!(p.marker, Some(PathBuf::from("/run/T0.CSV")));
    }

    #[test]
    fn marker_name_must_match_whole_file_name() {
        let paths = vec![PathBuf::from("/run/not_t0.csv")];
        let p = partition_marker(&paths, DEFAULT_MARKER_NAME);
        assert_eq!(p.data_files.len(), 1);
        assert!(p.marker.is_none());
    }
}
