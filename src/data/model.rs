use std::fmt;

// ---------------------------------------------------------------------------
// SeriesError – shape and alignment violations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeriesError {
    /// `x` and `y` must have the same number of samples.
    #[error("series '{name}': x has {x_len} values but y has {y_len}")]
    LengthMismatch {
        name: String,
        x_len: usize,
        y_len: usize,
    },

    /// Alignment may only be applied once per series.
    #[error("series '{name}' is already aligned to t0 = {t0}")]
    AlreadyAligned { name: String, t0: f64 },
}

// ---------------------------------------------------------------------------
// RawMatrix – two-column numeric table produced by ingestion
// ---------------------------------------------------------------------------

/// A numeric table with exactly two columns.
///
/// Loaders guarantee at least two rows; a single parsed row is padded with a
/// leading `(0, 0)` row by [`RawMatrix::from_rows`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawMatrix {
    rows: Vec<[f64; 2]>,
}

impl RawMatrix {
    /// Build a matrix from parsed rows, padding the single-row case.
    pub fn from_rows(mut rows: Vec<[f64; 2]>) -> Self {
        if rows.len() == 1 {
            rows.insert(0, [0.0, 0.0]);
        }
        RawMatrix { rows }
    }

    pub fn rows(&self) -> &[[f64; 2]] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Copy out one column (0 = independent axis, 1 = dependent axis).
    pub fn column(&self, index: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[index]).collect()
    }
}

// ---------------------------------------------------------------------------
// Series – one named recording
// ---------------------------------------------------------------------------

/// A named telemetry recording: time axis `x` and measured value `y`.
///
/// The fields are private so the `x.len() == y.len()` invariant cannot be
/// broken after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    name: String,
    x: Vec<f64>,
    y: Vec<f64>,
    /// `Some(t0)` once the time axis has been shifted.
    aligned_to: Option<f64>,
}

impl Series {
    /// Create an unaligned series.
    pub fn new(name: impl Into<String>, x: Vec<f64>, y: Vec<f64>) -> Result<Self, SeriesError> {
        let name = name.into();
        if x.len() != y.len() {
            return Err(SeriesError::LengthMismatch {
                name,
                x_len: x.len(),
                y_len: y.len(),
            });
        }
        Ok(Series {
            name,
            x,
            y,
            aligned_to: None,
        })
    }

    /// Build a series from an ingested matrix and shift it by `t0`.
    pub fn from_matrix(name: impl Into<String>, matrix: &RawMatrix, t0: f64) -> Self {
        let mut series = Series {
            name: name.into(),
            x: matrix.column(0),
            y: matrix.column(1),
            aligned_to: None,
        };
        series.shift(t0);
        series
    }

    /// Subtract `t0` from every sample of the time axis.
    ///
    /// Fails without touching the data if the series was already aligned.
    pub fn align(&mut self, t0: f64) -> Result<(), SeriesError> {
        if let Some(previous) = self.aligned_to {
            return Err(SeriesError::AlreadyAligned {
                name: self.name.clone(),
                t0: previous,
            });
        }
        self.shift(t0);
        Ok(())
    }

    fn shift(&mut self, t0: f64) {
        for xi in &mut self.x {
            *xi -= t0;
        }
        self.aligned_to = Some(t0);
    }

    /// Derive a new series that shares this one's time axis alignment.
    ///
    /// Used for filter outputs; `x` and `y` are checked like [`Series::new`].
    pub fn derive(
        &self,
        name: impl Into<String>,
        x: Vec<f64>,
        y: Vec<f64>,
    ) -> Result<Self, SeriesError> {
        let mut derived = Series::new(name, x, y)?;
        derived.aligned_to = self.aligned_to;
        Ok(derived)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Offset already applied to `x` (0 when never aligned).
    pub fn t0(&self) -> f64 {
        self.aligned_to.unwrap_or(0.0)
    }

    pub fn is_aligned(&self) -> bool {
        self.aligned_to.is_some()
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether the series has no samples.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Iterate over `(x, y)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} samples, t0 = {})", self.name, self.len(), self.t0())
    }
}
