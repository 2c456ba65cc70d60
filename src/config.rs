use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::filter::LowPass;
use crate::data::t0::DEFAULT_MARKER_NAME;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file {path}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("trim window must be a positive number of seconds, got {0}")]
    InvalidTrim(f64),

    #[error("T0 override must be finite, got {0}")]
    InvalidT0(f64),

    #[error("marker file name must not be empty")]
    EmptyMarkerName,
}

// ---------------------------------------------------------------------------
// Pipeline configuration
// ---------------------------------------------------------------------------

/// Settings consumed by the batch pipeline.
///
/// Every field has a default, so a config file only needs the keys it wants
/// to change. CLI flags are applied on top of whatever the file provides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Show each plot in a window before saving it.
    pub interactive: bool,

    /// Where PDFs are written.
    pub output_folder: PathBuf,

    /// Explicit T0; when set the marker file is ignored.
    pub t0_override: Option<f64>,

    /// Symmetric x-window `(-trim, trim)` around T0, in seconds.
    pub trim: Option<f64>,

    pub lowpass: Option<LowPass>,

    /// Moving-average window length in samples.
    pub smoothing_interval: Option<usize>,

    /// Reserved file name carrying T0 data (matched case-insensitively).
    pub marker_file_name: String,

    pub x_label: String,
    pub y_label: String,

    /// Extra overlay plots, each a list of series names.
    pub overlays: Vec<Vec<String>>,

    pub upload: Option<UploadConfig>,
}

/// Destination for the upload step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadConfig {
    pub destination: PathBuf,
    /// Folder created under the destination; defaults to the search root name.
    #[serde(default)]
    pub folder_name: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            interactive: false,
            output_folder: PathBuf::from("plots"),
            t0_override: None,
            trim: None,
            lowpass: None,
            smoothing_interval: None,
            marker_file_name: DEFAULT_MARKER_NAME.to_string(),
            x_label: "Time (s)".to_string(),
            y_label: "Value".to_string(),
            overlays: Vec::new(),
            upload: None,
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config file; missing keys fall back to defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check values the pipeline cannot recover from.
    ///
    /// Filter parameters are not checked here: a bad filter only drops the
    /// filtered variant of each plot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(trim) = self.trim {
            if !trim.is_finite() || trim <= 0.0 {
                return Err(ConfigError::InvalidTrim(trim));
            }
        }
        if let Some(t0) = self.t0_override {
            if !t0.is_finite() {
                return Err(ConfigError::InvalidT0(t0));
            }
        }
        if self.marker_file_name.trim().is_empty() {
            return Err(ConfigError::EmptyMarkerName);
        }
        Ok(())
    }

    /// Visible x-window derived from `trim`.
    pub fn x_limits(&self) -> Option<(f64, f64)> {
        self.trim.map(|t| (-t, t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_are_valid() {
        let c = PipelineConfig::default();
        c.validate().unwrap();
        assert_eq!(c.marker_file_name, "t0.csv");
        assert_eq!(c.x_limits(), None);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let mut f = NamedTempFile::new().unwrap();
        write!(
            f,
            r#"{{ "trim": 2.5, "lowpass": {{ "order": 4, "cutoff": 0.1 }}, "overlays": [["Thrust", "Chamber"]] }}"#
        )
        .unwrap();
        let c = PipelineConfig::from_json_file(f.path()).unwrap();
        assert_eq!(c.trim, Some(2.5));
        assert_eq!(c.x_limits(), Some((-2.5, 2.5)));
        assert_eq!(c.lowpass, Some(LowPass { order: 4, cutoff: 0.1 }));
        assert_eq!(c.overlays, vec![vec!["Thrust".to_string(), "Chamber".to_string()]]);
        assert_eq!(c.x_label, "Time (s)");
        assert!(!c.interactive);
    }

    #[test]
    fn bad_json_is_a_parse_error() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "{{ trim: }}").unwrap();
        assert!(matches!(
            PipelineConfig::from_json_file(f.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn non_positive_trim_is_rejected() {
        for trim in [0.0, -1.0, f64::INFINITY] {
            let c = PipelineConfig {
                trim: Some(trim),
                ..Default::default()
            };
            assert!(matches!(c.validate(), Err(ConfigError::InvalidTrim(_))));
        }
    }

    #[test]
    fn blank_marker_name_is_rejected() {
        let c = PipelineConfig {
            marker_file_name: "  ".into(),
            ..Default::default()
        };
        assert!(matches!(c.validate(), Err(ConfigError::EmptyMarkerName)));
    }
}
