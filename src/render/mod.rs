/// Plot rendering: figure composition, PDF output, interactive display.
///
/// ```text
///   &[&Series] + PlotSpec
///        │
///        ▼
///   ┌──────────┐
///   │  figure   │  title / stem / legend / colours / visible range
///   └──────────┘
///        │
///        ├──────────────► viewer window (interactive mode only)
///        ▼
///   ┌──────────┐
///   │   pdf     │  <save_folder>/<stem>.pdf
///   └──────────┘
/// ```
pub mod figure;
pub mod pdf;

use std::path::{Path, PathBuf};

use crate::data::model::Series;
use figure::{Figure, PlotSpec};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("nothing to plot: empty series list")]
    NoSeries,

    #[error("invalid x-axis limits ({lo}, {hi})")]
    InvalidLimits { lo: f64, hi: f64 },

    #[error("cannot write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("PDF output to {path} failed: {message}")]
    Pdf { path: PathBuf, message: String },

    #[error("viewer window failed: {0}")]
    Display(String),
}

/// Draws series and persists each plot as a PDF.
#[derive(Debug, Clone)]
pub struct Renderer {
    save_folder: PathBuf,
    interactive: bool,
}

impl Renderer {
    pub fn new(save_folder: impl Into<PathBuf>, interactive: bool) -> Self {
        Renderer {
            save_folder: save_folder.into(),
            interactive,
        }
    }

    pub fn save_folder(&self) -> &Path {
        &self.save_folder
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Render one series on its own.
    pub fn render_one(&self, series: &Series, spec: &PlotSpec) -> Result<PathBuf, RenderError> {
        self.render(&[series], spec)
    }

    /// Render `series` on shared axes and return the written PDF path.
    ///
    /// In interactive mode the figure is shown in a window first; closing the
    /// window continues to the PDF. A window that cannot be opened is logged
    /// and does not prevent the file from being written.
    pub fn render(&self, series: &[&Series], spec: &PlotSpec) -> Result<PathBuf, RenderError> {
        let figure = Figure::compose(series, spec)?;
        log::debug!(
            "Rendering '{}' ({} traces)",
            figure.title,
            figure.traces.len()
        );

        if self.interactive {
            if let Err(e) = crate::app::show(&figure) {
                log::warn!("Could not display '{}': {e}", figure.title);
            }
        }

        let path = self.save_folder.join(format!("{}.pdf", figure.stem));
        pdf::write_pdf(&figure, &path)?;
        drop(figure);

        log::info!("Saved plot {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn series(name: &str) -> Series {
        Series::new(name, vec![0.0, 0.5, 1.0], vec![3.0, 4.0, 2.0]).unwrap()
    }

    #[test]
    fn single_series_path_uses_name() {
        let dir = tempdir().unwrap();
        let r = Renderer::new(dir.path(), false);
        let path = r
            .render_one(&series("Thrust"), &PlotSpec::new("Time (s)", "Thrust (lbf)"))
            .unwrap();
        assert!(path.ends_with("Thrust.pdf"));
        assert!(path.exists());
    }

    #[test]
    fn overlay_path_joins_names() {
        let dir = tempdir().unwrap();
        let r = Renderer::new(dir.path(), false);
        let (a, b) = (series("A"), series("B"));
        let path = r.render(&[&a, &b], &PlotSpec::new("t", "v")).unwrap();
        assert_eq!(path, dir.path().join("A_vs_B.pdf"));
        assert!(path.exists());
    }

    #[test]
    fn more_series_than_colours_still_renders() {
        let dir = tempdir().unwrap();
        let r = Renderer::new(dir.path(), false);
        let all: Vec<Series> = (0..10).map(|i| series(&format!("S{i}"))).collect();
        let refs: Vec<&Series> = all.iter().collect();
        let path = r
            .render(&refs, &PlotSpec::new("t", "v").with_title("ten"))
            .unwrap();
        assert!(path.ends_with("ten.pdf"));
    }

    #[test]
    fn repeated_renders_do_not_share_state() {
        let dir = tempdir().unwrap();
        let r = Renderer::new(dir.path(), false);
        let (a, b) = (series("A"), series("B"));
        r.render(&[&a, &b], &PlotSpec::new("t", "v")).unwrap();
        let single = r.render_one(&a, &PlotSpec::new("t", "v")).unwrap();
        assert!(single.ends_with("A.pdf"));
    }

    #[test]
    fn unwritable_folder_is_an_error() {
        let dir = tempdir().unwrap();
        let r = Renderer::new(dir.path().join("nope"), false);
        let err = r
            .render_one(&series("Thrust"), &PlotSpec::new("t", "v"))
            .unwrap_err();
        assert!(matches!(err, RenderError::Write { .. }));
    }
}
