use palette::Srgb;

use super::RenderError;
use crate::color::line_color;
use crate::data::model::Series;

/// Caller-supplied decoration for one plot.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSpec {
    /// Used verbatim for the title and the file stem when present.
    pub title: Option<String>,
    pub x_label: String,
    pub y_label: String,
    /// Visible x-range; the data itself is never trimmed.
    pub x_limits: Option<(f64, f64)>,
}

impl PlotSpec {
    pub fn new(x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        PlotSpec {
            title: None,
            x_label: x_label.into(),
            y_label: y_label.into(),
            x_limits: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_x_limits(mut self, limits: Option<(f64, f64)>) -> Self {
        self.x_limits = limits;
        self
    }
}

/// One drawn line.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub name: String,
    pub color: Srgb<u8>,
    pub points: Vec<[f64; 2]>,
}

/// Everything needed to draw a plot, independent of the output backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: String,
    /// Output file name without extension.
    pub stem: String,
    pub x_label: String,
    pub y_label: String,
    pub x_limits: Option<(f64, f64)>,
    pub traces: Vec<Trace>,
}

impl Figure {
    /// Lay out `series` on shared axes.
    ///
    /// Colours follow list position (wrapping past the palette end).
    pub fn compose(series: &[&Series], spec: &PlotSpec) -> Result<Figure, RenderError> {
        if series.is_empty() {
            return Err(RenderError::NoSeries);
        }
        if let Some((lo, hi)) = spec.x_limits {
            if !(lo.is_finite() && hi.is_finite() && lo < hi) {
                return Err(RenderError::InvalidLimits { lo, hi });
            }
        }

        let names: Vec<&str> = series.iter().map(|s| s.name()).collect();
        let (title, stem) = derive_names(&names, spec.title.as_deref());

        let traces = series
            .iter()
            .enumerate()
            .map(|(i, s)| Trace {
                name: s.name().to_string(),
                color: line_color(i),
                points: s.points().map(|(x, y)| [x, y]).collect(),
            })
            .collect();

        Ok(Figure {
            title,
            stem,
            x_label: spec.x_label.clone(),
            y_label: spec.y_label.clone(),
            x_limits: spec.x_limits,
            traces,
        })
    }

    /// A legend is only drawn for overlays.
    pub fn show_legend(&self) -> bool {
        self.traces.len() > 1
    }

    /// Legend entries in list order; empty for a single trace.
    pub fn legend(&self) -> Vec<(&str, Srgb<u8>)> {
        if !self.show_legend() {
            return Vec::new();
        }
        self.traces
            .iter()
            .map(|t| (t.name.as_str(), t.color))
            .collect()
    }

    /// Visible x-range: the explicit limits, else the data extent.
    pub fn x_range(&self) -> (f64, f64) {
        if let Some(limits) = self.x_limits {
            return limits;
        }
        let xs = self.traces.iter().flat_map(|t| t.points.iter().map(|p| p[0]));
        padded_extent(xs, 0.0)
    }

    /// y-range of the samples inside the visible x-range, padded by 5%.
    pub fn y_range(&self) -> (f64, f64) {
        let (lo, hi) = self.x_range();
        let ys = self
            .traces
            .iter()
            .flat_map(|t| t.points.iter())
            .filter(|p| p[0] >= lo && p[0] <= hi)
            .map(|p| p[1]);
        padded_extent(ys, 0.05)
    }
}

/// Title and file stem for a list of series names.
///
/// An explicit title is used for both (path separators in the stem become
/// `_`). One series uses its own name; several are joined with `" vs. "` for
/// the title and `"_vs_"` for the stem. A blank title counts as none.
pub fn derive_names(names: &[&str], title: Option<&str>) -> (String, String) {
    match (title.filter(|t| !t.trim().is_empty()), names) {
        (Some(t), _) => (t.to_string(), t.replace(['/', '\\'], "_")),
        (None, [only]) => (only.to_string(), only.to_string()),
        (None, many) => (many.join(" vs. "), many.join("_vs_")),
    }
}

fn padded_extent(values: impl Iterator<Item = f64>, pad: f64) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return (-1.0, 1.0);
    }
    let span = hi - lo;
    if span == 0.0 {
        return (lo - 0.5, hi + 0.5);
    }
    (lo - span * pad, hi + span * pad)
}
