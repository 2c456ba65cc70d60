use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::PipelineConfig;
use crate::data::filter::{moving_average, LowPass};
use crate::data::loader::load_matrix;
use crate::data::model::Series;
use crate::data::t0::{load_marker, partition_marker, resolve_t0};
use crate::render::figure::PlotSpec;
use crate::render::Renderer;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Pipeline step at which an item was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Marker,
    Ingest,
    Filter,
    Render,
    Overlay,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Marker => "marker",
            Stage::Ingest => "ingest",
            Stage::Filter => "filter",
            Stage::Render => "render",
            Stage::Overlay => "overlay",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    pub stage: Stage,
    /// File path or series name the failure refers to.
    pub item: String,
    pub message: String,
}

/// Outcome of one batch: every written plot plus everything skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Offset subtracted from every series' time axis.
    pub t0: f64,
    /// PDF paths in the order they were written.
    pub outputs: Vec<PathBuf>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    fn fail(&mut self, stage: Stage, item: impl Into<String>, error: &anyhow::Error) {
        let failure = BatchFailure {
            stage,
            item: item.into(),
            message: format!("{error:#}"),
        };
        log::error!("Skipping {} ({}): {}", failure.item, stage, failure.message);
        self.failures.push(failure);
    }
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

/// Align, filter and plot every data file in `paths`.
///
/// The marker file (if present) is removed from the data set and used to
/// resolve T0 once, before any series is built. Each remaining file gives
/// one plot named after its series: the raw data, overlaid with its filtered
/// variants when filters are configured. Configured overlays are drawn last.
/// A failing item is recorded in the report and the batch moves on.
pub fn run_batch(config: &PipelineConfig, paths: &[PathBuf], renderer: &Renderer) -> BatchReport {
    let mut report = BatchReport::default();
    let split = partition_marker(paths, &config.marker_file_name);

    let t0 = batch_t0(config.t0_override, split.marker.as_deref(), &mut report);
    report.t0 = t0;
    log::info!("Using T0 = {}", report.t0);

    let spec = PlotSpec::new(config.x_label.as_str(), config.y_label.as_str())
        .with_x_limits(config.x_limits());

    let mut loaded: Vec<Series> = Vec::with_capacity(split.data_files.len());

    for path in &split.data_files {
        let series = match load_series(path, report.t0) {
            Ok(s) => s,
            Err(e) => {
                report.fail(Stage::Ingest, path.display().to_string(), &e);
                continue;
            }
        };
        log::debug!("Loaded {series}");

        if loaded.iter().any(|s| s.name() == series.name()) {
            log::warn!(
                "Series name '{}' appears more than once; its plot will be overwritten",
                series.name()
            );
        }

        let variants = filtered_variants(&series, config, &mut report);
        let mut group: Vec<&Series> = vec![&series];
        group.extend(variants.iter());

        let file_spec = spec.clone().with_title(series.name());
        match renderer.render(&group, &file_spec) {
            Ok(out) => report.outputs.push(out),
            Err(e) => report.fail(Stage::Render, series.name(), &e.into()),
        }

        loaded.push(series);
    }

    for names in &config.overlays {
        render_overlay(names, &loaded, &spec, renderer, &mut report);
    }

    log::info!(
        "Batch finished: {} plots written, {} items skipped",
        report.outputs.len(),
        report.failures.len()
    );
    report
}

fn batch_t0(override_t0: Option<f64>, marker: Option<&Path>, report: &mut BatchReport) -> f64 {
    if override_t0.is_some() {
        if let Some(m) = marker {
            log::info!("T0 override given, ignoring marker {}", m.display());
        }
        return resolve_t0(override_t0, None);
    }
    let Some(path) = marker else {
        log::debug!("No T0 marker found");
        return resolve_t0(None, None);
    };
    match load_marker(path) {
        Ok(table) => resolve_t0(None, Some(&table)),
        Err(e) => {
            report.fail(Stage::Marker, path.display().to_string(), &e.into());
            resolve_t0(None, None)
        }
    }
}

fn load_series(path: &Path, t0: f64) -> Result<Series> {
    let matrix = load_matrix(path)?;
    Ok(Series::from_matrix(series_name(path), &matrix, t0))
}

/// Series are named after their file, without the extension.
pub fn series_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn filtered_variants(series: &Series, config: &PipelineConfig, report: &mut BatchReport) -> Vec<Series> {
    let mut variants = Vec::new();

    if let Some(lp) = config.lowpass {
        match lowpass_variant(series, lp) {
            Ok(v) => variants.push(v),
            Err(e) => report.fail(Stage::Filter, series.name(), &e),
        }
    }
    if let Some(interval) = config.smoothing_interval {
        match smoothed_variant(series, interval) {
            Ok(v) => variants.push(v),
            Err(e) => report.fail(Stage::Filter, series.name(), &e),
        }
    }
    variants
}

fn lowpass_variant(series: &Series, lp: LowPass) -> Result<Series> {
    let y = lp
        .apply(series.y())
        .with_context(|| format!("low-pass (order {}, cutoff {})", lp.order, lp.cutoff))?;
    let name = format!("{}_lowpass", series.name());
    Ok(series.derive(name, series.x().to_vec(), y)?)
}

/// Each average is placed at the last sample of its window.
fn smoothed_variant(series: &Series, interval: usize) -> Result<Series> {
    let y = moving_average(series.y(), interval)
        .with_context(|| format!("moving average over {interval} samples"))?;
    let x = series.x()[interval - 1..].to_vec();
    let name = format!("{}_avg{}", series.name(), interval);
    Ok(series.derive(name, x, y)?)
}

fn render_overlay(
    names: &[String],
    loaded: &[Series],
    spec: &PlotSpec,
    renderer: &Renderer,
    report: &mut BatchReport,
) {
    let mut group: Vec<&Series> = Vec::with_capacity(names.len());
    for name in names {
        match loaded.iter().find(|s| s.name() == name) {
            Some(s) => group.push(s),
            None => report.fail(
                Stage::Overlay,
                name.as_str(),
                &anyhow::anyhow!("no series named '{name}' in this batch"),
            ),
        }
    }
    if group.len() < 2 {
        report.fail(
            Stage::Overlay,
            names.join(", "),
            &anyhow::anyhow!("an overlay needs at least two series, {} found", group.len()),
        );
        return;
    }
    match renderer.render(&group, spec) {
        Ok(out) => report.outputs.push(out),
        Err(e) => report.fail(Stage::Render, names.join(", "), &e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        dir: TempDir,
        out: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempdir().unwrap();
            let out = dir.path().join("plots");
            fs::create_dir(&out).unwrap();
            Fixture { dir, out }
        }

        fn file(&self, name: &str, content: &str) -> PathBuf {
            let p = self.dir.path().join(name);
            fs::write(&p, content).unwrap();
            p
        }

        fn renderer(&self) -> Renderer {
            Renderer::new(&self.out, false)
        }
    }

    fn ramp_csv(n: usize) -> String {
        (0..n).map(|i| format!("{},{}\n", 20.0 + i as f64 * 0.5, i * i)).collect()
    }

    #[test]
    fn one_plot_per_file_with_marker_excluded() {
        let fx = Fixture::new();
        let files = vec![
            fx.file("Thrust.csv", &ramp_csv(20)),
            fx.file("T0.csv", "10,0\n25,1\n40,1\n"),
            fx.file("Chamber.csv", &ramp_csv(20)),
        ];
        let report = run_batch(&PipelineConfig::default(), &files, &fx.renderer());

        assert_eq!(report.t0, 25.0);
        assert!(report.failures.is_empty(), "{:?}", report.failures);
        assert_eq!(
            report.outputs,
            vec![fx.out.join("Thrust.pdf"), fx.out.join("Chamber.pdf")]
        );
    }

    #[test]
    fn override_skips_marker_entirely() {
        let fx = Fixture::new();
        let files = vec![
            fx.file("t0.csv", "not,numbers\n"),
            fx.file("Thrust.csv", &ramp_csv(5)),
        ];
        let config = PipelineConfig {
            t0_override: Some(1.5),
            ..Default::default()
        };
        let report = run_batch(&config, &files, &fx.renderer());
        assert_eq!(report.t0, 1.5);
        assert!(report.failures.is_empty());
        assert_eq!(report.outputs.len(), 1);
    }

    #[test]
    fn bad_marker_falls_back_to_zero() {
        let fx = Fixture::new();
        let files = vec![
            fx.file("t0.csv", "abc\n"),
            fx.file("Thrust.csv", &ramp_csv(5)),
        ];
        let report = run_batch(&PipelineConfig::default(), &files, &fx.renderer());
        assert_eq!(report.t0, 0.0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, Stage::Marker);
        assert_eq!(report.outputs.len(), 1);
    }

    #[test]
    fn malformed_file_is_skipped_and_batch_continues() {
        let fx = Fixture::new();
        let files = vec![
            fx.file("Broken.csv", "1,2\nx,y\n"),
            fx.file("Thrust.csv", &ramp_csv(5)),
        ];
        let report = run_batch(&PipelineConfig::default(), &files, &fx.renderer());
        assert_eq!(report.outputs, vec![fx.out.join("Thrust.pdf")]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, Stage::Ingest);
        assert!(report.failures[0].item.ends_with("Broken.csv"));
    }

    #[test]
    fn filters_overlay_the_raw_series() {
        let fx = Fixture::new();
        let files = vec![fx.file("Thrust.csv", &ramp_csv(40))];
        let config = PipelineConfig {
            lowpass: Some(LowPass { order: 2, cutoff: 0.2 }),
            smoothing_interval: Some(4),
            ..Default::default()
        };
        let report = run_batch(&config, &files, &fx.renderer());
        assert!(report.failures.is_empty(), "{:?}", report.failures);
        assert_eq!(report.outputs, vec![fx.out.join("Thrust.pdf")]);
    }

    #[test]
    fn file_plot_name_does_not_depend_on_filter_outcome() {
        let fx = Fixture::new();
        let files = vec![fx.file("Thrust.csv", &ramp_csv(20))];
        let good = PipelineConfig {
            lowpass: Some(LowPass { order: 2, cutoff: 0.2 }),
            ..Default::default()
        };
        let bad = PipelineConfig {
            lowpass: Some(LowPass { order: 2, cutoff: 1.5 }),
            ..Default::default()
        };

        let ok = run_batch(&good, &files, &fx.renderer());
        let failed = run_batch(&bad, &files, &fx.renderer());

        assert!(ok.failures.is_empty(), "{:?}", ok.failures);
        assert_eq!(failed.failures[0].stage, Stage::Filter);
        assert_eq!(ok.outputs, vec![fx.out.join("Thrust.pdf")]);
        assert_eq!(ok.outputs, failed.outputs);
    }

    #[test]
    fn bad_filter_still_plots_raw_series() {
        let fx = Fixture::new();
        let files = vec![fx.file("Thrust.csv", &ramp_csv(5))];
        let config = PipelineConfig {
            lowpass: Some(LowPass { order: 2, cutoff: 1.5 }),
            smoothing_interval: Some(50),
            ..Default::default()
        };
        let report = run_batch(&config, &files, &fx.renderer());
        assert_eq!(report.outputs, vec![fx.out.join("Thrust.pdf")]);
        assert_eq!(report.failures.len(), 2);
        assert!(report.failures.iter().all(|f| f.stage == Stage::Filter));
    }

    #[test]
    fn overlays_are_rendered_after_single_plots() {
        let fx = Fixture::new();
        let files = vec![
            fx.file("A.csv", &ramp_csv(6)),
            fx.file("B.csv", &ramp_csv(6)),
        ];
        let config = PipelineConfig {
            overlays: vec![
                vec!["A".into(), "B".into()],
                vec!["A".into(), "Missing".into()],
            ],
            trim: Some(5.0),
            t0_override: Some(21.0),
            ..Default::default()
        };
        let report = run_batch(&config, &files, &fx.renderer());
        assert_eq!(
            report.outputs,
            vec![
                fx.out.join("A.pdf"),
                fx.out.join("B.pdf"),
                fx.out.join("A_vs_B.pdf"),
            ]
        );
        assert_eq!(report.failures.len(), 2);
        assert!(report.failures.iter().all(|f| f.stage == Stage::Overlay));
        assert_eq!(report.failures[0].item, "Missing");
        assert_eq!(report.failures[1].item, "A, Missing");
    }

    #[test]
    fn overlay_with_one_known_name_does_not_rewrite_the_file_plot() {
        let fx = Fixture::new();
        let files = vec![fx.file("A.csv", &ramp_csv(6))];
        let config = PipelineConfig {
            overlays: vec![vec!["A".into(), "Typo".into()]],
            ..Default::default()
        };
        let report = run_batch(&config, &files, &fx.renderer());
        assert_eq!(report.outputs, vec![fx.out.join("A.pdf")]);
        assert!(report.failures.iter().all(|f| f.stage == Stage::Overlay));
    }

    #[test]
    fn render_failure_is_recorded() {
        let fx = Fixture::new();
        let files = vec![fx.file("Thrust.csv", &ramp_csv(5))];
        let renderer = Renderer::new(fx.dir.path().join("absent"), false);
        let report = run_batch(&PipelineConfig::default(), &files, &renderer);
        assert!(report.outputs.is_empty());
        assert_eq!(report.failures[0].stage, Stage::Render);
    }

    #[test]
    fn smoothed_variant_is_aligned_to_window_end() {
        let s = Series::new("P", vec![0.0, 1.0, 2.0, 3.0], vec![2.0, 4.0, 6.0, 8.0]).unwrap();
        let v = smoothed_variant(&s, 2).unwrap();
        assert_eq!(v.name(), "P_avg2");
        assert_eq!(v.x(), &[1.0, 2.0, 3.0]);
        assert_eq!(v.y(), &[3.0, 5.0, 7.0]);
    }
}
