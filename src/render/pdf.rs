use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use palette::Srgb;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Pt, Rgb,
    TextMatrix,
};

use super::figure::Figure;
use super::RenderError;
use crate::color::{grid_shade, to_unit_rgb, MAJOR_GRID_ALPHA, MINOR_GRID_ALPHA};

// A4 landscape, millimetres.
const PAGE_W: f64 = 297.0;
const PAGE_H: f64 = 210.0;

const MARGIN_LEFT: f64 = 28.0;
const MARGIN_RIGHT: f64 = 12.0;
const MARGIN_TOP: f64 = 22.0;
const MARGIN_BOTTOM: f64 = 22.0;

const TITLE_PT: f64 = 14.0;
const LABEL_PT: f64 = 11.0;
const TICK_PT: f64 = 8.0;
const LEGEND_PT: f64 = 9.0;

const TARGET_TICKS: f64 = 8.0;
const MINOR_PER_MAJOR: f64 = 5.0;

/// Write `figure` as a single-page PDF at `path`.
///
/// The destination directory must already exist.
pub fn write_pdf(figure: &Figure, path: &Path) -> Result<(), RenderError> {
    let pdf_err = |e: printpdf::Error| RenderError::Pdf {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let (doc, page, layer) = PdfDocument::new(
        figure.title.as_str(),
        Mm(PAGE_W as f32),
        Mm(PAGE_H as f32),
        "figure",
    );
    let font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
    let canvas = Canvas {
        layer: doc.get_page(page).get_layer(layer),
        font,
    };

    let frame = plot_frame(figure);

    draw_grid(&canvas, &frame);
    draw_traces(&canvas, &frame, figure);
    draw_frame_and_ticks(&canvas, &frame);
    draw_labels(&canvas, &frame, figure);
    if figure.show_legend() {
        draw_legend(&canvas, &frame, figure);
    }

    let file = File::create(path).map_err(|source| RenderError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    doc.save(&mut BufWriter::new(file)).map_err(pdf_err)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Plot area on the page and the data ranges it shows.
fn plot_frame(figure: &Figure) -> Frame {
    Frame {
        left: MARGIN_LEFT,
        right: PAGE_W - MARGIN_RIGHT - legend_width(figure),
        bottom: MARGIN_BOTTOM,
        top: PAGE_H - MARGIN_TOP,
        x: figure.x_range(),
        y: figure.y_range(),
    }
}

struct Frame {
    left: f64,
    right: f64,
    bottom: f64,
    top: f64,
    x: (f64, f64),
    y: (f64, f64),
}

impl Frame {
    fn map_x(&self, x: f64) -> f64 {
        self.left + (x - self.x.0) / (self.x.1 - self.x.0) * (self.right - self.left)
    }

    fn map_y(&self, y: f64) -> f64 {
        self.bottom + (y - self.y.0) / (self.y.1 - self.y.0) * (self.top - self.bottom)
    }

    fn map(&self, p: [f64; 2]) -> (f64, f64) {
        (self.map_x(p[0]), self.map_y(p[1]))
    }
}

/// Tick spacing of 1, 2 or 5 times a power of ten.
fn nice_step(span: f64) -> f64 {
    let raw = span / TARGET_TICKS;
    let magnitude = 10f64.powf(raw.log10().floor());
    let norm = raw / magnitude;
    let factor = if norm < 1.5 {
        1.0
    } else if norm < 3.0 {
        2.0
    } else if norm < 7.0 {
        5.0
    } else {
        10.0
    };
    factor * magnitude
}

/// Multiples of `step` within `[lo, hi]`.
fn ticks(lo: f64, hi: f64, step: f64) -> Vec<f64> {
    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last).map(|k| k as f64 * step).collect()
}

fn format_tick(value: f64, step: f64) -> String {
    let decimals = if step >= 1.0 {
        0
    } else {
        (-step.log10().floor()) as usize
    };
    let value = if value.abs() < step * 1e-9 { 0.0 } else { value };
    format!("{value:.decimals$}")
}

/// Split a polyline into the pieces visible inside `[lo, hi]`, cutting
/// segments that cross the window edges at the boundary.
fn visible_runs(points: &[[f64; 2]], lo: f64, hi: f64) -> Vec<Vec<[f64; 2]>> {
    let inside = |p: &[f64; 2]| p[0] >= lo && p[0] <= hi;
    let cut = |a: [f64; 2], b: [f64; 2], x: f64| {
        let t = (x - a[0]) / (b[0] - a[0]);
        [x, a[1] + t * (b[1] - a[1])]
    };

    let mut runs = Vec::new();
    let mut current: Vec<[f64; 2]> = Vec::new();
    let mut prev: Option<[f64; 2]> = None;

    for &p in points {
        if !(p[0].is_finite() && p[1].is_finite()) {
            if current.len() > 1 {
                runs.push(std::mem::take(&mut current));
            }
            current.clear();
            prev = None;
            continue;
        }
        match (prev, inside(&p)) {
            (Some(a), true) if !inside(&a) => {
                let edge = if a[0] < lo { lo } else { hi };
                current.push(cut(a, p, edge));
                current.push(p);
            }
            (_, true) => current.push(p),
            (Some(a), false) if inside(&a) => {
                let edge = if p[0] < lo { lo } else { hi };
                current.push(cut(a, p, edge));
                if current.len() > 1 {
                    runs.push(std::mem::take(&mut current));
                }
                current.clear();
            }
            (Some(a), false) if (a[0] < lo && p[0] > hi) || (a[0] > hi && p[0] < lo) => {
                let (e1, e2) = if a[0] < lo { (lo, hi) } else { (hi, lo) };
                runs.push(vec![cut(a, p, e1), cut(a, p, e2)]);
            }
            _ => {}
        }
        prev = Some(p);
    }
    if current.len() > 1 {
        runs.push(current);
    }
    runs
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

struct Canvas {
    layer: PdfLayerReference,
    font: IndirectFontRef,
}

impl Canvas {
    fn stroke(&self, color: Srgb<u8>, width_pt: f64) {
        self.layer.set_outline_color(rgb(color));
        self.layer.set_outline_thickness(width_pt as f32);
    }

    fn polyline(&self, points: &[(f64, f64)], closed: bool) {
        let points = points
            .iter()
            .map(|&(x, y)| (Point::new(Mm(x as f32), Mm(y as f32)), false))
            .collect();
        self.layer.add_line(Line {
            points,
            is_closed: closed,
        });
    }

    fn text(&self, text: &str, size_pt: f64, x: f64, y: f64) {
        self.layer.set_fill_color(rgb(Srgb::new(0, 0, 0)));
        self.layer
            .use_text(text, size_pt as f32, Mm(x as f32), Mm(y as f32), &self.font);
    }

    /// Text whose horizontal centre sits at `x`.
    fn text_centered(&self, text: &str, size_pt: f64, x: f64, y: f64) {
        self.text(text, size_pt, x - text_width(text, size_pt) / 2.0, y);
    }

    fn text_right(&self, text: &str, size_pt: f64, x: f64, y: f64) {
        self.text(text, size_pt, x - text_width(text, size_pt), y);
    }

    /// Text rotated 90° counter-clockwise, centred vertically on `y`.
    fn text_vertical(&self, text: &str, size_pt: f64, x: f64, y: f64) {
        let start = y - text_width(text, size_pt) / 2.0;
        self.layer.set_fill_color(rgb(Srgb::new(0, 0, 0)));
        self.layer.begin_text_section();
        self.layer.set_font(&self.font, size_pt as f32);
        self.layer.set_text_matrix(TextMatrix::TranslateRotate(
            Pt::from(Mm(x as f32)),
            Pt::from(Mm(start as f32)),
            90.0,
        ));
        self.layer.write_text(text, &self.font);
        self.layer.end_text_section();
    }
}

fn rgb(color: Srgb<u8>) -> Color {
    let (r, g, b) = to_unit_rgb(color);
    Color::Rgb(Rgb::new(r, g, b, None))
}

/// Approximate Helvetica advance width in millimetres.
fn text_width(text: &str, size_pt: f64) -> f64 {
    const PT_TO_MM: f64 = 25.4 / 72.0;
    text.chars().count() as f64 * size_pt * 0.5 * PT_TO_MM
}

const LEGEND_MAX_W: f64 = PAGE_W / 3.0;
// Swatch, gaps and border around a legend label.
const LEGEND_CHROME_W: f64 = 18.0;

fn legend_width(figure: &Figure) -> f64 {
    if !figure.show_legend() {
        return 0.0;
    }
    let widest = figure
        .traces
        .iter()
        .map(|t| text_width(&t.name, LEGEND_PT))
        .fold(0.0, f64::max);
    (widest + LEGEND_CHROME_W).min(LEGEND_MAX_W)
}

/// Shorten `name` with a trailing "..." until it fits in `max_mm`.
fn fit_label(name: &str, size_pt: f64, max_mm: f64) -> String {
    if text_width(name, size_pt) <= max_mm {
        return name.to_string();
    }
    let mut label = name.to_string();
    while !label.is_empty() && text_width(&label, size_pt) + text_width("...", size_pt) > max_mm {
        label.pop();
    }
    label.push_str("...");
    label
}

fn draw_grid(canvas: &Canvas, frame: &Frame) {
    let x_step = nice_step(frame.x.1 - frame.x.0);
    let y_step = nice_step(frame.y.1 - frame.y.0);

    let passes = [
        (MINOR_GRID_ALPHA, x_step / MINOR_PER_MAJOR, y_step / MINOR_PER_MAJOR, 0.3),
        (MAJOR_GRID_ALPHA, x_step, y_step, 0.5),
    ];
    for (alpha, xs, ys, width) in passes {
        canvas.stroke(grid_shade(alpha), width);
        for x in ticks(frame.x.0, frame.x.1, xs) {
            let px = frame.map_x(x);
            canvas.polyline(&[(px, frame.bottom), (px, frame.top)], false);
        }
        for y in ticks(frame.y.0, frame.y.1, ys) {
            let py = frame.map_y(y);
            canvas.polyline(&[(frame.left, py), (frame.right, py)], false);
        }
    }
}

fn draw_traces(canvas: &Canvas, frame: &Frame, figure: &Figure) {
    for trace in &figure.traces {
        canvas.stroke(trace.color, 1.0);
        for run in visible_runs(&trace.points, frame.x.0, frame.x.1) {
            let mapped: Vec<(f64, f64)> = run.into_iter().map(|p| frame.map(p)).collect();
            canvas.polyline(&mapped, false);
        }
    }
}

fn draw_frame_and_ticks(canvas: &Canvas, frame: &Frame) {
    canvas.stroke(Srgb::new(0, 0, 0), 0.8);
    canvas.polyline(
        &[
            (frame.left, frame.bottom),
            (frame.right, frame.bottom),
            (frame.right, frame.top),
            (frame.left, frame.top),
        ],
        true,
    );

    let x_step = nice_step(frame.x.1 - frame.x.0);
    for x in ticks(frame.x.0, frame.x.1, x_step) {
        let px = frame.map_x(x);
        canvas.polyline(&[(px, frame.bottom), (px, frame.bottom + 1.5)], false);
        canvas.text_centered(&format_tick(x, x_step), TICK_PT, px, frame.bottom - 5.0);
    }

    let y_step = nice_step(frame.y.1 - frame.y.0);
    for y in ticks(frame.y.0, frame.y.1, y_step) {
        let py = frame.map_y(y);
        canvas.polyline(&[(frame.left, py), (frame.left + 1.5, py)], false);
        canvas.text_right(&format_tick(y, y_step), TICK_PT, frame.left - 2.0, py - 1.0);
    }
}

fn draw_labels(canvas: &Canvas, frame: &Frame, figure: &Figure) {
    let centre_x = (frame.left + frame.right) / 2.0;
    let centre_y = (frame.bottom + frame.top) / 2.0;
    canvas.text_centered(&figure.title, TITLE_PT, centre_x, PAGE_H - 14.0);
    canvas.text_centered(&figure.x_label, LABEL_PT, centre_x, 8.0);
    canvas.text_vertical(&figure.y_label, LABEL_PT, 9.0, centre_y);
}

fn draw_legend(canvas: &Canvas, frame: &Frame, figure: &Figure) {
    let left = frame.right + 4.0;
    let right = PAGE_W - MARGIN_RIGHT;
    let row = 6.0;
    let entries = figure.legend();
    let bottom = frame.top - row * entries.len() as f64 - 2.0;

    canvas.stroke(grid_shade(MAJOR_GRID_ALPHA), 0.5);
    canvas.polyline(
        &[(left, bottom), (right, bottom), (right, frame.top), (left, frame.top)],
        true,
    );

    let label_room = right - left - 14.0;
    for (i, (name, color)) in entries.into_iter().enumerate() {
        let y = frame.top - row * (i as f64 + 1.0);
        canvas.stroke(color, 1.5);
        canvas.polyline(&[(left + 2.0, y + 1.0), (left + 10.0, y + 1.0)], false);
        canvas.text(&fit_label(name, LEGEND_PT, label_room), LEGEND_PT, left + 12.0, y);
    }
}
