use eframe::egui::Ui;
use egui_plot::{Legend, Line, Plot, PlotPoints};

use crate::color::to_color32;
use crate::render::figure::Figure;

// ---------------------------------------------------------------------------
// Figure plot (central panel)
// ---------------------------------------------------------------------------

/// Draw a composed figure with egui_plot.
pub fn figure_plot(ui: &mut Ui, figure: &Figure) {
    let mut plot = Plot::new("figure_plot")
        .x_axis_label(figure.x_label.as_str())
        .y_axis_label(figure.y_label.as_str())
        .show_grid(true)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);

    if figure.show_legend() {
        plot = plot.legend(Legend::default());
    }

    let (x_lo, x_hi) = figure.x_range();
    if figure.x_limits.is_some() {
        plot = plot.include_x(x_lo).include_x(x_hi);
    }

    plot.show(ui, |plot_ui| {
        for trace in &figure.traces {
            // Only the visible window is handed to egui; the trace keeps all samples.
            let points: PlotPoints = trace
                .points
                .iter()
                .filter(|p| figure.x_limits.is_none() || (p[0] >= x_lo && p[0] <= x_hi))
                .copied()
                .collect();

            let mut line = Line::new(points)
                .color(to_color32(trace.color))
                .width(1.5);
            if figure.show_legend() {
                line = line.name(&trace.name);
            }

            plot_ui.line(line);
        }
    });
}
