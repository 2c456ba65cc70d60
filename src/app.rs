use eframe::egui;

use crate::render::figure::Figure;
use crate::render::RenderError;
use crate::ui::plot;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

/// Window showing a single figure until the user closes it.
pub struct FigureWindow {
    pub figure: Figure,
}

impl eframe::App for FigureWindow {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: title ----
        egui::TopBottomPanel::top("title_bar").show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading(&self.figure.title);
            });
        });

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::figure_plot(ui, &self.figure);
        });
    }
}

/// Open a blocking viewer window for `figure`.
///
/// Returns once the window is closed. The window owns its own copy of the
/// figure, so nothing survives into the next plot.
pub fn show(figure: &Figure) -> Result<(), RenderError> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 750.0])
            .with_min_inner_size([500.0, 350.0]),
        ..Default::default()
    };

    let window = FigureWindow {
        figure: figure.clone(),
    };

    eframe::run_native(
        &figure.title,
        options,
        Box::new(|_cc| Ok(Box::new(window))),
    )
    .map_err(|e| RenderError::Display(e.to_string()))
}
