use eframe::egui::Color32;
use palette::{LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Line palette
// ---------------------------------------------------------------------------

/// Line colours, assigned by position in the render list.
const LINE_COLORS: [(u8, u8, u8); 7] = [
    (0xde, 0x3c, 0x80),
    (0xd9, 0x01, 0x3a),
    (0xd4, 0x7e, 0x20),
    (0x17, 0xc0, 0x09),
    (0x19, 0x65, 0x12),
    (0x2a, 0x9e, 0x60),
    (0x11, 0x61, 0x86),
];

/// Number of distinct line colours before they repeat.
pub const PALETTE_LEN: usize = LINE_COLORS.len();

/// Colour for the series at `index` in a render list.
///
/// Indices past the end of the palette wrap around, so an eighth series
/// reuses the first colour.
pub fn line_color(index: usize) -> Srgb<u8> {
    let (r, g, b) = LINE_COLORS[index % PALETTE_LEN];
    Srgb::new(r, g, b)
}

// ---------------------------------------------------------------------------
// Grid shading
// ---------------------------------------------------------------------------

/// Opacity of the minor grid lines.
pub const MINOR_GRID_ALPHA: f32 = 0.2;
/// Opacity of the major grid lines.
pub const MAJOR_GRID_ALPHA: f32 = 0.5;

/// Black at `alpha` composited over a white page.
///
/// Blending is done in linear light so the perceived weight of the grid
/// matches a translucent stroke.
pub fn grid_shade(alpha: f32) -> Srgb<u8> {
    let white = LinSrgb::new(1.0_f32, 1.0, 1.0);
    let black = LinSrgb::new(0.0_f32, 0.0, 0.0);
    let mixed = white.mix(black, alpha.clamp(0.0, 1.0));
    let encoded: Srgb<f32> = Srgb::from_linear(mixed);
    encoded.into_format()
}

/// Convert to the egui colour type for the interactive viewer.
pub fn to_color32(c: Srgb<u8>) -> Color32 {
    Color32::from_rgb(c.red, c.green, c.blue)
}

/// Convert to unit-range floats for the PDF writer.
pub fn to_unit_rgb(c: Srgb<u8>) -> (f32, f32, f32) {
    let f: Srgb<f32> = c.into_format();
    (f.red, f.green, f.blue)
}
