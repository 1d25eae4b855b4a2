use eframe::egui;
use egui::{Color32, Sense, Stroke, Vec2};
use image::Rgba;

// ============================================================================
// PALETTE PANEL — fixed swatch set + free-form picker + hex entry
// ============================================================================

/// The classic sixteen place-event colors.
pub const SWATCHES: [Rgba<u8>; 16] = [
    Rgba([255, 255, 255, 255]), // white
    Rgba([228, 228, 228, 255]), // light gray
    Rgba([136, 136, 136, 255]), // gray
    Rgba([34, 34, 34, 255]),    // black
    Rgba([255, 167, 209, 255]), // pink
    Rgba([229, 0, 0, 255]),     // red
    Rgba([229, 149, 0, 255]),   // orange
    Rgba([160, 106, 66, 255]),  // brown
    Rgba([229, 217, 0, 255]),   // yellow
    Rgba([148, 224, 68, 255]),  // light green
    Rgba([2, 190, 1, 255]),     // green
    Rgba([0, 211, 221, 255]),   // cyan
    Rgba([0, 131, 199, 255]),   // blue
    Rgba([0, 0, 234, 255]),     // dark blue
    Rgba([207, 110, 228, 255]), // magenta
    Rgba([130, 0, 128, 255]),   // purple
];

const SWATCH_SIZE: f32 = 18.0;

/// Parse a hex color: `RRGGBB`, `#RRGGBB` or `RRGGBBAA`.
/// Returns `None` on anything malformed — the caller keeps its previous
/// selection in that case, so bad input can never corrupt state.
pub fn parse_hex(input: &str) -> Option<Rgba<u8>> {
    let trimmed = input.trim();
    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None; // from_str_radix would accept a leading sign
    }
    match hex.len() {
        6 => {
            let val = u32::from_str_radix(hex, 16).ok()?;
            let r = ((val >> 16) & 0xFF) as u8;
            let g = ((val >> 8) & 0xFF) as u8;
            let b = (val & 0xFF) as u8;
            Some(Rgba([r, g, b, 255]))
        }
        8 => {
            let val = u32::from_str_radix(hex, 16).ok()?;
            let r = ((val >> 24) & 0xFF) as u8;
            let g = ((val >> 16) & 0xFF) as u8;
            let b = ((val >> 8) & 0xFF) as u8;
            let a = (val & 0xFF) as u8;
            Some(Rgba([r, g, b, a]))
        }
        _ => None,
    }
}

pub struct PalettePanel {
    current: Rgba<u8>,
}

impl Default for PalettePanel {
    fn default() -> Self {
        Self {
            // Black, like a fresh pen.
            current: Rgba([0, 0, 0, 255]),
        }
    }
}

impl PalettePanel {
    pub fn current_color(&self) -> Rgba<u8> {
        self.current
    }

    /// Externally set the selection (used by the color-picker tool).
    pub fn set_current(&mut self, color: Rgba<u8>) {
        self.current = color;
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            self.draw_swatches(ui);
            ui.add_space(6.0);
            ui.separator();
            ui.add_space(2.0);
            self.draw_free_picker(ui);
            self.draw_hex_row(ui);
        });
    }

    // -- Fixed swatch row ---------------------------------------------------

    fn draw_swatches(&mut self, ui: &mut egui::Ui) {
        ui.spacing_mut().item_spacing = Vec2::splat(3.0);
        for swatch in SWATCHES {
            let (rect, response) =
                ui.allocate_exact_size(Vec2::splat(SWATCH_SIZE), Sense::click());
            let color = Color32::from_rgba_unmultiplied(swatch[0], swatch[1], swatch[2], swatch[3]);
            let selected = swatch == self.current;
            let stroke = if selected {
                Stroke::new(2.0, ui.visuals().strong_text_color())
            } else {
                Stroke::new(1.0, Color32::from_gray(90))
            };
            ui.painter().rect(rect, 2.0, color, stroke);
            if response.clicked() {
                self.current = swatch;
            }
        }
    }

    // -- Free-form picker ---------------------------------------------------

    fn draw_free_picker(&mut self, ui: &mut egui::Ui) {
        let mut rgb = [self.current[0], self.current[1], self.current[2]];
        if ui.color_edit_button_srgb(&mut rgb).changed() {
            self.current = Rgba([rgb[0], rgb[1], rgb[2], 255]);
        }
    }

    // -- Hex input row ------------------------------------------------------

    fn draw_hex_row(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("#").monospace().strong());

        let mut hex = format!(
            "{:02X}{:02X}{:02X}",
            self.current[0], self.current[1], self.current[2]
        );
        let changed = ui
            .add_sized(
                [58.0, 18.0],
                egui::TextEdit::singleline(&mut hex).font(egui::TextStyle::Monospace),
            )
            .changed();
        if changed {
            // Malformed input is ignored — the previous selection stays.
            if let Some(color) = parse_hex(&hex) {
                self.current = color;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_accepts_plain_and_prefixed() {
        assert_eq!(parse_hex("E50000"), Some(Rgba([229, 0, 0, 255])));
        assert_eq!(parse_hex("#0083C7"), Some(Rgba([0, 131, 199, 255])));
        assert_eq!(parse_hex("  #ffffff "), Some(Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn parse_hex_accepts_rgba_form() {
        assert_eq!(parse_hex("11223344"), Some(Rgba([0x11, 0x22, 0x33, 0x44])));
    }

    #[test]
    fn parse_hex_rejects_malformed_input() {
        for bad in ["", "#", "12345", "GGGGGG", "red", "#12", "1234567", "#123456789"] {
            assert_eq!(parse_hex(bad), None, "{bad:?} should not parse");
        }
    }

    #[test]
    fn malformed_hex_leaves_selection_unchanged() {
        let mut panel = PalettePanel::default();
        panel.set_current(Rgba([229, 0, 0, 255]));
        // Same code path the UI takes on a failed parse: nothing to apply.
        if let Some(c) = parse_hex("not-a-color") {
            panel.set_current(c);
        }
        assert_eq!(panel.current_color(), Rgba([229, 0, 0, 255]));
    }

    #[test]
    fn swatch_selection_round_trips() {
        let mut panel = PalettePanel::default();
        for swatch in SWATCHES {
            panel.set_current(swatch);
            assert_eq!(panel.current_color(), swatch);
        }
    }
}
