use eframe::egui;

use crate::buffer::{GRID_HEIGHT, GRID_WIDTH, PixelBuffer};
use crate::canvas::CanvasView;
use crate::components::palette::PalettePanel;
use crate::components::tools::{Tool, ToolsPanel};

// ============================================================================
// APP SHELL — owns all widget state, routes input, lays out the panels
// ============================================================================

/// All state is widget-local: multiple instances would not interfere.
pub struct PixelPlaceApp {
    buffer: PixelBuffer,
    canvas: CanvasView,
    tools_panel: ToolsPanel,
    palette_panel: PalettePanel,
}

impl PixelPlaceApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        crate::log_info!("Canvas initialised: {}x{} cells", GRID_WIDTH, GRID_HEIGHT);
        Self {
            buffer: PixelBuffer::new(),
            canvas: CanvasView::new(),
            tools_panel: ToolsPanel::default(),
            palette_panel: PalettePanel::default(),
        }
    }

    /// Scroll wheel → zoom, anchored at the cursor. Only when the pointer is
    /// over the canvas and not over a floating widget; the delta is consumed
    /// so nothing else scrolls. Scrolling up (away) zooms in.
    fn handle_wheel_zoom(&mut self, ctx: &egui::Context) {
        let mut should_zoom = false;
        let mut zoom_amount = 0.0;

        let pointer_over_widget = ctx.is_pointer_over_area();

        ctx.input_mut(|i| {
            if i.scroll_delta.y.abs() > 0.1 {
                let mouse_over_canvas = i.pointer.hover_pos().is_some_and(|pos| {
                    self.canvas
                        .last_canvas_rect
                        .is_some_and(|rect| rect.contains(pos))
                });
                if mouse_over_canvas && !pointer_over_widget {
                    should_zoom = true;
                    zoom_amount = i.scroll_delta.y;
                    i.scroll_delta.y = 0.0;
                }
            }
        });

        if should_zoom {
            let zoom_factor = 1.0 + zoom_amount * 0.005;
            // Zoom around the mouse cursor so the point under the pointer stays fixed
            let mouse_pos = ctx.input(|i| i.pointer.hover_pos());
            if let (Some(pos), Some(rect)) = (mouse_pos, self.canvas.last_canvas_rect) {
                self.canvas.zoom_around_screen_point(zoom_factor, pos, rect);
            } else {
                self.canvas.apply_zoom(zoom_factor);
            }
        }
    }

    /// Plain-key shortcuts, skipped while a text field has focus.
    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        ctx.input(|i| {
            for &tool in Tool::all() {
                if i.key_pressed(tool.shortcut()) {
                    self.tools_panel.set_current_tool(tool);
                }
            }
            if i.key_pressed(egui::Key::PlusEquals) {
                self.canvas.zoom_in();
            }
            if i.key_pressed(egui::Key::Minus) {
                self.canvas.zoom_out();
            }
            if i.key_pressed(egui::Key::Num0) {
                self.canvas.reset_view();
            }
        });
    }

    fn show_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            self.tools_panel.show(ui);
            ui.separator();
            self.palette_panel.show(ui);
            ui.separator();

            // Zoom controls
            if ui.button("−").on_hover_text("Zoom out (-)").clicked() {
                self.canvas.zoom_out();
            }
            ui.monospace(format!("{:>4.0}%", self.canvas.zoom * 100.0));
            if ui.button("+").on_hover_text("Zoom in (+)").clicked() {
                self.canvas.zoom_in();
            }
            if ui.button("Fit").on_hover_text("Reset view (0)").clicked() {
                self.canvas.reset_view();
            }
            ui.separator();

            if ui
                .button("Clear")
                .on_hover_text("Fill the whole canvas with white")
                .clicked()
            {
                self.buffer.clear();
                crate::log_info!("Canvas cleared");
            }
        });
    }

    fn show_status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            match self.canvas.hovered_cell {
                Some((x, y)) => ui.monospace(format!("({:>3}, {:>3})", x, y)),
                None => ui.monospace("(  -,   -)"),
            };
            ui.separator();
            ui.monospace(format!("{:.0}%", self.canvas.zoom * 100.0));
            ui.separator();
            ui.label(self.tools_panel.current_tool().label());
            if self.canvas.is_panning() {
                ui.separator();
                ui.label("panning");
            }
        });
    }
}

impl eframe::App for PixelPlaceApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_wheel_zoom(ctx);
        self.handle_shortcuts(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.show_toolbar(ui);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.show_status_bar(ui);
        });

        // The canvas fills everything that remains.
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let tool = self.tools_panel.current_tool();
                self.canvas
                    .show(ui, &mut self.buffer, tool, &mut self.palette_panel);
            });
    }
}
