use std::sync::Arc;

use eframe::egui;
use egui::{Color32, ImageData, Pos2, Rect, TextureFilter, TextureHandle, TextureOptions, Vec2};

use crate::buffer::{PixelBuffer, BACKGROUND};
use crate::components::palette::PalettePanel;
use crate::components::tools::Tool;

/// Zoom clamp range. 0.1× shows the whole grid comfortably on any screen;
/// 50× makes a single cell 50 points wide.
pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 50.0;

/// Cell size in points below which the grid-line overlay is illegible noise.
const GRID_OVERLAY_MIN_ZOOM: f32 = 4.0;

/// Snapshot taken when a pan gesture starts. Every subsequent move event
/// recomputes the offset from this snapshot instead of accumulating
/// per-event deltas, so event-rate jitter can never make the view drift.
#[derive(Clone, Copy)]
struct PanAnchor {
    start_pos: Pos2,
    start_offset: Vec2,
}

// ============================================================================
// CANVAS VIEW — pan/zoom transform + renderer + pointer state machine
// ============================================================================

pub struct CanvasView {
    pub zoom: f32,
    pan_offset: Vec2,
    /// `Some` while the secondary-button pan gesture is active.
    pan_anchor: Option<PanAnchor>,
    /// Cached grid texture; re-uploaded only when the buffer generation moves.
    texture: Option<TextureHandle>,
    uploaded_generation: Option<u64>,
    pub last_canvas_rect: Option<Rect>,
    /// Grid cell under the pointer this frame (for the status bar).
    pub hovered_cell: Option<(u32, u32)>,
}

impl CanvasView {
    pub fn new() -> Self {
        Self {
            zoom: 1.0,
            pan_offset: Vec2::ZERO,
            pan_anchor: None,
            texture: None,
            uploaded_generation: None,
            last_canvas_rect: None,
            hovered_cell: None,
        }
    }

    // ---- zoom ---------------------------------------------------------------

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.2).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.2).max(MIN_ZOOM);
    }

    pub fn reset_view(&mut self) {
        self.zoom = 1.0;
        self.pan_offset = Vec2::ZERO;
    }

    pub fn apply_zoom(&mut self, zoom_factor: f32) {
        self.zoom = (self.zoom * zoom_factor).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Zoom while keeping a screen-space point fixed (e.g. under the mouse
    /// cursor). `anchor` is in screen coordinates, `canvas_rect` is the
    /// viewport rect.
    pub fn zoom_around_screen_point(&mut self, zoom_factor: f32, anchor: Pos2, canvas_rect: Rect) {
        let old_zoom = self.zoom;
        self.zoom = (self.zoom * zoom_factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let actual_factor = self.zoom / old_zoom;
        // The grid center in screen space is canvas_rect.center() + pan_offset.
        // After scaling, the anchor would shift unless pan_offset compensates:
        //   new_center = anchor + (old_center - anchor) * factor
        //   new_pan    = new_center - canvas_rect.center()
        let old_center = canvas_rect.center() + self.pan_offset;
        let new_center_x = anchor.x + (old_center.x - anchor.x) * actual_factor;
        let new_center_y = anchor.y + (old_center.y - anchor.y) * actual_factor;
        self.pan_offset = Vec2::new(
            new_center_x - canvas_rect.center().x,
            new_center_y - canvas_rect.center().y,
        );
    }

    // ---- pan gesture --------------------------------------------------------

    pub fn is_panning(&self) -> bool {
        self.pan_anchor.is_some()
    }

    /// Start a pan gesture: snapshot the pointer position and current offset.
    pub fn begin_pan(&mut self, pos: Pos2) {
        self.pan_anchor = Some(PanAnchor {
            start_pos: pos,
            start_offset: self.pan_offset,
        });
    }

    /// Move event during an active pan gesture. The offset is always
    /// snapshot + total displacement, never an accumulation of deltas.
    pub fn pan_to(&mut self, pos: Pos2) {
        if let Some(anchor) = self.pan_anchor {
            self.pan_offset = anchor.start_offset + (pos - anchor.start_pos);
        }
    }

    pub fn end_pan(&mut self) {
        self.pan_anchor = None;
    }

    // ---- coordinate mapping -------------------------------------------------

    /// Screen rect the grid occupies: centered in the viewport, displaced by
    /// the pan offset, one grid cell per `zoom` points. Rounded to whole
    /// points to avoid sub-pixel sampling seams; the same rect is used for
    /// both the blit and hit-testing so the two can never drift apart.
    pub fn image_rect(&self, canvas_rect: Rect, grid_w: u32, grid_h: u32) -> Rect {
        let image_width = grid_w as f32 * self.zoom;
        let image_height = grid_h as f32 * self.zoom;

        let center = canvas_rect.center() + self.pan_offset;
        let unrounded = Rect::from_center_size(center, Vec2::new(image_width, image_height));

        Rect::from_min_max(
            Pos2::new(unrounded.min.x.round(), unrounded.min.y.round()),
            Pos2::new(unrounded.max.x.round(), unrounded.max.y.round()),
        )
    }

    /// Converts a screen position to grid cell coordinates.
    /// Returns `None` when the position is outside the grid.
    pub fn screen_to_grid(
        &self,
        screen_pos: Pos2,
        canvas_rect: Rect,
        grid_w: u32,
        grid_h: u32,
    ) -> Option<(u32, u32)> {
        let image_rect = self.image_rect(canvas_rect, grid_w, grid_h);
        if !image_rect.contains(screen_pos) {
            return None;
        }

        // Truncation is floor here: contains() guarantees non-negative.
        let cell_x = ((screen_pos.x - image_rect.min.x) / self.zoom) as u32;
        let cell_y = ((screen_pos.y - image_rect.min.y) / self.zoom) as u32;

        if cell_x < grid_w && cell_y < grid_h {
            Some((cell_x, cell_y))
        } else {
            None
        }
    }

    // ---- frame --------------------------------------------------------------

    /// Lay out the canvas area, apply this frame's pointer input, then draw.
    /// All buffer/view mutation happens before the blit, so the frame always
    /// shows fully-committed state.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        buffer: &mut PixelBuffer,
        tool: Tool,
        palette: &mut PalettePanel,
    ) {
        let available_size = ui.available_size();
        let sense = egui::Sense::click_and_drag().union(egui::Sense::hover());
        let (response, painter) = ui.allocate_painter(available_size, sense);
        let canvas_rect = response.rect;
        self.last_canvas_rect = Some(canvas_rect);

        self.handle_pointer(ui, &response, canvas_rect, buffer, tool, palette);

        // ---- texture upload (only when the buffer changed) ----
        // Nearest-neighbor sampling in both directions: zoomed cells must
        // stay hard-edged, this is pixel art rather than photography.
        let texture_options = TextureOptions {
            magnification: TextureFilter::Nearest,
            minification: TextureFilter::Nearest,
            ..Default::default()
        };
        let needs_upload = self.texture.is_none()
            || self.uploaded_generation != Some(buffer.dirty_generation());
        if needs_upload {
            let image_data = ImageData::Color(Arc::new(buffer.to_color_image()));
            if let Some(ref mut tex) = self.texture {
                tex.set(image_data, texture_options);
            } else {
                self.texture = Some(ui.ctx().load_texture(
                    "pixel_grid",
                    image_data,
                    texture_options,
                ));
            }
            self.uploaded_generation = Some(buffer.dirty_generation());
        }

        // ---- draw ----
        painter.rect_filled(canvas_rect, 0.0, Color32::from_gray(28));

        let image_rect = self.image_rect(canvas_rect, buffer.width(), buffer.height());
        let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
        if let Some(texture) = &self.texture {
            // Single blit for the whole grid — never per-cell draw calls.
            painter.image(texture.id(), image_rect, uv, Color32::WHITE);
        }

        self.draw_pixel_grid(
            &painter,
            image_rect,
            canvas_rect,
            buffer.width(),
            buffer.height(),
        );
    }

    /// Pointer state machine: Idle ↔ Panning, plus tool application while Idle.
    ///
    /// The canvas claims secondary-button interaction for panning and never
    /// attaches a context menu, so no right-click menu appears over the grid.
    fn handle_pointer(
        &mut self,
        ui: &mut egui::Ui,
        response: &egui::Response,
        canvas_rect: Rect,
        buffer: &mut PixelBuffer,
        tool: Tool,
        palette: &mut PalettePanel,
    ) {
        let (secondary_pressed, secondary_down, primary_pressed, primary_down, pointer_pos) =
            ui.input(|i| {
                (
                    i.pointer.secondary_pressed(),
                    i.pointer.secondary_down(),
                    i.pointer.primary_pressed(),
                    i.pointer.primary_down(),
                    i.pointer.interact_pos(),
                )
            });
        let hover_pos = ui.input(|i| i.pointer.hover_pos());

        // Status-bar readout: cell under the pointer, regardless of buttons.
        self.hovered_cell = hover_pos
            .filter(|p| canvas_rect.contains(*p))
            .and_then(|p| self.screen_to_grid(p, canvas_rect, buffer.width(), buffer.height()));

        // ---- Idle → Panning: secondary button pressed over the canvas ----
        if secondary_pressed && !self.is_panning() {
            if let Some(pos) = pointer_pos {
                if canvas_rect.contains(pos) {
                    self.begin_pan(pos);
                }
            }
        }

        if self.is_panning() {
            if secondary_down {
                // Keep tracking the pointer even outside the canvas bounds.
                if let Some(pos) = pointer_pos {
                    self.pan_to(pos);
                }
            } else {
                // Panning → Idle: release is honored anywhere, including
                // outside the widget, so the mode can never get stuck.
                self.end_pan();
            }
            return;
        }

        // ---- Idle: apply the active tool with the primary button ----
        if !response.is_pointer_button_down_on() {
            return;
        }
        let Some(pos) = pointer_pos else {
            return;
        };
        let Some((cell_x, cell_y)) =
            self.screen_to_grid(pos, canvas_rect, buffer.width(), buffer.height())
        else {
            return;
        };

        match tool {
            // Continuous: paints on press and on every drag move event.
            Tool::Pen if primary_down => {
                buffer.set(cell_x, cell_y, palette.current_color());
            }
            Tool::Eraser if primary_down => {
                buffer.set(cell_x, cell_y, BACKGROUND);
            }
            // One-shot: only on the press edge, not while dragging.
            Tool::Bucket if primary_pressed => {
                buffer.flood_fill(cell_x, cell_y, palette.current_color());
            }
            Tool::Picker if primary_pressed => {
                if let Some(color) = buffer.get(cell_x, cell_y) {
                    palette.set_current(color);
                }
            }
            _ => {}
        }
    }

    /// Thin lines at every integer cell boundary, drawn only when cells are
    /// large enough on screen for the overlay to be legible.
    fn draw_pixel_grid(
        &self,
        painter: &egui::Painter,
        image_rect: Rect,
        viewport: Rect,
        grid_w: u32,
        grid_h: u32,
    ) {
        let cell_size = self.zoom;
        if cell_size < GRID_OVERLAY_MIN_ZOOM {
            return;
        }

        let visible = image_rect.intersect(viewport);
        if visible.width() <= 0.0 || visible.height() <= 0.0 {
            return;
        }

        // Only the cell range that intersects the viewport.
        let start_x = ((visible.min.x - image_rect.min.x) / cell_size)
            .floor()
            .max(0.0) as u32;
        let end_x = ((visible.max.x - image_rect.min.x) / cell_size)
            .ceil()
            .min(grid_w as f32) as u32;
        let start_y = ((visible.min.y - image_rect.min.y) / cell_size)
            .floor()
            .max(0.0) as u32;
        let end_y = ((visible.max.y - image_rect.min.y) / cell_size)
            .ceil()
            .min(grid_h as f32) as u32;

        // Dual-stroke (dark outline + light center) stays visible on any
        // cell color underneath.
        let grid_outline = Color32::from_black_alpha(90);
        let grid_center = Color32::from_white_alpha(100);
        let outline_stroke = 1.2;
        let center_stroke = 0.6;

        for x in start_x..=end_x {
            let screen_x = image_rect.min.x + x as f32 * cell_size;
            if screen_x >= visible.min.x && screen_x <= visible.max.x {
                let p0 = Pos2::new(screen_x, visible.min.y.max(image_rect.min.y));
                let p1 = Pos2::new(screen_x, visible.max.y.min(image_rect.max.y));
                painter.line_segment([p0, p1], (outline_stroke, grid_outline));
                painter.line_segment([p0, p1], (center_stroke, grid_center));
            }
        }

        for y in start_y..=end_y {
            let screen_y = image_rect.min.y + y as f32 * cell_size;
            if screen_y >= visible.min.y && screen_y <= visible.max.y {
                let p0 = Pos2::new(visible.min.x.max(image_rect.min.x), screen_y);
                let p1 = Pos2::new(visible.max.x.min(image_rect.max.x), screen_y);
                painter.line_segment([p0, p1], (outline_stroke, grid_outline));
                painter.line_segment([p0, p1], (center_stroke, grid_center));
            }
        }
    }
}

impl Default for CanvasView {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{GRID_HEIGHT, GRID_WIDTH};

    fn viewport() -> Rect {
        Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0))
    }

    #[test]
    fn zoom_is_always_clamped() {
        let mut view = CanvasView::new();
        view.apply_zoom(10_000.0);
        assert_eq!(view.zoom, MAX_ZOOM);
        view.apply_zoom(1e-9);
        assert_eq!(view.zoom, MIN_ZOOM);

        for _ in 0..100 {
            view.zoom_in();
        }
        assert!(view.zoom <= MAX_ZOOM);
        for _ in 0..200 {
            view.zoom_out();
        }
        assert!(view.zoom >= MIN_ZOOM);
    }

    #[test]
    fn anchored_zoom_clamps_too() {
        let mut view = CanvasView::new();
        view.zoom_around_screen_point(1e6, Pos2::new(100.0, 100.0), viewport());
        assert_eq!(view.zoom, MAX_ZOOM);
    }

    #[test]
    fn zoom_to_cursor_keeps_anchored_cell_fixed() {
        let mut view = CanvasView::new();
        view.zoom = 2.0;
        view.begin_pan(Pos2::ZERO);
        view.pan_to(Pos2::new(30.0, -12.0));
        view.end_pan();

        let anchor = Pos2::new(200.0, 150.0);
        for factor in [1.5, 0.5, 3.0, 0.25] {
            let before = view
                .screen_to_grid(anchor, viewport(), GRID_WIDTH, GRID_HEIGHT)
                .expect("anchor must be over the grid");
            view.zoom_around_screen_point(factor, anchor, viewport());
            let after = view
                .screen_to_grid(anchor, viewport(), GRID_WIDTH, GRID_HEIGHT)
                .expect("anchor must stay over the grid");
            // ±1 cell tolerance from floor rounding at cell boundaries.
            assert!((after.0 as i64 - before.0 as i64).abs() <= 1);
            assert!((after.1 as i64 - before.1 as i64).abs() <= 1);
        }
    }

    #[test]
    fn pan_is_relative_to_gesture_start() {
        let mut view = CanvasView::new();
        // Put the view at offset (10, 10) first.
        view.begin_pan(Pos2::ZERO);
        view.pan_to(Pos2::new(10.0, 10.0));
        view.end_pan();

        view.begin_pan(Pos2::new(100.0, 100.0));
        // Two consecutive move events; the second supersedes the first.
        view.pan_to(Pos2::new(105.0, 105.0));
        view.pan_to(Pos2::new(103.0, 103.0));
        view.end_pan();

        let rect = viewport();
        let image_rect = view.image_rect(rect, GRID_WIDTH, GRID_HEIGHT);
        let expected_center = rect.center() + Vec2::new(13.0, 13.0);
        assert_eq!(image_rect.center().x, expected_center.x.round());
        assert_eq!(image_rect.center().y, expected_center.y.round());
    }

    #[test]
    fn pan_to_without_gesture_is_a_noop() {
        let mut view = CanvasView::new();
        let before = view.image_rect(viewport(), GRID_WIDTH, GRID_HEIGHT);
        view.pan_to(Pos2::new(500.0, 500.0));
        let after = view.image_rect(viewport(), GRID_WIDTH, GRID_HEIGHT);
        assert_eq!(before, after);
    }

    #[test]
    fn screen_to_grid_matches_render_placement() {
        for (zoom, offset) in [
            (1.0, Vec2::ZERO),
            (2.5, Vec2::new(37.0, -120.0)),
            (0.4, Vec2::new(-5.0, 9.0)),
            (8.0, Vec2::new(300.0, 300.0)),
        ] {
            let mut view = CanvasView::new();
            view.zoom = zoom;
            view.begin_pan(Pos2::ZERO);
            view.pan_to(Pos2::new(offset.x, offset.y));
            view.end_pan();
            let image_rect = view.image_rect(viewport(), GRID_WIDTH, GRID_HEIGHT);

            for (gx, gy) in [(0u32, 0u32), (12, 7), (500, 500), (999, 999)] {
                // Screen-space center of the rendered cell
                let sx = image_rect.min.x + (gx as f32 + 0.5) * zoom;
                let sy = image_rect.min.y + (gy as f32 + 0.5) * zoom;
                let pos = Pos2::new(sx, sy);
                if !image_rect.contains(pos) {
                    continue;
                }
                assert_eq!(
                    view.screen_to_grid(pos, viewport(), GRID_WIDTH, GRID_HEIGHT),
                    Some((gx, gy)),
                    "zoom {zoom} offset {offset:?} cell ({gx},{gy})"
                );
            }
        }
    }

    #[test]
    fn screen_to_grid_outside_grid_is_none() {
        let mut view = CanvasView::new();
        view.zoom = 4.0;
        // Pan the grid far off-screen.
        view.begin_pan(Pos2::ZERO);
        view.pan_to(Pos2::new(50_000.0, 0.0));
        view.end_pan();
        assert_eq!(
            view.screen_to_grid(Pos2::new(10.0, 10.0), viewport(), GRID_WIDTH, GRID_HEIGHT),
            None
        );
    }

    #[test]
    fn reset_view_restores_defaults() {
        let mut view = CanvasView::new();
        view.apply_zoom(3.0);
        view.begin_pan(Pos2::ZERO);
        view.pan_to(Pos2::new(40.0, 40.0));
        view.end_pan();
        view.reset_view();
        assert_eq!(view.zoom, 1.0);
        let image_rect = view.image_rect(viewport(), GRID_WIDTH, GRID_HEIGHT);
        assert_eq!(image_rect.center(), viewport().center());
    }
}
