use egui::{Color32, ColorImage};
use image::{Rgba, RgbaImage};
use rayon::prelude::*;

/// Grid dimensions — fixed for the lifetime of the widget, never resized.
pub const GRID_WIDTH: u32 = 1000;
pub const GRID_HEIGHT: u32 = 1000;

/// Background color: opaque white. Fresh canvases start fully white and the
/// eraser restores cells to this color.
pub const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

// ============================================================================
// PIXEL BUFFER — the 1000×1000 RGBA grid
// ============================================================================

/// Owns the pixel grid. Every in-range coordinate has a defined color from
/// construction onward; out-of-range coordinates are never stored.
///
/// `dirty_generation` is bumped on every mutation so the renderer can skip
/// texture re-uploads when nothing changed.
pub struct PixelBuffer {
    pixels: RgbaImage,
    /// Monotonically increasing counter, bumped on each mutation.
    dirty_generation: u64,
}

impl PixelBuffer {
    /// Allocate the grid filled with the background color.
    pub fn new() -> Self {
        Self {
            pixels: RgbaImage::from_pixel(GRID_WIDTH, GRID_HEIGHT, BACKGROUND),
            dirty_generation: 0,
        }
    }

    pub fn width(&self) -> u32 {
        GRID_WIDTH
    }

    pub fn height(&self) -> u32 {
        GRID_HEIGHT
    }

    /// Generation counter for change detection. Compare against a previously
    /// observed value to decide whether a texture re-upload is needed.
    pub fn dirty_generation(&self) -> u64 {
        self.dirty_generation
    }

    fn mark_dirty(&mut self) {
        self.dirty_generation = self.dirty_generation.wrapping_add(1);
    }

    /// Color at (x, y), or `None` outside the grid.
    pub fn get(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if x < GRID_WIDTH && y < GRID_HEIGHT {
            Some(*self.pixels.get_pixel(x, y))
        } else {
            None
        }
    }

    /// Overwrite the cell at (x, y). Out-of-range coordinates are silently
    /// clipped — painting off the edge of the grid is not an error.
    pub fn set(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        if x < GRID_WIDTH && y < GRID_HEIGHT {
            self.pixels.put_pixel(x, y, color);
            self.mark_dirty();
        }
    }

    /// Refill the whole grid with the background color.
    pub fn clear(&mut self) {
        self.pixels = RgbaImage::from_pixel(GRID_WIDTH, GRID_HEIGHT, BACKGROUND);
        self.mark_dirty();
    }

    /// Flood fill: recolor the 4-connected region sharing the seed cell's
    /// color with `new_color`.
    ///
    /// Uses an explicit DFS stack of packed flat indices (y * width + x) so
    /// stack usage stays bounded regardless of region size — a uniform grid
    /// is a single 1,000,000-cell region. Recoloring doubles as the visited
    /// mark: a converted cell no longer matches the seed color, so each cell
    /// is pushed at most once.
    ///
    /// No-op when the seed is out of bounds or already has `new_color`
    /// (the latter would otherwise loop forever re-matching its own output).
    pub fn flood_fill(&mut self, x: u32, y: u32, new_color: Rgba<u8>) {
        let Some(target) = self.get(x, y) else {
            return;
        };
        if target == new_color {
            return;
        }

        let w = GRID_WIDTH as usize;
        let h = GRID_HEIGHT as usize;
        let flat = self.pixels.as_mut();

        // Inline cell accessors on the flat RGBA byte buffer
        #[inline(always)]
        fn pix(flat: &[u8], idx: usize) -> [u8; 4] {
            let o = idx * 4;
            [flat[o], flat[o + 1], flat[o + 2], flat[o + 3]]
        }
        #[inline(always)]
        fn put(flat: &mut [u8], idx: usize, c: [u8; 4]) {
            let o = idx * 4;
            flat[o..o + 4].copy_from_slice(&c);
        }

        let tc = target.0;
        let nc = new_color.0;

        let seed = y as usize * w + x as usize;
        let mut stack: Vec<u32> = Vec::with_capacity(4096);
        put(flat, seed, nc);
        stack.push(seed as u32);

        while let Some(idx) = stack.pop() {
            let idx = idx as usize;
            let cx = idx % w;
            let cy = idx / w;

            // Check 4 neighbors, recolor + push matching ones
            if cx > 0 {
                let ni = idx - 1;
                if pix(flat, ni) == tc {
                    put(flat, ni, nc);
                    stack.push(ni as u32);
                }
            }
            if cx + 1 < w {
                let ni = idx + 1;
                if pix(flat, ni) == tc {
                    put(flat, ni, nc);
                    stack.push(ni as u32);
                }
            }
            if cy > 0 {
                let ni = idx - w;
                if pix(flat, ni) == tc {
                    put(flat, ni, nc);
                    stack.push(ni as u32);
                }
            }
            if cy + 1 < h {
                let ni = idx + w;
                if pix(flat, ni) == tc {
                    put(flat, ni, nc);
                    stack.push(ni as u32);
                }
            }
        }

        self.mark_dirty();
    }

    /// Convert the whole buffer to egui's `ColorImage` for texture upload.
    /// Parallelised with rayon — this touches all 1M pixels, but only runs
    /// on frames where the buffer actually changed.
    pub fn to_color_image(&self) -> ColorImage {
        let raw = self.pixels.as_raw();
        let pixels: Vec<Color32> = raw
            .par_chunks_exact(4)
            .map(|c| Color32::from_rgba_unmultiplied(c[0], c[1], c[2], c[3]))
            .collect();
        ColorImage {
            size: [GRID_WIDTH as usize, GRID_HEIGHT as usize],
            pixels,
        }
    }
}

impl Default for PixelBuffer {
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

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    #[test]
    fn fresh_buffer_is_all_white() {
        let buf = PixelBuffer::new();
        for &(x, y) in &[(0, 0), (999, 0), (0, 999), (999, 999), (500, 500)] {
            assert_eq!(buf.get(x, y), Some(BACKGROUND));
        }
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut buf = PixelBuffer::new();
        buf.set(17, 42, RED);
        assert_eq!(buf.get(17, 42), Some(RED));
        buf.set(17, 42, BLUE);
        assert_eq!(buf.get(17, 42), Some(BLUE));
    }

    #[test]
    fn out_of_bounds_set_is_a_noop() {
        let mut buf = PixelBuffer::new();
        let gen_before = buf.dirty_generation();
        buf.set(GRID_WIDTH, 0, RED);
        buf.set(0, GRID_HEIGHT, RED);
        buf.set(u32::MAX, u32::MAX, RED);
        assert_eq!(buf.dirty_generation(), gen_before);
        // Edge cells untouched
        assert_eq!(buf.get(GRID_WIDTH - 1, 0), Some(BACKGROUND));
        assert_eq!(buf.get(0, GRID_HEIGHT - 1), Some(BACKGROUND));
    }

    #[test]
    fn out_of_bounds_get_is_none() {
        let buf = PixelBuffer::new();
        assert_eq!(buf.get(GRID_WIDTH, 0), None);
        assert_eq!(buf.get(0, GRID_HEIGHT), None);
    }

    #[test]
    fn painting_opposite_corners() {
        let mut buf = PixelBuffer::new();
        buf.set(0, 0, RED);
        buf.set(999, 999, BLUE);
        assert_eq!(buf.get(0, 0), Some(RED));
        assert_eq!(buf.get(999, 999), Some(BLUE));
        assert_eq!(buf.get(1, 0), Some(BACKGROUND));
        assert_eq!(buf.get(998, 999), Some(BACKGROUND));
        assert_eq!(buf.get(500, 500), Some(BACKGROUND));
    }

    #[test]
    fn set_bumps_dirty_generation() {
        let mut buf = PixelBuffer::new();
        let g0 = buf.dirty_generation();
        buf.set(3, 3, RED);
        assert!(buf.dirty_generation() > g0);
    }

    #[test]
    fn flood_fill_converts_entire_uniform_grid() {
        let mut buf = PixelBuffer::new();
        buf.flood_fill(123, 456, RED);
        assert_eq!(buf.get(0, 0), Some(RED));
        assert_eq!(buf.get(999, 999), Some(RED));
        assert_eq!(buf.get(0, 999), Some(RED));
        assert_eq!(buf.get(999, 0), Some(RED));
        assert_eq!(buf.get(123, 456), Some(RED));
    }

    #[test]
    fn flood_fill_same_color_is_a_noop() {
        let mut buf = PixelBuffer::new();
        let gen_before = buf.dirty_generation();
        buf.flood_fill(10, 10, BACKGROUND);
        assert_eq!(buf.dirty_generation(), gen_before);
        assert_eq!(buf.get(10, 10), Some(BACKGROUND));
    }

    #[test]
    fn flood_fill_out_of_bounds_is_a_noop() {
        let mut buf = PixelBuffer::new();
        buf.flood_fill(GRID_WIDTH, 0, RED);
        assert_eq!(buf.get(GRID_WIDTH - 1, 0), Some(BACKGROUND));
    }

    #[test]
    fn flood_fill_respects_4_connectivity_boundary() {
        let mut buf = PixelBuffer::new();
        // Vertical red wall at x = 10 splits the grid in two
        for y in 0..GRID_HEIGHT {
            buf.set(10, y, RED);
        }
        buf.flood_fill(0, 0, BLUE);
        // Left of the wall converted, wall and right side untouched
        assert_eq!(buf.get(9, 500), Some(BLUE));
        assert_eq!(buf.get(10, 500), Some(RED));
        assert_eq!(buf.get(11, 500), Some(BACKGROUND));
        assert_eq!(buf.get(999, 999), Some(BACKGROUND));
    }

    #[test]
    fn flood_fill_does_not_leak_diagonally() {
        let mut buf = PixelBuffer::new();
        // A 2×2 checkerboard of red at the origin: diagonal neighbors must
        // not connect through the corner.
        buf.set(0, 0, RED);
        buf.set(1, 1, RED);
        buf.flood_fill(0, 0, BLUE);
        assert_eq!(buf.get(0, 0), Some(BLUE));
        assert_eq!(buf.get(1, 1), Some(RED));
    }

    #[test]
    fn clear_restores_background() {
        let mut buf = PixelBuffer::new();
        buf.set(5, 5, RED);
        buf.clear();
        assert_eq!(buf.get(5, 5), Some(BACKGROUND));
    }

    #[test]
    fn to_color_image_matches_buffer() {
        let mut buf = PixelBuffer::new();
        buf.set(0, 0, RED);
        buf.set(2, 1, BLUE);
        let img = buf.to_color_image();
        assert_eq!(img.size, [1000, 1000]);
        assert_eq!(img.pixels[0], Color32::from_rgb(255, 0, 0));
        assert_eq!(img.pixels[1 * 1000 + 2], Color32::from_rgb(0, 0, 255));
        assert_eq!(img.pixels[1], Color32::WHITE);
    }
}
