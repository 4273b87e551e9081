//! Rasterization primitives
//!
//! Lines, rectangles, circles and triangles drawn into a [`Framebuffer`].
//! All colors are 8-bit gray values (0-255) that are reduced to the
//! framebuffer's 4-bit depth by [`Framebuffer::draw_pixel`]. Like every
//! other framebuffer write, shapes are clipped silently.

use bitflags::bitflags;

use crate::framebuffer::Framebuffer;

bitflags! {
    /// Quarter-circle selection for the circle helpers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Corners: u8 {
        /// Upper left quarter
        const TOP_LEFT = 1 << 0;
        /// Upper right quarter
        const TOP_RIGHT = 1 << 1;
        /// Lower right quarter
        const BOTTOM_RIGHT = 1 << 2;
        /// Lower left quarter
        const BOTTOM_LEFT = 1 << 3;
        /// Both upper quarters
        const TOP = Self::TOP_LEFT.bits() | Self::TOP_RIGHT.bits();
        /// Both lower quarters
        const BOTTOM = Self::BOTTOM_LEFT.bits() | Self::BOTTOM_RIGHT.bits();
    }
}

/// X position of an edge starting at `x` after `t` of its `dy` rows.
fn edge_x(x: i64, dx: i64, t: i64, dy: i64) -> i64 {
    x + (i128::from(dx) * i128::from(t) / i128::from(dy)) as i64
}

/// Walk one octant of a midpoint circle of radius `r`.
///
/// Emits `(x, y)` for every step from the top of the circle towards the
/// diagonal, `x` growing by one each step. The starting point `(0, r)`
/// is not emitted.
fn circle_steps(r: i32, mut emit: impl FnMut(i32, i32)) {
    let mut f = 1 - r;
    let mut dd_f_x = 1;
    let mut dd_f_y = -2 * r;
    let mut x = 0;
    let mut y = r;

    while x < y {
        if f >= 0 {
            y -= 1;
            dd_f_y += 2;
            f += dd_f_y;
        }
        x += 1;
        dd_f_x += 2;
        f += dd_f_x;
        emit(x, y);
    }
}

impl Framebuffer<'_> {
    /// Write a line. Bresenham's algorithm.
    pub fn write_line(&mut self, mut x0: i32, mut y0: i32, mut x1: i32, mut y1: i32, color: u8) {
        let steep = (y1 - y0).abs() > (x1 - x0).abs();
        if steep {
            core::mem::swap(&mut x0, &mut y0);
            core::mem::swap(&mut x1, &mut y1);
        }
        if x0 > x1 {
            core::mem::swap(&mut x0, &mut x1);
            core::mem::swap(&mut y0, &mut y1);
        }

        let dx = x1 - x0;
        let dy = (y1 - y0).abs();
        let mut err = dx / 2;
        let ystep = if y0 < y1 { 1 } else { -1 };

        let mut y = y0;
        for x in x0..=x1 {
            if steep {
                self.draw_pixel(y, x, color);
            } else {
                self.draw_pixel(x, y, color);
            }
            err -= dy;
            if err < 0 {
                y += ystep;
                err += dx;
            }
        }
    }

    /// Draw a line from `(x0, y0)` to `(x1, y1)`, both ends included.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u8) {
        if x0 == x1 {
            let (top, bottom) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
            self.draw_vline(x0, top, bottom - top + 1, color);
        } else if y0 == y1 {
            let (left, right) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
            self.draw_hline(left, y0, right - left + 1, color);
        } else {
            self.write_line(x0, y0, x1, y1, color);
        }
    }

    /// Draw a rectangle with no fill color
    pub fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u8) {
        if w <= 0 || h <= 0 {
            return;
        }
        self.draw_hline(x, y, w, color);
        self.draw_hline(x, y + h - 1, w, color);
        self.draw_vline(x, y, h, color);
        self.draw_vline(x + w - 1, y, h, color);
    }

    /// Draw a rectangle with fill color
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u8) {
        for row in y..y.saturating_add(h.max(0)) {
            self.draw_hline(x, row, w, color);
        }
    }

    /// Draw the outline of the selected quarters of a circle.
    pub fn draw_circle_helper(&mut self, x0: i32, y0: i32, r: i32, corners: Corners, color: u8) {
        circle_steps(r, |x, y| {
            if corners.contains(Corners::BOTTOM_RIGHT) {
                self.draw_pixel(x0 + x, y0 + y, color);
                self.draw_pixel(x0 + y, y0 + x, color);
            }
            if corners.contains(Corners::TOP_RIGHT) {
                self.draw_pixel(x0 + x, y0 - y, color);
                self.draw_pixel(x0 + y, y0 - x, color);
            }
            if corners.contains(Corners::BOTTOM_LEFT) {
                self.draw_pixel(x0 - y, y0 + x, color);
                self.draw_pixel(x0 - x, y0 + y, color);
            }
            if corners.contains(Corners::TOP_LEFT) {
                self.draw_pixel(x0 - y, y0 - x, color);
                self.draw_pixel(x0 - x, y0 - y, color);
            }
        });
    }

    /// Fill the upper and/or lower half of a circle with horizontal runs.
    ///
    /// Only [`Corners::TOP`] and [`Corners::BOTTOM`] are meaningful: a run
    /// spans both quarters of its half. `delta` widens every run, which
    /// is how rounded rectangles stretch a circle across their width. The
    /// center row is not drawn.
    pub fn fill_circle_helper(
        &mut self,
        x0: i32,
        y0: i32,
        r: i32,
        corners: Corners,
        delta: i32,
        color: u8,
    ) {
        circle_steps(r, |x, y| {
            if corners.intersects(Corners::BOTTOM) {
                self.draw_hline(x0 - x, y0 + y, 2 * x + 1 + delta, color);
                self.draw_hline(x0 - y, y0 + x, 2 * y + 1 + delta, color);
            }
            if corners.intersects(Corners::TOP) {
                self.draw_hline(x0 - x, y0 - y, 2 * x + 1 + delta, color);
                self.draw_hline(x0 - y, y0 - x, 2 * y + 1 + delta, color);
            }
        });
    }

    /// Draw a circle with given center and radius
    pub fn draw_circle(&mut self, x0: i32, y0: i32, r: i32, color: u8) {
        if r < 0 {
            return;
        }
        self.draw_pixel(x0, y0 + r, color);
        self.draw_pixel(x0, y0 - r, color);
        self.draw_pixel(x0 + r, y0, color);
        self.draw_pixel(x0 - r, y0, color);
        self.draw_circle_helper(x0, y0, r, Corners::all(), color);
    }

    /// Draw a circle with fill with given center and radius
    pub fn fill_circle(&mut self, x0: i32, y0: i32, r: i32, color: u8) {
        if r < 0 {
            return;
        }
        self.draw_hline(x0 - r, y0, 2 * r + 1, color);
        self.fill_circle_helper(x0, y0, r, Corners::TOP | Corners::BOTTOM, 0, color);
    }

    /// Draw a rectangle with rounded corners of radius `r`
    pub fn draw_round_rect(&mut self, x: i32, y: i32, w: i32, h: i32, r: i32, color: u8) {
        if w <= 0 || h <= 0 {
            return;
        }
        let r = r.clamp(0, w.min(h) / 2);
        self.draw_hline(x + r, y, w - 2 * r, color);
        self.draw_hline(x + r, y + h - 1, w - 2 * r, color);
        self.draw_vline(x, y + r, h - 2 * r, color);
        self.draw_vline(x + w - 1, y + r, h - 2 * r, color);
        self.draw_circle_helper(x + r, y + r, r, Corners::TOP_LEFT, color);
        self.draw_circle_helper(x + w - r - 1, y + r, r, Corners::TOP_RIGHT, color);
        self.draw_circle_helper(x + w - r - 1, y + h - r - 1, r, Corners::BOTTOM_RIGHT, color);
        self.draw_circle_helper(x + r, y + h - r - 1, r, Corners::BOTTOM_LEFT, color);
    }

    /// Fill a rectangle with rounded corners of radius `r`
    pub fn fill_round_rect(&mut self, x: i32, y: i32, w: i32, h: i32, r: i32, color: u8) {
        if w <= 0 || h <= 0 {
            return;
        }
        let r = r.clamp(0, w.min(h) / 2);
        self.fill_rect(x, y + r, w, h - 2 * r, color);
        let delta = w - 2 * r - 1;
        self.fill_circle_helper(x + r, y + r, r, Corners::TOP, delta, color);
        self.fill_circle_helper(x + r, y + h - r - 1, r, Corners::BOTTOM, delta, color);
        // The helpers skip the center row of each corner circle.
        self.draw_hline(x, y + r, w, color);
        self.draw_hline(x, y + h - r - 1, w, color);
    }

    /// Draw a triangle with no fill color
    pub fn draw_triangle(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, x2: i32, y2: i32, color: u8) {
        self.draw_line(x0, y0, x1, y1, color);
        self.draw_line(x1, y1, x2, y2, color);
        self.draw_line(x2, y2, x0, y0, color);
    }

    /// Draw a triangle with color-fill
    ///
    /// Every row between the top and bottom vertex is one horizontal run
    /// between the long edge (top to bottom vertex) and the active short
    /// edge, which switches at the middle vertex. Edge positions are
    /// computed in wide integers and only rows inside the framebuffer are
    /// visited, so far off-screen vertices are clipped like any other
    /// write.
    pub fn fill_triangle(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, x2: i32, y2: i32, color: u8) {
        let mut v = [
            (i64::from(x0), i64::from(y0)),
            (i64::from(x1), i64::from(y1)),
            (i64::from(x2), i64::from(y2)),
        ];
        // Sort by Y order (y2 >= y1 >= y0)
        v.sort_by_key(|&(_, y)| y);
        let [(x0, y0), (x1, y1), (x2, y2)] = v;

        if y0 == y2 {
            // All on the same line
            let a = x0.min(x1).min(x2);
            let b = x0.max(x1).max(x2);
            self.clipped_run(a, b, y0, color);
            return;
        }

        let (dx01, dy01) = (x1 - x0, y1 - y0);
        let (dx02, dy02) = (x2 - x0, y2 - y0);
        let (dx12, dy12) = (x2 - x1, y2 - y1);

        // Upper part: rows y0..=last between edges 0-1 and 0-2. The middle
        // row belongs here only for flat-bottomed triangles, otherwise it
        // is the first row of the lower part.
        let last = if y1 == y2 { y1 } else { y1 - 1 };

        let first_row = y0.max(0);
        let last_row = y2.min(i64::from(self.height()) - 1);
        for y in first_row..=last_row {
            let long = edge_x(x0, dx02, y - y0, dy02);
            let short = if y <= last {
                edge_x(x0, dx01, y - y0, dy01)
            } else {
                edge_x(x1, dx12, y - y1, dy12)
            };
            self.clipped_run(short.min(long), short.max(long), y, color);
        }
    }

    /// Fill columns `a..=b` of row `y`, dropping whatever lies outside.
    fn clipped_run(&mut self, a: i64, b: i64, y: i64, color: u8) {
        if y < 0 || y >= i64::from(self.height()) {
            return;
        }
        let a = a.max(0);
        let b = b.min(i64::from(self.width()) - 1);
        if a <= b {
            self.draw_hline(a as i32, y as i32, (b - a + 1) as i32, color);
        }
    }
}
