//! Packed 4-bit grayscale framebuffer and region addressing
//!
//! Two horizontally adjacent pixels share one byte: the even (left) pixel
//! lives in the high nibble, the odd (right) pixel in the low nibble.
//! `0x0` is black and `0xF` is white. A row never starts in the middle of
//! a byte, so images of odd width carry one padding nibble per row.
//!
//! Every write here clips silently: coordinates outside the buffer are
//! dropped, never wrapped and never rejected.

use crate::{Error, Result};

/// An area on the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Horizontal position.
    pub x: i32,
    /// Vertical position.
    pub y: i32,
    /// Area / image width, must be positive to cover anything.
    pub width: i32,
    /// Area / image height, must be positive to cover anything.
    pub height: i32,
}

impl Rect {
    /// Create a new area
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when the area covers no pixel
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// One past the rightmost column
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// One past the bottom row
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Whether the pixel at `(x, y)` is inside the area
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// The overlapping part of two areas, `None` if they do not overlap.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if self.is_empty() || other.is_empty() {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        let r = Rect::new(x, y, right.saturating_sub(x), bottom.saturating_sub(y));
        (!r.is_empty()).then_some(r)
    }

    /// The smallest area enclosing both. Empty areas are ignored.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.right().max(other.right()).saturating_sub(x),
            self.bottom().max(other.bottom()).saturating_sub(y),
        )
    }
}

/// Bytes per row of a packed image `width` pixels wide
pub const fn packed_stride(width: u32) -> usize {
    (width as usize + 1) / 2
}

/// Bytes needed for a packed image of the given size
pub const fn packed_size(width: u32, height: u32) -> usize {
    packed_stride(width) * height as usize
}

/// Read the nibble at `(x, y)` of a packed image with row stride `stride`.
#[inline(always)]
pub(crate) fn packed_nibble(data: &[u8], stride: usize, x: usize, y: usize) -> u8 {
    let byte = data[stride * y + x / 2];
    if x % 2 == 0 {
        byte >> 4
    } else {
        byte & 0x0F
    }
}

/// A caller-owned packed 4-bit framebuffer.
///
/// The framebuffer borrows its storage; it is `width / 2 * height` bytes
/// and `width` must be even.
pub struct Framebuffer<'a> {
    buf: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Framebuffer<'a> {
    /// Wrap `buf` as a `width` × `height` framebuffer.
    pub fn new(buf: &'a mut [u8], width: u32, height: u32) -> Result<Self> {
        if width % 2 != 0 {
            return Err(Error::OddWidth(width));
        }
        let expected = packed_size(width, height);
        if buf.len() != expected {
            return Err(Error::BufferSize {
                expected,
                actual: buf.len(),
            });
        }
        Ok(Self { buf, width, height })
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The whole framebuffer as an area
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    /// The packed pixel data, ready for [`crate::Epd::draw_image`]
    pub fn buffer(&self) -> &[u8] {
        &*self.buf
    }

    /// Mutable access to the packed pixel data
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut *self.buf
    }

    /// Set every pixel to the 4-bit gray value `gray`
    pub fn fill(&mut self, gray: u8) {
        let gray = gray & 0x0F;
        self.buf.fill(gray << 4 | gray);
    }

    #[inline(always)]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(self.width as usize / 2 * y as usize + x as usize / 2)
    }

    /// Set the pixel at `(x, y)` to the 4-bit gray value `gray`.
    #[inline]
    pub fn set_gray4(&mut self, x: i32, y: i32, gray: u8) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        let gray = gray & 0x0F;
        let byte = &mut self.buf[i];
        *byte = if x % 2 == 0 {
            (*byte & 0x0F) | (gray << 4)
        } else {
            (*byte & 0xF0) | gray
        };
    }

    /// The 4-bit gray value at `(x, y)`, `None` outside the framebuffer.
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<u8> {
        let i = self.index(x, y)?;
        let byte = self.buf[i];
        Some(if x % 2 == 0 { byte >> 4 } else { byte & 0x0F })
    }

    /// Draw a pixel with an 8-bit gray value (0-255).
    ///
    /// The value is reduced to the framebuffer depth by keeping its top
    /// four bits.
    #[inline]
    pub fn draw_pixel(&mut self, x: i32, y: i32, color: u8) {
        self.set_gray4(x, y, color >> 4);
    }

    /// Draw a horizontal line of `length` pixels starting at `(x, y)`.
    pub fn draw_hline(&mut self, x: i32, y: i32, length: i32, color: u8) {
        if y < 0 || y >= self.height as i32 || length <= 0 {
            return;
        }
        let start = x.max(0);
        let end = x.saturating_add(length).min(self.width as i32);
        for xx in start..end {
            self.set_gray4(xx, y, color >> 4);
        }
    }

    /// Draw a vertical line of `length` pixels starting at `(x, y)`.
    pub fn draw_vline(&mut self, x: i32, y: i32, length: i32, color: u8) {
        if x < 0 || x >= self.width as i32 || length <= 0 {
            return;
        }
        let start = y.max(0);
        let end = y.saturating_add(length).min(self.height as i32);
        for yy in start..end {
            self.set_gray4(x, yy, color >> 4);
        }
    }

    /// Copy a packed image into `area` of this framebuffer.
    ///
    /// `width` and `height` of the area must correspond to the image
    /// dimensions. Parts of the area outside the framebuffer are dropped.
    pub fn copy_image(&mut self, area: Rect, data: &[u8]) -> Result<()> {
        if area.is_empty() {
            return Ok(());
        }
        let stride = packed_stride(area.width as u32);
        let expected = stride * area.height as usize;
        if data.len() < expected {
            return Err(Error::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        let Some(visible) = area.intersection(&self.bounds()) else {
            return Ok(());
        };

        // Byte-aligned rows that are fully visible copy whole bytes.
        let aligned = area.x % 2 == 0 && visible.x == area.x && visible.width == area.width;
        for y in visible.y..visible.bottom() {
            let row = &data[stride * (y - area.y) as usize..][..stride];
            if aligned {
                let whole = area.width as usize / 2;
                let dst = self.width as usize / 2 * y as usize + area.x as usize / 2;
                self.buf[dst..dst + whole].copy_from_slice(&row[..whole]);
                if area.width % 2 == 1 {
                    self.set_gray4(area.right() - 1, y, row[whole] >> 4);
                }
                continue;
            }
            for x in visible.x..visible.right() {
                let gray = packed_nibble(row, 0, (x - area.x) as usize, 0);
                self.set_gray4(x, y, gray);
            }
        }
        Ok(())
    }
}

/// Draw a packed image into a framebuffer.
///
/// Same as [`Framebuffer::copy_image`].
pub fn copy_to_framebuffer(image_area: Rect, image_data: &[u8], framebuffer: &mut Framebuffer<'_>) -> Result<()> {
    framebuffer.copy_image(image_area, image_data)
}
