//! Text layout and drawing
//!
//! Text is laid out along a baseline cursor. For every character the
//! glyph's bitmap is placed at `(cursor.x + left, cursor.y - top)` and the
//! cursor moves right by the glyph's `advance_x`. A `'\n'` returns the
//! cursor to the x position the call started at and moves it down by the
//! font's `advance_y`.
//!
//! Text goes either into a [`Framebuffer`] or, line by line, straight to
//! the panel through an [`ImageSink`] such as [`crate::Epd`].
//!
//! Characters without a glyph (and no usable fallback) draw nothing and do
//! not move the cursor. A glyph whose bitmap fails to decompress is not
//! drawn either, but its advance still applies. Every write reports how
//! many characters it skipped.

use core::convert::Infallible;

use alloc::vec;

use super::{DrawFlags, Font, FontProperties, Glyph};
use crate::{
    framebuffer::{packed_nibble, packed_size, packed_stride, Framebuffer, Rect},
    mode::DrawMode,
};

/// Text cursor, on the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Horizontal position
    pub x: i32,
    /// Baseline position
    pub y: i32,
}

impl Cursor {
    /// Create a cursor at `(x, y)`
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Something that can show a packed 4-bit image in a given mode.
pub trait ImageSink {
    /// Error reported by the sink
    type Error;

    /// Show the packed image `data` in `area` using `mode`.
    fn draw_image(&mut self, area: Rect, data: &[u8], mode: DrawMode) -> Result<(), Self::Error>;
}

/// Placeholder sink for framebuffer-only targets. Has no values.
#[derive(Debug)]
pub enum NoPanel {}

impl ImageSink for NoPanel {
    type Error = Infallible;

    fn draw_image(&mut self, _: Rect, _: &[u8], _: DrawMode) -> Result<(), Self::Error> {
        match *self {}
    }
}

/// Where [`Font::write_mode`] puts the text
pub enum Target<'t, 'fb, S = NoPanel> {
    /// Composite into a framebuffer
    Framebuffer(&'t mut Framebuffer<'fb>),
    /// Draw each line directly on the panel
    Panel {
        /// The panel
        sink: &'t mut S,
        /// Mode the lines are drawn with
        mode: DrawMode,
    },
}

impl<'t, 'fb> Target<'t, 'fb, NoPanel> {
    /// Target a framebuffer
    pub fn framebuffer(fb: &'t mut Framebuffer<'fb>) -> Self {
        Target::Framebuffer(fb)
    }
}

impl<'t, 'fb, S: ImageSink> Target<'t, 'fb, S> {
    /// Target the panel behind `sink`
    pub fn panel(sink: &'t mut S, mode: DrawMode) -> Self {
        Target::Panel { sink, mode }
    }
}

/// Area covered by a glyph's bitmap
fn glyph_box(glyph: &Glyph, at: Cursor) -> Rect {
    Rect::new(
        at.x + i32::from(glyph.left),
        at.y - i32::from(glyph.top),
        i32::from(glyph.width),
        i32::from(glyph.height),
    )
}

impl<'a> Font<'a> {
    /// Area painted behind a glyph when drawing the background
    fn background_box(&self, glyph: &Glyph, at: Cursor) -> Rect {
        Rect::new(
            at.x,
            at.y - self.ascender,
            i32::from(glyph.advance_x),
            self.ascender - self.descender,
        )
    }

    /// Move a cursor through `text`, calling `visit` for every glyph with
    /// the cursor position it is drawn at.
    ///
    /// Returns the final cursor and the number of characters without glyph.
    fn walk(
        &self,
        text: &str,
        start: Cursor,
        props: &FontProperties,
        mut visit: impl FnMut(&'a Glyph, Cursor),
    ) -> (Cursor, usize) {
        let mut cursor = start;
        let mut missing = 0;
        for c in text.chars() {
            if c == '\n' {
                cursor.x = start.x;
                cursor.y += i32::from(self.advance_y);
                continue;
            }
            match self.lookup_glyph(c as u32, props) {
                Some(glyph) => {
                    visit(glyph, cursor);
                    cursor.x += i32::from(glyph.advance_x);
                }
                None => missing += 1,
            }
        }
        (cursor, missing)
    }

    /// Calculate the bounds of `text` written at `(x, y)`.
    ///
    /// The result encloses every glyph bitmap and, with
    /// [`DrawFlags::DRAW_BACKGROUND`], every background box. Empty text
    /// gives an empty rectangle at `(x, y)`.
    pub fn get_text_bounds(&self, text: &str, x: i32, y: i32, props: &FontProperties) -> Rect {
        let background = props.flags.contains(DrawFlags::DRAW_BACKGROUND);
        let mut bounds = Rect::new(x, y, 0, 0);
        self.walk(text, Cursor::new(x, y), props, |glyph, at| {
            bounds = bounds.union(&glyph_box(glyph, at));
            if background {
                bounds = bounds.union(&self.background_box(glyph, at));
            }
        });
        bounds
    }

    /// Draw one glyph. Returns `false` if its bitmap is unusable.
    fn draw_glyph(
        &self,
        glyph: &Glyph,
        at: Cursor,
        props: &FontProperties,
        fb: &mut Framebuffer<'_>,
    ) -> bool {
        let fg = i32::from(props.fg_color());
        let bg = i32::from(props.bg_color());

        if props.flags.contains(DrawFlags::DRAW_BACKGROUND) {
            let area = self.background_box(glyph, at);
            fb.fill_rect(area.x, area.y, area.width, area.height, props.bg_color() * 0x11);
        }

        let bitmap = match self.glyph_bitmap(glyph) {
            Ok(bitmap) => bitmap,
            Err(e) => {
                log::warn!("skipping glyph at offset {}: {}", glyph.data_offset, e);
                return false;
            }
        };

        let area = glyph_box(glyph, at);
        let stride = packed_stride(u32::from(glyph.width));
        for y in 0..area.height {
            for x in 0..area.width {
                let alpha = i32::from(packed_nibble(&bitmap, stride, x as usize, y as usize));
                if alpha == 0 {
                    continue;
                }
                let color = bg + alpha * (fg - bg) / 15;
                fb.set_gray4(area.x + x, area.y + y, color as u8);
            }
        }
        true
    }

    /// Draw `text` into `fb`, starting at `start`.
    fn render(
        &self,
        text: &str,
        start: Cursor,
        props: &FontProperties,
        fb: &mut Framebuffer<'_>,
    ) -> (Cursor, usize) {
        let mut failed = 0;
        let (end, missing) = self.walk(text, start, props, |glyph, at| {
            if !self.draw_glyph(glyph, at, props, fb) {
                failed += 1;
            }
        });
        (end, missing + failed)
    }

    /// Draw a single line on the panel, through a scratch buffer covering
    /// just that line.
    fn render_panel_line<S: ImageSink>(
        &self,
        line: &str,
        cursor: &mut Cursor,
        sink: &mut S,
        mode: DrawMode,
        props: &FontProperties,
    ) -> Result<usize, S::Error> {
        let bounds = self.get_text_bounds(line, cursor.x, cursor.y, props);
        if bounds.is_empty() {
            let (end, missing) = self.walk(line, *cursor, props, |_, _| {});
            *cursor = end;
            return Ok(missing);
        }

        // Scratch rows have to pack into whole bytes
        let area = Rect::new(bounds.x, bounds.y, bounds.width + (bounds.width & 1), bounds.height);
        let fill = if props.flags.contains(DrawFlags::DRAW_BACKGROUND) {
            props.bg_color()
        } else {
            mode.neutral_gray()
        };
        let (width, height) = (area.width as u32, area.height as u32);
        let mut scratch = vec![fill << 4 | fill; packed_size(width, height)];
        let Ok(mut fb) = Framebuffer::new(&mut scratch, width, height) else {
            log::error!("no scratch framebuffer for a {}x{} line", width, height);
            return Ok(0);
        };

        let local = Cursor::new(cursor.x - area.x, cursor.y - area.y);
        let (end, skipped) = self.render(line, local, props, &mut fb);
        *cursor = Cursor::new(end.x + area.x, end.y + area.y);

        log::debug!("text line {:?} to panel", area);
        sink.draw_image(area, &scratch, mode)?;
        Ok(skipped)
    }

    /// Write text to a framebuffer or directly to the panel.
    ///
    /// The cursor is left behind the last character. Returns the number of
    /// characters that could not be drawn.
    pub fn write_mode<S: ImageSink>(
        &self,
        text: &str,
        cursor: &mut Cursor,
        target: Target<'_, '_, S>,
        props: &FontProperties,
    ) -> Result<usize, S::Error> {
        match target {
            Target::Framebuffer(fb) => {
                let (end, skipped) = self.render(text, *cursor, props, fb);
                *cursor = end;
                Ok(skipped)
            }
            Target::Panel { sink, mode } => {
                let line_start = cursor.x;
                let mut skipped = 0;
                for (i, line) in text.split('\n').enumerate() {
                    if i > 0 {
                        cursor.x = line_start;
                        cursor.y += i32::from(self.advance_y);
                    }
                    skipped += self.render_panel_line(line, cursor, sink, mode, props)?;
                }
                Ok(skipped)
            }
        }
    }

    /// Write text with default properties, leaving the cursor behind the
    /// last character.
    ///
    /// Like [`Font::write_mode`], the text goes into a framebuffer or
    /// straight to the panel, depending on `target`.
    pub fn write_string<S: ImageSink>(
        &self,
        text: &str,
        cursor: &mut Cursor,
        target: Target<'_, '_, S>,
    ) -> Result<usize, S::Error> {
        self.write_mode(text, cursor, target, &FontProperties::default())
    }

    /// Write a line of text and move the cursor to the start of the next.
    pub fn writeln<S: ImageSink>(
        &self,
        text: &str,
        cursor: &mut Cursor,
        target: Target<'_, '_, S>,
    ) -> Result<usize, S::Error> {
        let x = cursor.x;
        let skipped = self.write_string(text, cursor, target)?;
        cursor.x = x;
        cursor.y += i32::from(self.advance_y);
        Ok(skipped)
    }
}
