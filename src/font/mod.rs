//! Bitmap fonts
//!
//! A font is a flat, read-only asset: one bitmap blob, a glyph table that
//! points into the blob by offset, and a sorted table of Unicode
//! intervals mapping code points onto runs of the glyph table. Nothing is
//! copied out of it; the renderer borrows the tables for the length of a
//! call.
//!
//! ### Lookup
//!
//! [`Font::get_glyph`] binary-searches the interval table.
//! [`Font::lookup_glyph`] additionally applies the fallback code point of
//! the [`FontProperties`] in use.
//!
//! ### Rendering
//!
//! See [`text`] for layout, bounds and drawing, [`bitmap`] for bitmap
//! retrieval and decompression.

use bitflags::bitflags;

use crate::{Error, Result};

pub mod bitmap;
pub mod text;

/// Font data stored per glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Glyph {
    /// Bitmap dimensions in pixels
    pub width: u8,
    /// Bitmap dimensions in pixels
    pub height: u8,
    /// Distance to advance cursor (x axis)
    pub advance_x: u8,
    /// X dist from cursor pos to UL corner
    pub left: i16,
    /// Y dist from cursor pos to UL corner
    pub top: i16,
    /// Size of the zlib-compressed font data.
    pub compressed_size: u16,
    /// Pointer into the font's bitmap blob
    pub data_offset: u32,
}

/// Glyph interval structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnicodeInterval {
    /// The first unicode code point of the interval
    pub first: u32,
    /// The last unicode code point of the interval
    pub last: u32,
    /// Index of the first code point into the glyph array
    pub offset: u32,
}

/// Data stored for a font as a whole
#[derive(Debug, Clone, Copy)]
pub struct Font<'a> {
    /// Glyph bitmaps, concatenated
    pub bitmap: &'a [u8],
    /// Glyph array
    pub glyphs: &'a [Glyph],
    /// Valid unicode intervals for this font, sorted by `first`
    pub intervals: &'a [UnicodeInterval],
    /// Does this font use compressed glyph bitmaps?
    pub compressed: bool,
    /// Newline distance (y axis)
    pub advance_y: u8,
    /// Maximal height of a glyph above the base line
    pub ascender: i32,
    /// Maximal height of a glyph below the base line, negative
    pub descender: i32,
}

bitflags! {
    /// Text drawing flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DrawFlags: u32 {
        /// Draw a background.
        ///
        /// Take the background into account when calculating the size.
        const DRAW_BACKGROUND = 1 << 0;

        const _ = !0;
    }
}

/// Font properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontProperties {
    colors: u8,
    /// Use the glyph for this code point for missing glyphs.
    pub fallback_glyph: Option<char>,
    /// Additional flags, reserved for future use
    pub flags: DrawFlags,
}

impl FontProperties {
    /// Bits of the foreground color
    pub const FG_MASK: u8 = 0x0F;
    /// Position of the foreground color
    pub const FG_SHIFT: u8 = 0;
    /// Bits of the background color
    pub const BG_MASK: u8 = 0xF0;
    /// Position of the background color
    pub const BG_SHIFT: u8 = 4;

    /// Black text on white, no fallback glyph, no flags
    pub const fn new() -> Self {
        Self {
            colors: 0x0F << Self::BG_SHIFT,
            fallback_glyph: None,
            flags: DrawFlags::empty(),
        }
    }

    /// Foreground color, 0..=15
    pub const fn fg_color(&self) -> u8 {
        (self.colors & Self::FG_MASK) >> Self::FG_SHIFT
    }

    /// Background color, 0..=15
    pub const fn bg_color(&self) -> u8 {
        (self.colors & Self::BG_MASK) >> Self::BG_SHIFT
    }

    /// Set the foreground color. Only the low four bits are kept.
    pub fn set_fg_color(&mut self, color: u8) {
        self.colors = (self.colors & !Self::FG_MASK) | ((color << Self::FG_SHIFT) & Self::FG_MASK);
    }

    /// Set the background color. Only the low four bits are kept.
    pub fn set_bg_color(&mut self, color: u8) {
        self.colors = (self.colors & !Self::BG_MASK) | ((color << Self::BG_SHIFT) & Self::BG_MASK);
    }
}

impl Default for FontProperties {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Font<'a> {
    /// Check that the tables are consistent with each other and the blob.
    pub fn validate(&self) -> Result<()> {
        let mut previous: Option<&UnicodeInterval> = None;
        for interval in self.intervals {
            if interval.first > interval.last {
                return Err(Error::MalformedFont("interval ends before it starts"));
            }
            if let Some(prev) = previous {
                if prev.last >= interval.first {
                    return Err(Error::MalformedFont("intervals unsorted or overlapping"));
                }
            }
            let last_index = u64::from(interval.offset) + u64::from(interval.last - interval.first);
            if last_index >= self.glyphs.len() as u64 {
                return Err(Error::MalformedFont("interval maps past the glyph array"));
            }
            previous = Some(interval);
        }

        for glyph in self.glyphs {
            let end = glyph.data_offset as usize + self.stored_size(glyph);
            if end > self.bitmap.len() {
                return Err(Error::MalformedFont("glyph bitmap outside of blob"));
            }
        }
        Ok(())
    }

    /// Bytes a glyph occupies in the blob.
    pub(crate) fn stored_size(&self, glyph: &Glyph) -> usize {
        if self.compressed {
            glyph.compressed_size as usize
        } else {
            bitmap::unpacked_size(glyph)
        }
    }

    /// Get the glyph for a unicode code point.
    pub fn get_glyph(&self, code_point: u32) -> Option<&'a Glyph> {
        let intervals = self.intervals;
        let i = intervals
            .binary_search_by(|interval| {
                if interval.last < code_point {
                    core::cmp::Ordering::Less
                } else if interval.first > code_point {
                    core::cmp::Ordering::Greater
                } else {
                    core::cmp::Ordering::Equal
                }
            })
            .ok()?;
        let interval = &intervals[i];
        let index = interval.offset as usize + (code_point - interval.first) as usize;
        let glyphs: &'a [Glyph] = self.glyphs;
        glyphs.get(index)
    }

    /// Get the glyph for a code point, or the fallback glyph of `props`.
    pub fn lookup_glyph(&self, code_point: u32, props: &FontProperties) -> Option<&'a Glyph> {
        self.get_glyph(code_point)
            .or_else(|| props.fallback_glyph.and_then(|c| self.get_glyph(c as u32)))
    }
}
