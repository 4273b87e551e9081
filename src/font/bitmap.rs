//! Glyph bitmap retrieval
//!
//! Bitmaps use the framebuffer's nibble packing, high nibble left, rows
//! padded to whole bytes. Each nibble is a coverage (alpha) value. In a
//! compressed font every glyph is its own zlib stream.

use alloc::borrow::Cow;

use miniz_oxide::inflate::decompress_to_vec_zlib_with_limit;

use super::{Font, Glyph};
use crate::{framebuffer::packed_size, Error, Result};

/// Size of a glyph bitmap once decompressed
pub fn unpacked_size(glyph: &Glyph) -> usize {
    packed_size(u32::from(glyph.width), u32::from(glyph.height))
}

impl<'a> Font<'a> {
    /// The packed alpha bitmap of `glyph`.
    ///
    /// Uncompressed bitmaps are borrowed straight from the font; compressed
    /// ones are inflated into a buffer of exactly [`unpacked_size`] bytes.
    pub fn glyph_bitmap(&self, glyph: &Glyph) -> Result<Cow<'a, [u8]>> {
        let blob: &'a [u8] = self.bitmap;
        let start = glyph.data_offset as usize;
        let stored = blob
            .get(start..start + self.stored_size(glyph))
            .ok_or(Error::MalformedFont("glyph bitmap outside of blob"))?;

        if !self.compressed {
            return Ok(Cow::Borrowed(stored));
        }

        let expected = unpacked_size(glyph);
        let data = decompress_to_vec_zlib_with_limit(stored, expected).map_err(|e| {
            log::debug!("inflate failed with {:?}", e.status);
            Error::Decompress
        })?;
        if data.len() != expected {
            log::debug!("inflated {} bytes, expected {}", data.len(), expected);
            return Err(Error::Decompress);
        }
        Ok(Cow::Owned(data))
    }
}
