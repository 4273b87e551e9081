use crate::mode::Polarity;

/// Per-pixel drive codes of a source row.
///
/// A row carries two bits per pixel, four pixels per byte, the leftmost
/// pixel in the two most significant bits.
pub struct Cmd;
impl Cmd {
    /// Leave the pixel alone
    pub const NOOP: u8 = 0b00;
    /// Pull black particles up
    pub const DARKEN: u8 = 0b01;
    /// Pull white particles up
    pub const LIGHTEN: u8 = 0b10;

    /// Pixels per row byte
    pub const PIXELS_PER_BYTE: usize = 4;

    /// Code that moves a pixel in direction `polarity`
    pub const fn for_polarity(polarity: Polarity) -> u8 {
        match polarity {
            Polarity::Darken => Self::DARKEN,
            Polarity::Lighten => Self::LIGHTEN,
        }
    }

    /// Store `code` for pixel `x` in `row`
    #[inline(always)]
    pub fn set(row: &mut [u8], x: usize, code: u8) {
        let shift = 6 - 2 * (x % Self::PIXELS_PER_BYTE);
        row[x / Self::PIXELS_PER_BYTE] |= code << shift;
    }
}
