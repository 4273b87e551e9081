//! Draw modes and pulse polarity

/// The image drawing mode.
///
/// The modes are mutually exclusive; each carries the single bit it was
/// assigned in the panel driver's C interface, see [`DrawMode::bits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DrawMode {
    /// Draw black / grayscale image on a white display.
    #[default]
    BlackOnWhite = 1 << 0,
    /// "Draw with white ink" on a white display.
    ///
    /// Lightens every pixel the image marks as non-white, undoing a
    /// [`DrawMode::BlackOnWhite`] draw of the same image.
    WhiteOnWhite = 1 << 1,
    /// Draw with white ink on a black display.
    WhiteOnBlack = 1 << 2,
}

impl DrawMode {
    /// The bit flag of this mode
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Parse a flag value. Anything but exactly one known bit is rejected.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b001 => Some(DrawMode::BlackOnWhite),
            0b010 => Some(DrawMode::WhiteOnWhite),
            0b100 => Some(DrawMode::WhiteOnBlack),
            _ => None,
        }
    }

    /// Direction in which this mode moves the particles.
    pub const fn polarity(self) -> Polarity {
        match self {
            DrawMode::BlackOnWhite => Polarity::Darken,
            DrawMode::WhiteOnWhite | DrawMode::WhiteOnBlack => Polarity::Lighten,
        }
    }

    /// The 4-bit gray value that causes no pulse at all in this mode.
    pub const fn neutral_gray(self) -> u8 {
        match self {
            DrawMode::BlackOnWhite | DrawMode::WhiteOnWhite => 0x0F,
            DrawMode::WhiteOnBlack => 0x00,
        }
    }

    /// Whether a pixel of `gray` is driven in grayscale pass `pass` (0..15).
    ///
    /// Summed over all passes a pixel is driven `15 - gray` times when
    /// drawing dark ink, `gray` times for white ink on black and
    /// `15 - gray` times when erasing on white.
    pub const fn drives(self, gray: u8, pass: u8) -> bool {
        match self {
            DrawMode::BlackOnWhite | DrawMode::WhiteOnWhite => gray + pass < 15,
            DrawMode::WhiteOnBlack => gray > pass,
        }
    }
}

/// Voltage polarity applied to a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Pull black particles to the surface
    Darken,
    /// Pull white particles to the surface
    Lighten,
}

impl Polarity {
    /// The C interface's convention: 1 lightens, 0 darkens.
    pub const fn from_color(color: i32) -> Self {
        if color != 0 {
            Polarity::Lighten
        } else {
            Polarity::Darken
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modes_are_single_bits() {
        for mode in [DrawMode::BlackOnWhite, DrawMode::WhiteOnWhite, DrawMode::WhiteOnBlack] {
            assert_eq!(mode.bits().count_ones(), 1);
            assert_eq!(DrawMode::from_bits(mode.bits()), Some(mode));
        }
        assert_eq!(DrawMode::from_bits(0b011), None);
        assert_eq!(DrawMode::from_bits(0), None);
    }

    #[test]
    fn test_pass_counts_match_gray_level() {
        for gray in 0..16u8 {
            let dark = (0..15).filter(|&k| DrawMode::BlackOnWhite.drives(gray, k)).count();
            let white = (0..15).filter(|&k| DrawMode::WhiteOnBlack.drives(gray, k)).count();
            assert_eq!(dark, 15 - gray as usize);
            assert_eq!(white, gray as usize);
        }
    }

    #[test]
    fn test_neutral_gray_is_never_driven() {
        for mode in [DrawMode::BlackOnWhite, DrawMode::WhiteOnWhite, DrawMode::WhiteOnBlack] {
            assert!((0..15).all(|k| !mode.drives(mode.neutral_gray(), k)));
        }
    }

    #[test]
    fn test_polarity_from_color() {
        assert_eq!(Polarity::from_color(1), Polarity::Lighten);
        assert_eq!(Polarity::from_color(0), Polarity::Darken);
    }
}
