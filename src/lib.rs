//! Rendering and driving engine for the LilyGo T5 4.7" e-paper panel (ED047TC1).
//!
//! The crate has two halves:
//!
//! 1. a renderer that builds images in a packed 4-bit grayscale
//!    [`Framebuffer`] using pixel, line and shape primitives and
//!    compressed bitmap fonts, and
//! 1. a driver, [`ed047tc1::Epd`], that powers the panel, flash-clears it
//!    and pushes a packed image onto it as a sequence of timed voltage
//!    pulses.
//!
//! ### Usage
//!
//! ```rust,ignore
//! let mut buf = vec![0xFF; epd47::ed047tc1::FRAMEBUFFER_SIZE];
//! let mut fb = Framebuffer::new(&mut buf, WIDTH, HEIGHT)?;
//! fb.fill_circle(480, 270, 100, 0x00);
//! FONT.writeln("Hello", &mut Cursor::new(40, 80), Target::framebuffer(&mut fb))?;
//!
//! let mut epd = Epd::new(interface)?;
//! epd.power_on()?;
//! epd.clear()?;
//! epd.draw_grayscale_image(full_screen(), fb.buffer())?;
//! epd.power_off()?;
//! ```
//!
//! Nothing here allocates the framebuffer; it is borrowed from the
//! caller for the duration of each call. Fonts are read-only assets
//! borrowed the same way.
#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::must_use_candidate)]

extern crate alloc;

pub mod draw;
pub mod ed047tc1;
pub mod font;
pub mod framebuffer;
#[cfg(feature = "graphics")]
pub mod graphics;
pub mod mode;
pub mod pack;

pub use display_interface::DisplayError;

pub use crate::{
    draw::Corners,
    ed047tc1::{full_screen, DisplayInterface, DriverConfig, Epd, PanelInterface, HEIGHT, WIDTH},
    font::{
        text::{Cursor, ImageSink, NoPanel, Target},
        DrawFlags, Font, FontProperties, Glyph, UnicodeInterval,
    },
    framebuffer::{Framebuffer, Rect},
    mode::{DrawMode, Polarity},
};

/// Errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Pass-through from the panel hardware interface
    Interface(DisplayError),
    /// A pixel buffer does not have the size its dimensions require.
    BufferSize {
        /// Bytes required by the given dimensions
        expected: usize,
        /// Bytes actually provided
        actual: usize,
    },
    /// Framebuffers pack two pixels per byte and need an even width.
    OddWidth(u32),
    /// The font's interval table or glyph offsets are inconsistent.
    MalformedFont(&'static str),
    /// A compressed glyph bitmap could not be inflated.
    Decompress,
}

/// Interface errors compare by kind; `DisplayError` has no `PartialEq`.
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Error::Interface(a), Error::Interface(b)) => {
                core::mem::discriminant(a) == core::mem::discriminant(b)
            }
            (
                Error::BufferSize { expected, actual },
                Error::BufferSize {
                    expected: other_expected,
                    actual: other_actual,
                },
            ) => expected == other_expected && actual == other_actual,
            (Error::OddWidth(a), Error::OddWidth(b)) => a == b,
            (Error::MalformedFont(a), Error::MalformedFont(b)) => a == b,
            (Error::Decompress, Error::Decompress) => true,
            _ => false,
        }
    }
}

impl From<DisplayError> for Error {
    fn from(e: DisplayError) -> Self {
        Error::Interface(e)
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Interface(e) => write!(f, "panel interface error: {:?}", e),
            Error::BufferSize { expected, actual } => {
                write!(f, "buffer holds {} bytes, {} required", actual, expected)
            }
            Error::OddWidth(w) => write!(f, "framebuffer width {} is not even", w),
            Error::MalformedFont(why) => write!(f, "malformed font: {}", why),
            Error::Decompress => write!(f, "glyph bitmap failed to inflate"),
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = core::result::Result<T, Error>;
