//! ED047TC1 e-paper panel driving
//!
//! The 4.7" panel of the LilyGo T5 board, 960×540 pixels, without a
//! controller of its own. Every change of the picture is a sequence of
//! frames; in each frame every pixel of a row is either darkened,
//! lightened or left alone for the time its row is selected.
//!
//! ### Usage
//!
//! 1. wrap the board's pins in a [`DisplayInterface`] (or implement
//!    [`PanelInterface`] for other hardware),
//! 1. create an [`Epd`] and power it on,
//! 1. flash-clear with [`Epd::clear`], then draw packed 4-bit images with
//!    [`Epd::draw_grayscale_image`] or [`Epd::draw_image`],
//! 1. power off between updates; the picture stays without power.
//!
//! Drawing calls made while the panel is powered off are ignored with a
//! warning.

pub mod driver;
pub mod interface;

mod cmd;
mod flag;

pub use driver::{DriverConfig, Epd};
pub use interface::{DisplayInterface, PanelInterface};

use crate::framebuffer::Rect;

/// Display width, pixels horizontally
pub const WIDTH: u32 = 960;

/// Display height, pixels vertically
pub const HEIGHT: u32 = 540;

/// Bytes of drive codes per row, two bits per pixel
pub const LINE_BYTES: usize = WIDTH as usize / 4;

/// Bytes of a packed 4-bit framebuffer covering the whole panel
pub const FRAMEBUFFER_SIZE: usize = WIDTH as usize / 2 * HEIGHT as usize;

/// Number of passes a grayscale image is split into
pub const GRAY_PASSES: usize = 15;

/// The whole panel as an area
pub const fn full_screen() -> Rect {
    Rect::new(0, 0, WIDTH as i32, HEIGHT as i32)
}
