//! Image preparation
//!
//! Turns 8-bit grayscale pixels into the packed 4-bit layout the
//! framebuffer and [`crate::Epd::draw_image`] consume, and computes the
//! size an image should be scaled to before packing.

use alloc::vec::Vec;

use crate::framebuffer::packed_size;

/// Size an image of `width` × `height` has to be scaled to in order to
/// fit inside `max_width` × `max_height` with its aspect ratio kept.
///
/// Both results are even so rows pack into whole bytes: odd limits are
/// first rounded down. One side always ends up at its limit; the other is
/// truncated and then rounded up to an even number.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let (max_width, max_height) = (max_width & !1, max_height & !1);
    if width == 0 || height == 0 || max_width == 0 || max_height == 0 {
        return (0, 0);
    }
    let ratio = width as f32 / height as f32;
    let max_ratio = max_width as f32 / max_height as f32;
    if ratio < max_ratio {
        let w = (max_height as f32 * ratio) as u32;
        (round_up_even(w).min(max_width), max_height)
    } else {
        let h = (max_width as f32 / ratio) as u32;
        (max_width, round_up_even(h).min(max_height))
    }
}

fn round_up_even(v: u32) -> u32 {
    v + (v & 1)
}

/// Pack one byte per pixel grayscale into two pixels per byte.
///
/// Each value keeps its top four bits. The even (left) pixel goes into
/// the high nibble. Rows of odd width end in a white padding nibble.
/// Missing input pixels are treated as white.
pub fn pack_gray8(pixels: &[u8], width: u32, height: u32) -> Vec<u8> {
    let w = width as usize;
    let mut out = Vec::with_capacity(packed_size(width, height));
    for y in 0..height as usize {
        let row = pixels.get(y * w..(y + 1) * w).unwrap_or(&[]);
        for pair in 0..(w + 1) / 2 {
            let left = row.get(2 * pair).map_or(0x0F, |v| v >> 4);
            let right = row.get(2 * pair + 1).map_or(0x0F, |v| v >> 4);
            out.push(left << 4 | right);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::{Framebuffer, Rect};

    #[test]
    fn test_fit_landscape_to_panel() {
        assert_eq!(fit_within(1920, 1080, 960, 540), (960, 540));
        assert_eq!(fit_within(2000, 1000, 960, 540), (960, 480));
    }

    #[test]
    fn test_fit_portrait_rounds_width_even() {
        // 540 * 0.75 = 405 -> 406
        assert_eq!(fit_within(300, 400, 960, 540), (406, 540));
    }

    #[test]
    fn test_fit_degenerate_input() {
        assert_eq!(fit_within(0, 10, 960, 540), (0, 0));
        assert_eq!(fit_within(10, 10, 1, 540), (0, 0));
    }

    #[test]
    fn test_fit_odd_limits_give_even_sizes() {
        assert_eq!(fit_within(2000, 1000, 961, 1000), (960, 480));
        assert_eq!(fit_within(1000, 2000, 1000, 541), (270, 540));
        assert_eq!(fit_within(333, 333, 7, 7), (6, 6));
    }

    #[test]
    fn test_pack_nibble_order() {
        let packed = pack_gray8(&[0x00, 0xFF, 0x80, 0x7F], 4, 1);
        assert_eq!(packed, vec![0x0F, 0x87]);
    }

    #[test]
    fn test_pack_odd_width_pads_white() {
        let packed = pack_gray8(&[0x10, 0x20, 0x30, 0x40, 0x50, 0x60], 3, 2);
        assert_eq!(packed, vec![0x12, 0x3F, 0x45, 0x6F]);
    }

    #[test]
    fn test_packed_image_lands_in_framebuffer() {
        let gray: Vec<u8> = (0..6u8).map(|v| v * 0x30).collect();
        let packed = pack_gray8(&gray, 3, 2);
        let mut buf = [0u8; 8];
        let mut fb = Framebuffer::new(&mut buf, 4, 4).unwrap();
        fb.copy_image(Rect::new(0, 0, 3, 2), &packed).unwrap();
        for (i, v) in gray.iter().enumerate() {
            let (x, y) = ((i % 3) as i32, (i / 3) as i32);
            assert_eq!(fb.get_pixel(x, y), Some(v >> 4));
        }
    }
}
