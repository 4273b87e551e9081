//! `embedded-graphics` support
//!
//! [`Framebuffer`] is a [`DrawTarget`] with [`Gray4`] pixels, so the
//! primitives, images and mono fonts of `embedded-graphics` can be drawn
//! into the packed buffer next to this crate's own primitives and fonts.

use core::convert::Infallible;

use embedded_graphics::{
    pixelcolor::{Gray4, GrayColor},
    prelude::{DrawTarget, OriginDimensions, Pixel, Size},
    primitives::Rectangle,
};

use crate::framebuffer::Framebuffer;

impl DrawTarget for Framebuffer<'_> {
    type Color = Gray4;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_gray4(point.x, point.y, color.luma());
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        // Spread the 4-bit value so the top bits survive downsampling
        let gray8 = color.luma() * 0x11;
        self.fill_rect(
            area.top_left.x,
            area.top_left.y,
            area.size.width as i32,
            area.size.height as i32,
            gray8,
        );
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color.luma());
        Ok(())
    }
}

impl OriginDimensions for Framebuffer<'_> {
    fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }
}
