/*
 *  vframebuf.rs
 *
 *  st7735-tft - TFT console over a command/data bus
 *	(c) 2020-26 Stuart Hunter
 *
 *	Runtime-sized framebuffer backing the panel emulator
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use core::convert::Infallible;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::PixelColor;
use embedded_graphics::prelude::*;

/// A runtime-sized framebuffer for embedded-graphics.
#[derive(Debug, Clone, PartialEq)]
pub struct VarFrameBuf<C: PixelColor> {
    buf: Vec<C>,
    w: usize,
    h: usize,
}

impl<C: PixelColor> VarFrameBuf<C> {
    pub fn new(width: u32, height: u32, fill: C) -> Self {
        let (w, h) = (width as usize, height as usize);
        Self { buf: vec![fill; w * h], w, h }
    }

    pub fn width(&self) -> usize { self.w }
    pub fn height(&self) -> usize { self.h }

    /// Immutable raw access, row-major
    pub fn as_slice(&self) -> &[C] { &self.buf }

    /// Clear to a color
    pub fn clear_color(&mut self, color: C) {
        self.buf.fill(color);
    }

    pub fn pixel(&self, p: Point) -> Option<C> {
        self.idx(p).map(|i| self.buf[i])
    }

    /// Store one pixel; out-of-bounds points are dropped
    pub fn set_pixel(&mut self, p: Point, color: C) {
        if let Some(i) = self.idx(p) {
            self.buf[i] = color;
        }
    }

    /// Positions where two buffers of the same size differ
    pub fn diff(&self, other: &Self) -> Vec<Point> {
        self.buf
            .iter()
            .zip(&other.buf)
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| Point::new((i % self.w) as i32, (i / self.w) as i32))
            .collect()
    }

    /// Map (x,y) to linear index; returns None if out of bounds
    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if p.x >= 0 && p.y >= 0 {
            let (x, y) = (p.x as usize, p.y as usize);
            if x < self.w && y < self.h {
                return Some(y * self.w + x);
            }
        }
        None
    }
}

impl<C: PixelColor> OriginDimensions for VarFrameBuf<C> {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl<C: PixelColor> DrawTarget for VarFrameBuf<C> {
    type Color = C;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            self.set_pixel(p, c);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.clear_color(color);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::pixelcolor::Rgb565;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    #[test]
    fn test_drawing_is_clipped() {
        let mut fb = VarFrameBuf::new(4, 3, Rgb565::BLACK);
        Rectangle::new(Point::new(2, 1), Size::new(5, 5))
            .into_styled(PrimitiveStyle::with_fill(Rgb565::RED))
            .draw(&mut fb)
            .unwrap();

        assert_eq!(fb.pixel(Point::new(3, 2)), Some(Rgb565::RED));
        assert_eq!(fb.pixel(Point::new(1, 1)), Some(Rgb565::BLACK));
        assert_eq!(fb.pixel(Point::new(4, 0)), None);
        assert_eq!(fb.as_slice().iter().filter(|&&c| c == Rgb565::RED).count(), 4);
    }

    #[test]
    fn test_diff_reports_positions() {
        let a = VarFrameBuf::new(3, 2, Rgb565::BLACK);
        let mut b = a.clone();
        b.set_pixel(Point::new(2, 1), Rgb565::WHITE);
        assert_eq!(a.diff(&b), vec![Point::new(2, 1)]);
        b.clear(Rgb565::BLACK).unwrap();
        assert!(a.diff(&b).is_empty());
    }
}
