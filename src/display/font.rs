/*
 *  display/font.rs
 *
 *  st7735-tft - TFT console over a command/data bus
 *  (c) 2020-26 Stuart Hunter
 *
 *  6x8 glyph cells for the text engine
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use core::convert::Infallible;

use embedded_graphics::{
    mono_font::{iso_8859_1::FONT_5X7, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};

use crate::display::traits::{CELL_HEIGHT, CELL_WIDTH};

/// One glyph: 8 rows, bit `i` of a row is column `i`
pub type Glyph = [u8; 8];

/// Character code to glyph bitmap lookup
pub trait GlyphSource {
    fn glyph(&self, code: u8) -> Glyph;
}

impl<G: GlyphSource + ?Sized> GlyphSource for &G {
    fn glyph(&self, code: u8) -> Glyph {
        G::glyph(self, code)
    }
}

/// Render target for a single glyph cell
struct GlyphCell(Glyph);

impl OriginDimensions for GlyphCell {
    fn size(&self) -> Size {
        Size::new(CELL_WIDTH as u32, CELL_HEIGHT as u32)
    }
}

impl DrawTarget for GlyphCell {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            if color.is_on()
                && (0..CELL_WIDTH).contains(&coord.x)
                && (0..CELL_HEIGHT).contains(&coord.y)
            {
                self.0[coord.y as usize] |= 1 << coord.x;
            }
        }
        Ok(())
    }
}

/// Full 8-bit table rasterized from the ISO-8859-1 5x7 mono font
///
/// Codes the font has no glyph for get its `?` replacement. That covers the
/// C0 controls except newline and carriage return, which render blank.
#[derive(Clone)]
pub struct MonoGlyphs {
    table: Box<[Glyph; 256]>,
}

impl MonoGlyphs {
    pub fn new() -> Self {
        let style = MonoTextStyle::new(&FONT_5X7, BinaryColor::On);
        let mut table = Box::new([[0u8; 8]; 256]);

        for (code, slot) in table.iter_mut().enumerate() {
            let mut utf8 = [0u8; 4];
            let text = char::from(code as u8).encode_utf8(&mut utf8);
            let mut cell = GlyphCell([0; 8]);
            let Ok(_) = Text::with_baseline(text, Point::zero(), style, Baseline::Top).draw(&mut cell);
            *slot = cell.0;
        }

        Self { table }
    }
}

impl Default for MonoGlyphs {
    fn default() -> Self {
        Self::new()
    }
}

impl GlyphSource for MonoGlyphs {
    fn glyph(&self, code: u8) -> Glyph {
        self.table[usize::from(code)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_is_blank() {
        let glyphs = MonoGlyphs::new();
        assert_eq!(glyphs.glyph(b' '), [0; 8]);
    }

    #[test]
    fn test_glyphs_fit_the_5x7_box() {
        let glyphs = MonoGlyphs::new();
        for code in 0..=255u8 {
            let g = glyphs.glyph(code);
            assert_eq!(g[7], 0, "code {:#04x} uses the spacing row", code);
            for row in g {
                assert_eq!(row & !0x1F, 0, "code {:#04x} uses the spacing column", code);
            }
        }
    }

    #[test]
    fn test_printables_are_distinct() {
        let glyphs = MonoGlyphs::new();
        assert_ne!(glyphs.glyph(b'A'), [0; 8]);
        assert_ne!(glyphs.glyph(b'A'), glyphs.glyph(b'B'));
        assert_ne!(glyphs.glyph(b'0'), glyphs.glyph(b'O'));
    }

    #[test]
    fn test_controls_use_the_replacement_glyph() {
        let glyphs = MonoGlyphs::new();
        let replacement = glyphs.glyph(b'?');
        for code in (0x01..=0x1Fu8).filter(|&c| c != b'\n' && c != b'\r') {
            assert_eq!(glyphs.glyph(code), replacement, "code {:#04x}", code);
        }
        assert_eq!(glyphs.glyph(b'\n'), [0; 8]);
    }
}
