/*
 *  display/text.rs
 *
 *  st7735-tft - TFT console over a command/data bus
 *  (c) 2020-26 Stuart Hunter
 *
 *  Text cursor state machine and stream adapters
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

use core::fmt;
use std::io;

use crate::display::color::rgb565;
use crate::display::traits::{CharSink, DisplayGeometry, CELL_HEIGHT, CELL_WIDTH};

const NUL: u8 = 0x00;
const BACKSPACE: u8 = 0x08;
const TAB: u8 = 0x09;
const NEWLINE: u8 = 0x0A;
const CARRIAGE_RETURN: u8 = 0x0D;
const DELETE: u8 = 0x7F;

/// Tab stops every 4 columns (1-based)
const TAB_WIDTH: i32 = 4;

/// Text rendering modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextFlags {
    /// Only set glyph bits are drawn
    pub transparent: bool,
    /// Advance past the last column onto the next row
    pub wrap: bool,
    /// Cursor addressed in pixels instead of cells
    pub pixel_mode: bool,
    /// Control codes render as glyphs
    ///
    /// The stock font has no C0 pictures: codes other than newline and
    /// carriage return draw its `?` replacement, those two draw blank.
    pub symbols: bool,
}

/// Text cursor: logical cell index plus the pixel origin of the next glyph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorState {
    cell_index: i32,
    pixel_x: i32,
    pixel_y: i32,
    last_advance: i32,
    columns: i32,
    rows: i32,
    pub flags: TextFlags,
    pub text_color: u16,
    pub text_bg_color: u16,
}

impl CursorState {
    pub fn new(geometry: DisplayGeometry) -> Self {
        Self {
            cell_index: 0,
            pixel_x: 0,
            pixel_y: 0,
            last_advance: 1,
            columns: geometry.columns().max(1),
            rows: geometry.rows(),
            flags: TextFlags::default(),
            text_color: rgb565::WHITE,
            text_bg_color: rgb565::BLACK,
        }
    }

    /// Back to white on black, flags off, home position
    pub fn reset(&mut self) {
        *self = Self {
            columns: self.columns,
            rows: self.rows,
            ..Self::new(DisplayGeometry::ST7735)
        };
    }

    pub fn cell_index(&self) -> i32 {
        self.cell_index
    }

    /// Top-left pixel of the next glyph
    pub fn pixel(&self) -> (i32, i32) {
        (self.pixel_x, self.pixel_y)
    }

    /// Column and row of the cell cursor
    pub fn cell(&self) -> (i32, i32) {
        (self.cell_index % self.columns, self.cell_index / self.columns)
    }

    pub fn last_advance(&self) -> i32 {
        self.last_advance
    }

    fn max_index(&self) -> i32 {
        self.rows * self.columns
    }

    fn derive_pixels(&mut self) {
        self.pixel_x = (self.cell_index % self.columns) * CELL_WIDTH;
        self.pixel_y = (self.cell_index / self.columns) * CELL_HEIGHT;
    }

    fn move_to_index(&mut self, index: i32) {
        self.cell_index = index.clamp(0, self.max_index());
        self.derive_pixels();
    }

    /// Pixel coordinates in pixel mode, column/row otherwise
    pub fn set_cursor(&mut self, x: i32, y: i32) {
        if self.flags.pixel_mode {
            self.pixel_x = x;
            self.pixel_y = y;
        } else {
            self.move_to_index(y.saturating_mul(self.columns).saturating_add(x));
        }
    }

    /// Move the cursor by `delta` cells
    ///
    /// In cell mode the last column of a row holds the cursor unless wrap is on.
    /// Pixel positions saturate at the ends of `i32`.
    pub fn cursor_upd(&mut self, delta: i32) {
        if self.flags.pixel_mode {
            self.pixel_x = self.pixel_x.saturating_add(delta.saturating_mul(CELL_WIDTH));
            return;
        }
        let (col, _) = self.cell();
        if col < self.columns - 1 || self.flags.wrap {
            self.move_to_index(self.cell_index.saturating_add(delta));
        }
    }

    /// Advance after a rendered glyph
    pub fn advance(&mut self) {
        self.cursor_upd(1);
        self.last_advance = 1;
    }

    /// Whether the glyph cell at the cursor is entirely off the panel
    pub fn cell_off_screen(&self, geometry: DisplayGeometry) -> bool {
        self.pixel_x >= i32::from(geometry.width)
            || self.pixel_y >= i32::from(geometry.height)
            || self.pixel_x.saturating_add(CELL_WIDTH) <= 0
            || self.pixel_y.saturating_add(CELL_HEIGHT) <= 0
    }

    fn column(&self) -> i32 {
        if self.flags.pixel_mode {
            self.pixel_x.div_euclid(CELL_WIDTH)
        } else {
            self.cell().0
        }
    }

    fn back_space(&mut self) {
        let n = self.last_advance;
        if self.flags.pixel_mode {
            self.pixel_x = self.pixel_x.saturating_sub(n * CELL_WIDTH);
        } else {
            self.move_to_index(self.cell_index - n);
        }
        self.last_advance = 1;
    }

    fn tab(&mut self) {
        let column = self.column() + 1;
        let last_stop = ((self.columns - 1) / TAB_WIDTH) * TAB_WIDTH;
        if column < last_stop {
            let delta = TAB_WIDTH - column % TAB_WIDTH;
            self.cursor_upd(delta);
            self.last_advance = delta;
        }
    }

    fn new_line(&mut self) {
        if self.flags.pixel_mode {
            self.pixel_x = 0;
            self.pixel_y = self.pixel_y.saturating_add(CELL_HEIGHT);
        } else {
            let (_, row) = self.cell();
            self.move_to_index((row + 1) * self.columns);
        }
        self.last_advance = 1;
    }

    /// Interpret `c` as a control code
    ///
    /// Returns `true` when `c` was consumed and no glyph should be drawn. In
    /// symbol mode nothing is a control code.
    pub fn apply_control(&mut self, c: u8) -> bool {
        if self.flags.symbols {
            return false;
        }
        match c {
            NUL | CARRIAGE_RETURN => {}
            BACKSPACE => self.back_space(),
            TAB => self.tab(),
            NEWLINE => self.new_line(),
            0x01..=0x1F | DELETE => {}
            _ => return false,
        }
        true
    }
}

/// Latin-1 code of `ch`, `?` past U+00FF
pub fn latin1(ch: char) -> u8 {
    u8::try_from(u32::from(ch)).unwrap_or(b'?')
}

/// `core::fmt::Write` / `std::io::Write` over any [`CharSink`]
///
/// Characters beyond U+00FF are shown as `?`.
pub struct TextWriter<S> {
    sink: S,
}

impl<S: CharSink> TextWriter<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn into_inner(self) -> S {
        self.sink
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

impl<S: CharSink> fmt::Write for TextWriter<S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for ch in s.chars() {
            self.sink.put_char(latin1(ch)).map_err(|_| fmt::Error)?;
        }
        Ok(())
    }
}

impl<S> io::Write for TextWriter<S>
where
    S: CharSink,
    S::Error: fmt::Debug,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &byte in buf {
            self.sink
                .put_char(byte)
                .map_err(|e| io::Error::other(format!("{:?}", e)))?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor() -> CursorState {
        CursorState::new(DisplayGeometry::ST7735)
    }

    #[test]
    fn test_last_column_clamps_without_wrap() {
        let mut c = cursor();
        c.set_cursor(20, 0);
        c.advance();
        assert_eq!(c.cell(), (20, 0));
        assert_eq!(c.pixel(), (120, 0));
    }

    #[test]
    fn test_last_column_wraps_with_wrap() {
        let mut c = cursor();
        c.flags.wrap = true;
        c.set_cursor(20, 0);
        c.advance();
        assert_eq!(c.cell(), (0, 1));
        assert_eq!(c.pixel(), (0, 8));
    }

    #[test]
    fn test_cell_index_stays_in_range() {
        let mut c = cursor();
        c.flags.wrap = true;
        c.set_cursor(20, 19);
        c.advance();
        c.advance();
        assert_eq!(c.cell_index(), 21 * 20);
        assert!(c.cell_off_screen(DisplayGeometry::ST7735));

        c.set_cursor(-5, 0);
        assert_eq!(c.cell_index(), 0);
    }

    #[test]
    fn test_tab_stops() {
        let mut c = cursor();
        assert!(c.apply_control(TAB));
        assert_eq!(c.cell(), (3, 0));
        c.apply_control(TAB);
        assert_eq!(c.cell(), (7, 0));

        c.set_cursor(5, 0);
        c.apply_control(TAB);
        assert_eq!(c.cell(), (7, 0));
        assert_eq!(c.last_advance(), 2);

        // no stop past column 19
        c.set_cursor(19, 0);
        c.apply_control(TAB);
        assert_eq!(c.cell(), (19, 0));
    }

    #[test]
    fn test_backspace_undoes_tab() {
        let mut c = cursor();
        c.set_cursor(4, 2);
        c.apply_control(TAB);
        assert_eq!(c.cell(), (7, 2));
        c.apply_control(BACKSPACE);
        assert_eq!(c.cell(), (4, 2));
        c.apply_control(BACKSPACE);
        assert_eq!(c.cell(), (3, 2));
    }

    #[test]
    fn test_newline_and_noops() {
        let mut c = cursor();
        c.set_cursor(7, 3);
        assert!(c.apply_control(CARRIAGE_RETURN));
        assert!(c.apply_control(NUL));
        assert!(c.apply_control(0x1B));
        assert!(c.apply_control(DELETE));
        assert_eq!(c.cell(), (7, 3));

        c.apply_control(NEWLINE);
        assert_eq!(c.cell(), (0, 4));
        assert!(!c.apply_control(b'A'));
    }

    #[test]
    fn test_symbols_disable_controls() {
        let mut c = cursor();
        c.flags.symbols = true;
        assert!(!c.apply_control(NEWLINE));
        assert!(!c.apply_control(NUL));
        assert_eq!(c.cell_index(), 0);
    }

    #[test]
    fn test_pixel_mode() {
        let mut c = cursor();
        c.flags.pixel_mode = true;
        c.set_cursor(125, 3);
        c.advance();
        assert_eq!(c.pixel(), (131, 3));
        assert_eq!(c.cell_index(), 0);
        assert!(c.cell_off_screen(DisplayGeometry::ST7735));

        c.apply_control(NEWLINE);
        assert_eq!(c.pixel(), (0, 11));

        c.set_cursor(-6, 0);
        assert!(c.cell_off_screen(DisplayGeometry::ST7735));
        c.set_cursor(-5, 0);
        assert!(!c.cell_off_screen(DisplayGeometry::ST7735));
    }

    #[test]
    fn test_pixel_cursor_saturates() {
        let mut c = cursor();
        c.flags.pixel_mode = true;
        c.set_cursor(i32::MAX - 2, i32::MAX - 3);
        assert!(c.cell_off_screen(DisplayGeometry::ST7735));
        c.advance();
        assert_eq!(c.pixel(), (i32::MAX, i32::MAX - 3));
        c.cursor_upd(i32::MAX);
        assert_eq!(c.pixel().0, i32::MAX);
        c.apply_control(NEWLINE);
        assert_eq!(c.pixel(), (0, i32::MAX));

        c.set_cursor(i32::MIN + 1, i32::MIN);
        assert!(c.cell_off_screen(DisplayGeometry::ST7735));
        c.apply_control(BACKSPACE);
        assert_eq!(c.pixel(), (i32::MIN, i32::MIN));
        c.cursor_upd(i32::MIN);
        assert_eq!(c.pixel().0, i32::MIN);
    }

    #[test]
    fn test_controls_act_while_off_screen() {
        let mut c = cursor();
        c.flags.pixel_mode = true;
        c.set_cursor(200, 0);
        assert!(c.cell_off_screen(DisplayGeometry::ST7735));
        assert!(c.apply_control(NEWLINE));
        assert_eq!(c.pixel(), (0, 8));
        assert!(!c.cell_off_screen(DisplayGeometry::ST7735));
    }

    #[test]
    fn test_latin1_mapping() {
        assert_eq!(latin1('A'), b'A');
        assert_eq!(latin1('\u{ff}'), 0xFF);
        assert_eq!(latin1('\u{100}'), b'?');
    }

    #[test]
    fn test_reset_keeps_grid() {
        let mut c = CursorState::new(DisplayGeometry::new(60, 40));
        c.flags.wrap = true;
        c.text_color = 0x1234;
        c.set_cursor(3, 2);
        c.reset();
        assert_eq!(c, CursorState::new(DisplayGeometry::new(60, 40)));
    }

    #[derive(Default)]
    struct Collect(Vec<u8>);

    impl CharSink for Collect {
        type Error = ();

        fn put_char(&mut self, c: u8) -> Result<(), ()> {
            self.0.push(c);
            Ok(())
        }
    }

    #[test]
    fn test_writer_maps_wide_chars() {
        use core::fmt::Write as _;

        let mut w = TextWriter::new(Collect::default());
        write!(w, "a\u{e9}\u{20ac}{}", 7).unwrap();
        assert_eq!(w.into_inner().0, vec![b'a', 0xE9, b'?', b'7']);
    }

    #[test]
    fn test_writer_passes_bytes_through() {
        use std::io::Write as _;

        let mut w = TextWriter::new(Collect::default());
        w.write_all(b"\tx\n").unwrap();
        assert_eq!(w.get_mut().0, b"\tx\n".to_vec());
    }
}
