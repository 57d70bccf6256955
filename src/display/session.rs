/*
 *  display/session.rs
 *
 *  st7735-tft - TFT console over a command/data bus
 *  (c) 2020-26 Stuart Hunter
 *
 *  The device session: owns bus, lines, geometry and text cursor
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

use embedded_graphics::{
    pixelcolor::{raw::RawU16, Rgb565},
    prelude::*,
    primitives::Rectangle,
};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{debug, info};

use crate::display::color::{hsv_to_rgb, pack565};
use crate::display::command::{Command, PixelFormat, GAMMA_CURVE_1};
use crate::display::error::DisplayError;
use crate::display::font::{GlyphSource, MonoGlyphs};
use crate::display::protocol::{AddressWindow, BusClocks, Protocol};
use crate::display::raster::{CircleAlgorithm, Raster};
use crate::display::text::{latin1, CursorState, TextFlags};
use crate::display::traits::{
    CharSink, DisplayGeometry, InterruptMask, SerialBus, CELL_HEIGHT, CELL_WIDTH,
};

/// Reset pulse: high, low, high (ms)
const RESET_HIGH_MS: u32 = 120;
const RESET_LOW_MS: u32 = 20;
const RESET_SETTLE_MS: u32 = 150;

/// Settle time after SLPOUT / DISPON
const WAKE_MS: u32 = 120;

/// Control lines of one panel
#[derive(Debug)]
pub struct Pins<CS, DC, RST> {
    pub cs: CS,
    pub dc: DC,
    pub rst: RST,
}

/// One ST7735 panel
///
/// All drawing is clipped to the panel; a shape entirely off-screen costs no
/// bus traffic beyond the chip-select bracket.
pub struct St7735<B, CS, DC, RST, G = MonoGlyphs> {
    protocol: Protocol<B, CS, DC>,
    rst: RST,
    geometry: DisplayGeometry,
    cursor: CursorState,
    glyphs: G,
}

impl<B, CS, DC, RST> St7735<B, CS, DC, RST, MonoGlyphs>
where
    B: SerialBus,
    CS: OutputPin,
    DC: OutputPin,
    RST: OutputPin,
{
    /// Session with the built-in 5x7 font
    pub fn new(bus: B, pins: Pins<CS, DC, RST>, geometry: DisplayGeometry, clocks: BusClocks) -> Self {
        Self::with_glyphs(bus, pins, geometry, clocks, MonoGlyphs::new())
    }
}

impl<B, CS, DC, RST, G> St7735<B, CS, DC, RST, G>
where
    B: SerialBus,
    CS: OutputPin,
    DC: OutputPin,
    RST: OutputPin,
    G: GlyphSource,
{
    pub fn with_glyphs(
        bus: B,
        pins: Pins<CS, DC, RST>,
        geometry: DisplayGeometry,
        clocks: BusClocks,
        glyphs: G,
    ) -> Self {
        debug!(
            "ST7735 session {}x{}, write {} Hz, read {} Hz",
            geometry.width, geometry.height, clocks.write_hz, clocks.read_hz
        );
        Self {
            protocol: Protocol::new(bus, pins.cs, pins.dc, clocks),
            rst: pins.rst,
            geometry,
            cursor: CursorState::new(geometry),
            glyphs,
        }
    }

    /// Reset pulse and configuration script
    ///
    /// Runs with interrupts masked through `mask`; the previous state is put
    /// back whether or not the script succeeds.
    pub fn init<D, M>(&mut self, delay: &mut D, mask: &mut M) -> Result<(), DisplayError>
    where
        D: DelayNs,
        M: InterruptMask,
    {
        let was_enabled = mask.disable();
        let result = self.run_init(delay);
        mask.restore(was_enabled);

        result.map_err(|e| DisplayError::InitializationFailed(e.to_string()))?;
        info!("ST7735 {}x{} initialized", self.geometry.width, self.geometry.height);
        Ok(())
    }

    fn run_init<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), DisplayError> {
        self.protocol.park()?;

        self.set_reset(true)?;
        delay.delay_ms(RESET_HIGH_MS);
        self.set_reset(false)?;
        delay.delay_ms(RESET_LOW_MS);
        self.set_reset(true)?;
        delay.delay_ms(RESET_SETTLE_MS);

        self.cursor.reset();

        self.protocol.send(Command::SleepOut)?;
        delay.delay_ms(WAKE_MS);
        self.protocol.send(Command::DisplayOn)?;
        delay.delay_ms(WAKE_MS);

        let full = AddressWindow::full(self.geometry);
        self.protocol.transaction(|p| {
            p.write_command_data(Command::PixelFormat, &[PixelFormat::Rgb565 as u8])?;
            let columns = u32::from(full.x_end());
            p.write_command_data(Command::ColumnAddr, &columns.to_be_bytes())?;
            let rows = u32::from(full.y_end());
            p.write_command_data(Command::RowAddr, &rows.to_be_bytes())?;
            p.write_command_data(Command::GammaSet, &[GAMMA_CURVE_1])
        })
    }

    fn set_reset(&mut self, high: bool) -> Result<(), DisplayError> {
        let result = if high { self.rst.set_high() } else { self.rst.set_low() };
        result.map_err(|e| DisplayError::pin("RST", e))
    }

    /// Give back the bus and the three lines
    pub fn release(self) -> (B, Pins<CS, DC, RST>) {
        info!("ST7735 session released");
        let (bus, cs, dc) = self.protocol.release();
        (bus, Pins { cs, dc, rst: self.rst })
    }

    pub fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    /// Sleep in (booster off) or sleep out
    pub fn sleep(&mut self, on: bool) -> Result<(), DisplayError> {
        info!("sleep {}", if on { "in" } else { "out" });
        self.protocol.send(Command::toggle(on, Command::SleepOut, Command::SleepIn))
    }

    pub fn display_on(&mut self, on: bool) -> Result<(), DisplayError> {
        info!("display {}", if on { "on" } else { "off" });
        self.protocol.send(Command::toggle(on, Command::DisplayOff, Command::DisplayOn))
    }

    pub fn invert(&mut self, on: bool) -> Result<(), DisplayError> {
        info!("invert {}", on);
        self.protocol.invert(on)
    }

    /// 8-color idle mode
    pub fn idle(&mut self, on: bool) -> Result<(), DisplayError> {
        info!("idle {}", on);
        self.protocol.idle(on)
    }

    /// Advisory 32-bit read of RDDID / RDDST; see [`Protocol::read_info`]
    pub fn read_info(&mut self, cmd: Command) -> Result<u32, DisplayError> {
        self.protocol.read_info(cmd)
    }

    /// Advisory 8-bit read; see [`Protocol::read_u8`]
    pub fn read_u8(&mut self, cmd: Command) -> Result<u8, DisplayError> {
        self.protocol.read_u8(cmd)
    }

    /// Run `body` on a clipped rasterizer inside one chip-select bracket
    fn raster<F>(&mut self, body: F) -> Result<(), DisplayError>
    where
        F: FnOnce(&mut Raster<'_, Protocol<B, CS, DC>>) -> Result<(), DisplayError>,
    {
        let geometry = self.geometry;
        self.protocol.transaction(|p| body(&mut Raster::new(p, geometry)))
    }

    pub fn draw_pixel(&mut self, x: i32, y: i32, color: u16) -> Result<(), DisplayError> {
        self.raster(|r| r.pixel(x, y, color))
    }

    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u16) -> Result<(), DisplayError> {
        self.raster(|r| r.line(x0, y0, x1, y1, color))
    }

    /// Horizontal run of `len` pixels; negative runs leftwards
    pub fn draw_hline(&mut self, x: i32, y: i32, len: i32, color: u16) -> Result<(), DisplayError> {
        self.raster(|r| r.hline(x, y, len, color))
    }

    /// Vertical run of `len` pixels; negative runs upwards
    pub fn draw_vline(&mut self, x: i32, y: i32, len: i32, color: u16) -> Result<(), DisplayError> {
        self.raster(|r| r.vline(x, y, len, color))
    }

    pub fn draw_circle(
        &mut self,
        x: i32,
        y: i32,
        radius: i32,
        algorithm: CircleAlgorithm,
        color: u16,
    ) -> Result<(), DisplayError> {
        self.raster(|r| r.circle(x, y, radius, algorithm, color))
    }

    pub fn fill_circle(
        &mut self,
        x: i32,
        y: i32,
        radius: i32,
        algorithm: CircleAlgorithm,
        color: u16,
    ) -> Result<(), DisplayError> {
        self.raster(|r| r.fill_circle(x, y, radius, algorithm, color))
    }

    pub fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u16) -> Result<(), DisplayError> {
        self.raster(|r| r.rect(x, y, w, h, color))
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u16) -> Result<(), DisplayError> {
        self.raster(|r| r.fill_rect(x, y, w, h, color))
    }

    pub fn draw_triangle(
        &mut self,
        a: (i32, i32),
        b: (i32, i32),
        c: (i32, i32),
        color: u16,
    ) -> Result<(), DisplayError> {
        self.raster(|r| r.triangle(a, b, c, color))
    }

    pub fn fill_triangle(
        &mut self,
        a: (i32, i32),
        b: (i32, i32),
        c: (i32, i32),
        color: u16,
    ) -> Result<(), DisplayError> {
        self.raster(|r| r.fill_triangle(a, b, c, color))
    }

    pub fn fill_screen(&mut self, color: u16) -> Result<(), DisplayError> {
        self.raster(|r| r.fill_screen(color))
    }

    /// Hue down the rows; saturation ramp on the left half, value ramp on the right
    pub fn draw_hsv_palette(&mut self) -> Result<(), DisplayError> {
        let width = u32::from(self.geometry.width);
        let height = u32::from(self.geometry.height);
        let half = (width / 2).max(1);

        let colors = (0..height).flat_map(move |row| {
            let hue = (row * 360 / height) as u16;
            (0..width).map(move |col| {
                let rgb = if col < width / 2 {
                    hsv_to_rgb(hue, (col * 100 / half) as u8, 100)
                } else {
                    let step = col - width / 2;
                    let fall = (step * 100).div_ceil(half).min(100);
                    hsv_to_rgb(hue, 100, (100 - fall) as u8)
                };
                pack565(rgb.red, rgb.green, rgb.blue)
            })
        });

        let full = AddressWindow::full(self.geometry);
        self.protocol.transaction(|p| {
            p.set_address_window(full)?;
            p.write_pixels(colors)
        })
    }

    /// Render one character at the cursor and advance
    ///
    /// Control codes act even while the cursor is off the panel.
    pub fn put_char(&mut self, c: u8) -> Result<(), DisplayError> {
        if self.cursor.apply_control(c) {
            return Ok(());
        }
        if !self.cursor.cell_off_screen(self.geometry) {
            self.render_glyph(c)?;
        }
        self.cursor.advance();
        Ok(())
    }

    /// `put_char` over every character of `s`, Latin-1 mapped
    ///
    /// Characters past U+00FF print as `?`, one cell each.
    pub fn print(&mut self, s: &str) -> Result<(), DisplayError> {
        s.chars().try_for_each(|ch| self.put_char(latin1(ch)))
    }

    fn render_glyph(&mut self, c: u8) -> Result<(), DisplayError> {
        let glyph = self.glyphs.glyph(c);
        let (x0, y0) = self.cursor.pixel();
        let fg = self.cursor.text_color;
        let bg = self.cursor.text_bg_color;
        let geometry = self.geometry;

        if self.cursor.flags.transparent {
            return self.protocol.transaction(|p| {
                let mut raster = Raster::new(p, geometry);
                for (dy, bits) in glyph.iter().enumerate() {
                    for dx in 0..CELL_WIDTH {
                        if bits & (1 << dx) != 0 {
                            raster.pixel(x0 + dx, y0 + dy as i32, fg)?;
                        }
                    }
                }
                Ok(())
            });
        }

        let Some(window) = AddressWindow::clipped(x0, y0, CELL_WIDTH, CELL_HEIGHT, geometry) else {
            return Ok(());
        };
        let colors = (window.y..=window.y_end()).flat_map(move |y| {
            let bits = glyph[(i32::from(y) - y0) as usize];
            (window.x..=window.x_end()).map(move |x| {
                if bits & (1 << (i32::from(x) - x0)) != 0 { fg } else { bg }
            })
        });
        self.protocol.transaction(|p| {
            p.set_address_window(window)?;
            p.write_pixels(colors)
        })
    }

    /// Column/row in cell mode, pixels in pixel mode
    pub fn set_cursor(&mut self, x: i32, y: i32) {
        self.cursor.set_cursor(x, y);
    }

    /// Logical cell index of the cursor
    pub fn cursor(&self) -> i32 {
        self.cursor.cell_index()
    }

    pub fn cursor_x(&self) -> i32 {
        self.cursor.pixel().0
    }

    pub fn cursor_y(&self) -> i32 {
        self.cursor.pixel().1
    }

    pub fn cursor_state(&self) -> &CursorState {
        &self.cursor
    }

    pub fn text_flags(&self) -> TextFlags {
        self.cursor.flags
    }

    pub fn set_text_color(&mut self, color: u16) {
        self.cursor.text_color = color;
    }

    pub fn set_text_bg_color(&mut self, color: u16) {
        self.cursor.text_bg_color = color;
    }

    pub fn set_transparent(&mut self, on: bool) {
        self.cursor.flags.transparent = on;
    }

    pub fn set_wrap(&mut self, on: bool) {
        self.cursor.flags.wrap = on;
    }

    pub fn set_pixel_mode(&mut self, on: bool) {
        self.cursor.flags.pixel_mode = on;
    }

    /// Render control codes as glyphs instead of acting on them
    ///
    /// With the built-in [`MonoGlyphs`] most C0 codes show the font's `?`
    /// replacement; a [`GlyphSource`] with real pictures can be supplied.
    pub fn set_symbols(&mut self, on: bool) {
        self.cursor.flags.symbols = on;
    }
}

impl<B, CS, DC, RST, G> CharSink for St7735<B, CS, DC, RST, G>
where
    B: SerialBus,
    CS: OutputPin,
    DC: OutputPin,
    RST: OutputPin,
    G: GlyphSource,
{
    type Error = DisplayError;

    fn put_char(&mut self, c: u8) -> Result<(), DisplayError> {
        St7735::put_char(self, c)
    }
}

impl<B, CS, DC, RST, G> St7735<B, CS, DC, RST, G> {
    /// Clip an embedded-graphics rectangle, whose size is unsigned
    fn clip_area(&self, area: &Rectangle) -> Option<AddressWindow> {
        AddressWindow::clipped_wide(
            i64::from(area.top_left.x),
            i64::from(area.top_left.y),
            i64::from(area.size.width),
            i64::from(area.size.height),
            self.geometry,
        )
    }
}

impl<B, CS, DC, RST, G> OriginDimensions for St7735<B, CS, DC, RST, G> {
    fn size(&self) -> Size {
        Size::new(u32::from(self.geometry.width), u32::from(self.geometry.height))
    }
}

impl<B, CS, DC, RST, G> DrawTarget for St7735<B, CS, DC, RST, G>
where
    B: SerialBus,
    CS: OutputPin,
    DC: OutputPin,
    RST: OutputPin,
    G: GlyphSource,
{
    type Color = Rgb565;
    type Error = DisplayError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.raster(|r| {
            for Pixel(coord, color) in pixels {
                r.pixel(coord.x, coord.y, RawU16::from(color).into_inner())?;
            }
            Ok(())
        })
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        let Some(window) = self.clip_area(area) else {
            return Ok(());
        };

        // colors arrive row-major over the whole area; keep the clipped part
        let visible = area.points().zip(colors).filter_map(move |(p, c)| {
            let inside = p.x >= i32::from(window.x)
                && p.x <= i32::from(window.x_end())
                && p.y >= i32::from(window.y)
                && p.y <= i32::from(window.y_end());
            inside.then(|| RawU16::from(c).into_inner())
        });

        self.protocol.transaction(|p| {
            p.set_address_window(window)?;
            p.write_pixels(visible)
        })
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let raw = RawU16::from(color).into_inner();
        let Some(window) = self.clip_area(area) else {
            return Ok(());
        };
        self.protocol.transaction(|p| p.fill_window(window, raw))
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill_screen(RawU16::from(color).into_inner())
    }
}
