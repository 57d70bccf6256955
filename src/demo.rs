/*
 *  demo.rs
 *
 *  st7735-tft - TFT console over a command/data bus
 *  (c) 2020-26 Stuart Hunter
 *
 *  Demo scenes: graphics, text, palette and an stdin console
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

use std::fmt::Write as _;
use std::io::BufRead;

use anyhow::{Context, Result};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{debug, info, warn};

use st7735_tft::config::{Scene, TextConfig};
use st7735_tft::display::color::{pack565, rgb565};
use st7735_tft::display::{CircleAlgorithm, GlyphSource, SerialBus, St7735, TextWriter};

/// Longest console command accepted
const LINE_MAX: usize = 19;

pub struct Demo<'a, D> {
    pub delay: &'a mut D,
    /// Pause between graphics steps; zero on the emulator
    pub pause_ms: u32,
    pub text: TextConfig,
}

impl<D: DelayNs> Demo<'_, D> {
    pub fn run<B, CS, DC, RST, G>(&mut self, panel: &mut St7735<B, CS, DC, RST, G>, scene: Scene) -> Result<()>
    where
        B: SerialBus,
        CS: OutputPin,
        DC: OutputPin,
        RST: OutputPin,
        G: GlyphSource,
    {
        info!("running {:?} scene", scene);
        match scene {
            Scene::Graphics => self.graphics(panel),
            Scene::Text => self.text(panel),
            Scene::Palette => Ok(panel.draw_hsv_palette()?),
            Scene::Console => self.console(panel, std::io::stdin().lock()),
        }
    }

    fn pause(&mut self) {
        if self.pause_ms > 0 {
            self.delay.delay_ms(self.pause_ms);
        }
    }

    fn graphics<B, CS, DC, RST, G>(&mut self, panel: &mut St7735<B, CS, DC, RST, G>) -> Result<()>
    where
        B: SerialBus,
        CS: OutputPin,
        DC: OutputPin,
        RST: OutputPin,
        G: GlyphSource,
    {
        let (w, h) = (i32::from(panel.geometry().width), i32::from(panel.geometry().height));
        let (left, top, right, bottom) = (20, 20, w - 21, h - 21);

        panel.fill_screen(rgb565::BLACK)?;
        panel.draw_hsv_palette()?;
        self.pause();

        panel.fill_rect(left, top, right - left + 1, bottom - top + 1, rgb565::CYAN)?;
        self.pause();

        panel.draw_line(left, top, right, bottom, rgb565::WHITE)?;
        panel.draw_line(right, top, left, bottom, rgb565::WHITE)?;
        self.pause();

        for r in (2..=40).rev().step_by(2) {
            panel.draw_circle(w / 2, h / 2, r, CircleAlgorithm::Michener, rgb565::YELLOW)?;
        }

        let corners = [
            (left, top, pack565(168, 168, 0)),
            (right, top, pack565(0, 0, 168)),
            (right, bottom, pack565(168, 0, 168)),
            (left, bottom, pack565(168, 0, 0)),
        ];
        for (x, y, color) in corners {
            panel.fill_circle(x, y, 10, CircleAlgorithm::Michener, color)?;
        }
        Ok(())
    }

    fn text<B, CS, DC, RST, G>(&mut self, panel: &mut St7735<B, CS, DC, RST, G>) -> Result<()>
    where
        B: SerialBus,
        CS: OutputPin,
        DC: OutputPin,
        RST: OutputPin,
        G: GlyphSource,
    {
        let mid = i32::from(panel.geometry().width) / 2 - 1;

        panel.fill_screen(rgb565::BLACK)?;
        panel.fill_circle(mid, -15, 70, CircleAlgorithm::Michener, pack565(210, 0, 0))?;

        panel.set_text_color(self.text.color.unwrap_or(rgb565::WHITE));
        panel.set_text_bg_color(self.text.bg_color.unwrap_or(rgb565::NAVY));
        panel.set_cursor(0, 0);
        panel.set_wrap(self.text.wrap.unwrap_or(true));

        let mut out = TextWriter::new(&mut *panel);
        write!(out, "This is normal text with the wrap and color pad\n\n")
            .context("writing opaque text")?;

        panel.set_transparent(true);
        let mut out = TextWriter::new(&mut *panel);
        writeln!(out, "And this text with transparent pad").context("writing transparent text")?;

        panel.set_pixel_mode(true);
        panel.set_cursor(13, 126);
        panel.print("custom position 1")?;

        panel.set_text_color(rgb565::GREEN);
        panel.set_cursor(-30, 20);
        panel.print("custom position 2")?;

        panel.set_text_bg_color(rgb565::WHITE);
        panel.set_text_color(rgb565::BLACK);
        panel.set_transparent(self.text.transparent.unwrap_or(false));
        panel.set_cursor(30, 8);
        panel.print("custom position 3")?;
        Ok(())
    }

    fn clear_console<B, CS, DC, RST, G>(&mut self, panel: &mut St7735<B, CS, DC, RST, G>) -> Result<()>
    where
        B: SerialBus,
        CS: OutputPin,
        DC: OutputPin,
        RST: OutputPin,
        G: GlyphSource,
    {
        let bg = panel.cursor_state().text_bg_color;
        let mid = i32::from(panel.geometry().width) / 2 - 1;
        panel.fill_screen(bg)?;
        panel.set_cursor(0, 0);
        panel.fill_circle(mid, -35, 100, CircleAlgorithm::Michener, pack565(92, 0, 0))?;
        Ok(())
    }

    /// Line-oriented shell echoed to the panel
    pub fn console<B, CS, DC, RST, G, R>(&mut self, panel: &mut St7735<B, CS, DC, RST, G>, input: R) -> Result<()>
    where
        B: SerialBus,
        CS: OutputPin,
        DC: OutputPin,
        RST: OutputPin,
        G: GlyphSource,
        R: BufRead,
    {
        let mut inverted = false;

        panel.fill_screen(pack565(0, 0, 168))?;
        panel.set_text_bg_color(pack565(0, 0, 168));
        panel.set_text_color(self.text.color.unwrap_or(rgb565::WHITE));
        panel.set_wrap(self.text.wrap.unwrap_or(true));
        panel.set_transparent(self.text.transparent.unwrap_or(true));
        panel.print("Type 'help'\n")?;

        for line in input.lines() {
            let line = line.context("reading console input")?;
            let cmd: String = line.trim().chars().take(LINE_MAX).collect();
            debug!("console: {:?}", cmd);

            let mut out = TextWriter::new(&mut *panel);
            writeln!(out, ">{}", cmd).context("echoing command")?;

            match cmd.as_str() {
                "" => {}
                "help" => {
                    let mut out = TextWriter::new(&mut *panel);
                    write!(
                        out,
                        "Commands list:\n - help:   this message\n - cls:    clear screen\n - invert: invert colors\n - exit:   quit\n"
                    )
                    .context("writing help")?;
                }
                "cls" => self.clear_console(panel)?,
                "invert" => {
                    inverted = !inverted;
                    panel.invert(inverted)?;
                }
                "exit" => {
                    panel.print("Exiting...\n")?;
                    return Ok(());
                }
                other => {
                    warn!("unknown console command {:?}", other);
                    let mut out = TextWriter::new(&mut *panel);
                    writeln!(out, "Unknown command: {}", other).context("writing error")?;
                }
            }
        }
        Ok(())
    }
}
