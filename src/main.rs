/*
 *  main.rs
 *
 *  st7735-tft - TFT console over a command/data bus
 *	(c) 2020-26 Stuart Hunter
 *
 *	Demo runner: real panel on spidev or the in-process emulator
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

use std::path::PathBuf;

use anyhow::{Context, Result};
use embedded_hal::digital::OutputPin;
use env_logger::Env;
use log::{info, warn};

use st7735_tft::config::{self, BusConfig, Cli, DisplayConfig};
use st7735_tft::display::drivers::emulator::InstantDelay;
use st7735_tft::display::{Emulator, GlyphSource, NoMask, SerialBus, St7735};

mod demo;

use demo::Demo;

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

fn main() -> Result<()> {
    let (cli, cfg) = config::load().context("loading configuration")?;

    if cli.dump_config {
        println!("{}", config::dump(&cfg)?);
        return Ok(());
    }

    let level = cfg.log_level.clone().unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    info!("st7735-tft - ST7735 panel driver and demo");
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let display = cfg.display.clone().unwrap_or_default();
    match display.bus.clone() {
        Some(BusConfig::Spi { bus, dc_pin, rst_pin, cs_pin, .. }) => {
            run_hardware(&cli, &display, bus, dc_pin, rst_pin, cs_pin)
        }
        Some(BusConfig::Emulated { snapshot }) => run_emulated(&cli, &display, snapshot),
        None => {
            warn!("no bus configured, falling back to the emulator");
            run_emulated(&cli, &display, None)
        }
    }
}

/// Apply the panel-level switches from the config after init
fn configure_panel<B, CS, DC, RST, G>(
    panel: &mut St7735<B, CS, DC, RST, G>,
    display: &DisplayConfig,
) -> Result<()>
where
    B: SerialBus,
    CS: OutputPin,
    DC: OutputPin,
    RST: OutputPin,
    G: GlyphSource,
{
    if display.invert.unwrap_or(false) {
        panel.invert(true)?;
    }
    if display.idle.unwrap_or(false) {
        panel.idle(true)?;
    }
    if let Some(text) = display.text.as_ref() {
        if let Some(c) = text.color {
            panel.set_text_color(c);
        }
        if let Some(c) = text.bg_color {
            panel.set_text_bg_color(c);
        }
        panel.set_wrap(text.wrap.unwrap_or(true));
        panel.set_transparent(text.transparent.unwrap_or(false));
    }
    Ok(())
}

fn run_emulated(cli: &Cli, display: &DisplayConfig, snapshot: Option<PathBuf>) -> Result<()> {
    let geometry = display.geometry();
    let emu = Emulator::new(geometry);
    let mut panel = St7735::new(emu.bus(), emu.pins(), geometry, display.clocks());
    let mut delay = InstantDelay;

    panel.init(&mut delay, &mut NoMask).context("initializing emulated panel")?;
    configure_panel(&mut panel, display)?;

    let mut demo = Demo {
        delay: &mut delay,
        pause_ms: 0,
        text: display.text.clone().unwrap_or_default(),
    };
    demo.run(&mut panel, cli.scene)?;

    {
        let state = emu.lock();
        info!(
            "emulator: {} transactions, {} pixel writes, {} violations",
            state.transactions, state.pixel_writes, state.violations
        );
    }

    if let Some(path) = snapshot {
        emu.save_ppm(&path)
            .with_context(|| format!("writing snapshot {}", path.display()))?;
        info!("snapshot written to {}", path.display());
    }
    Ok(())
}

#[cfg(feature = "linux")]
fn run_hardware(
    cli: &Cli,
    display: &DisplayConfig,
    bus: String,
    dc_pin: u64,
    rst_pin: u64,
    cs_pin: Option<u64>,
) -> Result<()> {
    use st7735_tft::display::drivers::spidev::{open_panel, SpiWiring};

    let wiring = SpiWiring { bus, dc_pin, rst_pin, cs_pin };
    let mut panel = open_panel(&wiring, display.geometry(), display.clocks())
        .with_context(|| format!("opening panel on {}", wiring.bus))?;
    let mut delay = linux_embedded_hal::Delay;

    panel.init(&mut delay, &mut NoMask).context("initializing panel")?;
    configure_panel(&mut panel, display)?;

    let mut demo = Demo {
        delay: &mut delay,
        pause_ms: 2000,
        text: display.text.clone().unwrap_or_default(),
    };
    demo.run(&mut panel, cli.scene)?;

    let _ = panel.release();
    Ok(())
}

#[cfg(not(feature = "linux"))]
fn run_hardware(
    _cli: &Cli,
    _display: &DisplayConfig,
    bus: String,
    _dc_pin: u64,
    _rst_pin: u64,
    _cs_pin: Option<u64>,
) -> Result<()> {
    anyhow::bail!("{} requested but built without the `linux` feature", bus)
}

