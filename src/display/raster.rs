/*
 *  display/raster.rs
 *
 *  st7735-tft - TFT console over a command/data bus
 *  (c) 2020-26 Stuart Hunter
 *
 *  Clipped rasterization of lines, circles, rectangles and triangles
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

use embedded_hal::digital::OutputPin;

use crate::display::error::DisplayError;
use crate::display::protocol::{AddressWindow, Protocol};
use crate::display::traits::{DisplayGeometry, SerialBus};

/// Receiver of clipped solid runs
///
/// Every window handed to `fill_window` is non-empty and on-screen.
pub trait RunSink {
    type Error;

    fn fill_window(&mut self, window: AddressWindow, color: u16) -> Result<(), Self::Error>;
}

impl<B, CS, DC> RunSink for Protocol<B, CS, DC>
where
    B: SerialBus,
    CS: OutputPin,
    DC: OutputPin,
{
    type Error = DisplayError;

    fn fill_window(&mut self, window: AddressWindow, color: u16) -> Result<(), DisplayError> {
        Protocol::fill_window(self, window, color)
    }
}

/// Circle outline algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CircleAlgorithm {
    /// Quadrant walk, decision seeded at `1 - 2r`
    Bresenham,
    /// Octant walk, decision seeded at `3 - 2r`
    #[default]
    Michener,
}

/// Points of a Bresenham line, major axis ascending
///
/// The walk runs in `i64` so endpoints anywhere in `i32` are fine.
#[derive(Debug, Clone)]
pub struct LinePoints {
    x: i64,
    x_end: i64,
    y: i64,
    dx: i64,
    dy: i64,
    err: i64,
    y_step: i64,
    steep: bool,
}

impl LinePoints {
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        let (mut x0, mut y0) = (i64::from(x0), i64::from(y0));
        let (mut x1, mut y1) = (i64::from(x1), i64::from(y1));
        let steep = (y1 - y0).abs() > (x1 - x0).abs();
        if steep {
            core::mem::swap(&mut x0, &mut y0);
            core::mem::swap(&mut x1, &mut y1);
        }
        if x0 > x1 {
            core::mem::swap(&mut x0, &mut x1);
            core::mem::swap(&mut y0, &mut y1);
        }

        let dx = x1 - x0;
        Self {
            x: x0,
            x_end: x1,
            y: y0,
            dx,
            dy: (y1 - y0).abs(),
            err: dx / 2,
            y_step: if y0 < y1 { 1 } else { -1 },
            steep,
        }
    }

    /// True when the major axis is y
    pub fn is_steep(&self) -> bool {
        self.steep
    }

    /// Restrict the walk to major-axis positions `lo..=hi`
    ///
    /// The points that remain are the ones the full walk would give there.
    pub fn clamp_major(mut self, lo: i64, hi: i64) -> Self {
        self.seek(lo);
        self.x_end = self.x_end.min(hi);
        self
    }

    /// Jump forward so the next point sits at `major`
    fn seek(&mut self, major: i64) {
        let k = i128::from(major) - i128::from(self.x);
        if k <= 0 {
            return;
        }
        // err stays in 0..dx; the minor axis steps once per dx of accumulated dy
        let (dx, dy, err) = (i128::from(self.dx), i128::from(self.dy), i128::from(self.err));
        let owed = k * dy - err;
        let steps = if owed <= 0 { 0 } else { (owed + dx - 1) / dx };
        self.err = (err - k * dy + steps * dx) as i64;
        self.y += self.y_step * steps as i64;
        self.x = major;
    }
}

impl Iterator for LinePoints {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.x > self.x_end {
            return None;
        }
        // both coordinates lie between the endpoints
        let point = if self.steep {
            (self.y as i32, self.x as i32)
        } else {
            (self.x as i32, self.y as i32)
        };

        self.err -= self.dy;
        if self.err < 0 {
            self.y += self.y_step;
            self.err += self.dx;
        }
        self.x += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = usize::try_from(self.x_end - self.x + 1).unwrap_or(0);
        (left, Some(left))
    }
}

impl ExactSizeIterator for LinePoints {}

/// Walk one circle, calling `step(dx, dy)` for each generated offset
///
/// Offsets are in the first quadrant; [`plot_circle_point`] expands them.
/// Both algorithms cover the same set of offsets once reflected.
pub fn circle_steps<E, F>(radius: i32, algorithm: CircleAlgorithm, mut step: F) -> Result<(), E>
where
    F: FnMut(i64, i64) -> Result<(), E>,
{
    let r = i64::from(radius).abs();
    match algorithm {
        CircleAlgorithm::Bresenham => {
            let (mut x, mut y) = (0, r);
            let mut d = 1 - 2 * r;
            while y >= 0 {
                step(x, y)?;
                // pick the move whose error is smallest
                if d < -1 {
                    if 2 * (d + y) + 1 <= 0 {
                        x += 1;
                        d += 2 * x + 1;
                        continue;
                    }
                } else if d > -1 && 2 * (d - x) + 1 > 0 {
                    y -= 1;
                    d += 1 - 2 * y;
                    continue;
                }
                x += 1;
                y -= 1;
                d += 2 * (x - y) + 2;
            }
        }
        CircleAlgorithm::Michener => {
            let (mut x, mut y) = (0, r);
            let mut d = 3 - 2 * r;
            while x < y {
                step(x, y)?;
                step(y, x)?;
                if d < 0 {
                    d += 4 * x + 6;
                } else {
                    d += 4 * (x - y) + 10;
                    y -= 1;
                }
                x += 1;
            }
            if x == y {
                step(x, y)?;
            }
        }
    }
    Ok(())
}

/// The distinct reflections of `(dx, dy)` around `(cx, cy)`
///
/// Two when one offset is zero, one when both are, four otherwise.
pub fn plot_circle_point(cx: i64, cy: i64, dx: i64, dy: i64) -> impl Iterator<Item = (i64, i64)> {
    let xs = if dx == 0 { [cx, cx] } else { [cx + dx, cx - dx] };
    let ys = if dy == 0 { [cy, cy] } else { [cy + dy, cy - dy] };
    let nx = if dx == 0 { 1 } else { 2 };
    let ny = if dy == 0 { 1 } else { 2 };
    xs.into_iter()
        .take(nx)
        .flat_map(move |x| ys.into_iter().take(ny).map(move |y| (x, y)))
}

/// `n / d` rounded half away from zero
pub fn div_round(n: i128, d: i128) -> i128 {
    let q = n / d;
    let r = n % d;
    if 2 * r.abs() >= d.abs() {
        q + (n.signum() * d.signum())
    } else {
        q
    }
}

fn square(v: i64) -> i128 {
    let v = i128::from(v);
    v * v
}

/// Move a negative extent's origin so the run covers the same pixels forwards
fn normalise(origin: i64, len: i64) -> (i64, i64) {
    if len < 0 { (origin + len, -len) } else { (origin, len) }
}

/// Clipped drawing over a [`RunSink`]
///
/// Coordinates are widened to `i64` internally, so any `i32` input is
/// accepted and whatever lands on the panel is drawn.
pub struct Raster<'a, S> {
    sink: &'a mut S,
    geometry: DisplayGeometry,
}

impl<'a, S: RunSink> Raster<'a, S> {
    pub fn new(sink: &'a mut S, geometry: DisplayGeometry) -> Self {
        Self { sink, geometry }
    }

    fn emit(&mut self, x: i64, y: i64, w: i64, h: i64, color: u16) -> Result<(), S::Error> {
        match AddressWindow::clipped_wide(x, y, w, h, self.geometry) {
            Some(window) => self.sink.fill_window(window, color),
            None => Ok(()),
        }
    }

    fn run_h(&mut self, x: i64, y: i64, len: i64, color: u16) -> Result<(), S::Error> {
        let (x, len) = normalise(x, len);
        self.emit(x, y, len, 1, color)
    }

    fn run_v(&mut self, x: i64, y: i64, len: i64, color: u16) -> Result<(), S::Error> {
        let (y, len) = normalise(y, len);
        self.emit(x, y, 1, len, color)
    }

    /// Squared distances from `(cx, cy)` to the nearest and farthest panel pixel
    fn reach(&self, cx: i64, cy: i64) -> (i128, i128) {
        let right = (i64::from(self.geometry.width) - 1).max(0);
        let bottom = (i64::from(self.geometry.height) - 1).max(0);
        let near = square(cx.clamp(0, right) - cx) + square(cy.clamp(0, bottom) - cy);
        let far = square(cx.max(right - cx)) + square(cy.max(bottom - cy));
        (near, far)
    }

    pub fn pixel(&mut self, x: i32, y: i32, color: u16) -> Result<(), S::Error> {
        self.emit(i64::from(x), i64::from(y), 1, 1, color)
    }

    pub fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u16) -> Result<(), S::Error> {
        let points = LinePoints::new(x0, y0, x1, y1);
        let extent = if points.is_steep() { self.geometry.height } else { self.geometry.width };
        for (x, y) in points.clamp_major(0, i64::from(extent) - 1) {
            if self.geometry.contains(x, y) {
                self.pixel(x, y, color)?;
            }
        }
        Ok(())
    }

    /// Horizontal run; a negative length runs leftwards from `x`
    pub fn hline(&mut self, x: i32, y: i32, len: i32, color: u16) -> Result<(), S::Error> {
        self.run_h(i64::from(x), i64::from(y), i64::from(len), color)
    }

    /// Vertical run; a negative length runs upwards from `y`
    pub fn vline(&mut self, x: i32, y: i32, len: i32, color: u16) -> Result<(), S::Error> {
        self.run_v(i64::from(x), i64::from(y), i64::from(len), color)
    }

    /// Outline; circles whose ring cannot touch the panel are skipped
    pub fn circle(
        &mut self,
        cx: i32,
        cy: i32,
        radius: i32,
        algorithm: CircleAlgorithm,
        color: u16,
    ) -> Result<(), S::Error> {
        let (cx, cy) = (i64::from(cx), i64::from(cy));
        let r = i64::from(radius).abs();
        // generated points sit within one pixel of the true radius
        let (near, far) = self.reach(cx, cy);
        if (r > 2 && square(r - 2) > far) || near > square(r + 2) {
            return Ok(());
        }
        circle_steps(radius, algorithm, |dx, dy| {
            for (x, y) in plot_circle_point(cx, cy, dx, dy) {
                self.emit(x, y, 1, 1, color)?;
            }
            Ok(())
        })
    }

    /// Filled disc; one full-screen window when the disc covers the panel
    pub fn fill_circle(
        &mut self,
        cx: i32,
        cy: i32,
        radius: i32,
        algorithm: CircleAlgorithm,
        color: u16,
    ) -> Result<(), S::Error> {
        let (cx, cy) = (i64::from(cx), i64::from(cy));
        let r = i64::from(radius).abs();
        let (near, far) = self.reach(cx, cy);
        if near > square(r + 2) {
            return Ok(());
        }
        if r > 2 && square(r - 2) >= far {
            return self.fill_screen(color);
        }
        circle_steps(radius, algorithm, |dx, dy| {
            self.run_h(cx - dx, cy + dy, 2 * dx + 1, color)?;
            if dy != 0 {
                self.run_h(cx - dx, cy - dy, 2 * dx + 1, color)?;
            }
            Ok(())
        })
    }

    pub fn rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u16) -> Result<(), S::Error> {
        let (x, w) = normalise(i64::from(x), i64::from(w));
        let (y, h) = normalise(i64::from(y), i64::from(h));
        if w == 0 || h == 0 {
            return Ok(());
        }

        self.run_h(x, y, w, color)?;
        if h > 1 {
            self.run_h(x, y + h - 1, w, color)?;
        }
        if h > 2 {
            self.run_v(x, y + 1, h - 2, color)?;
            if w > 1 {
                self.run_v(x + w - 1, y + 1, h - 2, color)?;
            }
        }
        Ok(())
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u16) -> Result<(), S::Error> {
        let (x, w) = normalise(i64::from(x), i64::from(w));
        let (y, h) = normalise(i64::from(y), i64::from(h));
        self.emit(x, y, w, h, color)
    }

    pub fn triangle(&mut self, a: (i32, i32), b: (i32, i32), c: (i32, i32), color: u16) -> Result<(), S::Error> {
        self.line(a.0, a.1, b.0, b.1, color)?;
        self.line(b.0, b.1, c.0, c.1, color)?;
        self.line(c.0, c.1, a.0, a.1, color)
    }

    /// Span between two x positions on row `y`, either order
    fn span(&mut self, xa: i64, xb: i64, y: i64, color: u16) -> Result<(), S::Error> {
        let (left, right) = if xa > xb { (xb, xa) } else { (xa, xb) };
        self.run_h(left, y, right - left + 1, color)
    }

    /// Scanline fill; only rows on the panel are interpolated
    pub fn fill_triangle(
        &mut self,
        a: (i32, i32),
        b: (i32, i32),
        c: (i32, i32),
        color: u16,
    ) -> Result<(), S::Error> {
        let mut v = [a, b, c];
        v.sort_by_key(|p| p.1);
        let [(ax, ay), (bx, by), (cx, cy)] = v.map(|(x, y)| (i64::from(x), i64::from(y)));

        if ay == cy {
            let left = ax.min(bx).min(cx);
            let right = ax.max(bx).max(cx);
            return self.span(left, right, ay, color);
        }
        if ax == bx && bx == cx {
            return self.run_v(ax, ay, cy - ay + 1, color);
        }

        // A->B top edge, A->C long edge, B->C bottom edge
        let (dx_ab, dy_ab) = (i128::from(bx - ax), i128::from(by - ay));
        let (dx_ac, dy_ac) = (i128::from(cx - ax), i128::from(cy - ay));
        let (dx_bc, dy_bc) = (i128::from(cx - bx), i128::from(cy - by));
        let along = |origin: i64, dx: i128, dy: i128, rows: i64| {
            // |result - origin| <= |dx|, so it fits back in i64
            origin + div_round(dx * i128::from(rows), dy) as i64
        };
        let last_row = i64::from(self.geometry.height) - 1;

        for row in ay.max(0)..by.min(last_row + 1) {
            let start = along(ax, dx_ab, dy_ab, row - ay);
            let end = along(ax, dx_ac, dy_ac, row - ay);
            self.span(start, end, row, color)?;
        }

        if dy_bc == 0 {
            return self.span(bx, cx, by, color);
        }

        for row in by.max(0)..=cy.min(last_row) {
            let start = along(bx, dx_bc, dy_bc, row - by);
            let end = along(ax, dx_ac, dy_ac, row - ay);
            self.span(start, end, row, color)?;
        }
        Ok(())
    }

    /// Full-screen solid fill
    pub fn fill_screen(&mut self, color: u16) -> Result<(), S::Error> {
        self.sink.fill_window(AddressWindow::full(self.geometry), color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const PANEL: DisplayGeometry = DisplayGeometry::ST7735;

    #[derive(Default)]
    struct Recorder {
        windows: Vec<(AddressWindow, u16)>,
    }

    impl Recorder {
        fn pixels(&self) -> HashSet<(i32, i32)> {
            let mut set = HashSet::new();
            for (w, _) in &self.windows {
                for y in w.y..=w.y_end() {
                    for x in w.x..=w.x_end() {
                        set.insert((i32::from(x), i32::from(y)));
                    }
                }
            }
            set
        }
    }

    impl RunSink for Recorder {
        type Error = ();

        fn fill_window(&mut self, window: AddressWindow, color: u16) -> Result<(), ()> {
            self.windows.push((window, color));
            Ok(())
        }
    }

    fn circle_offsets(radius: i32, algorithm: CircleAlgorithm) -> HashSet<(i64, i64)> {
        let mut set = HashSet::new();
        circle_steps::<(), _>(radius, algorithm, |dx, dy| {
            set.extend(plot_circle_point(0, 0, dx, dy));
            Ok(())
        })
        .unwrap();
        set
    }

    #[test]
    fn test_line_point_count_and_steps() {
        let cases = [(0, 0, 10, 3), (5, 5, -7, 20), (3, 3, 3, 3), (0, 9, 9, 0), (-4, 2, 40, 2)];
        for (x0, y0, x1, y1) in cases {
            let points: Vec<_> = LinePoints::new(x0, y0, x1, y1).collect();
            let expected = (x1 - x0).abs().max((y1 - y0).abs()) + 1;
            assert_eq!(points.len() as i32, expected);

            for pair in points.windows(2) {
                let (ddx, ddy) = (pair[1].0 - pair[0].0, pair[1].1 - pair[0].1);
                assert!(ddx.abs() <= 1 && ddy.abs() <= 1);
            }
            assert!(points.contains(&(x0, y0)));
            assert!(points.contains(&(x1, y1)));
        }
    }

    #[test]
    fn test_line_is_monotonic_on_major_axis() {
        let points: Vec<_> = LinePoints::new(2, 30, 12, 1).collect();
        for pair in points.windows(2) {
            assert_eq!(pair[1].1, pair[0].1 + 1);
        }
    }

    #[test]
    fn test_circle_algorithms_agree() {
        for r in 0..200 {
            assert_eq!(
                circle_offsets(r, CircleAlgorithm::Bresenham),
                circle_offsets(r, CircleAlgorithm::Michener),
                "radius {}",
                r
            );
        }
    }

    #[test]
    fn test_circle_small_radii() {
        assert_eq!(circle_offsets(0, CircleAlgorithm::Michener), HashSet::from([(0, 0)]));
        let r1 = circle_offsets(1, CircleAlgorithm::Bresenham);
        assert!(r1.contains(&(1, 0)) && r1.contains(&(0, -1)));
        assert!(!r1.contains(&(0, 0)));
    }

    #[test]
    fn test_negative_radius_is_absolute() {
        assert_eq!(
            circle_offsets(-7, CircleAlgorithm::Michener),
            circle_offsets(7, CircleAlgorithm::Michener)
        );
    }

    #[test]
    fn test_reflections_are_distinct() {
        assert_eq!(plot_circle_point(10, 10, 0, 0).count(), 1);
        assert_eq!(plot_circle_point(10, 10, 0, 3).count(), 2);
        assert_eq!(plot_circle_point(10, 10, 3, 0).count(), 2);
        assert_eq!(plot_circle_point(10, 10, 2, 3).count(), 4);
    }

    #[test]
    fn test_div_round_half_away_from_zero() {
        assert_eq!(div_round(5, 2), 3);
        assert_eq!(div_round(-5, 2), -3);
        assert_eq!(div_round(4, 3), 1);
        assert_eq!(div_round(-4, 3), -1);
        assert_eq!(div_round(5, -2), -3);
        assert_eq!(div_round(0, 7), 0);
    }

    #[test]
    fn test_rect_partially_off_screen() {
        let mut rec = Recorder::default();
        Raster::new(&mut rec, PANEL).fill_rect(-10, 150, 20, 20, 1).unwrap();
        assert_eq!(rec.windows, vec![(AddressWindow { x: 0, y: 150, width: 10, height: 10 }, 1)]);
    }

    #[test]
    fn test_shapes_fully_off_screen_emit_nothing() {
        let mut rec = Recorder::default();
        let mut raster = Raster::new(&mut rec, PANEL);
        raster.fill_rect(200, 200, 10, 10, 1).unwrap();
        raster.rect(-50, -50, 20, 20, 1).unwrap();
        raster.line(-10, -10, -1, -30, 1).unwrap();
        raster.circle(500, 500, 10, CircleAlgorithm::Bresenham, 1).unwrap();
        raster.fill_circle(-100, 80, 20, CircleAlgorithm::Michener, 1).unwrap();
        raster.hline(0, 160, 50, 1).unwrap();
        assert!(rec.windows.is_empty());
    }

    #[test]
    fn test_rect_outline_clipped_matches_border() {
        let mut rec = Recorder::default();
        Raster::new(&mut rec, PANEL).rect(120, 5, 20, 4, 2).unwrap();
        let expected: HashSet<_> = (120..128)
            .flat_map(|x| [(x, 5), (x, 8)])
            .chain([(120, 6), (120, 7)])
            .collect();
        assert_eq!(rec.pixels(), expected);
    }

    #[test]
    fn test_negative_sizes_are_normalised() {
        let mut rec = Recorder::default();
        let mut raster = Raster::new(&mut rec, PANEL);
        raster.hline(10, 3, -5, 1).unwrap();
        raster.vline(2, 10, -4, 1).unwrap();
        raster.fill_rect(20, 20, -5, -5, 1).unwrap();
        assert_eq!(
            rec.windows.iter().map(|(w, _)| *w).collect::<Vec<_>>(),
            vec![
                AddressWindow { x: 5, y: 3, width: 5, height: 1 },
                AddressWindow { x: 2, y: 6, width: 1, height: 4 },
                AddressWindow { x: 15, y: 15, width: 5, height: 5 },
            ]
        );
    }

    #[test]
    fn test_flat_triangle_is_single_run() {
        let mut rec = Recorder::default();
        Raster::new(&mut rec, PANEL).fill_triangle((10, 50), (40, 50), (25, 50), 3).unwrap();
        assert_eq!(rec.windows, vec![(AddressWindow { x: 10, y: 50, width: 31, height: 1 }, 3)]);
    }

    #[test]
    fn test_vertical_triangle_is_single_run() {
        let mut rec = Recorder::default();
        Raster::new(&mut rec, PANEL).fill_triangle((7, 30), (7, 10), (7, 20), 3).unwrap();
        assert_eq!(rec.windows, vec![(AddressWindow { x: 7, y: 10, width: 1, height: 21 }, 3)]);
    }

    #[test]
    fn test_fill_triangle_covers_vertices_and_rows() {
        let mut rec = Recorder::default();
        Raster::new(&mut rec, PANEL).fill_triangle((10, 10), (60, 40), (20, 80), 5).unwrap();
        let pixels = rec.pixels();
        for v in [(10, 10), (60, 40), (20, 80)] {
            assert!(pixels.contains(&v), "missing vertex {:?}", v);
        }
        for (w, _) in &rec.windows {
            assert_eq!(w.height, 1);
        }
        let rows: HashSet<_> = pixels.iter().map(|p| p.1).collect();
        assert_eq!(rows, (10..=80).collect::<HashSet<_>>());
    }

    #[test]
    fn test_fill_triangle_flat_bottom_uses_straight_span() {
        let mut rec = Recorder::default();
        Raster::new(&mut rec, PANEL).fill_triangle((30, 10), (10, 20), (50, 20), 5).unwrap();
        let last = rec.windows.last().unwrap().0;
        assert_eq!(last, AddressWindow { x: 10, y: 20, width: 41, height: 1 });
    }

    #[test]
    fn test_fill_circle_matches_outline_extent() {
        let mut rec = Recorder::default();
        Raster::new(&mut rec, PANEL).fill_circle(64, 80, 10, CircleAlgorithm::Bresenham, 1).unwrap();
        let filled = rec.pixels();

        let outline: HashSet<_> = circle_offsets(10, CircleAlgorithm::Michener)
            .into_iter()
            .map(|(dx, dy)| (64 + dx as i32, 80 + dy as i32))
            .collect();
        assert!(outline.is_subset(&filled));
        assert!(filled.contains(&(64, 80)));
        assert!(!filled.contains(&(64, 69)));
    }

    #[test]
    fn test_clamped_line_keeps_visible_points() {
        let cases = [(-300, 7, 400, 90), (500, -40, -20, 170), (3, -900, 90, 1000), (-5, 5, 5, -5)];
        for (x0, y0, x1, y1) in cases {
            let full: Vec<_> = LinePoints::new(x0, y0, x1, y1)
                .filter(|&(x, y)| PANEL.contains(x, y))
                .collect();

            let mut rec = Recorder::default();
            Raster::new(&mut rec, PANEL).line(x0, y0, x1, y1, 1).unwrap();
            let drawn: Vec<_> = rec.windows.iter().map(|(w, _)| (i32::from(w.x), i32::from(w.y))).collect();
            assert_eq!(drawn, full, "line {:?}", (x0, y0, x1, y1));
        }
    }

    #[test]
    fn test_line_across_whole_i32_range() {
        let mut rec = Recorder::default();
        let mut raster = Raster::new(&mut rec, PANEL);
        raster.line(i32::MIN, 0, i32::MAX, 0, 1).unwrap();
        raster.line(i32::MIN, i32::MIN, i32::MAX, i32::MAX, 2).unwrap();

        let row: HashSet<_> = (0..128).map(|x| (x, 0)).collect();
        let diagonal: HashSet<_> = (0..128).map(|x| (x, x)).collect();
        let expected: HashSet<_> = row.union(&diagonal).copied().collect();
        assert_eq!(rec.pixels(), expected);
    }

    #[test]
    fn test_extreme_radii_are_culled_or_fill_the_panel() {
        let mut rec = Recorder::default();
        let mut raster = Raster::new(&mut rec, PANEL);
        raster.circle(64, 80, i32::MIN, CircleAlgorithm::Bresenham, 1).unwrap();
        raster.circle(64, 80, (1 << 30) + 1, CircleAlgorithm::Michener, 1).unwrap();
        raster.fill_circle(i32::MIN, i32::MAX, 5, CircleAlgorithm::Michener, 1).unwrap();
        assert!(rec.windows.is_empty());

        let mut raster = Raster::new(&mut rec, PANEL);
        raster.fill_circle(64, 80, i32::MAX, CircleAlgorithm::Bresenham, 4).unwrap();
        assert_eq!(rec.windows, vec![(AddressWindow::full(PANEL), 4)]);
    }

    #[test]
    fn test_extreme_extents_clip() {
        let mut rec = Recorder::default();
        let mut raster = Raster::new(&mut rec, PANEL);
        raster.hline(i32::MIN, 0, -1, 1).unwrap();
        raster.fill_rect(0, 0, i32::MIN, 5, 1).unwrap();
        raster.rect(i32::MAX, 0, 5, 5, 1).unwrap();
        assert!(rec.windows.is_empty());

        let mut raster = Raster::new(&mut rec, PANEL);
        raster.hline(i32::MAX, 3, i32::MIN, 1).unwrap();
        raster.vline(2, i32::MIN, -1, 1).unwrap();
        raster.fill_rect(i32::MIN, i32::MIN, i32::MAX, i32::MAX, 1).unwrap();
        raster.rect(i32::MIN, i32::MIN, i32::MAX, i32::MAX, 1).unwrap();
        assert_eq!(
            rec.windows.iter().map(|(w, _)| *w).collect::<Vec<_>>(),
            vec![AddressWindow { x: 0, y: 3, width: 128, height: 1 }]
        );
    }

    #[test]
    fn test_fill_triangle_with_far_vertices() {
        let mut rec = Recorder::default();
        Raster::new(&mut rec, PANEL)
            .fill_triangle((i32::MIN, i32::MIN), (i32::MAX, 0), (0, i32::MAX), 6)
            .unwrap();
        assert_eq!(rec.windows.len(), 160);
        assert!(rec.windows.iter().all(|(w, _)| w.height == 1));
    }
}
