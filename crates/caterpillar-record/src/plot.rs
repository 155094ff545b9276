//! Raster drawing primitives for charts.
//!
//! Everything draws into a white [`Canvas`]; data coordinates are mapped to
//! pixels through [`Axes`]. No text is rendered.

use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};

use crate::error::RecordError;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const GRID: Rgb<u8> = Rgb([225, 225, 225]);
pub const RED: Rgb<u8> = Rgb([214, 39, 40]);
pub const GREEN: Rgb<u8> = Rgb([44, 160, 44]);
pub const BLUE: Rgb<u8> = Rgb([31, 119, 180]);
pub const PURPLE: Rgb<u8> = Rgb([128, 0, 128]);

/// Series colors, cycled by index.
pub const PALETTE: [Rgb<u8>; 3] = [RED, GREEN, BLUE];

// ---------------------------------------------------------------------------
// Color ramp
// ---------------------------------------------------------------------------

const MAGMA_STOPS: [(f32, [u8; 3]); 9] = [
    (0.0, [0, 0, 4]),
    (0.125, [28, 16, 68]),
    (0.25, [79, 18, 123]),
    (0.375, [129, 37, 129]),
    (0.5, [181, 54, 122]),
    (0.625, [229, 80, 100]),
    (0.75, [251, 135, 97]),
    (0.875, [254, 194, 135]),
    (1.0, [252, 253, 191]),
];

/// Magma-like ramp from near-black (0) to pale yellow (1). Input is clamped.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn magma(t: f32) -> Rgb<u8> {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    for pair in MAGMA_STOPS.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t <= t1 {
            let f = (t - t0) / (t1 - t0);
            let mix = |a: u8, b: u8| f32::from(a) + (f32::from(b) - f32::from(a)) * f;
            return Rgb([
                mix(c0[0], c1[0]).round() as u8,
                mix(c0[1], c1[1]).round() as u8,
                mix(c0[2], c1[2]).round() as u8,
            ]);
        }
    }
    Rgb(MAGMA_STOPS[MAGMA_STOPS.len() - 1].1)
}

// ---------------------------------------------------------------------------
// Rect
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Shrink by `margin` on every side.
    pub const fn inset(self, margin: u32) -> Self {
        let m = if 2 * margin < self.width && 2 * margin < self.height {
            margin
        } else {
            0
        };
        Self::new(self.x + m, self.y + m, self.width - 2 * m, self.height - 2 * m)
    }

    /// Split into a `cols × rows` grid, row-major.
    pub fn split(self, cols: u32, rows: u32) -> Vec<Self> {
        let (w, h) = (self.width / cols.max(1), self.height / rows.max(1));
        (0..rows)
            .flat_map(|r| (0..cols).map(move |c| Self::new(self.x + c * w, self.y + r * h, w, h)))
            .collect()
    }

    pub const fn right(self) -> u32 {
        self.x + self.width.saturating_sub(1)
    }

    pub const fn bottom(self) -> u32 {
        self.y + self.height.saturating_sub(1)
    }
}

// ---------------------------------------------------------------------------
// Axes
// ---------------------------------------------------------------------------

/// Linear map from a data window onto a pixel rectangle (y grows upward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axes {
    pub rect: Rect,
    pub x_range: (f32, f32),
    pub y_range: (f32, f32),
}

impl Axes {
    pub fn new(rect: Rect, x_range: (f32, f32), y_range: (f32, f32)) -> Self {
        Self {
            rect,
            x_range: widen(x_range),
            y_range: widen(y_range),
        }
    }

    /// Pixel position of a data point, clamped to the rectangle.
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_pixel(&self, x: f32, y: f32) -> (i64, i64) {
        let fx = ((x - self.x_range.0) / (self.x_range.1 - self.x_range.0)).clamp(0.0, 1.0);
        let fy = ((y - self.y_range.0) / (self.y_range.1 - self.y_range.0)).clamp(0.0, 1.0);
        let px = f64::from(self.rect.x) + f64::from(fx) * f64::from(self.rect.width.saturating_sub(1));
        let py = f64::from(self.rect.bottom()) - f64::from(fy) * f64::from(self.rect.height.saturating_sub(1));
        (px.round() as i64, py.round() as i64)
    }
}

fn widen((lo, hi): (f32, f32)) -> (f32, f32) {
    if !lo.is_finite() || !hi.is_finite() {
        (0.0, 1.0)
    } else if (hi - lo).abs() < 1e-9 {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo.min(hi), lo.max(hi))
    }
}

/// Min/max of the finite values, padded by 5% on each side.
pub fn padded_range<'a>(values: impl IntoIterator<Item = &'a f32>) -> (f32, f32) {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    if lo > hi {
        return (0.0, 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, WHITE),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width(), self.height())
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb<u8>> {
        self.image.get_pixel_checked(x, y).copied()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn put(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        if x >= 0 && y >= 0 && x < i64::from(self.width()) && y < i64::from(self.height()) {
            self.image.put_pixel(x as u32, y as u32, color);
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgb<u8>) {
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                self.put(i64::from(x), i64::from(y), color);
            }
        }
    }

    /// Bresenham line between two pixel positions (inclusive).
    pub fn line(&mut self, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let sx = if x < to.0 { 1 } else { -1 };
        let sy = if y < to.1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.put(x, y, color);
            if x == to.0 && y == to.1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Horizontal dashed line at pixel row `y` from `x0` to `x1`.
    pub fn dashed_hline(&mut self, y: i64, x0: i64, x1: i64, dash: i64, color: Rgb<u8>) {
        let dash = dash.max(1);
        for x in x0.min(x1)..=x0.max(x1) {
            if (x - x0.min(x1)) / dash % 2 == 0 {
                self.put(x, y, color);
            }
        }
    }

    /// Vertical dashed line at pixel column `x` from `y0` to `y1`.
    pub fn dashed_vline(&mut self, x: i64, y0: i64, y1: i64, dash: i64, color: Rgb<u8>) {
        let dash = dash.max(1);
        for y in y0.min(y1)..=y0.max(y1) {
            if (y - y0.min(y1)) / dash % 2 == 0 {
                self.put(x, y, color);
            }
        }
    }

    /// One-pixel outline.
    pub fn frame(&mut self, rect: Rect, color: Rgb<u8>) {
        let (l, t) = (i64::from(rect.x), i64::from(rect.y));
        let (r, b) = (i64::from(rect.right()), i64::from(rect.bottom()));
        self.line((l, t), (r, t), color);
        self.line((r, t), (r, b), color);
        self.line((r, b), (l, b), color);
        self.line((l, b), (l, t), color);
    }

    /// `divisions − 1` evenly spaced interior lines in each direction.
    pub fn grid(&mut self, rect: Rect, divisions: u32, color: Rgb<u8>) {
        let (l, t) = (i64::from(rect.x), i64::from(rect.y));
        let (r, b) = (i64::from(rect.right()), i64::from(rect.bottom()));
        for k in 1..divisions {
            let x = l + (r - l) * i64::from(k) / i64::from(divisions);
            let y = t + (b - t) * i64::from(k) / i64::from(divisions);
            self.line((x, t), (x, b), color);
            self.line((l, y), (r, y), color);
        }
    }

    /// Background grid plus frame; returns the axes for the given data window.
    pub fn panel(&mut self, rect: Rect, x_range: (f32, f32), y_range: (f32, f32)) -> Axes {
        self.grid(rect, 5, GRID);
        self.frame(rect, BLACK);
        Axes::new(rect, x_range, y_range)
    }

    /// Polyline through `(xs[i], ys[i])`, two pixels thick. Non-finite
    /// points break the line.
    pub fn series(&mut self, axes: &Axes, xs: &[f32], ys: &[f32], color: Rgb<u8>) {
        let mut prev: Option<(i64, i64)> = None;
        for (x, y) in xs.iter().zip(ys) {
            if !x.is_finite() || !y.is_finite() {
                prev = None;
                continue;
            }
            let p = axes.to_pixel(*x, *y);
            let from = prev.unwrap_or(p);
            self.line(from, p, color);
            self.line((from.0, from.1 + 1), (p.0, p.1 + 1), color);
            prev = Some(p);
        }
    }

    /// Dashed horizontal line across the axes at data value `y`.
    pub fn mean_line(&mut self, axes: &Axes, y: f32, color: Rgb<u8>) {
        let (x0, py) = axes.to_pixel(axes.x_range.0, y);
        let (x1, _) = axes.to_pixel(axes.x_range.1, y);
        self.dashed_hline(py, x0, x1, 6, color);
        self.dashed_hline(py + 1, x0, x1, 6, color);
    }

    /// Dashed vertical line across the axes at data value `x`.
    pub fn marker_line(&mut self, axes: &Axes, x: f32, color: Rgb<u8>) {
        let (px, y0) = axes.to_pixel(x, axes.y_range.0);
        let (_, y1) = axes.to_pixel(x, axes.y_range.1);
        self.dashed_vline(px, y0, y1, 4, color);
    }

    /// Filled square centered on a data point.
    pub fn dot(&mut self, axes: &Axes, x: f32, y: f32, radius: i64, color: Rgb<u8>) {
        let (cx, cy) = axes.to_pixel(x, y);
        for py in cy - radius..=cy + radius {
            for px in cx - radius..=cx + radius {
                self.put(px, py, color);
            }
        }
    }

    /// Time-major rows (`rows[t][j]`) drawn with time along x and row index
    /// `j` down the y axis, values mapped from `[lo, hi]` onto [`magma`].
    pub fn heatmap(&mut self, rect: Rect, rows: &[Vec<f32>], lo: f32, hi: f32) {
        let cols = rows.len();
        let bands = rows.iter().map(Vec::len).max().unwrap_or(0);
        if cols == 0 || bands == 0 || rect.width == 0 || rect.height == 0 {
            return;
        }
        let span = if (hi - lo).abs() < f32::EPSILON { 1.0 } else { hi - lo };
        for py in 0..rect.height {
            let band = py as usize * bands / rect.height as usize;
            for px in 0..rect.width {
                let step = px as usize * cols / rect.width as usize;
                let value = rows[step].get(band).copied().unwrap_or(lo);
                self.put(
                    i64::from(rect.x + px),
                    i64::from(rect.y + py),
                    magma((value - lo) / span),
                );
            }
        }
        self.frame(rect, BLACK);
    }

    pub fn save(&self, path: &Path) -> Result<(), RecordError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| RecordError::io(parent, e))?;
        }
        self.image.save(path).map_err(|source| RecordError::Image {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
