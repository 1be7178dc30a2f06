//! On-demand Mandelbrot tile rendering.
//!
//! The zoom-0 tile covers real axis `[-2.0, 0.5]` and imaginary axis
//! `[-1.25, 1.25]`; deeper tiles subdivide that square like any XYZ grid.

use std::fmt;
use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage};
use zui_shared::TileCoord;

pub const TILE_PIXELS: u32 = 256;

const PLANE_SPAN: f64 = 2.5;
const PLANE_RE_MIN: f64 = -2.0;
const PLANE_IM_MIN: f64 = -1.25;
const BASE_ITERATIONS: u32 = 50;
const ITERATIONS_PER_ZOOM: u32 = 15;
const COLOR_CYCLE: u32 = 50;

/// "Ultra Fractal" gradient stops: (position, rgb).
const GRADIENT: [(f64, [u8; 3]); 7] = [
    (0.0, [0, 0, 0]),
    (0.02, [0, 7, 100]),
    (0.16, [32, 107, 203]),
    (0.42, [237, 255, 255]),
    (0.6425, [255, 170, 0]),
    (0.8575, [0, 2, 0]),
    (1.0, [0, 0, 0]),
];

#[derive(Debug)]
pub enum GenerateError {
    Io(std::io::Error),
    Encode(image::ImageError),
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerateError::Io(e) => write!(f, "tile IO failed: {e}"),
            GenerateError::Encode(e) => write!(f, "tile encoding failed: {e}"),
        }
    }
}

impl std::error::Error for GenerateError {}

impl From<std::io::Error> for GenerateError {
    fn from(value: std::io::Error) -> Self {
        GenerateError::Io(value)
    }
}

impl From<image::ImageError> for GenerateError {
    fn from(value: image::ImageError) -> Self {
        GenerateError::Encode(value)
    }
}

pub fn iteration_budget(z: u32) -> u32 {
    BASE_ITERATIONS.saturating_add(ITERATIONS_PER_ZOOM.saturating_mul(z))
}

/// Iteration at which the orbit of `c` first leaves the radius-2 disk, if it does.
pub fn escape_iteration(re: f64, im: f64, budget: u32) -> Option<u32> {
    let (mut zr, mut zi) = (0.0f64, 0.0f64);
    for n in 0..budget {
        let next_r = zr * zr - zi * zi + re;
        zi = 2.0 * zr * zi + im;
        zr = next_r;
        if zr * zr + zi * zi > 4.0 {
            return Some(n);
        }
    }
    None
}

/// Gradient position for an escape result; points inside the set sit at 1.0.
pub fn shade(escape: Option<u32>) -> f64 {
    match escape {
        Some(n) => (n as i64 - 1).rem_euclid(COLOR_CYCLE as i64) as f64 / (COLOR_CYCLE - 1) as f64,
        None => 1.0,
    }
}

pub fn gradient_color(t: f64) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    for pair in GRADIENT.windows(2) {
        let (p0, c0) = pair[0];
        let (p1, c1) = pair[1];
        if t <= p1 {
            let f = if p1 > p0 { (t - p0) / (p1 - p0) } else { 0.0 };
            let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * f).round() as u8;
            return [mix(c0[0], c1[0]), mix(c0[1], c1[1]), mix(c0[2], c1[2])];
        }
    }
    GRADIENT[GRADIENT.len() - 1].1
}

/// Evenly spaced samples from `start` to `end`, both included.
fn sample(start: f64, end: f64, i: u32, count: u32) -> f64 {
    if count <= 1 {
        return start;
    }
    start + (end - start) * i as f64 / (count - 1) as f64
}

pub fn render_tile(tile: TileCoord, size: u32) -> RgbaImage {
    let region = tile.region();
    let budget = iteration_budget(tile.z);
    let mut img = RgbaImage::new(size, size);
    for row in 0..size {
        let y = sample(region.y_start, region.y_end, row, size);
        let im = y * PLANE_SPAN + PLANE_IM_MIN;
        for col in 0..size {
            let x = sample(region.x_start, region.x_end, col, size);
            let re = x * PLANE_SPAN + PLANE_RE_MIN;
            let [r, g, b] = gradient_color(shade(escape_iteration(re, im, budget)));
            img.put_pixel(col, row, Rgba([r, g, b, 255]));
        }
    }
    img
}

/// Render `tile` and place it at `target`, writing through `scratch` so readers
/// never see a partial file.
pub fn write_tile(tile: TileCoord, target: &Path, scratch: &Path) -> Result<(), GenerateError> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let img = render_tile(tile, TILE_PIXELS);
    if let Err(e) = img.save_with_format(scratch, ImageFormat::Png) {
        let _ = std::fs::remove_file(scratch);
        return Err(e.into());
    }
    std::fs::rename(scratch, target)?;
    Ok(())
}
