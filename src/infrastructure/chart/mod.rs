// ============================================================
// CHART RENDERER
// ============================================================
// Rasterize a (label, value) series into a PNG trend chart

mod font;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
use std::io::Cursor;

use crate::domain::error::{AppError, Result};
use crate::domain::report::SeriesPoint;

use font::{draw_text, draw_text_vertical, text_width, GLYPH_HEIGHT};

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const GRID: Rgb<u8> = Rgb([220, 220, 220]);
const FRAME: Rgb<u8> = Rgb([96, 96, 96]);
const TEXT: Rgb<u8> = Rgb([40, 40, 40]);
// matplotlib's default line color, for a familiar look.
const LINE: Rgb<u8> = Rgb([31, 119, 180]);

const MARGIN_LEFT: u32 = 80;
const MARGIN_RIGHT: u32 = 30;
const MARGIN_TOP: u32 = 50;
const MARGIN_BOTTOM: u32 = 60;

const Y_TICKS: u32 = 5;
const MAX_X_TICKS: usize = 8;
const MAX_X_LABEL_CHARS: usize = 10;

/// Renders line plots with point markers onto an RGB canvas.
pub struct ChartRenderer {
    width: u32,
    height: u32,
}

impl ChartRenderer {
    /// Create a renderer with the given canvas size; sizes too small to
    /// hold the margins are bumped to a usable minimum.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(MARGIN_LEFT + MARGIN_RIGHT + 100),
            height: height.max(MARGIN_TOP + MARGIN_BOTTOM + 80),
        }
    }

    /// Render the series as a line plot with markers and return PNG bytes.
    ///
    /// `x_label` is the date column name or "Records"; the y axis is always
    /// labeled "Value". Empty and single-point series are valid inputs.
    pub fn render(&self, series: &[SeriesPoint], x_label: &str, title: &str) -> Result<Vec<u8>> {
        let mut img = RgbImage::from_pixel(self.width, self.height, BACKGROUND);

        let x0 = MARGIN_LEFT as i64;
        let y0 = MARGIN_TOP as i64;
        let x1 = (self.width - MARGIN_RIGHT) as i64;
        let y1 = (self.height - MARGIN_BOTTOM) as i64;

        let (min_v, max_v) = value_bounds(series);
        let span = max_v - min_v;

        // Horizontal gridlines with y tick labels.
        for tick in 0..=Y_TICKS {
            let frac = tick as f64 / Y_TICKS as f64;
            let y = y1 - ((y1 - y0) as f64 * frac).round() as i64;
            draw_h_line(&mut img, x0, x1, y, GRID);

            let value = min_v + span * frac;
            let label = format_tick(value);
            let tx = x0 - 8 - text_width(&label, 1) as i64;
            draw_text(&mut img, tx, y - (GLYPH_HEIGHT / 2) as i64, &label, 1, TEXT);
        }

        // Plot frame.
        draw_h_line(&mut img, x0, x1, y0, FRAME);
        draw_h_line(&mut img, x0, x1, y1, FRAME);
        draw_v_line(&mut img, y0, y1, x0, FRAME);
        draw_v_line(&mut img, y0, y1, x1, FRAME);

        // Data points in pixel space.
        let points: Vec<(i64, i64)> = series
            .iter()
            .enumerate()
            .map(|(i, point)| {
                let fx = if series.len() > 1 {
                    i as f64 / (series.len() - 1) as f64
                } else {
                    0.5
                };
                let fy = if span > 0.0 {
                    (point.value - min_v) / span
                } else {
                    0.5
                };
                let px = x0 + ((x1 - x0) as f64 * fx).round() as i64;
                let py = y1 - ((y1 - y0) as f64 * fy).round() as i64;
                (px, py)
            })
            .collect();

        for pair in points.windows(2) {
            draw_line(&mut img, pair[0], pair[1], LINE);
        }
        for &(px, py) in &points {
            draw_marker(&mut img, px, py, LINE);
        }

        // X tick labels: a bounded, evenly spaced subset.
        if !series.is_empty() {
            let step = (series.len() + MAX_X_TICKS - 1) / MAX_X_TICKS;
            for (i, point) in series.iter().enumerate().step_by(step.max(1)) {
                let (px, _) = points[i];
                draw_v_line(&mut img, y1, y1 + 4, px, FRAME);

                let mut label: String = point.label.chars().take(MAX_X_LABEL_CHARS).collect();
                if point.label.chars().count() > MAX_X_LABEL_CHARS {
                    label.push('.');
                }
                let tx = px - (text_width(&label, 1) / 2) as i64;
                draw_text(&mut img, tx, y1 + 8, &label, 1, TEXT);
            }
        }

        // Title and axis labels.
        let title_x = (self.width as i64 - text_width(title, 2) as i64) / 2;
        draw_text(&mut img, title_x, 14, title, 2, TEXT);

        let xl_x = x0 + ((x1 - x0) - text_width(x_label, 1) as i64) / 2;
        draw_text(&mut img, xl_x, y1 + 28, x_label, 1, TEXT);

        let yl_y = y0 + ((y1 - y0) - text_width("Value", 1) as i64) / 2;
        draw_text_vertical(&mut img, 12, yl_y, "Value", 1, TEXT);

        encode_png(&img)
    }
}

fn value_bounds(series: &[SeriesPoint]) -> (f64, f64) {
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    for point in series {
        min_v = min_v.min(point.value);
        max_v = max_v.max(point.value);
    }
    if series.is_empty() {
        return (0.0, 1.0);
    }
    if min_v == max_v {
        // A flat series still needs a visible span.
        let pad = if min_v == 0.0 { 1.0 } else { min_v.abs() * 0.1 };
        return (min_v - pad, max_v + pad);
    }
    let pad = (max_v - min_v) * 0.05;
    (min_v - pad, max_v + pad)
}

fn format_tick(value: f64) -> String {
    let text = format!("{:.2}", value);
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn draw_h_line(img: &mut RgbImage, x0: i64, x1: i64, y: i64, color: Rgb<u8>) {
    for x in x0.min(x1)..=x0.max(x1) {
        put_pixel(img, x, y, color);
    }
}

fn draw_v_line(img: &mut RgbImage, y0: i64, y1: i64, x: i64, color: Rgb<u8>) {
    for y in y0.min(y1)..=y0.max(y1) {
        put_pixel(img, x, y, color);
    }
}

/// Bresenham segment between two pixel points.
fn draw_line(img: &mut RgbImage, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
    let (mut x, mut y) = from;
    let (x1, y1) = to;
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        put_pixel(img, x, y, color);
        if x == x1 && y == y1 {
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

/// Filled 5x5 disc marker.
fn draw_marker(img: &mut RgbImage, cx: i64, cy: i64, color: Rgb<u8>) {
    for dy in -2i64..=2 {
        for dx in -2i64..=2 {
            if dx * dx + dy * dy <= 5 {
                put_pixel(img, cx + dx, cy + dy, color);
            }
        }
    }
}

fn put_pixel(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

fn encode_png(img: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    PngEncoder::new(&mut buffer)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| AppError::ChartError(format!("Failed to encode chart PNG: {}", e)))?;
    Ok(buffer.into_inner())
}
