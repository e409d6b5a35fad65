//! Evidence diagram rasterizer.
//!
//! Draws a [`DisplayGraph`] at its spectral positions into a PNG:
//! palette-filled vertex discs, gray directed edges with arrowheads,
//! red relation labels, black captions. Captions use a built-in 5x7
//! glyph subset (uppercase, digits, light punctuation); lowercase input
//! is drawn as uppercase and anything outside the subset as a box.

use std::path::Path;

use image::{Rgba, RgbaImage};

use super::EvidenceError;
use super::display::{Color, DisplayGraph};
use super::layout::spectral_positions;

const CANVAS_WIDTH: u32 = 1200;
const CANVAS_HEIGHT: u32 = 800;
const MARGIN: f64 = 140.0;
const VERTEX_RADIUS: i64 = 54;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const EDGE_COLOR: Rgba<u8> = Rgba([128, 128, 128, 255]);
const EDGE_LABEL_COLOR: Rgba<u8> = Rgba([200, 30, 30, 255]);
const CAPTION_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
const OUTLINE_COLOR: Rgba<u8> = Rgba([96, 96, 96, 255]);

/// Render the diagram to `path`, creating parent directories as needed.
pub fn render_png(display: &DisplayGraph, path: &Path) -> Result<(), EvidenceError> {
    let graph = display.graph();
    let positions = spectral_positions(graph.node_count(), &display.edge_indices());

    let mut canvas = RgbaImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, BACKGROUND);

    let centers: Vec<(i64, i64)> = positions.iter().map(|&(x, y)| to_pixel(x, y)).collect();

    // Edges first so discs paint over the line ends.
    for edge in graph.edge_indices() {
        let Some((a, b)) = graph.edge_endpoints(edge) else {
            continue;
        };
        let (x0, y0) = centers[a.index()];
        let (x1, y1) = centers[b.index()];
        draw_line(&mut canvas, x0, y0, x1, y1, EDGE_COLOR);
        draw_arrowhead(&mut canvas, x0, y0, x1, y1);

        if let Some(kind) = graph.edge_weight(edge) {
            let label = kind.as_str();
            let (mx, my) = ((x0 + x1) / 2, (y0 + y1) / 2);
            let width = text_width(label, 1);
            draw_text(
                &mut canvas,
                mx - width / 2,
                my - 12,
                label,
                1,
                EDGE_LABEL_COLOR,
            );
        }
    }

    for (index, vertex) in graph.node_weights().enumerate() {
        let (cx, cy) = centers[index];
        draw_disc(&mut canvas, cx, cy, VERTEX_RADIUS, vertex.color);
        draw_ring(&mut canvas, cx, cy, VERTEX_RADIUS, OUTLINE_COLOR);

        let lines: Vec<&str> = vertex.caption.lines().collect();
        let line_height = 18i64;
        let block_height = line_height * lines.len() as i64;
        for (row, line) in lines.iter().enumerate() {
            let width = text_width(line, 2);
            draw_text(
                &mut canvas,
                cx - width / 2,
                cy - block_height / 2 + row as i64 * line_height,
                line,
                2,
                CAPTION_COLOR,
            );
        }
    }

    let title = "DATA PATH";
    let width = text_width(title, 2);
    draw_text(
        &mut canvas,
        (CANVAS_WIDTH as i64 - width) / 2,
        24,
        title,
        2,
        CAPTION_COLOR,
    );

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| EvidenceError::Render {
                message: format!("create {}: {e}", parent.display()),
            })?;
        }
    }
    canvas.save(path).map_err(|e| EvidenceError::Render {
        message: format!("write {}: {e}", path.display()),
    })
}

/// Unit-box coordinates to pixel coordinates inside the margins.
fn to_pixel(x: f64, y: f64) -> (i64, i64) {
    let px = MARGIN + (x + 1.0) / 2.0 * (CANVAS_WIDTH as f64 - 2.0 * MARGIN);
    let py = MARGIN + (1.0 - y) / 2.0 * (CANVAS_HEIGHT as f64 - 2.0 * MARGIN);
    (px.round() as i64, py.round() as i64)
}

fn put(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
        canvas.put_pixel(x as u32, y as u32, color);
    }
}

fn draw_line(canvas: &mut RgbaImage, mut x0: i64, mut y0: i64, x1: i64, y1: i64, color: Rgba<u8>) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put(canvas, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let doubled = 2 * err;
        if doubled >= dy {
            err += dy;
            x0 += sx;
        }
        if doubled <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn draw_disc(canvas: &mut RgbaImage, cx: i64, cy: i64, radius: i64, fill: Color) {
    let color = Rgba([fill[0], fill[1], fill[2], 255]);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put(canvas, cx + dx, cy + dy, color);
            }
        }
    }
}

fn draw_ring(canvas: &mut RgbaImage, cx: i64, cy: i64, radius: i64, color: Rgba<u8>) {
    let inner = (radius - 1) * (radius - 1);
    let outer = (radius + 1) * (radius + 1);
    for dy in -radius - 1..=radius + 1 {
        for dx in -radius - 1..=radius + 1 {
            let d2 = dx * dx + dy * dy;
            if d2 >= inner && d2 <= outer {
                put(canvas, cx + dx, cy + dy, color);
            }
        }
    }
}

/// Two short strokes at the point where the edge meets the target disc.
fn draw_arrowhead(canvas: &mut RgbaImage, x0: i64, y0: i64, x1: i64, y1: i64) {
    let dx = (x1 - x0) as f64;
    let dy = (y1 - y0) as f64;
    let length = (dx * dx + dy * dy).sqrt();
    if length < 1.0 {
        return;
    }
    let (ux, uy) = (dx / length, dy / length);
    let tip_x = x1 as f64 - ux * VERTEX_RADIUS as f64;
    let tip_y = y1 as f64 - uy * VERTEX_RADIUS as f64;
    let base_x = tip_x - ux * 14.0;
    let base_y = tip_y - uy * 14.0;
    let (px, py) = (-uy * 7.0, ux * 7.0);
    draw_line(
        canvas,
        tip_x as i64,
        tip_y as i64,
        (base_x + px) as i64,
        (base_y + py) as i64,
        EDGE_COLOR,
    );
    draw_line(
        canvas,
        tip_x as i64,
        tip_y as i64,
        (base_x - px) as i64,
        (base_y - py) as i64,
        EDGE_COLOR,
    );
}

fn text_width(text: &str, scale: i64) -> i64 {
    text.chars().count() as i64 * 6 * scale
}

fn draw_text(canvas: &mut RgbaImage, x: i64, y: i64, text: &str, scale: i64, color: Rgba<u8>) {
    let mut cursor = x;
    for ch in text.chars() {
        let rows = glyph(ch);
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..5 {
                if bits & (0b10000 >> col) != 0 {
                    for sy in 0..scale {
                        for sx in 0..scale {
                            put(
                                canvas,
                                cursor + col as i64 * scale + sx,
                                y + row as i64 * scale + sy,
                                color,
                            );
                        }
                    }
                }
            }
        }
        cursor += 6 * scale;
    }
}

/// 5x7 glyph rows, bit 4 leftmost. Covers uppercase, digits, and the
/// punctuation that shows up in entity names; everything else boxes.
fn glyph(ch: char) -> [u8; 7] {
    let ch = ch.to_ascii_uppercase();
    match ch {
        ' ' => [0; 7],
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b11011, 0b10001],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00110, 0b01000, 0b10000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        ':' => [0b00000, 0b00100, 0b00100, 0b00000, 0b00100, 0b00100, 0b00000],
        '-' => [0b00000, 0b00000, 0b00000, 0b01110, 0b00000, 0b00000, 0b00000],
        '_' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b11111],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00110, 0b00110],
        ',' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00110, 0b00010, 0b00100],
        '&' => [0b01100, 0b10010, 0b10100, 0b01000, 0b10101, 0b10010, 0b01101],
        '(' => [0b00010, 0b00100, 0b01000, 0b01000, 0b01000, 0b00100, 0b00010],
        ')' => [0b01000, 0b00100, 0b00010, 0b00010, 0b00010, 0b00100, 0b01000],
        '\'' => [0b00100, 0b00100, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000],
        '/' => [0b00001, 0b00010, 0b00010, 0b00100, 0b01000, 0b01000, 0b10000],
        _ => [0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111],
    }
}
