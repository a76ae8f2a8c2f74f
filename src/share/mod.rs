// src/share/mod.rs

//! Server-side composition of the result card users share into chats.

pub mod glyphs;

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};

use crate::{error::AppError, models::share_card::ShareCard};
use glyphs::{ADVANCE, GLYPH_WIDTH, glyph_or_fallback, text_width};

pub const CARD_WIDTH: u32 = 1200;
pub const CARD_HEIGHT: u32 = 630;

const MAX_NAME_GLYPHS: usize = 20;

const GRADIENT_TOP: [u8; 3] = [0x2A, 0x5A, 0xF5];
const GRADIENT_BOTTOM: [u8; 3] = [0x8E, 0x2D, 0xE2];
const PANEL: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);
const INK: Rgba<u8> = Rgba([0x1C, 0x1E, 0x2B, 0xFF]);
const MUTED: Rgba<u8> = Rgba([0x7A, 0x7F, 0x99, 0xFF]);
pub const BAR_TRACK: Rgba<u8> = Rgba([0xE3, 0xE6, 0xF0, 0xFF]);
pub const BAR_FILL: Rgba<u8> = Rgba([0x2A, 0xB6, 0x6E, 0xFF]);

const PANEL_X: u32 = 60;
const PANEL_Y: u32 = 60;
const PANEL_W: u32 = CARD_WIDTH - 2 * PANEL_X;
const PANEL_H: u32 = CARD_HEIGHT - 2 * PANEL_Y;
const PANEL_RADIUS: u32 = 32;

pub const BAR_X: u32 = 140;
pub const BAR_Y: u32 = 440;
pub const BAR_W: u32 = CARD_WIDTH - 2 * BAR_X;
pub const BAR_H: u32 = 48;

/// Renders the card off the async runtime.
pub async fn render(card: ShareCard) -> Result<Vec<u8>, AppError> {
    tokio::task::spawn_blocking(move || render_share_card(&card))
        .await
        .map_err(|e| AppError::InternalServerError(format!("share card render task failed: {e}")))?
}

/// Composes the PNG for `card`. Same card, same bytes.
pub fn render_share_card(card: &ShareCard) -> Result<Vec<u8>, AppError> {
    let mut img = RgbaImage::new(CARD_WIDTH, CARD_HEIGHT);

    paint_gradient(&mut img);
    fill_rounded_rect(&mut img, PANEL_X, PANEL_Y, PANEL_W, PANEL_H, PANEL_RADIUS, PANEL);

    let inner_width = PANEL_W - 2 * 40;

    draw_text_centered(&mut img, "QUIZ RESULT", 100, 4, MUTED);

    let name = card_name(&card.display_name);
    let name_scale = fit_scale(&name, inner_width, 9);
    draw_text_centered(&mut img, &name, 160, name_scale, INK);

    draw_text_centered(&mut img, &format!("SCORE {}", card.score), 270, 8, INK);
    draw_text_centered(
        &mut img,
        &format!("{}/{} CORRECT", card.correct_count, card.total_questions),
        360,
        5,
        MUTED,
    );

    fill_rect(&mut img, BAR_X, BAR_Y, BAR_W, BAR_H, BAR_TRACK);
    let filled = (f64::from(BAR_W) * card.accuracy()).round() as u32;
    fill_rect(&mut img, BAR_X, BAR_Y, filled, BAR_H, BAR_FILL);

    let percent = (card.accuracy() * 100.0).round() as u32;
    draw_text_centered(&mut img, &format!("{percent}%"), 510, 4, MUTED);

    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| AppError::InternalServerError(format!("failed to encode share card: {e}")))?;
    Ok(bytes)
}

/// Upper-cased, truncated display name, `PLAYER` if nothing is left.
fn card_name(display_name: &str) -> String {
    let name: String = display_name
        .trim()
        .to_uppercase()
        .chars()
        .take(MAX_NAME_GLYPHS)
        .collect();
    if name.is_empty() {
        "PLAYER".to_string()
    } else {
        name
    }
}

/// Largest integer scale up to `max` at which `text` fits in `width`.
fn fit_scale(text: &str, width: u32, max: u32) -> u32 {
    let unit = text_width(text, 1).max(1);
    (width / unit).clamp(1, max)
}

fn paint_gradient(img: &mut RgbaImage) {
    let h = img.height().max(2) - 1;
    for y in 0..img.height() {
        let t = f64::from(y) / f64::from(h);
        let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        let color = Rgba([
            mix(GRADIENT_TOP[0], GRADIENT_BOTTOM[0]),
            mix(GRADIENT_TOP[1], GRADIENT_BOTTOM[1]),
            mix(GRADIENT_TOP[2], GRADIENT_BOTTOM[2]),
            0xFF,
        ]);
        for x in 0..img.width() {
            img.put_pixel(x, y, color);
        }
    }
}

/// Fills a rectangle, clipped to the image.
fn fill_rect(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    let x_end = x.saturating_add(w).min(img.width());
    let y_end = y.saturating_add(h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, color);
        }
    }
}

fn fill_rounded_rect(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, r: u32, color: Rgba<u8>) {
    let r = f64::from(r.min(w / 2).min(h / 2));
    let (w_f, h_f) = (f64::from(w), f64::from(h));
    for py in y..(y + h).min(img.height()) {
        for px in x..(x + w).min(img.width()) {
            // Pixel centre, and the nearest point of the rectangle shrunk by the radius.
            let (fx, fy) = (f64::from(px - x) + 0.5, f64::from(py - y) + 0.5);
            let (cx, cy) = (fx.clamp(r, w_f - r), fy.clamp(r, h_f - r));
            if (fx - cx).powi(2) + (fy - cy).powi(2) > r * r {
                continue;
            }
            img.put_pixel(px, py, color);
        }
    }
}

fn draw_text(img: &mut RgbaImage, text: &str, x: u32, y: u32, scale: u32, color: Rgba<u8>) {
    for (i, c) in text.chars().enumerate() {
        let g = glyph_or_fallback(c);
        let gx = x + i as u32 * ADVANCE * scale;
        for (row, bits) in g.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if (*bits >> (GLYPH_WIDTH - 1 - col)) & 1 == 1 {
                    fill_rect(img, gx + col * scale, y + row as u32 * scale, scale, scale, color);
                }
            }
        }
    }
}

fn draw_text_centered(img: &mut RgbaImage, text: &str, y: u32, scale: u32, color: Rgba<u8>) {
    let w = text_width(text, scale);
    let x = img.width().saturating_sub(w) / 2;
    draw_text(img, text, x, y, scale, color);
}
