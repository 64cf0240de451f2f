//! Drawing backend wrapper that renders text without system fonts.
//!
//! Without the `ttf` feature plotters has no glyph rasterizer, so every
//! string is drawn with the small bitmap font below. With `ttf` enabled the
//! inner backend is tried first and the bitmap font covers font failures.

#[cfg(feature = "ttf")]
use std::panic;

use plotters_backend::{
    text_anchor, BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend,
    DrawingErrorKind,
};

pub(crate) struct FontSafeBackend<DB> {
    inner: DB,
}

impl<DB> FontSafeBackend<DB> {
    pub(crate) fn new(inner: DB) -> Self {
        Self { inner }
    }
}

impl<DB: DrawingBackend> DrawingBackend for FontSafeBackend<DB> {
    type ErrorType = DB::ErrorType;

    fn get_size(&self) -> (u32, u32) {
        self.inner.get_size()
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.ensure_prepared()
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.present()
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        self.inner.draw_pixel(point, color)
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        self.inner.draw_line(from, to, style)
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        self.inner.draw_rect(upper_left, bottom_right, style, fill)
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        self.inner.draw_path(path, style)
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_circle(center, radius, style, fill)
    }

    fn fill_polygon<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        vert: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.fill_polygon(vert, style)
    }

    fn blit_bitmap(
        &mut self,
        pos: BackendCoord,
        (iw, ih): (u32, u32),
        src: &[u8],
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.blit_bitmap(pos, (iw, ih), src)
    }

    #[cfg(feature = "ttf")]
    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        match panic::catch_unwind(panic::AssertUnwindSafe(|| {
            self.inner.draw_text(text, style, pos)
        })) {
            Ok(Ok(())) => Ok(()),
            _ => self.draw_text_fallback(text, style, pos),
        }
    }

    #[cfg(not(feature = "ttf"))]
    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.draw_text_fallback(text, style, pos)
    }

    #[cfg(feature = "ttf")]
    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<Self::ErrorType>> {
        match panic::catch_unwind(panic::AssertUnwindSafe(|| {
            self.inner.estimate_text_size(text, style)
        })) {
            Ok(Ok(size)) => Ok(size),
            _ => Ok(fallback_text_size(text, style.size())),
        }
    }

    #[cfg(not(feature = "ttf"))]
    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<Self::ErrorType>> {
        Ok(fallback_text_size(text, style.size()))
    }
}

impl<DB: DrawingBackend> FontSafeBackend<DB> {
    fn draw_text_fallback<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        let color = style.color();
        if color.alpha == 0.0 || text.trim().is_empty() {
            return Ok(());
        }

        let scale = glyph_scale(style.size());
        let (width, height) = fallback_text_size(text, style.size());
        let (width, height) = (width as i32, height as i32);
        let dx = match style.anchor().h_pos {
            text_anchor::HPos::Left => 0,
            text_anchor::HPos::Right => -width,
            text_anchor::HPos::Center => -width / 2,
        };
        let dy = match style.anchor().v_pos {
            text_anchor::VPos::Top => 0,
            text_anchor::VPos::Center => -height / 2,
            text_anchor::VPos::Bottom => -height,
        };
        let transform = style.transform();

        let mut cursor_x = dx;
        for ch in text.chars() {
            if let Some(glyph) = fallback_glyph(ch) {
                for (row, pattern) in glyph.rows.iter().enumerate() {
                    for col in 0..glyph.width {
                        if pattern & (1 << (glyph.width - 1 - col)) == 0 {
                            continue;
                        }
                        let x0 = cursor_x + col as i32 * scale;
                        let y0 = dy + row as i32 * scale;
                        for sx in 0..scale {
                            for sy in 0..scale {
                                let (tx, ty) = transform.transform(x0 + sx, y0 + sy);
                                self.inner
                                    .draw_pixel((pos.0 + tx, pos.1 + ty), color.clone())?;
                            }
                        }
                    }
                }
            }
            cursor_x += glyph_advance(ch) * scale;
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
struct Glyph {
    width: u8,
    rows: [u8; FALLBACK_FONT_HEIGHT],
}

const FALLBACK_FONT_HEIGHT: usize = 7;
const FALLBACK_SPACE_WIDTH: i32 = 3;

/// Pixel multiplier so the cap height is roughly 70% of the font size.
fn glyph_scale(font_size: f64) -> i32 {
    ((font_size * 0.7) / FALLBACK_FONT_HEIGHT as f64)
        .round()
        .max(1.0) as i32
}

fn glyph_advance(ch: char) -> i32 {
    match fallback_glyph(ch) {
        Some(glyph) => glyph.width as i32 + 1,
        None => FALLBACK_SPACE_WIDTH,
    }
}

fn fallback_text_size(text: &str, font_size: f64) -> (u32, u32) {
    let scale = glyph_scale(font_size);
    let advance: i32 = text.chars().map(glyph_advance).sum::<i32>() * scale;
    let width = (advance - scale).max(0);
    (width as u32, (FALLBACK_FONT_HEIGHT as i32 * scale) as u32)
}

fn fallback_glyph(ch: char) -> Option<Glyph> {
    let (width, rows): (u8, [u8; FALLBACK_FONT_HEIGHT]) = match ch.to_ascii_uppercase() {
        'A' => (5, [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
        'B' => (5, [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110]),
        'C' => (5, [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110]),
        'D' => (5, [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100]),
        'E' => (5, [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111]),
        'F' => (5, [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000]),
        'G' => (5, [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111]),
        'H' => (5, [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
        'I' => (3, [0b111, 0b010, 0b010, 0b010, 0b010, 0b010, 0b111]),
        'J' => (5, [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100]),
        'K' => (5, [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001]),
        'L' => (5, [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111]),
        'M' => (5, [0b10001, 0b11011, 0b10101, 0b10001, 0b10001, 0b10001, 0b10001]),
        'N' => (5, [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001]),
        'O' => (5, [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
        'P' => (5, [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000]),
        'Q' => (5, [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101]),
        'R' => (5, [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001]),
        'S' => (5, [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110]),
        'T' => (5, [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100]),
        'U' => (5, [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
        'V' => (5, [0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b01010, 0b00100]),
        'W' => (5, [0b10001, 0b10001, 0b10001, 0b10001, 0b10101, 0b11011, 0b10001]),
        'X' => (5, [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001]),
        'Y' => (5, [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100]),
        'Z' => (5, [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111]),
        '0' => (5, [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110]),
        '1' => (3, [0b010, 0b110, 0b010, 0b010, 0b010, 0b010, 0b111]),
        '2' => (5, [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111]),
        '3' => (5, [0b11110, 0b00001, 0b00001, 0b00110, 0b00001, 0b00001, 0b11110]),
        '4' => (5, [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010]),
        '5' => (5, [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110]),
        '6' => (5, [0b01110, 0b10001, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110]),
        '7' => (5, [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000]),
        '8' => (5, [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110]),
        '9' => (5, [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b10001, 0b01110]),
        '-' => (3, [0b000, 0b000, 0b000, 0b111, 0b000, 0b000, 0b000]),
        '+' => (3, [0b000, 0b000, 0b010, 0b111, 0b010, 0b000, 0b000]),
        '=' => (3, [0b000, 0b000, 0b111, 0b000, 0b111, 0b000, 0b000]),
        '.' => (1, [0b0, 0b0, 0b0, 0b0, 0b0, 0b0, 0b1]),
        ',' => (2, [0b00, 0b00, 0b00, 0b00, 0b00, 0b01, 0b10]),
        '_' => (3, [0b000, 0b000, 0b000, 0b000, 0b000, 0b000, 0b111]),
        '/' => (3, [0b001, 0b001, 0b010, 0b010, 0b100, 0b100, 0b100]),
        '(' => (3, [0b001, 0b010, 0b100, 0b100, 0b100, 0b010, 0b001]),
        ')' => (3, [0b100, 0b010, 0b001, 0b001, 0b001, 0b010, 0b100]),
        ':' => (1, [0b0, 0b1, 0b0, 0b0, 0b0, 0b1, 0b0]),
        _ => return None,
    };
    Some(Glyph { width, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_size_grows_with_font_size() {
        let (w_small, h_small) = fallback_text_size("N=250", 12.0);
        let (w_large, h_large) = fallback_text_size("N=250", 24.0);
        assert!(w_large > w_small);
        assert!(h_large > h_small);
        assert_eq!(h_small, FALLBACK_FONT_HEIGHT as u32);
    }

    #[test]
    fn labels_used_in_figures_have_glyphs() {
        for ch in "Sample Size (N) Treatment=3 ATET - True Effect 0.95 bwfactor=1.5".chars() {
            assert!(ch == ' ' || fallback_glyph(ch).is_some(), "missing glyph {:?}", ch);
        }
    }

    #[test]
    fn empty_text_has_zero_width() {
        assert_eq!(fallback_text_size("", 12.0).0, 0);
    }
}
