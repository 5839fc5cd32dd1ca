//! Built-in 5×7 glyphs for image labels

use image::{Rgb, RgbImage};

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const ADVANCE: u32 = GLYPH_WIDTH + 1;

/// Text label drawn at the image origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextOverlay {
    /// Label text. Lowercase is drawn as uppercase, unknown characters as blanks.
    pub text: String,
    /// Ink color
    pub color: Rgb<u8>,
    /// Edge length in pixels of one glyph dot
    pub pixel_size: u32,
}

impl TextOverlay {
    /// White label with 4 px dots.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: Rgb([255, 255, 255]),
            pixel_size: 4,
        }
    }

    /// Set the ink color.
    #[must_use]
    pub const fn color(mut self, color: Rgb<u8>) -> Self {
        self.color = color;
        self
    }

    /// Set the dot size.
    #[must_use]
    pub const fn pixel_size(mut self, pixel_size: u32) -> Self {
        self.pixel_size = pixel_size;
        self
    }

    /// Draw onto `image` starting at `(0, 0)`; anything past the edge is clipped.
    pub fn draw(&self, image: &mut RgbImage) {
        let dot = self.pixel_size.max(1);
        let advance = ADVANCE.saturating_mul(dot);
        let (width, height) = image.dimensions();

        for (index, ch) in (0u32..).zip(self.text.chars()) {
            let origin_x = index.saturating_mul(advance);
            if origin_x >= width {
                break;
            }
            let rows = glyph(ch.to_ascii_uppercase());
            for (gy, row) in (0u32..).zip(rows) {
                let top = gy.saturating_mul(dot);
                if top >= height {
                    break;
                }
                let bottom = top.saturating_add(dot).min(height);
                for gx in 0..GLYPH_WIDTH {
                    if row & (0x10 >> gx) == 0 {
                        continue;
                    }
                    let left = origin_x.saturating_add(gx.saturating_mul(dot));
                    if left >= width {
                        break;
                    }
                    let right = left.saturating_add(dot).min(width);
                    for y in top..bottom {
                        for x in left..right {
                            image.put_pixel(x, y, self.color);
                        }
                    }
                }
            }
        }
    }

    /// Pixel width of the rendered label.
    #[must_use]
    pub fn rendered_width(&self) -> u32 {
        let chars = u32::try_from(self.text.chars().count()).unwrap_or(u32::MAX);
        chars.saturating_mul(ADVANCE.saturating_mul(self.pixel_size.max(1)))
    }

    /// Pixel height of the rendered label.
    #[must_use]
    pub fn rendered_height(&self) -> u32 {
        GLYPH_HEIGHT.saturating_mul(self.pixel_size.max(1))
    }
}

/// Rows of a glyph, top to bottom; bit 4 is the leftmost column.
const fn glyph(ch: char) -> [u8; 7] {
    match ch {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
        _ => [0; 7],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_single_glyph() {
        let mut image = RgbImage::new(10, 10);
        TextOverlay::new("1").pixel_size(1).draw(&mut image);
        // top row of '1' is the centre column only
        assert_eq!(image.get_pixel(2, 0), &Rgb([255, 255, 255]));
        assert_eq!(image.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_draw_clips_at_edge() {
        let mut image = RgbImage::new(3, 3);
        TextOverlay::new("WWW").pixel_size(2).draw(&mut image);
        assert_eq!(image.dimensions(), (3, 3));
    }

    #[test]
    fn test_lowercase_matches_uppercase() {
        let mut lower = RgbImage::new(20, 10);
        let mut upper = RgbImage::new(20, 10);
        TextOverlay::new("ab").pixel_size(1).draw(&mut lower);
        TextOverlay::new("AB").pixel_size(1).draw(&mut upper);
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_rendered_extent() {
        let overlay = TextOverlay::new("42").pixel_size(3);
        assert_eq!(overlay.rendered_width(), 36);
        assert_eq!(overlay.rendered_height(), 21);
    }

    #[test]
    fn test_huge_dot_size_clips_without_overflow() {
        let mut image = RgbImage::new(10, 10);
        let overlay = TextOverlay::new("W8W").pixel_size(u32::MAX);

        overlay.draw(&mut image);

        // the first dot of 'W' covers the whole raster
        assert!(image.pixels().all(|p| *p == Rgb([255, 255, 255])));
        assert_eq!(overlay.rendered_width(), u32::MAX);
        assert_eq!(overlay.rendered_height(), u32::MAX);
    }
}
