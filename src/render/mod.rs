//! Bitmap renderer - sparse vectors and heat grids to PNG byte buffers
//!
//! Every renderer is a pure function of (data, dimensions, colors, optional
//! label) and returns the encoded PNG in memory, so callers can forward the
//! bytes straight to storage.
//!
//! ## Usage
//!
//! ```rust
//! use sdr_bitmap::encoder::{BinaryEncoder};
//! use sdr_bitmap::render::{render_grid, Grid, GridShape, Palette};
//!
//! let sdr = BinaryEncoder::new(144)?.encode("40148")?;
//! let grid = Grid::reshape(&sdr, None)?; // 12 x 12
//! let png = render_grid(&grid, 240, 240, Palette::yellow_on_black(), None)?;
//! assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
//! # Ok::<(), sdr_bitmap::Error>(())
//! ```

mod bitmap;
mod glyph;
mod grid;
mod heatmap;

pub use bitmap::{cell_scale, render_batch, render_grid, render_strip, STRIP_HEIGHT};
pub use glyph::TextOverlay;
pub use grid::{Grid, GridShape};
pub use heatmap::{render_heatmaps, HeatmapThresholds, GREEN, RED, YELLOW};
pub use image::Rgb;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};

use crate::Result;

/// Foreground/background colors for binary renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Color of cells set to 1
    pub active: Rgb<u8>,
    /// Color of cells set to 0
    pub inactive: Rgb<u8>,
}

impl Palette {
    /// Custom palette.
    #[must_use]
    pub const fn new(active: Rgb<u8>, inactive: Rgb<u8>) -> Self {
        Self { active, inactive }
    }

    /// Yellow cells on black (grid renders).
    #[must_use]
    pub const fn yellow_on_black() -> Self {
        Self::new(Rgb([255, 255, 0]), Rgb([0, 0, 0]))
    }

    /// Blue cells on white (scalar renders).
    #[must_use]
    pub const fn blue_on_white() -> Self {
        Self::new(Rgb([0, 0, 255]), Rgb([255, 255, 255]))
    }

    /// Black cells on white (1D strips).
    #[must_use]
    pub const fn black_on_white() -> Self {
        Self::new(Rgb([0, 0, 0]), Rgb([255, 255, 255]))
    }
}

/// Output geometry shared by the pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
    /// Target image width in pixels
    pub width: u32,
    /// Target image height in pixels
    pub height: u32,
    /// Cell width of 1D strips
    pub strip_scale: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            strip_scale: 200,
        }
    }
}

/// Encode an RGB image as PNG.
///
/// # Errors
///
/// Returns `Error::Image` if the encoder rejects the buffer.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(buf)
}
