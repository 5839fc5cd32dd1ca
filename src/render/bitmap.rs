//! Binary grid renderers: full grid, 1D strip, and side-by-side batch

use image::RgbImage;

use super::{encode_png, Grid, Palette, TextOverlay};
use crate::encoder::SparseVector;
use crate::{Error, Result};

/// Height in pixels of a 1D strip.
pub const STRIP_HEIGHT: u32 = 50;

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::Shape(format!("{what} {value} exceeds u32")))
}

fn color_of(cell: u8, palette: Palette) -> image::Rgb<u8> {
    if cell == 1 {
        palette.active
    } else {
        palette.inactive
    }
}

/// Scale factor for fitting `grid_width` cells into `target_width` pixels.
///
/// `ceil(target_width / grid_width)`, so the image is never narrower than requested.
#[must_use]
pub const fn cell_scale(target_width: u32, grid_width: u32) -> u32 {
    target_width.div_ceil(grid_width)
}

/// Paint a binary grid; every cell becomes a `scale × scale` block.
///
/// # Errors
///
/// Returns `Error::Shape` if the grid is empty or larger than the target in
/// either dimension.
pub fn render_grid(
    grid: &Grid<u8>,
    target_width: u32,
    target_height: u32,
    palette: Palette,
    overlay: Option<&TextOverlay>,
) -> Result<Vec<u8>> {
    let grid_width = to_u32(grid.width(), "grid width")?;
    let grid_height = to_u32(grid.height(), "grid height")?;

    if grid_width == 0 || grid_height == 0 {
        return Err(Error::Shape("cannot render an empty grid".to_string()));
    }
    if grid_width > target_width || grid_height > target_height {
        return Err(Error::Shape(format!(
            "requested {target_width}x{target_height} px is smaller than the {grid_width}x{grid_height} grid"
        )));
    }

    let scale = cell_scale(target_width, grid_width);
    let mut image = RgbImage::from_fn(grid_width * scale, grid_height * scale, |px, py| {
        color_of(grid.get((px / scale) as usize, (py / scale) as usize), palette)
    });

    if let Some(overlay) = overlay {
        overlay.draw(&mut image);
    }

    encode_png(&image)
}

/// Paint a vector as a single row of `scale`-wide cells, [`STRIP_HEIGHT`] tall.
///
/// # Errors
///
/// Returns `Error::Shape` for an empty vector or a zero scale.
pub fn render_strip(vector: &SparseVector, scale: u32, palette: Palette) -> Result<Vec<u8>> {
    if vector.is_empty() || scale == 0 {
        return Err(Error::Shape(format!(
            "cannot render a strip of {} cells at scale {scale}",
            vector.len()
        )));
    }
    let cells = to_u32(vector.len(), "strip length")?;
    let width = cells
        .checked_mul(scale)
        .ok_or_else(|| Error::Shape(format!("strip of {cells} cells at scale {scale} overflows")))?;

    let bits = vector.bits();
    let image = RgbImage::from_fn(width, STRIP_HEIGHT, |px, _| {
        color_of(bits[(px / scale) as usize], palette)
    });

    encode_png(&image)
}

/// Paint several grids left to right into one `width × height` image.
///
/// Each grid gets `width / count` pixels of horizontal room; its cell width
/// is that slot divided by the grid width and its cell height is
/// `height / grid_height`.
///
/// # Errors
///
/// Returns `Error::Shape` when there are no grids or a grid does not fit at
/// least one pixel per cell.
pub fn render_batch(
    grids: &[Grid<u8>],
    width: u32,
    height: u32,
    palette: Palette,
) -> Result<Vec<u8>> {
    if grids.is_empty() {
        return Err(Error::Shape("batch render needs at least one grid".to_string()));
    }
    let count = to_u32(grids.len(), "grid count")?;
    let slot = width / count;

    let mut image = RgbImage::from_pixel(width, height, palette.inactive);
    let mut offset_x = 0u32;

    for (index, grid) in grids.iter().enumerate() {
        let grid_width = to_u32(grid.width(), "grid width")?;
        let grid_height = to_u32(grid.height(), "grid height")?;
        let scale_w = slot.checked_div(grid_width).unwrap_or(0);
        let scale_h = height.checked_div(grid_height).unwrap_or(0);
        if scale_w == 0 || scale_h == 0 {
            return Err(Error::Shape(format!(
                "grid {index} ({grid_width}x{grid_height}) does not fit a {slot}x{height} px slot"
            )));
        }

        for x in 0..grid_width {
            for y in 0..grid_height {
                let color = color_of(grid.get(x as usize, y as usize), palette);
                for px in 0..scale_w {
                    for py in 0..scale_h {
                        image.put_pixel(offset_x + x * scale_w + px, y * scale_h + py, color);
                    }
                }
            }
        }
        offset_x += grid_width * scale_w;
    }

    encode_png(&image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::GridShape;

    #[test]
    fn test_cell_scale_rounds_up() {
        assert_eq!(cell_scale(1024, 10), 103);
        assert_eq!(cell_scale(1024, 16), 64);
    }

    #[test]
    fn test_render_grid_rejects_oversized_grid() {
        let grid = Grid::from_fn(20, 20, |_, _| 0u8);
        assert!(matches!(
            render_grid(&grid, 10, 10, Palette::yellow_on_black(), None),
            Err(Error::Shape(_))
        ));
    }

    #[test]
    fn test_render_strip_rejects_empty() {
        assert!(matches!(
            render_strip(&SparseVector::zeros(0), 4, Palette::black_on_white()),
            Err(Error::Shape(_))
        ));
    }

    #[test]
    fn test_render_batch_rejects_tight_slot() {
        let v = SparseVector::zeros(100);
        let grid = Grid::reshape(&v, Some(GridShape::new(10, 10))).unwrap();
        let grids = vec![grid.clone(), grid.clone(), grid];
        assert!(matches!(
            render_batch(&grids, 20, 100, Palette::yellow_on_black()),
            Err(Error::Shape(_))
        ));
    }
}
