//! Heatmap renderer for continuous-valued grids
//!
//! Colors come from a 3-stop ramp:
//!
//! ```text
//! value:  ... green_start ...... yellow_middle ...... red_start ...
//! color:  green ──────── blend ───── yellow ───── blend ───── red
//! ```

use image::{Rgb, RgbImage};

use super::{encode_png, Grid};
use crate::{Error, Result};

/// Green stop `#63BE7B`.
pub const GREEN: Rgb<u8> = Rgb([99, 190, 123]);
/// Yellow stop `#FEFF84`.
pub const YELLOW: Rgb<u8> = Rgb([254, 255, 132]);
/// Red stop `#FF0000`.
pub const RED: Rgb<u8> = Rgb([255, 0, 0]);

/// The three named thresholds of the color ramp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatmapThresholds {
    green_start: f64,
    yellow_middle: f64,
    red_start: f64,
}

impl Default for HeatmapThresholds {
    fn default() -> Self {
        Self {
            green_start: 20.0,
            yellow_middle: 127.0,
            red_start: 200.0,
        }
    }
}

impl HeatmapThresholds {
    /// Build thresholds.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` unless
    /// `green_start <= yellow_middle <= red_start` and all are finite.
    pub fn new(green_start: f64, yellow_middle: f64, red_start: f64) -> Result<Self> {
        let finite = green_start.is_finite() && yellow_middle.is_finite() && red_start.is_finite();
        if !finite || green_start > yellow_middle || yellow_middle > red_start {
            return Err(Error::Configuration(format!(
                "heatmap thresholds must satisfy green {green_start} <= yellow {yellow_middle} <= red {red_start}"
            )));
        }
        Ok(Self {
            green_start,
            yellow_middle,
            red_start,
        })
    }

    /// Map a value onto the ramp.
    #[must_use]
    pub fn color(&self, value: f64) -> Rgb<u8> {
        if value <= self.green_start {
            GREEN
        } else if value >= self.red_start {
            RED
        } else if value > self.yellow_middle {
            blend(YELLOW, RED, self.yellow_middle, self.red_start, value)
        } else {
            blend(GREEN, YELLOW, self.green_start, self.yellow_middle, value)
        }
    }
}

/// Linear blend; channel = `low + round((high - low) * ratio)`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn blend(low: Rgb<u8>, high: Rgb<u8>, low_bound: f64, high_bound: f64, value: f64) -> Rgb<u8> {
    let span = high_bound - low_bound;
    let ratio = if span > 0.0 {
        ((value - low_bound) / span).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let mut out = [0u8; 3];
    for (channel, (lo, hi)) in out.iter_mut().zip(low.0.into_iter().zip(high.0)) {
        let diff = f64::from(hi) - f64::from(lo);
        *channel = (f64::from(lo) + (diff * ratio).round()).clamp(0.0, 255.0) as u8;
    }
    Rgb(out)
}

/// Paint several heat grids side by side.
///
/// Grid `n` starts at `x = n * (width / count)`. Its cell size is
/// `max(1, slot / (grid_width + 1))`, leaving at least one cell of gap
/// between neighbours. Cells falling outside the canvas are clipped.
///
/// # Errors
///
/// Returns `Error::Shape` if there are no grids, or the summed grid widths or
/// heights exceed the canvas.
pub fn render_heatmaps(
    grids: &[Grid<f64>],
    width: u32,
    height: u32,
    thresholds: HeatmapThresholds,
) -> Result<Vec<u8>> {
    if grids.is_empty() {
        return Err(Error::Shape("heatmap render needs at least one grid".to_string()));
    }
    let total_width: usize = grids.iter().map(Grid::width).sum();
    let total_height: usize = grids.iter().map(Grid::height).sum();
    if total_width > width as usize || total_height > height as usize {
        return Err(Error::Shape(format!(
            "grids totalling {total_width}x{total_height} cells do not fit a {width}x{height} px canvas"
        )));
    }

    let count = u32::try_from(grids.len())
        .map_err(|_| Error::Shape("too many heatmap grids".to_string()))?;
    let slot = width / count;
    let mut image = RgbImage::new(width, height);

    for (n, grid) in (0u32..).zip(grids) {
        let grid_width = u32::try_from(grid.width())
            .map_err(|_| Error::Shape("heatmap grid too wide".to_string()))?;
        let scale = (slot / (grid_width + 1)).max(1);
        let origin_x = n * slot;

        for x in 0..grid.width() {
            for y in 0..grid.height() {
                let color = thresholds.color(grid.get(x, y));
                #[allow(clippy::cast_possible_truncation)]
                let (cx, cy) = (x as u32 * scale, y as u32 * scale);
                for px in 0..scale {
                    for py in 0..scale {
                        let (ix, iy) = (origin_x + cx + px, cy + py);
                        if ix < width && iy < height {
                            image.put_pixel(ix, iy, color);
                        }
                    }
                }
            }
        }
    }

    encode_png(&image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_endpoints() {
        let t = HeatmapThresholds::default();
        assert_eq!(t.color(-5.0), GREEN);
        assert_eq!(t.color(20.0), GREEN);
        assert_eq!(t.color(200.0), RED);
        assert_eq!(t.color(1e9), RED);
        assert_eq!(t.color(127.0), YELLOW);
    }

    #[test]
    fn test_midpoint_yellow_red() {
        let t = HeatmapThresholds::new(0.0, 100.0, 200.0).unwrap();
        // yellow (254,255,132) -> red (255,0,0), ratio 0.5
        assert_eq!(t.color(150.0), Rgb([255, 127, 66]));
    }

    #[test]
    fn test_midpoint_green_yellow() {
        let t = HeatmapThresholds::new(0.0, 100.0, 200.0).unwrap();
        // green (99,190,123) -> yellow (254,255,132), ratio 0.5
        assert_eq!(t.color(50.0), Rgb([177, 223, 128]));
    }

    #[test]
    fn test_invalid_thresholds() {
        assert!(HeatmapThresholds::new(10.0, 5.0, 20.0).is_err());
        assert!(HeatmapThresholds::new(0.0, f64::NAN, 20.0).is_err());
    }

    #[test]
    fn test_render_rejects_oversized() {
        let grid = Grid::from_fn(30, 30, |_, _| 0.0);
        assert!(matches!(
            render_heatmaps(&[grid], 20, 20, HeatmapThresholds::default()),
            Err(Error::Shape(_))
        ));
    }
}
