//! Grid - 2D view of a vector for rendering
//!
//! ## Reshape rule
//!
//! A vector of length `L` is filled row-major into a `rows × cols` grid and
//! then transposed. The first grid axis of the result is the horizontal pixel
//! axis, so after the transpose cell `(x, y)` holds `vector[y * cols + x]`.
//!
//! ```text
//! v = [a b c d e f], rows = 2, cols = 3
//!
//! row-major          transposed (x →, y ↓)
//! [a b c]            a b c
//! [d e f]            d e f
//! ```

use crate::encoder::SparseVector;
use crate::{Error, Result};

/// Requested reshape geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    /// Rows of the row-major fill
    pub rows: usize,
    /// Columns of the row-major fill
    pub cols: usize,
}

impl GridShape {
    /// Explicit shape.
    #[must_use]
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// `side × side` with `side = floor(sqrt(len))`, only for perfect squares.
    #[must_use]
    pub fn square(len: usize) -> Option<Self> {
        let side = isqrt(len);
        (side > 0 && side * side == len).then_some(Self::new(side, side))
    }

    /// Factor pair of `len` closest to a square, `rows <= cols`.
    ///
    /// Returns `None` for `len == 0`.
    #[must_use]
    pub fn balanced(len: usize) -> Option<Self> {
        if len == 0 {
            return None;
        }
        let rows = (1..=isqrt(len)).rev().find(|r| len % r == 0).unwrap_or(1);
        Some(Self::new(rows, len / rows))
    }

    /// Number of cells.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// True when the shape has no cells.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn isqrt(n: usize) -> usize {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    let mut root = (n as f64).sqrt() as usize;
    while root * root > n {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= n {
        root += 1;
    }
    root
}

/// Dense 2D grid indexed `(x, y)`; `x` spans `width`, `y` spans `height`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T: Copy> Grid<T> {
    /// Build a grid cell by cell.
    #[must_use]
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for x in 0..width {
            for y in 0..height {
                cells.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    /// Row-major fill: `grid[i][j] = data[i * cols + j]` with `i` on the first axis.
    ///
    /// # Errors
    ///
    /// Returns `Error::Shape` if `data.len() != shape.rows * shape.cols` or
    /// the shape is empty.
    pub fn from_row_major(data: &[T], shape: GridShape) -> Result<Self> {
        if shape.is_empty() || data.len() != shape.len() {
            return Err(Error::Shape(format!(
                "cannot fill {} values into a {}x{} grid",
                data.len(),
                shape.rows,
                shape.cols
            )));
        }
        Ok(Self::from_fn(shape.rows, shape.cols, |i, j| {
            data[i * shape.cols + j]
        }))
    }

    /// Swap the axes.
    #[must_use]
    pub fn transpose(&self) -> Self {
        Self::from_fn(self.height, self.width, |x, y| self.get(y, x))
    }

    /// Extent of the first axis.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Extent of the second axis.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Cell value. Panics if out of bounds.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.cells[x * self.height + y]
    }
}

impl Grid<u8> {
    /// Reshape a sparse vector for rendering (row-major fill, then transpose).
    ///
    /// Without an explicit shape the vector length must be a perfect square.
    ///
    /// # Errors
    ///
    /// Returns `Error::Shape` if no shape is given for a non-square length, or
    /// the given shape does not cover the vector exactly.
    pub fn reshape(vector: &SparseVector, shape: Option<GridShape>) -> Result<Self> {
        let shape = match shape {
            Some(shape) => shape,
            None => GridShape::square(vector.len()).ok_or_else(|| {
                Error::Shape(format!(
                    "vector of length {} is not a perfect square; an explicit width/height is required",
                    vector.len()
                ))
            })?,
        };
        Ok(Self::from_row_major(vector.bits(), shape)?.transpose())
    }

    /// Number of active cells.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == 1).count()
    }
}
