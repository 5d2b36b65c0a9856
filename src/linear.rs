//! Support for linear algebra.

use std::ops::{Index, IndexMut};
use std::slice::ChunksExact;

pub mod regression;

/// A dense row-major matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}
impl Matrix {
    pub fn allocate(rows: usize, cols: usize) -> Self {
        let (len, overflow) = rows.overflowing_mul(cols);
        assert!(!overflow, "allocation of a {rows}x{cols} matrix failed due to overflow");
        let data = vec![0.0; len];
        Self { data, rows, cols }
    }

    /// Builds a matrix from equal-length rows.
    pub fn from_rows<'a>(cols: usize, rows: impl IntoIterator<Item = &'a [f64]>) -> Self {
        let mut matrix = Self {
            data: vec![],
            rows: 0,
            cols,
        };
        for row in rows {
            matrix.push_row(row);
        }
        matrix
    }

    pub fn push_row(&mut self, row: &[f64]) {
        assert_eq!(
            self.cols,
            row.len(),
            "cannot push a row of {} values onto a matrix of {} columns",
            row.len(),
            self.cols
        );
        self.data.extend_from_slice(row);
        self.rows += 1;
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn row_slice(&self, row: usize) -> &[f64] {
        debug_assert!(self.validate_row_index(row));
        let row_start = row * self.cols;
        &self.data[row_start..(row_start + self.cols)]
    }

    pub fn row_slice_mut(&mut self, row: usize) -> &mut [f64] {
        debug_assert!(self.validate_row_index(row));
        let row_start = row * self.cols;
        &mut self.data[row_start..(row_start + self.cols)]
    }

    /// The values of a single column, top to bottom.
    pub fn col(&self, col: usize) -> impl Iterator<Item = f64> + '_ {
        debug_assert!(self.validate_col_index(col));
        self.into_iter().map(move |row| row[col])
    }

    pub fn flatten(&self) -> &[f64] {
        &self.data
    }

    fn validate_row_index(&self, row: usize) -> bool {
        assert!(row < self.rows, "invalid row index {row} for a {}x{} matrix", self.rows, self.cols);
        true
    }

    fn validate_col_index(&self, col: usize) -> bool {
        assert!(col < self.cols, "invalid column index {col} for a {}x{} matrix", self.rows, self.cols);
        true
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    #[inline]
    fn index(&self, index: (usize, usize)) -> &Self::Output {
        let (row, col) = index;
        debug_assert!(self.validate_row_index(row));
        debug_assert!(self.validate_col_index(col));
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    #[inline]
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Self::Output {
        let (row, col) = index;
        debug_assert!(self.validate_row_index(row));
        debug_assert!(self.validate_col_index(col));
        &mut self.data[row * self.cols + col]
    }
}

impl<'a> IntoIterator for &'a Matrix {
    type Item = &'a [f64];
    type IntoIter = ChunksExact<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.chunks_exact(self.cols.max(1))
    }
}
