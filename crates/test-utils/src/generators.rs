//! Test data generators for synthetic raster tiles.
//!
//! These generators create predictable, verifiable pixel patterns that can
//! be used across the test suite.

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// This makes it easy to verify that data is being read/written correctly
/// by checking that grid[row][col] == col * 1000 + row.
///
/// # Arguments
///
/// * `width` - Number of columns
/// * `height` - Number of rows
///
/// # Returns
///
/// A `Vec<f32>` in row-major order (row 0 first, then row 1, etc.)
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50); // 10 * 5
/// assert_eq!(grid[0], 0.0);   // col=0, row=0 -> 0*1000 + 0
/// assert_eq!(grid[1], 1000.0); // col=1, row=0 -> 1*1000 + 0
/// assert_eq!(grid[10], 1.0);  // col=0, row=1 -> 0*1000 + 1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Same pattern as [`create_test_grid`], shifted by `offset`.
///
/// Tiles built with different offsets never share a value, so the source
/// of every composited pixel can be told apart.
pub fn create_offset_grid(width: usize, height: usize, offset: f32) -> Vec<f32> {
    create_test_grid(width, height)
        .into_iter()
        .map(|v| v + offset)
        .collect()
}

/// Creates a smooth gradient in Kelvin, 250K at the top-left corner up to
/// about 310K at the bottom-right.
pub fn create_temperature_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x_factor = col as f32 / width.max(1) as f32;
            let y_factor = row as f32 / height.max(1) as f32;
            data.push(250.0 + (x_factor * 30.0) + (y_factor * 30.0));
        }
    }
    data
}

/// Creates a grid filled with a constant value.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Creates a test grid with NaN at the given `(col, row)` positions.
pub fn create_grid_with_nans(
    width: usize,
    height: usize,
    nan_positions: &[(usize, usize)],
) -> Vec<f32> {
    let mut data = create_test_grid(width, height);
    for &(col, row) in nan_positions {
        if col < width && row < height {
            data[row * width + col] = f32::NAN;
        }
    }
    data
}

/// Stacks single-band grids into one band-sequential buffer.
pub fn stack_bands(bands: &[Vec<f32>]) -> Vec<f32> {
    bands.iter().flatten().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_grid() {
        let grid = create_test_grid(10, 5);
        assert_eq!(grid.len(), 50);

        // Verify pattern: value = col * 1000 + row
        assert_eq!(grid[0], 0.0); // (0, 0)
        assert_eq!(grid[1], 1000.0); // (1, 0)
        assert_eq!(grid[10], 1.0); // (0, 1)
        assert_eq!(grid[11], 1001.0); // (1, 1)
    }

    #[test]
    fn test_create_offset_grid() {
        let grid = create_offset_grid(2, 2, 0.5);
        assert_eq!(grid, vec![0.5, 1000.5, 1.5, 1001.5]);
    }

    #[test]
    fn test_create_temperature_grid() {
        let grid = create_temperature_grid(100, 100);
        assert_eq!(grid.len(), 10000);

        for &temp in &grid {
            assert!((250.0..=310.0).contains(&temp), "Temperature {} out of range", temp);
        }
        assert!(grid[0] < grid[9999]);
    }

    #[test]
    fn test_create_grid_with_nans() {
        let grid = create_grid_with_nans(10, 10, &[(0, 0), (5, 5), (20, 20)]);

        assert!(grid[0].is_nan());
        assert!(grid[55].is_nan());
        assert!(!grid[1].is_nan());
    }

    #[test]
    fn test_stack_bands() {
        let stacked = stack_bands(&[vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(stacked, vec![1.0, 2.0, 3.0, 4.0]);
    }
}
