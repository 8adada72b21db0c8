//! Resampling of a source raster onto a destination grid.
//!
//! Source positions are expressed in source *buffer* coordinates: pixel
//! `(i, j)` of the buffer is centred on `(i, j)` and covers
//! `[i - 0.5, i + 0.5) × [j - 0.5, j + 0.5)`. Destination pixels whose
//! position falls outside that footprint are border pixels.

use std::sync::Arc;

use projection::CoordinateOperation;
use raster_common::AffineTransform;
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::error::{MosaicError, Result};
use crate::types::{InterpolationMethod, RasterBuffer};

/// Mapping from destination buffer coordinates to source buffer coordinates.
#[derive(Debug, Clone)]
pub enum PixelTransform {
    /// Entirely affine; evaluated with one matrix.
    Linear(AffineTransform),
    /// Destination grid to destination space, a coordinate operation, then
    /// source space to source grid.
    Chained {
        before: AffineTransform,
        operation: Arc<dyn CoordinateOperation>,
        after: AffineTransform,
    },
}

impl PixelTransform {
    /// Concatenate the three steps, folding them into one affine transform
    /// when the operation is affine.
    pub fn chain(
        before: AffineTransform,
        operation: Arc<dyn CoordinateOperation>,
        after: AffineTransform,
    ) -> Self {
        match operation.as_affine() {
            Some(linear) => PixelTransform::Linear(before.then(&linear).then(&after)),
            None => PixelTransform::Chained {
                before,
                operation,
                after,
            },
        }
    }

    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        match self {
            PixelTransform::Linear(t) => Some(t.apply(x, y)),
            PixelTransform::Chained {
                before,
                operation,
                after,
            } => {
                let (sx, sy) = before.apply(x, y);
                let (tx, ty) = operation.transform(sx, sy)?;
                Some(after.apply(tx, ty))
            }
        }
    }

    pub fn is_linear(&self) -> bool {
        matches!(self, PixelTransform::Linear(_))
    }
}

/// What happens to destination pixels that map outside the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BorderMode {
    /// Write the given value.
    Fill(f32),
    /// Leave the destination pixel untouched.
    Preserve,
}

/// Nearest neighbor interpolation.
///
/// `x` and `y` must lie inside the source footprint.
pub fn nearest_interpolate(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    let col = ((x + 0.5).floor().max(0.0) as usize).min(width - 1);
    let row = ((y + 0.5).floor().max(0.0) as usize).min(height - 1);
    data[row * width + col]
}

/// Bilinear interpolation.
///
/// Positions in the outer half-pixel replicate the edge. Corners with zero
/// weight are ignored, so a position exactly on a pixel centre returns that
/// pixel unchanged even next to NaN neighbours.
pub fn bilinear_interpolate(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    let x = x.clamp(0.0, (width - 1) as f64);
    let y = y.clamp(0.0, (height - 1) as f64);
    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let xf = x - x0 as f64;
    let yf = y - y0 as f64;

    let corners = [
        (x0, y0, (1.0 - xf) * (1.0 - yf)),
        (x1, y0, xf * (1.0 - yf)),
        (x0, y1, (1.0 - xf) * yf),
        (x1, y1, xf * yf),
    ];

    let mut sum = 0.0f64;
    for (cx, cy, weight) in corners {
        if weight == 0.0 {
            continue;
        }
        let v = data[cy * width + cx];
        // NaN corner with a non-zero weight poisons the result
        if v.is_nan() {
            return f32::NAN;
        }
        sum += v as f64 * weight;
    }
    sum as f32
}

/// Catmull-Rom weights of the samples at offsets -1, 0, 1 and 2 from the
/// lower neighbour, for a fractional position `t` in `[0, 1)`.
fn catmull_rom_weights(t: f64) -> [f64; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        0.5 * (-t3 + 2.0 * t2 - t),
        0.5 * (3.0 * t3 - 5.0 * t2 + 2.0),
        0.5 * (-3.0 * t3 + 4.0 * t2 + t),
        0.5 * (t3 - t2),
    ]
}

/// Bicubic (Catmull-Rom) interpolation over a 4x4 neighbourhood.
///
/// Same footprint rules as [`bilinear_interpolate`]: positions in the outer
/// half-pixel replicate the edge, and samples with zero weight are never
/// read, so pixel centres come back unchanged. When a weighted sample is
/// NaN the kernel falls back to bilinear.
pub fn cubic_interpolate(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    let x = x.clamp(0.0, (width - 1) as f64);
    let y = y.clamp(0.0, (height - 1) as f64);
    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let wx = catmull_rom_weights(x - x0 as f64);
    let wy = catmull_rom_weights(y - y0 as f64);

    let mut sum = 0.0f64;
    for (j, &weight_y) in wy.iter().enumerate() {
        if weight_y == 0.0 {
            continue;
        }
        let row = (y0 + j).saturating_sub(1).min(height - 1);
        for (i, &weight_x) in wx.iter().enumerate() {
            let weight = weight_x * weight_y;
            if weight == 0.0 {
                continue;
            }
            let col = (x0 + i).saturating_sub(1).min(width - 1);
            let v = data[row * width + col];
            if v.is_nan() {
                return bilinear_interpolate(data, width, height, x, y);
            }
            sum += v as f64 * weight;
        }
    }
    sum as f32
}

#[inline]
fn interpolate(method: InterpolationMethod, data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    match method {
        InterpolationMethod::Nearest => nearest_interpolate(data, width, height, x, y),
        InterpolationMethod::Bilinear => bilinear_interpolate(data, width, height, x, y),
        InterpolationMethod::Cubic => cubic_interpolate(data, width, height, x, y),
    }
}

/// Resample `source` into `destination` through `transform` on the
/// calling thread.
///
/// Every band of the destination is computed from the same band of the
/// source. Returns the number of destination pixels (per band) whose
/// position fell inside the source.
pub fn resample(
    transform: &PixelTransform,
    destination: &mut RasterBuffer,
    source: &RasterBuffer,
    method: InterpolationMethod,
    border: BorderMode,
) -> Result<usize> {
    resample_on(None, transform, destination, source, method, border)
}

/// Same as [`resample`], with rows spread over `pool` when one is given.
///
/// No thread is started here: without a pool the rows are processed in
/// order on the calling thread. The result does not depend on scheduling.
pub fn resample_on(
    pool: Option<&ThreadPool>,
    transform: &PixelTransform,
    destination: &mut RasterBuffer,
    source: &RasterBuffer,
    method: InterpolationMethod,
    border: BorderMode,
) -> Result<usize> {
    if destination.bands != source.bands {
        return Err(MosaicError::IncompatibleSampleDimensions(format!(
            "cannot resample {} bands into {} bands",
            source.bands, destination.bands
        )));
    }
    if source.width == 0 || source.height == 0 || destination.width == 0 || destination.height == 0 {
        return Ok(0);
    }

    let dst_width = destination.width;
    let dst_height = destination.height;
    let src_width = source.width;
    let src_height = source.height;
    let max_x = src_width as f64 - 0.5;
    let max_y = src_height as f64 - 0.5;

    let resample_row = |chunk: usize, row_out: &mut [f32]| -> usize {
        let band = chunk / dst_height;
        let row = chunk % dst_height;
        let src = source.band(band);
        let mut written = 0;
        for (col, out) in row_out.iter_mut().enumerate() {
            let position = transform
                .apply(col as f64, row as f64)
                .filter(|&(x, y)| x >= -0.5 && x < max_x && y >= -0.5 && y < max_y);
            match position {
                Some((x, y)) => {
                    *out = interpolate(method, src, src_width, src_height, x, y);
                    written += 1;
                }
                None => {
                    if let BorderMode::Fill(value) = border {
                        *out = value;
                    }
                }
            }
        }
        written
    };

    let data = &mut destination.data;
    let inside: usize = match pool {
        Some(pool) => pool.install(|| {
            data.par_chunks_mut(dst_width)
                .enumerate()
                .map(|(chunk, row_out)| resample_row(chunk, row_out))
                .sum::<usize>()
        }),
        None => data
            .chunks_mut(dst_width)
            .enumerate()
            .map(|(chunk, row_out)| resample_row(chunk, row_out))
            .sum::<usize>(),
    };

    Ok(inside / destination.bands.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SENTINEL;

    fn grid_3x3() -> RasterBuffer {
        RasterBuffer::new(3, 3, 1, (1..=9).map(|v| v as f32).collect()).unwrap()
    }

    #[test]
    fn test_nearest_interpolate() {
        let data: Vec<f32> = vec![
            1.0, 2.0, 3.0,
            4.0, 5.0, 6.0,
            7.0, 8.0, 9.0,
        ];

        assert_eq!(nearest_interpolate(&data, 3, 3, 0.0, 0.0), 1.0);
        assert_eq!(nearest_interpolate(&data, 3, 3, 1.0, 1.0), 5.0);
        assert_eq!(nearest_interpolate(&data, 3, 3, 0.4, 0.4), 1.0);
        assert_eq!(nearest_interpolate(&data, 3, 3, 0.6, 0.6), 5.0);
        assert_eq!(nearest_interpolate(&data, 3, 3, -0.4, 2.4), 7.0);
    }

    #[test]
    fn test_bilinear_interpolate() {
        let data: Vec<f32> = vec![
            1.0, 2.0,
            3.0, 4.0,
        ];

        // Corners
        assert_eq!(bilinear_interpolate(&data, 2, 2, 0.0, 0.0), 1.0);
        assert_eq!(bilinear_interpolate(&data, 2, 2, 1.0, 0.0), 2.0);
        assert_eq!(bilinear_interpolate(&data, 2, 2, 0.0, 1.0), 3.0);
        assert_eq!(bilinear_interpolate(&data, 2, 2, 1.0, 1.0), 4.0);

        // Center
        let center = bilinear_interpolate(&data, 2, 2, 0.5, 0.5);
        assert!((center - 2.5).abs() < 0.001);
    }

    #[test]
    fn test_bilinear_with_nan() {
        let data: Vec<f32> = vec![
            1.0, f32::NAN,
            3.0, 4.0,
        ];

        assert!(bilinear_interpolate(&data, 2, 2, 0.5, 0.5).is_nan());
        // On a pixel centre the NaN neighbour has no weight
        assert_eq!(bilinear_interpolate(&data, 2, 2, 0.0, 1.0), 3.0);
    }

    #[test]
    fn test_cubic_reproduces_linear_ramp() {
        let data: Vec<f32> = vec![0.0, 10.0, 20.0, 30.0];
        assert_eq!(cubic_interpolate(&data, 4, 1, 1.5, 0.0), 15.0);
        assert_eq!(cubic_interpolate(&data, 4, 1, 2.0, 0.0), 20.0);
    }

    #[test]
    fn test_cubic_with_nan() {
        let mut data: Vec<f32> = (0..16).map(|v| v as f32).collect();
        data[15] = f32::NAN;

        // The NaN corner has weight at (1.5, 1.5): bilinear takes over
        let fallback = cubic_interpolate(&data, 4, 4, 1.5, 1.5);
        assert_eq!(fallback, bilinear_interpolate(&data, 4, 4, 1.5, 1.5));
        assert!(!fallback.is_nan());

        // On a pixel centre only that pixel is read
        assert_eq!(cubic_interpolate(&data, 4, 4, 2.0, 2.0), 10.0);
    }

    #[test]
    fn test_catmull_rom_weights() {
        assert_eq!(catmull_rom_weights(0.0), [0.0, 1.0, 0.0, 0.0]);
        let half = catmull_rom_weights(0.5);
        assert!((half.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(half[0], half[3]);
    }

    #[test]
    fn test_identity_resample_is_exact() {
        let source = grid_3x3();
        for method in [
            InterpolationMethod::Nearest,
            InterpolationMethod::Bilinear,
            InterpolationMethod::Cubic,
        ] {
            let mut destination = RasterBuffer::filled(3, 3, 1, SENTINEL);
            let inside = resample(
                &PixelTransform::Linear(AffineTransform::identity()),
                &mut destination,
                &source,
                method,
                BorderMode::Fill(SENTINEL),
            )
            .unwrap();
            assert_eq!(inside, 9);
            assert_eq!(destination.data, source.data, "{method} drifted");
        }
    }

    #[test]
    fn test_shifted_resample_fills_border() {
        // Destination pixel x maps to source x + 2
        let transform = PixelTransform::Linear(AffineTransform::translation(2.0, 0.0));
        let mut destination = RasterBuffer::filled(3, 3, 1, 0.0);
        let inside = resample(
            &transform,
            &mut destination,
            &grid_3x3(),
            InterpolationMethod::Nearest,
            BorderMode::Fill(SENTINEL),
        )
        .unwrap();

        assert_eq!(inside, 3);
        assert_eq!(destination.get(0, 1, 0), Some(6.0));
        assert!(destination.get(1, 1, 0).unwrap().is_nan());
        assert!(destination.get(2, 2, 0).unwrap().is_nan());
    }

    #[test]
    fn test_preserve_border_keeps_destination() {
        let transform = PixelTransform::Linear(AffineTransform::translation(2.0, 0.0));
        let mut destination = RasterBuffer::filled(3, 3, 1, -1.0);
        resample(
            &transform,
            &mut destination,
            &grid_3x3(),
            InterpolationMethod::Nearest,
            BorderMode::Preserve,
        )
        .unwrap();

        assert_eq!(destination.get(0, 0, 0), Some(3.0));
        assert_eq!(destination.get(1, 0, 0), Some(-1.0));
    }

    #[test]
    fn test_pool_gives_same_result() {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let source = RasterBuffer::new(8, 8, 2, (0..128).map(|v| v as f32).collect()).unwrap();
        let transform = PixelTransform::Linear(AffineTransform::translation(0.25, 1.5));

        for method in [
            InterpolationMethod::Nearest,
            InterpolationMethod::Bilinear,
            InterpolationMethod::Cubic,
        ] {
            let mut sequential = RasterBuffer::filled(8, 8, 2, SENTINEL);
            let mut pooled = RasterBuffer::filled(8, 8, 2, SENTINEL);
            let a = resample(&transform, &mut sequential, &source, method, BorderMode::Fill(SENTINEL)).unwrap();
            let b = resample_on(Some(&pool), &transform, &mut pooled, &source, method, BorderMode::Fill(SENTINEL))
                .unwrap();
            assert_eq!(a, b);
            assert_eq!(a, 48);
            for (l, r) in sequential.data.iter().zip(&pooled.data) {
                assert_eq!(l.to_bits(), r.to_bits(), "{method}");
            }
        }
    }

    #[test]
    fn test_band_mismatch() {
        let mut destination = RasterBuffer::filled(3, 3, 2, SENTINEL);
        let result = resample(
            &PixelTransform::Linear(AffineTransform::identity()),
            &mut destination,
            &grid_3x3(),
            InterpolationMethod::Nearest,
            BorderMode::Preserve,
        );
        assert!(matches!(result, Err(MosaicError::IncompatibleSampleDimensions(_))));
    }

    #[test]
    fn test_chain_folds_affine_operation() {
        use projection::IdentityOperation;
        use raster_common::Crs;

        let transform = PixelTransform::chain(
            AffineTransform::translation(1.0, 0.0),
            Arc::new(IdentityOperation::same(Crs::wgs84())),
            AffineTransform::translation(0.0, 2.0),
        );
        assert!(transform.is_linear());
        assert_eq!(transform.apply(0.0, 0.0), Some((1.0, 2.0)));
    }
}
