//! Core types for tile aggregation: pixel buffers and realized coverages.

use raster_common::{GridGeometry, SampleDimension};
use serde::{Deserialize, Serialize};

use crate::error::{MosaicError, Result};

/// No-data sentinel written into unfilled destination pixels.
pub const SENTINEL: f32 = f32::NAN;

/// Interpolation method for tile resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterpolationMethod {
    /// Nearest neighbor (preserves exact values).
    Nearest,
    /// Bilinear interpolation (smooth, slight value changes).
    #[default]
    Bilinear,
    /// Bicubic interpolation (smoothest, more compute).
    Cubic,
}

impl InterpolationMethod {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "nearest" => Self::Nearest,
            "cubic" | "bicubic" => Self::Cubic,
            _ => Self::Bilinear,
        }
    }
}

impl std::fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nearest => write!(f, "nearest"),
            Self::Bilinear => write!(f, "bilinear"),
            Self::Cubic => write!(f, "cubic"),
        }
    }
}

/// Band-sequential `f32` pixel buffer.
///
/// Sample `(x, y)` of band `b` lives at `data[b * width * height + y * width + x]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBuffer {
    pub width: usize,
    pub height: usize,
    pub bands: usize,
    pub data: Vec<f32>,
}

impl RasterBuffer {
    pub fn new(width: usize, height: usize, bands: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != width * height * bands {
            return Err(MosaicError::invalid_geometry(format!(
                "buffer holds {} samples, expected {}x{}x{}",
                data.len(),
                width,
                height,
                bands
            )));
        }
        Ok(Self {
            width,
            height,
            bands,
            data,
        })
    }

    /// Buffer with every sample set to `value`.
    pub fn filled(width: usize, height: usize, bands: usize, value: f32) -> Self {
        Self {
            width,
            height,
            bands,
            data: vec![value; width * height * bands],
        }
    }

    /// Number of samples in one band.
    pub fn band_len(&self) -> usize {
        self.width * self.height
    }

    pub fn band(&self, band: usize) -> &[f32] {
        let len = self.band_len();
        &self.data[band * len..(band + 1) * len]
    }

    pub fn band_mut(&mut self, band: usize) -> &mut [f32] {
        let len = self.band_len();
        &mut self.data[band * len..(band + 1) * len]
    }

    pub fn get(&self, x: usize, y: usize, band: usize) -> Option<f32> {
        if x >= self.width || y >= self.height || band >= self.bands {
            return None;
        }
        self.data.get(band * self.band_len() + y * self.width + x).copied()
    }

    /// True when no sample holds data.
    pub fn is_all_sentinel(&self) -> bool {
        self.data.iter().all(|v| v.is_nan())
    }

    /// Number of samples holding data.
    pub fn count_valid(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }

    /// Copy of the rectangle starting at `(x0, y0)`.
    pub fn window(&self, x0: usize, y0: usize, width: usize, height: usize) -> Result<RasterBuffer> {
        if x0 + width > self.width || y0 + height > self.height {
            return Err(MosaicError::invalid_geometry(format!(
                "window {}x{} at ({}, {}) exceeds {}x{} buffer",
                width, height, x0, y0, self.width, self.height
            )));
        }
        let mut data = Vec::with_capacity(width * height * self.bands);
        for band in 0..self.bands {
            let src = self.band(band);
            for row in y0..y0 + height {
                let start = row * self.width + x0;
                data.extend_from_slice(&src[start..start + width]);
            }
        }
        RasterBuffer::new(width, height, self.bands, data)
    }

    /// Copy holding only the listed bands, in the listed order.
    pub fn select_bands(&self, bands: &[usize]) -> Result<RasterBuffer> {
        let mut data = Vec::with_capacity(self.band_len() * bands.len());
        for &band in bands {
            if band >= self.bands {
                return Err(MosaicError::InvalidBand {
                    band,
                    count: self.bands,
                });
            }
            data.extend_from_slice(self.band(band));
        }
        RasterBuffer::new(self.width, self.height, bands.len(), data)
    }
}

/// A realized raster: the grid it was rendered on, its pixels and the
/// meaning of each band.
///
/// Produced fresh by every read.
#[derive(Debug, Clone)]
pub struct Coverage {
    pub grid_geometry: GridGeometry,
    pub buffer: RasterBuffer,
    pub sample_dimensions: Vec<SampleDimension>,
}

impl Coverage {
    pub fn new(
        grid_geometry: GridGeometry,
        buffer: RasterBuffer,
        sample_dimensions: Vec<SampleDimension>,
    ) -> Result<Self> {
        let extent = *grid_geometry.extent()?;
        if extent.width() != buffer.width || extent.height() != buffer.height {
            return Err(MosaicError::invalid_geometry(format!(
                "buffer is {}x{} but grid extent is {}x{}",
                buffer.width,
                buffer.height,
                extent.width(),
                extent.height()
            )));
        }
        if sample_dimensions.len() != buffer.bands {
            return Err(MosaicError::IncompatibleSampleDimensions(format!(
                "{} sample dimensions for {} bands",
                sample_dimensions.len(),
                buffer.bands
            )));
        }
        Ok(Self {
            grid_geometry,
            buffer,
            sample_dimensions,
        })
    }

    pub fn width(&self) -> usize {
        self.buffer.width
    }

    pub fn height(&self) -> usize {
        self.buffer.height
    }

    pub fn band_count(&self) -> usize {
        self.buffer.bands
    }

    /// Sample at buffer position `(x, y)` (relative to the extent's lower corner).
    pub fn value(&self, x: usize, y: usize, band: usize) -> Option<f32> {
        self.buffer.get(x, y, band)
    }

    pub fn band(&self, band: usize) -> &[f32] {
        self.buffer.band(band)
    }

    /// Same coverage with every band's fill value replaced by the NaN sentinel.
    pub fn converted(mut self) -> Coverage {
        for (band, dim) in self.sample_dimensions.iter().enumerate() {
            if dim.fill_value.is_none() {
                continue;
            }
            for v in self.buffer.band_mut(band) {
                if dim.is_fill(*v) {
                    *v = SENTINEL;
                }
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::{AffineTransform, Crs, GridExtent};

    fn buffer_3x2() -> RasterBuffer {
        // two bands: 0..6 and 10..16
        let data = (0..6).chain(10..16).map(|v| v as f32).collect();
        RasterBuffer::new(3, 2, 2, data).unwrap()
    }

    #[test]
    fn test_buffer_get() {
        let buffer = buffer_3x2();
        assert_eq!(buffer.get(0, 0, 0), Some(0.0));
        assert_eq!(buffer.get(2, 1, 0), Some(5.0));
        assert_eq!(buffer.get(1, 1, 1), Some(14.0));
        assert_eq!(buffer.get(3, 0, 0), None);
        assert_eq!(buffer.get(0, 0, 2), None);
    }

    #[test]
    fn test_buffer_size_mismatch() {
        assert!(RasterBuffer::new(2, 2, 1, vec![0.0; 3]).is_err());
    }

    #[test]
    fn test_window() {
        let window = buffer_3x2().window(1, 0, 2, 2).unwrap();
        assert_eq!(window.data, vec![1.0, 2.0, 4.0, 5.0, 11.0, 12.0, 14.0, 15.0]);
        assert!(buffer_3x2().window(2, 0, 2, 2).is_err());
    }

    #[test]
    fn test_select_bands() {
        let selected = buffer_3x2().select_bands(&[1]).unwrap();
        assert_eq!(selected.bands, 1);
        assert_eq!(selected.data[0], 10.0);
        assert!(matches!(
            buffer_3x2().select_bands(&[2]),
            Err(MosaicError::InvalidBand { band: 2, count: 2 })
        ));
    }

    #[test]
    fn test_sentinel_detection() {
        let mut buffer = RasterBuffer::filled(2, 2, 1, SENTINEL);
        assert!(buffer.is_all_sentinel());
        buffer.data[3] = 1.0;
        assert!(!buffer.is_all_sentinel());
        assert_eq!(buffer.count_valid(), 1);
    }

    #[test]
    fn test_converted_replaces_fill_values() {
        let geometry = GridGeometry::new(
            GridExtent::from_size(2, 1).unwrap(),
            AffineTransform::identity(),
            Crs::wgs84(),
        );
        let buffer = RasterBuffer::new(2, 1, 1, vec![-9999.0, 3.0]).unwrap();
        let coverage = Coverage::new(
            geometry,
            buffer,
            vec![SampleDimension::new("elevation").with_fill_value(-9999.0)],
        )
        .unwrap()
        .converted();
        assert!(coverage.value(0, 0, 0).unwrap().is_nan());
        assert_eq!(coverage.value(1, 0, 0), Some(3.0));
    }

    #[test]
    fn test_interpolation_method_from_str() {
        assert_eq!(InterpolationMethod::from_str("nearest"), InterpolationMethod::Nearest);
        assert_eq!(InterpolationMethod::from_str("BILINEAR"), InterpolationMethod::Bilinear);
        assert_eq!(InterpolationMethod::from_str("bicubic"), InterpolationMethod::Cubic);
        assert_eq!(InterpolationMethod::from_str("invalid"), InterpolationMethod::Bilinear);
    }
}
