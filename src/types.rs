use ndarray::Array2;
use num_traits::{Bounded, ToPrimitive};
use serde::{Deserialize, Serialize};

/// Real-valued raster sample data
pub type Sample = f32;

/// 2D grid of samples for one band (rows x cols, row-major)
pub type Band = Array2<Sample>;

/// Sample types a block can be cast to on output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelType {
    U8,
    U16,
    I16,
    U32,
    I32,
    F32,
}

impl PixelType {
    /// Whether the type stores integer samples (and therefore rounds on cast)
    pub fn is_integer(&self) -> bool {
        !matches!(self, PixelType::F32)
    }

    /// Clamp (and for integer types, round) a value into the representable
    /// range of this sample type. Float output passes through unchanged.
    pub fn clamp_cast(&self, value: Sample) -> Sample {
        let (lo, hi) = match self {
            PixelType::U8 => integer_bounds::<u8>(),
            PixelType::U16 => integer_bounds::<u16>(),
            PixelType::I16 => integer_bounds::<i16>(),
            PixelType::U32 => integer_bounds::<u32>(),
            PixelType::I32 => integer_bounds::<i32>(),
            PixelType::F32 => return value,
        };
        if value.is_nan() {
            return 0.0;
        }
        value.round().clamp(lo, hi)
    }
}

fn integer_bounds<T: Bounded + ToPrimitive>() -> (Sample, Sample) {
    let lo = T::min_value().to_f32().unwrap_or(Sample::MIN);
    let hi = T::max_value().to_f32().unwrap_or(Sample::MAX);
    (lo, hi)
}

/// Known value range of one input band
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BandStatistics {
    pub minimum: Sample,
    pub maximum: Sample,
}

impl Default for BandStatistics {
    fn default() -> Self {
        Self {
            minimum: 0.0,
            maximum: 255.0,
        }
    }
}

/// Shape and sample-type description of the source raster, presented at
/// configuration time so band-count constraints fail before any pixel is
/// processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterInfo {
    pub band_count: usize,
    pub pixel_type: PixelType,
    pub statistics: Vec<BandStatistics>,
}

impl RasterInfo {
    pub fn new(band_count: usize, pixel_type: PixelType) -> Self {
        Self {
            band_count,
            pixel_type,
            statistics: vec![BandStatistics::default(); band_count],
        }
    }

    /// Statistics for one band, falling back to the default [0, 255] range
    /// when the host did not supply any.
    pub fn band_statistics(&self, band: usize) -> BandStatistics {
        self.statistics.get(band).copied().unwrap_or_default()
    }
}

/// One block of multi-band pixel data, owned by the caller for the duration
/// of a single processing call.
#[derive(Debug, Clone)]
pub struct RasterBlock {
    bands: Vec<Band>,
}

impl RasterBlock {
    /// Build a block from per-band grids. All bands must share one shape.
    pub fn new(bands: Vec<Band>) -> RasterResult<Self> {
        let first = bands
            .first()
            .ok_or_else(|| RasterError::Processing("Block has no bands".to_string()))?;
        let dim = first.dim();
        if bands.iter().any(|b| b.dim() != dim) {
            return Err(RasterError::Processing(format!(
                "Bands disagree on block shape {}x{}",
                dim.0, dim.1
            )));
        }
        Ok(Self { bands })
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn band(&self, index: usize) -> &Band {
        &self.bands[index]
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// (rows, cols) of every band in the block
    pub fn dim(&self) -> (usize, usize) {
        self.bands[0].dim()
    }
}

/// Result of one processing call: band values already clamped/rounded for
/// the declared sample type.
#[derive(Debug, Clone)]
pub struct OutputBlock {
    pub bands: Vec<Band>,
    pub pixel_type: PixelType,
}

impl OutputBlock {
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn band(&self, index: usize) -> &Band {
        &self.bands[index]
    }
}

/// Error types for raster filtering
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Processing error: {0}")]
    Processing(String),
}

/// Result type for raster operations
pub type RasterResult<T> = Result<T, RasterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_cast_rounds_and_clamps() {
        assert_eq!(PixelType::U8.clamp_cast(254.6), 255.0);
        assert_eq!(PixelType::U8.clamp_cast(300.0), 255.0);
        assert_eq!(PixelType::U8.clamp_cast(-3.0), 0.0);
        assert_eq!(PixelType::U16.clamp_cast(6.667), 7.0);
        assert_eq!(PixelType::I16.clamp_cast(-40000.0), -32768.0);
        assert_eq!(PixelType::F32.clamp_cast(-3.25), -3.25);
    }

    #[test]
    fn test_block_requires_uniform_shape() {
        let bands = vec![Band::zeros((4, 4)), Band::zeros((4, 5))];
        assert!(RasterBlock::new(bands).is_err());

        let bands = vec![Band::zeros((4, 4)), Band::zeros((4, 4))];
        let block = RasterBlock::new(bands).unwrap();
        assert_eq!(block.band_count(), 2);
        assert_eq!(block.dim(), (4, 4));
    }
}
