use crate::core::moments::{moment, uniform_mean, uniform_square_mean, MomentKind};
use crate::core::window::{window_view_centered, WindowSpec};
use crate::maybe_rayon::*;
use crate::types::{Band, RasterError, RasterResult, Sample};
use serde::{Deserialize, Serialize};

/// Parameters for the moving-window moment extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextureParams {
    /// Window size (even sizes are coerced to size + 1)
    pub window_size: usize,
    pub statistic: MomentKind,
}

impl Default for TextureParams {
    fn default() -> Self {
        Self {
            window_size: 3,
            statistic: MomentKind::Variance,
        }
    }
}

impl TextureParams {
    pub fn window(&self) -> WindowSpec {
        WindowSpec::new(self.window_size)
    }

    pub fn validate(&self) -> RasterResult<()> {
        if self.window_size == 0 {
            return Err(RasterError::Configuration(
                "Window size must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameters for the speckle-divergence statistic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DivergenceParams {
    /// Window size (even sizes are coerced to size + 1)
    pub window_size: usize,
}

impl Default for DivergenceParams {
    fn default() -> Self {
        Self { window_size: 3 }
    }
}

impl DivergenceParams {
    pub fn window(&self) -> WindowSpec {
        WindowSpec::new(self.window_size)
    }

    pub fn validate(&self) -> RasterResult<()> {
        if self.window_size == 0 {
            return Err(RasterError::Configuration(
                "Window size must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

/// Moving-window moment statistic (variance, skewness or kurtosis) over
/// the full centered clamped window at each pixel.
pub fn texture_filter(band: &Band, spec: WindowSpec, kind: MomentKind) -> RasterResult<Band> {
    log::debug!(
        "Applying texture filter: {:?}, window size {}",
        kind,
        spec.size()
    );

    let (rows, cols) = band.dim();
    let radius = spec.radius();

    let data: Vec<Sample> = (0..rows)
        .into_par_iter()
        .flat_map(|i| {
            let mut row = vec![0.0; cols];
            for (j, out) in row.iter_mut().enumerate() {
                let window = window_view_centered(band, i, j, radius);
                *out = moment(&window, kind);
            }
            row
        })
        .collect();

    Band::from_shape_vec((rows, cols), data)
        .map_err(|e| RasterError::Processing(e.to_string()))
}

/// Speckle-divergence statistic `sqrt(E[x^2]/E[x]^2 - 1)` over the sliding
/// window, computed on the box-filter path.
///
/// A zero sliding mean yields 0; tiny negative ratios from floating-point
/// cancellation are truncated to 0 before the square root.
pub fn speckle_divergence(band: &Band, spec: WindowSpec) -> RasterResult<Band> {
    log::debug!("Applying speckle divergence, window size {}", spec.size());

    let (rows, cols) = band.dim();
    let means = uniform_mean(band, spec);
    let square_means = uniform_square_mean(band, spec);

    let data: Vec<Sample> = (0..rows)
        .into_par_iter()
        .flat_map(|i| {
            let mut row = vec![0.0; cols];
            for (j, out) in row.iter_mut().enumerate() {
                let m = means[[i, j]];
                if m == 0.0 {
                    continue;
                }
                let ratio = square_means[[i, j]] / (m * m) - 1.0;
                *out = ratio.max(0.0).sqrt();
            }
            row
        })
        .collect();

    Band::from_shape_vec((rows, cols), data)
        .map_err(|e| RasterError::Processing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    #[test]
    fn test_variance_filter_full_window() {
        let band =
            Array2::from_shape_vec((3, 3), (1..=9).map(|v| v as f32).collect()).unwrap();
        let out = texture_filter(&band, WindowSpec::new(3), MomentKind::Variance).unwrap();
        // Center pixel sees the whole 3x3 ramp
        assert_relative_eq!(out[[1, 1]], 6.666_667, epsilon = 1e-4);
        // Corner pixel sees only the clamped 2x2 window {1, 2, 4, 5}
        assert_relative_eq!(out[[0, 0]], 2.5, epsilon = 1e-4);
    }

    #[test]
    fn test_skewness_and_kurtosis_constant_band() {
        let band = Array2::from_elem((4, 4), 9.0f32);
        let skew = texture_filter(&band, WindowSpec::new(3), MomentKind::Skewness).unwrap();
        let kurt = texture_filter(&band, WindowSpec::new(3), MomentKind::Kurtosis).unwrap();
        assert!(skew.iter().all(|&v| v == 0.0));
        assert!(kurt.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_divergence_constant_band_is_zero() {
        let band = Array2::from_elem((5, 5), 42.0f32);
        let out = speckle_divergence(&band, WindowSpec::new(3)).unwrap();
        assert!(out.iter().all(|&v| v.abs() < 1e-3));
    }

    #[test]
    fn test_divergence_zero_mean_guard() {
        let band = Array2::from_elem((5, 5), 0.0f32);
        let out = speckle_divergence(&band, WindowSpec::new(3)).unwrap();
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_divergence_matches_window_statistics() {
        let band = Array2::from_shape_fn((5, 5), |(i, j)| ((i * 7 + j * 3) % 11) as f32 + 1.0);
        let spec = WindowSpec::new(3);
        let out = speckle_divergence(&band, spec).unwrap();

        // Divergence is std/mean of the sliding window: sqrt(E[x^2]/E[x]^2 - 1)
        let w = crate::core::window::window_view_centered(&band, 2, 2, 1);
        let mean = crate::core::moments::mean(&w);
        let std = crate::core::moments::std_dev(&w);
        assert_relative_eq!(out[[2, 2]], std / mean, epsilon = 1e-3);
    }
}
