use crate::core::moments::{uniform_mean, uniform_square_mean};
use crate::core::window::WindowSpec;
use crate::maybe_rayon::*;
use crate::types::{Band, RasterError, RasterResult, Sample};
use serde::{Deserialize, Serialize};

/// Wallis normalization parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallisParams {
    /// Desired output mean, in [0, 255]
    pub desired_mean: Sample,
    /// Desired output standard deviation, in [1, 255]
    pub desired_std: Sample,
    /// Moving window size (even sizes are coerced to size + 1)
    pub window_size: usize,
    /// Maximum contrast expansion, in [0, 255]
    pub gain: Sample,
    /// Brightness forcing constant, >= 0
    pub alpha: Sample,
}

impl Default for WallisParams {
    fn default() -> Self {
        Self {
            desired_mean: 128.0,
            desired_std: 76.8,
            window_size: 21,
            gain: 6.0,
            alpha: 0.8,
        }
    }
}

impl WallisParams {
    pub fn window(&self) -> WindowSpec {
        WindowSpec::new(self.window_size)
    }

    pub fn validate(&self) -> RasterResult<()> {
        if self.window_size == 0 {
            return Err(RasterError::Configuration(
                "Window size must be a positive integer".to_string(),
            ));
        }
        if !(0.0..=255.0).contains(&self.desired_mean)
            || !(1.0..=255.0).contains(&self.desired_std)
            || !(0.0..=255.0).contains(&self.gain)
            || self.alpha < 0.0
        {
            return Err(RasterError::Configuration(
                "Input parameter out of range".to_string(),
            ));
        }
        Ok(())
    }
}

/// Apply Wallis normalization to one band.
///
/// Local mean and std come from the box-filter path (the aggregate pass
/// completes before any output pixel is blended):
///
/// `out = sqrt(desired_std / (1/gain + local_std)) * (pixel - local_mean)
///        + alpha * desired_mean + (1 - alpha) * local_mean`
pub fn wallis_filter(band: &Band, params: &WallisParams) -> RasterResult<Band> {
    log::debug!(
        "Applying Wallis normalization, window size {}, desired mean {}, desired std {}",
        params.window().size(),
        params.desired_mean,
        params.desired_std
    );

    let (rows, cols) = band.dim();
    let spec = params.window();

    let means = uniform_mean(band, spec);
    let square_means = uniform_square_mean(band, spec);

    let data: Vec<Sample> = (0..rows)
        .into_par_iter()
        .flat_map(|i| {
            let mut row = vec![0.0; cols];
            for (j, out) in row.iter_mut().enumerate() {
                let local_mean = means[[i, j]];
                let local_std =
                    (square_means[[i, j]] - local_mean * local_mean).max(0.0).sqrt();

                // gain 0 pushes 1/gain to infinity; the contrast term then
                // collapses to 0 and only the brightness blend remains.
                let contrast =
                    (params.desired_std / (1.0 / params.gain + local_std)).sqrt();
                let brightness = params.alpha * params.desired_mean
                    + (1.0 - params.alpha) * local_mean;

                *out = contrast * (band[[i, j]] - local_mean) + brightness;
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
    fn test_constant_band_reduces_to_brightness_blend() {
        let band = Array2::from_elem((6, 6), 40.0f32);
        let params = WallisParams {
            window_size: 3,
            ..Default::default()
        };
        let out = wallis_filter(&band, &params).unwrap();
        // local_mean == pixel, so only the brightness term survives:
        // alpha * 128 + (1 - alpha) * 40
        let expected = 0.8 * 128.0 + 0.2 * 40.0;
        for &v in out.iter() {
            assert_relative_eq!(v, expected, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_zero_gain_disables_contrast_term() {
        let band = Array2::from_shape_fn((6, 6), |(i, j)| ((i * 5 + j) % 9) as f32 * 10.0);
        let params = WallisParams {
            window_size: 3,
            gain: 0.0,
            ..Default::default()
        };
        let out = wallis_filter(&band, &params).unwrap();
        for v in out.iter() {
            assert!(v.is_finite());
        }
    }

    #[test]
    fn test_validation_ranges() {
        assert!(WallisParams::default().validate().is_ok());

        let bad = WallisParams {
            desired_mean: 300.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let bad = WallisParams {
            desired_std: 0.5,
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let bad = WallisParams {
            gain: -1.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let bad = WallisParams {
            alpha: -0.1,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
