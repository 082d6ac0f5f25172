use crate::core::window::WindowSpec;
use crate::types::{Band, Sample};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// Central-moment statistics computed by the moving-window extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MomentKind {
    /// Second central moment
    Variance,
    /// Standardized third central moment
    Skewness,
    /// Standardized fourth central moment, excess form
    Kurtosis,
}

/// Per-window value bundle used by the adaptive speckle filters.
///
/// `coefficient_of_variation` is `std / mean`; a zero-mean window yields 0,
/// and each filter applies its own degeneracy policy on top (see the Lee
/// and Frost kernels).
#[derive(Debug, Clone, Copy)]
pub struct LocalStatistics {
    pub mean: Sample,
    pub std: Sample,
    pub coefficient_of_variation: Sample,
}

/// Arithmetic mean of a window
pub fn mean(window: &ArrayView2<'_, Sample>) -> Sample {
    let n = window.len();
    if n == 0 {
        return 0.0;
    }
    let sum: f64 = window.iter().map(|&v| v as f64).sum();
    (sum / n as f64) as Sample
}

/// Population standard deviation of a window
pub fn std_dev(window: &ArrayView2<'_, Sample>) -> Sample {
    variance(window).sqrt()
}

/// Population variance (second central moment) of a window
pub fn variance(window: &ArrayView2<'_, Sample>) -> Sample {
    central_moment(window, 2) as Sample
}

/// Standardized third central moment.
///
/// Zero-variance windows score 0.
pub fn skewness(window: &ArrayView2<'_, Sample>) -> Sample {
    let m2 = central_moment(window, 2);
    if m2 == 0.0 {
        return 0.0;
    }
    let m3 = central_moment(window, 3);
    (m3 / m2.powf(1.5)) as Sample
}

/// Standardized fourth central moment in excess form (a normal
/// distribution scores 0).
///
/// Zero-variance windows score 0.
pub fn kurtosis(window: &ArrayView2<'_, Sample>) -> Sample {
    let m2 = central_moment(window, 2);
    if m2 == 0.0 {
        return 0.0;
    }
    let m4 = central_moment(window, 4);
    (m4 / (m2 * m2) - 3.0) as Sample
}

/// Dispatch over the closed moment-statistic set
pub fn moment(window: &ArrayView2<'_, Sample>, kind: MomentKind) -> Sample {
    match kind {
        MomentKind::Variance => variance(window),
        MomentKind::Skewness => skewness(window),
        MomentKind::Kurtosis => kurtosis(window),
    }
}

/// Mean, population std and coefficient of variation in one pass bundle
pub fn local_statistics(window: &ArrayView2<'_, Sample>) -> LocalStatistics {
    let mean = mean(window);
    let std = std_dev(window);
    let coefficient_of_variation = if mean == 0.0 { 0.0 } else { std / mean };
    LocalStatistics {
        mean,
        std,
        coefficient_of_variation,
    }
}

fn central_moment(window: &ArrayView2<'_, Sample>, order: u32) -> f64 {
    let n = window.len();
    if n == 0 {
        return 0.0;
    }
    let mu = mean(window) as f64;
    let sum: f64 = window
        .iter()
        .map(|&v| (v as f64 - mu).powi(order as i32))
        .sum();
    sum / n as f64
}

/// Whole-image sliding mean, the box-filter equivalent of evaluating
/// `mean(window)` at every pixel over the full centered clamped window.
///
/// Built on a summed-area table so the aggregate pass is a single sweep;
/// border windows contain fewer samples, never synthetic ones.
pub fn uniform_mean(band: &Band, spec: WindowSpec) -> Band {
    box_filter(band, spec, |v| v)
}

/// Whole-image sliding mean of squared samples, for variance and
/// divergence statistics on the box-filter path.
pub fn uniform_square_mean(band: &Band, spec: WindowSpec) -> Band {
    box_filter(band, spec, |v| v * v)
}

fn box_filter(band: &Band, spec: WindowSpec, map: impl Fn(f64) -> f64) -> Band {
    let (rows, cols) = band.dim();
    let radius = spec.radius();

    // Summed-area table, one extra row/col of zeros. f64 accumulators keep
    // the whole-image running sums exact enough for the later subtraction.
    let mut table = Array2::<f64>::zeros((rows + 1, cols + 1));
    for i in 0..rows {
        for j in 0..cols {
            table[[i + 1, j + 1]] = map(band[[i, j]] as f64) + table[[i, j + 1]]
                + table[[i + 1, j]]
                - table[[i, j]];
        }
    }

    Array2::from_shape_fn((rows, cols), |(i, j)| {
        let top = i.saturating_sub(radius);
        let bottom = (i + radius + 1).min(rows);
        let left = j.saturating_sub(radius);
        let right = (j + radius + 1).min(cols);
        let sum = table[[bottom, right]] - table[[top, right]] - table[[bottom, left]]
            + table[[top, left]];
        let count = ((bottom - top) * (right - left)) as f64;
        (sum / count) as Sample
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::window::window_view_centered;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    fn ramp_3x3() -> Band {
        Array2::from_shape_vec((3, 3), (1..=9).map(|v| v as f32).collect()).unwrap()
    }

    #[test]
    fn test_variance_of_full_3x3_window() {
        let band = ramp_3x3();
        let w = window_view_centered(&band, 1, 1, 1);
        assert_eq!(w.len(), 9);
        // Population variance of 1..9
        assert_relative_eq!(variance(&w), 6.666_667, epsilon = 1e-4);
        assert_relative_eq!(mean(&w), 5.0, epsilon = 1e-6);
        assert_relative_eq!(std_dev(&w), 6.666_667f32.sqrt(), epsilon = 1e-4);
    }

    #[test]
    fn test_skewness_symmetric_is_zero() {
        let band = ramp_3x3();
        let w = window_view_centered(&band, 1, 1, 1);
        assert_relative_eq!(skewness(&w), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_constant_window_moments_are_guarded() {
        let band = Array2::from_elem((3, 3), 4.0f32);
        let w = window_view_centered(&band, 1, 1, 1);
        assert_eq!(variance(&w), 0.0);
        assert_eq!(skewness(&w), 0.0);
        assert_eq!(kurtosis(&w), 0.0);
    }

    #[test]
    fn test_kurtosis_two_point_distribution() {
        // {0, 255} balanced two-point distribution has excess kurtosis -2
        let band = Array2::from_shape_fn((2, 2), |(i, j)| if (i + j) % 2 == 0 { 0.0 } else { 255.0 });
        let w = window_view_centered(&band, 0, 0, 1);
        assert_relative_eq!(kurtosis(&w), -2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_local_statistics_zero_mean_guard() {
        let band = Array2::from_elem((3, 3), 0.0f32);
        let w = window_view_centered(&band, 1, 1, 1);
        let stats = local_statistics(&w);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.coefficient_of_variation, 0.0);
    }

    #[test]
    fn test_uniform_mean_matches_direct_window_mean() {
        let band = Array2::from_shape_fn((6, 7), |(i, j)| ((i * 31 + j * 17) % 13) as f32);
        let spec = WindowSpec::new(3);
        let smoothed = uniform_mean(&band, spec);
        for i in 0..6 {
            for j in 0..7 {
                let w = window_view_centered(&band, i, j, spec.radius());
                assert_relative_eq!(smoothed[[i, j]], mean(&w), epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn test_uniform_mean_constant_band() {
        let band = Array2::from_elem((5, 5), 100.0f32);
        let smoothed = uniform_mean(&band, WindowSpec::new(3));
        assert!(smoothed.iter().all(|&v| (v - 100.0).abs() < 1e-4));
    }
}
