use crate::maybe_rayon::*;
use crate::types::{Band, BandStatistics, RasterError, RasterResult, Sample};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Quantization level counts accepted by the co-occurrence engine
pub const VALID_LEVEL_COUNTS: [usize; 8] = [2, 4, 8, 16, 32, 64, 128, 256];

/// Co-occurrence direction. `All` aggregates the four axes into one matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlcmAngle {
    Angle0,
    Angle45,
    Angle90,
    Angle135,
    All,
}

impl GlcmAngle {
    /// (row, col) pixel offsets scanned for this direction at displacement `d`
    fn offsets(&self, d: isize) -> Vec<(isize, isize)> {
        match self {
            GlcmAngle::Angle0 => vec![(0, d)],
            GlcmAngle::Angle45 => vec![(-d, d)],
            GlcmAngle::Angle90 => vec![(-d, 0)],
            GlcmAngle::Angle135 => vec![(-d, -d)],
            GlcmAngle::All => vec![(0, d), (-d, d), (-d, 0), (-d, -d)],
        }
    }
}

/// Haralick descriptors derived from the co-occurrence matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlcmStatistic {
    Contrast,
    Dissimilarity,
    Homogeneity,
    AngularSecondMoment,
    Energy,
    Mean,
    Variance,
    Correlation,
}

/// Parameters for the co-occurrence texture extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlcmParams {
    pub angle: GlcmAngle,
    /// Grey-level count, one of {2, 4, 8, 16, 32, 64, 128, 256}
    pub levels: usize,
    /// Co-occurrence displacement in pixels
    pub displacement: usize,
    pub statistic: GlcmStatistic,
}

impl Default for GlcmParams {
    fn default() -> Self {
        Self {
            angle: GlcmAngle::All,
            levels: 256,
            displacement: 1,
            statistic: GlcmStatistic::Contrast,
        }
    }
}

impl GlcmParams {
    pub fn validate(&self) -> RasterResult<()> {
        if !VALID_LEVEL_COUNTS.contains(&self.levels) {
            return Err(RasterError::Configuration(format!(
                "Quantization levels must be one of {:?}, got {}",
                VALID_LEVEL_COUNTS, self.levels
            )));
        }
        if self.displacement == 0 {
            return Err(RasterError::Configuration(
                "Displacement must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

/// Linear rescale of a value range into a fixed integer level count.
///
/// When the declared input range exceeds [0, 255], samples are first
/// stretched with `(x - min) * 255 / (max - min)`; 8-bit-ranged input
/// passes through untouched.
#[derive(Debug, Clone, Copy)]
pub struct Quantizer {
    levels: usize,
    minimum: Sample,
    maximum: Sample,
    stretch: bool,
}

impl Quantizer {
    pub fn new(levels: usize, stats: BandStatistics) -> Self {
        Self {
            levels,
            minimum: stats.minimum,
            maximum: stats.maximum,
            stretch: stats.minimum < 0.0 || stats.maximum > 255.0,
        }
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Grey level for one sample, in `[0, levels)`
    pub fn level(&self, value: Sample) -> usize {
        let stretched = if self.stretch {
            let range = self.maximum - self.minimum;
            if range <= 0.0 {
                0.0
            } else {
                (value - self.minimum) * 255.0 / range
            }
        } else {
            value
        };
        let clamped = stretched.clamp(0.0, 255.0);
        ((clamped * self.levels as Sample / 256.0) as usize).min(self.levels - 1)
    }
}

/// Symmetric, normalized grey-level co-occurrence matrix
#[derive(Debug, Clone)]
pub struct CooccurrenceMatrix {
    levels: usize,
    table: Vec<f64>,
    total: f64,
}

impl CooccurrenceMatrix {
    pub fn new(levels: usize) -> Self {
        Self {
            levels,
            table: vec![0.0; levels * levels],
            total: 0.0,
        }
    }

    pub fn reset(&mut self) {
        for v in &mut self.table {
            *v = 0.0;
        }
        self.total = 0.0;
    }

    /// Record one co-occurring pair. Both orientations are counted, keeping
    /// the matrix symmetric by construction.
    pub fn record(&mut self, a: usize, b: usize) {
        self.table[a * self.levels + b] += 1.0;
        self.table[b * self.levels + a] += 1.0;
        self.total += 2.0;
    }

    /// Whether no pair was recorded (a patch too small for the offset)
    pub fn is_empty(&self) -> bool {
        self.total == 0.0
    }

    /// Divide counts by the pair total so entries sum to 1
    pub fn normalize(&mut self) {
        if self.total > 0.0 {
            for v in &mut self.table {
                *v /= self.total;
            }
            self.total = 1.0;
        }
    }

    pub fn probability(&self, a: usize, b: usize) -> f64 {
        self.table[a * self.levels + b]
    }

    /// Evaluate one Haralick descriptor over the normalized matrix
    pub fn statistic(&self, statistic: GlcmStatistic) -> f64 {
        let n = self.levels;
        match statistic {
            GlcmStatistic::Contrast => self.weighted_sum(|i, j| {
                let d = i as f64 - j as f64;
                d * d
            }),
            GlcmStatistic::Dissimilarity => {
                self.weighted_sum(|i, j| (i as f64 - j as f64).abs())
            }
            GlcmStatistic::Homogeneity => self.weighted_sum(|i, j| {
                let d = i as f64 - j as f64;
                1.0 / (1.0 + d * d)
            }),
            GlcmStatistic::AngularSecondMoment => self.table.iter().map(|p| p * p).sum(),
            GlcmStatistic::Energy => self
                .statistic(GlcmStatistic::AngularSecondMoment)
                .sqrt(),
            GlcmStatistic::Mean => self.weighted_sum(|i, _| i as f64),
            GlcmStatistic::Variance => {
                let mu = self.weighted_sum(|i, _| i as f64);
                self.weighted_sum(|i, _| (i as f64 - mu) * (i as f64 - mu))
            }
            GlcmStatistic::Correlation => {
                let mu = self.weighted_sum(|i, _| i as f64);
                let var = self.weighted_sum(|i, _| (i as f64 - mu) * (i as f64 - mu));
                if var == 0.0 {
                    return 0.0;
                }
                let mut value = 0.0;
                for i in 0..n {
                    for j in 0..n {
                        value += (i as f64 - mu) * (j as f64 - mu) * self.table[i * n + j];
                    }
                }
                value / var
            }
        }
    }

    fn weighted_sum(&self, weight: impl Fn(usize, usize) -> f64) -> f64 {
        let n = self.levels;
        let mut value = 0.0;
        for i in 0..n {
            for j in 0..n {
                value += weight(i, j) * self.table[i * n + j];
            }
        }
        value
    }
}

/// Side length of the anchored patch each co-occurrence matrix is built from
const PATCH_SIZE: usize = 2;

/// Compute one Haralick descriptor per pixel over a single band.
///
/// The matrix at (i, j) is built from the patch anchored at
/// `[i, i+2) x [j, j+2)` (clamped at the far edges); a patch with no valid
/// pair at the configured offset yields 0.
pub fn glcm_filter(band: &Band, params: &GlcmParams, stats: BandStatistics) -> RasterResult<Band> {
    log::debug!(
        "Applying GLCM filter: {:?} at {:?}, {} levels, displacement {}",
        params.statistic,
        params.angle,
        params.levels,
        params.displacement
    );

    let (rows, cols) = band.dim();
    let quantizer = Quantizer::new(params.levels, stats);

    // Quantize the whole band once; every patch then reads grey levels.
    let grey: Array2<usize> = band.mapv(|v| quantizer.level(v));

    let offsets = params.angle.offsets(params.displacement as isize);

    let data: Vec<Sample> = (0..rows)
        .into_par_iter()
        .flat_map(|i| {
            let mut row = vec![0.0; cols];
            let mut matrix = CooccurrenceMatrix::new(params.levels);

            for (j, out) in row.iter_mut().enumerate() {
                let bottom = (i + PATCH_SIZE).min(rows);
                let right = (j + PATCH_SIZE).min(cols);

                matrix.reset();
                for &(dr, dc) in &offsets {
                    for r in i..bottom {
                        for c in j..right {
                            let rr = r as isize + dr;
                            let cc = c as isize + dc;
                            if rr >= i as isize
                                && (rr as usize) < bottom
                                && cc >= j as isize
                                && (cc as usize) < right
                            {
                                matrix.record(grey[[r, c]], grey[[rr as usize, cc as usize]]);
                            }
                        }
                    }
                }

                if matrix.is_empty() {
                    continue;
                }
                matrix.normalize();
                *out = matrix.statistic(params.statistic) as Sample;
            }
            row
        })
        .collect();

    Band::from_shape_vec((rows, cols), data)
        .map_err(|e| RasterError::Processing(e.to_string()))
}
