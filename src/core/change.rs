use crate::maybe_rayon::*;
use crate::types::{Band, RasterError, RasterResult, Sample};
use serde::{Deserialize, Serialize};

/// Floor applied to the band ratio before the logarithm
const LOG_RATIO_FLOOR: Sample = 1.0e-15;

/// Change detection technique applied between two source bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeMethod {
    Differencing,
    Ratioing,
    Logarithmic,
}

/// Parameters for two-band change detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeParams {
    /// 1-based index of the first source band
    pub source_band_a: usize,
    /// 1-based index of the second source band
    pub source_band_b: usize,
    pub method: ChangeMethod,
}

impl Default for ChangeParams {
    fn default() -> Self {
        Self {
            source_band_a: 1,
            source_band_b: 2,
            method: ChangeMethod::Differencing,
        }
    }
}

impl ChangeParams {
    pub fn validate(&self, band_count: usize) -> RasterResult<()> {
        if band_count < 2 {
            return Err(RasterError::Configuration(
                "Image must be more than 1 band".to_string(),
            ));
        }
        for (name, index) in [
            ("first", self.source_band_a),
            ("second", self.source_band_b),
        ] {
            if index == 0 || index > band_count {
                return Err(RasterError::Configuration(format!(
                    "The {} source band index {} is outside 1..={}",
                    name, index, band_count
                )));
            }
        }
        if self.source_band_a == self.source_band_b {
            return Err(RasterError::Configuration(
                "Source bands must be distinct".to_string(),
            ));
        }
        Ok(())
    }
}

/// Compute the configured change statistic between two bands.
///
/// Zero denominators in the ratio methods yield 0 instead of propagating
/// an undefined result.
pub fn change_filter(a: &Band, b: &Band, method: ChangeMethod) -> RasterResult<Band> {
    log::debug!("Applying change detection: {:?}", method);

    let (rows, cols) = a.dim();

    let data: Vec<Sample> = (0..rows)
        .into_par_iter()
        .flat_map(|i| {
            let mut row = vec![0.0; cols];
            for (j, out) in row.iter_mut().enumerate() {
                let va = a[[i, j]];
                let vb = b[[i, j]];
                *out = match method {
                    ChangeMethod::Differencing => va - vb,
                    ChangeMethod::Ratioing => {
                        if vb == 0.0 {
                            0.0
                        } else {
                            va / vb
                        }
                    }
                    ChangeMethod::Logarithmic => {
                        if vb == 0.0 {
                            0.0
                        } else {
                            (va / vb).max(LOG_RATIO_FLOOR).ln()
                        }
                    }
                };
            }
            row
        })
        .collect();

    Band::from_shape_vec((rows, cols), data)
        .map_err(|e| RasterError::Processing(e.to_string()))
}
