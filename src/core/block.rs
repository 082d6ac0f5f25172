use crate::core::change::{change_filter, ChangeParams};
use crate::core::glcm::{glcm_filter, GlcmParams};
use crate::core::nlmeans::{nl_means_filter, NlMeansParams};
use crate::core::speckle::{
    frost_filter, kuan_filter, lee_filter, median_filter, SpeckleFilterParams,
};
use crate::core::texture::{speckle_divergence, texture_filter, DivergenceParams, TextureParams};
use crate::core::wallis::{wallis_filter, WallisParams};
use crate::types::{
    Band, OutputBlock, PixelType, RasterBlock, RasterError, RasterInfo, RasterResult,
};
use serde::{Deserialize, Serialize};

/// Immutable per-call filter selection and parameters.
///
/// Built and validated once per processing call; blocks are then processed
/// statelessly against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FilterConfig {
    Lee(SpeckleFilterParams),
    Kuan(SpeckleFilterParams),
    Frost(SpeckleFilterParams),
    Median(SpeckleFilterParams),
    Texture(TextureParams),
    SpeckleDivergence(DivergenceParams),
    Glcm(GlcmParams),
    Wallis(WallisParams),
    ChangeDetection(ChangeParams),
    NlMeans(NlMeansParams),
}

impl FilterConfig {
    /// Validate parameter domains and band-count constraints against the
    /// source raster description. Fails before any pixel is processed.
    pub fn validate(&self, info: &RasterInfo) -> RasterResult<()> {
        match self {
            FilterConfig::Lee(p)
            | FilterConfig::Kuan(p)
            | FilterConfig::Frost(p)
            | FilterConfig::Median(p) => p.validate(),
            FilterConfig::Texture(p) => {
                require_single_band(info)?;
                p.validate()
            }
            FilterConfig::SpeckleDivergence(p) => {
                require_single_band(info)?;
                p.validate()
            }
            FilterConfig::Glcm(p) => {
                require_single_band(info)?;
                p.validate()
            }
            FilterConfig::Wallis(p) => p.validate(),
            FilterConfig::ChangeDetection(p) => p.validate(info.band_count),
            FilterConfig::NlMeans(p) => p.validate(),
        }
    }

    /// Descriptive label reported for the first output band
    pub fn band_name(&self) -> &'static str {
        match self {
            FilterConfig::Lee(_) => "LeeFilter",
            FilterConfig::Kuan(_) => "KuanFilter",
            FilterConfig::Frost(_) => "FrostFilter",
            FilterConfig::Median(_) => "MedianFilter",
            FilterConfig::Texture(_) => "TextureAnalysis",
            FilterConfig::SpeckleDivergence(_) => "SpeckleDivergence",
            FilterConfig::Glcm(_) => "GLCM",
            FilterConfig::Wallis(_) => "Wallis",
            FilterConfig::ChangeDetection(_) => "ChangeDetection",
            FilterConfig::NlMeans(_) => "NlMeans",
        }
    }

    /// Dataset classification tag reported back to the host
    pub fn datatype(&self) -> &'static str {
        match self {
            FilterConfig::ChangeDetection(_) => "Scientific",
            _ => "Processed",
        }
    }
}

fn require_single_band(info: &RasterInfo) -> RasterResult<()> {
    if info.band_count != 1 {
        return Err(RasterError::Configuration(
            "Image must be 1 band".to_string(),
        ));
    }
    Ok(())
}

/// Output shape and metadata dictated by the configured filter
#[derive(Debug, Clone)]
pub struct OutputInfo {
    pub band_count: usize,
    pub pixel_type: PixelType,
    /// Dataset classification tag ("Processed" or "Scientific")
    pub datatype: &'static str,
    /// Descriptive label for the first output band
    pub band_name: &'static str,
}

/// Per-block filter dispatcher.
///
/// Constructed from a validated configuration ("configure"), then applied
/// to any number of blocks; processing holds no mutable state, so one
/// processor may serve repeated or concurrent calls.
pub struct BlockProcessor {
    config: FilterConfig,
    info: RasterInfo,
}

impl BlockProcessor {
    /// Validate the configuration against the source raster description.
    pub fn configure(config: FilterConfig, info: RasterInfo) -> RasterResult<Self> {
        config.validate(&info)?;
        log::info!(
            "Configured {} filter for {} band(s)",
            config.band_name(),
            info.band_count
        );
        Ok(Self { config, info })
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Band count, sample type and metadata of the blocks this processor
    /// will emit.
    pub fn output_info(&self) -> OutputInfo {
        OutputInfo {
            band_count: self.output_band_count(),
            pixel_type: self.output_pixel_type(),
            datatype: self.config.datatype(),
            band_name: self.config.band_name(),
        }
    }

    /// Run the configured filter over one block.
    ///
    /// Iterates the relevant bands, dispatches to the filter kernel and
    /// clamp-casts the assembled output to the declared sample type.
    pub fn process(&self, block: &RasterBlock) -> RasterResult<OutputBlock> {
        if block.band_count() != self.info.band_count {
            return Err(RasterError::Processing(format!(
                "Block has {} band(s), configured for {}",
                block.band_count(),
                self.info.band_count
            )));
        }

        log::info!("Applying {} filter", self.config.band_name());

        let bands: Vec<Band> = match &self.config {
            FilterConfig::Lee(p) => {
                per_band(block, |band| lee_filter(band, p.window()))?
            }
            FilterConfig::Kuan(p) => {
                per_band(block, |band| kuan_filter(band, p.window()))?
            }
            FilterConfig::Frost(p) => per_band(block, |band| {
                frost_filter(band, p.window(), p.damping_factor)
            })?,
            FilterConfig::Median(p) => {
                per_band(block, |band| median_filter(band, p.window()))?
            }
            FilterConfig::Texture(p) => {
                vec![texture_filter(block.band(0), p.window(), p.statistic)?]
            }
            FilterConfig::SpeckleDivergence(p) => {
                vec![speckle_divergence(block.band(0), p.window())?]
            }
            FilterConfig::Glcm(p) => {
                vec![glcm_filter(block.band(0), p, self.info.band_statistics(0))?]
            }
            FilterConfig::Wallis(p) => per_band(block, |band| wallis_filter(band, p))?,
            FilterConfig::ChangeDetection(p) => {
                let a = block.band(p.source_band_a - 1);
                let b = block.band(p.source_band_b - 1);
                vec![change_filter(a, b, p.method)?]
            }
            FilterConfig::NlMeans(p) => per_band(block, |band| nl_means_filter(band, p))?,
        };

        let pixel_type = self.output_pixel_type();
        let bands = bands
            .into_iter()
            .map(|band| band.mapv(|v| pixel_type.clamp_cast(v)))
            .collect();

        log::info!("{} filter completed", self.config.band_name());
        Ok(OutputBlock { bands, pixel_type })
    }

    fn output_band_count(&self) -> usize {
        match &self.config {
            FilterConfig::Texture(_)
            | FilterConfig::SpeckleDivergence(_)
            | FilterConfig::Glcm(_)
            | FilterConfig::ChangeDetection(_) => 1,
            _ => self.info.band_count,
        }
    }

    fn output_pixel_type(&self) -> PixelType {
        match &self.config {
            FilterConfig::SpeckleDivergence(_) => PixelType::F32,
            FilterConfig::Median(_) | FilterConfig::NlMeans(_) => self.info.pixel_type,
            _ => PixelType::U16,
        }
    }
}

fn per_band(
    block: &RasterBlock,
    kernel: impl Fn(&Band) -> RasterResult<Band>,
) -> RasterResult<Vec<Band>> {
    block.bands().iter().map(&kernel).collect()
}
