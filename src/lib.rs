//! rastex: a windowed local-statistics raster filtering engine
//!
//! Slides a (possibly edge-clamped) window over 2D raster bands and derives
//! per-pixel output values under several statistical models: adaptive
//! speckle reduction (Lee, Kuan, Frost), moving-window moment statistics,
//! grey-level co-occurrence texture features, and Wallis-style adaptive
//! brightness/contrast normalization.

pub mod core;
pub mod types;

mod maybe_rayon;

// Re-export main types and functions for easier access
pub use types::{
    Band, BandStatistics, OutputBlock, PixelType, RasterBlock, RasterError, RasterInfo,
    RasterResult, Sample,
};

pub use crate::core::{
    normalize_window_size, BlockProcessor, ChangeMethod, ChangeParams, CooccurrenceMatrix,
    DivergenceParams, FilterConfig, GlcmAngle, GlcmParams, GlcmStatistic, MomentKind,
    NlMeansParams, OutputInfo, Quantizer, SpeckleFilterParams, TextureParams, WallisParams,
    WindowSpec,
};
