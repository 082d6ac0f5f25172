//! Core raster filtering modules

pub mod block;
pub mod change;
pub mod glcm;
pub mod moments;
pub mod nlmeans;
pub mod speckle;
pub mod texture;
pub mod wallis;
pub mod window;

// Re-export main types
pub use block::{BlockProcessor, FilterConfig, OutputInfo};
pub use change::{ChangeMethod, ChangeParams};
pub use glcm::{CooccurrenceMatrix, GlcmAngle, GlcmParams, GlcmStatistic, Quantizer};
pub use moments::{LocalStatistics, MomentKind};
pub use nlmeans::NlMeansParams;
pub use speckle::{SpeckleFilterParams, NOISE_COEFFICIENT, ZERO_MEAN_CV_SQUARED};
pub use texture::{DivergenceParams, TextureParams};
pub use wallis::WallisParams;
pub use window::{normalize_window_size, WindowSpec};
