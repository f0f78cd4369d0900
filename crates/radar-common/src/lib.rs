//! Shared types for the radar data pipeline.

pub mod bounds;
pub mod error;
pub mod metadata;

pub use bounds::{normalize_longitude, GeoBounds};
pub use error::{PipelineError, PipelineResult};
pub use metadata::RadarMetadata;

/// Sentinel stored in dBZ fields where no measurement exists.
pub const MISSING: f32 = -999.0;

/// Any field value below this is treated as missing downstream.
pub const MISSING_THRESHOLD: f32 = -900.0;
