//! Error types for the radar pipeline.

use thiserror::Error;

/// Result type alias using PipelineError.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Primary error type for the radar pipeline.
///
/// Errors propagate out of the pipeline facade unchanged; nothing is
/// retried internally.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bad magic bytes, truncated section, or length mismatch.
    #[error("Invalid GRIB2 format: {0}")]
    InvalidFormat(String),

    /// The message declares a GRIB edition other than 2.
    #[error("Unsupported GRIB edition {0} (only edition 2 is supported)")]
    UnsupportedEdition(u8),

    /// A required section (3, 5 or 7) was not found.
    #[error("Required GRIB2 section {0} not found")]
    MissingSection(u8),

    /// Grid definition template outside {0, 30}.
    #[error("Unsupported grid definition template {0}")]
    UnsupportedGridTemplate(u16),

    /// Data representation template outside {0, 40, 41, 200}.
    #[error("Unsupported data representation template {0}")]
    UnsupportedPacking(u16),

    /// Gzip or embedded PNG decode failed catastrophically.
    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),

    /// The PNG encoder rejected the pixel buffer.
    #[error("Rendering failed: {0}")]
    RenderFailed(String),
}

impl PipelineError {
    /// HTTP status the outer API layer should answer with.
    ///
    /// Faults in the upstream product bytes map to 503 (the next product
    /// may decode fine); faults in our own rendering map to 500.
    pub fn http_status_code(&self) -> u16 {
        match self {
            PipelineError::RenderFailed(_) => 500,
            _ => 503,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(PipelineError::RenderFailed("buf".into()).http_status_code(), 500);
        assert_eq!(PipelineError::MissingSection(3).http_status_code(), 503);
        assert_eq!(PipelineError::UnsupportedEdition(1).http_status_code(), 503);
        assert_eq!(
            PipelineError::DecompressionFailed("gzip".into()).http_status_code(),
            503
        );
    }

    #[test]
    fn test_display_carries_detail() {
        let err = PipelineError::MissingSection(5);
        assert!(err.to_string().contains('5'));

        let err = PipelineError::UnsupportedPacking(3);
        assert!(err.to_string().contains('3'));
    }
}
