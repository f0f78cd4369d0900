//! Radar product pipeline: gzip-compressed GRIB2 in, geo-aligned PNG
//! plus structured metadata out.
//!
//! The pipeline is pure and synchronous. Each invocation owns its
//! buffers, so concurrent calls need no coordination, and identical
//! input bytes produce byte-identical output. Caching and HTTP belong
//! to the caller.

use std::io::Read;

use radar_common::RadarMetadata;
use tracing::{debug, info};

pub use grib2_decoder::{parse_message, Grib2Message};
pub use radar_common::{GeoBounds, PipelineError, PipelineResult};

/// One rendered radar product.
#[derive(Debug, Clone)]
pub struct RadarProduct {
    /// PNG-encoded RGBA overlay, north-up and west-left.
    pub png: Vec<u8>,
    pub metadata: RadarMetadata,
}

/// Run the full pipeline over one gzip-compressed GRIB2 product.
///
/// Steps: decompress, parse the message, unpack the dBZ field, render
/// the raster, emit metadata. Errors at any step propagate unchanged;
/// nothing is retried.
pub fn process(compressed: &[u8]) -> PipelineResult<RadarProduct> {
    let raw = decompress_gzip(compressed)?;
    let message = grib2_decoder::parse_message(&raw)?;

    let grid = &message.grid;
    let width = grid.width as usize;
    let height = grid.height as usize;

    debug!(
        width = grid.width,
        height = grid.height,
        grid_template = grid.template_number,
        packing_template = message.representation.packing.template_number(),
        scanning_mode = grid.scanning_mode,
        "decoded GRIB2 message"
    );

    let field = message.unpack()?;
    let pixels = radar_renderer::render_rgba(&field, width, height, grid.scanning_mode);
    let png = radar_renderer::png::encode_rgba(&pixels, width, height)?;

    let metadata = RadarMetadata {
        timestamp: message.identification.reference_time,
        bounds: grid.bounds,
        width: grid.width,
        height: grid.height,
    };

    info!(
        timestamp = %metadata.timestamp,
        width = metadata.width,
        height = metadata.height,
        png_bytes = png.len(),
        "rendered radar product"
    );

    Ok(RadarProduct { png, metadata })
}

/// Decompress a single-member gzip stream.
pub fn decompress_gzip(data: &[u8]) -> PipelineResult<Vec<u8>> {
    let mut decoder = flate2::read::GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| PipelineError::DecompressionFailed(e.to_string()))?;
    Ok(decompressed)
}
