//! PNG encoding for RGBA radar imagery.
//!
//! Output is always truecolor with alpha (color type 6), bit depth 8,
//! no palette. Chunk writing is done by hand over a zlib stream so the
//! encoder stays deterministic: identical pixels produce identical
//! bytes, which keeps the result cache-friendly.

use std::io::Write;

use radar_common::{PipelineError, PipelineResult};

/// zlib level for IDAT. Level 6 balances size against encode time for
/// CONUS-sized overlays.
const COMPRESSION_LEVEL: u32 = 6;

/// PNG file signature.
const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Encode an RGBA pixel buffer as a PNG image.
pub fn encode_rgba(pixels: &[u8], width: usize, height: usize) -> PipelineResult<Vec<u8>> {
    if width == 0 || height == 0 || pixels.len() != width * height * 4 {
        return Err(PipelineError::RenderFailed(format!(
            "pixel buffer of {} bytes does not match {}x{} RGBA",
            pixels.len(),
            width,
            height
        )));
    }

    let mut png = Vec::new();
    png.extend_from_slice(&SIGNATURE);

    // IHDR chunk
    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr.extend_from_slice(&(height as u32).to_be_bytes());
    ihdr.push(8); // bit depth
    ihdr.push(6); // color type 6 = truecolor + alpha
    ihdr.push(0); // compression method
    ihdr.push(0); // filter method
    ihdr.push(0); // interlace method
    write_chunk(&mut png, b"IHDR", &ihdr);

    // IDAT chunk
    let idat = deflate_idat(pixels, width, height)
        .map_err(|e| PipelineError::RenderFailed(format!("IDAT compression failed: {}", e)))?;
    write_chunk(&mut png, b"IDAT", &idat);

    // IEND chunk
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Write one PNG chunk: length, type, data, CRC over type + data.
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Prefix each scanline with filter type 0 and deflate the result.
fn deflate_idat(pixels: &[u8], width: usize, height: usize) -> std::io::Result<Vec<u8>> {
    let mut raw = Vec::with_capacity(height * (1 + width * 4));
    for row in pixels.chunks_exact(width * 4) {
        raw.push(0); // filter type: none
        raw.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(
        Vec::new(),
        flate2::Compression::new(COMPRESSION_LEVEL),
    );
    encoder.write_all(&raw)?;
    encoder.finish()
}
