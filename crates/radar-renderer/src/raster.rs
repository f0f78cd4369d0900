//! Scanning-mode-aware raster assembly.
//!
//! GRIB2 fields arrive in whatever traversal order the scanning mode
//! declares; output rasters are always north-up, west-left, row-major.

use radar_common::MISSING;
use rayon::prelude::*;

use crate::colorscale::color_for_dbz;

/// Scanning-mode flag: points run east to west when set.
pub const SCAN_EAST_TO_WEST: u8 = 0x80;

/// Scanning-mode flag: points run south to north when set.
pub const SCAN_SOUTH_TO_NORTH: u8 = 0x40;

/// Source index for output pixel `(i, j)` given the scanning mode.
#[inline]
fn source_index(i: usize, j: usize, width: usize, height: usize, scanning_mode: u8) -> usize {
    let src_x = if scanning_mode & SCAN_EAST_TO_WEST == 0 {
        i
    } else {
        width - 1 - i
    };
    let src_y = if scanning_mode & SCAN_SOUTH_TO_NORTH == 0 {
        j
    } else {
        height - 1 - j
    };
    src_y * width + src_x
}

/// Reorder a field into north-up west-left row-major order.
pub fn reorient(field: &[f32], width: usize, height: usize, scanning_mode: u8) -> Vec<f32> {
    let mut out = Vec::with_capacity(width * height);
    for j in 0..height {
        for i in 0..width {
            let idx = source_index(i, j, width, height, scanning_mode);
            out.push(field.get(idx).copied().unwrap_or(MISSING));
        }
    }
    out
}

/// Render a dBZ field into a north-up, west-left RGBA buffer.
///
/// Rows are processed in parallel; each output row reads only the
/// source field, so no coordination is needed.
pub fn render_rgba(field: &[f32], width: usize, height: usize, scanning_mode: u8) -> Vec<u8> {
    debug_assert_eq!(
        field.len(),
        width * height,
        "field of {} values does not match {}x{} grid",
        field.len(),
        width,
        height
    );

    let mut pixels = vec![0u8; width * height * 4];

    pixels
        .par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(j, row)| {
            for i in 0..width {
                let idx = source_index(i, j, width, height, scanning_mode);
                let dbz = field.get(idx).copied().unwrap_or(MISSING);
                let color = color_for_dbz(dbz);

                let px = i * 4;
                row[px] = color.r;
                row[px + 1] = color.g;
                row[px + 2] = color.b;
                row[px + 3] = color.a;
            }
        });

    pixels
}
