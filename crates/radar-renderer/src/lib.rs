//! Rendering for radar reflectivity fields.
//!
//! Maps dBZ values through the fixed reflectivity color scale,
//! reorients fields into north-up west-left raster order, and encodes
//! the result as an RGBA PNG.

pub mod colorscale;
pub mod png;
pub mod raster;

pub use colorscale::{color_for_dbz, Rgba, REFLECTIVITY_STOPS};
pub use raster::{render_rgba, reorient, SCAN_EAST_TO_WEST, SCAN_SOUTH_TO_NORTH};
