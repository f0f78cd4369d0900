//! Reflectivity color scale.
//!
//! A fixed 17-stop RGBA ramp covering -30 to 75 dBZ. Values between
//! stops interpolate linearly per channel; values below -900 (or NaN)
//! are missing and render transparent.

use radar_common::MISSING_THRESHOLD;

/// One RGBA color value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// The reflectivity ramp, ordered by dBZ.
///
/// Below 5 dBZ is fully transparent (no significant precipitation);
/// the top stops run through magenta and white for extreme cores.
pub const REFLECTIVITY_STOPS: [(f32, Rgba); 17] = [
    (-30.0, Rgba::new(0, 0, 0, 0)),
    (0.0, Rgba::new(0, 0, 0, 0)),
    (5.0, Rgba::new(4, 68, 94, 160)),
    (10.0, Rgba::new(0, 160, 180, 200)),
    (15.0, Rgba::new(0, 200, 160, 220)),
    (20.0, Rgba::new(0, 230, 0, 240)),
    (25.0, Rgba::new(0, 200, 0, 250)),
    (30.0, Rgba::new(0, 144, 0, 255)),
    (35.0, Rgba::new(255, 255, 0, 255)),
    (40.0, Rgba::new(255, 192, 0, 255)),
    (45.0, Rgba::new(255, 128, 0, 255)),
    (50.0, Rgba::new(255, 0, 0, 255)),
    (55.0, Rgba::new(200, 0, 0, 255)),
    (60.0, Rgba::new(255, 0, 200, 255)),
    (65.0, Rgba::new(160, 0, 255, 255)),
    (70.0, Rgba::new(255, 255, 255, 255)),
    (75.0, Rgba::new(200, 200, 255, 255)),
];

/// Map a dBZ value to its display color.
///
/// Missing values (below -900, or NaN) are transparent; values outside
/// the ramp clamp to the end-stop colors; values at a stop reproduce
/// the stop color exactly.
pub fn color_for_dbz(dbz: f32) -> Rgba {
    if dbz.is_nan() || dbz < MISSING_THRESHOLD {
        return Rgba::TRANSPARENT;
    }

    let (first_dbz, first_color) = REFLECTIVITY_STOPS[0];
    if dbz < first_dbz {
        return first_color;
    }

    let (last_dbz, last_color) = REFLECTIVITY_STOPS[REFLECTIVITY_STOPS.len() - 1];
    if dbz >= last_dbz {
        return last_color;
    }

    for pair in REFLECTIVITY_STOPS.windows(2) {
        let (lo_dbz, lo) = pair[0];
        let (hi_dbz, hi) = pair[1];
        if dbz < hi_dbz {
            let t = (dbz - lo_dbz) / (hi_dbz - lo_dbz);
            return interpolate(lo, hi, t);
        }
    }

    last_color
}

/// Linear per-channel interpolation, rounding to nearest.
fn interpolate(from: Rgba, to: Rgba, t: f32) -> Rgba {
    let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    Rgba {
        r: mix(from.r, to.r),
        g: mix(from.g, to.g),
        b: mix(from.b, to.b),
        a: mix(from.a, to.a),
    }
}
