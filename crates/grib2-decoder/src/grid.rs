//! Grid definition templates (Section 3).
//!
//! Supports template 0 (equidistant cylindrical lat/lon, the MRMS
//! native grid) and template 30 (Lambert Conformal, bounds
//! approximated by a fixed CONUS rectangle).

use radar_common::{GeoBounds, PipelineError, PipelineResult};

use crate::reader::{read_i, read_u};

/// Coordinate divisor when the basic angle is absent (microdegrees).
const MICRODEGREES: f64 = 1_000_000.0;

/// Section 3: grid geometry common to all templates.
#[derive(Debug, Clone)]
pub struct GridDefinition {
    pub template_number: u16,
    /// Points along a parallel (Ni / Nx).
    pub width: u32,
    /// Points along a meridian (Nj / Ny).
    pub height: u32,
    pub num_points: u32,
    pub bounds: GeoBounds,
    pub scanning_mode: u8,
    pub projection: GridProjection,
}

/// Template-specific grid geometry.
#[derive(Debug, Clone)]
pub enum GridProjection {
    /// Template 3.0: equidistant cylindrical. Coordinates in degrees,
    /// longitudes normalized to [-180, 180].
    LatLon {
        lat1: f64,
        lon1: f64,
        lat2: f64,
        lon2: f64,
        dx: f64,
        dy: f64,
    },
    /// Template 3.30: Lambert Conformal. Only the first corner is
    /// decoded; no projection math is performed and the reported bounds
    /// are the fixed CONUS rectangle. Downstream consumers treat the
    /// rendered image as if it mapped to that rectangle.
    LambertConformal { lat1: f64, lon1: f64 },
}

/// Parse Section 3 from a whole-section slice.
pub fn parse_grid_definition(section: &[u8]) -> PipelineResult<GridDefinition> {
    // Octets 1-4: section length, 5: section number,
    // 6: source of grid definition, 7-10: number of data points,
    // 11: octets for optional list, 12: list interpretation,
    // 13-14: grid definition template number, 15+: template body.
    if section.len() < 14 {
        return Err(PipelineError::InvalidFormat(
            "truncated grid definition section".to_string(),
        ));
    }

    let num_points = read_u(section, 6, 4) as u32;
    let template_number = read_u(section, 12, 2) as u16;
    let body = &section[14..];

    match template_number {
        0 => parse_lat_lon(body, num_points),
        30 => parse_lambert(body, num_points),
        n => Err(PipelineError::UnsupportedGridTemplate(n)),
    }
}

/// Template 3.0: latitude/longitude (equidistant cylindrical).
fn parse_lat_lon(body: &[u8], num_points: u32) -> PipelineResult<GridDefinition> {
    // Template body layout (offsets relative to the body):
    // 0: shape of Earth, 1-15: Earth radius/axis fields (unused here)
    // 16-19: Ni, 20-23: Nj
    // 24-27: basic angle, 28-31: subdivisions of basic angle
    // 32-35: La1, 36-39: Lo1
    // 40: resolution and component flags
    // 41-44: La2, 45-48: Lo2
    // 49-52: Di, 53-56: Dj
    // 57: scanning mode
    if body.len() < 58 {
        return Err(PipelineError::InvalidFormat(format!(
            "grid template 0 needs 58 bytes, got {}",
            body.len()
        )));
    }

    let width = read_u(body, 16, 4) as u32;
    let height = read_u(body, 20, 4) as u32;

    // The basic angle scales the coordinate units; zero in either field
    // means the default microdegrees convention.
    let basic_angle = read_u(body, 24, 4);
    let subdivisions = read_u(body, 28, 4);
    let divisor = if basic_angle == 0 || subdivisions == 0 {
        MICRODEGREES
    } else {
        (basic_angle * subdivisions) as f64
    };

    let lat1 = read_i(body, 32, 4) as f64 / divisor;
    let lon1 = radar_common::normalize_longitude(read_i(body, 36, 4) as f64 / divisor);
    let lat2 = read_i(body, 41, 4) as f64 / divisor;
    let lon2 = radar_common::normalize_longitude(read_i(body, 45, 4) as f64 / divisor);
    let dx = read_u(body, 49, 4) as f64 / divisor;
    let dy = read_u(body, 53, 4) as f64 / divisor;
    let scanning_mode = body[57];

    validate_dimensions(num_points, width, height)?;

    Ok(GridDefinition {
        template_number: 0,
        width,
        height,
        num_points,
        bounds: GeoBounds::from_corners(lat1, lon1, lat2, lon2),
        scanning_mode,
        projection: GridProjection::LatLon {
            lat1,
            lon1,
            lat2,
            lon2,
            dx,
            dy,
        },
    })
}

/// Template 3.30: Lambert Conformal, approximated.
fn parse_lambert(body: &[u8], num_points: u32) -> PipelineResult<GridDefinition> {
    // Template body layout: 16-19: Nx, 20-23: Ny, 24-27: La1,
    // 28-31: Lo1, 50: scanning mode. The projection parameters
    // (LaD, LoV, latin1/latin2) are not decoded.
    if body.len() < 51 {
        return Err(PipelineError::InvalidFormat(format!(
            "grid template 30 needs 51 bytes, got {}",
            body.len()
        )));
    }

    let width = read_u(body, 16, 4) as u32;
    let height = read_u(body, 20, 4) as u32;
    let lat1 = read_i(body, 24, 4) as f64 / MICRODEGREES;
    let lon1 = radar_common::normalize_longitude(read_i(body, 28, 4) as f64 / MICRODEGREES);
    let scanning_mode = body[50];

    validate_dimensions(num_points, width, height)?;

    Ok(GridDefinition {
        template_number: 30,
        width,
        height,
        num_points,
        bounds: GeoBounds::CONUS,
        scanning_mode,
        projection: GridProjection::LambertConformal { lat1, lon1 },
    })
}

fn validate_dimensions(num_points: u32, width: u32, height: u32) -> PipelineResult<()> {
    if width == 0 || height == 0 {
        return Err(PipelineError::InvalidFormat(format!(
            "degenerate grid dimensions {}x{}",
            width, height
        )));
    }

    if num_points as u64 != width as u64 * height as u64 {
        return Err(PipelineError::InvalidFormat(format!(
            "declared {} data points but grid is {}x{}",
            num_points, width, height
        )));
    }

    Ok(())
}
