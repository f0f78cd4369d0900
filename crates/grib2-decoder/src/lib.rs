//! GRIB2 decoder for the radar pipeline (WMO FM 92 GRIB Edition 2).
//!
//! Parses the subset of GRIB2 carried by MRMS reflectivity products:
//! sections 0, 1, 3, 5 and 7, grid templates 0 and 30, and packing
//! templates 0, 40, 41 and 200. Sections 2, 4, 6 and 8 are skipped.

pub mod grid;
pub mod reader;
pub mod sections;
pub mod unpacking;

pub use grid::{GridDefinition, GridProjection};
pub use sections::{DataRepresentation, Identification, Indicator};
pub use unpacking::{Packing, ScaledFields};

use bytes::Bytes;
use radar_common::{PipelineError, PipelineResult};
use tracing::debug;

/// One parsed GRIB2 message, ready for unpacking.
#[derive(Debug, Clone)]
pub struct Grib2Message {
    pub indicator: Indicator,
    pub identification: Identification,
    pub grid: GridDefinition,
    pub representation: DataRepresentation,
    /// Section 7 payload (packed values).
    pub data: Bytes,
}

impl Grib2Message {
    /// Decode the packed payload into a dense dBZ field of
    /// `grid.num_points` values, [`radar_common::MISSING`] where no
    /// measurement exists.
    pub fn unpack(&self) -> PipelineResult<Vec<f32>> {
        unpacking::unpack(
            &self.representation.packing,
            &self.data,
            self.grid.num_points as usize,
        )
    }
}

/// Parse a single GRIB2 message.
///
/// Walk order: Section 0 at offset 0, Section 1 at offset 16, an
/// optional Section 2 skipped by length, then Sections 3, 5 and 7
/// located by forward scan (Sections 4 and 6 are skipped
/// transparently).
pub fn parse_message(data: &[u8]) -> PipelineResult<Grib2Message> {
    let indicator = sections::parse_indicator(data)?;
    sections::validate_message_length(data, &indicator)?;

    let (identification, sec1_length) = sections::parse_identification(data)?;
    let offset = sections::skip_local_use(data, sections::INDICATOR_LENGTH + sec1_length);

    let sec3 = sections::find_section(data, offset, 3)?;
    let grid = grid::parse_grid_definition(sections::section_slice(data, sec3)?)?;

    let sec5 = sections::find_section(data, sections::next_section_offset(data, sec3), 5)?;
    let representation = sections::parse_data_representation(sections::section_slice(data, sec5)?)?;

    if representation.num_data_points != grid.num_points {
        return Err(PipelineError::InvalidFormat(format!(
            "data representation declares {} points but grid has {}",
            representation.num_data_points, grid.num_points
        )));
    }

    let sec7 = sections::find_section(data, sections::next_section_offset(data, sec5), 7)?;
    let payload = sections::parse_data_section(sections::section_slice(data, sec7)?)?;

    debug!(
        discipline = indicator.discipline,
        width = grid.width,
        height = grid.height,
        grid_template = grid.template_number,
        packing_template = representation.packing.template_number(),
        payload_bytes = payload.len(),
        "parsed GRIB2 message"
    );

    Ok(Grib2Message {
        indicator,
        identification,
        grid,
        representation,
        data: payload,
    })
}
