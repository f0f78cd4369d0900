//! GRIB2 section parsing.
//!
//! A GRIB2 message is Section 0 (fixed 16 bytes), a run of
//! length-prefixed sections 1..=7, and the 4-byte "7777" end marker.
//! Every section after 0 starts with a 4-byte big-endian length and a
//! 1-byte section number.

use bytes::Bytes;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use radar_common::{PipelineError, PipelineResult};

use crate::reader::{read_f32, read_i, read_u};
use crate::unpacking::{Packing, ScaledFields};

/// Byte length of Section 0.
pub const INDICATOR_LENGTH: usize = 16;

/// Section 8 end-of-message marker.
pub const END_MARKER: &[u8; 4] = b"7777";

/// Section 0: Indicator Section.
#[derive(Debug, Clone)]
pub struct Indicator {
    pub discipline: u8,
    pub edition: u8,
    /// Total message length including Section 0 and the end marker.
    pub total_length: u64,
}

/// Section 1: Identification Section.
#[derive(Debug, Clone)]
pub struct Identification {
    pub center: u16,
    pub sub_center: u16,
    pub reference_time: DateTime<Utc>,
}

/// Section 5: Data Representation Section.
#[derive(Debug, Clone)]
pub struct DataRepresentation {
    pub num_data_points: u32,
    pub packing: Packing,
}

/// Parse Section 0 from the start of the message.
pub fn parse_indicator(data: &[u8]) -> PipelineResult<Indicator> {
    if data.len() < INDICATOR_LENGTH {
        return Err(PipelineError::InvalidFormat(
            "truncated indicator section".to_string(),
        ));
    }

    if &data[0..4] != b"GRIB" {
        return Err(PipelineError::InvalidFormat(
            "bad GRIB magic bytes".to_string(),
        ));
    }

    // Section 0 layout:
    // Octets 1-4: "GRIB"
    // Octets 5-6: reserved
    // Octet 7: discipline
    // Octet 8: GRIB edition number
    // Octets 9-16: total message length (u64 big-endian)
    let discipline = data[6];
    let edition = data[7];

    if edition != 2 {
        return Err(PipelineError::UnsupportedEdition(edition));
    }

    let total_length = read_u(data, 8, 8);

    Ok(Indicator {
        discipline,
        edition,
        total_length,
    })
}

/// Cross-check the declared message length against the buffer and the
/// trailing "7777" end marker.
pub fn validate_message_length(data: &[u8], indicator: &Indicator) -> PipelineResult<()> {
    let total = indicator.total_length as usize;

    if total < INDICATOR_LENGTH + END_MARKER.len() || total > data.len() {
        return Err(PipelineError::InvalidFormat(format!(
            "declared message length {} does not fit buffer of {} bytes",
            total,
            data.len()
        )));
    }

    if &data[total - 4..total] != END_MARKER {
        return Err(PipelineError::InvalidFormat(
            "missing 7777 end marker".to_string(),
        ));
    }

    Ok(())
}

/// Parse Section 1 at offset 16; returns the section and its byte
/// length so the walk can advance past it.
pub fn parse_identification(data: &[u8]) -> PipelineResult<(Identification, usize)> {
    const OFFSET: usize = INDICATOR_LENGTH;

    if data.len() < OFFSET + 21 {
        return Err(PipelineError::InvalidFormat(
            "truncated identification section".to_string(),
        ));
    }

    let length = read_u(data, OFFSET, 4) as usize;
    if length < 21 || OFFSET + length > data.len() {
        return Err(PipelineError::InvalidFormat(format!(
            "identification section length {} is invalid",
            length
        )));
    }
    if data[OFFSET + 4] != 1 {
        return Err(PipelineError::InvalidFormat(format!(
            "expected section 1 at offset {}, found section {}",
            OFFSET,
            data[OFFSET + 4]
        )));
    }

    // Field layout relative to the 5-byte section header:
    // 0-1: center, 2-3: sub-center, 4: master table version,
    // 5: local table version, 6: significance of reference time,
    // 7-8: year, 9: month, 10: day, 11: hour, 12: minute, 13: second
    let sec = &data[OFFSET + 5..];

    let center = read_u(sec, 0, 2) as u16;
    let sub_center = read_u(sec, 2, 2) as u16;

    let year = read_u(sec, 7, 2) as i32;
    let month = sec[9] as u32;
    let day = sec[10] as u32;
    let hour = sec[11] as u32;
    let minute = sec[12] as u32;
    let second = sec[13] as u32;

    // Second 60 is a leap second; chrono has no direct slot for it, so
    // fold it forward into the next minute.
    let (clock_second, leap) = if second == 60 { (59, true) } else { (second, false) };

    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, clock_second))
        .ok_or_else(|| {
            PipelineError::InvalidFormat(format!(
                "invalid reference time {:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            ))
        })?;

    let mut reference_time = DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc);
    if leap {
        reference_time += Duration::seconds(1);
    }

    Ok((
        Identification {
            center,
            sub_center,
            reference_time,
        },
        length,
    ))
}

/// Skip an optional Section 2 (local use) at `offset`, returning the
/// offset of the following section. Does not advance otherwise.
pub fn skip_local_use(data: &[u8], offset: usize) -> usize {
    if offset + 5 <= data.len() {
        let length = read_u(data, offset, 4) as usize;
        if data[offset + 4] == 2 && length >= 5 {
            return offset + length;
        }
    }
    offset
}

/// Forward-scan for section `target` starting at `offset`.
///
/// Each step reads the section length and peeks the section number. The
/// scan stops at a zero length, at section 8, or at an out-of-range
/// section number; anything else (sections 4 and 6 in particular) is
/// skipped by its length.
pub fn find_section(data: &[u8], mut offset: usize, target: u8) -> PipelineResult<usize> {
    while offset + 5 <= data.len() {
        let length = read_u(data, offset, 4) as usize;
        let number = data[offset + 4];

        if number == target {
            return Ok(offset);
        }
        if length == 0 || number >= 8 {
            break;
        }

        offset += length;
    }

    Err(PipelineError::MissingSection(target))
}

/// Slice one whole section (header included) at `offset`.
pub fn section_slice(data: &[u8], offset: usize) -> PipelineResult<&[u8]> {
    let length = read_u(data, offset, 4) as usize;

    if length < 5 || offset + length > data.len() {
        return Err(PipelineError::InvalidFormat(format!(
            "section at offset {} has invalid length {}",
            offset, length
        )));
    }

    Ok(&data[offset..offset + length])
}

/// Offset of the section following the one at `offset`.
pub fn next_section_offset(data: &[u8], offset: usize) -> usize {
    offset + read_u(data, offset, 4) as usize
}

/// Parse Section 5 (data representation) from a whole-section slice.
pub fn parse_data_representation(section: &[u8]) -> PipelineResult<DataRepresentation> {
    // Octets 1-4: section length, 5: section number,
    // 6-9: number of data points, 10-11: template number,
    // 12+: template-specific fields.
    if section.len() < 11 {
        return Err(PipelineError::InvalidFormat(
            "truncated data representation section".to_string(),
        ));
    }

    let num_data_points = read_u(section, 5, 4) as u32;
    let template_number = read_u(section, 9, 2) as u16;

    let packing = match template_number {
        0 => Packing::Simple(parse_scaled_fields(section)?),
        40 => Packing::Jpeg2000(parse_scaled_fields(section)?),
        41 => Packing::EmbeddedPng(parse_scaled_fields(section)?),
        200 => Packing::RunLength,
        n => return Err(PipelineError::UnsupportedPacking(n)),
    };

    Ok(DataRepresentation {
        num_data_points,
        packing,
    })
}

/// Parse the scale fields shared by templates 5.0, 5.40 and 5.41.
///
/// The binary and decimal scale factors are sign-magnitude 16-bit
/// values, like every other signed quantity in GRIB2.
fn parse_scaled_fields(section: &[u8]) -> PipelineResult<ScaledFields> {
    // Template fields relative to the section start:
    // 11-14: reference value (IEEE binary32)
    // 15-16: binary scale factor E
    // 17-18: decimal scale factor D
    // 19: bits per packed value
    // 20: type of original field values
    if section.len() < 21 {
        return Err(PipelineError::InvalidFormat(
            "truncated data representation template".to_string(),
        ));
    }

    let reference_value = read_f32(section, 11);
    let binary_scale_factor = read_i(section, 15, 2) as i16;
    let decimal_scale_factor = read_i(section, 17, 2) as i16;
    let bits_per_value = section[19];
    let original_type = section[20];

    if bits_per_value > 32 {
        return Err(PipelineError::InvalidFormat(format!(
            "bits per value {} exceeds 32",
            bits_per_value
        )));
    }

    Ok(ScaledFields {
        reference_value,
        binary_scale_factor,
        decimal_scale_factor,
        bits_per_value,
        original_type,
    })
}

/// Parse Section 7 (data) from a whole-section slice, returning the
/// packed payload.
pub fn parse_data_section(section: &[u8]) -> PipelineResult<Bytes> {
    if section.len() < 5 {
        return Err(PipelineError::InvalidFormat(
            "truncated data section".to_string(),
        ));
    }

    Ok(Bytes::copy_from_slice(&section[5..]))
}
