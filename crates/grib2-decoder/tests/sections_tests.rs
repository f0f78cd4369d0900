//! Section-walk tests over synthetic GRIB2 messages.

use chrono::{TimeZone, Utc};
use grib2_decoder::{parse_message, GridProjection};
use radar_common::PipelineError;
use test_utils::Grib2MessageBuilder;

// ============================================================================
// Happy path
// ============================================================================

#[test]
fn test_parse_default_message() {
    let message = parse_message(&Grib2MessageBuilder::new().build()).unwrap();

    assert_eq!(message.indicator.discipline, 209);
    assert_eq!(message.indicator.edition, 2);
    assert_eq!(message.identification.center, 161);
    assert_eq!(
        message.identification.reference_time,
        Utc.with_ymd_and_hms(2024, 1, 15, 18, 42, 0).unwrap()
    );

    assert_eq!(message.grid.width, 1);
    assert_eq!(message.grid.height, 1);
    assert_eq!(message.grid.num_points, 1);
    assert_eq!(message.grid.bounds.north, 40.0);
    assert_eq!(message.grid.bounds.south, 40.0);
    assert_eq!(message.grid.bounds.east, -100.0);
    assert_eq!(message.grid.bounds.west, -100.0);

    assert_eq!(message.representation.num_data_points, 1);
    assert_eq!(message.representation.packing.template_number(), 0);
    assert_eq!(message.data.as_ref(), &[0x1E]);
}

#[test]
fn test_total_length_matches_sections() {
    let bytes = Grib2MessageBuilder::new()
        .with_grid(4, 3)
        .with_payload(vec![0; 12])
        .build();
    let message = parse_message(&bytes).unwrap();
    assert_eq!(message.indicator.total_length as usize, bytes.len());
}

// ============================================================================
// Section skipping (sections 2, 4 and 6 are transparent)
// ============================================================================

#[test]
fn test_optional_sections_do_not_change_output() {
    let plain = Grib2MessageBuilder::new()
        .with_grid(2, 2)
        .with_payload(vec![10, 20, 30, 40]);
    let with_extras = plain
        .clone()
        .with_local_use(vec![0xDE, 0xAD, 0xBE, 0xEF])
        .with_product_definition()
        .with_bitmap();

    let a = parse_message(&plain.build()).unwrap().unpack().unwrap();
    let b = parse_message(&with_extras.build()).unwrap().unpack().unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_local_use_section_alone_is_skipped() {
    let bytes = Grib2MessageBuilder::new()
        .with_local_use(vec![1, 2, 3])
        .build();
    let message = parse_message(&bytes).unwrap();
    assert_eq!(message.grid.num_points, 1);
}

// ============================================================================
// Error paths
// ============================================================================

#[test]
fn test_edition_1_rejected() {
    let bytes = Grib2MessageBuilder::new().with_edition(1).build();
    let err = parse_message(&bytes).unwrap_err();
    assert!(matches!(err, PipelineError::UnsupportedEdition(1)));
}

#[test]
fn test_bad_magic_rejected() {
    let mut bytes = Grib2MessageBuilder::new().build();
    bytes[0] = b'X';
    let err = parse_message(&bytes).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidFormat(_)));
}

#[test]
fn test_missing_grid_section() {
    let bytes = Grib2MessageBuilder::new().without_grid_section().build();
    let err = parse_message(&bytes).unwrap_err();
    assert!(matches!(err, PipelineError::MissingSection(3)));
}

#[test]
fn test_missing_representation_section() {
    let bytes = Grib2MessageBuilder::new()
        .without_representation_section()
        .build();
    let err = parse_message(&bytes).unwrap_err();
    assert!(matches!(err, PipelineError::MissingSection(5)));
}

#[test]
fn test_missing_data_section() {
    let bytes = Grib2MessageBuilder::new().without_data_section().build();
    let err = parse_message(&bytes).unwrap_err();
    assert!(matches!(err, PipelineError::MissingSection(7)));
}

#[test]
fn test_truncated_message() {
    let bytes = Grib2MessageBuilder::new().build();
    let err = parse_message(&bytes[..20]).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidFormat(_)));
}

#[test]
fn test_tampered_end_marker() {
    let mut bytes = Grib2MessageBuilder::new().build();
    let len = bytes.len();
    bytes[len - 1] = b'8';
    let err = parse_message(&bytes).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidFormat(_)));
}

#[test]
fn test_point_count_mismatch() {
    let bytes = Grib2MessageBuilder::new()
        .with_grid(2, 2)
        .with_declared_num_points(5)
        .build();
    let err = parse_message(&bytes).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidFormat(_)));
}

#[test]
fn test_unsupported_grid_template() {
    let bytes = Grib2MessageBuilder::new()
        .with_declared_grid_template(99)
        .build();
    let err = parse_message(&bytes).unwrap_err();
    assert!(matches!(err, PipelineError::UnsupportedGridTemplate(99)));
}

#[test]
fn test_unsupported_packing_template() {
    let bytes = Grib2MessageBuilder::new().with_packing_template(3).build();
    let err = parse_message(&bytes).unwrap_err();
    assert!(matches!(err, PipelineError::UnsupportedPacking(3)));
}

#[test]
fn test_invalid_reference_date() {
    let bytes = Grib2MessageBuilder::new()
        .with_reference_time(2024, 13, 1, 0, 0, 0)
        .build();
    let err = parse_message(&bytes).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidFormat(_)));
}

// ============================================================================
// Reference time edge cases
// ============================================================================

#[test]
fn test_leap_second_folds_forward() {
    let bytes = Grib2MessageBuilder::new()
        .with_reference_time(2024, 6, 30, 23, 59, 60)
        .build();
    let message = parse_message(&bytes).unwrap();
    assert_eq!(
        message.identification.reference_time,
        Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()
    );
}

// ============================================================================
// Grid templates
// ============================================================================

#[test]
fn test_lat_lon_longitude_normalization() {
    // MRMS CONUS corners in the 0-360 convention.
    let bytes = Grib2MessageBuilder::new()
        .with_grid(20, 15)
        .with_corners(54.995, 230.005, 20.005, 299.995)
        .with_payload(vec![0; 300])
        .build();
    let message = parse_message(&bytes).unwrap();

    let bounds = message.grid.bounds;
    assert!((bounds.west - -129.995).abs() < 1e-6);
    assert!((bounds.east - -60.005).abs() < 1e-6);
    assert!(bounds.west <= bounds.east);
    assert!((-180.0..=180.0).contains(&bounds.west));
    assert!((-180.0..=180.0).contains(&bounds.east));

    match message.grid.projection {
        GridProjection::LatLon { lon1, lon2, .. } => {
            assert!((lon1 - -129.995).abs() < 1e-6);
            assert!((lon2 - -60.005).abs() < 1e-6);
        }
        _ => panic!("expected lat/lon projection"),
    }
}

#[test]
fn test_lat_lon_increments() {
    let bytes = Grib2MessageBuilder::new()
        .with_grid(2, 2)
        .with_corners(40.0, 260.0, 39.99, 260.01)
        .with_payload(vec![0; 4])
        .build();
    let message = parse_message(&bytes).unwrap();

    match message.grid.projection {
        GridProjection::LatLon { dx, dy, .. } => {
            assert!((dx - 0.01).abs() < 1e-9);
            assert!((dy - 0.01).abs() < 1e-9);
        }
        _ => panic!("expected lat/lon projection"),
    }
}

#[test]
fn test_lambert_reports_conus_bounds() {
    let bytes = Grib2MessageBuilder::new()
        .with_lambert_grid()
        .with_grid(3, 2)
        .with_corners(21.138, 237.28, 0.0, 0.0)
        .with_scanning_mode(0x40)
        .with_payload(vec![0; 6])
        .build();
    let message = parse_message(&bytes).unwrap();

    assert_eq!(message.grid.template_number, 30);
    assert_eq!(message.grid.width, 3);
    assert_eq!(message.grid.height, 2);
    assert_eq!(message.grid.scanning_mode, 0x40);

    // Bounds are always the fixed CONUS rectangle for Lambert grids.
    assert_eq!(message.grid.bounds.north, 55.0);
    assert_eq!(message.grid.bounds.south, 20.0);
    assert_eq!(message.grid.bounds.west, -130.0);
    assert_eq!(message.grid.bounds.east, -60.0);

    match message.grid.projection {
        GridProjection::LambertConformal { lat1, lon1 } => {
            assert!((lat1 - 21.138).abs() < 1e-6);
            assert!((lon1 - -122.72).abs() < 1e-6);
        }
        _ => panic!("expected Lambert projection"),
    }
}

#[test]
fn test_scanning_mode_surfaced() {
    for mode in [0x00u8, 0x40, 0x80, 0xC0] {
        let bytes = Grib2MessageBuilder::new().with_scanning_mode(mode).build();
        let message = parse_message(&bytes).unwrap();
        assert_eq!(message.grid.scanning_mode, mode);
    }
}
