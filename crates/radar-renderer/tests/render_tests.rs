//! Render-and-decode tests: fields go through the color scale, raster
//! assembly and PNG encoder, then come back out through a reference
//! PNG decoder.

use radar_renderer::{color_for_dbz, png::encode_rgba, render_rgba, Rgba};

/// Decode a PNG back to (pixels, width, height) with the reference
/// decoder.
fn decode_png(data: &[u8]) -> (Vec<u8>, u32, u32) {
    let decoder = png::Decoder::new(data);
    let mut reader = decoder.read_info().expect("valid PNG");
    let mut buf = vec![0u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).expect("one frame");
    buf.truncate(info.buffer_size());
    (buf, info.width, info.height)
}

// ============================================================================
// Full raster pipeline
// ============================================================================

#[test]
fn test_encode_decode_roundtrip() {
    let field = [30.0, 45.0, -999.0, 60.0, 5.0, 75.0];
    let pixels = render_rgba(&field, 3, 2, 0x00);
    let png = encode_rgba(&pixels, 3, 2).unwrap();

    let (decoded, width, height) = decode_png(&png);
    assert_eq!(width, 3);
    assert_eq!(height, 2);
    assert_eq!(decoded, pixels);
}

#[test]
fn test_missing_cells_render_transparent_in_png() {
    let field = [-999.0, -950.0, f32::NAN, 50.0];
    let pixels = render_rgba(&field, 2, 2, 0x00);
    let png = encode_rgba(&pixels, 2, 2).unwrap();

    let (decoded, _, _) = decode_png(&png);
    // Three missing cells, fully transparent.
    for cell in 0..3 {
        assert_eq!(&decoded[cell * 4..cell * 4 + 4], &[0, 0, 0, 0]);
    }
    // The live cell carries the 50 dBZ color.
    assert_eq!(&decoded[12..16], &[255, 0, 0, 255]);
}

#[test]
fn test_scanning_modes_converge_to_same_image() {
    // The same geographic scene stored under each scanning mode must
    // produce identical rasters once reoriented.
    let north_up = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0];
    let width = 3;
    let height = 2;

    let reference = render_rgba(&north_up, width, height, 0x00);

    for mode in [0x40u8, 0x80, 0xC0] {
        // Store the scene in `mode` order by inverse-transforming, which
        // for these axis flips is the transform itself.
        let stored = radar_renderer::reorient(&north_up, width, height, mode);
        let rendered = render_rgba(&stored, width, height, mode);
        assert_eq!(rendered, reference, "mode {:#04x}", mode);
    }
}

#[test]
fn test_pixel_colors_match_scale() {
    let field = [0.0, 35.0];
    let pixels = render_rgba(&field, 2, 1, 0x00);

    let expected_zero = color_for_dbz(0.0);
    assert_eq!(expected_zero, Rgba::TRANSPARENT);
    assert_eq!(&pixels[0..4], &[0, 0, 0, 0]);
    assert_eq!(&pixels[4..8], &[255, 255, 0, 255]);
}
