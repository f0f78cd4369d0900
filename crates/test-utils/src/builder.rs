//! Synthetic GRIB2 message construction.
//!
//! Builds byte-exact single-message GRIB2 products: every section is
//! emitted with a correct length prefix, the indicator carries the true
//! total length, and the message ends with "7777". Section toggles
//! allow inserting optional sections (2, 4, 6) or omitting required
//! ones to exercise error paths.

use std::io::Write;

/// Builder for one synthetic GRIB2 message.
///
/// Defaults describe a 1x1 MRMS-like reflectivity grid at
/// (40.0N, 100.0W) with simple 8-bit packing and a single 30 dBZ cell.
#[derive(Debug, Clone)]
pub struct Grib2MessageBuilder {
    discipline: u8,
    edition: u8,
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    grid_template: u16,
    declared_grid_template: Option<u16>,
    ni: u32,
    nj: u32,
    lat1: f64,
    lon1: f64,
    lat2: f64,
    lon2: f64,
    di_microdeg: u32,
    dj_microdeg: u32,
    scanning_mode: u8,
    packing_template: u16,
    reference_value: f32,
    binary_scale_factor: i16,
    decimal_scale_factor: i16,
    bits_per_value: u8,
    payload: Vec<u8>,
    declared_num_points: Option<u32>,
    local_use: Option<Vec<u8>>,
    include_product_definition: bool,
    include_bitmap: bool,
    omit_grid: bool,
    omit_representation: bool,
    omit_data: bool,
}

impl Default for Grib2MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Grib2MessageBuilder {
    pub fn new() -> Self {
        Self {
            discipline: 209, // MRMS local discipline
            edition: 2,
            year: 2024,
            month: 1,
            day: 15,
            hour: 18,
            minute: 42,
            second: 0,
            grid_template: 0,
            declared_grid_template: None,
            ni: 1,
            nj: 1,
            lat1: 40.0,
            lon1: 260.0, // -100 after wrapping
            lat2: 40.0,
            lon2: 260.0,
            di_microdeg: 10_000,
            dj_microdeg: 10_000,
            scanning_mode: 0,
            packing_template: 0,
            reference_value: 0.0,
            binary_scale_factor: 0,
            decimal_scale_factor: 0,
            bits_per_value: 8,
            payload: vec![0x1E], // 30 dBZ
            declared_num_points: None,
            local_use: None,
            include_product_definition: false,
            include_bitmap: false,
            omit_grid: false,
            omit_representation: false,
            omit_data: false,
        }
    }

    pub fn with_edition(mut self, edition: u8) -> Self {
        self.edition = edition;
        self
    }

    pub fn with_reference_time(
        mut self,
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Self {
        self.year = year;
        self.month = month;
        self.day = day;
        self.hour = hour;
        self.minute = minute;
        self.second = second;
        self
    }

    pub fn with_grid(mut self, ni: u32, nj: u32) -> Self {
        self.ni = ni;
        self.nj = nj;
        self
    }

    /// Corner coordinates in degrees; longitudes may use the 0-360
    /// convention.
    pub fn with_corners(mut self, lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Self {
        self.lat1 = lat1;
        self.lon1 = lon1;
        self.lat2 = lat2;
        self.lon2 = lon2;
        self
    }

    pub fn with_scanning_mode(mut self, mode: u8) -> Self {
        self.scanning_mode = mode;
        self
    }

    /// Switch Section 3 to the Lambert Conformal template (30).
    pub fn with_lambert_grid(mut self) -> Self {
        self.grid_template = 30;
        self
    }

    /// Override the template number written in the Section 3 header
    /// while keeping the template-0 body (for unsupported-template
    /// tests).
    pub fn with_declared_grid_template(mut self, template: u16) -> Self {
        self.declared_grid_template = Some(template);
        self
    }

    pub fn with_packing_template(mut self, template: u16) -> Self {
        self.packing_template = template;
        self
    }

    pub fn with_scaling(
        mut self,
        reference_value: f32,
        binary_scale_factor: i16,
        decimal_scale_factor: i16,
        bits_per_value: u8,
    ) -> Self {
        self.reference_value = reference_value;
        self.binary_scale_factor = binary_scale_factor;
        self.decimal_scale_factor = decimal_scale_factor;
        self.bits_per_value = bits_per_value;
        self
    }

    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    /// Override the point count declared in Sections 3 and 5 (for
    /// mismatch tests).
    pub fn with_declared_num_points(mut self, num_points: u32) -> Self {
        self.declared_num_points = Some(num_points);
        self
    }

    /// Insert a Section 2 (local use) with the given payload.
    pub fn with_local_use(mut self, payload: Vec<u8>) -> Self {
        self.local_use = Some(payload);
        self
    }

    /// Insert a Section 4 (product definition) between 3 and 5.
    pub fn with_product_definition(mut self) -> Self {
        self.include_product_definition = true;
        self
    }

    /// Insert a Section 6 (bitmap, indicator 255) between 5 and 7.
    pub fn with_bitmap(mut self) -> Self {
        self.include_bitmap = true;
        self
    }

    pub fn without_grid_section(mut self) -> Self {
        self.omit_grid = true;
        self
    }

    pub fn without_representation_section(mut self) -> Self {
        self.omit_representation = true;
        self
    }

    pub fn without_data_section(mut self) -> Self {
        self.omit_data = true;
        self
    }

    fn num_points(&self) -> u32 {
        self.declared_num_points.unwrap_or(self.ni * self.nj)
    }

    /// Build the complete message bytes.
    pub fn build(&self) -> Vec<u8> {
        let mut sections: Vec<Vec<u8>> = Vec::new();
        sections.push(self.build_section1());
        if let Some(local) = &self.local_use {
            sections.push(build_section2(local));
        }
        if !self.omit_grid {
            sections.push(self.build_section3());
        }
        if self.include_product_definition {
            sections.push(self.build_section4());
        }
        if !self.omit_representation {
            sections.push(self.build_section5());
        }
        if self.include_bitmap {
            sections.push(build_section6());
        }
        if !self.omit_data {
            sections.push(self.build_section7());
        }

        let total = 16 + sections.iter().map(Vec::len).sum::<usize>() + 4;

        let mut message = Vec::with_capacity(total);
        message.extend_from_slice(b"GRIB");
        message.extend_from_slice(&[0, 0]); // reserved
        message.push(self.discipline);
        message.push(self.edition);
        message.extend_from_slice(&(total as u64).to_be_bytes());
        for section in &sections {
            message.extend_from_slice(section);
        }
        message.extend_from_slice(b"7777");
        message
    }

    /// Build and gzip-compress the message (single member).
    pub fn build_gzipped(&self) -> Vec<u8> {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&self.build()).unwrap();
        encoder.finish().unwrap()
    }

    fn build_section1(&self) -> Vec<u8> {
        let mut section = Vec::new();
        section.extend_from_slice(&21u32.to_be_bytes());
        section.push(1); // section number

        section.extend_from_slice(&161u16.to_be_bytes()); // NSSL
        section.extend_from_slice(&0u16.to_be_bytes()); // sub-center
        section.push(2); // master table version
        section.push(1); // local table version
        section.push(0); // significance: analysis

        section.extend_from_slice(&self.year.to_be_bytes());
        section.push(self.month);
        section.push(self.day);
        section.push(self.hour);
        section.push(self.minute);
        section.push(self.second);

        section.push(0); // production status
        section.push(0); // type of data: analysis

        section
    }

    fn build_section3(&self) -> Vec<u8> {
        let body = match self.grid_template {
            30 => self.build_lambert_body(),
            _ => self.build_lat_lon_body(),
        };

        let mut section = Vec::new();
        section.extend_from_slice(&((14 + body.len()) as u32).to_be_bytes());
        section.push(3); // section number
        section.push(0); // source of grid definition
        section.extend_from_slice(&self.num_points().to_be_bytes());
        section.push(0); // octets for optional list
        section.push(0); // interpretation of optional list
        let template = self.declared_grid_template.unwrap_or(self.grid_template);
        section.extend_from_slice(&template.to_be_bytes());
        section.extend_from_slice(&body);
        section
    }

    /// Template 3.0 body (58 bytes).
    fn build_lat_lon_body(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(58);
        body.push(6); // shape of Earth: spherical, radius 6371229 m
        body.push(0);
        body.extend_from_slice(&0u32.to_be_bytes()); // scaled radius
        body.push(0);
        body.extend_from_slice(&0u32.to_be_bytes()); // major axis
        body.push(0);
        body.extend_from_slice(&0u32.to_be_bytes()); // minor axis

        body.extend_from_slice(&self.ni.to_be_bytes());
        body.extend_from_slice(&self.nj.to_be_bytes());
        body.extend_from_slice(&0u32.to_be_bytes()); // basic angle
        body.extend_from_slice(&0xFFFF_FFFFu32.to_be_bytes()); // subdivisions (missing)

        body.extend_from_slice(&encode_signed_microdeg(self.lat1));
        body.extend_from_slice(&encode_signed_microdeg(self.lon1));
        body.push(48); // resolution and component flags
        body.extend_from_slice(&encode_signed_microdeg(self.lat2));
        body.extend_from_slice(&encode_signed_microdeg(self.lon2));
        body.extend_from_slice(&self.di_microdeg.to_be_bytes());
        body.extend_from_slice(&self.dj_microdeg.to_be_bytes());
        body.push(self.scanning_mode);
        body
    }

    /// Template 3.30 body (67 bytes); projection parameters are zeroed.
    fn build_lambert_body(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(67);
        body.push(6); // shape of Earth
        body.push(0);
        body.extend_from_slice(&0u32.to_be_bytes());
        body.push(0);
        body.extend_from_slice(&0u32.to_be_bytes());
        body.push(0);
        body.extend_from_slice(&0u32.to_be_bytes());

        body.extend_from_slice(&self.ni.to_be_bytes()); // Nx
        body.extend_from_slice(&self.nj.to_be_bytes()); // Ny
        body.extend_from_slice(&encode_signed_microdeg(self.lat1)); // La1
        body.extend_from_slice(&encode_signed_microdeg(self.lon1)); // Lo1
        body.push(48); // resolution and component flags
        body.extend_from_slice(&encode_signed_microdeg(25.0)); // LaD
        body.extend_from_slice(&encode_signed_microdeg(265.0)); // LoV
        body.extend_from_slice(&0u32.to_be_bytes()); // Dx
        body.extend_from_slice(&0u32.to_be_bytes()); // Dy
        body.push(0); // projection centre flag
        body.push(self.scanning_mode);
        body.extend_from_slice(&encode_signed_microdeg(25.0)); // Latin1
        body.extend_from_slice(&encode_signed_microdeg(25.0)); // Latin2
        body.extend_from_slice(&encode_signed_microdeg(-90.0)); // south pole lat
        body.extend_from_slice(&encode_signed_microdeg(0.0)); // south pole lon
        body
    }

    /// Template 4.0 body (34-byte section).
    fn build_section4(&self) -> Vec<u8> {
        let mut section = Vec::new();
        section.extend_from_slice(&34u32.to_be_bytes());
        section.push(4); // section number

        section.extend_from_slice(&0u16.to_be_bytes()); // coordinate values
        section.extend_from_slice(&0u16.to_be_bytes()); // template 4.0
        section.push(16); // parameter category: radar reflectivity
        section.push(196); // parameter number
        section.push(0); // generating process: analysis
        section.push(0);
        section.push(0);
        section.extend_from_slice(&0u16.to_be_bytes()); // hours of cutoff
        section.push(0); // minutes of cutoff
        section.push(1); // time range unit: hours
        section.extend_from_slice(&0u32.to_be_bytes()); // forecast time
        section.push(102); // first fixed surface: m above MSL
        section.push(0);
        section.extend_from_slice(&500u32.to_be_bytes());
        section.push(255); // no second fixed surface
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());
        section
    }

    fn build_section5(&self) -> Vec<u8> {
        let mut section = Vec::new();
        section.extend_from_slice(&21u32.to_be_bytes());
        section.push(5); // section number

        section.extend_from_slice(&self.num_points().to_be_bytes());
        section.extend_from_slice(&self.packing_template.to_be_bytes());

        section.extend_from_slice(&self.reference_value.to_be_bytes());
        section.extend_from_slice(&encode_signed16(self.binary_scale_factor));
        section.extend_from_slice(&encode_signed16(self.decimal_scale_factor));
        section.push(self.bits_per_value);
        section.push(0); // original field type: floating point
        section
    }

    fn build_section7(&self) -> Vec<u8> {
        let mut section = Vec::new();
        section.extend_from_slice(&((5 + self.payload.len()) as u32).to_be_bytes());
        section.push(7); // section number
        section.extend_from_slice(&self.payload);
        section
    }
}

fn build_section2(payload: &[u8]) -> Vec<u8> {
    let mut section = Vec::new();
    section.extend_from_slice(&((5 + payload.len()) as u32).to_be_bytes());
    section.push(2); // section number
    section.extend_from_slice(payload);
    section
}

fn build_section6() -> Vec<u8> {
    let mut section = Vec::new();
    section.extend_from_slice(&6u32.to_be_bytes());
    section.push(6); // section number
    section.push(255); // bitmap indicator: none, all points present
    section
}

/// Encode degrees as GRIB2 sign-magnitude microdegrees.
fn encode_signed_microdeg(degrees: f64) -> [u8; 4] {
    let micro = (degrees * 1_000_000.0).round() as i64;
    if micro < 0 {
        ((micro.unsigned_abs() as u32) | 0x8000_0000).to_be_bytes()
    } else {
        (micro as u32).to_be_bytes()
    }
}

/// Encode a GRIB2 sign-magnitude 16-bit scale factor.
fn encode_signed16(value: i16) -> [u8; 2] {
    if value < 0 {
        (value.unsigned_abs() | 0x8000).to_be_bytes()
    } else {
        (value as u16).to_be_bytes()
    }
}

/// Encode an 8-bit grayscale PNG (color type 0) for embedded-PNG
/// payloads.
pub fn grayscale_png(pixels: &[u8], width: u32, height: u32) -> Vec<u8> {
    let mut raw = Vec::with_capacity(height as usize * (1 + width as usize));
    for row in pixels.chunks(width as usize) {
        raw.push(0); // filter type: none
        raw.extend_from_slice(row);
    }
    encode_png(width, height, 8, &raw)
}

/// Encode a 16-bit grayscale PNG; samples are written big-endian per
/// the PNG specification.
pub fn grayscale16_png(pixels: &[u16], width: u32, height: u32) -> Vec<u8> {
    let mut raw = Vec::with_capacity(height as usize * (1 + 2 * width as usize));
    for row in pixels.chunks(width as usize) {
        raw.push(0); // filter type: none
        for &sample in row {
            raw.extend_from_slice(&sample.to_be_bytes());
        }
    }
    encode_png(width, height, 16, &raw)
}

fn encode_png(width: u32, height: u32, bit_depth: u8, filtered_rows: &[u8]) -> Vec<u8> {
    let mut png = Vec::new();
    png.extend_from_slice(&[137, 80, 78, 71, 13, 10, 26, 10]);

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    ihdr.push(bit_depth);
    ihdr.push(0); // color type 0 = grayscale
    ihdr.push(0); // compression method
    ihdr.push(0); // filter method
    ihdr.push(0); // interlace method
    write_chunk(&mut png, b"IHDR", &ihdr);

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(filtered_rows).unwrap();
    let idat = encoder.finish().unwrap();
    write_chunk(&mut png, b"IDAT", &idat);

    write_chunk(&mut png, b"IEND", &[]);
    png
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_message_structure() {
        let message = Grib2MessageBuilder::new().build();

        assert_eq!(&message[0..4], b"GRIB");
        assert_eq!(message[6], 209);
        assert_eq!(message[7], 2);
        assert_eq!(&message[message.len() - 4..], b"7777");

        // Declared total length matches the buffer.
        let declared = u64::from_be_bytes(message[8..16].try_into().unwrap());
        assert_eq!(declared as usize, message.len());
    }

    #[test]
    fn test_gzip_roundtrip() {
        use std::io::Read;

        let builder = Grib2MessageBuilder::new();
        let plain = builder.build();
        let gzipped = builder.build_gzipped();

        let mut decoder = flate2::read::GzDecoder::new(&gzipped[..]);
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed).unwrap();
        assert_eq!(decompressed, plain);
    }

    #[test]
    fn test_grayscale_png_structure() {
        let png = grayscale_png(&[100, 200], 2, 1);
        assert_eq!(&png[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
        // IHDR width/height
        assert_eq!(&png[16..20], &2u32.to_be_bytes());
        assert_eq!(&png[20..24], &1u32.to_be_bytes());
        assert_eq!(png[24], 8); // bit depth
        assert_eq!(png[25], 0); // color type: grayscale
    }
}
