//! Product metadata emitted alongside the rendered PNG.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::bounds::GeoBounds;

/// Metadata for one rendered radar product.
///
/// `width` and `height` always match the dimensions of the emitted PNG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarMetadata {
    /// Product reference time; serialized as ISO-8601 UTC with
    /// millisecond precision, e.g. `2024-01-15T18:42:00.000Z`.
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub bounds: GeoBounds,
    pub width: u32,
    pub height: u32,
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_json_shape() {
        let metadata = RadarMetadata {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 18, 42, 0).unwrap(),
            bounds: GeoBounds::CONUS,
            width: 7000,
            height: 3500,
        };

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["timestamp"], "2024-01-15T18:42:00.000Z");
        assert_eq!(json["bounds"]["north"], 55.0);
        assert_eq!(json["bounds"]["south"], 20.0);
        assert_eq!(json["bounds"]["east"], -60.0);
        assert_eq!(json["bounds"]["west"], -130.0);
        assert_eq!(json["width"], 7000);
        assert_eq!(json["height"], 3500);
    }

    #[test]
    fn test_roundtrip() {
        let metadata = RadarMetadata {
            timestamp: Utc.with_ymd_and_hms(2025, 6, 30, 0, 5, 30).unwrap(),
            bounds: GeoBounds::from_corners(40.0, 260.0, 40.0, 260.0),
            width: 1,
            height: 1,
        };

        let json = serde_json::to_string(&metadata).unwrap();
        let back: RadarMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metadata);
    }
}
