// Encoded polyline geometry
//
// Standard polyline algorithm at 5 decimal digits: each coordinate is the
// zig-zag encoded delta from the previous one, split into 5-bit chunks.

use super::coordinate::FixedCoordinate;

fn to_polyline_unit(micro_degrees: i32) -> i64 {
    (micro_degrees as f64 / 10.0).round() as i64
}

fn encode_value(value: i64, out: &mut String) {
    let mut v = if value < 0 { !(value << 1) } else { value << 1 };
    while v >= 0x20 {
        out.push(char::from((((v & 0x1f) | 0x20) + 63) as u8));
        v >>= 5;
    }
    out.push(char::from((v + 63) as u8));
}

/// Encode a sequence of coordinates as a polyline string.
pub fn encode_polyline(points: &[FixedCoordinate]) -> String {
    let mut out = String::with_capacity(points.len() * 8);
    let mut prev_lat = 0i64;
    let mut prev_lon = 0i64;

    for point in points {
        let lat = to_polyline_unit(point.lat);
        let lon = to_polyline_unit(point.lon);
        encode_value(lat - prev_lat, &mut out);
        encode_value(lon - prev_lon, &mut out);
        prev_lat = lat;
        prev_lon = lon;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLYLINE_FACTOR: f64 = 1e5;

    fn decode_polyline(encoded: &str) -> Option<Vec<(f64, f64)>> {
        let bytes = encoded.as_bytes();
        let mut idx = 0;
        let mut lat = 0i64;
        let mut lon = 0i64;
        let mut points = Vec::new();

        let next_value = |idx: &mut usize| -> Option<i64> {
            let mut shift = 0;
            let mut result = 0i64;
            loop {
                let byte = *bytes.get(*idx)? as i64 - 63;
                if !(0..64).contains(&byte) || shift > 60 {
                    return None;
                }
                *idx += 1;
                result |= (byte & 0x1f) << shift;
                shift += 5;
                if byte < 0x20 {
                    break;
                }
            }
            Some(if result & 1 != 0 { !(result >> 1) } else { result >> 1 })
        };

        while idx < bytes.len() {
            lat += next_value(&mut idx)?;
            lon += next_value(&mut idx)?;
            points.push((lat as f64 / POLYLINE_FACTOR, lon as f64 / POLYLINE_FACTOR));
        }

        Some(points)
    }

    #[test]
    fn test_reference_encoding() {
        // Reference example from the polyline algorithm documentation
        let points = vec![
            FixedCoordinate::from_degrees(38.5, -120.2),
            FixedCoordinate::from_degrees(40.7, -120.95),
            FixedCoordinate::from_degrees(43.252, -126.453),
        ];
        assert_eq!(encode_polyline(&points), "_p~iF~ps|U_ulLnnqC_mqNvxq`@");
    }

    #[test]
    fn test_decode_reference() {
        let decoded = decode_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
        assert_eq!(decoded.len(), 3);
        assert!((decoded[2].0 - 43.252).abs() < 1e-9);
        assert!((decoded[2].1 + 126.453).abs() < 1e-9);
    }

    #[test]
    fn test_empty_geometry() {
        assert_eq!(encode_polyline(&[]), "");
        assert_eq!(decode_polyline(""), Some(vec![]));
    }

    #[test]
    fn test_truncated_input_rejected() {
        // Continuation chunk with nothing after it
        assert_eq!(decode_polyline("_"), None);
    }
}
