// Query request — the loosely typed input a host hands over
//
// Hosts pass a JSON object shaped like
//   { coordinates: [[lat, lon], ...], zoomLevel?, alternateRoute?,
//     printInstructions?, hints?, checksum? }
// Parsing here only checks field types; range and pairing rules live in
// `Query::build`.

use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// Typed routing request, prior to validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRequest {
    pub coordinates: Vec<[f64; 2]>,
    pub zoom_level: Option<u8>,
    pub alternate_route: Option<bool>,
    pub print_instructions: Option<bool>,
    pub hints: Option<Vec<String>>,
    pub checksum: Option<u32>,
}

impl QueryRequest {
    pub fn new(coordinates: Vec<[f64; 2]>) -> Self {
        Self {
            coordinates,
            ..Self::default()
        }
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::invalid("query must be an object"))?;

        Ok(Self {
            coordinates: coordinates(object)?,
            zoom_level: optional(object, "zoomLevel", zoom_level)?,
            alternate_route: optional(object, "alternateRoute", boolean)?,
            print_instructions: optional(object, "printInstructions", boolean)?,
            hints: optional(object, "hints", hints)?,
            checksum: optional(object, "checksum", checksum)?,
        })
    }
}

/// Absent and `null` fields both read as "not given".
fn optional<T>(
    object: &Map<String, Value>,
    field: &'static str,
    parse: fn(&'static str, &Value) -> Result<T>,
) -> Result<Option<T>> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => parse(field, value).map(Some),
    }
}

fn coordinates(object: &Map<String, Value>) -> Result<Vec<[f64; 2]>> {
    let list = object
        .get("coordinates")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::invalid("coordinates must be an array of [lat, lon] pairs"))?;

    list.iter()
        .enumerate()
        .map(|(i, pair)| {
            let pair = pair.as_array().filter(|p| p.len() == 2);
            match pair.map(|p| (p[0].as_f64(), p[1].as_f64())) {
                Some((Some(lat), Some(lon))) => Ok([lat, lon]),
                _ => Err(Error::invalid(format!(
                    "coordinates[{i}] must be a [lat, lon] pair of numbers"
                ))),
            }
        })
        .collect()
}

fn zoom_level(field: &'static str, value: &Value) -> Result<u8> {
    value
        .as_u64()
        .and_then(|z| u8::try_from(z).ok())
        .ok_or_else(|| Error::invalid(format!("{field} must be an integer between 0 and 18")))
}

fn boolean(field: &'static str, value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| Error::invalid(format!("{field} must be a boolean")))
}

fn hints(field: &'static str, value: &Value) -> Result<Vec<String>> {
    let invalid = || Error::invalid(format!("{field} must be an array of strings"));
    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|h| h.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

fn checksum(field: &'static str, value: &Value) -> Result<u32> {
    value
        .as_u64()
        .and_then(|c| u32::try_from(c).ok())
        .ok_or_else(|| Error::invalid(format!("{field} must be an unsigned 32-bit integer")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_request_parses() {
        let request = QueryRequest::from_json(&json!({
            "coordinates": [[52.519930, 13.438640], [52.513191, 13.415852]],
            "zoomLevel": 17,
            "alternateRoute": false,
            "printInstructions": false,
            "hints": ["a", ""],
            "checksum": 4294967295u64
        }))
        .unwrap();
        assert_eq!(request.coordinates.len(), 2);
        assert_eq!(request.zoom_level, Some(17));
        assert_eq!(request.alternate_route, Some(false));
        assert_eq!(request.print_instructions, Some(false));
        assert_eq!(request.hints, Some(vec!["a".to_string(), String::new()]));
        assert_eq!(request.checksum, Some(u32::MAX));
    }

    #[test]
    fn test_null_fields_are_absent() {
        let request = QueryRequest::from_json(&json!({
            "coordinates": [],
            "zoomLevel": null,
            "hints": null
        }))
        .unwrap();
        assert_eq!(request, QueryRequest::default());
    }

    #[test]
    fn test_wrong_types_name_the_field() {
        let cases = [
            (json!({"coordinates": "berlin"}), "coordinates"),
            (json!({"coordinates": [[52.5]]}), "coordinates[0]"),
            (json!({"coordinates": [["52.5", 13.4]]}), "coordinates[0]"),
            (json!({"coordinates": [], "zoomLevel": 1.5}), "zoomLevel"),
            (json!({"coordinates": [], "zoomLevel": -1}), "zoomLevel"),
            (json!({"coordinates": [], "alternateRoute": "yes"}), "alternateRoute"),
            (json!({"coordinates": [], "printInstructions": 1}), "printInstructions"),
            (json!({"coordinates": [], "hints": [1, 2]}), "hints"),
            (json!({"coordinates": [], "checksum": -3}), "checksum"),
            (json!({"coordinates": [], "checksum": 4294967296u64}), "checksum"),
        ];
        for (input, field) in cases {
            let err = QueryRequest::from_json(&input).unwrap_err();
            assert!(
                err.to_string().starts_with(field),
                "{input} gave {err}, expected mention of {field}"
            );
        }
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(QueryRequest::from_json(&json!([1, 2])).is_err());
    }
}
