//! Typed values shared by property fields and dataset records.

use crate::error::{PropertyError, PropertyResult};
use crate::ids::DatasetId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://\S+$").expect("url pattern is valid")
});

static COLOR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#([0-9A-Fa-f]{3}|[0-9A-Fa-f]{6}|[0-9A-Fa-f]{8})$").expect("color pattern is valid")
});

/// Declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Bool,
    Number,
    String,
    Ref,
    Url,
    LatLng,
    LatLngHeight,
    Color,
    Coordinates,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::Ref => "ref",
            Self::Url => "url",
            Self::LatLng => "latlng",
            Self::LatLngHeight => "latlngheight",
            Self::Color => "color",
            Self::Coordinates => "coordinates",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngHeight {
    pub lat: f64,
    pub lng: f64,
    pub height: f64,
}

/// A value tagged with its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Number(f64),
    String(String),
    Ref(DatasetId),
    Url(String),
    LatLng(LatLng),
    LatLngHeight(LatLngHeight),
    Color(String),
    Coordinates(Vec<LatLngHeight>),
}

impl Value {
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Number(_) => ValueType::Number,
            Self::String(_) => ValueType::String,
            Self::Ref(_) => ValueType::Ref,
            Self::Url(_) => ValueType::Url,
            Self::LatLng(_) => ValueType::LatLng,
            Self::LatLngHeight(_) => ValueType::LatLngHeight,
            Self::Color(_) => ValueType::Color,
            Self::Coordinates(_) => ValueType::Coordinates,
        }
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    pub fn lat_lng(lat: f64, lng: f64) -> Self {
        Self::LatLng(LatLng { lat, lng })
    }

    /// Checks the content of the value against the rules of its type.
    pub fn validate(&self) -> PropertyResult<()> {
        let invalid = |reason: &str| {
            Err(PropertyError::invalid_value_type(
                "value",
                self.value_type(),
                reason,
            ))
        };
        match self {
            Self::Number(n) if !n.is_finite() => invalid("non-finite number"),
            Self::Url(u) if !URL_PATTERN.is_match(u) => invalid("malformed url"),
            Self::Color(c) if !COLOR_PATTERN.is_match(c) => invalid("malformed color"),
            Self::LatLng(ll) if !in_range(ll.lat, ll.lng) => invalid("coordinates out of range"),
            Self::LatLngHeight(l) if !in_range(l.lat, l.lng) || !l.height.is_finite() => {
                invalid("coordinates out of range")
            }
            Self::Coordinates(points)
                if points.iter().any(|p| !in_range(p.lat, p.lng) || !p.height.is_finite()) =>
            {
                invalid("coordinates out of range")
            }
            _ => Ok(()),
        }
    }

    /// Checks that the value has the expected type and valid content.
    pub fn check(&self, field: &str, expected: ValueType) -> PropertyResult<()> {
        if self.value_type() != expected {
            return Err(PropertyError::invalid_value_type(
                field,
                expected,
                self.value_type(),
            ));
        }
        self.validate().map_err(|_| {
            PropertyError::invalid_value_type(field, expected, format!("invalid {}", expected))
        })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Url(s) | Self::Color(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_ref_id(&self) -> Option<&DatasetId> {
        match self {
            Self::Ref(id) => Some(id),
            _ => None,
        }
    }
}

fn in_range(lat: f64, lng: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
}

impl ValueType {
    /// Parses a raw text cell into a value of this type.
    pub fn parse(self, raw: &str) -> Option<Value> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let value = match self {
            Self::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => return None,
            },
            Self::Number => Value::Number(raw.parse::<f64>().ok()?),
            Self::String => Value::String(raw.to_string()),
            Self::Ref => Value::Ref(DatasetId::from(raw)),
            Self::Url => Value::Url(raw.to_string()),
            Self::Color => Value::Color(raw.to_string()),
            Self::LatLng => {
                let parts = split_numbers(raw)?;
                match parts.as_slice() {
                    [lat, lng] => Value::lat_lng(*lat, *lng),
                    _ => return None,
                }
            }
            Self::LatLngHeight => {
                let parts = split_numbers(raw)?;
                match parts.as_slice() {
                    [lat, lng, height] => Value::LatLngHeight(LatLngHeight {
                        lat: *lat,
                        lng: *lng,
                        height: *height,
                    }),
                    _ => return None,
                }
            }
            Self::Coordinates => return None,
        };
        value.validate().ok()?;
        Some(value)
    }

    /// Converts API-layer JSON into a value of this type.
    pub fn from_json(self, json: &JsonValue) -> Option<Value> {
        let value = match (self, json) {
            (Self::Bool, JsonValue::Bool(b)) => Value::Bool(*b),
            (Self::Number, JsonValue::Number(n)) => Value::Number(n.as_f64()?),
            (Self::String, JsonValue::String(s)) => Value::String(s.clone()),
            (Self::Ref, JsonValue::String(s)) => Value::Ref(DatasetId::from(s.as_str())),
            (Self::Url, JsonValue::String(s)) => Value::Url(s.clone()),
            (Self::Color, JsonValue::String(s)) => Value::Color(s.clone()),
            (Self::LatLng, JsonValue::Object(_)) => {
                Value::LatLng(serde_json::from_value(json.clone()).ok()?)
            }
            (Self::LatLngHeight, JsonValue::Object(_)) => {
                Value::LatLngHeight(serde_json::from_value(json.clone()).ok()?)
            }
            (Self::Coordinates, JsonValue::Array(_)) => {
                Value::Coordinates(serde_json::from_value(json.clone()).ok()?)
            }
            _ => return None,
        };
        value.validate().ok()?;
        Some(value)
    }

    /// Guesses the narrowest type a raw text cell fits into.
    pub fn guess(raw: &str) -> ValueType {
        [Self::Bool, Self::Number, Self::LatLng, Self::Url, Self::Color]
            .into_iter()
            .find(|t| t.parse(raw).is_some())
            .unwrap_or(Self::String)
    }
}

fn split_numbers(raw: &str) -> Option<Vec<f64>> {
    raw.split(',')
        .map(|p| p.trim().parse::<f64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_serialization_is_tagged() {
        let value = Value::lat_lng(35.0, 139.0);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(
            json,
            json!({"type": "lat_lng", "value": {"lat": 35.0, "lng": 139.0}})
        );
    }

    #[test]
    fn test_check_rejects_wrong_type() {
        let err = Value::Number(1.0)
            .check("title", ValueType::String)
            .unwrap_err();
        assert!(matches!(err, PropertyError::InvalidValueType { .. }));
        assert!(Value::string("a").check("title", ValueType::String).is_ok());
    }

    #[test]
    fn test_validate_content() {
        assert!(Value::Url("https://example.com/a.png".into()).validate().is_ok());
        assert!(Value::Url("example".into()).validate().is_err());
        assert!(Value::Color("#ff00aa".into()).validate().is_ok());
        assert!(Value::Color("red".into()).validate().is_err());
        assert!(Value::lat_lng(91.0, 0.0).validate().is_err());
        assert!(Value::Number(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_parse_and_guess() {
        assert_eq!(ValueType::Number.parse(" 12.5 "), Some(Value::Number(12.5)));
        assert_eq!(ValueType::Bool.parse("TRUE"), Some(Value::Bool(true)));
        assert_eq!(ValueType::LatLng.parse("35.6, 139.7"), Some(Value::lat_lng(35.6, 139.7)));
        assert_eq!(ValueType::Number.parse(""), None);

        assert_eq!(ValueType::guess("true"), ValueType::Bool);
        assert_eq!(ValueType::guess("42"), ValueType::Number);
        assert_eq!(ValueType::guess("35.6,139.7"), ValueType::LatLng);
        assert_eq!(ValueType::guess("https://a.b"), ValueType::Url);
        assert_eq!(ValueType::guess("#fff"), ValueType::Color);
        assert_eq!(ValueType::guess("Tokyo"), ValueType::String);
    }

    #[test]
    fn test_from_json() {
        assert_eq!(
            ValueType::LatLng.from_json(&json!({"lat": 1.0, "lng": 2.0})),
            Some(Value::lat_lng(1.0, 2.0))
        );
        assert_eq!(ValueType::Number.from_json(&json!("1")), None);
    }
}
