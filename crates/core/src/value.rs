//! Typed field values
//!
//! Documents carry one [`FieldValue`] per field. The variant is tied to the
//! field's declared [`FieldType`] and is checked at the indexing boundary,
//! so readers never inspect untyped payloads.
//!
//! ## Type Rules
//!
//! - Values compare only within a type family: numeric (Int, Float),
//!   textual (Text, String), Bool, Time. Geo values are not ordered.
//! - `Int` and `Float` compare numerically with each other.
//! - Coercion to a declared type is lossless only: Int→Float, Text↔String,
//!   RFC 3339 strings→Time.

use crate::schema::FieldType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Geographic coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
}

/// A single typed field value
///
/// Serialized as `{"type": "...", "value": ...}`; this JSON is also the
/// per-field encoding inside stored document records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Full-text value, tokenized when the field is searchable
    Text(String),
    /// Exact string (tags, facets, identifiers)
    String(String),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point
    Float(f64),
    /// Boolean
    Bool(bool),
    /// UTC timestamp
    Time(DateTime<Utc>),
    /// Geographic point
    Geo(GeoPoint),
}

impl FieldValue {
    /// Create a full-text value
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    /// Create an exact string value
    pub fn string(s: impl Into<String>) -> Self {
        FieldValue::String(s.into())
    }

    /// Create a geo point value
    pub fn geo(lat: f64, lon: f64) -> Self {
        FieldValue::Geo(GeoPoint { lat, lon })
    }

    /// The field type this value naturally belongs to
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Text(_) => FieldType::Text,
            FieldValue::String(_) => FieldType::String,
            FieldValue::Int(_) => FieldType::Int,
            FieldValue::Float(_) => FieldType::Float,
            FieldValue::Bool(_) => FieldType::Bool,
            FieldValue::Time(_) => FieldType::Time,
            FieldValue::Geo(_) => FieldType::Geo,
        }
    }

    /// Borrow the string payload of Text or String values
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric payload of Int or Float values
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Whether every floating-point component is finite
    ///
    /// NaN and infinities have no JSON encoding, so they cannot be stored.
    pub fn is_finite(&self) -> bool {
        match self {
            FieldValue::Float(f) => f.is_finite(),
            FieldValue::Geo(p) => p.lat.is_finite() && p.lon.is_finite(),
            _ => true,
        }
    }

    /// Convert to the declared type, if the conversion is lossless
    ///
    /// Returns `None` when the value cannot represent the target type.
    pub fn coerce(&self, target: FieldType) -> Option<FieldValue> {
        if self.field_type() == target {
            return Some(self.clone());
        }
        match (self, target) {
            (FieldValue::Int(i), FieldType::Float) => Some(FieldValue::Float(*i as f64)),
            (FieldValue::String(s), FieldType::Text) => Some(FieldValue::Text(s.clone())),
            (FieldValue::Text(s), FieldType::String) => Some(FieldValue::String(s.clone())),
            (FieldValue::Text(s) | FieldValue::String(s), FieldType::Time) => {
                DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|t| FieldValue::Time(t.with_timezone(&Utc)))
            }
            _ => None,
        }
    }

    /// Compare two values of the same type family
    ///
    /// Returns `None` for values that have no common ordering (different
    /// families, Geo, or NaN floats).
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Int(a), FieldValue::Int(b)) => Some(a.cmp(b)),
            (FieldValue::Int(_) | FieldValue::Float(_), FieldValue::Int(_) | FieldValue::Float(_)) => {
                self.as_f64()?.partial_cmp(&other.as_f64()?)
            }
            (
                FieldValue::Text(a) | FieldValue::String(a),
                FieldValue::Text(b) | FieldValue::String(b),
            ) => Some(a.cmp(b)),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => Some(a.cmp(b)),
            (FieldValue::Time(a), FieldValue::Time(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) | FieldValue::String(s) => f.write_str(s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Time(t) => f.write_str(&t.to_rfc3339()),
            FieldValue::Geo(p) => write!(f, "{},{}", p.lat, p.lon),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(t: DateTime<Utc>) -> Self {
        FieldValue::Time(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn test_field_type_matches_variant() {
        assert_eq!(FieldValue::text("a").field_type(), FieldType::Text);
        assert_eq!(FieldValue::string("a").field_type(), FieldType::String);
        assert_eq!(FieldValue::Int(1).field_type(), FieldType::Int);
        assert_eq!(FieldValue::Float(1.0).field_type(), FieldType::Float);
        assert_eq!(FieldValue::Bool(true).field_type(), FieldType::Bool);
        assert_eq!(FieldValue::geo(1.0, 2.0).field_type(), FieldType::Geo);
    }

    #[test]
    fn test_is_finite() {
        assert!(FieldValue::Float(1.5).is_finite());
        assert!(FieldValue::Int(i64::MAX).is_finite());
        assert!(!FieldValue::Float(f64::NAN).is_finite());
        assert!(!FieldValue::Float(f64::NEG_INFINITY).is_finite());
        assert!(!FieldValue::geo(f64::INFINITY, 0.0).is_finite());
        assert!(FieldValue::geo(51.5, -0.12).is_finite());
    }

    #[test]
    fn test_coerce_lossless_only() {
        assert_eq!(
            FieldValue::Int(3).coerce(FieldType::Float),
            Some(FieldValue::Float(3.0))
        );
        assert_eq!(
            FieldValue::string("x").coerce(FieldType::Text),
            Some(FieldValue::text("x"))
        );
        assert_eq!(FieldValue::Float(3.5).coerce(FieldType::Int), None);
        assert_eq!(FieldValue::Bool(true).coerce(FieldType::String), None);
    }

    #[test]
    fn test_coerce_rfc3339_to_time() {
        let v = FieldValue::string("2024-05-01T10:00:00Z")
            .coerce(FieldType::Time)
            .unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(v, FieldValue::Time(expected));

        assert!(FieldValue::string("yesterday").coerce(FieldType::Time).is_none());
    }

    #[test]
    fn test_compare_numeric_mixed() {
        assert_eq!(
            FieldValue::Int(2).compare(&FieldValue::Float(2.5)),
            Some(Ordering::Less)
        );
        assert_eq!(
            FieldValue::Float(3.0).compare(&FieldValue::Int(3)),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn test_compare_across_families_is_none() {
        assert_eq!(FieldValue::Int(1).compare(&FieldValue::string("1")), None);
        assert_eq!(FieldValue::geo(0.0, 0.0).compare(&FieldValue::geo(0.0, 0.0)), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldValue::string("active").to_string(), "active");
        assert_eq!(FieldValue::Int(-4).to_string(), "-4");
        assert_eq!(FieldValue::Bool(false).to_string(), "false");
    }

    #[test]
    fn test_serde_tagged_encoding() {
        let json = serde_json::to_string(&FieldValue::Int(7)).unwrap();
        assert_eq!(json, r#"{"type":"int","value":7}"#);
        let back: FieldValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FieldValue::Int(7));
    }

    proptest! {
        #[test]
        fn prop_numeric_compare_is_antisymmetric(a in -1_000_000i64..1_000_000, b in -1.0e6f64..1.0e6) {
            let x = FieldValue::Int(a);
            let y = FieldValue::Float(b);
            let forward = x.compare(&y).unwrap();
            let backward = y.compare(&x).unwrap();
            prop_assert_eq!(forward, backward.reverse());
        }

        #[test]
        fn prop_text_compare_matches_str(a in "[a-z]{0,8}", b in "[a-z]{0,8}") {
            let ord = FieldValue::text(a.clone()).compare(&FieldValue::string(b.clone()));
            prop_assert_eq!(ord, Some(a.cmp(&b)));
        }
    }
}
