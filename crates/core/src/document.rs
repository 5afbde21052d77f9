//! Documents and their stored record encoding
//!
//! A [`Document`] maps field names to typed values. Before it is written it
//! is conformed to its collection's schema: unknown fields, missing required
//! fields and type mismatches are rejected with `InvalidDocument`, and
//! lossless coercions (Int→Float, Text↔String, RFC 3339→Time) are applied.
//!
//! Stored records are flat hash records: one entry per field, the value
//! being the tagged JSON encoding of [`FieldValue`].

use crate::error::{Error, Result};
use crate::schema::{Collection, FieldType};
use crate::value::{FieldValue, GeoPoint};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};

/// A document: field name → typed value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    fields: BTreeMap<String, FieldValue>,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Document {
            fields: BTreeMap::new(),
        }
    }

    /// Builder: set a field
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set a field, returning the previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.fields.insert(name.into(), value.into())
    }

    /// Get a field value
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Iterate fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the document has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build a document from a JSON object, guided by the schema
    ///
    /// JSON `null` is treated as an absent field. Time fields accept RFC 3339
    /// strings or integer Unix seconds; Geo fields accept `{"lat", "lon"}`
    /// objects or `[lat, lon]` arrays.
    pub fn from_json(value: &JsonValue, collection: &Collection) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::InvalidDocument("document must be a JSON object".into()))?;

        let mut doc = Document::new();
        for (name, raw) in obj {
            if raw.is_null() {
                continue;
            }
            let field = collection.get_field(name).ok_or_else(|| {
                Error::InvalidDocument(format!(
                    "unknown field {:?} for collection {}",
                    name, collection.name
                ))
            })?;
            let value = json_to_value(raw, field.field_type).ok_or_else(|| {
                Error::InvalidDocument(format!(
                    "field {:?} expects {:?}, got {}",
                    name, field.field_type, raw
                ))
            })?;
            doc.fields.insert(name.clone(), value);
        }
        Ok(doc)
    }

    /// Check the document against the schema and normalize value types
    ///
    /// # Errors
    ///
    /// Returns `InvalidDocument` for unknown fields, missing non-optional
    /// fields, values that cannot represent the declared type, or NaN and
    /// infinite numbers.
    pub fn conform(&self, collection: &Collection) -> Result<Document> {
        for name in self.fields.keys() {
            if collection.get_field(name).is_none() {
                return Err(Error::InvalidDocument(format!(
                    "unknown field {:?} for collection {}",
                    name, collection.name
                )));
            }
        }

        let mut out = Document::new();
        for field in &collection.fields {
            match self.fields.get(&field.name) {
                Some(value) => {
                    let coerced = value.coerce(field.field_type).ok_or_else(|| {
                        Error::InvalidDocument(format!(
                            "field {:?} expects {:?}, got {:?}",
                            field.name,
                            field.field_type,
                            value.field_type()
                        ))
                    })?;
                    if !coerced.is_finite() {
                        return Err(Error::InvalidDocument(format!(
                            "field {:?} must be a finite number, got {}",
                            field.name, coerced
                        )));
                    }
                    out.fields.insert(field.name.clone(), coerced);
                }
                None if field.optional => {}
                None => {
                    return Err(Error::InvalidDocument(format!(
                        "missing required field {:?}",
                        field.name
                    )));
                }
            }
        }
        Ok(out)
    }

    /// Render the primary-key value for this document
    ///
    /// # Errors
    ///
    /// Returns `PrimaryKeyMissing` if the schema has no primary key, and
    /// `InvalidDocument` if the value is absent or renders empty.
    pub fn primary_key(&self, collection: &Collection) -> Result<String> {
        let pk = collection
            .primary_key_field()
            .ok_or_else(|| Error::PrimaryKeyMissing(collection.name.clone()))?;
        let id = self
            .fields
            .get(&pk.name)
            .map(|v| v.to_string())
            .unwrap_or_default();
        if id.is_empty() {
            return Err(Error::InvalidDocument(format!(
                "primary key {:?} is empty",
                pk.name
            )));
        }
        Ok(id)
    }

    /// Encode as a flat hash record
    pub fn to_record(&self) -> Result<Vec<(String, String)>> {
        self.fields
            .iter()
            .map(|(name, value)| Ok((name.clone(), serde_json::to_string(value)?)))
            .collect()
    }

    /// Decode a flat hash record
    pub fn from_record(record: HashMap<String, String>) -> Result<Self> {
        let mut doc = Document::new();
        for (name, encoded) in record {
            let value: FieldValue = serde_json::from_str(&encoded)?;
            doc.fields.insert(name, value);
        }
        Ok(doc)
    }
}

impl FromIterator<(String, FieldValue)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Document {
            fields: iter.into_iter().collect(),
        }
    }
}

fn json_to_value(raw: &JsonValue, field_type: FieldType) -> Option<FieldValue> {
    match field_type {
        FieldType::Text => raw.as_str().map(FieldValue::text),
        FieldType::String => raw.as_str().map(FieldValue::string),
        FieldType::Int => raw.as_i64().map(FieldValue::Int),
        FieldType::Float => raw.as_f64().map(FieldValue::Float),
        FieldType::Bool => raw.as_bool().map(FieldValue::Bool),
        FieldType::Time => match raw {
            JsonValue::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|t| FieldValue::Time(t.with_timezone(&Utc))),
            JsonValue::Number(n) => n
                .as_i64()
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
                .map(FieldValue::Time),
            _ => None,
        },
        FieldType::Geo => match raw {
            JsonValue::Object(o) => Some(FieldValue::Geo(GeoPoint {
                lat: o.get("lat")?.as_f64()?,
                lon: o.get("lon")?.as_f64()?,
            })),
            JsonValue::Array(a) if a.len() == 2 => {
                Some(FieldValue::geo(a[0].as_f64()?, a[1].as_f64()?))
            }
            _ => None,
        },
    }
}
