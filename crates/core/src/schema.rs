//! Collection schemas
//!
//! A [`Collection`] is an ordered list of [`Field`] definitions with exactly
//! one primary key. Definitions are validated once, at registration, and are
//! immutable afterwards.
//!
//! ## Naming Rules
//!
//! Collection and field names are embedded into store keys, so they:
//! - must not be empty
//! - must not contain the key separator `:`
//! - must not contain whitespace

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Separator used between store key segments
pub const KEY_SEPARATOR: char = ':';

/// Declared type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Full-text, tokenized when searchable
    Text,
    /// Exact string (tags/facets)
    String,
    /// 64-bit integer
    Int,
    /// 64-bit float
    Float,
    /// Boolean
    Bool,
    /// UTC timestamp
    Time,
    /// Latitude/longitude pair
    Geo,
}

impl FieldType {
    /// Whether values of this type have a total order usable by range filters and sorting
    pub fn is_ordered(self) -> bool {
        matches!(
            self,
            FieldType::Text | FieldType::String | FieldType::Int | FieldType::Float | FieldType::Time
        )
    }

    /// Whether a field of this type can serve as a primary key
    pub fn can_be_primary_key(self) -> bool {
        matches!(self, FieldType::Text | FieldType::String | FieldType::Int)
    }
}

/// A single field definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name, unique within its collection
    pub name: String,
    /// Declared value type
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Tokenized and full-text indexed
    #[serde(default)]
    pub search: bool,
    /// Usable in filter conditions and facets
    #[serde(default)]
    pub filter: bool,
    /// Usable in sort specifications
    #[serde(default)]
    pub sortable: bool,
    /// May be absent from documents
    #[serde(default)]
    pub optional: bool,
    /// Identifies documents in the collection
    #[serde(default)]
    pub primary_key: bool,
    /// Relevance contribution; zero means the default of 1
    #[serde(default)]
    pub weight: u32,
}

impl Field {
    /// Create a field with all flags off
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Field {
            name: name.into(),
            field_type,
            search: false,
            filter: false,
            sortable: false,
            optional: false,
            primary_key: false,
            weight: 0,
        }
    }

    /// Text field
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    /// String field
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    /// Int field
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Int)
    }

    /// Float field
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Float)
    }

    /// Bool field
    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Bool)
    }

    /// Time field
    pub fn time(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Time)
    }

    /// Geo field
    pub fn geo(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Geo)
    }

    /// Builder: mark as full-text searchable
    pub fn searchable(mut self) -> Self {
        self.search = true;
        self
    }

    /// Builder: mark as filterable
    pub fn filterable(mut self) -> Self {
        self.filter = true;
        self
    }

    /// Builder: mark as sortable
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Builder: mark as optional
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Builder: mark as the primary key
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Builder: set relevance weight
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    /// Weight used for scoring (1 when unset)
    pub fn effective_weight(&self) -> u32 {
        if self.weight == 0 {
            1
        } else {
            self.weight
        }
    }

    /// Whether this field contributes postings to the inverted index
    pub fn is_full_text(&self) -> bool {
        self.search && self.field_type == FieldType::Text
    }
}

/// A collection definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    /// Unique collection name
    pub name: String,
    /// Ordered field definitions
    pub fields: Vec<Field>,
}

impl Collection {
    /// Create an empty collection definition
    pub fn new(name: impl Into<String>) -> Self {
        Collection {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Builder: append a field
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// The primary-key field, if declared
    pub fn primary_key_field(&self) -> Option<&Field> {
        self.fields.iter().find(|f| f.primary_key)
    }

    /// Look up a field by name
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Fields that are indexed for full-text search
    pub fn search_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_full_text())
    }

    /// Validate the definition
    ///
    /// # Errors
    ///
    /// Returns `InvalidSchema` if the name is empty or malformed, there are
    /// no fields, a field name is empty, malformed or duplicated, or the
    /// number of primary keys is not exactly one.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::InvalidSchema("collection name required".into()));
        }
        check_name("collection", &self.name)?;
        if self.fields.is_empty() {
            return Err(Error::InvalidSchema(
                "at least one field required".into(),
            ));
        }

        let mut seen = HashSet::new();
        let mut primary_keys = 0;
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(Error::InvalidSchema("field name required".into()));
            }
            check_name("field", &field.name)?;
            if !seen.insert(field.name.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate field {:?}",
                    field.name
                )));
            }
            if field.primary_key {
                primary_keys += 1;
                if !field.field_type.can_be_primary_key() {
                    return Err(Error::InvalidSchema(format!(
                        "primary key {:?} must be text, string or int",
                        field.name
                    )));
                }
                if field.optional {
                    return Err(Error::InvalidSchema(format!(
                        "primary key {:?} cannot be optional",
                        field.name
                    )));
                }
            }
        }

        match primary_keys {
            0 => Err(Error::InvalidSchema("no primary key declared".into())),
            1 => Ok(()),
            n => Err(Error::InvalidSchema(format!(
                "{} primary keys declared, exactly one is allowed",
                n
            ))),
        }
    }
}

fn check_name(kind: &str, name: &str) -> Result<()> {
    if name.contains(KEY_SEPARATOR) || name.chars().any(char::is_whitespace) {
        return Err(Error::InvalidSchema(format!(
            "{} name {:?} must not contain ':' or whitespace",
            kind, name
        )));
    }
    Ok(())
}

/// Unwrap a collection definition at startup
///
/// Intended for static, load-time schema declarations only.
///
/// # Panics
///
/// Panics if the definition is invalid. Do not use with runtime input.
pub fn must_collection(collection: Collection) -> Collection {
    if let Err(e) = collection.validate() {
        panic!("invalid collection definition {:?}: {}", collection.name, e);
    }
    collection
}
