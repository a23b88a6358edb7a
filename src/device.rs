use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    Boolean,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Bool(_) => PropertyKind::Boolean,
            PropertyValue::Number(_) => PropertyKind::Number,
        }
    }

    /// Re-types a value the store handed back as text.
    ///
    /// Booleans may come back as `true`/`false` or as `1`/`0` depending on
    /// the backend. Without a known kind, a boolean reading is tried first.
    pub fn parse_text(kind: Option<PropertyKind>, text: &str) -> Option<Self> {
        let text = text.trim();
        match kind {
            Some(PropertyKind::Boolean) => parse_bool(text).map(PropertyValue::Bool),
            Some(PropertyKind::Number) => text.parse::<f64>().ok().map(PropertyValue::Number),
            None => parse_bool_word(text)
                .map(PropertyValue::Bool)
                .or_else(|| text.parse::<f64>().ok().map(PropertyValue::Number)),
        }
    }
}

fn parse_bool_word(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    parse_bool_word(text).or(match text {
        "1" => Some(true),
        "0" => Some(false),
        _ => None,
    })
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(value) => write!(f, "{value}"),
            PropertyValue::Number(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySpec {
    #[serde(rename = "type")]
    pub kind: PropertyKind,
    pub value: PropertyValue,
}

pub type DeviceProperties = BTreeMap<String, PropertySpec>;
