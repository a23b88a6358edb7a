use once_cell::sync::Lazy;
use regex::Regex;

use crate::device::{PropertyKind, PropertyValue};
use crate::error::{AdapterError, AdapterResult};

/// Primary key of the single row holding a device's current state.
pub const STATE_ROW_ID: &str = "state";

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9_]+$").expect("identifier pattern is valid"));

/// Lower-cases and replaces dashes with underscores, which existing stored
/// schemas rely on. Anything still outside `[a-z0-9_]` is rejected.
pub fn sanitize_identifier(raw: &str) -> AdapterResult<String> {
    let ident = raw.to_lowercase().replace('-', "_");
    if IDENTIFIER.is_match(&ident) {
        Ok(ident)
    } else {
        Err(AdapterError::InvalidIdentifier(raw.to_string()))
    }
}

pub fn quote(ident: &str) -> String {
    format!("\"{ident}\"")
}

fn column_type(kind: PropertyKind) -> &'static str {
    match kind {
        PropertyKind::Boolean => "boolean",
        PropertyKind::Number => "real",
    }
}

/// Builds the statements issued against a device's state table.
/// Identifiers passed in must already be sanitized.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateQueries;

impl StateQueries {
    pub fn create_table(&self, table: &str, columns: &[(String, PropertyKind)]) -> String {
        let mut query = format!("CREATE TABLE {} ( id text PRIMARY KEY,", quote(table));
        for (column, kind) in columns {
            query.push_str(&format!(" {} {},", quote(column), column_type(*kind)));
        }
        query.pop();
        query.push_str(" );");
        query
    }

    pub fn upsert_state(&self, table: &str, values: &[(String, PropertyValue)]) -> String {
        let mut names = vec!["id".to_string()];
        let mut literals = vec![format!("'{STATE_ROW_ID}'")];
        for (column, value) in values {
            names.push(quote(column));
            literals.push(value.to_string());
        }
        format!(
            "INSERT OR REPLACE INTO {}({}) VALUES ({});",
            quote(table),
            names.join(", "),
            literals.join(", ")
        )
    }

    pub fn update_property(&self, table: &str, column: &str, value: &PropertyValue) -> String {
        format!(
            "UPDATE {} SET {}={} WHERE id='{STATE_ROW_ID}';",
            quote(table),
            quote(column),
            value
        )
    }

    pub fn select_property(&self, table: &str, column: &str) -> String {
        format!(
            "SELECT CAST({} AS text) AS value FROM {} WHERE id='{STATE_ROW_ID}';",
            quote(column),
            quote(table)
        )
    }
}
