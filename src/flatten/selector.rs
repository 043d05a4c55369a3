//! Dotted field selectors: parsing, catalog validation and the
//! availability check used when replaying a stored selection.

use super::types::FieldCatalog;

/// A parsed dotted field selector, e.g. `"products.name"`.
///
/// A single-segment selector is *flat* and resolves against a record's
/// top-level keys; a multi-segment selector is *compound* and resolves
/// through nested objects or an exploding array. The raw string is kept
/// verbatim since it doubles as the output column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    raw: String,
    segments: Vec<String>,
}

impl Selector {
    /// Parse a raw selector string. Empty strings and empty segments
    /// (leading, trailing or doubled dots) are malformed.
    pub fn parse(raw: &str) -> Option<Selector> {
        if raw.is_empty() {
            return None;
        }
        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return None;
        }
        Some(Selector {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The first segment, checked against the catalog during validation.
    pub fn head(&self) -> &str {
        &self.segments[0]
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_compound(&self) -> bool {
        self.segments.len() > 1
    }
}

/// Return the selectors that cannot be used with this catalog, in input
/// order: malformed strings, flat selectors whose name is not a catalog
/// entry, and compound selectors whose *first* segment is not a catalog
/// entry. Deeper segments are resolved lazily per record and are allowed
/// to be absent without failing validation.
pub fn validate(catalog: &FieldCatalog, selectors: &[String]) -> Vec<String> {
    selectors
        .iter()
        .filter(|raw| match Selector::parse(raw) {
            Some(selector) => !catalog.contains(selector.head()),
            None => true,
        })
        .cloned()
        .collect()
}

/// Split a stored field list into the part usable against the current
/// catalog and the remainder. A field is usable when it names a catalog
/// entry directly or its first segment does.
pub fn partition_available(
    fields: &[String],
    catalog: &FieldCatalog,
) -> (Vec<String>, Vec<String>) {
    fields.iter().cloned().partition(|field| {
        catalog.contains(field)
            || catalog
                .fields()
                .iter()
                .any(|entry| field.starts_with(&format!("{entry}.")))
    })
}
