//! # Rollmill - JSON Field-Selection Flattening
//!
//! A library for flattening arbitrary JSON record batches into tabular
//! rows driven by an ordered list of dotted field selectors, plus the
//! surrounding pieces a spreadsheet-export tool needs: selection
//! history, named templates and XLSX/CSV sinks.
//!
//! ## Modules
//!
//! - **flatten**: the field-selection engine - selectors, validation,
//!   explode semantics, field suggestions
//! - **store**: selection history and template persistence
//! - **sink**: column planning and the XLSX/CSV writers
//!
//! ## Quick Start
//!
//! ```rust
//! use rollmill::flatten_selection;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), rollmill::ConvertError> {
//! let records = vec![json!({
//!     "id": 1,
//!     "products": [{"name": "A"}, {"name": "B"}]
//! })];
//!
//! let selectors = vec!["id".to_string(), "products.name".to_string()];
//! let rows = flatten_selection(&records, &selectors)?;
//!
//! // One row per array element; the scalar "id" column carries its
//! // value only on the first row and an explicit blank afterwards.
//! assert_eq!(rows.len(), 2);
//! assert!(rows[1].get("id").unwrap().is_blank());
//! # Ok(())
//! # }
//! ```
//!
//! ## Suggestions
//!
//! ```rust
//! use rollmill::flatten::{suggest, FieldCatalog};
//! use serde_json::json;
//!
//! let catalog = FieldCatalog::from_record(&json!({"userName": "x", "age": 1}));
//! let result = suggest(&["user_name".to_string()], &catalog);
//!
//! assert_eq!(result.suggestions[0].suggestions, vec!["userName".to_string()]);
//! ```

use serde_json::Value;

pub mod error;
pub mod flatten;
pub mod sink;
pub mod store;

// Re-export commonly used types for convenience
pub use error::ConvertError;
pub use flatten::{Cell, FieldCatalog, Flattener, Row, Selector};
pub use store::{FileStore, HistoryEntry, MemStore, SelectionStore, Template};

/// Main entry point: validate a field selection against the batch and
/// flatten it into rows.
///
/// The selection is validated against the first record's field catalog
/// before flattening runs; an invalid selection rejects the whole
/// request with no partial output.
pub fn flatten_selection(
    records: &[Value],
    selectors: &[String],
) -> Result<Vec<Row>, ConvertError> {
    if records.is_empty() {
        return Err(ConvertError::EmptyBatch);
    }
    if selectors.is_empty() {
        return Err(ConvertError::NoFields);
    }

    let catalog = FieldCatalog::from_batch(records);
    let invalid = flatten::validate(&catalog, selectors);
    if !invalid.is_empty() {
        return Err(ConvertError::InvalidFields(invalid));
    }

    // Validation guarantees every selector parses.
    let parsed: Vec<Selector> = selectors
        .iter()
        .filter_map(|raw| Selector::parse(raw))
        .collect();

    Ok(Flattener::new().flatten(records, &parsed))
}

/// Flatten a selection and record it in history.
///
/// History persistence is best-effort: a store failure is logged and
/// swallowed, never surfaced as a conversion failure - the computed rows
/// are returned regardless.
pub fn flatten_and_record<S: SelectionStore + ?Sized>(
    records: &[Value],
    selectors: &[String],
    label: Option<&str>,
    store: &S,
) -> Result<Vec<Row>, ConvertError> {
    let rows = flatten_selection(records, selectors)?;

    if let Err(err) = record_history(store, label, selectors) {
        log::warn!("failed to record selection history: {err}");
    }

    Ok(rows)
}

fn record_history<S: SelectionStore + ?Sized>(
    store: &S,
    label: Option<&str>,
    selectors: &[String],
) -> store::StoreResult<()> {
    let name = match label {
        Some(label) => label.to_string(),
        None => format!("selection {}", store.list_history()?.len() + 1),
    };
    store.add_history(&name, selectors)?;
    Ok(())
}
