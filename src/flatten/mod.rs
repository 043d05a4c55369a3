//! Field-selection flattening - turn JSON records plus dotted field
//! selections into tabular rows.
//!
//! The engine is pure and holds no state between calls: validation
//! happens up front against the batch's field catalog, then each record
//! independently produces one or more [`Row`]s.

pub mod engine;
pub mod selector;
pub mod suggest;
pub mod types;

pub use engine::Flattener;
pub use selector::{partition_available, validate, Selector};
pub use suggest::{suggest, Suggestion, SuggestionSet};
pub use types::{Cell, FieldCatalog, Row};
