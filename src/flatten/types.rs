use serde_json::Value;

/// A single output cell: a value carried over from the source record, or
/// an explicit blank that still reserves its column in the output table.
///
/// `Blank` is what the explode rule emits for scalar columns on every
/// array element after the first: the sink renders an empty cell there
/// instead of repeating the record-level value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Value(Value),
    Blank,
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        matches!(self, Cell::Blank)
    }

    /// The carried value, `None` for a blank cell.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Cell::Value(value) => Some(value),
            Cell::Blank => None,
        }
    }
}

/// One flattened output row: selector string -> cell, in insertion order.
///
/// Keys absent from a row were simply unresolvable on its source record;
/// that is never an error. Insertion order matters because the sink builds
/// its column set from the first occurrence of each key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, Cell)>,
}

impl Row {
    pub fn new() -> Self {
        Row { cells: Vec::new() }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.cells.push((key.into(), Cell::Value(value)));
    }

    pub fn insert_blank(&mut self, key: impl Into<String>) {
        self.cells.push((key.into(), Cell::Blank));
    }

    pub fn get(&self, key: &str) -> Option<&Cell> {
        self.cells
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, cell)| cell)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.cells.iter().map(|(name, cell)| (name.as_str(), cell))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// The top-level key names of the first record in a batch.
///
/// Used by selector validation, the suggestion heuristic and template
/// availability checks; the flattening engine itself resolves fields
/// per record and never consults the catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldCatalog {
    fields: Vec<String>,
}

impl FieldCatalog {
    /// Catalog of the batch's first record. Empty for an empty batch.
    pub fn from_batch(records: &[Value]) -> Self {
        records.first().map(Self::from_record).unwrap_or_default()
    }

    /// Top-level keys of a single record. Non-object records have none.
    pub fn from_record(record: &Value) -> Self {
        match record {
            Value::Object(map) => FieldCatalog {
                fields: map.keys().cloned().collect(),
            },
            _ => FieldCatalog::default(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|field| field == name)
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
