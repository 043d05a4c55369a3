//! The flattening engine: one record plus an ordered field selection in,
//! one or more tabular rows out.
//!
//! Resolution is a small set of rules dispatched on selector shape and on
//! whether the record carries an exploding array:
//!
//! - flat selectors copy top-level values;
//! - the first compound selector (in selection order) whose first segment
//!   holds an array picks the *exploding key*, and the record emits one
//!   row per array element;
//! - compound selectors sharing the exploding key resolve against the
//!   current element, all other compound selectors resolve against the
//!   whole record and repeat on every exploded row;
//! - on exploded rows, flat values appear only at element index 0; later
//!   rows carry an explicit blank so the sink leaves the cell empty.

use serde_json::Value;

use super::selector::Selector;
use super::types::Row;

/// Stateless flattener. Construct once, call [`Flattener::flatten`] per
/// batch; concurrent calls share nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flattener;

impl Flattener {
    pub fn new() -> Self {
        Flattener
    }

    /// Flatten a batch of records against an ordered field selection.
    ///
    /// Output rows follow source-record order; records that explode emit
    /// their rows in array-element order. Missing fields resolve to
    /// absence, never to an error, and every record contributes at least
    /// one row.
    pub fn flatten(&self, records: &[Value], selectors: &[Selector]) -> Vec<Row> {
        let (flat, compound): (Vec<&Selector>, Vec<&Selector>) =
            selectors.iter().partition(|selector| !selector.is_compound());

        let mut rows = Vec::new();
        for record in records {
            self.flatten_record(record, &flat, &compound, &mut rows);
        }
        rows
    }

    fn flatten_record(
        &self,
        record: &Value,
        flat: &[&Selector],
        compound: &[&Selector],
        rows: &mut Vec<Row>,
    ) {
        if compound.is_empty() {
            rows.push(flat_row(record, flat));
            return;
        }

        match find_exploding(record, compound) {
            Some((key, elements)) => {
                explode(record, key, elements, flat, compound, rows);
            }
            None => rows.push(record_relative_row(record, flat, compound)),
        }
    }
}

/// The exploding key for this record: the head of the first compound
/// selector whose top-level value is array-typed, along with the array.
fn find_exploding<'s, 'r>(
    record: &'r Value,
    compound: &[&'s Selector],
) -> Option<(&'s str, &'r [Value])> {
    for selector in compound {
        if let Some(Value::Array(elements)) = record.get(selector.head()) {
            return Some((selector.head(), elements));
        }
    }
    None
}

/// Walk `path` through nested objects. Any step through a non-object or
/// a missing key resolves the whole chain to absence.
fn resolve<'a>(root: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = root;
    for segment in path {
        current = current.get(segment.as_str())?;
    }
    Some(current)
}

/// A selector's effective segments: anything past the third is ignored,
/// so `a.b.c.d` resolves exactly like `a.b.c`.
fn capped(selector: &Selector) -> &[String] {
    let segments = selector.segments();
    &segments[..segments.len().min(3)]
}

/// Rule 1: no compound selectors. One row carrying each flat selector
/// present on the record; absent ones are omitted.
fn flat_row(record: &Value, flat: &[&Selector]) -> Row {
    let mut row = Row::new();
    for selector in flat {
        if let Some(value) = record.get(selector.head()) {
            row.insert(selector.raw(), value.clone());
        }
    }
    row
}

/// Rule 2, no exploding key: compound selectors reference plain nested
/// objects (or nothing), so the record emits a single row with every
/// selector resolved against the whole record.
fn record_relative_row(record: &Value, flat: &[&Selector], compound: &[&Selector]) -> Row {
    let mut row = flat_row(record, flat);
    for selector in compound {
        if let Some(value) = resolve(record, capped(selector)) {
            row.insert(selector.raw(), value.clone());
        }
    }
    row
}

/// Rule 2, exploding key present: one row per array element. Flat values
/// appear only on the first element's row; later rows get explicit
/// blanks. Array-relative compounds resolve inside the element,
/// record-relative compounds repeat on every row.
fn explode(
    record: &Value,
    exploding: &str,
    elements: &[Value],
    flat: &[&Selector],
    compound: &[&Selector],
    rows: &mut Vec<Row>,
) {
    if elements.is_empty() {
        // The record still owes one row: flat fields as on a first
        // element, array-relative compounds unresolvable without one.
        let mut row = flat_row(record, flat);
        for selector in compound {
            if selector.head() == exploding {
                continue;
            }
            if let Some(value) = resolve(record, capped(selector)) {
                row.insert(selector.raw(), value.clone());
            }
        }
        rows.push(row);
        return;
    }

    for (index, element) in elements.iter().enumerate() {
        let mut row = Row::new();

        for selector in flat {
            if index == 0 {
                if let Some(value) = record.get(selector.head()) {
                    row.insert(selector.raw(), value.clone());
                }
            } else {
                row.insert_blank(selector.raw());
            }
        }

        for selector in compound {
            let segments = capped(selector);
            let resolved = if selector.head() == exploding {
                resolve(element, &segments[1..])
            } else {
                resolve(record, segments)
            };
            if let Some(value) = resolved {
                row.insert(selector.raw(), value.clone());
            }
        }

        rows.push(row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::types::Cell;
    use serde_json::json;

    fn selectors(raw: &[&str]) -> Vec<Selector> {
        raw.iter().map(|s| Selector::parse(s).unwrap()).collect()
    }

    fn flatten(records: &[Value], raw: &[&str]) -> Vec<Row> {
        Flattener::new().flatten(records, &selectors(raw))
    }

    #[test]
    fn test_flat_selection_is_one_row_per_record() {
        let records = vec![
            json!({"id": 1, "name": "Alice", "age": 30}),
            json!({"id": 2, "name": "Bob"}),
            json!({"id": 3}),
        ];

        let rows = flatten(&records, &["id", "name"]);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get("id"), Some(&Cell::Value(json!(1))));
        assert_eq!(rows[0].get("name"), Some(&Cell::Value(json!("Alice"))));
        assert_eq!(rows[1].get("name"), Some(&Cell::Value(json!("Bob"))));
        // Absent keys are omitted, not nulled.
        assert!(rows[2].get("name").is_none());
    }

    #[test]
    fn test_explode_one_row_per_element() {
        let records = vec![json!({
            "id": 1,
            "products": [{"name": "A"}, {"name": "B"}]
        })];

        let rows = flatten(&records, &["id", "products.name"]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("id"), Some(&Cell::Value(json!(1))));
        assert_eq!(rows[0].get("products.name"), Some(&Cell::Value(json!("A"))));
        assert_eq!(rows[1].get("products.name"), Some(&Cell::Value(json!("B"))));
    }

    #[test]
    fn test_explode_blanks_scalar_columns_after_first_row() {
        let records = vec![json!({
            "id": 7,
            "products": [{"name": "A"}, {"name": "B"}, {"name": "C"}]
        })];

        let rows = flatten(&records, &["id", "products.name"]);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get("id"), Some(&Cell::Value(json!(7))));
        // Later rows reserve the column with an explicit blank rather
        // than repeating the value.
        assert_eq!(rows[1].get("id"), Some(&Cell::Blank));
        assert_eq!(rows[2].get("id"), Some(&Cell::Blank));
    }

    #[test]
    fn test_object_relative_value_repeats_on_every_exploded_row() {
        let records = vec![json!({
            "user": {"name": "Ada"},
            "items": [{"sku": "x"}, {"sku": "y"}]
        })];

        let rows = flatten(&records, &["items.sku", "user.name"]);

        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.get("user.name"), Some(&Cell::Value(json!("Ada"))));
        }
        assert_eq!(rows[0].get("items.sku"), Some(&Cell::Value(json!("x"))));
        assert_eq!(rows[1].get("items.sku"), Some(&Cell::Value(json!("y"))));
    }

    #[test]
    fn test_exploding_key_is_first_array_valued_compound() {
        // "user" comes first in the selection but is not an array, so
        // "items" drives the explosion.
        let records = vec![json!({
            "user": {"name": "Ada"},
            "items": [{"sku": "x"}, {"sku": "y"}]
        })];

        let rows = flatten(&records, &["user.name", "items.sku"]);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_nested_objects_without_array_emit_single_row() {
        let records = vec![json!({
            "id": 1,
            "user": {"name": "Ada", "address": {"city": "London"}}
        })];

        let rows = flatten(&records, &["id", "user.name", "user.address.city"]);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id"), Some(&Cell::Value(json!(1))));
        assert_eq!(rows[0].get("user.name"), Some(&Cell::Value(json!("Ada"))));
        assert_eq!(
            rows[0].get("user.address.city"),
            Some(&Cell::Value(json!("London")))
        );
    }

    #[test]
    fn test_depth_three_inside_exploding_element() {
        let records = vec![json!({
            "products": [
                {"info": {"sku": "a-1"}},
                {"info": {"sku": "a-2"}},
                {"info": 3}
            ]
        })];

        let rows = flatten(&records, &["products.info.sku"]);

        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0].get("products.info.sku"),
            Some(&Cell::Value(json!("a-1")))
        );
        assert_eq!(
            rows[1].get("products.info.sku"),
            Some(&Cell::Value(json!("a-2")))
        );
        // Chain broken by a scalar intermediate: absent, not an error.
        assert!(rows[2].get("products.info.sku").is_none());
    }

    #[test]
    fn test_segments_past_the_third_are_ignored() {
        let records = vec![json!({
            "a": {"b": {"c": {"d": "deep"}}}
        })];

        let rows = flatten(&records, &["a.b.c.d"]);

        // Resolves as a.b.c, so the cell carries the object at that depth.
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].get("a.b.c.d"),
            Some(&Cell::Value(json!({"d": "deep"})))
        );
    }

    #[test]
    fn test_scalar_array_elements_resolve_to_absence() {
        let records = vec![json!({"id": 1, "tags": ["red", "blue"]})];

        let rows = flatten(&records, &["id", "tags.name"]);

        assert_eq!(rows.len(), 2);
        assert!(rows[0].get("tags.name").is_none());
        assert!(rows[1].get("tags.name").is_none());
        assert_eq!(rows[0].get("id"), Some(&Cell::Value(json!(1))));
        assert_eq!(rows[1].get("id"), Some(&Cell::Blank));
    }

    #[test]
    fn test_empty_exploding_array_still_yields_a_row() {
        let records = vec![json!({
            "id": 9,
            "user": {"name": "Ada"},
            "products": []
        })];

        let rows = flatten(&records, &["id", "products.name", "user.name"]);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id"), Some(&Cell::Value(json!(9))));
        assert!(rows[0].get("products.name").is_none());
        assert_eq!(rows[0].get("user.name"), Some(&Cell::Value(json!("Ada"))));
    }

    #[test]
    fn test_exploding_key_is_chosen_per_record() {
        // First record explodes on "products"; second has no array at
        // all and falls back to a single record-relative row.
        let records = vec![
            json!({"id": 1, "products": [{"name": "A"}, {"name": "B"}]}),
            json!({"id": 2, "products": {"name": "inline"}}),
        ];

        let rows = flatten(&records, &["id", "products.name"]);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].get("id"), Some(&Cell::Value(json!(2))));
        assert_eq!(
            rows[2].get("products.name"),
            Some(&Cell::Value(json!("inline")))
        );
    }

    #[test]
    fn test_null_values_pass_through_as_present_cells() {
        let records = vec![json!({"id": null, "user": {"name": null}})];

        let rows = flatten(&records, &["id", "user.name"]);

        assert_eq!(rows[0].get("id"), Some(&Cell::Value(json!(null))));
        assert_eq!(rows[0].get("user.name"), Some(&Cell::Value(json!(null))));
    }

    #[test]
    fn test_rows_follow_record_then_element_order() {
        let records = vec![
            json!({"id": 1, "products": [{"name": "A"}, {"name": "B"}]}),
            json!({"id": 2, "products": [{"name": "C"}]}),
        ];

        let rows = flatten(&records, &["id", "products.name"]);

        let names: Vec<&Cell> = rows
            .iter()
            .filter_map(|row| row.get("products.name"))
            .collect();
        assert_eq!(
            names,
            vec![
                &Cell::Value(json!("A")),
                &Cell::Value(json!("B")),
                &Cell::Value(json!("C"))
            ]
        );
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let records = vec![json!({
            "id": 1,
            "user": {"name": "Ada"},
            "products": [{"name": "A"}, {"name": "B"}]
        })];
        let selection = selectors(&["id", "products.name", "user.name"]);

        let flattener = Flattener::new();
        let first = flattener.flatten(&records, &selection);
        let second = flattener.flatten(&records, &selection);
        assert_eq!(first, second);
    }

    #[test]
    fn test_non_object_record_yields_an_empty_row() {
        let records = vec![json!(42), json!({"id": 1})];

        let rows = flatten(&records, &["id"]);

        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_empty());
        assert_eq!(rows[1].get("id"), Some(&Cell::Value(json!(1))));
    }
}
