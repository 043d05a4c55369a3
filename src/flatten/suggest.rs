//! Field suggestion: match a previously used field list against the
//! catalog of a freshly loaded batch.
//!
//! Matching runs in tiers per reference field: exact, then
//! case-insensitive exact (all such catalog entries), then similarity.
//! A reference with no match and no similar field is silently dropped.

use super::types::FieldCatalog;

/// Result of matching a reference field list against the current catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestionSet {
    /// Fields directly usable: exact and case-insensitive exact matches,
    /// in reference order.
    pub matched: Vec<String>,
    /// One group per reference field that only has similar candidates.
    pub suggestions: Vec<Suggestion>,
}

/// Similar catalog fields for one unmatched reference field.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub reference: String,
    pub suggestions: Vec<String>,
}

/// Match `reference` fields against the catalog.
pub fn suggest(reference: &[String], catalog: &FieldCatalog) -> SuggestionSet {
    let mut out = SuggestionSet::default();

    for reference_field in reference {
        if catalog.contains(reference_field) {
            out.matched.push(reference_field.clone());
            continue;
        }

        let lowered = reference_field.to_lowercase();
        let case_insensitive: Vec<String> = catalog
            .fields()
            .iter()
            .filter(|field| field.to_lowercase() == lowered)
            .cloned()
            .collect();
        if !case_insensitive.is_empty() {
            out.matched.extend(case_insensitive);
            continue;
        }

        let similar: Vec<String> = catalog
            .fields()
            .iter()
            .filter(|field| is_similar(&field.to_lowercase(), &lowered))
            .cloned()
            .collect();
        if !similar.is_empty() {
            out.suggestions.push(Suggestion {
                reference: reference_field.clone(),
                suggestions: similar,
            });
        }
    }

    out
}

/// Case-folded similarity: containment either way, or any token pair
/// (split on `.`, `_`, `-`) where one token contains the other.
fn is_similar(field: &str, reference: &str) -> bool {
    if field.contains(reference) || reference.contains(field) {
        return true;
    }

    let field_tokens: Vec<&str> = field.split(['.', '_', '-']).collect();
    reference
        .split(['.', '_', '-'])
        .any(|token| field_tokens.iter().any(|ft| ft.contains(token) || token.contains(ft)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog(fields: serde_json::Value) -> FieldCatalog {
        FieldCatalog::from_record(&fields)
    }

    #[test]
    fn test_exact_match_goes_to_matched() {
        let catalog = catalog(json!({"id": 1, "name": "x"}));
        let result = suggest(&["id".to_string()], &catalog);

        assert_eq!(result.matched, vec!["id".to_string()]);
        assert!(result.suggestions.is_empty());
    }

    #[test]
    fn test_case_insensitive_match_expands_to_all_entries() {
        let catalog = catalog(json!({"Email": 1, "EMAIL": 2, "age": 3}));
        let result = suggest(&["email".to_string()], &catalog);

        assert_eq!(result.matched, vec!["Email".to_string(), "EMAIL".to_string()]);
        assert!(result.suggestions.is_empty());
    }

    #[test]
    fn test_token_overlap_produces_suggestion() {
        let catalog = catalog(json!({"userName": 1, "age": 2}));
        let result = suggest(&["user_name".to_string()], &catalog);

        assert!(result.matched.is_empty());
        assert_eq!(
            result.suggestions,
            vec![Suggestion {
                reference: "user_name".to_string(),
                suggestions: vec!["userName".to_string()],
            }]
        );
    }

    #[test]
    fn test_substring_containment_is_similar() {
        let catalog = catalog(json!({"username": 1}));
        let result = suggest(&["name".to_string()], &catalog);

        assert_eq!(result.suggestions.len(), 1);
        assert_eq!(result.suggestions[0].suggestions, vec!["username".to_string()]);
    }

    #[test]
    fn test_unrelated_reference_is_dropped() {
        let catalog = catalog(json!({"total": 1, "currency": 2}));
        let result = suggest(&["zipcode".to_string()], &catalog);

        assert!(result.matched.is_empty());
        assert!(result.suggestions.is_empty());
    }

    #[test]
    fn test_reference_order_is_preserved() {
        let catalog = catalog(json!({"id": 1, "userName": 2}));
        let reference = vec!["user_name".to_string(), "id".to_string()];
        let result = suggest(&reference, &catalog);

        assert_eq!(result.matched, vec!["id".to_string()]);
        assert_eq!(result.suggestions[0].reference, "user_name");
    }
}
