//! Property-based tests using proptest
//!
//! These tests check endpoint resolution, placeholder substitution and the
//! JSON to element conversion against randomized inputs.

use mpconf::midpoint::delta::json_to_xml;
use mpconf::midpoint::endpoints::{resolve_endpoint, ENDPOINTS};
use mpconf::properties::Properties;
use proptest::prelude::*;
use serde_json::{Map, Value};

/// Generate a JSON object with unique lowercase keys and scalar values
fn arb_flat_object() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::btree_map("[a-z][a-zA-Z]{0,8}", "[a-zA-Z0-9 ]{0,12}", 1..8)
        .prop_map(|m| m.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

proptest! {
    /// Any prefix of a known class name resolves to the first matching entry
    #[test]
    fn test_prefix_resolves_to_first_match(index in 0..ENDPOINTS.len(), len in 1usize..12) {
        let (class, _) = ENDPOINTS[index];
        let prefix = &class[..len.min(class.len())];

        let resolved = resolve_endpoint(prefix).unwrap();
        let expected = ENDPOINTS
            .iter()
            .find(|(c, _)| c.to_lowercase().starts_with(&prefix.to_lowercase()))
            .map(|(_, rest)| *rest)
            .unwrap();
        prop_assert_eq!(resolved, expected);
        prop_assert_eq!(resolve_endpoint(&prefix.to_uppercase()).unwrap(), expected);
    }

    /// Names that prefix no class are rejected
    #[test]
    fn test_unknown_names_rejected(name in "[xXzZqQ][a-z]{0,10}") {
        prop_assert!(resolve_endpoint(&name).is_err());
    }

    /// Keys come out in insertion order, one element each
    #[test]
    fn test_json_to_xml_keeps_key_order(entries in arb_flat_object()) {
        let mut map = Map::new();
        for (k, v) in &entries {
            map.insert(k.clone(), Value::String(v.clone()));
        }
        let expected: String = entries
            .iter()
            .map(|(k, v)| format!("<c:{k}>{v}</c:{k}>"))
            .collect();
        prop_assert_eq!(json_to_xml(&Value::Object(map)), expected);
    }

    /// Nesting wraps the inner conversion in the outer element
    #[test]
    fn test_json_to_xml_nesting(outer in "[a-z]{1,8}", entries in arb_flat_object()) {
        let mut inner = Map::new();
        for (k, v) in &entries {
            inner.insert(k.clone(), Value::String(v.clone()));
        }
        let inner = Value::Object(inner);
        let mut wrapper = Map::new();
        wrapper.insert(outer.clone(), inner.clone());

        prop_assert_eq!(
            json_to_xml(&Value::Object(wrapper)),
            format!("<c:{outer}>{}</c:{outer}>", json_to_xml(&inner))
        );
    }

    /// Text without placeholders passes through unchanged
    #[test]
    fn test_replace_without_placeholders(text in "[^$]{0,64}") {
        let mut properties = Properties::default();
        properties.set("key", "value");
        prop_assert_eq!(properties.replace(&text), text);
    }

    /// Every occurrence of a known key is substituted
    #[test]
    fn test_replace_known_key(
        key in "[a-z.]{1,10}",
        value in "[a-zA-Z0-9]{0,10}",
        times in 1usize..5,
    ) {
        let mut properties = Properties::default();
        properties.set(&key, &value);
        let text = format!("<a>$({key})</a>").repeat(times);
        prop_assert_eq!(properties.replace(&text), format!("<a>{value}</a>").repeat(times));
    }
}
