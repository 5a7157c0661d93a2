//! Property-based tests using proptest
//!
//! These tests verify filter rendering and evaluation, date truncation and
//! row mapping using randomized inputs.

use proptest::prelude::*;
use serde_json::{json, Value};
use ycsource::resource::{build_filter, extract_json_value, format_date, FilterValue, Predicate};

/// Generate arbitrary instance data for testing
fn arb_instance() -> impl Strategy<Value = Value> {
    (
        "[a-z][a-z0-9-]{0,62}", // name
        prop_oneof!["RUNNING", "STOPPED", "PROVISIONING", "STARTING", "STOPPING"],
        prop_oneof!["ru-central1-a", "ru-central1-b", "ru-central1-d"],
        any::<bool>(),
    )
        .prop_map(|(name, status, zone, protected)| {
            json!({
                "name": name,
                "status": status,
                "zoneId": zone,
                "deletionProtection": protected,
            })
        })
}

/// Generate a list of instances
fn arb_instance_list() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(arb_instance(), 0..100)
}

/// Undo the string-literal escaping of a rendered filter value
fn unescape_literal(literal: &str) -> Option<String> {
    let inner = literal.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(chars.next()?),
            '"' => return None,
            _ => out.push(c),
        }
    }
    Some(out)
}

proptest! {
    /// Any string renders as a single literal that unescapes to itself
    #[test]
    fn test_filter_literal_round_trips(value in ".*") {
        let literal = FilterValue::Str(value.clone()).to_string();
        prop_assert_eq!(unescape_literal(&literal), Some(value));
    }

    /// A rendered clause cannot be broken out of by quotes in the value
    #[test]
    fn test_clause_has_no_unescaped_quote(value in r#"[a-z"\\() =]{0,40}"#) {
        let clause = Predicate::eq_str("name", value).to_clause();
        let body = clause
            .strip_prefix("(name = ")
            .and_then(|rest| rest.strip_suffix(')'));
        prop_assert!(body.is_some());
        prop_assert!(unescape_literal(body.unwrap()).is_some());
    }

    /// One clause per predicate, joined by AND
    #[test]
    fn test_build_filter_clause_count(values in prop::collection::vec("[a-z0-9-]{1,20}", 0..8)) {
        let predicates: Vec<_> = values.iter().map(|v| Predicate::eq_str("name", v.as_str())).collect();
        match build_filter(&predicates) {
            None => prop_assert!(values.is_empty()),
            Some(filter) => {
                prop_assert_eq!(filter.matches(" AND ").count(), values.len() - 1);
                prop_assert!(filter.starts_with('(') && filter.ends_with(')'));
            },
        }
    }

    /// Local filtering keeps exactly the items whose status equals the value
    #[test]
    fn test_status_predicate_partitions(
        instances in arb_instance_list(),
        status in prop_oneof!["RUNNING", "STOPPED"],
    ) {
        let predicate = Predicate::eq_str("status", status.as_str());
        let kept: Vec<_> = instances.iter().filter(|i| predicate.matches(i)).collect();

        for item in &kept {
            prop_assert_eq!(item["status"].as_str(), Some(status.as_str()));
        }
        let expected = instances.iter().filter(|i| i["status"] == status.as_str()).count();
        prop_assert_eq!(kept.len(), expected);
    }

    /// Boolean predicates compare typed values, never string forms
    #[test]
    fn test_bool_predicate(instance in arb_instance(), wanted in any::<bool>()) {
        let predicate = Predicate::eq_bool("deletionProtection", wanted);
        let actual = instance["deletionProtection"].as_bool().unwrap();
        prop_assert_eq!(predicate.matches(&instance), actual == wanted);
    }

    /// Name predicates never match on substrings
    #[test]
    fn test_name_predicate_is_exact(instance in arb_instance(), suffix in "[a-z]{1,5}") {
        let name = instance["name"].as_str().unwrap().to_string();
        prop_assert!(Predicate::eq_str("name", name.as_str()).matches(&instance));
        let longer = format!("{}{}", name, suffix);
        prop_assert!(!Predicate::eq_str("name", longer).matches(&instance));
        if name.len() > 1 {
            let prefix = &name[..name.len() - 1];
            prop_assert!(!Predicate::eq_str("name", prefix).matches(&instance));
        }
    }

    /// RFC 3339 timestamps truncate to their date part
    #[test]
    fn test_format_date_takes_date_part(
        y in 1970u32..2100, m in 1u32..13, d in 1u32..29,
        h in 0u32..24, min in 0u32..60, s in 0u32..60,
    ) {
        let date = format!("{:04}-{:02}-{:02}", y, m, d);
        let timestamp = format!("{}T{:02}:{:02}:{:02}Z", date, h, min, s);
        prop_assert_eq!(format_date(&timestamp), Some(date));
    }

    /// Short values pass through untouched
    #[test]
    fn test_format_date_short_passthrough(value in "[ -~]{1,9}") {
        prop_assert_eq!(format_date(&value), Some(value));
    }

    /// Any non-empty value has a date, even with multi-byte characters
    #[test]
    fn test_format_date_never_panics(value in ".{1,40}") {
        prop_assert!(format_date(&value).is_some());
    }

    /// Dotted paths reach nested values
    #[test]
    fn test_extract_nested(key in "[a-z]{1,10}", inner in "[a-z]{1,10}", value in any::<i64>()) {
        let item = json!({ key.clone(): { inner.clone(): value } });
        let path = format!("{}.{}", key, inner);
        prop_assert_eq!(extract_json_value(&item, &path), Some(&json!(value)));
        let missing = format!("{}.{}x", key, inner);
        prop_assert_eq!(extract_json_value(&item, &missing), None);
    }
}
