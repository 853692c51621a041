/// Name candidate generation
///
/// Produces the set of names considered equivalent to a column or member name:
/// 1. scalar types toggle an "Id" suffix (case-insensitive strip, or append)
/// 2. every name so far that contains underscores also appears without them
///
/// Output keeps the original name first, is free of duplicates and never
/// contains an empty string.
use crate::metadata::column::TypeTag;

const ID_SUFFIX: &str = "Id";

/// Candidate names for `name` of type `type_tag`
pub fn candidates(name: &str, type_tag: TypeTag) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(4);
    push_unique(&mut out, name.to_string());

    if type_tag.is_scalar() {
        match strip_id_suffix(name) {
            Some(stripped) => push_unique(&mut out, stripped.to_string()),
            None if ends_with_id(name) => {} // name is just "Id"
            None => push_unique(&mut out, format!("{}{}", name, ID_SUFFIX)),
        }
    }

    let with_underscores: Vec<String> = out.iter().filter(|n| n.contains('_')).cloned().collect();
    for candidate in with_underscores {
        push_unique(&mut out, candidate.replace('_', ""));
    }

    out
}

/// Candidates of `name`, plus the candidates of `name` with `prefix` removed
/// when it starts with that prefix (case-insensitive)
pub fn candidates_with_prefix(name: &str, type_tag: TypeTag, prefix: Option<&str>) -> Vec<String> {
    let mut out = candidates(name, type_tag);
    if let Some(rest) = prefix.and_then(|p| strip_prefix_ignore_case(name, p)) {
        for candidate in candidates(rest, type_tag) {
            push_unique(&mut out, candidate);
        }
    }
    out
}

/// `name` without `prefix`, if it starts with it and something is left
pub fn strip_prefix_ignore_case<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() || name.len() <= prefix.len() || !name.is_char_boundary(prefix.len()) {
        return None;
    }
    let (head, rest) = name.split_at(prefix.len());
    if head.eq_ignore_ascii_case(prefix) {
        Some(rest)
    } else {
        None
    }
}

fn ends_with_id(name: &str) -> bool {
    let len = name.len();
    len >= ID_SUFFIX.len()
        && name.is_char_boundary(len - ID_SUFFIX.len())
        && name[len - ID_SUFFIX.len()..].eq_ignore_ascii_case(ID_SUFFIX)
}

fn strip_id_suffix(name: &str) -> Option<&str> {
    if !ends_with_id(name) {
        return None;
    }
    let stripped = &name[..name.len() - ID_SUFFIX.len()];
    if stripped.is_empty() {
        None
    } else {
        Some(stripped)
    }
}

fn push_unique(out: &mut Vec<String>, candidate: String) {
    if !candidate.is_empty() && !out.contains(&candidate) {
        out.push(candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_scalar_id_suffix_stripped() {
        let c = candidates("ORDER_ID", TypeTag::INT64);
        assert_eq!(c[0], "ORDER_ID");
        assert!(c.contains(&"ORDER".to_string()));
        assert!(c.contains(&"ORDERID".to_string()));
    }

    #[test]
    fn test_scalar_id_suffix_appended() {
        let c = candidates("ORDER", TypeTag::INT32);
        assert!(c.contains(&"ORDERId".to_string()));
    }

    #[test]
    fn test_non_scalar_keeps_suffix() {
        let c = candidates("ORDER_ID", TypeTag::STRING);
        assert!(!c.contains(&"ORDER".to_string()));
        assert!(c.contains(&"ORDERID".to_string()));
    }

    #[test]
    fn test_nullable_scalar_and_enum_get_suffix_rule() {
        assert!(candidates("CustomerId", TypeTag::INT32.nullable()).contains(&"Customer".to_string()));
        assert!(candidates("Status", TypeTag::enumeration()).contains(&"StatusId".to_string()));
    }

    #[test]
    fn test_never_empty() {
        for name in ["Id", "ID", "_", "__id", "_Id", "a"] {
            for c in candidates_with_prefix(name, TypeTag::INT32, Some("_")) {
                assert!(!c.is_empty(), "empty candidate for {:?}", name);
            }
        }
    }

    #[test]
    fn test_no_duplicates() {
        for (name, tag) in [
            ("ORDER_ID", TypeTag::INT64),
            ("Order_Id", TypeTag::INT32),
            ("OrderId", TypeTag::INT32),
            ("x_y_z", TypeTag::STRING),
            ("Name", TypeTag::STRING),
        ] {
            let c = candidates_with_prefix(name, tag, Some("order"));
            let unique: HashSet<&String> = c.iter().collect();
            assert_eq!(unique.len(), c.len(), "duplicates in {:?}", c);
        }
    }

    #[test]
    fn test_prefix_stripped_candidates() {
        let c = candidates_with_prefix("cust_Name", TypeTag::STRING, Some("CUST_"));
        assert!(c.contains(&"cust_Name".to_string()));
        assert!(c.contains(&"Name".to_string()));

        // prefix equal to the whole name is not stripped
        let c = candidates_with_prefix("cust_", TypeTag::STRING, Some("cust_"));
        assert_eq!(c, vec!["cust_".to_string(), "cust".to_string()]);
    }
}
