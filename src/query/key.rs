//! Query Keys
//!
//! Builds stable cache keys from a query name and its parameters.

use serde::Serialize;

use crate::error::{QueryError, Result};

/// Builds `"<name>:<canonical json>"` for a query.
///
/// Parameters go through `serde_json::Value`, whose objects keep keys
/// sorted, so two parameter structs or maps with the same fields produce the
/// same key regardless of field order.
pub fn query_key<P: Serialize + ?Sized>(name: &str, params: &P) -> Result<String> {
    if name.is_empty() {
        return Err(QueryError::InvalidKey("query name cannot be empty".to_string()));
    }

    let canonical = serde_json::to_value(params)
        .map_err(|err| QueryError::InvalidKey(format!("unserializable parameters: {err}")))?;

    Ok(format!("{name}:{canonical}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Serialize)]
    struct DealFilter<'a> {
        stage: &'a str,
        owner_id: u32,
    }

    #[derive(Serialize)]
    struct DealFilterReordered<'a> {
        owner_id: u32,
        stage: &'a str,
    }

    #[test]
    fn test_key_includes_name_and_params() {
        let key = query_key("deals", &json!({"stage": "won"})).unwrap();
        assert_eq!(key, r#"deals:{"stage":"won"}"#);
    }

    #[test]
    fn test_key_independent_of_field_order() {
        let a = query_key("deals", &DealFilter { stage: "won", owner_id: 7 }).unwrap();
        let b = query_key("deals", &DealFilterReordered { owner_id: 7, stage: "won" }).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_from_map_is_stable() {
        let mut params = HashMap::new();
        params.insert("b", 2);
        params.insert("a", 1);
        params.insert("c", 3);

        assert_eq!(query_key("q", &params).unwrap(), r#"q:{"a":1,"b":2,"c":3}"#);
    }

    #[test]
    fn test_key_without_params() {
        assert_eq!(query_key("pipelines", &()).unwrap(), "pipelines:null");
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(matches!(query_key("", &()), Err(QueryError::InvalidKey(_))));
    }
}
