//! # Feature Contract
//!
//! Maps a generated statement to the fixed 14-field numeric vector shared
//! with the model training and serving processes. The field order in
//! [`FEATURE_COLUMNS`] is the wire contract: reordering or renaming a field
//! requires bumping [`FEATURE_CONTRACT_VERSION`].

use serde::{Deserialize, Serialize};

use crate::error::{QuerySimError, Result};
use crate::generate::query::QueryMetadata;

pub const FEATURE_CONTRACT_VERSION: u32 = 1;

pub const FEATURE_COLUMNS: [&str; 14] = [
    "num_tables",
    "num_joins",
    "num_conditions",
    "num_subqueries",
    "has_wildcard",
    "has_order_by",
    "has_group_by",
    "has_having",
    "has_distinct",
    "has_limit",
    "num_where_columns",
    "num_order_columns",
    "num_group_columns",
    "query_length",
];

/// Fields encoded as 0/1.
pub const FLAG_COLUMNS: [&str; 6] = [
    "has_wildcard",
    "has_order_by",
    "has_group_by",
    "has_having",
    "has_distinct",
    "has_limit",
];

/// Structural features of one statement, in contract order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub num_tables: u32,
    pub num_joins: u32,
    pub num_conditions: u32,
    pub num_subqueries: u32,
    pub has_wildcard: u32,
    pub has_order_by: u32,
    pub has_group_by: u32,
    pub has_having: u32,
    pub has_distinct: u32,
    pub has_limit: u32,
    pub num_where_columns: u32,
    pub num_order_columns: u32,
    pub num_group_columns: u32,
    pub query_length: u32,
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn flag(b: bool) -> u32 {
    u32::from(b)
}

/// Extract the feature vector. Pure and deterministic.
pub fn extract_features(meta: &QueryMetadata) -> FeatureVector {
    FeatureVector {
        num_tables: count(meta.tables.len()),
        num_joins: count(meta.joins),
        num_conditions: count(meta.conditions),
        num_subqueries: count(meta.subqueries),
        has_wildcard: flag(meta.has_wildcard),
        has_order_by: flag(meta.has_order_by),
        has_group_by: flag(meta.has_group_by),
        has_having: flag(meta.has_having),
        has_distinct: flag(meta.has_distinct),
        has_limit: flag(meta.has_limit),
        num_where_columns: count(meta.where_columns.len()),
        num_order_columns: count(meta.order_by_columns.len()),
        num_group_columns: count(meta.group_by_columns.len()),
        query_length: count(meta.sql.chars().count()),
    }
}

impl FeatureVector {
    /// Values in [`FEATURE_COLUMNS`] order.
    pub fn to_array(&self) -> [u32; 14] {
        [
            self.num_tables,
            self.num_joins,
            self.num_conditions,
            self.num_subqueries,
            self.has_wildcard,
            self.has_order_by,
            self.has_group_by,
            self.has_having,
            self.has_distinct,
            self.has_limit,
            self.num_where_columns,
            self.num_order_columns,
            self.num_group_columns,
            self.query_length,
        ]
    }

    fn from_array(values: [u32; 14]) -> Self {
        let [
            num_tables,
            num_joins,
            num_conditions,
            num_subqueries,
            has_wildcard,
            has_order_by,
            has_group_by,
            has_having,
            has_distinct,
            has_limit,
            num_where_columns,
            num_order_columns,
            num_group_columns,
            query_length,
        ] = values;
        Self {
            num_tables,
            num_joins,
            num_conditions,
            num_subqueries,
            has_wildcard,
            has_order_by,
            has_group_by,
            has_having,
            has_distinct,
            has_limit,
            num_where_columns,
            num_order_columns,
            num_group_columns,
            query_length,
        }
    }

    /// `(name, value)` pairs in contract order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, u32)> {
        FEATURE_COLUMNS.into_iter().zip(self.to_array())
    }
}

/// Validate a serving request body against the feature contract.
///
/// The payload must be a JSON object with exactly the 14 contract fields,
/// each a non-negative integer; the flag fields must be 0 or 1.
pub fn validate_payload(payload: &serde_json::Value) -> Result<FeatureVector> {
    let obj = payload.as_object().ok_or_else(|| QuerySimError::InvalidPayload {
        message: "expected a JSON object".to_string(),
    })?;

    if let Some(unknown) = obj.keys().find(|k| !FEATURE_COLUMNS.contains(&k.as_str())) {
        return Err(QuerySimError::InvalidPayload {
            message: format!("unknown field '{}'", unknown),
        });
    }

    let mut values = [0u32; 14];
    for (slot, name) in values.iter_mut().zip(FEATURE_COLUMNS) {
        let raw = obj.get(name).ok_or_else(|| QuerySimError::InvalidPayload {
            message: format!("missing field '{}'", name),
        })?;
        let n = raw
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| QuerySimError::InvalidPayload {
                message: format!("field '{}' must be a non-negative integer, got {}", name, raw),
            })?;
        if FLAG_COLUMNS.contains(&name) && n > 1 {
            return Err(QuerySimError::InvalidPayload {
                message: format!("field '{}' is a flag and must be 0 or 1, got {}", name, n),
            });
        }
        *slot = n;
    }

    Ok(FeatureVector::from_array(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::query::Pattern;
    use serde_json::json;

    fn sample() -> QueryMetadata {
        let mut meta = QueryMetadata::bare(
            Pattern::SelectWhereOrder,
            "SELECT * FROM users WHERE users.age > 3 ORDER BY users.id ASC;".to_string(),
            vec!["users".to_string()],
        );
        meta.has_wildcard = true;
        meta.has_order_by = true;
        meta.conditions = 1;
        meta.where_columns = vec!["age".to_string()];
        meta.order_by_columns = vec!["id".to_string()];
        meta
    }

    fn full_payload() -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for name in FEATURE_COLUMNS {
            map.insert(name.to_string(), json!(0));
        }
        serde_json::Value::Object(map)
    }

    #[test]
    fn test_extract_matches_metadata() {
        let meta = sample();
        let fv = extract_features(&meta);
        assert_eq!(fv.num_tables, 1);
        assert_eq!(fv.num_conditions, 1);
        assert_eq!(fv.has_wildcard, 1);
        assert_eq!(fv.has_order_by, 1);
        assert_eq!(fv.has_limit, 0);
        assert_eq!(fv.num_order_columns, 1);
        assert_eq!(fv.query_length as usize, meta.sql.len());
    }

    #[test]
    fn test_serialized_field_order_matches_contract() {
        let fv = extract_features(&sample());
        let json = serde_json::to_value(fv).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        let mut sorted_contract = FEATURE_COLUMNS.to_vec();
        sorted_contract.sort();
        let mut sorted_keys = keys.clone();
        sorted_keys.sort();
        assert_eq!(sorted_keys, sorted_contract);

        let names: Vec<&str> = fv.named().map(|(n, _)| n).collect();
        assert_eq!(names, FEATURE_COLUMNS.to_vec());
    }

    #[test]
    fn test_payload_round_trip() {
        let fv = extract_features(&sample());
        let payload = serde_json::to_value(fv).unwrap();
        assert_eq!(validate_payload(&payload).unwrap(), fv);
    }

    #[test]
    fn test_payload_missing_field() {
        let mut payload = full_payload();
        payload.as_object_mut().unwrap().remove("query_length");
        let err = validate_payload(&payload).unwrap_err();
        assert!(format!("{}", err).contains("query_length"));
    }

    #[test]
    fn test_payload_unknown_field() {
        let mut payload = full_payload();
        payload
            .as_object_mut()
            .unwrap()
            .insert("num_unions".to_string(), json!(1));
        assert!(validate_payload(&payload).is_err());
    }

    #[test]
    fn test_payload_rejects_negative_and_fractional() {
        let mut payload = full_payload();
        payload["num_tables"] = json!(-1);
        assert!(validate_payload(&payload).is_err());
        payload["num_tables"] = json!(1.5);
        assert!(validate_payload(&payload).is_err());
    }

    #[test]
    fn test_payload_flag_bounds() {
        let mut payload = full_payload();
        payload["has_limit"] = json!(2);
        assert!(validate_payload(&payload).is_err());
        payload["has_limit"] = json!(1);
        payload["num_joins"] = json!(2);
        assert!(validate_payload(&payload).is_ok());
    }

    #[test]
    fn test_payload_must_be_object() {
        assert!(validate_payload(&json!([1, 2, 3])).is_err());
    }
}
