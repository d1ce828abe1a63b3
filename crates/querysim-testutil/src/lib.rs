use querysim_core::generate::engine::DatasetRecord;
use querysim_core::schema::types::{JoinEdge, SchemaRegistry};

fn table(name: &str, cols: &[&str]) -> (String, Vec<String>) {
    (
        name.to_string(),
        cols.iter().map(|c| c.to_string()).collect(),
    )
}

/// `a <- b <- c <- d`: a single chain, so every multi-join walks the path.
pub fn chain_schema() -> SchemaRegistry {
    SchemaRegistry::new(
        vec![
            table("a", &["id", "name", "created_at"]),
            table("b", &["id", "a_id", "amount", "status"]),
            table("c", &["id", "b_id", "quantity", "rating"]),
            table("d", &["id", "c_id", "is_active", "created_at"]),
        ],
        vec![
            JoinEdge::new("b", "a_id", "a", "id"),
            JoinEdge::new("c", "b_id", "b", "id"),
            JoinEdge::new("d", "c_id", "c", "id"),
        ],
    )
    .expect("chain fixture is valid")
}

/// A fact table referencing four dimensions.
pub fn star_schema() -> SchemaRegistry {
    SchemaRegistry::new(
        vec![
            table(
                "sales",
                &["id", "store_id", "product_id", "customer_id", "date_id", "total", "quantity"],
            ),
            table("stores", &["id", "name", "country"]),
            table("products", &["id", "name", "price", "category_id"]),
            table("customers", &["id", "email", "locale"]),
            table("dates", &["id", "created_at"]),
        ],
        vec![
            JoinEdge::new("sales", "store_id", "stores", "id"),
            JoinEdge::new("sales", "product_id", "products", "id"),
            JoinEdge::new("sales", "customer_id", "customers", "id"),
            JoinEdge::new("sales", "date_id", "dates", "id"),
        ],
    )
    .expect("star fixture is valid")
}

/// One joined pair plus two tables no edge touches.
pub fn isolated_schema() -> SchemaRegistry {
    SchemaRegistry::new(
        vec![
            table("users", &["id", "name", "status"]),
            table("orders", &["id", "user_id", "total"]),
            table("logs", &["id", "level", "message"]),
            table("audit", &["id", "entity_type", "created_at"]),
        ],
        vec![JoinEdge::new("orders", "user_id", "users", "id")],
    )
    .expect("isolated fixture is valid")
}

/// Tables only, no joins: valid only when join-driven patterns are weighted 0.
pub fn joinless_schema() -> SchemaRegistry {
    SchemaRegistry::new(
        vec![
            table("metrics", &["id", "value", "created_at"]),
            table("events", &["id", "type", "status"]),
        ],
        Vec::new(),
    )
    .expect("joinless fixture is valid")
}

/// Raw parts of a schema whose `categories` table references itself
/// through `parent_id`, next to an ordinary `products -> categories` edge.
pub fn self_referencing_parts() -> (Vec<(String, Vec<String>)>, Vec<JoinEdge>) {
    (
        vec![
            table("categories", &["id", "parent_id", "name"]),
            table("products", &["id", "category_id", "price"]),
        ],
        vec![
            JoinEdge::new("categories", "parent_id", "categories", "id"),
            JoinEdge::new("products", "category_id", "categories", "id"),
        ],
    )
}

/// Assert the structural invariants every record must satisfy, whatever
/// its pattern.
pub fn assert_record_invariants(record: &DatasetRecord, slow_threshold_ms: f64) {
    let f = &record.features;
    let sql = &record.sql;

    assert_eq!(
        f.query_length as usize,
        sql.chars().count(),
        "query_length mismatch: {}",
        sql
    );
    assert!(sql.starts_with("SELECT "), "{}", sql);
    assert!(sql.ends_with(';'), "{}", sql);
    assert!(f.num_tables >= 1, "{}", sql);

    assert_eq!(
        f.has_wildcard == 1,
        sql.starts_with("SELECT * "),
        "has_wildcard mismatch: {}",
        sql
    );
    assert_eq!(
        f.has_limit == 1,
        sql.contains(" LIMIT "),
        "has_limit mismatch: {}",
        sql
    );
    assert_eq!(f.has_order_by == 1, sql.contains(" ORDER BY "), "{}", sql);
    assert_eq!(f.has_group_by == 1, sql.contains(" GROUP BY "), "{}", sql);
    assert_eq!(f.has_having == 1, sql.contains(" HAVING "), "{}", sql);
    assert_eq!(f.has_distinct == 1, sql.starts_with("SELECT DISTINCT "), "{}", sql);
    assert_eq!(f.num_subqueries == 1, sql.contains("(SELECT "), "{}", sql);

    for flag in [
        f.has_wildcard,
        f.has_order_by,
        f.has_group_by,
        f.has_having,
        f.has_distinct,
        f.has_limit,
    ] {
        assert!(flag <= 1, "flag out of range: {}", sql);
    }

    assert!(
        record.execution_time_ms >= 1.0,
        "time below floor: {}",
        record.execution_time_ms
    );
    let cents = record.execution_time_ms * 100.0;
    assert!(
        (cents - cents.round()).abs() < 1e-6,
        "time not rounded to 2 decimals: {}",
        record.execution_time_ms
    );
    assert_eq!(
        record.is_slow,
        u8::from(record.execution_time_ms > slow_threshold_ms),
        "is_slow mismatch at {}",
        record.execution_time_ms
    );
}
