use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::classify::semantic::ColumnClass;
use crate::schema::types::SchemaRegistry;

/// An exact-name classification rule.
struct NameRule {
    names: &'static [&'static str],
    class: ColumnClass,
}

/// Exact-name rules, checked in order before the temporal pattern.
static NAME_RULES: &[NameRule] = &[
    NameRule {
        names: &[
            "id",
            "user_id",
            "product_id",
            "order_id",
            "category_id",
            "department_id",
            "project_id",
            "assignee_id",
            "manager_id",
            "warehouse_id",
            "account_id",
            "entity_id",
            "parent_id",
        ],
        class: ColumnClass::Identifier,
    },
    NameRule {
        names: &["age", "quantity", "stock", "priority"],
        class: ColumnClass::BoundedInteger,
    },
    NameRule {
        names: &["price", "total", "amount", "salary", "budget"],
        class: ColumnClass::Currency,
    },
    NameRule {
        names: &["rating"],
        class: ColumnClass::Rating,
    },
    NameRule {
        names: &["status"],
        class: ColumnClass::Status,
    },
    NameRule {
        names: &["method"],
        class: ColumnClass::PaymentMethod,
    },
    NameRule {
        names: &["level"],
        class: ColumnClass::LogLevel,
    },
    NameRule {
        names: &["type"],
        class: ColumnClass::EntityType,
    },
    NameRule {
        names: &["country", "city"],
        class: ColumnClass::Locale,
    },
    NameRule {
        names: &["read", "paid"],
        class: ColumnClass::Boolean,
    },
];

/// Substring match for date-ish names (`due_date`, `created_at`, ...).
/// Any name containing "at" qualifies once the exact rules above have missed.
static TEMPORAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"date|at").unwrap());

/// Classify a column by its name.
pub fn classify_column(column_name: &str) -> ColumnClass {
    for rule in NAME_RULES {
        if rule.names.contains(&column_name) {
            return rule.class;
        }
    }

    if TEMPORAL_PATTERN.is_match(&column_name.to_lowercase()) {
        return ColumnClass::Temporal;
    }

    ColumnClass::GenericString
}

/// Bounded integers that still sum meaningfully. Age, stock and priority
/// aggregate with COUNT only.
static ADDITIVE_COUNTS: &[&str] = &["quantity"];

/// Whether SUM/AVG/MIN/MAX are meaningful over `column_name`: money
/// columns plus additive counts.
pub fn is_additive_column(column_name: &str) -> bool {
    classify_column(column_name).is_additive_measure() || ADDITIVE_COUNTS.contains(&column_name)
}

/// Classify every column of every registered table, keyed by (table, column).
pub fn classify_registry(registry: &SchemaRegistry) -> IndexMap<(String, String), ColumnClass> {
    let mut out = IndexMap::new();
    for table in registry.tables() {
        for col in &table.columns {
            out.insert(
                (table.name.clone(), col.clone()),
                classify_column(col),
            );
        }
    }
    out
}
