//! The built-in commerce/HR schema that queries are composed from when
//! `querysim.toml` does not supply a `[schema]` section.

use crate::schema::types::{JoinEdge, SchemaRegistry};

/// Built-in tables with their ordered column sets.
static BUILTIN_TABLES: &[(&str, &[&str])] = &[
    (
        "users",
        &[
            "id",
            "name",
            "email",
            "age",
            "created_at",
            "status",
            "country",
        ],
    ),
    (
        "orders",
        &[
            "id",
            "user_id",
            "product_id",
            "quantity",
            "total",
            "created_at",
            "status",
        ],
    ),
    (
        "products",
        &[
            "id",
            "name",
            "category_id",
            "price",
            "stock",
            "created_at",
            "rating",
        ],
    ),
    (
        "payments",
        &["id", "order_id", "amount", "method", "status", "paid_at"],
    ),
    (
        "reviews",
        &[
            "id",
            "user_id",
            "product_id",
            "rating",
            "comment",
            "created_at",
        ],
    ),
    ("categories", &["id", "name", "parent_id", "description"]),
    (
        "inventory",
        &[
            "id",
            "product_id",
            "warehouse_id",
            "quantity",
            "updated_at",
        ],
    ),
    (
        "shipping",
        &[
            "id",
            "order_id",
            "carrier",
            "tracking_number",
            "shipped_at",
            "delivered_at",
        ],
    ),
    (
        "suppliers",
        &["id", "name", "contact_email", "country", "rating"],
    ),
    (
        "employees",
        &[
            "id",
            "name",
            "department_id",
            "salary",
            "hire_date",
            "manager_id",
        ],
    ),
    (
        "customers",
        &[
            "id",
            "name",
            "email",
            "phone",
            "address",
            "city",
            "country",
        ],
    ),
    (
        "invoices",
        &[
            "id",
            "order_id",
            "amount",
            "due_date",
            "paid",
            "created_at",
        ],
    ),
    (
        "transactions",
        &[
            "id",
            "account_id",
            "type",
            "amount",
            "created_at",
            "status",
        ],
    ),
    (
        "sessions",
        &[
            "id",
            "user_id",
            "token",
            "ip_address",
            "created_at",
            "expires_at",
        ],
    ),
    (
        "logs",
        &["id", "level", "message", "source", "created_at"],
    ),
    (
        "departments",
        &["id", "name", "budget", "manager_id", "created_at"],
    ),
    (
        "projects",
        &[
            "id",
            "name",
            "department_id",
            "budget",
            "start_date",
            "end_date",
            "status",
        ],
    ),
    (
        "tasks",
        &[
            "id",
            "project_id",
            "assignee_id",
            "title",
            "status",
            "priority",
            "due_date",
        ],
    ),
    (
        "comments",
        &[
            "id",
            "user_id",
            "entity_id",
            "entity_type",
            "body",
            "created_at",
        ],
    ),
    (
        "notifications",
        &["id", "user_id", "type", "message", "read", "created_at"],
    ),
];

/// Built-in foreign keys: (child, child_column, parent, parent_column).
static BUILTIN_JOINS: &[(&str, &str, &str, &str)] = &[
    ("orders", "user_id", "users", "id"),
    ("orders", "product_id", "products", "id"),
    ("payments", "order_id", "orders", "id"),
    ("reviews", "user_id", "users", "id"),
    ("reviews", "product_id", "products", "id"),
    ("products", "category_id", "categories", "id"),
    ("inventory", "product_id", "products", "id"),
    ("shipping", "order_id", "orders", "id"),
    ("employees", "department_id", "departments", "id"),
    ("tasks", "project_id", "projects", "id"),
    ("tasks", "assignee_id", "employees", "id"),
    ("projects", "department_id", "departments", "id"),
    ("invoices", "order_id", "orders", "id"),
    ("sessions", "user_id", "users", "id"),
    ("comments", "user_id", "users", "id"),
    ("notifications", "user_id", "users", "id"),
];

/// Build the built-in registry.
pub fn builtin_registry() -> SchemaRegistry {
    let tables = BUILTIN_TABLES.iter().map(|(name, cols)| {
        (
            name.to_string(),
            cols.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
        )
    });
    let joins = BUILTIN_JOINS
        .iter()
        .map(|(c, cc, p, pc)| JoinEdge::new(c, cc, p, pc))
        .collect();
    SchemaRegistry::new(tables, joins).expect("built-in schema is internally consistent")
}
