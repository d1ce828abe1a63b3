use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic class of a column, derived from its name alone.
///
/// Classification is table-independent: every `status` column is treated
/// identically regardless of which table it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnClass {
    /// Primary and foreign key ids.
    Identifier,
    /// Small counts: age, quantity, stock, priority.
    BoundedInteger,
    /// Money amounts.
    Currency,
    /// One-decimal star ratings.
    Rating,
    Status,
    PaymentMethod,
    LogLevel,
    EntityType,
    /// Country or city codes.
    Locale,
    Boolean,
    /// Dates and timestamps.
    Temporal,
    GenericString,
}

impl ColumnClass {
    /// Whether SUM/AVG/MIN/MAX are meaningful over every column of this
    /// class. Bounded integers are not: only some of them add up.
    pub fn is_additive_measure(self) -> bool {
        matches!(self, ColumnClass::Currency)
    }
}

impl fmt::Display for ColumnClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnClass::Identifier => "identifier",
            ColumnClass::BoundedInteger => "bounded_integer",
            ColumnClass::Currency => "currency",
            ColumnClass::Rating => "rating",
            ColumnClass::Status => "status",
            ColumnClass::PaymentMethod => "payment_method",
            ColumnClass::LogLevel => "log_level",
            ColumnClass::EntityType => "entity_type",
            ColumnClass::Locale => "locale",
            ColumnClass::Boolean => "boolean",
            ColumnClass::Temporal => "temporal",
            ColumnClass::GenericString => "generic_string",
        };
        f.write_str(s)
    }
}
