use std::borrow::Cow;
use std::fmt;

use chrono::NaiveDate;
use rand::Rng;

use crate::classify::rules::classify_column;
use crate::classify::semantic::ColumnClass;

const STATUSES: &[&str] = &["active", "inactive", "pending", "completed", "cancelled"];
const PAYMENT_METHODS: &[&str] = &["credit_card", "paypal", "bank_transfer", "crypto"];
const LOG_LEVELS: &[&str] = &["INFO", "WARN", "ERROR", "DEBUG"];
const ENTITY_TYPES: &[&str] = &["credit", "debit", "refund", "transfer"];
const LOCALES: &[&str] = &["US", "UK", "DE", "FR", "JP", "IN", "BR", "AU"];

/// A literal embedded in a generated WHERE predicate.
///
/// `Text` uses `Cow<'static, str>` so vocabulary picks borrow from the
/// static tables above and only synthesized strings allocate.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    /// A float rendered with a fixed number of decimals.
    Decimal { value: f64, scale: usize },
    Text(Cow<'static, str>),
    Bool(bool),
    Date(NaiveDate),
}

impl Literal {
    /// Render as SQL source text.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Literal::Int(i) => i.to_string(),
            Literal::Decimal { value, scale } => format!("{:.*}", scale, value),
            Literal::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Literal::Bool(true) => "TRUE".to_string(),
            Literal::Bool(false) => "FALSE".to_string(),
            Literal::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql_literal())
    }
}

#[inline]
fn borrowed(s: &'static str) -> Literal {
    Literal::Text(Cow::Borrowed(s))
}

#[inline]
fn pick<R: Rng + ?Sized>(vocab: &'static [&'static str], rng: &mut R) -> Literal {
    borrowed(vocab[rng.random_range(0..vocab.len())])
}

/// Draw a literal plausible for a column of the given class.
pub fn synthesize<R: Rng + ?Sized>(class: ColumnClass, rng: &mut R) -> Literal {
    match class {
        ColumnClass::Identifier => Literal::Int(rng.random_range(1..=10_000)),
        ColumnClass::BoundedInteger => Literal::Int(rng.random_range(1..=100)),
        ColumnClass::Currency => Literal::Decimal {
            value: rng.random_range(10.0..=5000.0),
            scale: 2,
        },
        ColumnClass::Rating => Literal::Decimal {
            value: rng.random_range(1.0..=5.0),
            scale: 1,
        },
        ColumnClass::Status => pick(STATUSES, rng),
        ColumnClass::PaymentMethod => pick(PAYMENT_METHODS, rng),
        ColumnClass::LogLevel => pick(LOG_LEVELS, rng),
        ColumnClass::EntityType => pick(ENTITY_TYPES, rng),
        ColumnClass::Locale => pick(LOCALES, rng),
        ColumnClass::Boolean => Literal::Bool(rng.random_bool(0.5)),
        ColumnClass::Temporal => {
            let year = rng.random_range(2020..=2025);
            let month = rng.random_range(1..=12);
            let day = rng.random_range(1..=28);
            // Day is capped at 28 so every (year, month) pair is valid.
            Literal::Date(NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default())
        }
        ColumnClass::GenericString => {
            Literal::Text(Cow::Owned(format!("value_{}", rng.random_range(1..=999))))
        }
    }
}

/// Classify `column` by name and render a literal for it.
pub fn random_literal<R: Rng + ?Sized>(column: &str, rng: &mut R) -> String {
    synthesize(classify_column(column), rng).to_sql_literal()
}
