use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QuerySimError;
use crate::schema::types::JoinEdge;

/// The ten SQL shapes the generator can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    SimpleSelect,
    SelectWhere,
    SelectWhereOrder,
    SelectLimit,
    SelectJoin,
    SelectMultiJoin,
    SelectSubquery,
    SelectGroupBy,
    SelectHaving,
    SelectDistinct,
}

impl Pattern {
    pub const ALL: [Pattern; 10] = [
        Pattern::SimpleSelect,
        Pattern::SelectWhere,
        Pattern::SelectWhereOrder,
        Pattern::SelectLimit,
        Pattern::SelectJoin,
        Pattern::SelectMultiJoin,
        Pattern::SelectSubquery,
        Pattern::SelectGroupBy,
        Pattern::SelectHaving,
        Pattern::SelectDistinct,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Pattern::SimpleSelect => "simple_select",
            Pattern::SelectWhere => "select_where",
            Pattern::SelectWhereOrder => "select_where_order",
            Pattern::SelectLimit => "select_limit",
            Pattern::SelectJoin => "select_join",
            Pattern::SelectMultiJoin => "select_multi_join",
            Pattern::SelectSubquery => "select_subquery",
            Pattern::SelectGroupBy => "select_group_by",
            Pattern::SelectHaving => "select_having",
            Pattern::SelectDistinct => "select_distinct",
        }
    }

    /// Selection weight used when `querysim.toml` does not override it.
    pub fn default_weight(self) -> u32 {
        match self {
            Pattern::SimpleSelect => 15,
            Pattern::SelectWhere => 20,
            Pattern::SelectWhereOrder => 12,
            Pattern::SelectLimit => 8,
            Pattern::SelectJoin => 15,
            Pattern::SelectMultiJoin => 8,
            Pattern::SelectSubquery => 6,
            Pattern::SelectGroupBy => 8,
            Pattern::SelectHaving => 4,
            Pattern::SelectDistinct => 4,
        }
    }

    /// Patterns that cannot be composed without at least one join edge.
    pub fn requires_joins(self) -> bool {
        matches!(
            self,
            Pattern::SelectJoin | Pattern::SelectMultiJoin | Pattern::SelectSubquery
        )
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pattern {
    type Err = QuerySimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| QuerySimError::UnknownPattern {
                name: s.to_string(),
                known: Pattern::ALL
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Join,
    LeftJoin,
    InnerJoin,
}

impl JoinType {
    pub const ALL: [JoinType; 3] = [JoinType::Join, JoinType::LeftJoin, JoinType::InnerJoin];

    pub fn as_sql(self) -> &'static str {
        match self {
            JoinType::Join => "JOIN",
            JoinType::LeftJoin => "LEFT JOIN",
            JoinType::InnerJoin => "INNER JOIN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Shape parameters a pattern chose that are not part of the feature vector.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternDetail {
    Plain,
    Ordered {
        direction: SortDirection,
    },
    Limited {
        limit: u32,
    },
    Join {
        join_type: JoinType,
        edge: JoinEdge,
    },
    MultiJoin {
        /// Join count that was sampled; `QueryMetadata::joins` may be lower
        /// when the join tree could not be extended.
        target_joins: usize,
        edges: Vec<JoinEdge>,
    },
    Subquery {
        /// False when the outer table had no touching edge and an
        /// unrelated edge was used instead.
        correlated: bool,
        edge: JoinEdge,
    },
    Aggregate {
        aggregates: Vec<String>,
    },
    Having {
        aggregate: String,
        comparator: &'static str,
        threshold: u32,
    },
}

/// Structural description of one generated statement.
///
/// Every count and flag agrees with `sql`: `has_limit` is true exactly when
/// the text carries a LIMIT clause, `joins` equals the number of JOIN
/// clauses, and so on.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryMetadata {
    pub pattern: Pattern,
    pub sql: String,
    /// Tables referenced, in the order they enter the statement.
    pub tables: Vec<String>,
    pub joins: usize,
    pub conditions: usize,
    pub subqueries: usize,
    pub has_wildcard: bool,
    pub has_order_by: bool,
    pub has_group_by: bool,
    pub has_having: bool,
    pub has_distinct: bool,
    pub has_limit: bool,
    pub where_columns: Vec<String>,
    pub order_by_columns: Vec<String>,
    pub group_by_columns: Vec<String>,
    pub detail: PatternDetail,
}

impl QueryMetadata {
    /// Metadata with no clauses set; generators fill in what they emit.
    pub(crate) fn bare(pattern: Pattern, sql: String, tables: Vec<String>) -> Self {
        Self {
            pattern,
            sql,
            tables,
            joins: 0,
            conditions: 0,
            subqueries: 0,
            has_wildcard: false,
            has_order_by: false,
            has_group_by: false,
            has_having: false,
            has_distinct: false,
            has_limit: false,
            where_columns: Vec::new(),
            order_by_columns: Vec::new(),
            group_by_columns: Vec::new(),
            detail: PatternDetail::Plain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_names_round_trip() {
        for p in Pattern::ALL {
            assert_eq!(p.as_str().parse::<Pattern>().unwrap(), p);
        }
    }

    #[test]
    fn test_unknown_pattern_lists_known_names() {
        let err = "select_window".parse::<Pattern>().unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("select_window"));
        assert!(msg.contains("select_having"));
    }

    #[test]
    fn test_default_weights_sum() {
        let total: u32 = Pattern::ALL.iter().map(|p| p.default_weight()).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn test_serde_uses_snake_case_tags() {
        let json = serde_json::to_string(&Pattern::SelectMultiJoin).unwrap();
        assert_eq!(json, "\"select_multi_join\"");
    }
}
