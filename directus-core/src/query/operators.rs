// src/query/operators.rs
//! Filter operator catalog
//!
//! Every operator the Directus filter grammar understands is declared exactly
//! once in the `operator_catalog!` table below. The table generates:
//!
//! - an associated constant on [`Operator`] (`Operator::CONTAINS`, ...)
//! - the ordered [`CATALOG`] slice used for lookups
//! - one chainable method per field operator on [`ConditionBuilder`]
//!
//! # Architecture
//!
//! ```text
//! operator_catalog! table
//!     ↓
//! ┌────────────────┬──────────────────────┬──────────────────────┐
//! │ Operator consts│ CATALOG / resolve()  │ ConditionBuilder::*  │
//! │ (wire symbol,  │ (name + symbol maps) │ (eq, gte, in_, ...)  │
//! │  SQL template) │                      │                      │
//! └────────────────┴──────────────────────┴──────────────────────┘
//! ```
//!
//! Adding an operator means adding one row; the tree and the serializers
//! only ever look at the row's symbol and [`SqlTemplate`].

use lazy_static::lazy_static;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use super::builder::ConditionBuilder;

/// Operator families as documented by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorCategory {
    Equality,
    Comparison,
    Range,
    String,
    Array,
    Logical,
    Geometric,
    Special,
}

impl OperatorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatorCategory::Equality => "equality",
            OperatorCategory::Comparison => "comparison",
            OperatorCategory::Range => "range",
            OperatorCategory::String => "string",
            OperatorCategory::Array => "array",
            OperatorCategory::Logical => "logical",
            OperatorCategory::Geometric => "geometric",
            OperatorCategory::Special => "special",
        }
    }
}

/// Where the `%` wildcards go when a string operator renders as `LIKE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wildcard {
    /// `%value%`
    Both,
    /// `value%`
    Suffix,
    /// `%value`
    Prefix,
}

impl Wildcard {
    pub fn pattern(&self, text: &str) -> String {
        match self {
            Wildcard::Both => format!("%{}%", text),
            Wildcard::Suffix => format!("{}%", text),
            Wildcard::Prefix => format!("%{}", text),
        }
    }
}

/// SQL fragment template used by the explanation renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlTemplate {
    /// `<field> <op> <literal>`
    Binary(&'static str),
    /// `<field> LIKE '<pattern>'`
    Like(Wildcard),
    /// `<field> BETWEEN <a> AND <b>`, value must be a pair
    Between,
    /// `<field> <op> (<v1>, <v2>, ...)`, value must be a list
    List(&'static str),
    /// `<field> <predicate>`, value is not rendered
    Predicate(&'static str),
    /// Joins sibling clauses; never rendered against a field
    Junction(&'static str),
}

/// A single filter operator: fluent name, wire symbol, family and SQL shape
#[derive(Debug, PartialEq, Eq)]
pub struct Operator {
    pub name: &'static str,
    pub symbol: &'static str,
    pub category: OperatorCategory,
    pub sql: SqlTemplate,
}

impl Operator {
    pub const AND: Operator = Operator {
        name: "and",
        symbol: "_and",
        category: OperatorCategory::Logical,
        sql: SqlTemplate::Junction(" AND "),
    };

    pub const OR: Operator = Operator {
        name: "or",
        symbol: "_or",
        category: OperatorCategory::Logical,
        sql: SqlTemplate::Junction(" OR "),
    };

    pub fn is_logical(&self) -> bool {
        self.category == OperatorCategory::Logical
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol)
    }
}

macro_rules! operator_catalog {
    ($( $konst:ident, $method:ident, $name:literal, $symbol:literal, $category:ident, $sql:expr; )*) => {
        impl Operator {
            $(
                pub const $konst: Operator = Operator {
                    name: $name,
                    symbol: $symbol,
                    category: OperatorCategory::$category,
                    sql: $sql,
                };
            )*
        }

        /// Every operator in declaration order, logical combinators last
        pub static CATALOG: &[&Operator] = &[
            $( &Operator::$konst, )*
            &Operator::AND,
            &Operator::OR,
        ];

        impl<'q> ConditionBuilder<'q> {
            $(
                #[doc = concat!("Apply `", $symbol, "` to this field (overwrites an earlier `", $symbol, "`)")]
                pub fn $method(self, value: impl Into<Value>) -> Self {
                    self.apply_operator(&Operator::$konst, value)
                }
            )*
        }
    };
}

operator_catalog! {
    EQ, eq, "eq", "_eq", Equality, SqlTemplate::Binary("=");
    NEQ, neq, "neq", "_neq", Equality, SqlTemplate::Binary("<>");

    LT, lt, "lt", "_lt", Comparison, SqlTemplate::Binary("<");
    LTE, lte, "lte", "_lte", Comparison, SqlTemplate::Binary("<=");
    GT, gt, "gt", "_gt", Comparison, SqlTemplate::Binary(">");
    GTE, gte, "gte", "_gte", Comparison, SqlTemplate::Binary(">=");

    IN, in_, "in", "_in", Array, SqlTemplate::List("IN");
    NIN, nin, "nin", "_nin", Array, SqlTemplate::List("NOT IN");

    NULL, null, "null", "_null", Special, SqlTemplate::Predicate("IS NULL");
    NNULL, nnull, "nnull", "_nnull", Special, SqlTemplate::Predicate("IS NOT NULL");
    EMPTY, empty, "empty", "_empty", Special, SqlTemplate::Predicate("IS NULL");
    NEMPTY, nempty, "nempty", "_nempty", Special, SqlTemplate::Predicate("IS NOT NULL");

    CONTAINS, contains, "contains", "_contains", String, SqlTemplate::Like(Wildcard::Both);
    ICONTAINS, icontains, "icontains", "_icontains", String, SqlTemplate::Like(Wildcard::Both);
    NCONTAINS, ncontains, "ncontains", "_ncontains", String, SqlTemplate::Like(Wildcard::Both);
    STARTS_WITH, starts_with, "starts_with", "_starts_with", String, SqlTemplate::Like(Wildcard::Suffix);
    ISTARTS_WITH, istarts_with, "istarts_with", "_istarts_with", String, SqlTemplate::Like(Wildcard::Suffix);
    NSTARTS_WITH, nstarts_with, "nstarts_with", "_nstarts_with", String, SqlTemplate::Like(Wildcard::Suffix);
    NISTARTS_WITH, nistarts_with, "nistarts_with", "_nistarts_with", String, SqlTemplate::Like(Wildcard::Suffix);
    ENDS_WITH, ends_with, "ends_with", "_ends_with", String, SqlTemplate::Like(Wildcard::Prefix);
    IENDS_WITH, iends_with, "iends_with", "_iends_with", String, SqlTemplate::Like(Wildcard::Prefix);
    NENDS_WITH, nends_with, "nends_with", "_nends_with", String, SqlTemplate::Like(Wildcard::Prefix);
    NIENDS_WITH, niends_with, "niends_with", "_niends_with", String, SqlTemplate::Like(Wildcard::Prefix);

    BETWEEN, between, "between", "_between", Range, SqlTemplate::Between;
    NBETWEEN, nbetween, "nbetween", "_nbetween", Range, SqlTemplate::Between;

    INTERSECTS, intersects, "intersects", "_intersects", Geometric, SqlTemplate::Binary("INTERSECTS");
    NINTERSECTS, nintersects, "nintersects", "_nintersects", Geometric, SqlTemplate::Binary("NOT INTERSECTS");
    INTERSECTS_BBOX, intersects_bbox, "intersects_bbox", "_intersects_bbox", Geometric, SqlTemplate::Binary("INTERSECTS_BBOX");
    NINTERSECTS_BBOX, nintersects_bbox, "nintersects_bbox", "_nintersects_bbox", Geometric, SqlTemplate::Binary("NOT INTERSECTS_BBOX");

    REGEX, regex, "regex", "_regex", Special, SqlTemplate::Binary("REGEX");
}

lazy_static! {
    static ref BY_NAME: HashMap<&'static str, &'static Operator> =
        CATALOG.iter().map(|op| (op.name, *op)).collect();
    static ref BY_SYMBOL: HashMap<&'static str, &'static Operator> =
        CATALOG.iter().map(|op| (op.symbol, *op)).collect();
}

/// Look up an operator by its fluent name
///
/// A trailing underscore is ignored so the method spelling (`in_`, `and_`)
/// resolves the same as the bare name.
pub fn resolve(name: &str) -> Option<&'static Operator> {
    BY_NAME.get(name.trim_end_matches('_')).copied()
}

/// Look up an operator by its wire symbol (`_contains`)
pub fn resolve_symbol(symbol: &str) -> Option<&'static Operator> {
    BY_SYMBOL.get(symbol).copied()
}

/// Field operators in catalog order (logical combinators excluded)
pub fn all_operators() -> Vec<&'static Operator> {
    CATALOG.iter().copied().filter(|op| !op.is_logical()).collect()
}

/// SQL template for a wire symbol, if the symbol is known
pub fn sql_template(symbol: &str) -> Option<SqlTemplate> {
    resolve_symbol(symbol).map(|op| op.sql)
}

/// The two boolean combinators of the filter grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Logical {
    And,
    Or,
}

impl Logical {
    pub fn operator(&self) -> &'static Operator {
        match self {
            Logical::And => &Operator::AND,
            Logical::Or => &Operator::OR,
        }
    }

    pub fn symbol(&self) -> &'static str {
        self.operator().symbol
    }

    /// Separator placed between sibling clauses in SQL text
    pub fn joiner(&self) -> &'static str {
        match self.operator().sql {
            SqlTemplate::Junction(joiner) => joiner,
            _ => " AND ",
        }
    }
}
