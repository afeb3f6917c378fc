//! Filter clause tools
//!
//! Each tool handles one part of a filter description:
//!
//! - `OperatorClauseTool`: comparison algebra and operator tests
//! - `WhereClauseTool`: boolean matching of records
//! - `OrderClauseTool`: multi-key in-place sorting
//! - `SliceClauseTool`: skip/limit pagination
//! - `FieldsClauseTool`: field projection keeping the primary key
//! - `IncludeClauseTool`: include normalization and relation dispatch
//!
//! # Typical composition
//!
//! where → order → slice → include → fields, so inclusion still sees foreign
//! keys that a projection would drop.

mod errors;
mod fields;
mod filter;
mod include;
mod operators;
mod order;
mod patterns;
mod slice;
mod value;
mod where_clause;

pub use errors::{describe_optional, describe_value, FilterError, FilterErrorCode, FilterResult};
pub use fields::{FieldsClause, FieldsClauseTool};
pub use filter::FilterClause;
pub use include::{IncludeClause, IncludeClauseTool, Inclusion, DEFAULT_MAX_INCLUDE_DEPTH};
pub use operators::{Operand, Operator, OperatorClause, OperatorClauseTool};
pub use order::{OrderClause, OrderClauseTool, SortDirection, SortKey};
pub use patterns::{like_to_regexp, string_to_regexp};
pub use slice::SliceClauseTool;
pub use value::{get_value_by_path, is_digit_string, to_number};
pub use where_clause::{Condition, Matcher, WhereClause, WhereClauseTool, WherePredicate};
