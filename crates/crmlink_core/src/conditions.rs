//! Conditions, filters and the conditions-object compiler.
//!
//! A conditions object is a [`Map`] from attribute name to a shape that
//! selects the operator:
//!
//! | Shape | Condition |
//! |---|---|
//! | `null` | `null` |
//! | `"$notNull"` | `not-null` |
//! | any other scalar | `eq`, one value |
//! | array | `in`, every element |
//! | `{"$op": v}` | the operator for `$op`; `v` wrapped unless it is an array |

use crate::error::{CoreError, CoreResult};
use crmlink_codec::{Map, Value};
use std::fmt;
use tracing::warn;

/// Marker value compiled to a `not-null` condition.
pub const NOT_NULL: &str = "$notNull";

/// Comparison operator of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equal.
    Equal,
    /// Not equal.
    NotEqual,
    /// Greater than.
    GreaterThan,
    /// Greater than or equal.
    GreaterEqual,
    /// Less than or equal.
    LessEqual,
    /// Less than.
    LessThan,
    /// Pattern match.
    Like,
    /// Negated pattern match.
    NotLike,
    /// Member of a list.
    In,
    /// Not a member of a list.
    NotIn,
    /// Between two bounds.
    Between,
    /// Outside two bounds.
    NotBetween,
    /// No value.
    IsNull,
    /// Any value.
    IsNotNull,
}

/// Operator keys accepted in a conditions object, in match priority.
const OPERATOR_KEYS: [(&str, Operator); 12] = [
    ("$eq", Operator::Equal),
    ("$neq", Operator::NotEqual),
    ("$gt", Operator::GreaterThan),
    ("$ge", Operator::GreaterEqual),
    ("$le", Operator::LessEqual),
    ("$lt", Operator::LessThan),
    ("$like", Operator::Like),
    ("$notLike", Operator::NotLike),
    ("$in", Operator::In),
    ("$notIn", Operator::NotIn),
    ("$between", Operator::Between),
    ("$notBetween", Operator::NotBetween),
];

const ALL_OPERATORS: [Operator; 14] = [
    Operator::Equal,
    Operator::NotEqual,
    Operator::GreaterThan,
    Operator::GreaterEqual,
    Operator::LessEqual,
    Operator::LessThan,
    Operator::Like,
    Operator::NotLike,
    Operator::In,
    Operator::NotIn,
    Operator::Between,
    Operator::NotBetween,
    Operator::IsNull,
    Operator::IsNotNull,
];

impl Operator {
    /// Token used in query markup.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Equal => "eq",
            Self::NotEqual => "neq",
            Self::GreaterThan => "gt",
            Self::GreaterEqual => "ge",
            Self::LessEqual => "le",
            Self::LessThan => "lt",
            Self::Like => "like",
            Self::NotLike => "not-like",
            Self::In => "in",
            Self::NotIn => "not-in",
            Self::Between => "between",
            Self::NotBetween => "not-between",
            Self::IsNull => "null",
            Self::IsNotNull => "not-null",
        }
    }

    /// Parses a markup token.
    pub fn from_token(token: &str) -> Option<Self> {
        ALL_OPERATORS.into_iter().find(|op| op.token() == token)
    }

    /// Parses a conditions-object key such as `$gt`.
    pub fn from_key(key: &str) -> Option<Self> {
        OPERATOR_KEYS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, op)| *op)
    }

    /// True for operators that take no value.
    pub fn is_unary(&self) -> bool {
        matches!(self, Self::IsNull | Self::IsNotNull)
    }

    /// True for operators whose values are always written as a list.
    pub fn is_list(&self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// One restriction on an attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    attribute: String,
    operator: Operator,
    values: Vec<Value>,
}

impl Condition {
    /// Creates a condition.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `values` is empty and the operator
    /// needs values.
    pub fn new(
        attribute: impl Into<String>,
        operator: Operator,
        values: Vec<Value>,
    ) -> CoreResult<Self> {
        let attribute = attribute.into();
        if values.is_empty() && !operator.is_unary() {
            return Err(CoreError::validation(format!(
                "condition on '{attribute}' with operator '{operator}' needs at least one value"
            )));
        }
        Ok(Self {
            attribute,
            operator,
            values,
        })
    }

    /// `attribute = value`.
    pub fn equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            attribute: attribute.into(),
            operator: Operator::Equal,
            values: vec![value.into()],
        }
    }

    /// `attribute is null`.
    pub fn is_null(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            operator: Operator::IsNull,
            values: Vec::new(),
        }
    }

    /// `attribute is not null`.
    pub fn is_not_null(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            operator: Operator::IsNotNull,
            values: Vec::new(),
        }
    }

    /// Attribute name.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Operator.
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Values, empty only for unary operators.
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// How the conditions of a filter combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    /// All conditions hold.
    #[default]
    And,
    /// Any condition holds.
    Or,
}

impl FilterType {
    /// Token used in query markup.
    pub fn token(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }

    /// Parses a markup token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            _ => None,
        }
    }
}

/// A flat list of conditions and their combinator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    /// Combinator.
    pub filter_type: FilterType,
    /// Conditions in order.
    pub conditions: Vec<Condition>,
}

impl Filter {
    /// Creates an `and` filter.
    pub fn and(conditions: Vec<Condition>) -> Self {
        Self {
            filter_type: FilterType::And,
            conditions,
        }
    }

    /// Creates an `or` filter.
    pub fn or(conditions: Vec<Condition>) -> Self {
        Self {
            filter_type: FilterType::Or,
            conditions,
        }
    }

    /// Adds a condition.
    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    /// Number of conditions.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Returns true if there are no conditions.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Compiles a conditions object into an `and` filter.
///
/// Entries whose shape is not recognized are skipped with a warning.
///
/// # Errors
///
/// Returns a validation error for a list-valued entry with no elements.
pub fn compile(conditions: &Map) -> CoreResult<Filter> {
    let mut filter = Filter::default();
    for (attribute, value) in conditions {
        if let Some(condition) = compile_entry(attribute, value)? {
            filter.push(condition);
        }
    }
    Ok(filter)
}

fn compile_entry(attribute: &str, value: &Value) -> CoreResult<Option<Condition>> {
    let condition = match value {
        Value::Null => Condition::is_null(attribute),
        Value::Text(s) if s == NOT_NULL => Condition::is_not_null(attribute),
        Value::Array(items) => Condition::new(attribute, Operator::In, items.clone())?,
        Value::Map(object) => {
            let found = OPERATOR_KEYS
                .iter()
                .find_map(|(key, op)| object.get(key).map(|operand| (*op, operand)));
            match found {
                Some((_, Value::Null)) | None => {
                    warn!(attribute, "ignoring condition with unrecognized operator");
                    return Ok(None);
                }
                Some((op, Value::Array(items))) => Condition::new(attribute, op, items.clone())?,
                Some((op, operand)) => Condition::new(attribute, op, vec![operand.clone()])?,
            }
        }
        scalar => Condition::equal(attribute, scalar.clone()),
    };
    Ok(Some(condition))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_and_in() {
        let conditions = Map::new().with("x", 1).with("y", vec![1, 2]);
        let filter = compile(&conditions).unwrap();
        assert_eq!(filter.filter_type, FilterType::And);
        assert_eq!(
            filter.conditions,
            vec![
                Condition::new("x", Operator::Equal, vec![Value::from(1)]).unwrap(),
                Condition::new("y", Operator::In, vec![Value::from(1), Value::from(2)]).unwrap(),
            ]
        );
    }

    #[test]
    fn null_markers() {
        let conditions = Map::new().with("a", Value::Null).with("b", NOT_NULL);
        let filter = compile(&conditions).unwrap();
        assert_eq!(filter.conditions[0].operator(), Operator::IsNull);
        assert_eq!(filter.conditions[1].operator(), Operator::IsNotNull);
        assert!(filter.conditions[1].values().is_empty());
    }

    #[test]
    fn operator_objects() {
        let conditions = Map::new()
            .with("revenue", Map::new().with("$gt", 100))
            .with("name", Map::new().with("$notLike", "%corp%"))
            .with("age", Map::new().with("$between", vec![18, 65]))
            .with("code", Map::new().with("$notIn", 3));
        let filter = compile(&conditions).unwrap();
        let ops: Vec<_> = filter.conditions.iter().map(Condition::operator).collect();
        assert_eq!(
            ops,
            vec![
                Operator::GreaterThan,
                Operator::NotLike,
                Operator::Between,
                Operator::NotIn
            ]
        );
        assert_eq!(filter.conditions[2].values().len(), 2);
        assert_eq!(filter.conditions[3].values(), &[Value::from(3)]);
    }

    #[test]
    fn unrecognized_shapes_are_skipped() {
        let conditions = Map::new()
            .with("a", Map::new().with("$regex", "x"))
            .with("b", Map::new().with("$eq", Value::Null))
            .with("c", Map::new())
            .with("d", "ok");
        let filter = compile(&conditions).unwrap();
        assert_eq!(filter.len(), 1);
        assert_eq!(filter.conditions[0].attribute(), "d");
    }

    #[test]
    fn first_operator_in_table_order_wins() {
        let conditions = Map::new().with("a", Map::new().with("$lt", 5).with("$eq", 1));
        let filter = compile(&conditions).unwrap();
        assert_eq!(filter.conditions[0].operator(), Operator::Equal);
    }

    #[test]
    fn empty_list_is_invalid() {
        let conditions = Map::new().with("a", Vec::<Value>::new());
        assert!(compile(&conditions).unwrap_err().is_validation());
        assert!(Condition::new("a", Operator::Equal, vec![]).is_err());
        assert!(Condition::new("a", Operator::IsNull, vec![]).is_ok());
    }

    #[test]
    fn tokens() {
        for op in ALL_OPERATORS {
            assert_eq!(Operator::from_token(op.token()), Some(op));
        }
        assert_eq!(Operator::from_key("$notLike"), Some(Operator::NotLike));
        assert_eq!(Operator::from_key("$nope"), None);
        assert_eq!(FilterType::from_token("or"), Some(FilterType::Or));
    }

    #[test]
    fn empty_object_compiles_to_empty_filter() {
        assert!(compile(&Map::new()).unwrap().is_empty());
    }
}
