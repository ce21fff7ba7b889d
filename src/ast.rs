use std::fmt;

use serde::{Deserialize, Serialize};

use crate::token::Token;

/// A leaf value: a literal from the expression or the result of a variable lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Str(String),
    #[default]
    Absent,
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Text substituted for `$key$` in templates. `Absent` has none.
    pub fn replacement(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(b.to_string()),
            Value::Str(s) => Some(s.clone()),
            Value::Absent => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Absent => f.write_str("null"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Leaf(Value),
    Operator(OperatorNode),
}

/// An operator with children that may still be missing while the tree is
/// being built. `Not` only ever uses `right`.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorNode {
    pub operator: Operator,
    pub left: Option<Box<Expression>>,
    pub right: Option<Box<Expression>>,
}

impl Expression {
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    pub fn not() -> Self {
        Expression::Operator(OperatorNode {
            operator: Operator::Not,
            left: None,
            right: None,
        })
    }

    pub fn binary(operator: Operator, left: Option<Expression>) -> Self {
        Expression::Operator(OperatorNode {
            operator,
            left: left.map(Expression::boxed),
            right: None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
    Equals,
    NotEquals,
    Not,
}

impl Operator {
    pub fn token(token: Token) -> Self {
        match token {
            Token::And => Self::And,
            Token::Or => Self::Or,
            Token::Equals => Self::Equals,
            Token::NotEquals => Self::NotEquals,
            Token::Bang => Self::Not,
            _ => unreachable!("{:?}", token),
        }
    }
}
