//! Evaluation of condition expressions against template variables.
//!
//! Operators combine two booleans the usual way and compare two strings for
//! equality. Every other combination, including a missing operand, yields
//! `false` instead of an error.

use tracing::debug;

use crate::ast::{Expression, Operator, OperatorNode, Value};
use crate::parser::{parse, ParseError};
use crate::token::lex;
use crate::variables::VariableProvider;

/// How `!=` treats two strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// String `!=` tests equality, exactly like `==`. Existing templates
    /// depend on this.
    #[default]
    Compatible,
    /// String `!=` is the negation of `==`.
    Strict,
}

impl Expression {
    pub fn value(&self, dialect: Dialect) -> Value {
        match self {
            Expression::Leaf(value) => value.clone(),
            Expression::Operator(node) => node.value(dialect),
        }
    }
}

impl OperatorNode {
    fn value(&self, dialect: Dialect) -> Value {
        let right = operand(&self.right, dialect);
        if self.operator == Operator::Not {
            return Value::Bool(matches!(right, Value::Bool(false)));
        }
        let left = operand(&self.left, dialect);
        let result = match (left, right) {
            (Value::Bool(l), Value::Bool(r)) => match self.operator {
                Operator::And => l && r,
                Operator::Or => l || r,
                Operator::Equals => l == r,
                Operator::NotEquals => l != r,
                Operator::Not => false,
            },
            (Value::Str(l), Value::Str(r)) => match (self.operator, dialect) {
                (Operator::Equals, _) | (Operator::NotEquals, Dialect::Compatible) => l == r,
                (Operator::NotEquals, Dialect::Strict) => l != r,
                _ => false,
            },
            _ => false,
        };
        Value::Bool(result)
    }
}

fn operand(child: &Option<Box<Expression>>, dialect: Dialect) -> Value {
    child
        .as_ref()
        .map_or(Value::Bool(false), |expression| expression.value(dialect))
}

/// Evaluates preprocessor conditions such as `!a || (b=="2" && c)`.
///
/// Each call parses from scratch, so one evaluator can be reused for any
/// number of expressions.
pub struct Evaluator<P> {
    provider: P,
    dialect: Dialect,
}

impl<P: VariableProvider> Evaluator<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            dialect: Dialect::default(),
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn set_provider(&mut self, provider: P) {
        self.provider = provider;
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Parses `expression` and evaluates it. Empty input and non-boolean
    /// results are `false`.
    pub fn parse_and_evaluate(&mut self, expression: &str) -> Result<bool, ParseError> {
        let tree = parse(lex(expression), &self.provider)?;
        Ok(tree
            .map(|tree| tree.value(self.dialect))
            .and_then(|value| value.as_bool())
            .unwrap_or(false))
    }

    /// Like [`Evaluator::parse_and_evaluate`], but a malformed expression is
    /// simply `false`.
    pub fn evaluate_or_false(&mut self, expression: &str) -> bool {
        self.parse_and_evaluate(expression).unwrap_or_else(|error| {
            debug!(%expression, %error, "condition treated as false");
            false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::Variables;
    use rstest::{fixture, rstest};

    #[fixture]
    fn evaluator() -> Evaluator<Variables> {
        let variables = Variables::from_iter([
            ("a", Value::Bool(false)),
            ("b", Value::from("3")),
            ("c", Value::Bool(true)),
            ("two", Value::from("2")),
            ("yes", Value::Bool(true)),
            ("x", Value::from("hello")),
            ("größe", Value::Bool(true)),
        ]);
        Evaluator::new(variables)
    }

    #[rstest]
    #[case("true", true)]
    #[case("false", false)]
    #[case("TRUE", true)]
    #[case("False", false)]
    #[case("", false)]
    fn evaluates_literals(mut evaluator: Evaluator<Variables>, #[case] input: &str, #[case] expected: bool) {
        assert_eq!(evaluator.parse_and_evaluate(input), Ok(expected));
    }

    #[rstest]
    #[case(r#"!a || (b=="2" && c)"#, true)]
    #[case(r#"two=="2""#, true)]
    #[case(r#"two=="3""#, false)]
    #[case("!yes", false)]
    #[case("!a", true)]
    #[case("!x", false)]
    #[case("!!yes", true)]
    #[case("true && false || true", true)]
    #[case("false || true && false", false)]
    #[case("false || (true && false)", false)]
    #[case("yes == c", true)]
    #[case("yes != a", true)]
    #[case("x == yes", false)]
    #[case("x && x", false)]
    #[case("missing", false)]
    #[case("!missing", false)]
    #[case("x", false)]
    #[case("true &&", false)]
    #[case("!", true)]
    #[case("größe", true)]
    #[case("!größe", false)]
    #[case("größe && c", true)]
    #[case("!é", false)]
    fn evaluates_expressions(
        mut evaluator: Evaluator<Variables>,
        #[case] input: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(evaluator.parse_and_evaluate(input), Ok(expected));
    }

    #[rstest]
    fn string_inequality_matches_equality_by_default(mut evaluator: Evaluator<Variables>) {
        assert_eq!(evaluator.parse_and_evaluate(r#"two!="3""#), Ok(false));
        assert_eq!(evaluator.parse_and_evaluate(r#"two!="2""#), Ok(true));
    }

    #[rstest]
    fn strict_dialect_negates_string_inequality(evaluator: Evaluator<Variables>) {
        let mut evaluator = evaluator.with_dialect(Dialect::Strict);
        assert_eq!(evaluator.parse_and_evaluate(r#"two!="3""#), Ok(true));
        assert_eq!(evaluator.parse_and_evaluate(r#"two!="2""#), Ok(false));
        assert_eq!(evaluator.parse_and_evaluate(r#"two=="2""#), Ok(true));
    }

    #[rstest]
    fn unterminated_string_returns_control(mut evaluator: Evaluator<Variables>) {
        assert_eq!(
            evaluator.parse_and_evaluate("a==\"open"),
            Err(ParseError::UnterminatedString)
        );
        assert!(!evaluator.evaluate_or_false("a==\"open"));
    }

    #[rstest]
    fn malformed_input_defaults_to_false(mut evaluator: Evaluator<Variables>) {
        assert!(!evaluator.evaluate_or_false("true)"));
        assert!(!evaluator.evaluate_or_false("true true"));
    }

    #[rstest]
    fn calls_do_not_share_state(mut evaluator: Evaluator<Variables>) {
        assert_eq!(evaluator.parse_and_evaluate("(true && (false"), Ok(false));
        assert_eq!(evaluator.parse_and_evaluate("true"), Ok(true));
        assert!(!evaluator.evaluate_or_false("true)"));
        assert_eq!(evaluator.parse_and_evaluate("c"), Ok(true));
    }

    #[test]
    fn provider_can_be_replaced() {
        let mut evaluator = Evaluator::new(Variables::from_iter([("flag", true)]));
        assert_eq!(evaluator.parse_and_evaluate("flag"), Ok(true));
        evaluator.set_provider(Variables::from_iter([("flag", false)]));
        assert_eq!(evaluator.parse_and_evaluate("flag"), Ok(false));
    }

    #[test]
    fn closure_provider() {
        let mut evaluator = Evaluator::new(|name: &str| Value::Bool(name.starts_with("on")));
        assert_eq!(evaluator.parse_and_evaluate("online && !offline"), Ok(true));
    }
}
