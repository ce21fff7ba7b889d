use rstest::rstest;

use template_preprocessor::{Dialect, Evaluator, ParseError, Value, Variables};

fn evaluator(pairs: &[(&str, Value)]) -> Evaluator<Variables> {
    Evaluator::new(pairs.iter().cloned().collect())
}

#[rstest]
#[case("true", true)]
#[case("false", false)]
#[case("TRUE", true)]
#[case("False", false)]
fn literals_ignore_case(#[case] input: &str, #[case] expected: bool) {
    assert_eq!(evaluator(&[]).parse_and_evaluate(input), Ok(expected));
}

#[test]
fn looks_up_variables() {
    let mut evaluator = evaluator(&[
        ("a", Value::Bool(false)),
        ("b", Value::from("3")),
        ("c", Value::Bool(true)),
    ]);
    assert_eq!(
        evaluator.parse_and_evaluate(r#"!a || (b=="2" && c)"#),
        Ok(true)
    );
}

#[rstest]
#[case(r#"b=="2""#, true)]
#[case(r#"b=="3""#, false)]
#[case(r#"b!="3""#, false)]
fn compares_strings(#[case] input: &str, #[case] expected: bool) {
    let mut evaluator = evaluator(&[("b", Value::from("2"))]);
    assert_eq!(evaluator.parse_and_evaluate(input), Ok(expected));
}

#[test]
fn strict_dialect_fixes_string_inequality() {
    let mut evaluator = evaluator(&[("b", Value::from("2"))]).with_dialect(Dialect::Strict);
    assert_eq!(evaluator.parse_and_evaluate(r#"b!="3""#), Ok(true));
}

#[test]
fn negation_needs_a_boolean() {
    let mut evaluator = evaluator(&[("a", Value::Bool(true)), ("x", Value::from("hello"))]);
    assert_eq!(evaluator.parse_and_evaluate("!a"), Ok(false));
    assert_eq!(evaluator.parse_and_evaluate("!x"), Ok(false));
}

#[test]
fn operators_apply_left_to_right() {
    let mut evaluator = evaluator(&[]);
    assert_eq!(evaluator.parse_and_evaluate("true && false || true"), Ok(true));
    assert_eq!(evaluator.parse_and_evaluate("true || true && false"), Ok(false));
    assert_eq!(evaluator.parse_and_evaluate("true || (true && false)"), Ok(true));
}

#[test]
fn unterminated_string_is_reported() {
    let mut evaluator = evaluator(&[("a", Value::from("open"))]);
    assert_eq!(
        evaluator.parse_and_evaluate("a==\"open"),
        Err(ParseError::UnterminatedString)
    );
    assert!(!evaluator.evaluate_or_false("a==\"open"));
}

#[test]
fn evaluator_is_reusable() {
    let mut evaluator = evaluator(&[("c", Value::Bool(true))]);
    assert!(!evaluator.evaluate_or_false("c)"));
    assert_eq!(evaluator.parse_and_evaluate("(c && (!c"), Ok(false));
    assert_eq!(evaluator.parse_and_evaluate("c"), Ok(true));
    assert_eq!(evaluator.parse_and_evaluate("!c"), Ok(false));
}
