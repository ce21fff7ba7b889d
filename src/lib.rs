//! Conditional template preprocessing.
//!
//! Templates mark optional content with `%if <condition>` / `%else` /
//! `%endif` lines and reference option values as `$key$`. Conditions are
//! small boolean expressions over those values, for example
//! `!a || (b=="2" && c)`, evaluated strictly left to right.

pub mod ast;
pub mod control;
pub mod evaluator;
pub mod generator;
pub mod logging;
pub mod parser;
pub mod token;
pub mod variables;

pub use ast::{Expression, Operator, Value};
pub use control::ConditionStack;
pub use evaluator::{Dialect, Evaluator};
pub use generator::{ExpansionReport, GenerateError, Generator};
pub use parser::ParseError;
pub use variables::{VariableError, VariableProvider, Variables};
