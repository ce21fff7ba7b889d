use tracing::trace;

use crate::evaluator::Evaluator;
use crate::variables::VariableProvider;

/// Tracks nested `if` / `else` / `endif` directives while a template is
/// processed. Body text is emitted only while every open condition holds.
pub struct ConditionStack<P> {
    evaluator: Evaluator<P>,
    entries: Vec<bool>,
}

impl<P: VariableProvider> ConditionStack<P> {
    pub fn new(evaluator: Evaluator<P>) -> Self {
        Self {
            evaluator,
            entries: Vec::new(),
        }
    }

    /// Handles one directive line with its leading `%` removed. Lines that are
    /// not `if`, `else` or `endif` are comments.
    pub fn process_line(&mut self, line: &str) {
        let line = line.trim();
        if let Some(expression) = line.strip_prefix("if") {
            let value = self.evaluator.evaluate_or_false(expression.trim());
            trace!(expression, value, depth = self.entries.len() + 1, "if");
            self.entries.push(value);
        } else if line.starts_with("else") {
            if let Some(top) = self.entries.last_mut() {
                *top = !*top;
            }
        } else if line.starts_with("endif") {
            self.entries.pop();
        }
    }

    pub fn current_state(&self) -> bool {
        self.entries.iter().all(|value| *value)
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn evaluator(&self) -> &Evaluator<P> {
        &self.evaluator
    }
}
