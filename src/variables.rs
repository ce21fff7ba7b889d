use std::collections::BTreeMap;
use std::fs::read_to_string;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ast::Value;

/// Resolves identifiers in conditions and `$key$` references in templates.
pub trait VariableProvider {
    fn value(&self, name: &str) -> Value;
}

impl<F> VariableProvider for F
where
    F: Fn(&str) -> Value,
{
    fn value(&self, name: &str) -> Value {
        self(name)
    }
}

/// Template option values keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variables {
    values: BTreeMap<String, Value>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a JSON object of `name: true | false | "text" | null`.
    pub fn from_json_file(path: &Path) -> Result<Self, VariableError> {
        let contents = read_to_string(path).map_err(|source| VariableError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Applies a `name=value` assignment. `true` and `false` (any case) are
    /// booleans, anything else is kept as text.
    pub fn parse_assignment(&mut self, assignment: &str) -> Result<(), VariableError> {
        let (name, value) = assignment
            .split_once('=')
            .ok_or_else(|| VariableError::Assignment(assignment.to_owned()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(VariableError::Assignment(assignment.to_owned()));
        }
        let value = if value.eq_ignore_ascii_case("true") {
            Value::Bool(true)
        } else if value.eq_ignore_ascii_case("false") {
            Value::Bool(false)
        } else {
            Value::Str(value.to_owned())
        };
        self.set(name, value);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl VariableProvider for Variables {
    fn value(&self, name: &str) -> Value {
        self.values.get(name).cloned().unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Error)]
pub enum VariableError {
    #[error("Expected `name=value`, got {0:?}.")]
    Assignment(String),
    #[error("Could not read variables from {path}.")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Variables file is not a JSON object of booleans, strings or nulls.")]
    Json(#[from] serde_json::Error),
}
