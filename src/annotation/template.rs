//! Templated field names.
//!
//! A field entry may carry an `expression` such as `{{ dynamicFieldName }}`. At
//! construction the expression is rendered once against the caller's
//! [`TemplateSpec`] and the result becomes the stored field name. Only plain
//! variable substitution is supported.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Variables available to field expressions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateSpec {
    /// Variable name to value
    #[serde(default)]
    pub variables: IndexMap<String, Value>,
}

impl TemplateSpec {
    /// Create an empty spec
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Render `expression`, returning the name of the first undefined variable on failure
    pub fn render(&self, expression: &str) -> Result<String, String> {
        let mut output = String::with_capacity(expression.len());
        let mut rest = expression;

        while let Some(start) = rest.find("{{") {
            output.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                // Unterminated placeholder is literal text
                output.push_str(&rest[start..]);
                return Ok(output);
            };

            let variable = after[..end].trim();
            match self.variables.get(variable) {
                Some(Value::String(s)) => output.push_str(s),
                Some(other) => output.push_str(&other.to_string()),
                None => return Err(variable.to_string()),
            }
            rest = &after[end + 2..];
        }

        output.push_str(rest);
        Ok(output)
    }
}
