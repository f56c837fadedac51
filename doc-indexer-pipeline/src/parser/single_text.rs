//! Accumulator for the combined completion field.

use serde_json::Value;

use crate::config::SingleTextOp;

/// Collects selected content values into one space-separated string.
#[derive(Debug, Default)]
pub struct SingleTextAccumulator {
    text: String,
}

impl SingleTextAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value according to its policy; `None` values are ignored.
    pub fn add_value(&mut self, value: &Value, op: SingleTextOp) {
        if op == SingleTextOp::None {
            return;
        }
        self.text.push_str(&display_value(value));
        self.text.push(' ');
    }

    /// The accumulated text so far.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consume the accumulator, yielding the combined string.
    pub fn into_string(self) -> String {
        self.text
    }
}

/// Render a scalar the way it reads in a search box: strings unquoted,
/// numbers in their decimal form.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
