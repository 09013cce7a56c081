use std::collections::BTreeMap;

use serde::Serialize;

/// Field name to messages, in the shape the form templates expect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

/// Result of submitting a form: either the saved record, or the original
/// input handed back for redisplay together with what was wrong with it.
#[derive(Debug)]
pub enum FormOutcome<T, F> {
    Saved(T),
    Invalid(F, FormErrors),
}

pub const REQUIRED_FIELD: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";
