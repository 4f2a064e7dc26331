use std::collections::BTreeMap;
use validator::ValidationErrors;

use crate::error::{AdminError, AdminResult};

/// Field values of one form plus the messages currently shown against it.
/// Lives exactly as long as its view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    fields: Vec<&'static str>,
    values: BTreeMap<&'static str, String>,
    error: Option<String>,
    field_errors: BTreeMap<String, String>,
}

impl FormState {
    pub fn new(fields: &[&'static str]) -> Self {
        Self {
            fields: fields.to_vec(),
            values: fields.iter().map(|field| (*field, String::new())).collect(),
            ..Default::default()
        }
    }

    pub fn value(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or_default()
    }

    /// Changing a field clears the form-level message and that field's own.
    pub fn set(&mut self, field: &str, value: impl Into<String>) -> AdminResult<()> {
        let Some(slot) = self.values.get_mut(field) else {
            return Err(AdminError::Validation(format!(
                "Unknown field '{}'. Fields: {}",
                field,
                self.fields.join(", ")
            )));
        };
        *slot = value.into();
        self.error = None;
        self.field_errors.remove(field);
        Ok(())
    }

    /// Fields in declaration order with their current values.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.fields.iter().map(|field| (*field, self.value(field)))
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field).map(String::as_str)
    }

    pub fn set_field_errors(&mut self, errors: &ValidationErrors) {
        self.field_errors = errors
            .field_errors()
            .into_iter()
            .filter_map(|(field, errs)| {
                let message = errs.iter().find_map(|err| err.message.as_ref())?;
                Some((field.to_string(), message.to_string()))
            })
            .collect();
    }

    pub fn clear_errors(&mut self) {
        self.error = None;
        self.field_errors.clear();
    }

    /// Plain-text rendering, one field per line.
    pub fn render(&self, secret_fields: &[&str]) -> String {
        let mut out = String::new();
        for (field, value) in self.entries() {
            let shown = if secret_fields.contains(&field) {
                "*".repeat(value.chars().count())
            } else {
                value.to_string()
            };
            out.push_str(&format!("  {:<11} {}\n", format!("{}:", field), shown));
            if let Some(message) = self.field_error(field) {
                out.push_str(&format!("  {:<11} ^ {}\n", "", message));
            }
        }
        if let Some(error) = self.error() {
            out.push_str(&format!("  ! {}\n", error));
        }
        out
    }
}
