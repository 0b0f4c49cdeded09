//! Collects per-field validation failures into a single error.

use std::collections::BTreeMap;

use crate::error::VacationStayError;

#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: BTreeMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` for `field` when `failed` is true. The first failure per field wins.
    pub fn check(&mut self, failed: bool, field: &str, message: &str) -> &mut Self {
        if failed {
            self.errors
                .entry(field.to_string())
                .or_insert_with(|| message.to_string());
        }
        self
    }

    /// Records a failure when `value` is missing or only whitespace.
    pub fn require(&mut self, value: Option<&str>, field: &str, message: &str) -> &mut Self {
        let blank = value.map(|v| v.trim().is_empty()).unwrap_or(true);
        self.check(blank, field, message)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), VacationStayError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(VacationStayError::FieldErrors {
                message: "Validation failed".to_string(),
                details: self.errors,
            })
        }
    }
}
