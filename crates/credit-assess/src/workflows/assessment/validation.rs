use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{ApplicantRecord, Field, FieldKind};
use super::registry::StepDefinition;

/// Field-keyed validation messages, rebuilt fresh on every pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationReport {
    errors: BTreeMap<Field, String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &BTreeMap<Field, String> {
        &self.errors
    }

    pub fn message_for(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// Drop the stale message for an edited field, if any.
    pub fn clear(&mut self, field: Field) {
        self.errors.remove(&field);
    }

    fn require(&mut self, field: Field, record: &ApplicantRecord) {
        if is_blank(field, record.get(field)) {
            self.errors
                .insert(field, format!("{} is required", field.label()));
        }
    }
}

/// Validate one step of the record.
///
/// Static requirements are checked first, then every conditional rule whose
/// trigger currently matches extends the required set. A field required only
/// conditionally is never reported when its trigger does not match, even if
/// it still holds stale data from a prior trigger state.
pub fn validate_step(step: &StepDefinition, record: &ApplicantRecord) -> ValidationReport {
    let mut report = ValidationReport::default();

    for field in &step.required {
        report.require(*field, record);
    }

    for rule in &step.conditional {
        if rule.active(record) {
            for field in &rule.requires {
                report.require(*field, record);
            }
        }
    }

    report
}

/// Pure derived query: the fields currently required on a step, static set
/// plus every matching conditional rule. Drives required-vs-optional UI
/// markers without duplicating rule logic.
pub fn required_fields(step: &StepDefinition, record: &ApplicantRecord) -> Vec<Field> {
    let mut fields = step.required.clone();
    for rule in &step.conditional {
        if rule.active(record) {
            for field in &rule.requires {
                if !fields.contains(field) {
                    fields.push(*field);
                }
            }
        }
    }
    fields
}

/// Emptiness predicate: blank/whitespace-only strings are empty, and a
/// numeric field holding a non-finite value counts as empty. The numeric
/// value `0` is a legitimate spend/count and is never empty.
pub(crate) fn is_blank(field: Field, value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return true;
    }

    match field.kind() {
        FieldKind::Numeric | FieldKind::Count => trimmed
            .parse::<f64>()
            .map(|parsed| !parsed.is_finite())
            .unwrap_or(false),
        FieldKind::Text | FieldKind::Choice => false,
    }
}
