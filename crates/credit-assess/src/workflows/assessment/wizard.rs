use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{ApplicantRecord, Field};
use super::extraction::{merge_insights, ExtractionOutcome, StatementHandle};
use super::pipeline::{SubmissionError, SubmissionResult};
use super::registry::IntakeBlueprint;
use super::validation::{required_fields, validate_step, ValidationReport};

/// Wizard lifecycle. Entry into `Submitting` is the exclusive submission
/// gate: a second submit while one is in flight is structurally a no-op, not
/// a flag check.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardState {
    Editing { step: usize },
    Blocked { step: usize, errors: ValidationReport },
    Submitting { step: usize },
    ResultsReady(SubmissionResult),
    SubmitFailed { message: String },
}

impl WizardState {
    pub const fn label(&self) -> &'static str {
        match self {
            WizardState::Editing { .. } => "editing",
            WizardState::Blocked { .. } => "blocked",
            WizardState::Submitting { .. } => "submitting",
            WizardState::ResultsReady(_) => "results_ready",
            WizardState::SubmitFailed { .. } => "submit_failed",
        }
    }
}

/// Single-flight gate for statement extraction, independent of the
/// submission gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatementActivity {
    Idle,
    Extracting,
}

/// Outcome of a submission attempt from the state machine's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionStart {
    /// Gate passed; the caller receives the record snapshot to score and the
    /// wizard is now `Submitting`.
    Started(ApplicantRecord),
    /// A submission is already in flight; the call is ignored.
    AlreadyInFlight,
    /// Final-step validation failed; the wizard is now `Blocked`.
    Blocked,
    /// Submit is only callable from the final step.
    NotFinalStep,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("fields can only change while a step is being edited")]
    NotEditing,
    #[error("a statement extraction is already in flight")]
    ExtractionInFlight,
    #[error("no statement extraction is in flight")]
    NoExtractionInFlight,
    #[error("no submission is in flight")]
    NoSubmissionInFlight,
    #[error("no failed submission to acknowledge")]
    NothingToAcknowledge,
}

/// The wizard state machine: one applicant record, one active step, and the
/// gates governing extraction and submission.
#[derive(Debug, Clone)]
pub struct AssessmentWizard {
    blueprint: IntakeBlueprint,
    record: ApplicantRecord,
    statement: Option<StatementHandle>,
    statement_activity: StatementActivity,
    extraction_notice: Option<String>,
    state: WizardState,
}

impl Default for AssessmentWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl AssessmentWizard {
    pub fn new() -> Self {
        Self::with_blueprint(IntakeBlueprint::standard())
    }

    pub fn with_blueprint(blueprint: IntakeBlueprint) -> Self {
        Self {
            blueprint,
            record: ApplicantRecord::new(),
            statement: None,
            statement_activity: StatementActivity::Idle,
            extraction_notice: None,
            state: WizardState::Editing { step: 0 },
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn record(&self) -> &ApplicantRecord {
        &self.record
    }

    pub fn statement(&self) -> Option<&StatementHandle> {
        self.statement.as_ref()
    }

    pub fn extraction_notice(&self) -> Option<&str> {
        self.extraction_notice.as_deref()
    }

    fn active_step(&self) -> Option<usize> {
        match self.state {
            WizardState::Editing { step } | WizardState::Blocked { step, .. } => Some(step),
            _ => None,
        }
    }

    /// Replace one field value. Legal while editing or blocked; a stale
    /// error for the edited field is cleared immediately, and when a rule
    /// trigger moves off its activating value the rule's dependent fields
    /// are reset to their declared defaults.
    pub fn update_field(
        &mut self,
        field: Field,
        value: impl Into<String>,
    ) -> Result<(), WizardError> {
        if self.active_step().is_none() {
            return Err(WizardError::NotEditing);
        }

        self.record = self.record.with(field, value);

        let mut resets: Vec<Field> = Vec::new();
        for rule in self.blueprint.rules_for_trigger(field) {
            if !rule.active(&self.record) {
                resets.extend(rule.requires.iter().copied());
            }
        }
        for reset in resets {
            self.record = self.record.with(reset, reset.default_value());
        }

        let mut unblocked = None;
        if let WizardState::Blocked { step, errors } = &mut self.state {
            errors.clear(field);
            if errors.is_valid() {
                unblocked = Some(*step);
            }
        }
        if let Some(step) = unblocked {
            self.state = WizardState::Editing { step };
        }

        Ok(())
    }

    /// Validate the active step and advance on success, clamped at the last
    /// step. On failure the wizard blocks with a fresh error map.
    pub fn next(&mut self) -> &WizardState {
        let Some(step) = self.active_step() else {
            return &self.state;
        };
        let Some(definition) = self.blueprint.step(step) else {
            return &self.state;
        };

        let report = validate_step(definition, &self.record);
        if report.is_valid() {
            let target = (step + 1).min(self.blueprint.last_index());
            self.state = WizardState::Editing { step: target };
        } else {
            self.state = WizardState::Blocked {
                step,
                errors: report,
            };
        }

        &self.state
    }

    /// Move backward without re-validation, clearing errors, never below
    /// step zero.
    pub fn previous(&mut self) -> &WizardState {
        if let Some(step) = self.active_step() {
            self.state = WizardState::Editing {
                step: step.saturating_sub(1),
            };
        }
        &self.state
    }

    /// Run the final-step validation gate and, if it passes, enter
    /// `Submitting` and hand back the record snapshot to score.
    pub fn begin_submission(&mut self) -> SubmissionStart {
        if matches!(self.state, WizardState::Submitting { .. }) {
            return SubmissionStart::AlreadyInFlight;
        }

        let Some(step) = self.active_step() else {
            return SubmissionStart::NotFinalStep;
        };
        if step != self.blueprint.last_index() {
            return SubmissionStart::NotFinalStep;
        }
        let Some(definition) = self.blueprint.step(step) else {
            return SubmissionStart::NotFinalStep;
        };

        let report = validate_step(definition, &self.record);
        if !report.is_valid() {
            self.state = WizardState::Blocked {
                step,
                errors: report,
            };
            return SubmissionStart::Blocked;
        }

        self.state = WizardState::Submitting { step };
        SubmissionStart::Started(self.record.clone())
    }

    /// Resolve an in-flight submission with the pipeline outcome.
    pub fn complete_submission(
        &mut self,
        outcome: Result<SubmissionResult, SubmissionError>,
    ) -> Result<&WizardState, WizardError> {
        if !matches!(self.state, WizardState::Submitting { .. }) {
            return Err(WizardError::NoSubmissionInFlight);
        }

        self.state = match outcome {
            Ok(result) => WizardState::ResultsReady(result),
            Err(err) => WizardState::SubmitFailed {
                message: err.to_string(),
            },
        };
        Ok(&self.state)
    }

    /// A failed submission is recoverable: acknowledging it returns the
    /// wizard to the final step for correction and retry.
    pub fn acknowledge_failure(&mut self) -> Result<&WizardState, WizardError> {
        if !matches!(self.state, WizardState::SubmitFailed { .. }) {
            return Err(WizardError::NothingToAcknowledge);
        }
        self.state = WizardState::Editing {
            step: self.blueprint.last_index(),
        };
        Ok(&self.state)
    }

    /// Discard everything and start over from the initial shape.
    pub fn new_assessment(&mut self) {
        self.record = ApplicantRecord::new();
        self.statement = None;
        self.statement_activity = StatementActivity::Idle;
        self.extraction_notice = None;
        self.state = WizardState::Editing { step: 0 };
    }

    /// Record the upload identity and enter the single-flight extraction
    /// gate. The handle is owned by the upload action, not the extraction
    /// payload, so later merges and manual corrections never lose it.
    pub fn begin_extraction(&mut self, handle: StatementHandle) -> Result<(), WizardError> {
        if self.statement_activity == StatementActivity::Extracting {
            return Err(WizardError::ExtractionInFlight);
        }
        if self.active_step().is_none() {
            return Err(WizardError::NotEditing);
        }

        self.statement = Some(handle);
        self.statement_activity = StatementActivity::Extracting;
        self.extraction_notice = None;
        Ok(())
    }

    /// Merge the extraction outcome. Success overlays the financial fields;
    /// failure leaves the record exactly as it was and keeps the message as
    /// advisory text so the applicant can fall back to manual entry.
    pub fn apply_extraction(&mut self, outcome: ExtractionOutcome) -> Result<(), WizardError> {
        if self.statement_activity != StatementActivity::Extracting {
            return Err(WizardError::NoExtractionInFlight);
        }
        self.statement_activity = StatementActivity::Idle;

        match outcome {
            ExtractionOutcome::Extracted(insights) => {
                self.record = merge_insights(&self.record, &insights);
                self.extraction_notice = None;
            }
            ExtractionOutcome::Unusable(message) => {
                self.extraction_notice = Some(message);
            }
        }
        Ok(())
    }

    /// The fields currently required on the active step: static set plus
    /// active conditional rules.
    pub fn required_now(&self) -> Vec<Field> {
        self.active_step()
            .and_then(|step| self.blueprint.step(step))
            .map(|definition| required_fields(definition, &self.record))
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        let (step_index, step_label) = match &self.state {
            WizardState::Editing { step }
            | WizardState::Blocked { step, .. }
            | WizardState::Submitting { step } => (
                Some(*step),
                self.blueprint
                    .step(*step)
                    .map(|definition| definition.label()),
            ),
            WizardState::ResultsReady(_) | WizardState::SubmitFailed { .. } => (None, None),
        };

        let errors = match &self.state {
            WizardState::Blocked { errors, .. } => errors.errors().clone(),
            _ => BTreeMap::new(),
        };

        let (result, failure) = match &self.state {
            WizardState::ResultsReady(result) => (Some(result.clone()), None),
            WizardState::SubmitFailed { message } => (None, Some(message.clone())),
            _ => (None, None),
        };

        WizardSnapshot {
            state: self.state.label(),
            step_index,
            step_label,
            required_fields: self.required_now(),
            errors,
            record: self.record.values().clone(),
            statement: self.statement.clone(),
            extraction_notice: self.extraction_notice.clone(),
            result,
            failure,
        }
    }
}

/// Serializable projection of the wizard for API responses and UI display.
#[derive(Debug, Clone, Serialize)]
pub struct WizardSnapshot {
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_label: Option<&'static str>,
    pub required_fields: Vec<Field>,
    pub errors: BTreeMap<Field, String>,
    pub record: BTreeMap<Field, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement: Option<StatementHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_notice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SubmissionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}
