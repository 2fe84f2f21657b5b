//! Credit worthiness intake wizard, validation rules, and scoring pipeline.
//!
//! The wizard walks an applicant through four ordered steps, gates every
//! advance behind the validation engine, optionally merges machine-extracted
//! bank-statement values into the record, and finally drives the two-stage
//! submission pipeline (mandatory prediction, best-effort feedback) against
//! the external scoring collaborator.

pub mod domain;
pub mod extraction;
pub mod gateway;
pub mod normalize;
pub mod pipeline;
pub mod registry;
pub mod router;
pub mod service;
pub mod sessions;
pub mod validation;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use domain::{ApplicantRecord, AssessmentId, Field, FieldKind};
pub use extraction::{
    ExtractionConfidence, ExtractionOutcome, SourceFileType, StatementHandle, StatementInsights,
    StatementUpload,
};
pub use gateway::{
    AssessmentGateway, FeedbackContext, GatewayError, HttpAssessmentClient, Prediction,
    RiskCategory,
};
pub use normalize::NormalizedApplicant;
pub use pipeline::{FeedbackOutcome, SubmissionError, SubmissionResult};
pub use registry::{ConditionalRule, IntakeBlueprint, StepDefinition, StepId};
pub use router::assessment_router;
pub use service::{AssessmentService, AssessmentServiceError, AssessmentView};
pub use sessions::{AssessmentSession, SessionStore, SessionStoreError};
pub use validation::{required_fields, validate_step, ValidationReport};
pub use wizard::{AssessmentWizard, SubmissionStart, WizardError, WizardSnapshot, WizardState};
