use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::ApplicantRecord;
use super::gateway::{AssessmentGateway, FeedbackContext, GatewayError, RiskCategory};
use super::normalize::NormalizedApplicant;

/// Outcome of the best-effort feedback stage. Absence of feedback text is a
/// valid terminal state, not an error; the distinction is part of the
/// contract rather than an implementation accident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeedbackOutcome {
    Generated(String),
    Unavailable { reason: String },
}

impl FeedbackOutcome {
    pub fn text(&self) -> Option<&str> {
        match self {
            FeedbackOutcome::Generated(text) => Some(text),
            FeedbackOutcome::Unavailable { .. } => None,
        }
    }
}

/// Unified result of a completed submission: the mandatory scoring fields
/// plus the optional feedback stage outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub credit_score: u8,
    pub risk_category: RiskCategory,
    pub default_probability: f64,
    pub loan_defaulted: u8,
    pub feedback: FeedbackOutcome,
}

/// Failure of the mandatory stage. Prediction failure aborts the pipeline
/// before any feedback call is attempted.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("prediction failed: {0}")]
    Prediction(#[source] GatewayError),
}

/// Drive the terminal pipeline: normalize, predict (mandatory), feedback
/// (best-effort), assemble.
///
/// The feedback payload is derived from the prediction result, so prediction
/// strictly precedes feedback and a prediction failure short-circuits.
pub fn run<G>(record: &ApplicantRecord, gateway: &G) -> Result<SubmissionResult, SubmissionError>
where
    G: AssessmentGateway + ?Sized,
{
    let applicant = NormalizedApplicant::from_record(record);

    let prediction = gateway
        .predict(&applicant)
        .map_err(SubmissionError::Prediction)?;

    let feedback = match gateway.feedback(&FeedbackContext::new(&applicant, &prediction)) {
        Ok(text) => FeedbackOutcome::Generated(text),
        Err(err) => {
            warn!(error = %err, "feedback stage unavailable, continuing without it");
            FeedbackOutcome::Unavailable {
                reason: err.to_string(),
            }
        }
    };

    Ok(SubmissionResult {
        credit_score: prediction.credit_score,
        risk_category: prediction.risk_category,
        default_probability: prediction.default_probability,
        loan_defaulted: prediction.loan_defaulted,
        feedback,
    })
}
