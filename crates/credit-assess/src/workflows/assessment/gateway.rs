use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;

use super::extraction::{ExtractionOutcome, StatementInsights, StatementUpload};
use super::normalize::NormalizedApplicant;

/// Risk label produced by the scoring collaborator. The thresholds behind it
/// (Low >= 70, Medium 40-69, High < 40) are the collaborator's; the core
/// never recomputes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

impl RiskCategory {
    pub const fn label(self) -> &'static str {
        match self {
            RiskCategory::Low => "Low",
            RiskCategory::Medium => "Medium",
            RiskCategory::High => "High",
        }
    }
}

/// Scoring result, consumed opaquely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub loan_defaulted: u8,
    pub default_probability: f64,
    pub credit_score: u8,
    pub risk_category: RiskCategory,
}

/// Payload for the feedback collaborator: applicant identity and behavioral
/// fields combined with the scoring result it is derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackContext {
    pub name: String,
    pub age: u32,
    pub employment_status: String,
    pub total_monthly_inflow: f64,
    pub total_monthly_outflow: f64,
    pub end_of_month_balance: f64,
    pub salary_payment_detected: String,
    pub transaction_frequency: u32,
    pub gambling_transactions_count: u32,
    pub previous_loan_taken: String,
    pub repayment_status: String,
    pub missed_payment_count: u32,
    pub credit_score: u8,
    pub risk_category: RiskCategory,
    pub default_probability: f64,
}

impl FeedbackContext {
    pub fn new(applicant: &NormalizedApplicant, prediction: &Prediction) -> Self {
        Self {
            name: applicant.full_name.clone(),
            age: applicant.age,
            employment_status: applicant.employment_status.clone(),
            total_monthly_inflow: applicant.total_monthly_inflow,
            total_monthly_outflow: applicant.total_monthly_outflow,
            end_of_month_balance: applicant.end_of_month_balance,
            salary_payment_detected: applicant.salary_payment_detected.clone(),
            transaction_frequency: applicant.transaction_frequency,
            gambling_transactions_count: applicant.gambling_transactions_count,
            previous_loan_taken: applicant.previous_loan_taken.clone(),
            repayment_status: applicant.repayment_status.clone(),
            missed_payment_count: applicant.missed_payment_count,
            credit_score: prediction.credit_score,
            risk_category: prediction.risk_category,
            default_probability: prediction.default_probability,
        }
    }
}

/// Transport-level failure of a collaborator call. Business failures of
/// extraction travel as [`ExtractionOutcome::Unusable`], never through here.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("scoring service call failed: {0}")]
    Backend(String),
    #[error("scoring service returned an unexpected payload: {0}")]
    Payload(String),
    #[error("gateway runtime unavailable: {0}")]
    Runtime(String),
}

/// Collaborator contract consumed by the core: extraction, prediction,
/// feedback, and liveness.
pub trait AssessmentGateway: Debug + Send + Sync {
    fn extract(&self, upload: &StatementUpload) -> Result<ExtractionOutcome, GatewayError>;
    fn predict(&self, applicant: &NormalizedApplicant) -> Result<Prediction, GatewayError>;
    fn feedback(&self, context: &FeedbackContext) -> Result<String, GatewayError>;
    fn health(&self) -> Result<(), GatewayError>;
}

#[derive(Debug, Deserialize)]
struct FeedbackEnvelope {
    feedback: String,
}

/// Thin wrapper around reqwest allowing synchronous workflows to talk to the
/// scoring service without exposing async details.
pub struct HttpAssessmentClient {
    base_url: String,
    client: reqwest::Client,
    runtime: Runtime,
}

impl HttpAssessmentClient {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client, runtime: Runtime) -> Self {
        Self {
            base_url: base_url.into(),
            client,
            runtime,
        }
    }

    pub fn with_runtime(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        let runtime = Runtime::new().map_err(|err| GatewayError::Runtime(err.to_string()))?;
        Ok(Self::new(base_url, reqwest::Client::new(), runtime))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn map_error<E: std::fmt::Display>(err: E) -> GatewayError {
        GatewayError::Backend(err.to_string())
    }
}

impl std::fmt::Debug for HttpAssessmentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAssessmentClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl AssessmentGateway for HttpAssessmentClient {
    fn extract(&self, upload: &StatementUpload) -> Result<ExtractionOutcome, GatewayError> {
        let url = self.endpoint("extract");
        let filename = upload.filename.clone();
        let content = upload.content.clone();

        let result = self.runtime.block_on(async {
            let part = reqwest::multipart::Part::bytes(content).file_name(filename);
            let form = reqwest::multipart::Form::new().part("file", part);
            self.client.post(&url).multipart(form).send().await
        });

        let response = result.map_err(Self::map_error)?;
        let status = response.status();
        let body = self
            .runtime
            .block_on(response.text())
            .map_err(Self::map_error)?;

        if !status.is_success() {
            // The collaborator reports unusable statements as an error body;
            // that is a business outcome, not a transport fault.
            return Ok(ExtractionOutcome::Unusable(extraction_detail(&body)));
        }

        let insights: StatementInsights =
            serde_json::from_str(&body).map_err(|err| GatewayError::Payload(err.to_string()))?;
        Ok(ExtractionOutcome::Extracted(insights))
    }

    fn predict(&self, applicant: &NormalizedApplicant) -> Result<Prediction, GatewayError> {
        let url = self.endpoint("predict");
        let result = self
            .runtime
            .block_on(async { self.client.post(&url).json(applicant).send().await });

        let response = result.map_err(Self::map_error)?;
        let status = response.status();
        let body = self
            .runtime
            .block_on(response.text())
            .map_err(Self::map_error)?;

        if !status.is_success() {
            return Err(GatewayError::Backend(format!(
                "predict returned {status}: {body}"
            )));
        }

        serde_json::from_str(&body).map_err(|err| GatewayError::Payload(err.to_string()))
    }

    fn feedback(&self, context: &FeedbackContext) -> Result<String, GatewayError> {
        let url = self.endpoint("feedback");
        let result = self
            .runtime
            .block_on(async { self.client.post(&url).json(context).send().await });

        let response = result.map_err(Self::map_error)?;
        let status = response.status();
        let body = self
            .runtime
            .block_on(response.text())
            .map_err(Self::map_error)?;

        if !status.is_success() {
            return Err(GatewayError::Backend(format!(
                "feedback returned {status}: {body}"
            )));
        }

        let envelope: FeedbackEnvelope =
            serde_json::from_str(&body).map_err(|err| GatewayError::Payload(err.to_string()))?;
        Ok(envelope.feedback)
    }

    fn health(&self) -> Result<(), GatewayError> {
        let url = self.endpoint("health");
        let result = self
            .runtime
            .block_on(async { self.client.get(&url).send().await });

        let response = result.map_err(Self::map_error)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(GatewayError::Backend(format!(
                "health returned {}",
                response.status()
            )))
        }
    }
}

/// Pull the human-readable detail out of a collaborator error body, falling
/// back to the raw text.
fn extraction_detail(body: &str) -> String {
    #[derive(Deserialize)]
    struct Detail {
        detail: String,
    }

    match serde_json::from_str::<Detail>(body) {
        Ok(parsed) => parsed.detail,
        Err(_) if body.trim().is_empty() => "statement could not be processed".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_detail_prefers_structured_bodies() {
        assert_eq!(
            extraction_detail(r#"{"detail":"Extraction failed: unreadable PDF"}"#),
            "Extraction failed: unreadable PDF"
        );
        assert_eq!(extraction_detail("plain text"), "plain text");
        assert_eq!(extraction_detail("  "), "statement could not be processed");
    }

    #[test]
    fn risk_category_deserializes_from_collaborator_labels() {
        let parsed: RiskCategory = serde_json::from_str("\"Low\"").expect("parses");
        assert_eq!(parsed, RiskCategory::Low);
        assert_eq!(RiskCategory::Medium.label(), "Medium");
    }
}
