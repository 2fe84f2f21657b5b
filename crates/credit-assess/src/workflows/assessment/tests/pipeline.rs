use super::common::*;
use crate::workflows::assessment::domain::Field;
use crate::workflows::assessment::gateway::{
    AssessmentGateway, FeedbackContext, GatewayError, Prediction, RiskCategory,
};
use crate::workflows::assessment::extraction::{ExtractionOutcome, StatementUpload};
use crate::workflows::assessment::normalize::NormalizedApplicant;
use crate::workflows::assessment::pipeline::{self, FeedbackOutcome, SubmissionError};

#[test]
fn successful_pipeline_carries_scoring_and_feedback() {
    let gateway = StubGateway::scoring_only(low_risk_prediction(), "Recommend approval.");
    let record = complete_record();

    let result = pipeline::run(&record, &gateway).expect("pipeline succeeds");
    assert_eq!(result.credit_score, 72);
    assert_eq!(result.risk_category, RiskCategory::Low);
    assert_eq!(result.default_probability, 0.12);
    assert_eq!(result.loan_defaulted, 0);
    assert_eq!(result.feedback.text(), Some("Recommend approval."));
    assert_eq!(gateway.predict_count(), 1);
    assert_eq!(gateway.feedback_count(), 1);
}

#[test]
fn feedback_failure_never_perturbs_the_scoring_fields() {
    let gateway = StubGateway {
        prediction: Some(low_risk_prediction()),
        feedback_text: None,
        ..StubGateway::default()
    };

    let result = pipeline::run(&complete_record(), &gateway).expect("submission still succeeds");
    assert_eq!(result.credit_score, 72);
    assert_eq!(result.risk_category, RiskCategory::Low);
    assert_eq!(result.default_probability, 0.12);
    assert_eq!(result.loan_defaulted, 0);
    assert_eq!(result.feedback.text(), None);
    assert!(matches!(
        result.feedback,
        FeedbackOutcome::Unavailable { .. }
    ));
}

#[test]
fn prediction_failure_short_circuits_before_feedback() {
    let gateway = StubGateway {
        prediction: None,
        feedback_text: Some("never requested".to_string()),
        ..StubGateway::default()
    };

    let err = pipeline::run(&complete_record(), &gateway).expect_err("prediction is mandatory");
    assert!(matches!(err, SubmissionError::Prediction(_)));
    assert!(err.to_string().contains("scoring model offline"));
    assert_eq!(gateway.predict_count(), 1);
    assert_eq!(
        gateway.feedback_count(),
        0,
        "feedback must never be requested before a successful prediction"
    );
}

#[test]
fn blank_counters_reach_predict_as_zero() {
    /// Captures the payload the pipeline hands to predict.
    #[derive(Debug, Default)]
    struct CapturingGateway {
        seen: std::sync::Mutex<Option<NormalizedApplicant>>,
    }

    impl AssessmentGateway for CapturingGateway {
        fn extract(&self, _upload: &StatementUpload) -> Result<ExtractionOutcome, GatewayError> {
            Err(GatewayError::Backend("unused".to_string()))
        }

        fn predict(&self, applicant: &NormalizedApplicant) -> Result<Prediction, GatewayError> {
            *self.seen.lock().expect("capture mutex poisoned") = Some(applicant.clone());
            Ok(Prediction {
                loan_defaulted: 0,
                default_probability: 0.2,
                credit_score: 65,
                risk_category: RiskCategory::Medium,
            })
        }

        fn feedback(&self, _context: &FeedbackContext) -> Result<String, GatewayError> {
            Ok("ok".to_string())
        }

        fn health(&self) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    let gateway = CapturingGateway::default();
    let record = complete_record().with(Field::GamblingTransactionsCount, "");

    pipeline::run(&record, &gateway).expect("pipeline succeeds");

    let seen = gateway
        .seen
        .lock()
        .expect("capture mutex poisoned")
        .clone()
        .expect("predict payload captured");
    assert_eq!(seen.gambling_transactions_count, 0);
    assert_eq!(seen.previous_loan_taken, "No");
    assert_eq!(seen.repayment_status, "N/A");
}

#[test]
fn feedback_context_is_derived_from_the_prediction() {
    let applicant = NormalizedApplicant::from_record(&complete_record());
    let prediction = low_risk_prediction();

    let context = FeedbackContext::new(&applicant, &prediction);
    assert_eq!(context.name, "Adaeze Obi");
    assert_eq!(context.age, 34);
    assert_eq!(context.credit_score, prediction.credit_score);
    assert_eq!(context.risk_category, prediction.risk_category);
    assert_eq!(context.default_probability, prediction.default_probability);
    assert_eq!(context.total_monthly_inflow, 5000.0);
}
