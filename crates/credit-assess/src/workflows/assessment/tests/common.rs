use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::workflows::assessment::domain::{ApplicantRecord, AssessmentId, Field};
use crate::workflows::assessment::extraction::{
    ExtractionConfidence, ExtractionOutcome, SourceFileType, StatementInsights, StatementUpload,
};
use crate::workflows::assessment::gateway::{
    AssessmentGateway, FeedbackContext, GatewayError, Prediction, RiskCategory,
};
use crate::workflows::assessment::normalize::NormalizedApplicant;
use crate::workflows::assessment::service::AssessmentService;
use crate::workflows::assessment::sessions::{
    AssessmentSession, SessionStore, SessionStoreError,
};

pub(super) fn demographics_record() -> ApplicantRecord {
    ApplicantRecord::new()
        .with(Field::FullName, "Adaeze Obi")
        .with(Field::Age, "34")
        .with(Field::Gender, "Female")
        .with(Field::EmploymentStatus, "Employed")
}

pub(super) fn financial_record() -> ApplicantRecord {
    demographics_record()
        .with(Field::TotalMonthlyInflow, "5000")
        .with(Field::TotalMonthlyOutflow, "3000")
        .with(Field::TransactionFrequency, "42")
        .with(Field::SalaryPaymentDetected, "Yes")
        .with(Field::EndOfMonthBalance, "1800")
        .with(Field::HighestCreditAmount, "2500")
        .with(Field::HighestDebitAmount, "900")
        .with(Field::GamblingTransactionsCount, "0")
        .with(Field::LoanRelatedTransactionsCount, "1")
}

pub(super) fn complete_record() -> ApplicantRecord {
    financial_record()
        .with(Field::PreviousLoanTaken, "No")
        .with(Field::AirtimeSpendPerMonth, "120")
        .with(Field::DataSubscriptionSpend, "45")
}

pub(super) fn low_risk_prediction() -> Prediction {
    Prediction {
        loan_defaulted: 0,
        default_probability: 0.12,
        credit_score: 72,
        risk_category: RiskCategory::Low,
    }
}

pub(super) fn statement_insights() -> StatementInsights {
    StatementInsights {
        total_monthly_inflow: 5200.0,
        total_monthly_outflow: 3100.5,
        transaction_frequency: 57,
        salary_payment_detected: "Yes".to_string(),
        end_of_month_balance: 2100.0,
        highest_credit_amount: 2600.0,
        highest_debit_amount: 750.0,
        gambling_transactions_count: 2,
        loan_related_transactions_count: 0,
        extraction_confidence: ExtractionConfidence::High,
        source_file_type: SourceFileType::Csv,
    }
}

pub(super) fn csv_upload() -> StatementUpload {
    StatementUpload {
        filename: "statement.csv".to_string(),
        content: b"date,description,amount\n2025-06-01,SALARY,5200\n".to_vec(),
    }
}

/// Scripted collaborator: `None` in a slot makes that call fail at the
/// transport level. Call counters let tests assert the pipeline ordering
/// invariants.
#[derive(Debug, Default)]
pub(super) struct StubGateway {
    pub(super) prediction: Option<Prediction>,
    pub(super) feedback_text: Option<String>,
    pub(super) extraction: Option<ExtractionOutcome>,
    pub(super) predict_calls: AtomicUsize,
    pub(super) feedback_calls: AtomicUsize,
    pub(super) extract_calls: AtomicUsize,
}

impl StubGateway {
    pub(super) fn scoring_only(prediction: Prediction, feedback: &str) -> Self {
        Self {
            prediction: Some(prediction),
            feedback_text: Some(feedback.to_string()),
            ..Self::default()
        }
    }

    pub(super) fn predict_count(&self) -> usize {
        self.predict_calls.load(Ordering::SeqCst)
    }

    pub(super) fn feedback_count(&self) -> usize {
        self.feedback_calls.load(Ordering::SeqCst)
    }
}

impl AssessmentGateway for StubGateway {
    fn extract(&self, _upload: &StatementUpload) -> Result<ExtractionOutcome, GatewayError> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        self.extraction
            .clone()
            .ok_or_else(|| GatewayError::Backend("extractor offline".to_string()))
    }

    fn predict(&self, _applicant: &NormalizedApplicant) -> Result<Prediction, GatewayError> {
        self.predict_calls.fetch_add(1, Ordering::SeqCst);
        self.prediction
            .clone()
            .ok_or_else(|| GatewayError::Backend("scoring model offline".to_string()))
    }

    fn feedback(&self, _context: &FeedbackContext) -> Result<String, GatewayError> {
        self.feedback_calls.fetch_add(1, Ordering::SeqCst);
        self.feedback_text
            .clone()
            .ok_or_else(|| GatewayError::Backend("feedback generator offline".to_string()))
    }

    fn health(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemorySessionStore {
    sessions: Arc<Mutex<HashMap<AssessmentId, AssessmentSession>>>,
}

impl SessionStore for MemorySessionStore {
    fn insert(&self, session: AssessmentSession) -> Result<AssessmentSession, SessionStoreError> {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        if guard.contains_key(&session.id) {
            return Err(SessionStoreError::Conflict);
        }
        guard.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn update(&self, session: AssessmentSession) -> Result<(), SessionStoreError> {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        guard.insert(session.id.clone(), session);
        Ok(())
    }

    fn fetch(&self, id: &AssessmentId) -> Result<Option<AssessmentSession>, SessionStoreError> {
        let guard = self.sessions.lock().expect("session mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

pub(super) fn build_service(
    gateway: StubGateway,
) -> (
    AssessmentService<MemorySessionStore, StubGateway>,
    Arc<MemorySessionStore>,
    Arc<StubGateway>,
) {
    let store = Arc::new(MemorySessionStore::default());
    let gateway = Arc::new(gateway);
    let service = AssessmentService::new(store.clone(), gateway.clone());
    (service, store, gateway)
}

/// Walk a service-backed session through every step with valid data, leaving
/// it on the final step ready to submit.
pub(super) fn fill_to_final_step(
    service: &AssessmentService<MemorySessionStore, StubGateway>,
    id: &AssessmentId,
) {
    let entries = [
        (Field::FullName, "Adaeze Obi"),
        (Field::Age, "34"),
        (Field::Gender, "Female"),
        (Field::EmploymentStatus, "Employed"),
    ];
    for (field, value) in entries {
        service.update_field(id, field, value).expect("field updates");
    }
    service.advance(id).expect("leaves demographics");

    let entries = [
        (Field::TotalMonthlyInflow, "5000"),
        (Field::TotalMonthlyOutflow, "3000"),
        (Field::TransactionFrequency, "42"),
        (Field::SalaryPaymentDetected, "Yes"),
        (Field::EndOfMonthBalance, "1800"),
        (Field::HighestCreditAmount, "2500"),
        (Field::HighestDebitAmount, "900"),
        (Field::GamblingTransactionsCount, "0"),
        (Field::LoanRelatedTransactionsCount, "1"),
    ];
    for (field, value) in entries {
        service.update_field(id, field, value).expect("field updates");
    }
    service.advance(id).expect("leaves financial");

    service
        .update_field(id, Field::PreviousLoanTaken, "No")
        .expect("loan answer");
    service.advance(id).expect("leaves loan history");

    service
        .update_field(id, Field::AirtimeSpendPerMonth, "120")
        .expect("airtime");
    service
        .update_field(id, Field::DataSubscriptionSpend, "45")
        .expect("data spend");
}
