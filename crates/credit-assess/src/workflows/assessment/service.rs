use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{AssessmentId, Field};
use super::extraction::{ExtractionOutcome, StatementHandle, StatementUpload};
use super::gateway::{AssessmentGateway, GatewayError};
use super::pipeline;
use super::sessions::{AssessmentSession, SessionStore, SessionStoreError};
use super::wizard::{AssessmentWizard, SubmissionStart, WizardError, WizardSnapshot};

/// Service composing the session store, the wizard state machine, and the
/// scoring gateway. All wizard transitions flow through here so the
/// begin/complete choreography around collaborator calls lives in one place.
pub struct AssessmentService<S, G> {
    store: Arc<S>,
    gateway: Arc<G>,
}

static ASSESSMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_assessment_id() -> AssessmentId {
    let id = ASSESSMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AssessmentId(format!("assess-{id:06}"))
}

/// Session view returned from every operation.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentView {
    pub assessment_id: AssessmentId,
    pub started_at: DateTime<Utc>,
    #[serde(flatten)]
    pub wizard: WizardSnapshot,
}

impl AssessmentView {
    fn of(session: &AssessmentSession) -> Self {
        Self {
            assessment_id: session.id.clone(),
            started_at: session.started_at,
            wizard: session.wizard.snapshot(),
        }
    }
}

impl<S, G> AssessmentService<S, G>
where
    S: SessionStore + 'static,
    G: AssessmentGateway + 'static,
{
    pub fn new(store: Arc<S>, gateway: Arc<G>) -> Self {
        Self { store, gateway }
    }

    /// Open a fresh wizard session at the first step.
    pub fn start(&self) -> Result<AssessmentView, AssessmentServiceError> {
        let session = AssessmentSession {
            id: next_assessment_id(),
            wizard: AssessmentWizard::new(),
            started_at: Utc::now(),
        };
        let stored = self.store.insert(session)?;
        Ok(AssessmentView::of(&stored))
    }

    pub fn get(&self, id: &AssessmentId) -> Result<AssessmentView, AssessmentServiceError> {
        let session = self.fetch(id)?;
        Ok(AssessmentView::of(&session))
    }

    pub fn update_field(
        &self,
        id: &AssessmentId,
        field: Field,
        value: &str,
    ) -> Result<AssessmentView, AssessmentServiceError> {
        self.mutate(id, |wizard| {
            wizard.update_field(field, value)?;
            Ok(())
        })
    }

    pub fn advance(&self, id: &AssessmentId) -> Result<AssessmentView, AssessmentServiceError> {
        self.mutate(id, |wizard| {
            wizard.next();
            Ok(())
        })
    }

    pub fn retreat(&self, id: &AssessmentId) -> Result<AssessmentView, AssessmentServiceError> {
        self.mutate(id, |wizard| {
            wizard.previous();
            Ok(())
        })
    }

    /// Upload a bank statement and merge the extraction outcome. Transport
    /// faults of the collaborator are downgraded to an advisory outcome so
    /// the financial step always remains usable for manual entry.
    pub fn upload_statement(
        &self,
        id: &AssessmentId,
        upload: StatementUpload,
    ) -> Result<AssessmentView, AssessmentServiceError> {
        let source = upload.source_type().ok_or_else(|| {
            AssessmentServiceError::UnsupportedStatement {
                filename: upload.filename.clone(),
            }
        })?;

        let mut session = self.fetch(id)?;
        session
            .wizard
            .begin_extraction(StatementHandle::for_upload(&upload, source))?;

        let outcome = match self.gateway.extract(&upload) {
            Ok(outcome) => outcome,
            Err(err) => ExtractionOutcome::Unusable(err.to_string()),
        };
        session.wizard.apply_extraction(outcome)?;

        self.store.update(session.clone())?;
        Ok(AssessmentView::of(&session))
    }

    /// Run the submission gate and, when it opens, the scoring pipeline.
    /// A repeated submit while one is in flight returns the current view
    /// unchanged; a blocked validation gate also returns the view, with the
    /// error map inside it.
    pub fn submit(&self, id: &AssessmentId) -> Result<AssessmentView, AssessmentServiceError> {
        let mut session = self.fetch(id)?;

        match session.wizard.begin_submission() {
            SubmissionStart::Started(record) => {
                self.store.update(session.clone())?;
                let outcome = pipeline::run(&record, self.gateway.as_ref());
                session.wizard.complete_submission(outcome)?;
                self.store.update(session.clone())?;
                Ok(AssessmentView::of(&session))
            }
            SubmissionStart::AlreadyInFlight => Ok(AssessmentView::of(&session)),
            SubmissionStart::Blocked => {
                self.store.update(session.clone())?;
                Ok(AssessmentView::of(&session))
            }
            SubmissionStart::NotFinalStep => Err(AssessmentServiceError::NotFinalStep),
        }
    }

    pub fn acknowledge_failure(
        &self,
        id: &AssessmentId,
    ) -> Result<AssessmentView, AssessmentServiceError> {
        self.mutate(id, |wizard| {
            wizard.acknowledge_failure()?;
            Ok(())
        })
    }

    /// Discard the session's record and start a new assessment in place.
    pub fn reset(&self, id: &AssessmentId) -> Result<AssessmentView, AssessmentServiceError> {
        self.mutate(id, |wizard| {
            wizard.new_assessment();
            Ok(())
        })
    }

    /// Liveness of the scoring collaborator.
    pub fn scoring_health(&self) -> Result<(), AssessmentServiceError> {
        self.gateway.health()?;
        Ok(())
    }

    fn fetch(&self, id: &AssessmentId) -> Result<AssessmentSession, AssessmentServiceError> {
        let session = self.store.fetch(id)?.ok_or(SessionStoreError::NotFound)?;
        Ok(session)
    }

    fn mutate<F>(
        &self,
        id: &AssessmentId,
        apply: F,
    ) -> Result<AssessmentView, AssessmentServiceError>
    where
        F: FnOnce(&mut AssessmentWizard) -> Result<(), AssessmentServiceError>,
    {
        let mut session = self.fetch(id)?;
        apply(&mut session.wizard)?;
        self.store.update(session.clone())?;
        Ok(AssessmentView::of(&session))
    }
}

/// Error raised by the assessment service.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentServiceError {
    #[error(transparent)]
    Session(#[from] SessionStoreError),
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error("unsupported statement '{filename}': only PDF and CSV files are accepted")]
    UnsupportedStatement { filename: String },
    #[error("submission is only available from the final step")]
    NotFinalStep,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
