use chrono::{DateTime, Utc};

use super::domain::AssessmentId;
use super::wizard::AssessmentWizard;

/// One applicant's wizard session. Each session owns its record, errors,
/// and in-flight gates exclusively; nothing is shared across sessions.
#[derive(Debug, Clone)]
pub struct AssessmentSession {
    pub id: AssessmentId,
    pub wizard: AssessmentWizard,
    pub started_at: DateTime<Utc>,
}

/// Storage abstraction so the service module can be exercised in isolation.
/// Sessions are in-memory for the duration of one browsing session; no
/// durable persistence exists.
pub trait SessionStore: Send + Sync {
    fn insert(&self, session: AssessmentSession) -> Result<AssessmentSession, SessionStoreError>;
    fn update(&self, session: AssessmentSession) -> Result<(), SessionStoreError>;
    fn fetch(&self, id: &AssessmentId) -> Result<Option<AssessmentSession>, SessionStoreError>;
}

/// Error enumeration for session store failures.
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session already exists")]
    Conflict,
    #[error("session not found")]
    NotFound,
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}
