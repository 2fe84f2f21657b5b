use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identifier wrapper for assessment sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssessmentId(pub String);

/// Closed set of applicant fields recognized by the intake wizard.
///
/// Grouped by step for readability; stored flat in [`ApplicantRecord`].
/// Unknown keys are unrepresentable by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    // Demographics
    FullName,
    Age,
    Gender,
    EmploymentStatus,
    // Financial
    TotalMonthlyInflow,
    TotalMonthlyOutflow,
    TransactionFrequency,
    SalaryPaymentDetected,
    EndOfMonthBalance,
    HighestCreditAmount,
    HighestDebitAmount,
    GamblingTransactionsCount,
    LoanRelatedTransactionsCount,
    // Loan history
    PreviousLoanTaken,
    PreviousLoanAmount,
    RepaymentStatus,
    MissedPaymentCount,
    // Behaviour
    AirtimeSpendPerMonth,
    DataSubscriptionSpend,
}

/// Broad value shape of a field, used by the emptiness predicate and the
/// normalization pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Numeric,
    Count,
    Choice,
}

impl Field {
    pub const ALL: [Field; 19] = [
        Field::FullName,
        Field::Age,
        Field::Gender,
        Field::EmploymentStatus,
        Field::TotalMonthlyInflow,
        Field::TotalMonthlyOutflow,
        Field::TransactionFrequency,
        Field::SalaryPaymentDetected,
        Field::EndOfMonthBalance,
        Field::HighestCreditAmount,
        Field::HighestDebitAmount,
        Field::GamblingTransactionsCount,
        Field::LoanRelatedTransactionsCount,
        Field::PreviousLoanTaken,
        Field::PreviousLoanAmount,
        Field::RepaymentStatus,
        Field::MissedPaymentCount,
        Field::AirtimeSpendPerMonth,
        Field::DataSubscriptionSpend,
    ];

    /// Human label used in validation messages and UI markers.
    pub const fn label(self) -> &'static str {
        match self {
            Field::FullName => "Full name",
            Field::Age => "Age",
            Field::Gender => "Gender",
            Field::EmploymentStatus => "Employment status",
            Field::TotalMonthlyInflow => "Total monthly inflow",
            Field::TotalMonthlyOutflow => "Total monthly outflow",
            Field::TransactionFrequency => "Transaction frequency",
            Field::SalaryPaymentDetected => "Salary payment detected",
            Field::EndOfMonthBalance => "End of month balance",
            Field::HighestCreditAmount => "Highest credit amount",
            Field::HighestDebitAmount => "Highest debit amount",
            Field::GamblingTransactionsCount => "Gambling transactions count",
            Field::LoanRelatedTransactionsCount => "Loan related transactions count",
            Field::PreviousLoanTaken => "Previous loan taken",
            Field::PreviousLoanAmount => "Previous loan amount",
            Field::RepaymentStatus => "Repayment status",
            Field::MissedPaymentCount => "Missed payment count",
            Field::AirtimeSpendPerMonth => "Airtime spend per month",
            Field::DataSubscriptionSpend => "Data subscription spend",
        }
    }

    pub const fn kind(self) -> FieldKind {
        match self {
            Field::FullName => FieldKind::Text,
            Field::Gender
            | Field::EmploymentStatus
            | Field::SalaryPaymentDetected
            | Field::PreviousLoanTaken
            | Field::RepaymentStatus => FieldKind::Choice,
            Field::Age
            | Field::TransactionFrequency
            | Field::GamblingTransactionsCount
            | Field::LoanRelatedTransactionsCount
            | Field::MissedPaymentCount => FieldKind::Count,
            Field::TotalMonthlyInflow
            | Field::TotalMonthlyOutflow
            | Field::EndOfMonthBalance
            | Field::HighestCreditAmount
            | Field::HighestDebitAmount
            | Field::PreviousLoanAmount
            | Field::AirtimeSpendPerMonth
            | Field::DataSubscriptionSpend => FieldKind::Numeric,
        }
    }

    /// Initial value for a fresh record. Blank throughout; the normalization
    /// pass supplies the 0-equivalent for numeric fields left untouched.
    pub const fn default_value(self) -> &'static str {
        ""
    }
}

/// Flat applicant record keyed by [`Field`].
///
/// Invariant: every recognized field is present from construction onward,
/// defaulting to the empty string. Updates are copy-on-write so callers can
/// hold snapshots (e.g. the submission pipeline) without aliasing concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicantRecord {
    values: BTreeMap<Field, String>,
}

impl Default for ApplicantRecord {
    fn default() -> Self {
        let values = Field::ALL
            .iter()
            .map(|field| (*field, field.default_value().to_string()))
            .collect();
        Self { values }
    }
}

impl ApplicantRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: Field) -> &str {
        self.values
            .get(&field)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Produce a new record with a single field replaced.
    pub fn with(&self, field: Field, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.values.insert(field, value.into());
        next
    }

    pub fn values(&self) -> &BTreeMap<Field, String> {
        &self.values
    }
}
