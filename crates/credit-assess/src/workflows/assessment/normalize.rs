use serde::Serialize;

use super::domain::{ApplicantRecord, Field};

/// Fully typed applicant record in the scoring collaborator's wire shape.
///
/// Produced by a total normalization pass: it never fails, so the downstream
/// predict call always receives a well-typed payload. Numeric fields that
/// are blank or unparseable coerce to `0`; the enumerated fields default per
/// field (`salary_payment_detected` and `previous_loan_taken` to `"No"`,
/// `repayment_status` to `"N/A"`). `full_name` travels with the record for
/// feedback personalization but is not part of the predict payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedApplicant {
    #[serde(skip_serializing)]
    pub full_name: String,
    pub age: u32,
    pub gender: String,
    pub employment_status: String,
    pub total_monthly_inflow: f64,
    pub total_monthly_outflow: f64,
    pub transaction_frequency: u32,
    pub salary_payment_detected: String,
    pub end_of_month_balance: f64,
    pub highest_credit_amount: f64,
    pub highest_debit_amount: f64,
    pub gambling_transactions_count: u32,
    pub loan_related_transactions_count: u32,
    pub previous_loan_taken: String,
    pub previous_loan_amount: f64,
    pub repayment_status: String,
    pub missed_payment_count: u32,
    pub airtime_spend_per_month: f64,
    pub data_subscription_spend: f64,
}

impl NormalizedApplicant {
    pub fn from_record(record: &ApplicantRecord) -> Self {
        Self {
            full_name: record.get(Field::FullName).trim().to_string(),
            age: parse_count(record.get(Field::Age)),
            gender: record.get(Field::Gender).trim().to_string(),
            employment_status: record.get(Field::EmploymentStatus).trim().to_string(),
            total_monthly_inflow: parse_amount(record.get(Field::TotalMonthlyInflow)),
            total_monthly_outflow: parse_amount(record.get(Field::TotalMonthlyOutflow)),
            transaction_frequency: parse_count(record.get(Field::TransactionFrequency)),
            salary_payment_detected: yes_no(record.get(Field::SalaryPaymentDetected)),
            end_of_month_balance: parse_amount(record.get(Field::EndOfMonthBalance)),
            highest_credit_amount: parse_amount(record.get(Field::HighestCreditAmount)),
            highest_debit_amount: parse_amount(record.get(Field::HighestDebitAmount)),
            gambling_transactions_count: parse_count(record.get(Field::GamblingTransactionsCount)),
            loan_related_transactions_count: parse_count(
                record.get(Field::LoanRelatedTransactionsCount),
            ),
            previous_loan_taken: yes_no(record.get(Field::PreviousLoanTaken)),
            previous_loan_amount: parse_amount(record.get(Field::PreviousLoanAmount)),
            repayment_status: repayment_status(record.get(Field::RepaymentStatus)),
            missed_payment_count: parse_count(record.get(Field::MissedPaymentCount)),
            airtime_spend_per_month: parse_amount(record.get(Field::AirtimeSpendPerMonth)),
            data_subscription_spend: parse_amount(record.get(Field::DataSubscriptionSpend)),
        }
    }
}

/// Amount fields may legitimately be negative (end-of-month balance); only
/// non-finite and unparseable values collapse to zero.
fn parse_amount(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

fn parse_count(raw: &str) -> u32 {
    let trimmed = raw.trim();
    if let Ok(count) = trimmed.parse::<u32>() {
        return count;
    }
    // Tolerate "12.0"-style entries from extraction merges.
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
        .map(|value| value as u32)
        .unwrap_or(0)
}

fn yes_no(raw: &str) -> String {
    match raw.trim().to_ascii_lowercase().as_str() {
        "yes" => "Yes".to_string(),
        _ => "No".to_string(),
    }
}

fn repayment_status(raw: &str) -> String {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on-time" => "On-time".to_string(),
        "late" => "Late".to_string(),
        _ => "N/A".to_string(),
    }
}
