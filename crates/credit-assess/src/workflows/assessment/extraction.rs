use serde::{Deserialize, Serialize};

use super::domain::{ApplicantRecord, Field};

/// Statement formats the extraction collaborator accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceFileType {
    Pdf,
    Csv,
}

impl SourceFileType {
    pub const fn label(self) -> &'static str {
        match self {
            SourceFileType::Pdf => "PDF",
            SourceFileType::Csv => "CSV",
        }
    }

    pub fn from_filename(filename: &str) -> Option<Self> {
        let lowered = filename.trim().to_ascii_lowercase();
        if lowered.ends_with(".pdf") {
            Some(SourceFileType::Pdf)
        } else if lowered.ends_with(".csv") {
            Some(SourceFileType::Csv)
        } else {
            None
        }
    }
}

/// Raw statement bytes as received from the applicant.
#[derive(Debug, Clone)]
pub struct StatementUpload {
    pub filename: String,
    pub content: Vec<u8>,
}

impl StatementUpload {
    pub fn source_type(&self) -> Option<SourceFileType> {
        SourceFileType::from_filename(&self.filename)
    }
}

/// Identity of an uploaded statement, tracked separately from the values
/// derived from it so a later manual correction never loses the original
/// upload reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementHandle {
    pub filename: String,
    pub source: SourceFileType,
    pub byte_len: usize,
}

impl StatementHandle {
    pub fn for_upload(upload: &StatementUpload, source: SourceFileType) -> Self {
        Self {
            filename: upload.filename.clone(),
            source,
            byte_len: upload.content.len(),
        }
    }
}

/// Collaborator's self-reported confidence in the extracted values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionConfidence {
    High,
    Medium,
    Low,
}

/// Financial values derived from one bank statement, in the collaborator's
/// wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementInsights {
    pub total_monthly_inflow: f64,
    pub total_monthly_outflow: f64,
    pub transaction_frequency: u32,
    pub salary_payment_detected: String,
    pub end_of_month_balance: f64,
    pub highest_credit_amount: f64,
    pub highest_debit_amount: f64,
    pub gambling_transactions_count: u32,
    pub loan_related_transactions_count: u32,
    pub extraction_confidence: ExtractionConfidence,
    pub source_file_type: SourceFileType,
}

/// Business outcome of one extraction attempt. Unusable statements are data,
/// not errors; exceptional signaling is reserved for transport faults of the
/// gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExtractionOutcome {
    Extracted(StatementInsights),
    Unusable(String),
}

impl ExtractionOutcome {
    /// Advisory text for the caller when the statement could not be used.
    pub fn advisory(&self) -> Option<&str> {
        match self {
            ExtractionOutcome::Extracted(_) => None,
            ExtractionOutcome::Unusable(message) => Some(message),
        }
    }
}

/// Overlay extracted values onto the record. Only the nine financial fields
/// are written; the statement handle is owned by the upload action and is
/// not touched here.
pub(crate) fn merge_insights(
    record: &ApplicantRecord,
    insights: &StatementInsights,
) -> ApplicantRecord {
    record
        .with(
            Field::TotalMonthlyInflow,
            format_amount(insights.total_monthly_inflow),
        )
        .with(
            Field::TotalMonthlyOutflow,
            format_amount(insights.total_monthly_outflow),
        )
        .with(
            Field::TransactionFrequency,
            insights.transaction_frequency.to_string(),
        )
        .with(
            Field::SalaryPaymentDetected,
            insights.salary_payment_detected.clone(),
        )
        .with(
            Field::EndOfMonthBalance,
            format_amount(insights.end_of_month_balance),
        )
        .with(
            Field::HighestCreditAmount,
            format_amount(insights.highest_credit_amount),
        )
        .with(
            Field::HighestDebitAmount,
            format_amount(insights.highest_debit_amount),
        )
        .with(
            Field::GamblingTransactionsCount,
            insights.gambling_transactions_count.to_string(),
        )
        .with(
            Field::LoanRelatedTransactionsCount,
            insights.loan_related_transactions_count.to_string(),
        )
}

fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_type_is_detected_case_insensitively() {
        assert_eq!(
            SourceFileType::from_filename("statement.PDF"),
            Some(SourceFileType::Pdf)
        );
        assert_eq!(
            SourceFileType::from_filename("export.csv"),
            Some(SourceFileType::Csv)
        );
        assert_eq!(SourceFileType::from_filename("statement.docx"), None);
    }

    #[test]
    fn amounts_merge_without_spurious_decimals() {
        assert_eq!(format_amount(5000.0), "5000");
        assert_eq!(format_amount(5000.5), "5000.5");
        assert_eq!(format_amount(-120.0), "-120");
    }
}
