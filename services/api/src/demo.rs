use clap::Args;
use std::sync::Arc;

use credit_assess::error::AppError;
use credit_assess::workflows::assessment::{
    AssessmentGateway, AssessmentService, AssessmentView, ExtractionConfidence, ExtractionOutcome,
    FeedbackContext, Field, GatewayError, NormalizedApplicant, Prediction, RiskCategory,
    SourceFileType, StatementInsights, StatementUpload,
};

use crate::infra::InMemorySessionStore;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Skip the bank-statement upload and fill the financial step manually.
    #[arg(long)]
    pub(crate) skip_statement: bool,
    /// Answer "Yes" to the previous-loan question to exercise the
    /// conditional requirements.
    #[arg(long)]
    pub(crate) previous_loan: bool,
    /// Simulate a feedback-service outage to show the best-effort stage.
    #[arg(long)]
    pub(crate) fail_feedback: bool,
}

/// Deterministic collaborator so the demo runs without a scoring deployment.
#[derive(Debug)]
struct CannedGateway {
    fail_feedback: bool,
}

impl AssessmentGateway for CannedGateway {
    fn extract(&self, upload: &StatementUpload) -> Result<ExtractionOutcome, GatewayError> {
        let source = upload.source_type().unwrap_or(SourceFileType::Csv);
        Ok(ExtractionOutcome::Extracted(StatementInsights {
            total_monthly_inflow: 485000.0,
            total_monthly_outflow: 322000.0,
            transaction_frequency: 63,
            salary_payment_detected: "Yes".to_string(),
            end_of_month_balance: 96500.0,
            highest_credit_amount: 250000.0,
            highest_debit_amount: 85000.0,
            gambling_transactions_count: 0,
            loan_related_transactions_count: 1,
            extraction_confidence: ExtractionConfidence::High,
            source_file_type: source,
        }))
    }

    fn predict(&self, applicant: &NormalizedApplicant) -> Result<Prediction, GatewayError> {
        // Rough shape of the real model's output so the demo numbers react
        // to the inputs: spend discipline pushes the score up.
        let savings = applicant.total_monthly_inflow - applicant.total_monthly_outflow;
        let score = if savings > 100000.0 { 78 } else { 55 };
        let probability = f64::from(100 - score) / 100.0;
        let category = if score >= 70 {
            RiskCategory::Low
        } else if score >= 40 {
            RiskCategory::Medium
        } else {
            RiskCategory::High
        };

        Ok(Prediction {
            loan_defaulted: u8::from(score < 40),
            default_probability: probability,
            credit_score: score,
            risk_category: category,
        })
    }

    fn feedback(&self, context: &FeedbackContext) -> Result<String, GatewayError> {
        if self.fail_feedback {
            return Err(GatewayError::Backend(
                "feedback generator offline".to_string(),
            ));
        }
        let name = if context.name.is_empty() {
            "This applicant".to_string()
        } else {
            context.name.clone()
        };
        Ok(format!(
            "{name} demonstrates steady income with salary payments detected and {} risk. Recommend {}.",
            context.risk_category.label().to_ascii_lowercase(),
            match context.risk_category {
                RiskCategory::Low => "approval",
                RiskCategory::Medium => "conditional approval pending further review",
                RiskCategory::High => "caution",
            }
        ))
    }

    fn health(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let store = Arc::new(InMemorySessionStore::default());
    let gateway = Arc::new(CannedGateway {
        fail_feedback: args.fail_feedback,
    });
    let service = AssessmentService::new(store, gateway);

    println!("=== Credit Worthiness Intake Demo ===\n");

    let view = service.start()?;
    let id = view.assessment_id.clone();
    println!("Opened session {} on step: {}", id.0, step_label(&view));

    let demographics = [
        (Field::FullName, "Adaeze Obi"),
        (Field::Age, "34"),
        (Field::Gender, "Female"),
        (Field::EmploymentStatus, "Employed"),
    ];
    for (field, value) in demographics {
        service.update_field(&id, field, value)?;
    }
    let view = service.advance(&id)?;
    println!("Demographics complete -> {}", step_label(&view));

    if args.skip_statement {
        println!("Filling the financial step manually (statement skipped).");
        let financials = [
            (Field::TotalMonthlyInflow, "485000"),
            (Field::TotalMonthlyOutflow, "322000"),
            (Field::TransactionFrequency, "63"),
            (Field::SalaryPaymentDetected, "Yes"),
            (Field::EndOfMonthBalance, "96500"),
            (Field::HighestCreditAmount, "250000"),
            (Field::HighestDebitAmount, "85000"),
            (Field::GamblingTransactionsCount, "0"),
            (Field::LoanRelatedTransactionsCount, "1"),
        ];
        for (field, value) in financials {
            service.update_field(&id, field, value)?;
        }
    } else {
        let upload = StatementUpload {
            filename: "june-statement.csv".to_string(),
            content: b"date,description,amount\n2025-06-28,SALARY PAYMENT,485000\n".to_vec(),
        };
        let view = service.upload_statement(&id, upload)?;
        println!(
            "Statement extracted: inflow {}, outflow {}, salary detected {}",
            view.wizard.record[&Field::TotalMonthlyInflow],
            view.wizard.record[&Field::TotalMonthlyOutflow],
            view.wizard.record[&Field::SalaryPaymentDetected],
        );
    }
    let view = service.advance(&id)?;
    println!("Financial profile complete -> {}", step_label(&view));

    if args.previous_loan {
        service.update_field(&id, Field::PreviousLoanTaken, "Yes")?;
        let view = service.get(&id)?;
        println!(
            "Previous loan answered Yes; now required: {:?}",
            view.wizard.required_fields
        );
        for (field, value) in [
            (Field::PreviousLoanAmount, "150000"),
            (Field::RepaymentStatus, "On-time"),
            (Field::MissedPaymentCount, "0"),
        ] {
            service.update_field(&id, field, value)?;
        }
    } else {
        service.update_field(&id, Field::PreviousLoanTaken, "No")?;
    }
    let view = service.advance(&id)?;
    println!("Loan history complete -> {}", step_label(&view));

    for (field, value) in [
        (Field::AirtimeSpendPerMonth, "4500"),
        (Field::DataSubscriptionSpend, "3500"),
    ] {
        service.update_field(&id, field, value)?;
    }

    println!("\nSubmitting for scoring...");
    let view = service.submit(&id)?;

    match view.wizard.result {
        Some(result) => {
            println!("Credit score:        {}/100", result.credit_score);
            println!("Risk category:       {}", result.risk_category.label());
            println!(
                "Default probability: {:.1}%",
                result.default_probability * 100.0
            );
            match result.feedback.text() {
                Some(text) => println!("Analyst feedback:    {text}"),
                None => println!("Analyst feedback:    unavailable (scoring result stands)"),
            }
        }
        None => {
            println!(
                "Submission did not complete: {}",
                view.wizard
                    .failure
                    .unwrap_or_else(|| "validation blocked the final step".to_string())
            );
        }
    }

    Ok(())
}

fn step_label(view: &AssessmentView) -> String {
    view.wizard
        .step_label
        .map(str::to_string)
        .unwrap_or_else(|| view.wizard.state.to_string())
}

