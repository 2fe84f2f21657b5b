use serde::{Deserialize, Serialize};

use super::domain::{ApplicantRecord, Field};

/// Closed identifiers for the wizard steps, in canonical order.
///
/// The registry carries no presentation concern; the rendering layer maps
/// each identifier to its view independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Demographics,
    Financial,
    LoanHistory,
    Behaviour,
}

impl StepId {
    pub const fn label(self) -> &'static str {
        match self {
            StepId::Demographics => "Demographics",
            StepId::Financial => "Financial profile",
            StepId::LoanHistory => "Loan history",
            StepId::Behaviour => "Spending behaviour",
        }
    }
}

/// Additional requirements activated by a trigger field holding an exact
/// value. The same metadata drives the release side effect: when an edit
/// moves the trigger off `trigger_value`, the dependent fields are reset to
/// their declared defaults.
#[derive(Debug, Clone)]
pub struct ConditionalRule {
    pub trigger: Field,
    pub trigger_value: &'static str,
    pub requires: Vec<Field>,
}

impl ConditionalRule {
    pub fn active(&self, record: &ApplicantRecord) -> bool {
        record.get(self.trigger) == self.trigger_value
    }
}

/// One logical grouping of fields with its own required/optional/conditional
/// rules. Order within [`IntakeBlueprint`] defines both the wizard order and
/// the canonical validation order.
#[derive(Debug, Clone)]
pub struct StepDefinition {
    pub id: StepId,
    pub required: Vec<Field>,
    pub optional: Vec<Field>,
    pub conditional: Vec<ConditionalRule>,
}

impl StepDefinition {
    pub fn label(&self) -> &'static str {
        self.id.label()
    }
}

/// Immutable ordered list of step definitions, built once per deployment.
#[derive(Debug, Clone)]
pub struct IntakeBlueprint {
    steps: Vec<StepDefinition>,
}

impl IntakeBlueprint {
    pub fn standard() -> Self {
        Self {
            steps: standard_steps(),
        }
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&StepDefinition> {
        self.steps.get(index)
    }

    pub fn last_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    /// All conditional rules whose trigger is the given field, across steps.
    pub fn rules_for_trigger(&self, field: Field) -> impl Iterator<Item = &ConditionalRule> {
        self.steps
            .iter()
            .flat_map(|step| step.conditional.iter())
            .filter(move |rule| rule.trigger == field)
    }
}

impl Default for IntakeBlueprint {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_steps() -> Vec<StepDefinition> {
    vec![
        StepDefinition {
            id: StepId::Demographics,
            required: vec![Field::Age, Field::Gender, Field::EmploymentStatus],
            optional: vec![Field::FullName],
            conditional: Vec::new(),
        },
        StepDefinition {
            id: StepId::Financial,
            required: vec![
                Field::TotalMonthlyInflow,
                Field::TotalMonthlyOutflow,
                Field::TransactionFrequency,
                Field::SalaryPaymentDetected,
                Field::EndOfMonthBalance,
                Field::HighestCreditAmount,
                Field::HighestDebitAmount,
                Field::GamblingTransactionsCount,
                Field::LoanRelatedTransactionsCount,
            ],
            optional: Vec::new(),
            conditional: Vec::new(),
        },
        StepDefinition {
            id: StepId::LoanHistory,
            required: vec![Field::PreviousLoanTaken],
            optional: vec![
                Field::PreviousLoanAmount,
                Field::RepaymentStatus,
                Field::MissedPaymentCount,
            ],
            conditional: vec![ConditionalRule {
                trigger: Field::PreviousLoanTaken,
                trigger_value: "Yes",
                requires: vec![
                    Field::PreviousLoanAmount,
                    Field::RepaymentStatus,
                    Field::MissedPaymentCount,
                ],
            }],
        },
        StepDefinition {
            id: StepId::Behaviour,
            required: vec![Field::AirtimeSpendPerMonth, Field::DataSubscriptionSpend],
            optional: Vec::new(),
            conditional: Vec::new(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_blueprint_has_four_ordered_steps() {
        let blueprint = IntakeBlueprint::standard();
        let ids: Vec<StepId> = blueprint.steps().iter().map(|step| step.id).collect();
        assert_eq!(
            ids,
            vec![
                StepId::Demographics,
                StepId::Financial,
                StepId::LoanHistory,
                StepId::Behaviour
            ]
        );
        assert_eq!(blueprint.last_index(), 3);
    }

    #[test]
    fn loan_history_rule_triggers_on_yes_only() {
        let blueprint = IntakeBlueprint::standard();
        let rule = blueprint
            .rules_for_trigger(Field::PreviousLoanTaken)
            .next()
            .expect("loan history rule present");

        let record = ApplicantRecord::new().with(Field::PreviousLoanTaken, "Yes");
        assert!(rule.active(&record));

        let record = record.with(Field::PreviousLoanTaken, "No");
        assert!(!rule.active(&record));
    }

    #[test]
    fn every_field_appears_in_exactly_one_step() {
        let blueprint = IntakeBlueprint::standard();
        for field in Field::ALL {
            let occurrences = blueprint
                .steps()
                .iter()
                .filter(|step| step.required.contains(&field) || step.optional.contains(&field))
                .count();
            assert_eq!(occurrences, 1, "{:?} should belong to one step", field);
        }
    }
}
