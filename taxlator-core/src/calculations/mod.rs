pub mod bands;
pub mod cit;
pub mod common;
mod error;
pub mod freelancer;
pub mod paye;
pub mod vat;

use serde::{Deserialize, Serialize};

pub use bands::{BandBreakdown, BandTax, TaxResult, apply_bands};
pub use cit::{CitCalculator, CitInput, CitResult};
pub use error::CalculationError;
pub use freelancer::{FreelancerCalculator, FreelancerInput, FreelancerResult};
pub use paye::{Deduction, PayeCalculator, PayeInput, PayeResult};
pub use vat::{VatCalculator, VatRequest, VatResult};

use crate::{CalculationKind, RateTable, TaxType};

/// One income-tax calculation, tagged by tax type.
///
/// The tag uses the [`TaxType`] spellings (`PAYE/PIT`, `FREELANCER`, `CIT`);
/// lowercase names are accepted on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tax_type")]
pub enum TaxRequest {
    #[serde(rename = "PAYE/PIT", alias = "paye", alias = "PAYE")]
    Paye(PayeInput),
    #[serde(rename = "FREELANCER", alias = "freelancer")]
    Freelancer(FreelancerInput),
    #[serde(rename = "CIT", alias = "cit")]
    Cit(CitInput),
}

impl TaxRequest {
    pub fn tax_type(&self) -> TaxType {
        match self {
            TaxRequest::Paye(_) => TaxType::Paye,
            TaxRequest::Freelancer(_) => TaxType::Freelancer,
            TaxRequest::Cit(_) => TaxType::Cit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaxOutcome {
    Paye(PayeResult),
    Freelancer(FreelancerResult),
    Cit(CitResult),
}

impl TaxOutcome {
    /// The amount of tax owed, whichever calculator produced it.
    pub fn total_tax(&self) -> rust_decimal::Decimal {
        match self {
            TaxOutcome::Paye(result) => result.tax.total_tax,
            TaxOutcome::Freelancer(result) => result.tax.total_tax,
            TaxOutcome::Cit(result) => result.tax_payable,
        }
    }
}

/// Runs every calculator against one rate table.
#[derive(Debug, Clone, Copy)]
pub struct Calculator<'a> {
    table: &'a RateTable,
}

impl<'a> Calculator<'a> {
    pub fn new(table: &'a RateTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'a RateTable {
        self.table
    }

    pub fn calculate_tax(
        &self,
        request: &TaxRequest,
    ) -> Result<TaxOutcome, CalculationError> {
        match request {
            TaxRequest::Paye(input) => PayeCalculator::new(self.table)
                .calculate(input)
                .map(TaxOutcome::Paye),
            TaxRequest::Freelancer(input) => FreelancerCalculator::new(self.table)
                .calculate(input)
                .map(TaxOutcome::Freelancer),
            TaxRequest::Cit(input) => CitCalculator::new(self.table)
                .calculate_input(input)
                .map(TaxOutcome::Cit),
        }
    }

    pub fn calculate_vat(
        &self,
        request: &VatRequest,
    ) -> Result<VatResult, CalculationError> {
        VatCalculator::new(self.table).calculate(request)
    }
}

impl From<TaxType> for CalculationKind {
    fn from(tax_type: TaxType) -> Self {
        match tax_type {
            TaxType::Paye => CalculationKind::Paye,
            TaxType::Freelancer => CalculationKind::Freelancer,
            TaxType::Cit => CalculationKind::Cit,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::CompanySize;

    #[test]
    fn dispatches_on_request_variant() {
        let table = RateTable::nigeria_2026();
        let calculator = Calculator::new(&table);

        let paye = calculator
            .calculate_tax(&TaxRequest::Paye(PayeInput::new(dec!(10000000))))
            .unwrap();
        let freelancer = calculator
            .calculate_tax(&TaxRequest::Freelancer(FreelancerInput::new(dec!(5000000))))
            .unwrap();
        let cit = calculator
            .calculate_tax(&TaxRequest::Cit(CitInput {
                revenue: dec!(10),
                expenses: dec!(0),
                company_size: Some(CompanySize::Large),
            }))
            .unwrap();

        assert_eq!(paye.total_tax(), dec!(951000));
        assert_eq!(freelancer.total_tax(), dec!(690000));
        assert_eq!(cit.total_tax(), dec!(3));
    }

    #[test]
    fn cit_errors_pass_through() {
        let table = RateTable::nigeria_2026();
        let request = TaxRequest::Cit(CitInput {
            revenue: dec!(1),
            expenses: dec!(2),
            company_size: Some(CompanySize::Small),
        });

        let result = Calculator::new(&table).calculate_tax(&request);

        assert!(matches!(result, Err(CalculationError::ExpensesExceedRevenue { .. })));
    }

    #[test]
    fn request_deserializes_from_tagged_json() {
        let request: TaxRequest = serde_json::from_str(
            r#"{"tax_type": "freelancer", "gross_income": "400000", "frequency": "monthly", "expenses": "100000"}"#,
        )
        .unwrap();

        assert_eq!(request.tax_type(), TaxType::Freelancer);
        assert_eq!(
            request,
            TaxRequest::Freelancer(FreelancerInput {
                gross_income: dec!(400000),
                frequency: crate::Frequency::Monthly,
                pension: dec!(0),
                expenses: dec!(100000),
            })
        );
    }

    #[test]
    fn request_tag_matches_tax_type_spelling() {
        let requests = [
            TaxRequest::Paye(PayeInput::new(dec!(5000000))),
            TaxRequest::Freelancer(FreelancerInput::new(dec!(5000000))),
            TaxRequest::Cit(CitInput {
                revenue: dec!(10),
                expenses: dec!(0),
                company_size: None,
            }),
        ];

        for request in requests {
            let json = serde_json::to_value(&request).unwrap();

            assert_eq!(json["tax_type"], serde_json::to_value(request.tax_type()).unwrap());
            assert_eq!(serde_json::from_value::<TaxRequest>(json).unwrap(), request);
        }
    }

    #[test]
    fn paye_request_deserializes_from_tax_type_name() {
        let request: TaxRequest =
            serde_json::from_str(r#"{"tax_type": "PAYE/PIT", "gross_income": "5000000"}"#).unwrap();

        assert_eq!(request, TaxRequest::Paye(PayeInput::new(dec!(5000000))));
        assert_eq!(serde_json::to_string(&request.tax_type()).unwrap(), r#""PAYE/PIT""#);
    }

    #[test]
    fn overflow_in_band_calculators_passes_through() {
        let table = RateTable::nigeria_2026();
        let request = TaxRequest::Paye(PayeInput {
            frequency: crate::Frequency::Monthly,
            ..PayeInput::new(rust_decimal::Decimal::MAX)
        });

        let result = Calculator::new(&table).calculate_tax(&request);

        assert_eq!(result, Err(CalculationError::AmountOutOfRange("annual income")));
    }

    #[test]
    fn tax_type_maps_to_history_kind() {
        assert_eq!(CalculationKind::from(TaxType::Paye), CalculationKind::Paye);
        assert_eq!(CalculationKind::from(TaxType::Cit), CalculationKind::Cit);
    }
}
