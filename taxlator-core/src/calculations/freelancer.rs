//! Freelancer / self-employed income tax.
//!
//! Pension contributions and business expenses come straight off annual
//! gross income; the remainder (never below zero) runs through the
//! freelancer bands.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::CalculationError;
use crate::calculations::bands::{TaxResult, apply_bands};
use crate::calculations::common::{checked_sum, max, normalize_annual, round_half_up};
use crate::{Frequency, RateTable, TaxBand};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreelancerInput {
    pub gross_income: Decimal,
    #[serde(default)]
    pub frequency: Frequency,
    /// Annual pension contributions.
    #[serde(default)]
    pub pension: Decimal,
    /// Annual allowable business expenses.
    #[serde(default)]
    pub expenses: Decimal,
}

impl FreelancerInput {
    pub fn new(gross_income: Decimal) -> Self {
        Self {
            gross_income,
            frequency: Frequency::Annual,
            pension: Decimal::ZERO,
            expenses: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreelancerResult {
    pub gross_income: Decimal,
    pub frequency: Frequency,
    pub annual_gross_income: Decimal,
    pub pension: Decimal,
    pub expenses: Decimal,
    #[serde(flatten)]
    pub tax: TaxResult,
    pub monthly_tax: Decimal,
}

#[derive(Debug, Clone)]
pub struct FreelancerCalculator<'a> {
    bands: &'a [TaxBand],
}

impl<'a> FreelancerCalculator<'a> {
    pub fn new(table: &'a RateTable) -> Self {
        Self {
            bands: &table.freelancer_bands,
        }
    }

    /// # Errors
    ///
    /// [`CalculationError::AmountOutOfRange`] when annualised income or
    /// pension plus expenses overflows.
    pub fn calculate(
        &self,
        input: &FreelancerInput,
    ) -> Result<FreelancerResult, CalculationError> {
        let annual_gross = normalize_annual(input.gross_income, input.frequency)?;
        let reliefs = checked_sum([input.pension, input.expenses], "pension and expenses")?;
        let taxable_income = max(annual_gross - reliefs, Decimal::ZERO);

        let band_tax = apply_bands(taxable_income, self.bands);

        debug!(%annual_gross, %taxable_income, total_tax = %band_tax.total_tax, "calculated freelancer tax");

        Ok(FreelancerResult {
            gross_income: input.gross_income,
            frequency: input.frequency,
            annual_gross_income: round_half_up(annual_gross),
            pension: round_half_up(input.pension),
            expenses: round_half_up(input.expenses),
            monthly_tax: round_half_up(band_tax.total_tax / Decimal::from(12)),
            tax: TaxResult::from_band_tax(taxable_income, annual_gross, &band_tax),
        })
    }
}
