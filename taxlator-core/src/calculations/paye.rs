//! PAYE / Personal Income Tax.
//!
//! Taxable income is annual gross income less statutory deductions:
//!
//! | Deduction   | Base         | Default rate | Toggle            |
//! |-------------|--------------|--------------|-------------------|
//! | Rent relief | annual gross | 20%          | always applied    |
//! | Pension     | annual gross | 8%           | `include_pension` |
//! | NHIS        | annual gross | 5%           | `include_nhis`    |
//! | NHF         | annual gross | 2.5%         | `include_nhf`     |
//! | Other       | flat amount  | n/a          | `other_deductions`|
//!
//! An explicit `rent_relief` amount replaces the percentage-based relief.
//! Taxable income is clamped at zero and then run through the PAYE bands of
//! the [`RateTable`].
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use taxlator_core::RateTable;
//! use taxlator_core::calculations::{PayeCalculator, PayeInput};
//!
//! let table = RateTable::nigeria_2026();
//! let calculator = PayeCalculator::new(&table);
//! let result = calculator.calculate(&PayeInput::new(dec!(10000000))).unwrap();
//!
//! assert_eq!(result.total_deductions, dec!(3550000.00));
//! assert_eq!(result.tax.total_tax, dec!(951000.00));
//! assert_eq!(result.monthly_tax, dec!(79250.00));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::CalculationError;
use crate::calculations::bands::{TaxResult, apply_bands};
use crate::calculations::common::{checked_sum, max, normalize_annual, round_half_up};
use crate::{Frequency, PayeDeductionRates, RateTable, TaxBand};

fn default_true() -> bool {
    true
}

/// Input for a PAYE/PIT calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayeInput {
    pub gross_income: Decimal,

    #[serde(default)]
    pub frequency: Frequency,

    #[serde(default = "default_true")]
    pub include_pension: bool,

    #[serde(default = "default_true")]
    pub include_nhis: bool,

    #[serde(default = "default_true")]
    pub include_nhf: bool,

    /// Annual rent relief claimed. `None` applies the table's rent relief rate.
    #[serde(default)]
    pub rent_relief: Option<Decimal>,

    /// Any further annual deductions.
    #[serde(default)]
    pub other_deductions: Decimal,
}

impl PayeInput {
    /// Annual income with every statutory deduction switched on.
    pub fn new(gross_income: Decimal) -> Self {
        Self {
            gross_income,
            frequency: Frequency::Annual,
            include_pension: true,
            include_nhis: true,
            include_nhf: true,
            rent_relief: None,
            other_deductions: Decimal::ZERO,
        }
    }
}

/// A named deduction line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deduction {
    pub label: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayeResult {
    /// Gross income as entered, before annualising.
    pub gross_income: Decimal,
    pub frequency: Frequency,
    pub annual_gross_income: Decimal,
    pub deductions: Vec<Deduction>,
    pub total_deductions: Decimal,
    #[serde(flatten)]
    pub tax: TaxResult,
    pub monthly_tax: Decimal,
    /// Annual gross income less total tax.
    pub net_income: Decimal,
}

/// Calculator for PAYE/PIT.
#[derive(Debug, Clone)]
pub struct PayeCalculator<'a> {
    bands: &'a [TaxBand],
    rates: &'a PayeDeductionRates,
}

impl<'a> PayeCalculator<'a> {
    pub fn new(table: &'a RateTable) -> Self {
        Self {
            bands: &table.paye_bands,
            rates: &table.paye_deductions,
        }
    }

    /// # Errors
    ///
    /// [`CalculationError::AmountOutOfRange`] when annualised income or the
    /// deduction total overflows.
    pub fn calculate(
        &self,
        input: &PayeInput,
    ) -> Result<PayeResult, CalculationError> {
        let annual_gross = normalize_annual(input.gross_income, input.frequency)?;
        let deductions = self.deductions(annual_gross, input);
        let total_deductions = checked_sum(deductions.iter().map(|d| d.amount), "total deductions")?;
        let taxable_income = self.taxable_income(annual_gross, total_deductions);

        let band_tax = apply_bands(taxable_income, self.bands);
        let tax = TaxResult::from_band_tax(taxable_income, annual_gross, &band_tax);

        debug!(
            %annual_gross,
            %total_deductions,
            %taxable_income,
            total_tax = %band_tax.total_tax,
            "calculated PAYE"
        );

        Ok(PayeResult {
            gross_income: input.gross_income,
            frequency: input.frequency,
            annual_gross_income: round_half_up(annual_gross),
            deductions: deductions
                .into_iter()
                .map(|d| Deduction {
                    amount: round_half_up(d.amount),
                    ..d
                })
                .collect(),
            total_deductions: round_half_up(total_deductions),
            monthly_tax: round_half_up(band_tax.total_tax / Decimal::from(12)),
            net_income: round_half_up(annual_gross - band_tax.total_tax),
            tax,
        })
    }

    /// Itemises the deductions that apply, unrounded.
    fn deductions(
        &self,
        annual_gross: Decimal,
        input: &PayeInput,
    ) -> Vec<Deduction> {
        let mut lines = Vec::new();

        match input.rent_relief {
            Some(amount) => lines.push(Deduction {
                label: "Rent relief".to_string(),
                amount,
            }),
            None => lines.push(percentage_line(
                "Rent relief",
                self.rates.rent_relief_rate,
                annual_gross,
            )),
        }
        if input.include_pension {
            lines.push(percentage_line("Pension", self.rates.pension_rate, annual_gross));
        }
        if input.include_nhis {
            lines.push(percentage_line(
                "National Health Insurance Scheme",
                self.rates.nhis_rate,
                annual_gross,
            ));
        }
        if input.include_nhf {
            lines.push(percentage_line(
                "National Housing Fund",
                self.rates.nhf_rate,
                annual_gross,
            ));
        }
        if input.other_deductions > Decimal::ZERO {
            lines.push(Deduction {
                label: "Other deductions".to_string(),
                amount: input.other_deductions,
            });
        }

        lines
    }

    fn taxable_income(
        &self,
        annual_gross: Decimal,
        total_deductions: Decimal,
    ) -> Decimal {
        max(annual_gross - total_deductions, Decimal::ZERO)
    }
}

fn percentage_line(
    name: &str,
    rate: Decimal,
    base: Decimal,
) -> Deduction {
    Deduction {
        label: format!("{name} ({}%)", (rate * Decimal::ONE_HUNDRED).normalize()),
        amount: base * rate,
    }
}
