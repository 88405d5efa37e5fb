//! Company Income Tax.
//!
//! A flat rate on profit, chosen by company size. The product
//! `profit * rate` is reported exactly, without rounding.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use taxlator_core::{CompanySize, RateTable};
//! use taxlator_core::calculations::CitCalculator;
//!
//! let table = RateTable::nigeria_2026();
//! let result = CitCalculator::new(&table)
//!     .calculate(dec!(120000000), dec!(70000000), CompanySize::Medium)
//!     .unwrap();
//!
//! assert_eq!(result.profit, dec!(50000000));
//! assert_eq!(result.tax_payable, dec!(10000000));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::CalculationError;
use crate::{CitRates, CompanySize, RateTable};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitInput {
    pub revenue: Decimal,
    #[serde(default)]
    pub expenses: Decimal,
    /// Classified from revenue when absent.
    #[serde(default)]
    pub company_size: Option<CompanySize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitResult {
    pub company_size: CompanySize,
    pub revenue: Decimal,
    pub expenses: Decimal,
    pub profit: Decimal,
    pub rate: Decimal,
    pub tax_payable: Decimal,
}

#[derive(Debug, Clone)]
pub struct CitCalculator<'a> {
    rates: &'a CitRates,
}

impl<'a> CitCalculator<'a> {
    pub fn new(table: &'a RateTable) -> Self {
        Self { rates: &table.cit }
    }

    /// # Errors
    ///
    /// Returns [`CalculationError::ExpensesExceedRevenue`] when `expenses`
    /// is larger than `revenue`, [`CalculationError::AmountOutOfRange`] when
    /// the profit does not fit.
    pub fn calculate(
        &self,
        revenue: Decimal,
        expenses: Decimal,
        company_size: CompanySize,
    ) -> Result<CitResult, CalculationError> {
        if expenses > revenue {
            return Err(CalculationError::ExpensesExceedRevenue { revenue, expenses });
        }

        let rate = self.rates.rate_for(company_size);
        let profit = revenue
            .checked_sub(expenses)
            .ok_or(CalculationError::AmountOutOfRange("profit"))?;
        let tax_payable = profit * rate;

        debug!(%company_size, %profit, %rate, %tax_payable, "calculated CIT");

        Ok(CitResult {
            company_size,
            revenue,
            expenses,
            profit,
            rate,
            tax_payable,
        })
    }

    /// Classifies the company by turnover, then calculates.
    ///
    /// # Errors
    ///
    /// Same as [`CitCalculator::calculate`].
    pub fn calculate_for_turnover(
        &self,
        revenue: Decimal,
        expenses: Decimal,
    ) -> Result<CitResult, CalculationError> {
        self.calculate(revenue, expenses, self.rates.classify(revenue))
    }

    pub fn calculate_input(
        &self,
        input: &CitInput,
    ) -> Result<CitResult, CalculationError> {
        match input.company_size {
            Some(size) => self.calculate(input.revenue, input.expenses, size),
            None => self.calculate_for_turnover(input.revenue, input.expenses),
        }
    }
}
