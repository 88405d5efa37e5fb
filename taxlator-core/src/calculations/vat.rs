//! Value Added Tax.
//!
//! Adding VAT treats the amount as VAT-exclusive; removing VAT treats it as
//! VAT-inclusive. Two of the three reported figures are rounded directly and
//! the third is derived from them, so `excluding_vat + vat_amount` always
//! equals `including_vat` exactly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::CalculationError;
use crate::calculations::common::round_half_up;
use crate::{CalculationType, RateTable, TransactionType, VatRates};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatRequest {
    pub transaction_amount: Decimal,
    pub calculation_type: CalculationType,
    #[serde(default)]
    pub transaction_type: Option<TransactionType>,
    /// Overrides the transaction type's default rate.
    #[serde(default)]
    pub rate: Option<Decimal>,
}

impl VatRequest {
    pub fn for_transaction(
        transaction_amount: Decimal,
        calculation_type: CalculationType,
        transaction_type: TransactionType,
    ) -> Self {
        Self {
            transaction_amount,
            calculation_type,
            transaction_type: Some(transaction_type),
            rate: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatResult {
    pub transaction_amount: Decimal,
    pub calculation_type: CalculationType,
    pub transaction_type: Option<TransactionType>,
    pub rate: Decimal,
    pub excluding_vat: Decimal,
    pub including_vat: Decimal,
    pub vat_amount: Decimal,
}

#[derive(Debug, Clone)]
pub struct VatCalculator<'a> {
    rates: &'a VatRates,
}

impl<'a> VatCalculator<'a> {
    pub fn new(table: &'a RateTable) -> Self {
        Self { rates: &table.vat }
    }

    /// # Errors
    ///
    /// [`CalculationError::MissingVatRate`] when neither a rate nor a
    /// transaction type is given, [`CalculationError::RateOutOfRange`] when
    /// the rate falls outside `[0, 1]`, [`CalculationError::AmountOutOfRange`]
    /// when the VAT-inclusive amount overflows.
    pub fn calculate(
        &self,
        request: &VatRequest,
    ) -> Result<VatResult, CalculationError> {
        let rate = self.resolve_rate(request)?;
        let amount = request.transaction_amount;

        let (excluding_vat, including_vat, vat_amount) = match request.calculation_type {
            CalculationType::Add => {
                let excluding = round_half_up(amount);
                let vat = round_half_up(amount * rate);
                let including = excluding
                    .checked_add(vat)
                    .ok_or(CalculationError::AmountOutOfRange("amount including VAT"))?;
                (excluding, including, vat)
            }
            CalculationType::Remove => {
                let including = round_half_up(amount);
                let excluding = round_half_up(amount / (Decimal::ONE + rate));
                (excluding, including, including - excluding)
            }
        };

        debug!(calculation_type = %request.calculation_type, %rate, %vat_amount, "calculated VAT");

        Ok(VatResult {
            transaction_amount: amount,
            calculation_type: request.calculation_type,
            transaction_type: request.transaction_type,
            rate,
            excluding_vat,
            including_vat,
            vat_amount,
        })
    }

    fn resolve_rate(
        &self,
        request: &VatRequest,
    ) -> Result<Decimal, CalculationError> {
        let rate = match (request.rate, request.transaction_type) {
            (Some(rate), _) => rate,
            (None, Some(transaction_type)) => self.rates.rate_for(transaction_type),
            (None, None) => return Err(CalculationError::MissingVatRate),
        };

        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(CalculationError::RateOutOfRange(rate));
        }

        Ok(rate)
    }
}
