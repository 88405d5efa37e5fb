//! Progressive band tax.
//!
//! Walks an ordered band table, taxing each slice of income at the band's
//! marginal rate. Amounts are left unrounded here; callers round their
//! reported figures once, at the end.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use taxlator_core::RateTable;
//! use taxlator_core::calculations::apply_bands;
//!
//! let table = RateTable::nigeria_2026();
//! let result = apply_bands(dec!(5000000), &table.paye_bands);
//!
//! assert_eq!(result.total_tax, dec!(690000));
//! assert_eq!(result.breakdown.len(), 3);
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::TaxBand;
use crate::calculations::common::{effective_rate, round_half_up};

/// The share of income that fell into one band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandBreakdown {
    pub rate: Decimal,
    pub taxable_amount: Decimal,
    pub tax_for_band: Decimal,
}

impl BandBreakdown {
    /// Same entry with both amounts rounded to two places.
    pub fn rounded(&self) -> Self {
        Self {
            rate: self.rate,
            taxable_amount: round_half_up(self.taxable_amount),
            tax_for_band: round_half_up(self.tax_for_band),
        }
    }
}

/// Unrounded output of [`apply_bands`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BandTax {
    pub total_tax: Decimal,
    pub breakdown: Vec<BandBreakdown>,
}

/// Reported outcome of a band calculation, rounded to two places.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxResult {
    pub taxable_income: Decimal,
    pub total_tax: Decimal,
    /// Total tax over annual gross income, to four places.
    pub effective_rate: Decimal,
    pub breakdown: Vec<BandBreakdown>,
}

impl TaxResult {
    /// Rounds a [`BandTax`] for reporting. `gross_income` is the base for the
    /// effective rate.
    pub fn from_band_tax(
        taxable_income: Decimal,
        gross_income: Decimal,
        band_tax: &BandTax,
    ) -> Self {
        Self {
            taxable_income: round_half_up(taxable_income),
            total_tax: round_half_up(band_tax.total_tax),
            effective_rate: effective_rate(band_tax.total_tax, gross_income),
            breakdown: band_tax.breakdown.iter().map(BandBreakdown::rounded).collect(),
        }
    }
}

/// Applies `bands` to `taxable_income`.
///
/// Bands must be sorted by ascending upper bound, with the unbounded band
/// last. Income at or below zero yields zero tax and an empty breakdown.
/// Bands that receive no income are left out of the breakdown.
pub fn apply_bands(
    taxable_income: Decimal,
    bands: &[TaxBand],
) -> BandTax {
    let mut remaining = taxable_income;
    let mut last_limit = Decimal::ZERO;
    let mut result = BandTax::default();

    for band in bands {
        if remaining <= Decimal::ZERO {
            break;
        }

        let taxable_at_band = match band.upper_bound {
            Some(upper) => (upper - last_limit).min(remaining),
            None => remaining,
        };

        if taxable_at_band > Decimal::ZERO {
            let tax_for_band = taxable_at_band * band.rate;
            result.total_tax += tax_for_band;
            result.breakdown.push(BandBreakdown {
                rate: band.rate,
                taxable_amount: taxable_at_band,
                tax_for_band,
            });
            remaining -= taxable_at_band;
        }

        if let Some(upper) = band.upper_bound {
            last_limit = upper;
        }
    }

    result
}
