//! Government-set rates, held as data rather than constants.
//!
//! A [`RateTable`] carries every threshold and rate the calculators need for
//! one effective date. A [`RateSchedule`] keeps several tables so that a
//! rate change only means adding a table with a later `effective_from`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{CompanySize, TaxBand, TransactionType};

/// Errors found while validating a rate table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateTableError {
    /// A band list has no entries.
    #[error("{0} band table is empty")]
    EmptyBands(&'static str),

    /// A band's upper bound is not above the previous one.
    #[error("{table} band {index} upper bound {bound} is not above the previous bound")]
    BoundsNotAscending {
        table: &'static str,
        index: usize,
        bound: Decimal,
    },

    /// The last band must be the only unbounded one.
    #[error("{0} band table must end with exactly one unbounded band")]
    UnboundedBandPlacement(&'static str),

    /// A rate lies outside [0, 1].
    #[error("{field} rate must be between 0 and 1, got {rate}")]
    RateOutOfRange { field: String, rate: Decimal },

    /// The CIT turnover ceilings are not ordered small < medium.
    #[error("CIT turnover ceilings must satisfy 0 <= small ({small}) < medium ({medium})")]
    InvalidTurnoverCeilings { small: Decimal, medium: Decimal },

    /// Two tables in a schedule share an effective date.
    #[error("more than one rate table is effective from {0}")]
    DuplicateEffectiveDate(NaiveDate),
}

/// Statutory PAYE/PIT deduction rates, each applied to annual gross income.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayeDeductionRates {
    pub rent_relief_rate: Decimal,
    pub pension_rate: Decimal,
    pub nhis_rate: Decimal,
    pub nhf_rate: Decimal,
}

/// Company income tax rates per size tier, plus the turnover ceilings used
/// to classify a company when its size is not given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitRates {
    pub small: Decimal,
    pub medium: Decimal,
    pub large: Decimal,
    pub small_turnover_ceiling: Decimal,
    pub medium_turnover_ceiling: Decimal,
}

impl CitRates {
    pub fn rate_for(
        &self,
        size: CompanySize,
    ) -> Decimal {
        match size {
            CompanySize::Small => self.small,
            CompanySize::Medium => self.medium,
            CompanySize::Large => self.large,
        }
    }

    /// Classifies a company by annual turnover. Ceilings are inclusive.
    pub fn classify(
        &self,
        turnover: Decimal,
    ) -> CompanySize {
        if turnover <= self.small_turnover_ceiling {
            CompanySize::Small
        } else if turnover <= self.medium_turnover_ceiling {
            CompanySize::Medium
        } else {
            CompanySize::Large
        }
    }
}

/// Default VAT rate per transaction category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatRates {
    pub domestic: Decimal,
    pub digital: Decimal,
    pub export: Decimal,
    pub exempt: Decimal,
}

impl VatRates {
    pub fn rate_for(
        &self,
        transaction_type: TransactionType,
    ) -> Decimal {
        match transaction_type {
            TransactionType::Domestic => self.domestic,
            TransactionType::Digital => self.digital,
            TransactionType::Export => self.export,
            TransactionType::Exempt => self.exempt,
        }
    }
}

/// Every rate and threshold in force from `effective_from` onwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    pub effective_from: NaiveDate,
    pub paye_bands: Vec<TaxBand>,
    pub freelancer_bands: Vec<TaxBand>,
    pub paye_deductions: PayeDeductionRates,
    pub cit: CitRates,
    pub vat: VatRates,
}

impl RateTable {
    /// Rates under the Nigeria Tax Act, in force from 1 January 2026.
    pub fn nigeria_2026() -> Self {
        let bands = vec![
            TaxBand::bounded(dec!(800000), dec!(0)),
            TaxBand::bounded(dec!(3000000), dec!(0.15)),
            TaxBand::bounded(dec!(12000000), dec!(0.18)),
            TaxBand::bounded(dec!(25000000), dec!(0.21)),
            TaxBand::bounded(dec!(50000000), dec!(0.23)),
            TaxBand::unbounded(dec!(0.25)),
        ];

        Self {
            effective_from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or(NaiveDate::MIN),
            paye_bands: bands.clone(),
            freelancer_bands: bands,
            paye_deductions: PayeDeductionRates {
                rent_relief_rate: dec!(0.20),
                pension_rate: dec!(0.08),
                nhis_rate: dec!(0.05),
                nhf_rate: dec!(0.025),
            },
            cit: CitRates {
                small: dec!(0),
                medium: dec!(0.20),
                large: dec!(0.30),
                small_turnover_ceiling: dec!(50000000),
                medium_turnover_ceiling: dec!(300000000),
            },
            vat: VatRates {
                domestic: dec!(0.075),
                digital: dec!(0.075),
                export: dec!(0),
                exempt: dec!(0),
            },
        }
    }

    /// Validates band ordering and that every rate lies in [0, 1].
    ///
    /// # Errors
    ///
    /// Returns the first [`RateTableError`] found.
    pub fn validate(&self) -> Result<(), RateTableError> {
        validate_bands("PAYE", &self.paye_bands)?;
        validate_bands("freelancer", &self.freelancer_bands)?;

        let d = &self.paye_deductions;
        check_rate("rent relief", d.rent_relief_rate)?;
        check_rate("pension", d.pension_rate)?;
        check_rate("NHIS", d.nhis_rate)?;
        check_rate("NHF", d.nhf_rate)?;

        for size in CompanySize::all() {
            check_rate(&format!("CIT {size}"), self.cit.rate_for(*size))?;
        }
        if self.cit.small_turnover_ceiling < Decimal::ZERO
            || self.cit.small_turnover_ceiling >= self.cit.medium_turnover_ceiling
        {
            return Err(RateTableError::InvalidTurnoverCeilings {
                small: self.cit.small_turnover_ceiling,
                medium: self.cit.medium_turnover_ceiling,
            });
        }

        for transaction_type in TransactionType::all() {
            check_rate(
                &format!("VAT {transaction_type}"),
                self.vat.rate_for(*transaction_type),
            )?;
        }

        Ok(())
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::nigeria_2026()
    }
}

fn check_rate(
    field: &str,
    rate: Decimal,
) -> Result<(), RateTableError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(RateTableError::RateOutOfRange {
            field: field.to_string(),
            rate,
        });
    }
    Ok(())
}

fn validate_bands(
    table: &'static str,
    bands: &[TaxBand],
) -> Result<(), RateTableError> {
    let Some((last, bounded)) = bands.split_last() else {
        return Err(RateTableError::EmptyBands(table));
    };

    if !last.is_unbounded() {
        return Err(RateTableError::UnboundedBandPlacement(table));
    }

    let mut previous = Decimal::ZERO;
    for (index, band) in bounded.iter().enumerate() {
        let bound = band
            .upper_bound
            .ok_or(RateTableError::UnboundedBandPlacement(table))?;
        if bound <= previous {
            return Err(RateTableError::BoundsNotAscending {
                table,
                index,
                bound,
            });
        }
        previous = bound;
    }

    for band in bands {
        check_rate(&format!("{table} band"), band.rate)?;
    }

    Ok(())
}

/// Rate tables versioned by effective date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSchedule {
    tables: Vec<RateTable>,
}

impl RateSchedule {
    /// Builds a schedule, sorting tables by effective date.
    ///
    /// # Errors
    ///
    /// Returns [`RateTableError`] if any table is invalid or two tables share
    /// an effective date.
    pub fn new(mut tables: Vec<RateTable>) -> Result<Self, RateTableError> {
        tables.sort_by_key(|t| t.effective_from);
        for pair in tables.windows(2) {
            if pair[0].effective_from == pair[1].effective_from {
                return Err(RateTableError::DuplicateEffectiveDate(pair[0].effective_from));
            }
        }
        for table in &tables {
            table.validate()?;
        }
        Ok(Self { tables })
    }

    pub fn tables(&self) -> &[RateTable] {
        &self.tables
    }

    /// The table in force on `date`: the latest one effective on or before it.
    pub fn for_date(
        &self,
        date: NaiveDate,
    ) -> Option<&RateTable> {
        self.tables
            .iter()
            .rev()
            .find(|t| t.effective_from <= date)
    }

    pub fn latest(&self) -> Option<&RateTable> {
        self.tables.last()
    }
}

impl Default for RateSchedule {
    fn default() -> Self {
        Self {
            tables: vec![RateTable::nigeria_2026()],
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn date(
        y: i32,
        m: u32,
        d: u32,
    ) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn builtin_table_is_valid() {
        assert_eq!(RateTable::nigeria_2026().validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_empty_bands() {
        let mut table = RateTable::nigeria_2026();
        table.paye_bands.clear();

        assert_eq!(table.validate(), Err(RateTableError::EmptyBands("PAYE")));
    }

    #[test]
    fn validate_rejects_bounded_top_band() {
        let mut table = RateTable::nigeria_2026();
        table.freelancer_bands = vec![TaxBand::bounded(dec!(1000), dec!(0.1))];

        assert_eq!(
            table.validate(),
            Err(RateTableError::UnboundedBandPlacement("freelancer"))
        );
    }

    #[test]
    fn validate_rejects_unbounded_band_in_the_middle() {
        let mut table = RateTable::nigeria_2026();
        table.paye_bands = vec![
            TaxBand::unbounded(dec!(0.1)),
            TaxBand::unbounded(dec!(0.2)),
        ];

        assert_eq!(
            table.validate(),
            Err(RateTableError::UnboundedBandPlacement("PAYE"))
        );
    }

    #[test]
    fn validate_rejects_descending_bounds() {
        let mut table = RateTable::nigeria_2026();
        table.paye_bands = vec![
            TaxBand::bounded(dec!(5000), dec!(0.1)),
            TaxBand::bounded(dec!(4000), dec!(0.2)),
            TaxBand::unbounded(dec!(0.3)),
        ];

        assert_eq!(
            table.validate(),
            Err(RateTableError::BoundsNotAscending {
                table: "PAYE",
                index: 1,
                bound: dec!(4000),
            })
        );
    }

    #[test]
    fn validate_rejects_rate_above_one() {
        let mut table = RateTable::nigeria_2026();
        table.vat.digital = dec!(7.5);

        assert_eq!(
            table.validate(),
            Err(RateTableError::RateOutOfRange {
                field: "VAT Digital Services".to_string(),
                rate: dec!(7.5),
            })
        );
    }

    #[test]
    fn validate_rejects_inverted_turnover_ceilings() {
        let mut table = RateTable::nigeria_2026();
        table.cit.medium_turnover_ceiling = dec!(10);

        assert!(matches!(
            table.validate(),
            Err(RateTableError::InvalidTurnoverCeilings { .. })
        ));
    }

    #[test]
    fn classify_uses_inclusive_ceilings() {
        let cit = RateTable::nigeria_2026().cit;

        assert_eq!(cit.classify(dec!(50000000)), CompanySize::Small);
        assert_eq!(cit.classify(dec!(50000000.01)), CompanySize::Medium);
        assert_eq!(cit.classify(dec!(300000000)), CompanySize::Medium);
        assert_eq!(cit.classify(dec!(300000001)), CompanySize::Large);
    }

    #[test]
    fn schedule_picks_latest_table_in_force() {
        let mut later = RateTable::nigeria_2026();
        later.effective_from = date(2027, 7, 1);
        later.vat.domestic = dec!(0.10);
        let schedule = RateSchedule::new(vec![later, RateTable::nigeria_2026()]).unwrap();

        assert_eq!(
            schedule.for_date(date(2027, 6, 30)).unwrap().vat.domestic,
            dec!(0.075)
        );
        assert_eq!(
            schedule.for_date(date(2027, 7, 1)).unwrap().vat.domestic,
            dec!(0.10)
        );
        assert_eq!(schedule.latest().unwrap().effective_from, date(2027, 7, 1));
    }

    #[test]
    fn schedule_has_no_table_before_first_effective_date() {
        let schedule = RateSchedule::default();

        assert!(schedule.for_date(date(2025, 12, 31)).is_none());
    }

    #[test]
    fn schedule_rejects_duplicate_effective_dates() {
        let result = RateSchedule::new(vec![RateTable::nigeria_2026(), RateTable::nigeria_2026()]);

        assert_eq!(
            result,
            Err(RateTableError::DuplicateEffectiveDate(date(2026, 1, 1)))
        );
    }
}
