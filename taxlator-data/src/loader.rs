use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use taxlator_core::{RateSchedule, RateTableError, TaxBand};
use thiserror::Error;
use tracing::info;

/// Errors that can occur when loading band data.
#[derive(Debug, Error)]
pub enum BandLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("No rate table is effective from {0}; add it to the rate file first")]
    TableNotFound(NaiveDate),

    #[error("Invalid band table: {0}")]
    RateTable(#[from] RateTableError),
}

impl From<csv::Error> for BandLoaderError {
    fn from(err: csv::Error) -> Self {
        BandLoaderError::CsvParse(err.to_string())
    }
}

/// Which band list of a rate table a CSV row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BandSchedule {
    Paye,
    Freelancer,
}

impl FromStr for BandSchedule {
    type Err = BandLoaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PAYE" | "PIT" | "PAYE/PIT" => Ok(Self::Paye),
            "FREELANCER" => Ok(Self::Freelancer),
            _ => Err(BandLoaderError::InvalidSchedule(s.to_string())),
        }
    }
}

impl fmt::Display for BandSchedule {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(match self {
            Self::Paye => "PAYE",
            Self::Freelancer => "FREELANCER",
        })
    }
}

/// One row of a band CSV file.
///
/// - `effective_from`: date of the rate table to update (e.g. 2026-01-01)
/// - `schedule`: `PAYE` or `FREELANCER`
/// - `upper_bound`: cumulative threshold, empty for the top band
/// - `rate`: marginal rate as a decimal (e.g. 0.15 for 15%)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BandRecord {
    pub effective_from: NaiveDate,
    pub schedule: String,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Replaces band lists in a [`RateSchedule`] from CSV data.
pub struct TaxBandLoader;

impl TaxBandLoader {
    /// Parse band records from any reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<BandRecord>, BandLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: BandRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Replaces the bands of every `(effective_from, schedule)` group found
    /// in `records`, keeping row order within a group. Loading the same
    /// records twice gives the same schedule.
    ///
    /// Nothing is changed unless every group applies and every table still
    /// validates. Returns the number of bands loaded.
    pub fn apply(
        schedule: &mut RateSchedule,
        records: &[BandRecord],
    ) -> Result<usize, BandLoaderError> {
        let mut groups: BTreeMap<(NaiveDate, BandSchedule), Vec<TaxBand>> = BTreeMap::new();

        for record in records {
            let band_schedule = record.schedule.parse::<BandSchedule>()?;
            groups
                .entry((record.effective_from, band_schedule))
                .or_default()
                .push(TaxBand {
                    upper_bound: record.upper_bound,
                    rate: record.rate,
                });
        }

        let mut tables = schedule.tables().to_vec();
        let mut loaded = 0;

        for ((effective_from, band_schedule), bands) in groups {
            let table = tables
                .iter_mut()
                .find(|t| t.effective_from == effective_from)
                .ok_or(BandLoaderError::TableNotFound(effective_from))?;

            loaded += bands.len();
            info!(%effective_from, schedule = %band_schedule, bands = bands.len(), "replacing band table");

            match band_schedule {
                BandSchedule::Paye => table.paye_bands = bands,
                BandSchedule::Freelancer => table.freelancer_bands = bands,
            }
        }

        *schedule = RateSchedule::new(tables)?;
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use taxlator_core::RateTable;

    use super::*;

    const TEST_CSV: &str = "effective_from,schedule,upper_bound,rate
2026-01-01,PAYE,1000000,0
2026-01-01,PAYE,5000000,0.10
2026-01-01,PAYE,,0.20
2026-01-01,FREELANCER,,0.12
";

    fn date(
        y: i32,
        m: u32,
        d: u32,
    ) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ============================================================
    // parse
    // ============================================================

    #[test]
    fn test_parse_single_band() {
        let csv = "effective_from,schedule,upper_bound,rate\n2026-01-01,PAYE,800000,0";

        let records = TaxBandLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(
            records,
            vec![BandRecord {
                effective_from: date(2026, 1, 1),
                schedule: "PAYE".to_string(),
                upper_bound: Some(dec!(800000)),
                rate: dec!(0),
            }]
        );
    }

    #[test]
    fn test_parse_unbounded_band() {
        let records = TaxBandLoader::parse(TEST_CSV.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(records.len(), 4);
        assert_eq!(records[2].upper_bound, None);
        assert_eq!(records[2].rate, dec!(0.20));
    }

    #[test]
    fn test_parse_missing_column() {
        let csv = "effective_from,schedule\n2026-01-01,PAYE";

        let err = TaxBandLoader::parse(csv.as_bytes()).expect_err("Should fail for missing column");

        let BandLoaderError::CsvParse(msg) = err else {
            panic!("Expected CsvParse error, got: {:?}", err);
        };
        assert!(msg.contains("missing field"), "got: {}", msg);
    }

    #[test]
    fn test_parse_bad_decimal() {
        let csv = "effective_from,schedule,upper_bound,rate\n2026-01-01,PAYE,abc,0.10";

        let result = TaxBandLoader::parse(csv.as_bytes());

        assert!(matches!(result, Err(BandLoaderError::CsvParse(_))));
    }

    #[test]
    fn test_schedule_names() {
        assert_eq!("paye".parse::<BandSchedule>().unwrap(), BandSchedule::Paye);
        assert_eq!("PAYE/PIT".parse::<BandSchedule>().unwrap(), BandSchedule::Paye);
        assert_eq!(" Freelancer ".parse::<BandSchedule>().unwrap(), BandSchedule::Freelancer);
        assert!(matches!(
            "CIT".parse::<BandSchedule>(),
            Err(BandLoaderError::InvalidSchedule(s)) if s == "CIT"
        ));
    }

    // ============================================================
    // apply
    // ============================================================

    #[test]
    fn test_apply_replaces_both_schedules() {
        let mut schedule = RateSchedule::default();
        let records = TaxBandLoader::parse(TEST_CSV.as_bytes()).unwrap();

        let loaded = TaxBandLoader::apply(&mut schedule, &records).unwrap();

        assert_eq!(loaded, 4);
        let table = &schedule.tables()[0];
        assert_eq!(
            table.paye_bands,
            vec![
                TaxBand::bounded(dec!(1000000), dec!(0)),
                TaxBand::bounded(dec!(5000000), dec!(0.10)),
                TaxBand::unbounded(dec!(0.20)),
            ]
        );
        assert_eq!(table.freelancer_bands, vec![TaxBand::unbounded(dec!(0.12))]);
        // Everything else is untouched.
        assert_eq!(table.vat, RateTable::nigeria_2026().vat);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let records = TaxBandLoader::parse(TEST_CSV.as_bytes()).unwrap();
        let mut once = RateSchedule::default();
        TaxBandLoader::apply(&mut once, &records).unwrap();

        let mut twice = once.clone();
        TaxBandLoader::apply(&mut twice, &records).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn test_apply_unknown_date() {
        let csv = "effective_from,schedule,upper_bound,rate\n2030-07-01,PAYE,,0.3";
        let records = TaxBandLoader::parse(csv.as_bytes()).unwrap();
        let mut schedule = RateSchedule::default();

        let err = TaxBandLoader::apply(&mut schedule, &records).unwrap_err();

        assert!(matches!(err, BandLoaderError::TableNotFound(d) if d == date(2030, 7, 1)));
        assert_eq!(schedule, RateSchedule::default());
    }

    #[test]
    fn test_apply_invalid_bands_leaves_schedule_unchanged() {
        // No unbounded top band.
        let csv = "effective_from,schedule,upper_bound,rate\n2026-01-01,PAYE,800000,0\n2026-01-01,PAYE,3000000,0.15";
        let records = TaxBandLoader::parse(csv.as_bytes()).unwrap();
        let mut schedule = RateSchedule::default();

        let err = TaxBandLoader::apply(&mut schedule, &records).unwrap_err();

        assert!(matches!(
            err,
            BandLoaderError::RateTable(RateTableError::UnboundedBandPlacement("PAYE"))
        ));
        assert_eq!(schedule, RateSchedule::default());
    }
}
