use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A contiguous income range taxed at a single marginal rate.
///
/// `upper_bound` is the cumulative threshold where the band ends, not the
/// width of the band. The top band of a table has no upper bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBand {
    #[serde(default)]
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

impl TaxBand {
    pub fn bounded(
        upper_bound: Decimal,
        rate: Decimal,
    ) -> Self {
        Self {
            upper_bound: Some(upper_bound),
            rate,
        }
    }

    pub fn unbounded(rate: Decimal) -> Self {
        Self {
            upper_bound: None,
            rate,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.upper_bound.is_none()
    }
}
