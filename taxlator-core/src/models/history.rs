use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calculations::CalculationError;

/// Which calculator produced a history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculationKind {
    Paye,
    Freelancer,
    Cit,
    Vat,
}

impl CalculationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paye => "paye",
            Self::Freelancer => "freelancer",
            Self::Cit => "cit",
            Self::Vat => "vat",
        }
    }
}

impl FromStr for CalculationKind {
    type Err = CalculationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paye" => Ok(Self::Paye),
            "freelancer" => Ok(Self::Freelancer),
            "cit" => Ok(Self::Cit),
            "vat" => Ok(Self::Vat),
            other => Err(CalculationError::UnknownCalculationKind(other.to_string())),
        }
    }
}

impl fmt::Display for CalculationKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored calculation: the request and the result, both as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub kind: CalculationKind,
    pub input: serde_json::Value,
    pub result: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// For creating new history records (no id or timestamp)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHistoryRecord {
    pub kind: CalculationKind,
    pub input: serde_json::Value,
    pub result: serde_json::Value,
}

impl NewHistoryRecord {
    /// Serializes a request/result pair into a record.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if either value cannot be represented
    /// as JSON.
    pub fn from_pair<I: Serialize, R: Serialize>(
        kind: CalculationKind,
        input: &I,
        result: &R,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind,
            input: serde_json::to_value(input)?,
            result: serde_json::to_value(result)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn kind_round_trips_through_its_name() {
        for kind in [
            CalculationKind::Paye,
            CalculationKind::Freelancer,
            CalculationKind::Cit,
            CalculationKind::Vat,
        ] {
            assert_eq!(kind.as_str().parse::<CalculationKind>(), Ok(kind));
        }
    }

    #[test]
    fn unknown_kind_is_not_reported_as_tax_type() {
        let result = "estimate".parse::<CalculationKind>();

        assert_eq!(result, Err(CalculationError::UnknownCalculationKind("estimate".to_string())));
    }
}
