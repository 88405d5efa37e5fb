use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::calculations::CalculationError;

/// Whether the transaction amount excludes VAT (`Add`) or already includes
/// it (`Remove`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculationType {
    Add,
    Remove,
}

impl CalculationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }
}

impl FromStr for CalculationType {
    type Err = CalculationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "remove" => Ok(Self::Remove),
            other => Err(CalculationError::UnknownCalculationType(other.to_string())),
        }
    }
}

impl fmt::Display for CalculationType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction category that determines the default VAT rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "Domestic sale/Purchase")]
    Domestic,
    #[serde(rename = "Digital Services")]
    Digital,
    #[serde(rename = "Export/International")]
    Export,
    #[serde(rename = "Exempt")]
    Exempt,
}

impl TransactionType {
    pub fn all() -> &'static [TransactionType] {
        &[
            TransactionType::Domestic,
            TransactionType::Digital,
            TransactionType::Export,
            TransactionType::Exempt,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Domestic => "Domestic sale/Purchase",
            Self::Digital => "Digital Services",
            Self::Export => "Export/International",
            Self::Exempt => "Exempt",
        }
    }

    /// Short lowercase alias accepted on the command line.
    pub fn alias(&self) -> &'static str {
        match self {
            Self::Domestic => "domestic",
            Self::Digital => "digital",
            Self::Export => "export",
            Self::Exempt => "exempt",
        }
    }
}

impl FromStr for TransactionType {
    type Err = CalculationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s || t.alias() == s)
            .ok_or_else(|| CalculationError::UnknownTransactionType(s.to_string()))
    }
}

impl fmt::Display for TransactionType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn calculation_type_rejects_anything_but_add_or_remove() {
        let result = "subtract".parse::<CalculationType>();

        assert_eq!(
            result,
            Err(CalculationError::UnknownCalculationType("subtract".to_string()))
        );
    }

    #[test]
    fn transaction_type_accepts_full_name_and_alias() {
        assert_eq!(
            "Domestic sale/Purchase".parse::<TransactionType>(),
            Ok(TransactionType::Domestic)
        );
        assert_eq!("export".parse::<TransactionType>(), Ok(TransactionType::Export));
    }

    #[test]
    fn transaction_type_rejects_unknown_category() {
        let result = "Import".parse::<TransactionType>();

        assert_eq!(
            result,
            Err(CalculationError::UnknownTransactionType("Import".to_string()))
        );
    }
}
