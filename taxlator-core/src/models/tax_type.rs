use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::calculations::CalculationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxType {
    #[serde(rename = "PAYE/PIT")]
    Paye,
    #[serde(rename = "FREELANCER")]
    Freelancer,
    #[serde(rename = "CIT")]
    Cit,
}

impl TaxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paye => "PAYE/PIT",
            Self::Freelancer => "FREELANCER",
            Self::Cit => "CIT",
        }
    }
}

impl FromStr for TaxType {
    type Err = CalculationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PAYE/PIT" | "PAYE" | "PIT" => Ok(Self::Paye),
            "FREELANCER" => Ok(Self::Freelancer),
            "CIT" => Ok(Self::Cit),
            other => Err(CalculationError::UnknownTaxType(other.to_string())),
        }
    }
}

impl fmt::Display for TaxType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often the reported income is earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Monthly,
    #[default]
    Annual,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Annual => "annual",
        }
    }
}

impl FromStr for Frequency {
    type Err = CalculationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(Self::Monthly),
            "annual" => Ok(Self::Annual),
            other => Err(CalculationError::UnknownFrequency(other.to_string())),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Company size tier used to pick the CIT rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompanySize {
    Small,
    Medium,
    Large,
}

impl CompanySize {
    pub fn all() -> &'static [CompanySize] {
        &[CompanySize::Small, CompanySize::Medium, CompanySize::Large]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "SMALL",
            Self::Medium => "MEDIUM",
            Self::Large => "LARGE",
        }
    }
}

impl FromStr for CompanySize {
    type Err = CalculationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SMALL" => Ok(Self::Small),
            "MEDIUM" => Ok(Self::Medium),
            "LARGE" => Ok(Self::Large),
            other => Err(CalculationError::UnknownCompanySize(other.to_string())),
        }
    }
}

impl fmt::Display for CompanySize {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
