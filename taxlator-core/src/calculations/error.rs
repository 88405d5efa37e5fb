use rust_decimal::Decimal;
use thiserror::Error;

/// Invalid input rejected by a calculator.
///
/// Every variant describes a caller mistake. None of them are transient, so
/// callers should report them back rather than retry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalculationError {
    #[error("unrecognized tax type '{0}'; expected PAYE/PIT, FREELANCER or CIT")]
    UnknownTaxType(String),

    #[error("unrecognized calculation kind '{0}'; expected paye, freelancer, cit or vat")]
    UnknownCalculationKind(String),

    #[error("unrecognized frequency '{0}'; expected monthly or annual")]
    UnknownFrequency(String),

    #[error("unrecognized company size '{0}'; expected SMALL, MEDIUM or LARGE")]
    UnknownCompanySize(String),

    #[error("unrecognized calculation type '{0}'; expected add or remove")]
    UnknownCalculationType(String),

    #[error("unrecognized transaction type '{0}'")]
    UnknownTransactionType(String),

    #[error("expenses ({expenses}) cannot exceed revenue ({revenue})")]
    ExpensesExceedRevenue { revenue: Decimal, expenses: Decimal },

    #[error("rate must be between 0 and 1, got {0}")]
    RateOutOfRange(Decimal),

    #[error("{0} is too large to calculate with")]
    AmountOutOfRange(&'static str),

    #[error("either a VAT rate or a transaction type is required")]
    MissingVatRate,
}
