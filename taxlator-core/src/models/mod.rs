mod history;
mod rate_table;
mod tax_band;
mod tax_type;
mod vat;

pub use history::{CalculationKind, HistoryRecord, NewHistoryRecord};
pub use rate_table::{CitRates, PayeDeductionRates, RateSchedule, RateTable, RateTableError, VatRates};
pub use tax_band::TaxBand;
pub use tax_type::{CompanySize, Frequency, TaxType};
pub use vat::{CalculationType, TransactionType};
