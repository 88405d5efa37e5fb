mod export;
mod loader;
mod rates;

pub use export::{ExportError, ExportFormat, write_history};
pub use loader::{BandLoaderError, BandRecord, BandSchedule, TaxBandLoader};
pub use rates::{RateFileError, load_schedule, parse_schedule, render_table};
