use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use taxlator_core::{CalculationKind, CalculationType, CompanySize, Frequency, TransactionType};
use taxlator_data::ExportFormat;

use crate::utils::{parse_amount, parse_company_size, parse_rate};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Nigerian tax and VAT calculator.
///
/// Calculates PAYE/PIT, freelancer income tax, company income tax and VAT
/// from versioned rate tables, and keeps a short history of calculations.
#[derive(Debug, Parser)]
#[command(name = "taxlator", version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Configuration file. Defaults to $TAXLATOR_CONFIG, then ./taxlator.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// History database. For SQLite a file path or `:memory:`.
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Rate table file (TOML) replacing the built-in rates.
    #[arg(long, global = true)]
    pub rates: Option<PathBuf>,

    /// Band CSV applied on top of the rate tables.
    #[arg(long, global = true)]
    pub bands: Option<PathBuf>,

    /// Date that selects the rate table. Defaults to today.
    #[arg(long, global = true)]
    pub date: Option<NaiveDate>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Do not record this calculation in the history.
    #[arg(long, global = true)]
    pub no_history: bool,

    /// Log filter, e.g. `debug` or `taxlator_core=trace`.
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// PAYE / personal income tax for an employee.
    Paye(PayeArgs),
    /// Income tax for a freelancer or sole trader.
    Freelancer(FreelancerArgs),
    /// Company income tax.
    Cit(CitArgs),
    /// Add VAT to, or remove VAT from, an amount.
    Vat(VatArgs),
    /// Stored calculations.
    #[command(subcommand)]
    History(HistoryCommand),
    /// Rate tables.
    #[command(subcommand)]
    Rates(RatesCommand),
}

#[derive(Debug, Clone, Args)]
pub struct PayeArgs {
    /// Gross income, e.g. 450,000.
    #[arg(value_parser = parse_amount)]
    pub gross_income: Decimal,

    #[arg(long, default_value = "annual")]
    pub frequency: Frequency,

    /// Skip the pension deduction.
    #[arg(long)]
    pub no_pension: bool,

    /// Skip the NHIS deduction.
    #[arg(long)]
    pub no_nhis: bool,

    /// Skip the NHF deduction.
    #[arg(long)]
    pub no_nhf: bool,

    /// Annual rent relief to claim instead of the percentage default.
    #[arg(long, value_parser = parse_amount)]
    pub rent_relief: Option<Decimal>,

    /// Further annual deductions.
    #[arg(long, value_parser = parse_amount, default_value = "0")]
    pub other_deductions: Decimal,
}

#[derive(Debug, Clone, Args)]
pub struct FreelancerArgs {
    #[arg(value_parser = parse_amount)]
    pub gross_income: Decimal,

    #[arg(long, default_value = "annual")]
    pub frequency: Frequency,

    /// Annual pension contributions.
    #[arg(long, value_parser = parse_amount, default_value = "0")]
    pub pension: Decimal,

    /// Annual business expenses.
    #[arg(long, value_parser = parse_amount, default_value = "0")]
    pub expenses: Decimal,
}

#[derive(Debug, Clone, Args)]
pub struct CitArgs {
    /// Annual turnover.
    #[arg(long, value_parser = parse_amount)]
    pub revenue: Decimal,

    #[arg(long, visible_alias = "business-expenses", value_parser = parse_amount, default_value = "0")]
    pub expenses: Decimal,

    /// SMALL, MEDIUM or LARGE. Classified from turnover when omitted.
    #[arg(long, value_parser = parse_company_size)]
    pub size: Option<CompanySize>,
}

#[derive(Debug, Clone, Args)]
pub struct VatArgs {
    #[arg(value_parser = parse_amount)]
    pub amount: Decimal,

    /// `add` treats the amount as VAT-exclusive, `remove` as VAT-inclusive.
    #[arg(long = "calculation", default_value = "add")]
    pub calculation_type: CalculationType,

    /// domestic, digital, export or exempt.
    #[arg(long = "type")]
    pub transaction_type: Option<TransactionType>,

    /// Explicit rate such as 0.075 or 7.5%. Overrides --type.
    #[arg(long, value_parser = parse_rate)]
    pub rate: Option<Decimal>,
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List stored calculations, newest first.
    List {
        #[arg(long)]
        kind: Option<CalculationKind>,
    },
    /// Write stored calculations to a file or stdout.
    Export {
        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        #[arg(long)]
        kind: Option<CalculationKind>,

        /// Output file. Stdout when omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Delete one stored calculation.
    Delete {
        /// Record id, as shown by `history list`.
        id: i64,
    },
    /// Delete calculations older than the retention window.
    Purge {
        /// Overrides the configured retention.
        #[arg(long)]
        older_than_days: Option<u32>,
    },
}

#[derive(Debug, Subcommand)]
pub enum RatesCommand {
    /// Print the rate table in force on --date.
    Show {
        /// Print it in the rate-file format, ready to edit and pass to --rates.
        #[arg(long = "toml")]
        as_toml: bool,
    },
    /// List the effective dates of every loaded table.
    List,
}
