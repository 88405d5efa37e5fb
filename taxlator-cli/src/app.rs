use std::fs::File;
use std::io::BufWriter;

use anyhow::{Context, Result, anyhow};
use chrono::{Duration, Local, NaiveDate, Utc};
use serde::Serialize;
use taxlator_core::calculations::{
    Calculator, CitInput, FreelancerInput, PayeInput, TaxRequest, VatRequest,
};
use taxlator_core::db::RepositoryRegistry;
use taxlator_core::{
    CalculationError, CalculationKind, HistoryRepository, NewHistoryRecord, RateSchedule, RateTable,
};
use taxlator_data::{TaxBandLoader, load_schedule, render_table, write_history};
use taxlator_db_sqlite::SqliteRepositoryFactory;
use tracing::{debug, info, warn};

use crate::cli::{Cli, Command, GlobalArgs, HistoryCommand, RatesCommand};
use crate::config::{AppConfig, RatesConfig};
use crate::report;

/// Exit status for invalid calculator input.
pub const EXIT_INVALID_INPUT: u8 = 2;

pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

/// Built-in rates, or the configured rate file, with any band CSV applied.
pub fn load_rate_schedule(config: &RatesConfig) -> Result<RateSchedule> {
    let mut schedule = match &config.file {
        Some(path) => load_schedule(path)?,
        None => RateSchedule::default(),
    };

    if let Some(path) = &config.bands_file {
        let file = File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
        let records = TaxBandLoader::parse(file)
            .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;
        let loaded = TaxBandLoader::apply(&mut schedule, &records)
            .with_context(|| format!("Failed to apply bands from: {}", path.display()))?;
        info!(path = %path.display(), loaded, "applied band table");
    }

    Ok(schedule)
}

/// Maps an error to the process exit status.
pub fn exit_status(error: &anyhow::Error) -> u8 {
    if error.downcast_ref::<CalculationError>().is_some() {
        EXIT_INVALID_INPUT
    } else {
        1
    }
}

pub struct App {
    config: AppConfig,
    schedule: RateSchedule,
    history: Option<Box<dyn HistoryRepository>>,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let schedule = load_rate_schedule(&config.rates)?;
        Ok(Self {
            config,
            schedule,
            history: None,
        })
    }

    pub fn with_schedule(
        config: AppConfig,
        schedule: RateSchedule,
    ) -> Self {
        Self {
            config,
            schedule,
            history: None,
        }
    }

    /// Opens the history store and drops records past the retention window.
    pub async fn connect_history(&mut self) -> Result<()> {
        let db_config = self.config.db_config();
        debug!("connecting to {} backend", db_config.backend);

        let repo = build_registry()
            .create(&db_config)
            .await
            .with_context(|| format!("Failed to open history database '{}'", db_config.connection_string))?;

        let cutoff = Utc::now() - Duration::days(i64::from(self.config.history.retention_days));
        match repo.purge_before(cutoff).await {
            Ok(0) => {}
            Ok(purged) => info!(purged, "dropped expired history"),
            Err(error) => warn!(%error, "failed to purge expired history"),
        }

        self.history = Some(repo);
        Ok(())
    }

    fn table_for(
        &self,
        date: NaiveDate,
    ) -> Result<&RateTable> {
        self.schedule
            .for_date(date)
            .ok_or_else(|| anyhow!("no rate table is in force on {date}"))
    }

    /// Stores a calculation. Failures are logged and never fail the command.
    async fn record<I: Serialize, R: Serialize>(
        &self,
        kind: CalculationKind,
        input: &I,
        result: &R,
    ) {
        if !self.config.history.enabled {
            return;
        }
        let Some(repo) = &self.history else {
            return;
        };

        let record = match NewHistoryRecord::from_pair(kind, input, result) {
            Ok(record) => record,
            Err(error) => {
                warn!(%error, %kind, "failed to serialize calculation for history");
                return;
            }
        };
        if let Err(error) = repo.create_record(record).await {
            warn!(%error, %kind, "failed to store calculation history");
        }
    }

    fn history_store(&self) -> Result<&dyn HistoryRepository> {
        self.history
            .as_deref()
            .ok_or_else(|| anyhow!("history store is not connected"))
    }

    pub async fn execute(
        &self,
        command: &Command,
        global: &GlobalArgs,
    ) -> Result<String> {
        let date = global.date.unwrap_or_else(|| Local::now().date_naive());

        match command {
            Command::Paye(args) => {
                let request = TaxRequest::Paye(PayeInput {
                    gross_income: args.gross_income,
                    frequency: args.frequency,
                    include_pension: !args.no_pension,
                    include_nhis: !args.no_nhis,
                    include_nhf: !args.no_nhf,
                    rent_relief: args.rent_relief,
                    other_deductions: args.other_deductions,
                });
                self.calculate_tax(&request, date, global.json).await
            }
            Command::Freelancer(args) => {
                let request = TaxRequest::Freelancer(FreelancerInput {
                    gross_income: args.gross_income,
                    frequency: args.frequency,
                    pension: args.pension,
                    expenses: args.expenses,
                });
                self.calculate_tax(&request, date, global.json).await
            }
            Command::Cit(args) => {
                let request = TaxRequest::Cit(CitInput {
                    revenue: args.revenue,
                    expenses: args.expenses,
                    company_size: args.size,
                });
                self.calculate_tax(&request, date, global.json).await
            }
            Command::Vat(args) => {
                let request = VatRequest {
                    transaction_amount: args.amount,
                    calculation_type: args.calculation_type,
                    transaction_type: args.transaction_type,
                    rate: args.rate,
                };
                let table = self.table_for(date)?;
                let result = Calculator::new(table).calculate_vat(&request)?;
                self.record(CalculationKind::Vat, &request, &result).await;

                if global.json {
                    report::to_json(&result)
                } else {
                    Ok(report::render_vat(&result))
                }
            }
            Command::History(history) => self.history_command(history, global.json).await,
            Command::Rates(RatesCommand::Show { as_toml }) => {
                let table = self.table_for(date)?;
                if *as_toml {
                    Ok(render_table(table)?)
                } else if global.json {
                    report::to_json(table)
                } else {
                    Ok(report::render_rate_table(table))
                }
            }
            Command::Rates(RatesCommand::List) => {
                let active = self.schedule.for_date(date).map(|t| t.effective_from);
                let dates: Vec<NaiveDate> = self.schedule.tables().iter().map(|t| t.effective_from).collect();
                if global.json {
                    return report::to_json(&dates);
                }
                Ok(dates
                    .iter()
                    .map(|d| {
                        let marker = if Some(*d) == active { "*" } else { " " };
                        format!("{marker} {d}\n")
                    })
                    .collect())
            }
        }
    }

    async fn calculate_tax(
        &self,
        request: &TaxRequest,
        date: NaiveDate,
        json: bool,
    ) -> Result<String> {
        let table = self.table_for(date)?;
        let outcome = Calculator::new(table).calculate_tax(request)?;
        self.record(request.tax_type().into(), request, &outcome).await;

        if json {
            report::to_json(&outcome)
        } else {
            Ok(report::render_tax(&outcome))
        }
    }

    async fn history_command(
        &self,
        command: &HistoryCommand,
        json: bool,
    ) -> Result<String> {
        let repo = self.history_store()?;

        match command {
            HistoryCommand::List { kind } => {
                let records = repo.list_records(*kind).await?;
                if json {
                    report::to_json(&records)
                } else {
                    Ok(report::render_history(&records))
                }
            }
            HistoryCommand::Export { format, kind, output } => {
                let records = repo.list_records(*kind).await?;
                match output {
                    Some(path) => {
                        let file = File::create(path)
                            .with_context(|| format!("Failed to create: {}", path.display()))?;
                        write_history(BufWriter::new(file), &records, *format)?;
                        Ok(format!("Exported {} records to {}\n", records.len(), path.display()))
                    }
                    None => {
                        let mut out = Vec::new();
                        write_history(&mut out, &records, *format)?;
                        Ok(String::from_utf8(out)?)
                    }
                }
            }
            HistoryCommand::Delete { id } => {
                repo.delete_record(*id).await?;
                Ok(format!("Deleted record {id}\n"))
            }
            HistoryCommand::Purge { older_than_days } => {
                let days = older_than_days.unwrap_or(self.config.history.retention_days);
                let cutoff = Utc::now() - Duration::days(i64::from(days));
                let purged = repo.purge_before(cutoff).await?;
                Ok(format!("Purged {purged} records older than {days} days\n"))
            }
        }
    }
}

/// Runs one parsed command line against `config`.
pub async fn run(
    cli: &Cli,
    config: AppConfig,
) -> Result<String> {
    let mut app = App::new(config)?;

    match &cli.command {
        Command::History(_) => app.connect_history().await?,
        Command::Rates(_) => {}
        _ if app.config.history.enabled => {
            if let Err(error) = app.connect_history().await {
                warn!("history disabled for this run: {error:#}");
            }
        }
        _ => {}
    }

    app.execute(&cli.command, &cli.global).await
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn registry_knows_sqlite() {
        assert_eq!(build_registry().available_backends(), vec!["sqlite"]);
    }

    #[test]
    fn calculation_errors_exit_with_invalid_input_status() {
        let err: anyhow::Error = CalculationError::MissingVatRate.into();
        assert_eq!(exit_status(&err), EXIT_INVALID_INPUT);

        let wrapped = Err::<(), _>(CalculationError::RateOutOfRange(dec!(2)))
            .context("calculating VAT")
            .unwrap_err();
        assert_eq!(exit_status(&wrapped), EXIT_INVALID_INPUT);

        assert_eq!(exit_status(&anyhow!("disk full")), 1);
    }

    #[test]
    fn default_schedule_without_files() {
        let schedule = load_rate_schedule(&RatesConfig::default()).unwrap();

        assert_eq!(schedule, RateSchedule::default());
    }

    #[test]
    fn missing_rate_file_is_an_error() {
        let config = RatesConfig {
            file: Some("no/such/rates.toml".into()),
            bands_file: None,
        };

        assert!(load_rate_schedule(&config).is_err());
    }

    #[tokio::test]
    async fn date_before_first_table_is_an_error() {
        let app = App::with_schedule(AppConfig::default(), RateSchedule::default());
        let global = GlobalArgs {
            date: NaiveDate::from_ymd_opt(2025, 12, 31),
            ..GlobalArgs::default()
        };

        let err = app
            .execute(&Command::Rates(RatesCommand::Show { as_toml: false }), &global)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("2025-12-31"));
        assert_eq!(exit_status(&err), 1);
    }
}
