//! Plain-text and JSON rendering of results.

use std::fmt::Write;

use anyhow::Result;
use chrono::SecondsFormat;
use rust_decimal::Decimal;
use serde::Serialize;
use taxlator_core::calculations::{BandBreakdown, CitResult, FreelancerResult, PayeResult, TaxOutcome, VatResult};
use taxlator_core::{CalculationKind, HistoryRecord, RateTable, TaxBand, TaxType};

use crate::utils::{format_amount, format_rate};

const LABEL_WIDTH: usize = 32;
const VALUE_WIDTH: usize = 18;

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn line(
    out: &mut String,
    label: &str,
    value: &str,
) {
    let _ = writeln!(out, "  {label:<lw$}{value:>vw$}", lw = LABEL_WIDTH, vw = VALUE_WIDTH);
}

fn amount_line(
    out: &mut String,
    label: &str,
    value: Decimal,
) {
    line(out, label, &format_amount(value));
}

fn breakdown_table(
    out: &mut String,
    breakdown: &[BandBreakdown],
) {
    if breakdown.is_empty() {
        return;
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "  {:<8}{:>24}{:>18}", "Band", "Taxable amount", "Tax");
    for band in breakdown {
        let _ = writeln!(
            out,
            "  {:<8}{:>24}{:>18}",
            format_rate(band.rate),
            format_amount(band.taxable_amount),
            format_amount(band.tax_for_band)
        );
    }
    let _ = writeln!(out);
}

pub fn render_tax(outcome: &TaxOutcome) -> String {
    match outcome {
        TaxOutcome::Paye(result) => render_paye(result),
        TaxOutcome::Freelancer(result) => render_freelancer(result),
        TaxOutcome::Cit(result) => render_cit(result),
    }
}

fn render_paye(result: &PayeResult) -> String {
    let mut out = format!("{} ({})\n", TaxType::Paye, result.frequency);

    amount_line(&mut out, "Annual gross income", result.annual_gross_income);
    for deduction in &result.deductions {
        amount_line(&mut out, &deduction.label, deduction.amount);
    }
    amount_line(&mut out, "Total deductions", result.total_deductions);
    amount_line(&mut out, "Taxable income", result.tax.taxable_income);
    breakdown_table(&mut out, &result.tax.breakdown);
    amount_line(&mut out, "Total tax", result.tax.total_tax);
    amount_line(&mut out, "Monthly tax", result.monthly_tax);
    amount_line(&mut out, "Net income", result.net_income);
    line(&mut out, "Effective rate", &format_rate(result.tax.effective_rate));
    out
}

fn render_freelancer(result: &FreelancerResult) -> String {
    let mut out = format!("{} ({})\n", TaxType::Freelancer, result.frequency);

    amount_line(&mut out, "Annual gross income", result.annual_gross_income);
    amount_line(&mut out, "Pension", result.pension);
    amount_line(&mut out, "Business expenses", result.expenses);
    amount_line(&mut out, "Taxable income", result.tax.taxable_income);
    breakdown_table(&mut out, &result.tax.breakdown);
    amount_line(&mut out, "Total tax", result.tax.total_tax);
    amount_line(&mut out, "Monthly tax", result.monthly_tax);
    line(&mut out, "Effective rate", &format_rate(result.tax.effective_rate));
    out
}

fn render_cit(result: &CitResult) -> String {
    let mut out = format!("{} ({} company)\n", TaxType::Cit, result.company_size);

    amount_line(&mut out, "Revenue", result.revenue);
    amount_line(&mut out, "Expenses", result.expenses);
    amount_line(&mut out, "Profit", result.profit);
    line(&mut out, "Rate", &format_rate(result.rate));
    // Tax payable is exact; show every digit.
    line(&mut out, "Tax payable", &result.tax_payable.normalize().to_string());
    out
}

pub fn render_vat(result: &VatResult) -> String {
    let mut out = format!("VAT ({})\n", result.calculation_type);

    if let Some(transaction_type) = result.transaction_type {
        line(&mut out, "Transaction type", transaction_type.as_str());
    }
    line(&mut out, "Rate", &format_rate(result.rate));
    amount_line(&mut out, "Excluding VAT", result.excluding_vat);
    amount_line(&mut out, "VAT", result.vat_amount);
    amount_line(&mut out, "Including VAT", result.including_vat);
    out
}

/// The headline figure stored in a record's result, if present.
fn headline(record: &HistoryRecord) -> Option<String> {
    let key = match record.kind {
        CalculationKind::Paye | CalculationKind::Freelancer => "total_tax",
        CalculationKind::Cit => "tax_payable",
        CalculationKind::Vat => "vat_amount",
    };
    let value = record.result.get(key)?;
    let text = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
    Some(match text.parse::<Decimal>() {
        Ok(amount) => format_amount(amount),
        Err(_) => text,
    })
}

pub fn render_history(records: &[HistoryRecord]) -> String {
    if records.is_empty() {
        return "No calculations recorded.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{:>6}  {:<20}  {:<10}  {:>18}", "ID", "Created", "Kind", "Tax");
    for record in records {
        let _ = writeln!(
            out,
            "{:>6}  {:<20}  {:<10}  {:>18}",
            record.id,
            record.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            record.kind.as_str(),
            headline(record).unwrap_or_else(|| "-".to_string())
        );
    }
    out
}

fn band_lines(
    out: &mut String,
    title: &str,
    bands: &[TaxBand],
) {
    let _ = writeln!(out, "  {title}");
    let mut lower = Decimal::ZERO;
    for band in bands {
        let range = match band.upper_bound {
            Some(upper) => {
                let range = format!("{} - {}", format_amount(lower), format_amount(upper));
                lower = upper;
                range
            }
            None => format!("above {}", format_amount(lower)),
        };
        let _ = writeln!(out, "    {range:<40}{:>8}", format_rate(band.rate));
    }
}

pub fn render_rate_table(table: &RateTable) -> String {
    let mut out = format!("Rates effective from {}\n", table.effective_from);

    band_lines(&mut out, "PAYE/PIT bands", &table.paye_bands);
    band_lines(&mut out, "Freelancer bands", &table.freelancer_bands);

    let _ = writeln!(out, "  PAYE deductions");
    let d = &table.paye_deductions;
    for (label, rate) in [
        ("Rent relief", d.rent_relief_rate),
        ("Pension", d.pension_rate),
        ("NHIS", d.nhis_rate),
        ("NHF", d.nhf_rate),
    ] {
        let _ = writeln!(out, "    {label:<40}{:>8}", format_rate(rate));
    }

    let _ = writeln!(out, "  CIT");
    for size in taxlator_core::CompanySize::all() {
        let _ = writeln!(out, "    {:<40}{:>8}", size.as_str(), format_rate(table.cit.rate_for(*size)));
    }
    let _ = writeln!(
        out,
        "    SMALL up to {}, MEDIUM up to {}",
        format_amount(table.cit.small_turnover_ceiling),
        format_amount(table.cit.medium_turnover_ceiling)
    );

    let _ = writeln!(out, "  VAT");
    for transaction_type in taxlator_core::TransactionType::all() {
        let _ = writeln!(
            out,
            "    {:<40}{:>8}",
            transaction_type.as_str(),
            format_rate(table.vat.rate_for(*transaction_type))
        );
    }
    out
}
