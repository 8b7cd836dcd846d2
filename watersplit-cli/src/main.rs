use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use watersplit_core::{
    MismatchPolicy, compute_split, compute_trueup, format_date, format_m3, parse_number,
    validate_decimal_places,
};
use watersplit_ledger::{
    HistoryTotals, Ledger, LocalHistory, NewPeriodEntry, NewTrueupEntry, PERIODS_HEADERS,
    PERIODS_TAB, TRUEUPS_HEADERS, TRUEUPS_TAB, build_simple_pdf, history_csv,
    normalize_period_record, normalize_trueup_record, wrap_lines,
};

mod config;
mod report;

const EXPORT_WRAP_WIDTH: usize = 90;

#[derive(Parser, Debug)]
#[command(name = "watersplit", version, about = "Two-person water bill split")]
struct Cli {
    /// Data directory holding the history files (default: from config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split one billing period's fees between the two occupants
    Split(SplitArgs),

    /// Split a provider correction by stored or manual usage
    Trueup(TrueupArgs),

    /// List saved entries, with optional CSV/PDF export
    History {
        /// Ledger tab to list: periods or trueups
        #[arg(long, default_value = PERIODS_TAB)]
        tab: String,

        /// Write the listed rows as CSV (UTF-8 with BOM)
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write the listed rows as PDF
        #[arg(long)]
        pdf: Option<PathBuf>,
    },

    /// Write the default config file to ~/.watersplit/config.toml
    InitConfig,
}

#[derive(clap::Args, Debug)]
struct SplitArgs {
    /// Period start date (DD/MM/YYYY)
    #[arg(long)]
    start: String,

    /// Period end date (DD/MM/YYYY)
    #[arg(long)]
    end: String,

    /// AS-1 sub-meter usage, e.g. 27,366m3
    #[arg(long)]
    s1: String,

    /// AS-2 sub-meter usage, e.g. 14,100m3
    #[arg(long)]
    s2: String,

    /// Basic fees total, e.g. 84,03€
    #[arg(long)]
    basic: String,

    /// Consumption total, e.g. 222,13€
    #[arg(long)]
    usage: String,

    /// Main meter usage (optional; needed for half/proportional)
    #[arg(long)]
    main: Option<String>,

    /// Mismatch policy: ignore, half or proportional
    #[arg(long, default_value = "ignore")]
    policy: String,

    /// Invoice reference number
    #[arg(long)]
    invoice: Option<String>,

    /// Estimated water amount on the invoice, e.g. 40,000m3
    #[arg(long)]
    estimated_water: Option<String>,

    /// Payment due date (DD/MM/YYYY)
    #[arg(long)]
    due: Option<String>,

    /// Reading timestamps, free text (e.g. 01/04/2026 08:00)
    #[arg(long)]
    reading_start: Option<String>,
    #[arg(long)]
    reading_end: Option<String>,

    /// Save the period to history
    #[arg(long)]
    save: bool,
}

#[derive(clap::Args, Debug)]
struct TrueupArgs {
    /// True-up start date (DD/MM/YYYY)
    #[arg(long)]
    start: String,

    /// True-up end date (DD/MM/YYYY)
    #[arg(long)]
    end: String,

    /// Correction amount: positive = extra charge, negative = credit
    #[arg(long)]
    amount: String,

    /// AS-1 usage (manual), e.g. 10,000m3
    #[arg(long)]
    s1: Option<String>,

    /// AS-2 usage (manual), e.g. 20,000m3
    #[arg(long)]
    s2: Option<String>,

    /// Aggregate usage from saved periods instead of --s1/--s2
    #[arg(long)]
    from_history: bool,

    /// 1-based history row numbers the true-up covers (default: all)
    #[arg(long, value_delimiter = ',')]
    periods: Vec<usize>,

    /// Save the true-up to history
    #[arg(long)]
    save: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    if let Command::InitConfig = cli.command {
        return config::init_config();
    }

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => config::load_config()?.ledger.data_dir,
    };
    tracing::debug!("using data dir {}", data_dir.display());
    let mut store = LocalHistory::new(data_dir);

    match cli.command {
        Command::Split(args) => run_split(&args, &mut store),
        Command::Trueup(args) => run_trueup(&args, &mut store),
        Command::History { tab, csv, pdf } => run_history(&tab, csv, pdf, &store),
        Command::InitConfig => Ok(()),
    }
}

fn run_split(args: &SplitArgs, ledger: &mut dyn Ledger) -> Result<()> {
    let policy: MismatchPolicy = args.policy.parse()?;

    let s1_use = parse_number(Some(&args.s1));
    let s2_use = parse_number(Some(&args.s2));
    let basic_fees = parse_number(Some(&args.basic));
    let usage_fees = parse_number(Some(&args.usage));
    let main_use = args.main.as_deref().and_then(|text| parse_number(Some(text)));
    let estimated_water = args
        .estimated_water
        .as_deref()
        .and_then(|text| parse_number(Some(text)));

    let mut errors: Vec<&str> = Vec::new();
    if s1_use.is_none() {
        errors.push("AS-1 usage is required.");
    }
    if s2_use.is_none() {
        errors.push("AS-2 usage is required.");
    }
    if basic_fees.is_none() {
        errors.push("Basic fees total is required.");
    }
    if usage_fees.is_none() {
        errors.push("Consumption total is required.");
    }
    if !validate_decimal_places(Some(&args.basic), 2) {
        errors.push("Basic fees must have at most 2 decimals.");
    }
    if !validate_decimal_places(Some(&args.usage), 2) {
        errors.push("Consumption total must have at most 2 decimals.");
    }
    if !validate_decimal_places(Some(&args.s1), 3) {
        errors.push("AS-1 usage must have at most 3 decimals.");
    }
    if !validate_decimal_places(Some(&args.s2), 3) {
        errors.push("AS-2 usage must have at most 3 decimals.");
    }
    if args
        .main
        .as_deref()
        .is_some_and(|text| !validate_decimal_places(Some(text), 3))
    {
        errors.push("Main usage must have at most 3 decimals.");
    }
    if args
        .estimated_water
        .as_deref()
        .is_some_and(|text| !validate_decimal_places(Some(text), 3))
    {
        errors.push("Estimated water must have at most 3 decimals.");
    }
    if policy.requires_main() && main_use.is_none() {
        errors.push("Mismatch override requires main meter readings.");
    }
    if !errors.is_empty() {
        bail!(errors.join("\n"));
    }
    let (Some(s1_use), Some(s2_use), Some(basic_fees), Some(usage_fees)) =
        (s1_use, s2_use, basic_fees, usage_fees)
    else {
        bail!("missing required input");
    };

    let split = compute_split(s1_use, s2_use, basic_fees, usage_fees, policy, main_use)?;
    report::print_split(s1_use, s2_use, &split, main_use);

    if args.save {
        let entry = NewPeriodEntry {
            period_start: canonical_date(&args.start),
            period_end: canonical_date(&args.end),
            invoice_number: args.invoice.clone(),
            estimated_water,
            due_date: args.due.as_deref().map(canonical_date),
            reading_start: args.reading_start.clone(),
            reading_end: args.reading_end.clone(),
            main_use,
            s1_use,
            s2_use,
            basic_fees,
            usage_fees,
            split,
            saved_at: now_stamp(),
        };
        ledger.append_record(PERIODS_TAB, &PERIODS_HEADERS, &entry.to_raw_record())?;
        println!();
        println!("Saved to history.");
    }
    Ok(())
}

fn run_trueup(args: &TrueupArgs, ledger: &mut dyn Ledger) -> Result<()> {
    let trueup_amount = parse_number(Some(&args.amount));

    let mut errors: Vec<&str> = Vec::new();
    if trueup_amount.is_none() {
        errors.push("True-up amount is required.");
    }
    if !validate_decimal_places(Some(&args.amount), 2) {
        errors.push("True-up amount must have at most 2 decimals.");
    }

    let (s1_use, s2_use) = if args.from_history {
        let rows: Vec<_> = ledger
            .get_records(PERIODS_TAB)?
            .iter()
            .map(normalize_period_record)
            .collect();
        if rows.is_empty() {
            bail!("No history entries found.");
        }
        let selected: Vec<_> = if args.periods.is_empty() {
            rows.iter().collect()
        } else {
            let mut picked = Vec::new();
            for number in &args.periods {
                match number.checked_sub(1).and_then(|i| rows.get(i)) {
                    Some(row) => picked.push(row),
                    None => bail!("No history row {number} (have {}).", rows.len()),
                }
            }
            picked
        };
        let s1: f64 = selected.iter().map(|r| r.s1_use).sum();
        let s2: f64 = selected.iter().map(|r| r.s2_use).sum();
        println!(
            "Using {} saved period(s): AS-1 {}, AS-2 {}",
            selected.len(),
            format_m3(s1),
            format_m3(s2)
        );
        (Some(s1), Some(s2))
    } else {
        let s1_use = args.s1.as_deref().and_then(|text| parse_number(Some(text)));
        let s2_use = args.s2.as_deref().and_then(|text| parse_number(Some(text)));
        if s1_use.is_none() {
            errors.push("AS-1 usage is required.");
        }
        if s2_use.is_none() {
            errors.push("AS-2 usage is required.");
        }
        if args
            .s1
            .as_deref()
            .is_some_and(|text| !validate_decimal_places(Some(text), 3))
        {
            errors.push("AS-1 usage must have at most 3 decimals.");
        }
        if args
            .s2
            .as_deref()
            .is_some_and(|text| !validate_decimal_places(Some(text), 3))
        {
            errors.push("AS-2 usage must have at most 3 decimals.");
        }
        (s1_use, s2_use)
    };

    if !errors.is_empty() {
        bail!(errors.join("\n"));
    }
    let (Some(s1_use), Some(s2_use), Some(trueup_amount)) = (s1_use, s2_use, trueup_amount)
    else {
        bail!("missing required input");
    };

    let result = compute_trueup(s1_use, s2_use, trueup_amount)?;
    report::print_trueup(s1_use, s2_use, &result, trueup_amount);

    if args.save {
        let entry = NewTrueupEntry {
            period_start: canonical_date(&args.start),
            period_end: canonical_date(&args.end),
            s1_use,
            s2_use,
            trueup_amount,
            result,
            saved_at: now_stamp(),
        };
        ledger.append_record(TRUEUPS_TAB, &TRUEUPS_HEADERS, &entry.to_raw_record())?;
        println!();
        println!("Saved to history.");
    }
    Ok(())
}

fn run_history(
    tab: &str,
    csv: Option<PathBuf>,
    pdf: Option<PathBuf>,
    ledger: &dyn Ledger,
) -> Result<()> {
    match tab {
        PERIODS_TAB => {
            let rows: Vec<_> = ledger
                .get_records(PERIODS_TAB)?
                .iter()
                .map(normalize_period_record)
                .collect();
            if rows.is_empty() {
                println!("No history entries found.");
                return Ok(());
            }
            let totals = HistoryTotals::accumulate(&rows);
            let mut table: Vec<Vec<String>> = rows.iter().map(report::period_row).collect();
            table.push(report::totals_row(&totals));

            report::print_table(&report::PERIOD_DISPLAY_HEADERS, &table);
            println!();
            report::print_totals(&totals, rows.len());

            if let Some(path) = csv {
                let headers: Vec<String> = report::PERIOD_DISPLAY_HEADERS
                    .iter()
                    .map(|h| h.to_string())
                    .collect();
                write_export(&path, &history_csv(&headers, &table)?)?;
            }
            if let Some(path) = pdf {
                let lines = wrap_lines(&report::period_pdf_lines(&rows, &totals), EXPORT_WRAP_WIDTH);
                write_export(&path, &build_simple_pdf(&lines))?;
            }
        }
        TRUEUPS_TAB => {
            let rows: Vec<_> = ledger
                .get_records(TRUEUPS_TAB)?
                .iter()
                .map(normalize_trueup_record)
                .collect();
            if rows.is_empty() {
                println!("No true-ups found.");
                return Ok(());
            }
            let table: Vec<Vec<String>> = rows.iter().map(report::trueup_row).collect();
            report::print_table(&report::TRUEUP_DISPLAY_HEADERS, &table);

            if let Some(path) = csv {
                let headers: Vec<String> = report::TRUEUP_DISPLAY_HEADERS
                    .iter()
                    .map(|h| h.to_string())
                    .collect();
                write_export(&path, &history_csv(&headers, &table)?)?;
            }
            if let Some(path) = pdf {
                let lines = wrap_lines(&report::trueup_pdf_lines(&rows), EXPORT_WRAP_WIDTH);
                write_export(&path, &build_simple_pdf(&lines))?;
            }
        }
        other => bail!("unknown ledger tab: {other}"),
    }
    Ok(())
}

fn write_export(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// Normalize a user-supplied date to the day-first display format; text the
/// date codec does not recognize is kept as typed.
fn canonical_date(text: &str) -> String {
    format_date(Some(text)).unwrap_or_default()
}

fn now_stamp() -> String {
    Local::now().format("%d/%m/%Y %H:%M").to_string()
}
