//! Terminal and export rendering of split results and history rows.

use watersplit_core::{
    MismatchStatus, SplitResult, TrueupResult, format_date, format_eur, format_m3, format_number,
    mismatch_status,
};
use watersplit_ledger::{HistoryTotals, PeriodRecord, TrueupRecord};

pub fn print_split(s1_use: f64, s2_use: f64, split: &SplitResult, main_use: Option<f64>) {
    println!("Summary");
    print_table(
        &["Person", "Usage", "Usage fees", "Basic fees", "Total"],
        &[
            vec![
                "AS-1".to_string(),
                format_m3(split.adj_s1_use),
                format_eur(split.usage_share_1),
                format_eur(split.basic_share),
                format_eur(split.total_1),
            ],
            vec![
                "AS-2".to_string(),
                format_m3(split.adj_s2_use),
                format_eur(split.usage_share_2),
                format_eur(split.basic_share),
                format_eur(split.total_2),
            ],
        ],
    );

    println!();
    println!("{}", settlement_line(split));

    println!();
    match (main_use, split.mismatch_m3, split.mismatch_pct) {
        (Some(main), Some(m3), Some(pct)) => {
            let status = mismatch_status(m3, Some(pct));
            println!("Mismatch");
            println!("  Main usage:      {}", format_m3(main));
            println!("  Sub-meter total: {}", format_m3(s1_use + s2_use));
            println!("  Mismatch (m3):   {}", format_m3(m3));
            println!("  Mismatch (%):    {}%", format_number(pct * 100.0, 2));
            println!("  Status:          {}", status_message(status));
        }
        _ => println!("Mismatch not available (main meter not provided)."),
    }
}

pub fn settlement_line(split: &SplitResult) -> String {
    format!(
        "This period: AS-2 total {}, AS-1 total {} -> AS-1 pays AS-2 {}.",
        format_eur(split.total_2),
        format_eur(split.total_1),
        format_eur(split.total_1),
    )
}

fn status_message(status: MismatchStatus) -> &'static str {
    match status {
        MismatchStatus::Ok => "OK (likely rounding/timing)",
        MismatchStatus::Warning => "Warning: check readings",
        MismatchStatus::Investigate => "Investigate: mismatch is large",
    }
}

pub fn print_trueup(s1_use: f64, s2_use: f64, result: &TrueupResult, amount: f64) {
    println!("True-up split");
    print_table(
        &["Person", "Usage", "Share"],
        &[
            vec![
                "AS-1".to_string(),
                format_m3(s1_use),
                format_eur(result.share_1),
            ],
            vec![
                "AS-2".to_string(),
                format_m3(s2_use),
                format_eur(result.share_2),
            ],
        ],
    );

    println!();
    if amount > 0.0 {
        println!(
            "AS-1 owes {}, AS-2 owes {}.",
            format_eur(result.share_1),
            format_eur(result.share_2)
        );
    } else if amount < 0.0 {
        println!(
            "AS-1 credit {}, AS-2 credit {}.",
            format_eur(result.share_1.abs()),
            format_eur(result.share_2.abs())
        );
    } else {
        println!("No true-up amount entered.");
    }
}

/// Display headers for the periods listing; the same set feeds the CSV and
/// PDF exports so every surface shows identical data.
pub const PERIOD_DISPLAY_HEADERS: [&str; 15] = [
    "Period start",
    "Period end",
    "Invoice",
    "Est. water",
    "Due date",
    "Reading start",
    "Reading end",
    "Main usage",
    "AS-1 usage",
    "AS-2 usage",
    "Basic fees",
    "Usage fees",
    "AS-1 total",
    "AS-2 total",
    "Saved at",
];

pub const TRUEUP_DISPLAY_HEADERS: [&str; 8] = [
    "Period start",
    "Period end",
    "AS-1 usage",
    "AS-2 usage",
    "True-up amount",
    "AS-1 share",
    "AS-2 share",
    "Saved at",
];

fn dash(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}

pub fn period_row(data: &PeriodRecord) -> Vec<String> {
    vec![
        dash(format_date(data.period_start.as_deref())),
        dash(format_date(data.period_end.as_deref())),
        dash(data.invoice_number.clone()),
        dash(data.estimated_water.map(format_m3)),
        dash(format_date(data.due_date.as_deref())),
        dash(data.reading_start.clone()),
        dash(data.reading_end.clone()),
        dash(data.main_use.map(format_m3)),
        format_m3(data.s1_use),
        format_m3(data.s2_use),
        format_eur(data.basic_fees),
        format_eur(data.usage_fees),
        format_eur(data.total_1),
        format_eur(data.total_2),
        dash(format_date(data.saved_at.as_deref())),
    ]
}

/// The TOTAL footer row matching [`PERIOD_DISPLAY_HEADERS`].
pub fn totals_row(totals: &HistoryTotals) -> Vec<String> {
    let mut row = vec![String::new(); PERIOD_DISPLAY_HEADERS.len()];
    row[0] = "TOTAL".to_string();
    row[8] = format_m3(totals.s1_use);
    row[9] = format_m3(totals.s2_use);
    row[10] = format_eur(totals.basic_fees);
    row[11] = format_eur(totals.usage_fees);
    row[12] = format_eur(totals.total_1);
    row[13] = format_eur(totals.total_2);
    row
}

pub fn trueup_row(data: &TrueupRecord) -> Vec<String> {
    vec![
        dash(format_date(data.period_start.as_deref())),
        dash(format_date(data.period_end.as_deref())),
        format_m3(data.s1_use),
        format_m3(data.s2_use),
        format_eur(data.trueup_amount),
        format_eur(data.share_1),
        format_eur(data.share_2),
        dash(format_date(data.saved_at.as_deref())),
    ]
}

pub fn print_totals(totals: &HistoryTotals, period_count: usize) {
    println!("Cumulative totals ({period_count} periods)");
    for (label, usage, total) in [
        ("AS-1", totals.s1_use, totals.total_1),
        ("AS-2", totals.s2_use, totals.total_2),
    ] {
        println!("  {label}:");
        println!("    Total usage:      {}", format_m3(usage));
        println!("    Basic fees (50%): {}", format_eur(totals.basic_half()));
        println!(
            "    Usage fees:       {}",
            format_eur(total - totals.basic_half())
        );
        println!("    Grand total:      {}", format_eur(total));
    }
    println!("  Combined:");
    println!(
        "    Total usage:      {}",
        format_m3(totals.s1_use + totals.s2_use)
    );
    println!("    Basic fees:       {}", format_eur(totals.basic_fees));
    println!("    Usage fees:       {}", format_eur(totals.usage_fees));
    println!(
        "    Grand total:      {}",
        format_eur(totals.total_1 + totals.total_2)
    );
}

/// Fixed-width table print; columns size to their widest cell.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }
    let line = |cells: Vec<&str>| {
        let mut out = String::new();
        for (i, cell) in cells.iter().enumerate() {
            if i > 0 {
                out.push_str("  ");
            }
            out.push_str(cell);
            for _ in cell.chars().count()..widths[i] {
                out.push(' ');
            }
        }
        out.trim_end().to_string()
    };
    println!("{}", line(headers.to_vec()));
    for row in rows {
        println!("{}", line(row.iter().map(String::as_str).collect()));
    }
}

/// Assemble the PDF body for the periods export: one block per period, then
/// the cumulative totals.
pub fn period_pdf_lines(rows: &[PeriodRecord], totals: &HistoryTotals) -> Vec<String> {
    let mut lines = vec!["Water Bill History".to_string(), String::new()];
    for (i, data) in rows.iter().enumerate() {
        lines.push(format!(
            "Period {}: {} - {}",
            i + 1,
            dash(format_date(data.period_start.as_deref())),
            dash(format_date(data.period_end.as_deref())),
        ));
        lines.push(format!(
            "  Invoice: {}, Est. water: {}, Due date: {}",
            dash(data.invoice_number.clone()),
            dash(data.estimated_water.map(format_m3)),
            dash(format_date(data.due_date.as_deref())),
        ));
        lines.push(format!(
            "  AS-1 usage: {}, AS-2 usage: {}",
            format_m3(data.s1_use),
            format_m3(data.s2_use)
        ));
        lines.push(format!(
            "  Basic fees: {}, Usage fees: {}",
            format_eur(data.basic_fees),
            format_eur(data.usage_fees)
        ));
        lines.push(format!(
            "  AS-1 total: {}, AS-2 total: {}",
            format_eur(data.total_1),
            format_eur(data.total_2)
        ));
        lines.push(String::new());
    }

    lines.push("=".repeat(50));
    lines.push("CUMULATIVE TOTALS".to_string());
    lines.push("=".repeat(50));
    lines.push(String::new());
    for (label, usage, total) in [
        ("AS-1", totals.s1_use, totals.total_1),
        ("AS-2", totals.s2_use, totals.total_2),
    ] {
        lines.push(format!("{label}:"));
        lines.push(format!("  Total usage: {}", format_m3(usage)));
        lines.push(format!(
            "  Basic fees (50%): {}",
            format_eur(totals.basic_half())
        ));
        lines.push(format!(
            "  Usage fees: {}",
            format_eur(total - totals.basic_half())
        ));
        lines.push(format!("  Grand total: {}", format_eur(total)));
        lines.push(String::new());
    }
    lines.push("Combined:".to_string());
    lines.push(format!(
        "  Total usage: {}",
        format_m3(totals.s1_use + totals.s2_use)
    ));
    lines.push(format!("  Basic fees: {}", format_eur(totals.basic_fees)));
    lines.push(format!("  Usage fees: {}", format_eur(totals.usage_fees)));
    lines.push(format!(
        "  Grand total: {}",
        format_eur(totals.total_1 + totals.total_2)
    ));
    lines.push(String::new());
    lines.push("-".repeat(50));
    lines.push(format!("Number of periods: {}", rows.len()));
    lines
}

pub fn trueup_pdf_lines(rows: &[TrueupRecord]) -> Vec<String> {
    let mut lines = vec!["True-ups Export".to_string(), String::new()];
    for data in rows {
        lines.push(format!(
            "Period: {} - {}",
            dash(format_date(data.period_start.as_deref())),
            dash(format_date(data.period_end.as_deref())),
        ));
        lines.push(format!(
            "AS-1 usage: {}, AS-2 usage: {}",
            format_m3(data.s1_use),
            format_m3(data.s2_use)
        ));
        lines.push(format!(
            "True-up amount: {}",
            format_eur(data.trueup_amount)
        ));
        lines.push(format!(
            "AS-1 share: {}, AS-2 share: {}",
            format_eur(data.share_1),
            format_eur(data.share_2)
        ));
        lines.push(String::new());
    }
    lines
}
