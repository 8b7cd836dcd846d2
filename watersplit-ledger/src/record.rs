//! Ledger row schemas and normalization of loosely-typed records.
//!
//! Records arrive as string-keyed maps from whichever backend holds the
//! history (spreadsheet tab or local JSON store) and may follow either of
//! two header generations. Normalization is a pure map to fixed structures:
//! required numeric fields default to 0.0 for aggregation safety, optional
//! fields stay `None`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use watersplit_core::{
    MismatchPolicy, SplitResult, TrueupResult, format_eur, format_m3, format_number, parse_number,
};

/// A loosely-typed persisted row: header name to cell text.
pub type RawRecord = HashMap<String, String>;

/// Canonical periods-tab headers. Superset of both schema generations; the
/// earlier generation additionally carried `AS-1 adjusted`, `AS-2 adjusted`
/// and `Mismatch policy` and omitted the invoice fields. Recognized legacy
/// keys are never removed, only added to.
pub const PERIODS_HEADERS: [&str; 17] = [
    "Period start",
    "Period end",
    "Invoice number",
    "Estimated water",
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
    "Mismatch (m3)",
    "Mismatch (%)",
    "Saved at",
];

pub const TRUEUPS_HEADERS: [&str; 8] = [
    "Period start",
    "Period end",
    "AS-1 usage",
    "AS-2 usage",
    "True-up amount",
    "AS-1 share",
    "AS-2 share",
    "Saved at",
];

/// One normalized billing-period row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub invoice_number: Option<String>,
    pub estimated_water: Option<f64>,
    pub due_date: Option<String>,
    pub reading_start: Option<String>,
    pub reading_end: Option<String>,
    pub main_use: Option<f64>,
    pub s1_use: f64,
    pub s2_use: f64,
    pub adj_s1_use: f64,
    pub adj_s2_use: f64,
    pub basic_fees: f64,
    pub usage_fees: f64,
    pub total_1: f64,
    pub total_2: f64,
    pub mismatch_policy: Option<MismatchPolicy>,
    pub mismatch_m3: Option<f64>,
    pub mismatch_pct: Option<f64>,
    pub saved_at: Option<String>,
}

/// One normalized true-up row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrueupRecord {
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub s1_use: f64,
    pub s2_use: f64,
    pub trueup_amount: f64,
    pub share_1: f64,
    pub share_2: f64,
    pub saved_at: Option<String>,
}

fn field<'a>(record: &'a RawRecord, key: &str) -> Option<&'a str> {
    record.get(key).map(String::as_str).filter(|s| !s.is_empty())
}

fn text_field(record: &RawRecord, key: &str) -> Option<String> {
    field(record, key).map(str::to_string)
}

fn num_field(record: &RawRecord, key: &str) -> Option<f64> {
    parse_number(field(record, key))
}

fn required_num(record: &RawRecord, key: &str) -> f64 {
    num_field(record, key).unwrap_or(0.0)
}

/// Normalize a periods-tab row from either schema generation.
pub fn normalize_period_record(record: &RawRecord) -> PeriodRecord {
    // Legacy exports were inconsistent about the percent scale: some stored
    // the fraction (0.05), some the whole-number percent (5). Magnitudes
    // above 1 are read as whole-number percents.
    let mismatch_pct = num_field(record, "Mismatch (%)")
        .map(|pct| if pct.abs() > 1.0 { pct / 100.0 } else { pct });

    let s1_use = required_num(record, "AS-1 usage");
    let s2_use = required_num(record, "AS-2 usage");

    PeriodRecord {
        period_start: text_field(record, "Period start"),
        period_end: text_field(record, "Period end"),
        invoice_number: text_field(record, "Invoice number"),
        estimated_water: num_field(record, "Estimated water"),
        due_date: text_field(record, "Due date"),
        reading_start: text_field(record, "Reading start"),
        reading_end: text_field(record, "Reading end"),
        main_use: num_field(record, "Main usage"),
        s1_use,
        s2_use,
        adj_s1_use: required_num(record, "AS-1 adjusted"),
        adj_s2_use: required_num(record, "AS-2 adjusted"),
        basic_fees: required_num(record, "Basic fees"),
        usage_fees: required_num(record, "Usage fees"),
        total_1: required_num(record, "AS-1 total"),
        total_2: required_num(record, "AS-2 total"),
        mismatch_policy: field(record, "Mismatch policy").and_then(|s| s.parse().ok()),
        mismatch_m3: num_field(record, "Mismatch (m3)"),
        mismatch_pct,
        saved_at: text_field(record, "Saved at"),
    }
}

/// Normalize a true-ups-tab row.
pub fn normalize_trueup_record(record: &RawRecord) -> TrueupRecord {
    TrueupRecord {
        period_start: text_field(record, "Period start"),
        period_end: text_field(record, "Period end"),
        s1_use: required_num(record, "AS-1 usage"),
        s2_use: required_num(record, "AS-2 usage"),
        trueup_amount: required_num(record, "True-up amount"),
        share_1: required_num(record, "AS-1 share"),
        share_2: required_num(record, "AS-2 share"),
        saved_at: text_field(record, "Saved at"),
    }
}

/// A settled split ready to be appended to the periods tab. Carries the
/// inputs alongside the computed [`SplitResult`] so the row is
/// self-contained.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPeriodEntry {
    pub period_start: String,
    pub period_end: String,
    pub invoice_number: Option<String>,
    pub estimated_water: Option<f64>,
    pub due_date: Option<String>,
    pub reading_start: Option<String>,
    pub reading_end: Option<String>,
    pub main_use: Option<f64>,
    pub s1_use: f64,
    pub s2_use: f64,
    pub basic_fees: f64,
    pub usage_fees: f64,
    pub split: SplitResult,
    pub saved_at: String,
}

impl NewPeriodEntry {
    /// Render to the canonical wire format, one cell per header. Absent
    /// optionals become empty cells so the row shape stays fixed.
    pub fn to_raw_record(&self) -> RawRecord {
        let mut record = RawRecord::new();
        record.insert("Period start".into(), self.period_start.clone());
        record.insert("Period end".into(), self.period_end.clone());
        record.insert(
            "Invoice number".into(),
            self.invoice_number.clone().unwrap_or_default(),
        );
        record.insert(
            "Estimated water".into(),
            self.estimated_water.map(format_m3).unwrap_or_default(),
        );
        record.insert("Due date".into(), self.due_date.clone().unwrap_or_default());
        record.insert(
            "Reading start".into(),
            self.reading_start.clone().unwrap_or_default(),
        );
        record.insert(
            "Reading end".into(),
            self.reading_end.clone().unwrap_or_default(),
        );
        record.insert(
            "Main usage".into(),
            self.main_use.map(format_m3).unwrap_or_default(),
        );
        record.insert("AS-1 usage".into(), format_m3(self.s1_use));
        record.insert("AS-2 usage".into(), format_m3(self.s2_use));
        record.insert("Basic fees".into(), format_eur(self.basic_fees));
        record.insert("Usage fees".into(), format_eur(self.usage_fees));
        record.insert("AS-1 total".into(), format_eur(self.split.total_1));
        record.insert("AS-2 total".into(), format_eur(self.split.total_2));
        record.insert(
            "Mismatch (m3)".into(),
            self.split.mismatch_m3.map(format_m3).unwrap_or_default(),
        );
        record.insert(
            "Mismatch (%)".into(),
            self.split
                .mismatch_pct
                .map(|pct| format_number(pct, 6))
                .unwrap_or_default(),
        );
        record.insert("Saved at".into(), self.saved_at.clone());
        record
    }
}

/// A settled true-up ready to be appended to the true-ups tab.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrueupEntry {
    pub period_start: String,
    pub period_end: String,
    pub s1_use: f64,
    pub s2_use: f64,
    pub trueup_amount: f64,
    pub result: TrueupResult,
    pub saved_at: String,
}

impl NewTrueupEntry {
    pub fn to_raw_record(&self) -> RawRecord {
        let mut record = RawRecord::new();
        record.insert("Period start".into(), self.period_start.clone());
        record.insert("Period end".into(), self.period_end.clone());
        record.insert("AS-1 usage".into(), format_m3(self.s1_use));
        record.insert("AS-2 usage".into(), format_m3(self.s2_use));
        record.insert("True-up amount".into(), format_eur(self.trueup_amount));
        record.insert("AS-1 share".into(), format_eur(self.result.share_1));
        record.insert("AS-2 share".into(), format_eur(self.result.share_2));
        record.insert("Saved at".into(), self.saved_at.clone());
        record
    }
}

/// Cumulative sums over normalized period rows, as shown on the history
/// page and appended to exports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HistoryTotals {
    pub s1_use: f64,
    pub s2_use: f64,
    pub basic_fees: f64,
    pub usage_fees: f64,
    pub total_1: f64,
    pub total_2: f64,
}

impl HistoryTotals {
    pub fn accumulate(records: &[PeriodRecord]) -> Self {
        let mut totals = Self::default();
        for record in records {
            totals.s1_use += record.s1_use;
            totals.s2_use += record.s2_use;
            totals.basic_fees += record.basic_fees;
            totals.usage_fees += record.usage_fees;
            totals.total_1 += record.total_1;
            totals.total_2 += record.total_2;
        }
        totals
    }

    /// Each occupant's half of the cumulative basic fees.
    pub fn basic_half(&self) -> f64 {
        self.basic_fees / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_normalize_legacy_generation_record() {
        let record = raw(&[
            ("Period start", "01/01/2026"),
            ("Period end", "31/03/2026"),
            ("AS-1 usage", "27,366m3"),
            ("AS-2 usage", "14,100m3"),
            ("AS-1 adjusted", "27,366m3"),
            ("AS-2 adjusted", "14,100m3"),
            ("Basic fees", "84,03€"),
            ("Usage fees", "222,13€"),
            ("AS-1 total", "188,81€"),
            ("AS-2 total", "117,35€"),
            ("Mismatch policy", "ignore"),
            ("Mismatch (m3)", "0,000m3"),
            ("Mismatch (%)", "0%"),
            ("Saved at", "02/02/2026 10:00"),
        ]);
        let data = normalize_period_record(&record);
        assert_eq!(data.s1_use, 27.366);
        assert_eq!(data.basic_fees, 84.03);
        assert_eq!(data.adj_s1_use, 27.366);
        assert_eq!(data.mismatch_policy, Some(MismatchPolicy::Ignore));
        assert_eq!(data.mismatch_pct, Some(0.0));
        // Invoice fields did not exist in this generation.
        assert_eq!(data.invoice_number, None);
        assert_eq!(data.estimated_water, None);
    }

    #[test]
    fn test_normalize_current_generation_record() {
        let record = raw(&[
            ("Period start", "01/04/2026"),
            ("Period end", "30/06/2026"),
            ("Invoice number", "12345"),
            ("Estimated water", "40,000m3"),
            ("Due date", "15/07/2026"),
            ("Main usage", "41,500m3"),
            ("AS-1 usage", "25,000m3"),
            ("AS-2 usage", "15,000m3"),
            ("Basic fees", "90,00€"),
            ("Usage fees", "180,00€"),
            ("AS-1 total", "157,50€"),
            ("AS-2 total", "112,50€"),
            ("Mismatch (m3)", "1,500m3"),
            ("Mismatch (%)", "0,036145"),
            ("Saved at", "01/07/2026 09:30"),
        ]);
        let data = normalize_period_record(&record);
        assert_eq!(data.invoice_number.as_deref(), Some("12345"));
        assert_eq!(data.estimated_water, Some(40.0));
        assert_eq!(data.main_use, Some(41.5));
        assert_eq!(data.mismatch_m3, Some(1.5));
        // This generation dropped the adjusted columns.
        assert_eq!(data.adj_s1_use, 0.0);
        assert_eq!(data.mismatch_policy, None);
    }

    #[test]
    fn test_missing_numeric_fields_default_to_zero() {
        let data = normalize_period_record(&raw(&[("Period start", "01/01/2026")]));
        assert_eq!(data.s1_use, 0.0);
        assert_eq!(data.total_2, 0.0);
        assert_eq!(data.main_use, None);
        assert_eq!(data.mismatch_m3, None);
    }

    #[test]
    fn test_legacy_whole_number_percent_rescaled() {
        let data = normalize_period_record(&raw(&[("Mismatch (%)", "5")]));
        assert_eq!(data.mismatch_pct, Some(0.05));
        let data = normalize_period_record(&raw(&[("Mismatch (%)", "-8")]));
        assert_eq!(data.mismatch_pct, Some(-0.08));
        // Fractions are taken as-is.
        let data = normalize_period_record(&raw(&[("Mismatch (%)", "0,05")]));
        assert_eq!(data.mismatch_pct, Some(0.05));
    }

    #[test]
    fn test_unknown_policy_text_is_none() {
        let data = normalize_period_record(&raw(&[("Mismatch policy", "split-by-rooms")]));
        assert_eq!(data.mismatch_policy, None);
    }

    #[test]
    fn test_normalize_trueup_record() {
        let record = raw(&[
            ("Period start", "01/07/2026"),
            ("Period end", "30/09/2026"),
            ("AS-1 usage", "10,000m3"),
            ("AS-2 usage", "20,000m3"),
            ("True-up amount", "60,00€"),
            ("AS-1 share", "20,00€"),
            ("AS-2 share", "40,00€"),
            ("Saved at", "01/10/2026 08:00"),
        ]);
        let data = normalize_trueup_record(&record);
        assert_eq!(data.trueup_amount, 60.0);
        assert_eq!(data.share_2, 40.0);
    }

    #[test]
    fn test_new_period_entry_round_trips() {
        let split = watersplit_core::compute_split(
            30.0,
            20.0,
            100.0,
            200.0,
            MismatchPolicy::Ignore,
            Some(55.0),
        )
        .unwrap();
        let entry = NewPeriodEntry {
            period_start: "01/01/2026".into(),
            period_end: "31/03/2026".into(),
            invoice_number: Some("98765".into()),
            estimated_water: None,
            due_date: Some("15/04/2026".into()),
            reading_start: None,
            reading_end: None,
            main_use: Some(55.0),
            s1_use: 30.0,
            s2_use: 20.0,
            basic_fees: 100.0,
            usage_fees: 200.0,
            split: split.clone(),
            saved_at: "01/04/2026 12:00".into(),
        };
        let record = entry.to_raw_record();
        assert_eq!(record["AS-1 usage"], "30,000m3");
        assert_eq!(record["Mismatch (m3)"], "5,000m3");
        assert_eq!(record["Estimated water"], "");

        let data = normalize_period_record(&record);
        assert_eq!(data.s1_use, 30.0);
        assert_eq!(data.main_use, Some(55.0));
        assert!((data.total_1 - split.total_1).abs() <= 0.005);
        assert!((data.mismatch_pct.unwrap() - split.mismatch_pct.unwrap()).abs() < 1e-6);
        assert_eq!(data.estimated_water, None);
    }

    #[test]
    fn test_totals_accumulate() {
        let rows: Vec<PeriodRecord> = [
            raw(&[
                ("AS-1 usage", "10,000m3"),
                ("AS-2 usage", "5,000m3"),
                ("Basic fees", "80,00€"),
                ("Usage fees", "100,00€"),
                ("AS-1 total", "106,67€"),
                ("AS-2 total", "73,33€"),
            ]),
            raw(&[
                ("AS-1 usage", "20,000m3"),
                ("AS-2 usage", "15,000m3"),
                ("Basic fees", "80,00€"),
                ("Usage fees", "140,00€"),
                ("AS-1 total", "120,00€"),
                ("AS-2 total", "100,00€"),
            ]),
        ]
        .iter()
        .map(normalize_period_record)
        .collect();

        let totals = HistoryTotals::accumulate(&rows);
        assert_eq!(totals.s1_use, 30.0);
        assert_eq!(totals.s2_use, 20.0);
        assert_eq!(totals.basic_fees, 160.0);
        assert_eq!(totals.basic_half(), 80.0);
        assert!((totals.total_1 - 226.67).abs() < 1e-9);
    }
}
