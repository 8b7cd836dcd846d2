//! Ledger collaborator boundary and the local JSON fallback store.
//!
//! The engines and the CLI only ever see [`RawRecord`]s through the
//! [`Ledger`] trait; which backend produced a record is invisible past this
//! point.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::warn;
use watersplit_core::{MismatchPolicy, format_date, format_eur, format_m3, format_number};

use crate::record::{
    PeriodRecord, RawRecord, TrueupRecord, normalize_period_record, normalize_trueup_record,
};

pub const PERIODS_TAB: &str = "periods";
pub const TRUEUPS_TAB: &str = "trueups";

/// History backend boundary: read a tab, append a row.
///
/// `headers` gives the column order for backends that care about it; the
/// local store ignores it.
pub trait Ledger {
    fn get_records(&self, tab: &str) -> Result<Vec<RawRecord>>;
    fn append_record(&mut self, tab: &str, headers: &[&str], record: &RawRecord) -> Result<()>;
}

/// One period entry in the machine-keyed local history file.
///
/// Every field is optional so files written by earlier app generations
/// (which also kept adjusted usages, fee shares and the policy tag) load
/// without migration. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub period_start: Option<String>,
    #[serde(default)]
    pub period_end: Option<String>,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub estimated_water: Option<f64>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub reading_start: Option<String>,
    #[serde(default)]
    pub reading_end: Option<String>,
    #[serde(default)]
    pub main_use: Option<f64>,
    #[serde(default)]
    pub s1_use: Option<f64>,
    #[serde(default)]
    pub s2_use: Option<f64>,
    #[serde(default)]
    pub adj_s1_use: Option<f64>,
    #[serde(default)]
    pub adj_s2_use: Option<f64>,
    #[serde(default)]
    pub basic_fees: Option<f64>,
    #[serde(default)]
    pub usage_fees: Option<f64>,
    #[serde(default)]
    pub total_1: Option<f64>,
    #[serde(default)]
    pub total_2: Option<f64>,
    #[serde(default)]
    pub mismatch_m3: Option<f64>,
    #[serde(default)]
    pub mismatch_pct: Option<f64>,
    #[serde(default)]
    pub mismatch_policy: Option<MismatchPolicy>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl HistoryEntry {
    fn from_period(data: &PeriodRecord) -> Self {
        Self {
            period_start: data.period_start.clone(),
            period_end: data.period_end.clone(),
            invoice_number: data.invoice_number.clone(),
            estimated_water: data.estimated_water,
            due_date: data.due_date.clone(),
            reading_start: data.reading_start.clone(),
            reading_end: data.reading_end.clone(),
            main_use: data.main_use,
            s1_use: Some(data.s1_use),
            s2_use: Some(data.s2_use),
            adj_s1_use: (data.adj_s1_use != 0.0).then_some(data.adj_s1_use),
            adj_s2_use: (data.adj_s2_use != 0.0).then_some(data.adj_s2_use),
            basic_fees: Some(data.basic_fees),
            usage_fees: Some(data.usage_fees),
            total_1: Some(data.total_1),
            total_2: Some(data.total_2),
            mismatch_m3: data.mismatch_m3,
            mismatch_pct: data.mismatch_pct,
            mismatch_policy: data.mismatch_policy,
            created_at: data.saved_at.clone(),
        }
    }

    /// Render to ledger-header keys, so the normalizer never learns which
    /// backend a record came from. Legacy-only columns are emitted only
    /// when the entry carries them.
    fn to_raw_record(&self) -> RawRecord {
        let mut record = RawRecord::new();
        let mut put = |key: &str, value: Option<String>| {
            record.insert(key.to_string(), value.unwrap_or_default());
        };
        put("Period start", format_date(self.period_start.as_deref()));
        put("Period end", format_date(self.period_end.as_deref()));
        put("Invoice number", self.invoice_number.clone());
        put("Estimated water", self.estimated_water.map(format_m3));
        put("Due date", format_date(self.due_date.as_deref()));
        put("Reading start", self.reading_start.clone());
        put("Reading end", self.reading_end.clone());
        put("Main usage", self.main_use.map(format_m3));
        put("AS-1 usage", self.s1_use.map(format_m3));
        put("AS-2 usage", self.s2_use.map(format_m3));
        put("Basic fees", self.basic_fees.map(format_eur));
        put("Usage fees", self.usage_fees.map(format_eur));
        put("AS-1 total", self.total_1.map(format_eur));
        put("AS-2 total", self.total_2.map(format_eur));
        put("Mismatch (m3)", self.mismatch_m3.map(format_m3));
        put(
            "Mismatch (%)",
            self.mismatch_pct.map(|pct| format_number(pct, 6)),
        );
        put("Saved at", format_date(self.created_at.as_deref()));
        if let Some(adj) = self.adj_s1_use {
            record.insert("AS-1 adjusted".to_string(), format_m3(adj));
        }
        if let Some(adj) = self.adj_s2_use {
            record.insert("AS-2 adjusted".to_string(), format_m3(adj));
        }
        if let Some(policy) = self.mismatch_policy {
            record.insert("Mismatch policy".to_string(), policy.as_str().to_string());
        }
        record
    }
}

/// One true-up entry in the machine-keyed local store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrueupHistoryEntry {
    #[serde(default)]
    pub period_start: Option<String>,
    #[serde(default)]
    pub period_end: Option<String>,
    #[serde(default)]
    pub s1_use: Option<f64>,
    #[serde(default)]
    pub s2_use: Option<f64>,
    #[serde(default)]
    pub trueup_amount: Option<f64>,
    #[serde(default)]
    pub share_1: Option<f64>,
    #[serde(default)]
    pub share_2: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl TrueupHistoryEntry {
    fn from_trueup(data: &TrueupRecord) -> Self {
        Self {
            period_start: data.period_start.clone(),
            period_end: data.period_end.clone(),
            s1_use: Some(data.s1_use),
            s2_use: Some(data.s2_use),
            trueup_amount: Some(data.trueup_amount),
            share_1: Some(data.share_1),
            share_2: Some(data.share_2),
            created_at: data.saved_at.clone(),
        }
    }

    fn to_raw_record(&self) -> RawRecord {
        let mut record = RawRecord::new();
        let mut put = |key: &str, value: Option<String>| {
            record.insert(key.to_string(), value.unwrap_or_default());
        };
        put("Period start", format_date(self.period_start.as_deref()));
        put("Period end", format_date(self.period_end.as_deref()));
        put("AS-1 usage", self.s1_use.map(format_m3));
        put("AS-2 usage", self.s2_use.map(format_m3));
        put("True-up amount", self.trueup_amount.map(format_eur));
        put("AS-1 share", self.share_1.map(format_eur));
        put("AS-2 share", self.share_2.map(format_eur));
        put("Saved at", format_date(self.created_at.as_deref()));
        record
    }
}

/// JSON-file history used when no spreadsheet collaborator is configured.
///
/// `history.json` stays a bare sequence of period entries for compatibility
/// with files written by earlier generations; true-ups live in a sibling
/// `trueups.json` sequence.
#[derive(Debug, Clone)]
pub struct LocalHistory {
    data_dir: PathBuf,
}

impl LocalHistory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn periods_path(&self) -> PathBuf {
        self.data_dir.join("history.json")
    }

    pub fn trueups_path(&self) -> PathBuf {
        self.data_dir.join("trueups.json")
    }

    fn load_seq<T: for<'de> Deserialize<'de>>(path: &Path) -> Vec<T> {
        if !path.exists() {
            return Vec::new();
        }
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                warn!("unreadable history file {}: {err}", path.display());
                return Vec::new();
            }
        };
        match serde_json::from_str(&text) {
            Ok(entries) => entries,
            Err(err) => {
                // A corrupt file degrades to an empty history; it is never
                // overwritten until the next successful append.
                warn!("corrupt history file {}: {err}", path.display());
                Vec::new()
            }
        }
    }

    fn write_seq<T: Serialize>(&self, path: &Path, entries: &[T]) -> Result<()> {
        fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("create {}", self.data_dir.display()))?;
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn load_periods(&self) -> Vec<HistoryEntry> {
        Self::load_seq(&self.periods_path())
    }

    pub fn load_trueups(&self) -> Vec<TrueupHistoryEntry> {
        Self::load_seq(&self.trueups_path())
    }
}

impl Ledger for LocalHistory {
    fn get_records(&self, tab: &str) -> Result<Vec<RawRecord>> {
        match tab {
            PERIODS_TAB => Ok(self
                .load_periods()
                .iter()
                .map(HistoryEntry::to_raw_record)
                .collect()),
            TRUEUPS_TAB => Ok(self
                .load_trueups()
                .iter()
                .map(TrueupHistoryEntry::to_raw_record)
                .collect()),
            other => bail!("unknown ledger tab: {other}"),
        }
    }

    fn append_record(&mut self, tab: &str, _headers: &[&str], record: &RawRecord) -> Result<()> {
        match tab {
            PERIODS_TAB => {
                let mut entries = self.load_periods();
                entries.push(HistoryEntry::from_period(&normalize_period_record(record)));
                self.write_seq(&self.periods_path(), &entries)
            }
            TRUEUPS_TAB => {
                let mut entries = self.load_trueups();
                entries.push(TrueupHistoryEntry::from_trueup(&normalize_trueup_record(
                    record,
                )));
                self.write_seq(&self.trueups_path(), &entries)
            }
            other => bail!("unknown ledger tab: {other}"),
        }
    }
}
