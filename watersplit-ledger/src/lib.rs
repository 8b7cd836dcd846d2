//! watersplit-ledger: history record schemas, normalization, the local
//! fallback store, and the CSV/PDF export surface.

pub mod export;
pub mod pdf;
pub mod record;
pub mod store;

pub use export::{history_csv, wrap_lines};
pub use pdf::build_simple_pdf;
pub use record::{
    HistoryTotals, NewPeriodEntry, NewTrueupEntry, PERIODS_HEADERS, PeriodRecord, RawRecord,
    TRUEUPS_HEADERS, TrueupRecord, normalize_period_record, normalize_trueup_record,
};
pub use store::{Ledger, LocalHistory, PERIODS_TAB, TRUEUPS_TAB};
