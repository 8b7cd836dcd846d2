//! watersplit-core: pure billing-split arithmetic and text codecs for a
//! two-person water bill.

pub mod codec;
pub mod dates;
pub mod mismatch;
pub mod split;
pub mod trueup;

pub use codec::{format_eur, format_m3, format_number, parse_number, validate_decimal_places};
pub use dates::format_date;
pub use mismatch::{MismatchStatus, mismatch_status};
pub use split::{MismatchPolicy, SplitResult, compute_split};
pub use trueup::{TrueupResult, compute_trueup};
