//! Wash Engine
//!
//! Wash sale adjustments over tax lots: finds losses with a replacement
//! purchase inside the 61-day window, splits lots so share counts line up,
//! and moves each disallowed loss onto its replacement's basis and holding
//! period.

pub mod detector;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod lot;
pub mod ordering;
pub mod progress;
pub mod rules;
pub mod splitter;
pub mod summary;

#[cfg(test)]
mod tests;

pub use detector::{buy_lots_within_window, earliest_wash_loss};
pub use engine::{perform_wash, WashAdjustment, WashEngine, WashReport, WashSummary};
pub use error::{Result, WashError};
pub use ledger::{remove_lot, Ledger};
pub use lot::{Lineage, Lot, LotId, Sale, WASH_CODE};
pub use ordering::{by_buy_date, by_sell_date, cmp_selldates, sort_ids};
pub use progress::{NullReporter, ProgressReporter, TracingReporter};
pub use rules::WashRules;
pub use splitter::split_head_lot;
pub use summary::LotTotals;
