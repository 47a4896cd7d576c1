//! Lot Store
//!
//! Flat CSV storage and console listings for tax lots.

pub mod error;
pub mod listing;
pub mod store;

pub use error::{LotFileError, Result};
pub use listing::render_lots;
pub use store::{load_lots, parse_date, parse_money, read_lots, save_lots, write_lots, DATE_FORMAT};
