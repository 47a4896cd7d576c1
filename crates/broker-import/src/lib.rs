//! Broker Import
//!
//! Turns Schwab 1099-B and account statement exports into lots the wash
//! engine can consume, correcting the 1099-B acquisition data from the
//! statements.

pub mod error;
pub mod reconcile;
pub mod schwab;

pub use error::{ImportError, Result};
pub use reconcile::{
    match_group, match_lots_to_1099, remove_sold_buys, Ambiguity, GroupMatch, MatchResolver,
    RejectAmbiguous,
};
pub use schwab::{parse_schwab_1099b, parse_schwab_statement};
