use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::lot::LotId;

/// Fatal conditions raised while rewriting a lot set.
///
/// None of these are recoverable: each one points at malformed input or a
/// broken invariant inside the engine, so a run that hits one is abandoned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WashError {
    #[error("Cannot split {requested} shares off lot {lot} holding {available}")]
    SplitOutOfRange {
        lot: LotId,
        requested: u32,
        available: u32,
    },

    #[error("Cannot split the head of an empty lot list")]
    EmptySplit,

    #[error("Lineage of lot {from} already overlaps lot {into}: {shared}")]
    LineageOverlap {
        from: LotId,
        into: LotId,
        shared: String,
    },

    #[error("No replacement purchase found for loss sold on {selldate}")]
    NoReplacement { selldate: NaiveDate },

    #[error("Paired lots differ in size: replacement {buy_count}, loss {loss_count}")]
    CountMismatch { buy_count: u32, loss_count: u32 },

    #[error("Lot {0} has no sale to wash")]
    NotDisposed(LotId),

    #[error("Unknown lot: {0}")]
    UnknownLot(LotId),

    #[error("Lot {lot} adjustment {adjustment} does not equal basis - proceeds ({expected})")]
    AdjustmentMismatch {
        lot: String,
        adjustment: Decimal,
        expected: Decimal,
    },

    #[error("Lot {0} appears more than once")]
    DuplicateLot(LotId),
}

pub type Result<T> = std::result::Result<T, WashError>;
