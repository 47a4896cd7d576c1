//! Total orders over lots.
//!
//! Both orders put lots without a sale after every sold lot on the sale-date
//! key, and fall back to `form_position` so distinct split fragments never
//! compare equal in practice.

use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::ledger::Ledger;
use crate::lot::{Lot, LotId};

/// Compare optional sale dates, `None` last.
pub fn cmp_selldates(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Acquisition date, then sale date, then form position.
pub fn by_buy_date(a: &Lot, b: &Lot) -> Ordering {
    a.buydate
        .cmp(&b.buydate)
        .then_with(|| cmp_selldates(a.selldate(), b.selldate()))
        .then_with(|| a.form_position.cmp(&b.form_position))
}

/// Sale date (unsold last), then acquisition date, then form position.
pub fn by_sell_date(a: &Lot, b: &Lot) -> Ordering {
    cmp_selldates(a.selldate(), b.selldate())
        .then_with(|| a.buydate.cmp(&b.buydate))
        .then_with(|| a.form_position.cmp(&b.form_position))
}

/// Stable sort of a view of the ledger.
pub fn sort_ids(ledger: &Ledger, ids: &mut [LotId], order: fn(&Lot, &Lot) -> Ordering) {
    ids.sort_by(|a, b| order(&ledger[*a], &ledger[*b]));
}
