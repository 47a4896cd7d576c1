//! Reconciliation of statement lots against the 1099-B.
//!
//! The 1099-B carries the sale dates and proceeds the IRS sees. Statements
//! carry the true acquisition dates and basis, which the broker may have
//! rewritten when it applied its own wash-sale adjustments. Matching is done
//! one sell date at a time.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use wash_engine::Lot;

use crate::error::{ImportError, Result};

/// Collapse each statement deposit with the sale that disposed of it.
///
/// A pure buy whose acquisition fields match a sale is replaced by that
/// sale. Buys and sales without a partner are kept. Partial-lot sales are
/// not detected.
pub fn remove_sold_buys(lots: Vec<Lot>) -> Vec<Lot> {
    let (buys, mut sells): (Vec<Lot>, Vec<Lot>) = lots.into_iter().partition(|l| !l.has_sell());
    let mut out = Vec::with_capacity(buys.len() + sells.len());

    for buy in buys {
        match sells.iter().position(|sell| buy.acquisition_match(sell)) {
            Some(idx) => out.push(sells.remove(idx)),
            None => {
                warn!("No sale matches buy {}", buy);
                out.push(buy);
            }
        }
    }
    for sell in &sells {
        warn!("No buy matches sale {}", sell);
    }
    out.extend(sells);
    out
}

/// A sell-date group the greedy pass could not fully assign.
#[derive(Debug, Clone, PartialEq)]
pub struct Ambiguity {
    pub selldate: NaiveDate,
    /// For each 1099-B lot in the group, the raw lot it was matched to.
    pub assignments: Vec<Option<usize>>,
    /// Indexes of 1099-B lots without a match, in group order.
    pub unassigned: Vec<usize>,
    /// Indexes of raw lots nobody claimed.
    pub unclaimed_raw: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GroupMatch {
    /// Raw lot index for every 1099-B lot, in group order.
    Complete(Vec<usize>),
    Ambiguous(Ambiguity),
}

/// Supplies raw lot indexes for the unassigned 1099-B lots of an ambiguous
/// group, one per entry of `ambiguity.unassigned`. `None` gives up.
pub trait MatchResolver {
    fn resolve(&mut self, ambiguity: &Ambiguity, raw: &[Lot], from_1099: &[Lot]) -> Option<Vec<usize>>;
}

/// Resolver for unattended runs: every ambiguity is an error.
#[derive(Debug, Default, Clone, Copy)]
pub struct RejectAmbiguous;

impl MatchResolver for RejectAmbiguous {
    fn resolve(&mut self, _: &Ambiguity, _: &[Lot], _: &[Lot]) -> Option<Vec<usize>> {
        None
    }
}

/// Greedy match of one sell-date group on (count, buydate).
///
/// 1099-B lots are scanned last to first; each takes the first unclaimed raw
/// lot with the same count and acquisition date.
pub fn match_group(raw: &[Lot], from_1099: &[Lot], selldate: NaiveDate) -> GroupMatch {
    let mut assignments: Vec<Option<usize>> = vec![None; from_1099.len()];
    let mut claimed = vec![false; raw.len()];

    for (idx, lot) in from_1099.iter().enumerate().rev() {
        let found = raw
            .iter()
            .enumerate()
            .position(|(r, candidate)| {
                !claimed[r] && candidate.count == lot.count && candidate.buydate == lot.buydate
            });
        match found {
            Some(r) => {
                claimed[r] = true;
                assignments[idx] = Some(r);
            }
            None => debug!("no statement lot matches {}", lot),
        }
    }

    if assignments.iter().all(Option::is_some) {
        return GroupMatch::Complete(assignments.into_iter().flatten().collect());
    }

    let unassigned = assignments
        .iter()
        .enumerate()
        .filter_map(|(i, a)| a.is_none().then_some(i))
        .collect();
    let unclaimed_raw = claimed
        .iter()
        .enumerate()
        .filter_map(|(i, c)| (!c).then_some(i))
        .collect();
    GroupMatch::Ambiguous(Ambiguity {
        selldate,
        assignments,
        unassigned,
        unclaimed_raw,
    })
}

/// Copy the true acquisition onto a 1099-B lot, scaling basis by count, and
/// drop the broker's adjustment.
fn transfer_basis(good: &Lot, bad: &mut Lot) {
    bad.buydate = good.buydate;
    match (good.basis * Decimal::from(bad.count)).checked_div(Decimal::from(good.count)) {
        Some(basis) => bad.basis = basis,
        None => warn!("cannot scale basis from zero-share lot {}", good),
    }
    bad.code = None;
    bad.adjustment = None;
}

fn resolve_group(
    raw: &[Lot],
    from_1099: &[Lot],
    selldate: NaiveDate,
    resolver: &mut dyn MatchResolver,
) -> Result<Vec<usize>> {
    let ambiguity = match match_group(raw, from_1099, selldate) {
        GroupMatch::Complete(assignments) => return Ok(assignments),
        GroupMatch::Ambiguous(ambiguity) => ambiguity,
    };

    info!(
        %selldate,
        unassigned = ambiguity.unassigned.len(),
        "Need assistance matching"
    );
    let choices = resolver
        .resolve(&ambiguity, raw, from_1099)
        .ok_or(ImportError::Unresolved {
            selldate,
            unmatched: ambiguity.unassigned.len(),
        })?;
    if choices.len() != ambiguity.unassigned.len() {
        return Err(ImportError::ChoiceCount {
            selldate,
            expected: ambiguity.unassigned.len(),
            got: choices.len(),
        });
    }

    let mut assignments = ambiguity.assignments;
    for (&slot, &choice) in ambiguity.unassigned.iter().zip(&choices) {
        if choice >= raw.len() {
            return Err(ImportError::InvalidChoice {
                selldate,
                choice,
                available: raw.len(),
            });
        }
        assignments[slot] = Some(choice);
    }
    Ok(assignments.into_iter().flatten().collect())
}

/// Lots with 1099-B sale dates and proceeds plus statement acquisition dates
/// and basis.
///
/// Pure buys from `raw` come first. Then, for each sell date in order of
/// first appearance in `raw`, that date's 1099-B lots with their basis
/// corrected. 1099-B lots on dates with no statement sales come last,
/// unchanged.
pub fn match_lots_to_1099(
    raw: Vec<Lot>,
    from_1099: Vec<Lot>,
    resolver: &mut dyn MatchResolver,
) -> Result<Vec<Lot>> {
    let (mut out, mut sells): (Vec<Lot>, Vec<Lot>) = raw.into_iter().partition(|l| !l.has_sell());
    let mut remaining = from_1099;

    while let Some(selldate) = sells.first().and_then(Lot::selldate) {
        let (group_raw, rest): (Vec<Lot>, Vec<Lot>) =
            sells.into_iter().partition(|l| l.selldate() == Some(selldate));
        sells = rest;
        let (mut group_1099, rest): (Vec<Lot>, Vec<Lot>) =
            remaining.into_iter().partition(|l| l.selldate() == Some(selldate));
        remaining = rest;

        debug!(
            %selldate,
            statement = group_raw.len(),
            form = group_1099.len(),
            "matching sell date"
        );
        if group_1099.is_empty() {
            warn!(%selldate, lots = group_raw.len(), "statement sales missing from 1099-B");
            continue;
        }

        let assignments = resolve_group(&group_raw, &group_1099, selldate, resolver)?;
        for (lot, &r) in group_1099.iter_mut().zip(&assignments) {
            transfer_basis(&group_raw[r], lot);
        }
        out.extend(group_1099);
    }

    for lot in &remaining {
        warn!("No statement sale for 1099-B lot {}", lot);
    }
    out.extend(remaining);
    Ok(out)
}
