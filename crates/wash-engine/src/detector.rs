//! Loss detection and replacement window search

use crate::ledger::Ledger;
use crate::lot::LotId;
use crate::ordering::{by_sell_date, sort_ids};
use crate::rules::WashRules;

/// Lots that can absorb the loss on `loss`: bought within the window around
/// its sale, not sold on that same day, not already a replacement, and not
/// sharing an origin purchase with the loss.
///
/// Order follows `lots`; callers sort before pairing.
pub fn buy_lots_within_window(
    ledger: &Ledger,
    lots: &[LotId],
    loss: LotId,
    rules: &WashRules,
) -> Vec<LotId> {
    let loss_lot = &ledger[loss];
    let Some(sale_date) = loss_lot.selldate() else {
        return Vec::new();
    };

    lots.iter()
        .copied()
        .filter(|id| {
            let lot = &ledger[*id];
            rules.in_window(lot.buydate, sale_date)
                && lot.selldate() != Some(sale_date)
                && !lot.is_replacement
                && !lot.lineage.intersects(&loss_lot.lineage)
                && rules.symbols_compatible(loss_lot, lot)
        })
        .collect()
}

/// The earliest-sold washable loss together with every loss sold the same
/// day right after it in sell-date order, limited to symbols the rules let
/// share a replacement pool. `None` once no loss left in `lots`
/// has a replacement.
pub fn earliest_wash_loss(
    ledger: &Ledger,
    lots: &[LotId],
    rules: &WashRules,
) -> Option<Vec<LotId>> {
    let mut ordered = lots.to_vec();
    sort_ids(ledger, &mut ordered, by_sell_date);

    for (i, id) in ordered.iter().enumerate() {
        let lot = &ledger[*id];
        // Unsold lots sort last, so nothing sold remains.
        let sale_date = lot.selldate()?;
        if !lot.is_loss() {
            continue;
        }
        if buy_lots_within_window(ledger, lots, *id, rules).is_empty() {
            continue;
        }

        // Same-day lots are contiguous. Lots the symbol rule keeps apart from
        // this loss are stepped over; a compatible gain ends the group.
        let mut group = vec![*id];
        for next_id in &ordered[i + 1..] {
            let next = &ledger[*next_id];
            if next.selldate() != Some(sale_date) {
                break;
            }
            if !rules.symbols_compatible(lot, next) {
                continue;
            }
            if !next.is_loss() {
                break;
            }
            group.push(*next_id);
        }
        return Some(group);
    }

    None
}
