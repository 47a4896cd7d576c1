//! Proportional lot splitting

use rust_decimal::Decimal;

use crate::error::{Result, WashError};
use crate::ledger::Ledger;
use crate::lot::LotId;

/// Split `amount` between `part` of `total` shares and the rest, so the two
/// halves add back up to `amount` exactly.
fn allocate(amount: Decimal, part: u32, total: u32) -> (Decimal, Decimal) {
    let head = amount * Decimal::from(part) / Decimal::from(total);
    (head, amount - head)
}

/// Carve `count` shares off the head of `lots` into a new lot.
///
/// The new lot takes `count` shares and its proportional share of basis and
/// proceeds (computed once against the pre-split totals); the original keeps
/// the remainder. The new lot is suffixed `.1`, the original `.2`, and the new
/// lot is inserted at the front of `lots`, so `lots[0]` is the fragment and
/// `lots[1]` the shrunken original.
pub fn split_head_lot(ledger: &mut Ledger, lots: &mut Vec<LotId>, count: u32) -> Result<LotId> {
    let head = *lots.first().ok_or(WashError::EmptySplit)?;
    let available = ledger.get(head)?.count;
    if count == 0 || count >= available {
        return Err(WashError::SplitOutOfRange {
            lot: head,
            requested: count,
            available,
        });
    }

    let new_id = ledger.duplicate(head)?;
    let (fragment, original) = ledger.pair_mut(new_id, head)?;

    let (new_basis, kept_basis) = allocate(original.basis, count, available);
    fragment.count = count;
    fragment.basis = new_basis;
    original.count = available - count;
    original.basis = kept_basis;

    if let (Some(new_sale), Some(kept_sale)) = (fragment.sale.as_mut(), original.sale.as_mut()) {
        let (new_proceeds, kept_proceeds) = allocate(kept_sale.proceeds, count, available);
        new_sale.proceeds = new_proceeds;
        kept_sale.proceeds = kept_proceeds;
    }

    fragment.form_position.push_str(".1");
    original.form_position.push_str(".2");

    tracing::debug!(
        lot = %head,
        fragment = %new_id,
        split_off = count,
        remaining = original.count,
        "split lot"
    );

    lots.insert(0, new_id);
    Ok(new_id)
}
