//! Owned arena of lots.
//!
//! Working sets, loss groups and replacement candidates are all lists of
//! [`LotId`] over one ledger, so a lot mutated through one view is the same
//! lot seen by every other view.

use std::ops::Index;

use crate::error::{Result, WashError};
use crate::lot::{Lineage, Lot, LotId};

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    lots: Vec<Lot>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from input lots, returning their ids in input order.
    pub fn from_lots(lots: impl IntoIterator<Item = Lot>) -> (Self, Vec<LotId>) {
        let mut ledger = Self::new();
        let ids = lots.into_iter().map(|lot| ledger.insert(lot)).collect();
        (ledger, ids)
    }

    /// Add a lot. A lot without lineage becomes its own origin.
    pub fn insert(&mut self, mut lot: Lot) -> LotId {
        let id = LotId(self.lots.len());
        if lot.lineage.is_empty() {
            lot.lineage = Lineage::of(id);
        }
        self.lots.push(lot);
        id
    }

    /// Copy an existing lot under a fresh id. Lineage is shared with the source.
    pub fn duplicate(&mut self, id: LotId) -> Result<LotId> {
        let copy = self.get(id)?.clone();
        let new_id = LotId(self.lots.len());
        self.lots.push(copy);
        Ok(new_id)
    }

    pub fn get(&self, id: LotId) -> Result<&Lot> {
        self.lots.get(id.0).ok_or(WashError::UnknownLot(id))
    }

    pub fn get_mut(&mut self, id: LotId) -> Result<&mut Lot> {
        self.lots.get_mut(id.0).ok_or(WashError::UnknownLot(id))
    }

    /// Mutable access to two distinct lots at once.
    pub fn pair_mut(&mut self, a: LotId, b: LotId) -> Result<(&mut Lot, &mut Lot)> {
        if a == b {
            return Err(WashError::DuplicateLot(a));
        }
        let len = self.lots.len();
        for id in [a, b] {
            if id.0 >= len {
                return Err(WashError::UnknownLot(id));
            }
        }
        if a.0 < b.0 {
            let (head, tail) = self.lots.split_at_mut(b.0);
            Ok((&mut head[a.0], &mut tail[0]))
        } else {
            let (head, tail) = self.lots.split_at_mut(a.0);
            Ok((&mut tail[0], &mut head[b.0]))
        }
    }

    pub fn len(&self) -> usize {
        self.lots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    /// Resolve a list of ids to lot references.
    pub fn view<'a>(&'a self, ids: &[LotId]) -> Result<Vec<&'a Lot>> {
        ids.iter().map(|id| self.get(*id)).collect()
    }

    /// Consume the ledger, yielding the lots named by `order` in that order.
    pub fn into_lots(self, order: &[LotId]) -> Result<Vec<Lot>> {
        let mut slots: Vec<Option<Lot>> = self.lots.into_iter().map(Some).collect();
        order
            .iter()
            .map(|id| {
                slots
                    .get_mut(id.0)
                    .ok_or(WashError::UnknownLot(*id))?
                    .take()
                    .ok_or(WashError::DuplicateLot(*id))
            })
            .collect()
    }
}

impl Index<LotId> for Ledger {
    type Output = Lot;

    fn index(&self, id: LotId) -> &Lot {
        &self.lots[id.0]
    }
}

/// Drop one exact lot from a view, by identity.
pub fn remove_lot(ids: &mut Vec<LotId>, id: LotId) {
    ids.retain(|other| *other != id);
}
