//! Totals over a lot listing

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WashError};
use crate::ledger::Ledger;
use crate::lot::{Lot, LotId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotTotals {
    pub lots: usize,
    pub shares: u64,
    pub basis: Decimal,
    pub proceeds: Decimal,
    pub adjustment: Decimal,
}

impl LotTotals {
    /// Sum a listing, checking that every non-zero adjustment equals
    /// `basis - proceeds` on its lot.
    pub fn from_lots<'a>(lots: impl IntoIterator<Item = &'a Lot>) -> Result<Self> {
        let mut totals = Self::default();
        for lot in lots {
            totals.lots += 1;
            totals.shares += lot.count as u64;
            totals.basis += lot.basis;
            totals.proceeds += lot.proceeds().unwrap_or_default();

            let adjustment = lot.adjustment.unwrap_or_default();
            if !adjustment.is_zero() {
                let expected = lot.basis - lot.proceeds().unwrap_or_default();
                if adjustment != expected {
                    return Err(WashError::AdjustmentMismatch {
                        lot: lot.to_string(),
                        adjustment,
                        expected,
                    });
                }
                totals.adjustment += adjustment;
            }
        }
        Ok(totals)
    }

    /// Same as [`LotTotals::from_lots`] over a ledger view, which must not
    /// name any lot twice.
    pub fn from_view(ledger: &Ledger, ids: &[LotId]) -> Result<Self> {
        let mut seen = HashSet::new();
        for id in ids {
            if !seen.insert(*id) {
                return Err(WashError::DuplicateLot(*id));
            }
        }
        Self::from_lots(ledger.view(ids)?)
    }

    /// Basis net of disallowed losses.
    pub fn net_basis(&self) -> Decimal {
        self.basis - self.adjustment
    }
}

impl std::fmt::Display for LotTotals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Totals: Basis {:.2} Proceeds {:.2} Adj: {:.2} (basis-adj: {:.2})",
            self.basis,
            self.proceeds,
            self.adjustment,
            self.net_basis()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lot::WASH_CODE;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn washed(adjustment: Decimal) -> Lot {
        let mut lot = Lot::buy(10, "XYZ", "", date(1, 1), dec!(1000)).with_sale(date(2, 1), dec!(800));
        lot.code = Some(WASH_CODE);
        lot.adjustment = Some(adjustment);
        lot
    }

    #[test]
    fn test_totals() {
        let lots = vec![washed(dec!(200)), Lot::buy(5, "XYZ", "", date(2, 5), dec!(600))];
        let totals = LotTotals::from_lots(&lots).unwrap();
        assert_eq!(totals.lots, 2);
        assert_eq!(totals.shares, 15);
        assert_eq!(totals.basis, dec!(1600));
        assert_eq!(totals.proceeds, dec!(800));
        assert_eq!(totals.adjustment, dec!(200));
        assert_eq!(totals.net_basis(), dec!(1400));
        assert_eq!(
            totals.to_string(),
            "Totals: Basis 1600.00 Proceeds 800.00 Adj: 200.00 (basis-adj: 1400.00)"
        );
    }

    #[test]
    fn test_adjustment_identity_enforced() {
        let err = LotTotals::from_lots(&[washed(dec!(150))]).unwrap_err();
        assert!(matches!(
            err,
            WashError::AdjustmentMismatch { adjustment, expected, .. }
                if adjustment == dec!(150) && expected == dec!(200)
        ));
        assert!(LotTotals::from_lots(&[washed(dec!(0))]).is_ok());
    }

    #[test]
    fn test_view_rejects_duplicates() {
        let (ledger, ids) = Ledger::from_lots([washed(dec!(200))]);
        assert!(LotTotals::from_view(&ledger, &ids).is_ok());
        assert_eq!(
            LotTotals::from_view(&ledger, &[ids[0], ids[0]]).unwrap_err(),
            WashError::DuplicateLot(ids[0])
        );
    }
}
