//! Tax lot records
//!
//! A lot is a block of identical shares with one acquisition and at most one
//! disposition. Basis and proceeds are always totals for the whole lot.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WashError};

/// Adjustment code written on a washed loss.
pub const WASH_CODE: char = 'W';

/// Stable identity of a lot inside a [`crate::Ledger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LotId(pub usize);

impl fmt::Display for LotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Disposition half of a lot. Date and proceeds are set together or not at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub date: NaiveDate,
    /// Total proceeds for the whole lot
    pub proceeds: Decimal,
}

/// Set of original acquisition lots a (split or merged) lot traces back to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lineage(BTreeSet<LotId>);

impl Lineage {
    pub fn of(origin: LotId) -> Self {
        Self(BTreeSet::from([origin]))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: LotId) -> bool {
        self.0.contains(&id)
    }

    pub fn intersects(&self, other: &Lineage) -> bool {
        !self.0.is_disjoint(&other.0)
    }

    pub fn origins(&self) -> impl Iterator<Item = LotId> + '_ {
        self.0.iter().copied()
    }

    /// Fold `from`'s origins into `into`. The two sets must be disjoint;
    /// an overlap means the same purchase would be counted twice.
    pub fn merge(from: (LotId, &Lineage), into: (LotId, &mut Lineage)) -> Result<()> {
        let (from_id, from_lineage) = from;
        let (into_id, into_lineage) = into;
        if into_lineage.intersects(from_lineage) {
            let shared: Lineage = Lineage(
                into_lineage
                    .0
                    .intersection(&from_lineage.0)
                    .copied()
                    .collect(),
            );
            return Err(WashError::LineageOverlap {
                from: from_id,
                into: into_id,
                shared: shared.to_string(),
            });
        }
        into_lineage.0.extend(from_lineage.0.iter().copied());
        Ok(())
    }
}

impl fmt::Display for Lineage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for id in &self.0 {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{}", id)?;
            first = false;
        }
        Ok(())
    }
}

/// A tax lot: `count` shares of `symbol` bought on `buydate` for `basis`,
/// optionally sold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    pub count: u32,
    pub symbol: String,
    pub description: String,
    pub buydate: NaiveDate,
    /// Total cost basis for the whole lot
    pub basis: Decimal,
    pub sale: Option<Sale>,
    /// One-character adjustment code, e.g. `W` for a wash sale
    pub code: Option<char>,
    pub adjustment: Option<Decimal>,
    /// Set once this lot has absorbed a disallowed loss
    #[serde(default)]
    pub is_replacement: bool,
    #[serde(default)]
    pub lineage: Lineage,
    /// Free-text provenance, suffixed `.1`/`.2` on every split
    #[serde(default)]
    pub form_position: String,
}

impl Lot {
    /// A pure purchase.
    pub fn buy(
        count: u32,
        symbol: impl Into<String>,
        description: impl Into<String>,
        buydate: NaiveDate,
        basis: Decimal,
    ) -> Self {
        Self {
            count,
            symbol: symbol.into(),
            description: description.into(),
            buydate,
            basis,
            sale: None,
            code: None,
            adjustment: None,
            is_replacement: false,
            lineage: Lineage::default(),
            form_position: String::new(),
        }
    }

    pub fn with_sale(mut self, date: NaiveDate, proceeds: Decimal) -> Self {
        self.sale = Some(Sale { date, proceeds });
        self
    }

    pub fn with_form_position(mut self, position: impl Into<String>) -> Self {
        self.form_position = position.into();
        self
    }

    pub fn has_sell(&self) -> bool {
        self.sale.is_some()
    }

    pub fn selldate(&self) -> Option<NaiveDate> {
        self.sale.map(|s| s.date)
    }

    pub fn proceeds(&self) -> Option<Decimal> {
        self.sale.map(|s| s.proceeds)
    }

    /// Disposed for less than its basis, net of any adjustment already
    /// recorded. A fully washed loss is no longer a loss.
    pub fn is_loss(&self) -> bool {
        matches!(
            self.sale,
            Some(sale) if sale.proceeds + self.adjustment.unwrap_or_default() < self.basis
        )
    }

    /// `basis - proceeds` for a disposed lot.
    pub fn loss_amount(&self) -> Option<Decimal> {
        self.sale.map(|s| self.basis - s.proceeds)
    }

    /// Days between acquisition and disposition.
    pub fn holding_days(&self) -> Option<i64> {
        self.sale.map(|s| (s.date - self.buydate).num_days())
    }

    /// Same purchase as seen from two different documents.
    pub fn acquisition_match(&self, other: &Lot) -> bool {
        self.count == other.count
            && self.symbol == other.symbol
            && self.description == other.description
            && self.buydate == other.buydate
            && self.basis == other.basis
    }

    /// Every persisted column is equal. Engine-only state (replacement flag,
    /// lineage) is ignored.
    pub fn same_record(&self, other: &Lot) -> bool {
        self.acquisition_match(other)
            && self.sale == other.sale
            && self.code == other.code
            && self.adjustment.unwrap_or_default() == other.adjustment.unwrap_or_default()
            && self.form_position == other.form_position
    }
}

impl fmt::Display for Lot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:2} {} ({}) acq: {} {:8.2}",
            self.count, self.symbol, self.description, self.buydate, self.basis
        )?;
        if let Some(sale) = &self.sale {
            write!(f, " sell: {} {:8.2}", sale.date, sale.proceeds)?;
        }
        let code = self.code.map(String::from).unwrap_or_default();
        match self.adjustment {
            Some(adj) if !adj.is_zero() => write!(f, " [{:1} {:6.2}]", code, adj)?,
            _ if self.code.is_some() => write!(f, " [{:1}]", code)?,
            _ => {}
        }
        if !self.form_position.is_empty() {
            write!(f, " {}", self.form_position)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_loss_detection() {
        let buy = Lot::buy(10, "AAPL", "Apple", date(2024, 1, 2), dec!(1500));
        assert!(!buy.is_loss());
        assert_eq!(buy.loss_amount(), None);

        let loss = buy.clone().with_sale(date(2024, 2, 1), dec!(1400));
        assert!(loss.is_loss());
        assert_eq!(loss.loss_amount(), Some(dec!(100)));
        assert_eq!(loss.holding_days(), Some(30));

        let even = buy.with_sale(date(2024, 2, 1), dec!(1500));
        assert!(!even.is_loss());

        let mut washed = loss.clone();
        washed.code = Some(WASH_CODE);
        washed.adjustment = Some(dec!(100));
        assert!(!washed.is_loss());
        assert_eq!(washed.loss_amount(), Some(dec!(100)));
    }

    #[test]
    fn test_lineage_merge() {
        let mut into = Lineage::of(LotId(1));
        let from = Lineage::of(LotId(4));
        Lineage::merge((LotId(4), &from), (LotId(1), &mut into)).unwrap();
        assert_eq!(into.to_string(), "1,4");
        assert!(into.intersects(&from));

        let err = Lineage::merge((LotId(4), &from), (LotId(1), &mut into)).unwrap_err();
        assert!(matches!(err, WashError::LineageOverlap { ref shared, .. } if shared == "4"));
    }

    #[test]
    fn test_display() {
        let mut lot = Lot::buy(5, "XYZ", "Xyz Corp", date(2024, 3, 1), dec!(100))
            .with_sale(date(2024, 3, 20), dec!(80))
            .with_form_position("Line 2");
        lot.code = Some(WASH_CODE);
        lot.adjustment = Some(dec!(20));
        assert_eq!(
            lot.to_string(),
            " 5 XYZ (Xyz Corp) acq: 2024-03-01   100.00 sell: 2024-03-20    80.00 [W  20.00] Line 2"
        );
    }

    #[test]
    fn test_same_record_ignores_engine_state() {
        let a = Lot::buy(5, "XYZ", "Xyz", date(2024, 3, 1), dec!(100));
        let mut b = a.clone();
        b.is_replacement = true;
        b.lineage = Lineage::of(LotId(7));
        assert!(a.same_record(&b));
        b.adjustment = Some(dec!(0));
        assert!(a.same_record(&b));
        b.form_position.push_str(".1");
        assert!(!a.same_record(&b));
    }
}
