//! Wash Sale Engine
//!
//! Rewrites a lot set so that every loss with a replacement purchase in its
//! window is disallowed and its loss moved onto the replacement's basis.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::detector::{buy_lots_within_window, earliest_wash_loss};
use crate::error::{Result, WashError};
use crate::ledger::{remove_lot, Ledger};
use crate::lot::{Lineage, Lot, LotId, WASH_CODE};
use crate::ordering::{by_buy_date, by_sell_date, sort_ids};
use crate::progress::ProgressReporter;
use crate::rules::WashRules;
use crate::splitter::split_head_lot;

/// One disallowed loss moved onto one replacement lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WashAdjustment {
    /// Symbol of the loss lot
    pub symbol: String,
    /// Shares paired
    pub count: u32,
    /// Sale date of the washed loss
    pub sale_date: NaiveDate,
    /// Acquisition date of the replacement after the holding-period shift
    pub replacement_buydate: NaiveDate,
    /// Loss disallowed and added to the replacement's basis
    pub disallowed_loss: Decimal,
    /// Days the replacement's acquisition date moved back
    pub holding_shift_days: i64,
    /// Form position of the loss lot at pairing time
    pub loss_position: String,
    /// Form position of the replacement lot at pairing time
    pub replacement_position: String,
}

/// Result of a wash run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WashReport {
    /// Every lot, sorted by sale date
    pub lots: Vec<Lot>,
    /// Pairings in the order they were made
    pub adjustments: Vec<WashAdjustment>,
}

impl WashReport {
    pub fn total_disallowed(&self) -> Decimal {
        self.adjustments.iter().map(|a| a.disallowed_loss).sum()
    }

    pub fn summary(&self) -> WashSummary {
        WashSummary::from_adjustments(None, self.adjustments.iter())
    }

    /// Summary of washes whose loss sale fell in `year`.
    pub fn year_summary(&self, year: i32) -> WashSummary {
        WashSummary::from_adjustments(
            Some(year),
            self.adjustments.iter().filter(|a| a.sale_date.year() == year),
        )
    }
}

/// Summary of wash sale activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WashSummary {
    pub tax_year: Option<i32>,
    pub wash_count: usize,
    pub total_disallowed_loss: Decimal,
    pub affected_symbols: Vec<String>,
}

impl WashSummary {
    fn from_adjustments<'a>(
        tax_year: Option<i32>,
        adjustments: impl Iterator<Item = &'a WashAdjustment>,
    ) -> Self {
        let mut wash_count = 0;
        let mut total_disallowed_loss = Decimal::ZERO;
        let mut symbols = BTreeSet::new();
        for adj in adjustments {
            wash_count += 1;
            total_disallowed_loss += adj.disallowed_loss;
            symbols.insert(adj.symbol.clone());
        }

        Self {
            tax_year,
            wash_count,
            total_disallowed_loss,
            affected_symbols: symbols.into_iter().collect(),
        }
    }
}

/// Drives loss detection, splitting and basis transfer over a lot set.
#[derive(Debug, Clone, Default)]
pub struct WashEngine {
    rules: WashRules,
}

impl WashEngine {
    pub fn new(rules: WashRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &WashRules {
        &self.rules
    }

    /// Wash `lots`, returning every resulting lot sorted by sale date.
    pub fn run(&self, lots: Vec<Lot>, reporter: &mut dyn ProgressReporter) -> Result<WashReport> {
        let (mut ledger, mut working) = Ledger::from_lots(lots);
        let mut removed = Vec::new();
        let mut adjustments = Vec::new();

        while let Some(mut losses) = earliest_wash_loss(&ledger, &working, &self.rules) {
            reporter.report(&ledger, &working, "Found the following losses", &losses);
            let mut buys = buy_lots_within_window(&ledger, &working, losses[0], &self.rules);
            reporter.report(&ledger, &working, "Here are the replacements", &buys);
            if buys.is_empty() {
                let selldate = ledger[losses[0]]
                    .selldate()
                    .ok_or(WashError::NotDisposed(losses[0]))?;
                return Err(WashError::NoReplacement { selldate });
            }

            sort_ids(&ledger, &mut buys, by_buy_date);
            sort_ids(&ledger, &mut losses, by_buy_date);
            tracing::debug!(
                losses = losses.len(),
                replacements = buys.len(),
                "pairing loss group"
            );

            while !buys.is_empty() && !losses.is_empty() {
                let buy_count = ledger[buys[0]].count;
                let loss_count = ledger[losses[0]].count;
                if buy_count > loss_count {
                    reporter.report(&ledger, &working, "Splitting buy", &buys[..1]);
                    let fragment = split_head_lot(&mut ledger, &mut buys, loss_count)?;
                    working.push(fragment);
                    reporter.report(&ledger, &working, "into these", &buys[..2]);
                } else if buy_count < loss_count {
                    reporter.report(&ledger, &working, "Splitting loss", &losses[..1]);
                    let fragment = split_head_lot(&mut ledger, &mut losses, buy_count)?;
                    working.push(fragment);
                    reporter.report(&ledger, &working, "into these", &losses[..2]);
                }

                let (buy, loss) = (buys[0], losses[0]);
                let (buy_count, loss_count) = (ledger[buy].count, ledger[loss].count);
                if buy_count != loss_count {
                    return Err(WashError::CountMismatch {
                        buy_count,
                        loss_count,
                    });
                }

                reporter.report(&ledger, &working, "pairing these", &[buy, loss]);
                remove_lot(&mut buys, buy);
                remove_lot(&mut losses, loss);
                remove_lot(&mut working, loss);
                removed.push(loss);

                adjustments.push(wash_pair(&mut ledger, loss, buy)?);
                reporter.report(&ledger, &working, "pair complete", &[buy]);
            }
        }

        removed.append(&mut working);
        sort_ids(&ledger, &mut removed, by_sell_date);

        let report = WashReport {
            lots: ledger.into_lots(&removed)?,
            adjustments,
        };
        tracing::info!(
            lots = report.lots.len(),
            washes = report.adjustments.len(),
            disallowed = %report.total_disallowed(),
            "wash run complete"
        );
        Ok(report)
    }
}

/// Disallow the loss on `loss` and move it onto `buy`.
fn wash_pair(ledger: &mut Ledger, loss_id: LotId, buy_id: LotId) -> Result<WashAdjustment> {
    let (buy, loss) = ledger.pair_mut(buy_id, loss_id)?;
    let sale = loss.sale.ok_or(WashError::NotDisposed(loss_id))?;
    let disallowed = loss.basis - sale.proceeds;
    let holding_days = (sale.date - loss.buydate).num_days();

    Lineage::merge((loss_id, &loss.lineage), (buy_id, &mut buy.lineage))?;
    buy.basis += disallowed;
    buy.buydate = buy.buydate - Duration::days(holding_days);
    buy.is_replacement = true;

    loss.code = Some(WASH_CODE);
    loss.adjustment = Some(disallowed);

    tracing::debug!(
        loss = %loss_id,
        replacement = %buy_id,
        count = loss.count,
        disallowed = %disallowed,
        shift_days = holding_days,
        "washed loss"
    );

    Ok(WashAdjustment {
        symbol: loss.symbol.clone(),
        count: loss.count,
        sale_date: sale.date,
        replacement_buydate: buy.buydate,
        disallowed_loss: disallowed,
        holding_shift_days: holding_days,
        loss_position: loss.form_position.clone(),
        replacement_position: buy.form_position.clone(),
    })
}

/// Wash `lots` under the default US rules.
pub fn perform_wash(lots: Vec<Lot>, reporter: &mut dyn ProgressReporter) -> Result<Vec<Lot>> {
    WashEngine::default().run(lots, reporter).map(|report| report.lots)
}
