//! Wash sale matching rules

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::lot::Lot;

/// Parameters of the replacement search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WashRules {
    /// Days before and after a loss sale in which a purchase is a replacement
    pub wash_sale_window_days: u32,
    /// Only lots of the loss lot's symbol can replace it
    pub same_symbol_only: bool,
}

impl WashRules {
    /// IRS rule: 30 days either side of the sale, inclusive.
    pub fn us() -> Self {
        Self {
            wash_sale_window_days: 30,
            same_symbol_only: false,
        }
    }

    /// Load from environment variables, falling back to [`WashRules::us`].
    pub fn from_env() -> Self {
        let defaults = Self::us();
        Self {
            wash_sale_window_days: std::env::var("WASH_WINDOW_DAYS")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.wash_sale_window_days),
            same_symbol_only: std::env::var("WASH_SAME_SYMBOL_ONLY")
                .ok()
                .map(|s| matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.same_symbol_only),
        }
    }

    /// First and last day of the window around a sale date.
    pub fn window(&self, sale_date: NaiveDate) -> (NaiveDate, NaiveDate) {
        let days = Duration::days(self.wash_sale_window_days as i64);
        (sale_date - days, sale_date + days)
    }

    /// Whether `date` falls inside the window around `sale_date`.
    pub fn in_window(&self, date: NaiveDate, sale_date: NaiveDate) -> bool {
        (date - sale_date).num_days().abs() <= self.wash_sale_window_days as i64
    }

    pub fn symbols_compatible(&self, loss: &Lot, candidate: &Lot) -> bool {
        !self.same_symbol_only || loss.symbol == candidate.symbol
    }
}

impl Default for WashRules {
    fn default() -> Self {
        Self::us()
    }
}
