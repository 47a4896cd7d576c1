//! Schwab document parsers.
//!
//! Both inputs are CSV exports of PDF tables: the 1099-B has the sale dates
//! and proceeds the IRS sees, the account statements have the real
//! acquisition dates and cost.

use std::io::Read;

use chrono::NaiveDate;
use lot_store::{parse_date, parse_money};
use rust_decimal::Decimal;
use wash_engine::{Lot, WASH_CODE};

use crate::error::{ImportError, Result};

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input)
}

fn malformed(line: usize, reason: impl Into<String>) -> ImportError {
    ImportError::MalformedRow {
        line,
        reason: reason.into(),
    }
}

fn cell(record: &csv::StringRecord, i: usize) -> &str {
    record.get(i).unwrap_or("").trim()
}

fn date_cell(record: &csv::StringRecord, i: usize, line: usize) -> Result<NaiveDate> {
    parse_date(cell(record, i))
        .ok_or_else(|| malformed(line, format!("bad date '{}' in column {}", cell(record, i), i + 1)))
}

fn money_cell(record: &csv::StringRecord, i: usize, line: usize) -> Result<Decimal> {
    parse_money(cell(record, i))
        .ok_or_else(|| malformed(line, format!("bad amount '{}' in column {}", cell(record, i), i + 1)))
}

/// 1099-B lot in progress; each lot spans three rows.
#[derive(Default)]
struct PendingLot {
    description: String,
    buydate: Option<NaiveDate>,
    proceeds: Decimal,
    basis: Decimal,
    washed: bool,
    count: u32,
    symbol: String,
}

/// Parse a 1099-B table export.
///
/// Rows come in threes: description, acquisition date, proceeds, basis and
/// wash code; then `"<count> ... ... <symbol>"` in the first cell; then the
/// sale date and an optional adjustment in column 7.
pub fn parse_schwab_1099b<R: Read>(input: R) -> Result<Vec<Lot>> {
    let mut lots = Vec::new();
    let mut pending = PendingLot::default();

    for (i, result) in reader(input).records().enumerate() {
        let record = result?;
        let line = i + 1;
        match i % 3 {
            0 => {
                pending = PendingLot {
                    description: cell(&record, 1).to_string(),
                    buydate: Some(date_cell(&record, 2, line)?),
                    proceeds: money_cell(&record, 3, line)?,
                    basis: money_cell(&record, 4, line)?,
                    washed: cell(&record, 5).starts_with(WASH_CODE),
                    ..PendingLot::default()
                };
            }
            1 => {
                let tokens: Vec<&str> = cell(&record, 0).split_whitespace().collect();
                pending.count = tokens
                    .first()
                    .and_then(|t| t.parse().ok())
                    .filter(|c| *c > 0)
                    .ok_or_else(|| malformed(line, "missing share count"))?;
                pending.symbol = tokens
                    .get(3)
                    .ok_or_else(|| malformed(line, "missing symbol"))?
                    .to_string();
            }
            _ => {
                let selldate = date_cell(&record, 2, line)?;
                let adjustment = match cell(&record, 6) {
                    "" => None,
                    _ => Some(money_cell(&record, 6, line)?),
                };
                let buydate = pending
                    .buydate
                    .ok_or_else(|| malformed(line, "sale row without acquisition row"))?;

                let mut lot = Lot::buy(
                    pending.count,
                    pending.symbol.clone(),
                    pending.description.clone(),
                    buydate,
                    pending.basis,
                )
                .with_sale(selldate, pending.proceeds)
                .with_form_position(format!("Line {}", i / 3 + 1));
                lot.code = pending.washed.then_some(WASH_CODE);
                lot.adjustment = adjustment;

                tracing::debug!("1099-B {}", lot);
                lots.push(lot);
            }
        }
    }

    Ok(lots)
}

/// Parse account statement rows. `Sale` rows become sold lots and `Deposit`
/// rows pure buys; cost and proceeds are per share and scaled by the count.
pub fn parse_schwab_statement<R: Read>(input: R) -> Result<Vec<Lot>> {
    let mut lots = Vec::new();

    for (i, result) in reader(input).records().enumerate() {
        let record = result?;
        let line = i + 1;
        let kind = cell(&record, 2);
        if kind != "Sale" && kind != "Deposit" {
            tracing::debug!(line, kind, "skipping statement row");
            continue;
        }

        let count_text = cell(&record, 7).trim_matches(|c| c == '(' || c == ')' || c == ' ');
        let count: u32 = count_text
            .parse()
            .ok()
            .filter(|c| *c > 0)
            .ok_or_else(|| malformed(line, format!("bad share count '{}'", count_text)))?;
        let shares = Decimal::from(count);

        let buydate = date_cell(&record, 4, line)?;
        let basis = money_cell(&record, 5, line)? * shares;
        let lot = Lot::buy(count, cell(&record, 0), cell(&record, 3), buydate, basis);

        let lot = if kind == "Sale" {
            let selldate = date_cell(&record, 1, line)?;
            let proceeds = money_cell(&record, 8, line)? * shares;
            lot.with_sale(selldate, proceeds)
        } else {
            lot
        };
        lots.push(lot);
    }

    Ok(lots)
}
