//! CSV persistence for lots.
//!
//! Columns, in order: count, symbol, description, buy date, basis, sell date,
//! proceeds, adjustment code, adjustment, form position. Dates are
//! `MM/DD/YYYY`; empty disposition cells mean a pure buy.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use wash_engine::Lot;

use crate::error::{LotFileError, Result};

pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Header cell that marks the header row.
const HEADER_MARKER: &str = "Cnt";

#[derive(Debug, Serialize)]
struct LotRow {
    #[serde(rename = "Cnt")]
    count: u32,
    #[serde(rename = "Sym")]
    symbol: String,
    #[serde(rename = "Desc")]
    description: String,
    #[serde(rename = "BuyDate")]
    buydate: String,
    #[serde(rename = "Basis")]
    basis: String,
    #[serde(rename = "SellDate")]
    selldate: String,
    #[serde(rename = "Proceeds")]
    proceeds: String,
    #[serde(rename = "AdjCode")]
    code: String,
    #[serde(rename = "Adj")]
    adjustment: String,
    #[serde(rename = "FormPosition")]
    form_position: String,
}

impl From<&Lot> for LotRow {
    fn from(lot: &Lot) -> Self {
        let money = |d: Decimal| d.normalize().to_string();
        Self {
            count: lot.count,
            symbol: lot.symbol.clone(),
            description: lot.description.clone(),
            buydate: lot.buydate.format(DATE_FORMAT).to_string(),
            basis: money(lot.basis),
            selldate: lot
                .selldate()
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            proceeds: lot.proceeds().map(money).unwrap_or_default(),
            code: lot.code.map(String::from).unwrap_or_default(),
            adjustment: lot.adjustment.map(money).unwrap_or_default(),
            form_position: lot.form_position.clone(),
        }
    }
}

/// Parse a `MM/DD/YYYY` cell.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

/// Parse a money cell, tolerating `$`, thousands separators and exponents.
pub fn parse_money(value: &str) -> Option<Decimal> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

fn invalid(row: usize, column: &'static str, value: &str) -> LotFileError {
    LotFileError::InvalidField {
        row,
        column,
        value: value.to_string(),
    }
}

fn parse_record(row: usize, record: &csv::StringRecord) -> Result<Lot> {
    let cell = |i: usize| record.get(i).unwrap_or("").trim();

    let count: u32 = cell(0)
        .parse()
        .ok()
        .filter(|c| *c > 0)
        .ok_or_else(|| invalid(row, "count", cell(0)))?;
    let buydate = parse_date(cell(3)).ok_or_else(|| invalid(row, "buy date", cell(3)))?;
    let basis = parse_money(cell(4)).ok_or_else(|| invalid(row, "basis", cell(4)))?;

    let mut lot = Lot::buy(count, cell(1), cell(2), buydate, basis);
    if !cell(5).is_empty() {
        let selldate = parse_date(cell(5)).ok_or_else(|| invalid(row, "sell date", cell(5)))?;
        let proceeds = parse_money(cell(6)).ok_or_else(|| invalid(row, "proceeds", cell(6)))?;
        lot = lot.with_sale(selldate, proceeds);
        lot.code = cell(7).chars().next();
        lot.adjustment = match cell(8) {
            "" => None,
            adj => Some(parse_money(adj).ok_or_else(|| invalid(row, "adjustment", adj))?),
        };
    }
    lot.form_position = cell(9).to_string();
    Ok(lot)
}

/// Read lots from CSV. A leading header row is skipped, as are blank rows.
pub fn read_lots<R: Read>(reader: R) -> Result<Vec<Lot>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut lots = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let first = record.get(0).unwrap_or("").trim();
        if first == HEADER_MARKER || record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        lots.push(parse_record(i + 1, &record)?);
    }

    tracing::debug!(lots = lots.len(), "read lots");
    Ok(lots)
}

pub fn load_lots(path: impl AsRef<Path>) -> Result<Vec<Lot>> {
    read_lots(File::open(path)?)
}

/// Write a header row then one row per lot.
pub fn write_lots<W: Write>(writer: W, lots: &[Lot]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    if lots.is_empty() {
        writer.write_record([
            "Cnt", "Sym", "Desc", "BuyDate", "Basis", "SellDate", "Proceeds", "AdjCode", "Adj",
            "FormPosition",
        ])?;
    }
    for lot in lots {
        writer.serialize(LotRow::from(lot))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_lots(path: impl AsRef<Path>, lots: &[Lot]) -> Result<()> {
    let path = path.as_ref();
    write_lots(File::create(path)?, lots)?;
    tracing::info!(lots = lots.len(), path = %path.display(), "saved lots");
    Ok(())
}
