use std::fmt::Write;

use wash_engine::{Lot, LotTotals};

/// Human-readable listing: one line per lot followed by a totals line.
pub fn render_lots(lots: &[Lot]) -> wash_engine::Result<String> {
    let totals = LotTotals::from_lots(lots)?;
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "Printing {} lots:", lots.len());
    for lot in lots {
        let _ = writeln!(out, "{}", lot);
    }
    let _ = writeln!(out, "{}", totals);
    Ok(out)
}
