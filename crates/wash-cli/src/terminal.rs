//! Interactive terminal front ends for the engine progress hook and the
//! 1099-B match resolver.

use std::io::{self, BufRead, Write};

use broker_import::{Ambiguity, MatchResolver};
use wash_engine::{by_buy_date, Ledger, Lot, LotId, ProgressReporter};

const RED: &str = "\x1b[91m";
const END: &str = "\x1b[0m";

/// Prints the working set at every checkpoint, sorted by acquisition date
/// with the checkpoint's lots in red, then waits for Enter.
pub struct TerminalReporter<R, W> {
    input: R,
    output: W,
}

impl TerminalReporter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalReporter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn show(&mut self, ledger: &Ledger, lots: &[LotId], message: &str, highlighted: &[LotId]) -> io::Result<()> {
        let mut ordered: Vec<(LotId, &Lot)> = lots.iter().map(|id| (*id, &ledger[*id])).collect();
        ordered.sort_by(|a, b| by_buy_date(a.1, b.1));

        writeln!(self.output, "{}", message)?;
        for (id, lot) in ordered {
            if highlighted.contains(&id) {
                writeln!(self.output, "{}{}{}", RED, lot, END)?;
            } else {
                writeln!(self.output, "{}", lot)?;
            }
        }
        write!(self.output, "hit enter>")?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(())
    }
}

impl<R: BufRead, W: Write> ProgressReporter for TerminalReporter<R, W> {
    fn report(&mut self, ledger: &Ledger, lots: &[LotId], message: &str, highlighted: &[LotId]) {
        if let Err(e) = self.show(ledger, lots, message, highlighted) {
            tracing::warn!("progress output failed: {}", e);
        }
    }
}

/// Asks on the terminal which statement lot each unmatched 1099-B lot
/// corresponds to.
pub struct PromptResolver<R, W> {
    input: R,
    output: W,
}

impl PromptResolver<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> PromptResolver<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Reads until a valid index or end of input.
    fn ask(&mut self, available: usize) -> io::Result<Option<usize>> {
        loop {
            write!(self.output, "idx:")?;
            self.output.flush()?;
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            match line.trim().parse::<usize>() {
                Ok(idx) if idx < available => return Ok(Some(idx)),
                _ => writeln!(self.output, "enter a number below {}", available)?,
            }
        }
    }

    fn prompt(&mut self, ambiguity: &Ambiguity, raw: &[Lot], from_1099: &[Lot]) -> io::Result<Option<Vec<usize>>> {
        writeln!(self.output, "Need assistance matching lots sold on {}.", ambiguity.selldate)?;
        for &r in &ambiguity.unclaimed_raw {
            writeln!(self.output, "{}: {}", r, raw[r])?;
        }
        writeln!(self.output, "Pick indexes above for each of these lots from 1099b:")?;
        for &i in &ambiguity.unassigned {
            writeln!(self.output, "{}", from_1099[i])?;
        }

        let mut choices = Vec::with_capacity(ambiguity.unassigned.len());
        for &i in &ambiguity.unassigned {
            writeln!(self.output, "{}", from_1099[i])?;
            writeln!(self.output, "For this lot, which index is corresponding?")?;
            match self.ask(raw.len())? {
                Some(idx) => choices.push(idx),
                None => return Ok(None),
            }
        }
        Ok(Some(choices))
    }
}

impl<R: BufRead, W: Write> MatchResolver for PromptResolver<R, W> {
    fn resolve(&mut self, ambiguity: &Ambiguity, raw: &[Lot], from_1099: &[Lot]) -> Option<Vec<usize>> {
        match self.prompt(ambiguity, raw, from_1099) {
            Ok(choices) => choices,
            Err(e) => {
                tracing::warn!("match prompt failed: {}", e);
                None
            }
        }
    }
}
