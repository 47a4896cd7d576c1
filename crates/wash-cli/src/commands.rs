use std::fs::{self, File};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use broker_import::{
    match_lots_to_1099, parse_schwab_1099b, parse_schwab_statement, remove_sold_buys,
};
use lot_store::{load_lots, render_lots, save_lots};
use tracing::{info, warn};
use wash_engine::{
    by_buy_date, Lot, NullReporter, ProgressReporter, TracingReporter, WashEngine, WashRules,
    WASH_CODE,
};

use crate::terminal::{PromptResolver, TerminalReporter};

/// Options of the `wash` subcommand after config and flags are merged.
pub struct WashOptions {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub quiet: bool,
    pub summary_json: Option<PathBuf>,
    pub rules: WashRules,
}

/// How engine checkpoints are shown during `wash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterKind {
    Silent,
    /// Step through on the terminal.
    Interactive,
    /// `debug` events only; used when nobody can press Enter.
    Log,
}

pub fn reporter_kind(quiet: bool, interactive: bool) -> ReporterKind {
    match (quiet, interactive) {
        (true, _) => ReporterKind::Silent,
        (false, true) => ReporterKind::Interactive,
        (false, false) => ReporterKind::Log,
    }
}

fn make_reporter(kind: ReporterKind) -> Box<dyn ProgressReporter> {
    match kind {
        ReporterKind::Silent => Box::new(NullReporter),
        ReporterKind::Interactive => Box::new(TerminalReporter::stdio()),
        ReporterKind::Log => Box::new(TracingReporter),
    }
}

/// Lots already carrying a wash code.
///
/// The lot file has no column for the replacement flag or lineage, so the
/// replacements of an earlier run read back as ordinary buys and can be
/// paired again.
pub fn prior_washes(lots: &[Lot]) -> usize {
    lots.iter().filter(|l| l.code == Some(WASH_CODE)).count()
}

fn print_lots(lots: &[Lot]) -> Result<()> {
    print!("{}", render_lots(lots)?);
    Ok(())
}

pub fn wash(opts: WashOptions) -> Result<()> {
    let lots = load_lots(&opts.input)
        .with_context(|| format!("failed to load lots from {}", opts.input.display()))?;
    print_lots(&lots)?;
    let washed = prior_washes(&lots);
    if washed > 0 {
        warn!(
            washed,
            "input already has wash-coded lots; replacements from that run are not marked and may be paired again"
        );
    }

    let engine = WashEngine::new(opts.rules);
    let mut reporter = make_reporter(reporter_kind(opts.quiet, io::stdin().is_terminal()));
    let report = engine.run(lots, reporter.as_mut())?;

    println!("final:");
    print_lots(&report.lots)?;

    let summary = report.summary();
    info!(
        washes = summary.wash_count,
        disallowed = %summary.total_disallowed_loss,
        symbols = ?summary.affected_symbols,
        "Wash complete"
    );

    if let Some(path) = &opts.output {
        save_lots(path, &report.lots)
            .with_context(|| format!("failed to save lots to {}", path.display()))?;
    }
    if let Some(path) = &opts.summary_json {
        let json = serde_json::to_string_pretty(&summary)?;
        fs::write(path, json)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
    }
    Ok(())
}

pub fn reconcile(in_1099b: &Path, statements: &[PathBuf], output: &Path) -> Result<()> {
    let mut lots = Vec::new();
    for path in statements {
        info!(path = %path.display(), "parsing statement");
        let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        lots.extend(
            parse_schwab_statement(file)
                .with_context(|| format!("failed to parse statement {}", path.display()))?,
        );
    }
    print_lots(&lots)?;
    let lots = remove_sold_buys(lots);

    let file = File::open(in_1099b).with_context(|| format!("failed to open {}", in_1099b.display()))?;
    let from_1099 = parse_schwab_1099b(file)
        .with_context(|| format!("failed to parse 1099-B {}", in_1099b.display()))?;
    // Broker adjustments need not balance, so no totals line here.
    println!("1099b:");
    for lot in &from_1099 {
        println!("{}", lot);
    }

    let matched = match_lots_to_1099(lots, from_1099, &mut PromptResolver::stdio())?;
    println!("1099b final:");
    for lot in &matched {
        println!("{}", lot);
    }
    save_lots(output, &matched).with_context(|| format!("failed to save lots to {}", output.display()))?;
    Ok(())
}

/// Same lots regardless of order.
pub fn same_lots(mut got: Vec<Lot>, mut expected: Vec<Lot>) -> bool {
    got.sort_by(by_buy_date);
    expected.sort_by(by_buy_date);
    got.len() == expected.len() && got.iter().zip(&expected).all(|(a, b)| a.same_record(b))
}

/// `X.csv` inputs in `dir` that have an `X_out.csv` next to them.
fn fixture_pairs(dir: &Path) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut inputs: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to read {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(".csv") && !n.ends_with("_out.csv"))
        })
        .collect();
    inputs.sort();

    let mut pairs = Vec::new();
    for input in inputs {
        let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        let expected = input.with_file_name(format!("{}_out.csv", stem));
        if expected.exists() {
            pairs.push((input, expected));
        } else {
            warn!(input = %input.display(), "no expected output, skipping");
        }
    }
    Ok(pairs)
}

/// Runs every fixture pair in `dir`; returns the number that failed.
pub fn check(dir: &Path, rules: WashRules) -> Result<usize> {
    let engine = WashEngine::new(rules);
    let mut failed = 0;

    for (input, expected_path) in fixture_pairs(dir)? {
        let lots = load_lots(&input).with_context(|| format!("failed to load {}", input.display()))?;
        let expected = load_lots(&expected_path)
            .with_context(|| format!("failed to load {}", expected_path.display()))?;
        let got = engine.run(lots, &mut NullReporter)?.lots;

        if same_lots(got.clone(), expected.clone()) {
            println!("Test passed: {}", input.display());
        } else {
            failed += 1;
            println!("Test failed: {}", input.display());
            println!("Got result:");
            print_lots(&got)?;
            println!("\nExpected:");
            print_lots(&expected)?;
        }
    }
    Ok(failed)
}
