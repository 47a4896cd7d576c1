//! washsale: wash sale adjustments for tax lot CSV files.
//!
//! Usage:
//!   washsale wash lots.csv -o lots_out.csv
//!   washsale wash lots.csv -q --summary-json summary.json
//!   washsale reconcile --in1099b 1099b.csv --statements jan.csv feb.csv -o lots.csv
//!   washsale check tests/

mod commands;
mod terminal;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use wash_engine::WashRules;

use crate::commands::WashOptions;

/// Computes wash sale adjustments over tax lots.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply wash sale adjustments to a lot file.
    Wash(WashArgs),
    /// Build a lot file from a 1099-B and the matching account statements.
    Reconcile(ReconcileArgs),
    /// Run every X.csv in a directory and compare against X_out.csv.
    Check(CheckArgs),
}

/// Overrides for `WASH_WINDOW_DAYS` / `WASH_SAME_SYMBOL_ONLY`.
#[derive(Args)]
struct RuleArgs {
    /// Days on either side of a loss sale that count as a replacement purchase.
    #[arg(long)]
    window_days: Option<u32>,

    /// Only same-symbol lots can replace a loss.
    #[arg(long)]
    same_symbol: bool,
}

impl RuleArgs {
    fn resolve(&self) -> WashRules {
        let mut rules = WashRules::from_env();
        if let Some(days) = self.window_days {
            rules.wash_sale_window_days = days;
        }
        if self.same_symbol {
            rules.same_symbol_only = true;
        }
        rules
    }
}

#[derive(Args)]
struct WashArgs {
    /// Lot file to process.
    input: PathBuf,

    /// Where to write the adjusted lots.
    #[arg(short, long)]
    out_file: Option<PathBuf>,

    /// Skip the step-by-step progress display.
    #[arg(short, long)]
    quiet: bool,

    /// Write a JSON summary of the washes to this path.
    #[arg(long)]
    summary_json: Option<PathBuf>,

    #[command(flatten)]
    rules: RuleArgs,
}

#[derive(Args)]
struct ReconcileArgs {
    /// 1099-B table export.
    #[arg(long)]
    in1099b: PathBuf,

    /// Account statement table exports.
    #[arg(long, num_args = 1.., required = true)]
    statements: Vec<PathBuf>,

    /// Where to write the reconciled lots.
    #[arg(short, long)]
    out_file: PathBuf,
}

#[derive(Args)]
struct CheckArgs {
    /// Directory holding X.csv / X_out.csv pairs.
    dir: PathBuf,

    #[command(flatten)]
    rules: RuleArgs,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "washsale=info,wash_engine=info,broker_import=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Wash(args) => {
            let rules = args.rules.resolve();
            tracing::debug!(?rules, "wash rules");
            commands::wash(WashOptions {
                input: args.input,
                output: args.out_file,
                quiet: args.quiet,
                summary_json: args.summary_json,
                rules,
            })
        }
        Commands::Reconcile(args) => {
            commands::reconcile(&args.in1099b, &args.statements, &args.out_file)
        }
        Commands::Check(args) => {
            let failed = commands::check(&args.dir, args.rules.resolve())?;
            if failed > 0 {
                anyhow::bail!("{} test(s) failed", failed);
            }
            Ok(())
        }
    }
}
