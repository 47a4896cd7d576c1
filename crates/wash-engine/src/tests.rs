use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::engine::{WashEngine, WashReport};
use crate::ledger::Ledger;
use crate::lot::{Lot, LotId};
use crate::progress::{NullReporter, ProgressReporter};
use crate::rules::WashRules;
use crate::summary::LotTotals;

/// Helper: a date in 2024.
fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

/// Helper: a pure purchase.
fn buy(count: u32, on: NaiveDate, basis: Decimal, position: &str) -> Lot {
    Lot::buy(count, "XYZ", "Xyz Corp", on, basis).with_form_position(position)
}

/// Helper: a purchase later sold.
fn sold(
    count: u32,
    bought: NaiveDate,
    basis: Decimal,
    on: NaiveDate,
    proceeds: Decimal,
    position: &str,
) -> Lot {
    buy(count, bought, basis, position).with_sale(on, proceeds)
}

fn run(lots: Vec<Lot>) -> WashReport {
    WashEngine::default().run(lots, &mut NullReporter).unwrap()
}

fn find<'a>(lots: &'a [Lot], position: &str) -> &'a Lot {
    lots.iter()
        .find(|l| l.form_position == position)
        .unwrap_or_else(|| panic!("no lot at {}", position))
}

/// Shares, net basis and proceeds all survive a run.
fn assert_conserved(input: &[Lot], output: &[Lot]) {
    let before = LotTotals::from_lots(input).unwrap();
    let after = LotTotals::from_lots(output).unwrap();
    assert_eq!(before.shares, after.shares);
    assert_eq!(before.proceeds, after.proceeds);
    assert_eq!(before.net_basis(), after.net_basis());
}

/// Records every checkpoint message.
#[derive(Default)]
struct RecordingReporter {
    messages: Vec<String>,
    highlighted: Vec<usize>,
}

impl ProgressReporter for RecordingReporter {
    fn report(&mut self, _ledger: &Ledger, _lots: &[LotId], message: &str, highlighted: &[LotId]) {
        self.messages.push(message.to_string());
        self.highlighted.push(highlighted.len());
    }
}

#[test]
fn test_single_full_wash() {
    let input = vec![
        sold(100, date(1, 1), dec!(1000), date(3, 1), dec!(800), "loss"),
        buy(100, date(2, 20), dec!(900), "buy"),
    ];
    let report = run(input.clone());
    let lots = &report.lots;

    assert_eq!(lots.len(), 2);
    assert_eq!(lots[0].form_position, "loss");
    assert_eq!(lots[0].code, Some('W'));
    assert_eq!(lots[0].adjustment, Some(dec!(200)));

    let replacement = &lots[1];
    assert_eq!(replacement.basis, dec!(1100));
    // Held 60 days before the loss sale, so the replacement starts 60 days earlier.
    assert_eq!(replacement.buydate, NaiveDate::from_ymd_opt(2023, 12, 22).unwrap());
    assert!(replacement.is_replacement);

    assert_eq!(report.adjustments.len(), 1);
    assert_eq!(report.adjustments[0].disallowed_loss, dec!(200));
    assert_eq!(report.adjustments[0].holding_shift_days, 60);
    assert_conserved(&input, lots);
}

#[test]
fn test_loss_larger_than_replacement_splits_loss() {
    let input = vec![
        sold(100, date(1, 1), dec!(1000), date(3, 1), dec!(800), ""),
        buy(60, date(3, 5), dec!(540), "b"),
    ];
    let report = run(input.clone());
    let lots = &report.lots;
    assert_eq!(lots.len(), 3);

    let washed = &lots[0];
    assert_eq!(washed.form_position, ".1");
    assert_eq!(washed.count, 60);
    assert_eq!(washed.basis, dec!(600));
    assert_eq!(washed.proceeds(), Some(dec!(480)));
    assert_eq!(washed.code, Some('W'));
    assert_eq!(washed.adjustment, Some(dec!(120)));

    let realized = &lots[1];
    assert_eq!(realized.form_position, ".2");
    assert_eq!(realized.count, 40);
    assert_eq!(realized.basis, dec!(400));
    assert_eq!(realized.proceeds(), Some(dec!(320)));
    assert_eq!(realized.code, None);
    assert_eq!(realized.adjustment, None);

    assert_eq!(washed.basis + realized.basis, dec!(1000));
    assert_eq!(lots[2].basis, dec!(660));
    assert_eq!(lots[2].buydate, date(1, 5));
    assert_conserved(&input, lots);
}

#[test]
fn test_replacement_larger_than_loss_splits_buy() {
    let input = vec![
        sold(100, date(1, 1), dec!(1000), date(3, 1), dec!(800), "loss"),
        buy(150, date(3, 5), dec!(1500), "b"),
    ];
    let report = run(input.clone());
    let lots = &report.lots;
    assert_eq!(lots.len(), 3);

    let paired = find(lots, "b.1");
    assert_eq!(paired.count, 100);
    assert_eq!(paired.basis, dec!(1200));
    assert!(paired.is_replacement);

    let rest = find(lots, "b.2");
    assert_eq!(rest.count, 50);
    assert_eq!(rest.basis, dec!(500));
    assert_eq!(rest.buydate, date(3, 5));
    assert!(!rest.is_replacement);
    assert_conserved(&input, lots);
}

#[test]
fn test_unwashable_loss_passes_through() {
    let loss = sold(10, date(1, 1), dec!(100), date(3, 1), dec!(50), "loss");
    let gain = sold(10, date(1, 1), dec!(100), date(2, 1), dec!(150), "gain");
    let far = buy(10, date(4, 1), dec!(90), "far"); // 31 days after
    let report = run(vec![far.clone(), loss.clone(), gain.clone()]);

    assert!(report.adjustments.is_empty());
    let expected = [gain, loss, far];
    assert_eq!(report.lots.len(), expected.len());
    for (got, want) in report.lots.iter().zip(&expected) {
        assert!(got.same_record(want), "{} != {}", got, want);
        assert!(!got.is_replacement);
    }
}

#[test]
fn test_same_day_losses_share_replacements() {
    let input = vec![
        sold(50, date(1, 15), dec!(500), date(3, 1), dec!(400), "l2"),
        sold(50, date(1, 1), dec!(500), date(3, 1), dec!(450), "l1"),
        buy(80, date(3, 10), dec!(800), "b"),
    ];
    let report = run(input.clone());
    let lots = &report.lots;

    // l1 (earliest acquisition) pairs with 50 of the 80 new shares, then l2
    // pairs 30 of its shares with the other 30.
    assert_eq!(report.adjustments.len(), 2);
    assert_eq!(find(lots, "l1").adjustment, Some(dec!(50)));
    assert_eq!(find(lots, "b.1").basis, dec!(550));

    let l2_washed = find(lots, "l2.1");
    assert_eq!(l2_washed.count, 30);
    assert_eq!(l2_washed.adjustment, Some(dec!(60)));
    assert_eq!(find(lots, "b.2").basis, dec!(360));

    let l2_rest = find(lots, "l2.2");
    assert_eq!(l2_rest.count, 20);
    assert_eq!(l2_rest.code, None);
    assert_eq!(l2_rest.basis, dec!(200));
    assert_eq!(l2_rest.proceeds(), Some(dec!(160)));

    assert_eq!(lots.len(), 5);
    assert_conserved(&input, lots);
}

#[test]
fn test_earliest_replacement_used_first() {
    let report = run(vec![
        sold(10, date(1, 1), dec!(100), date(3, 1), dec!(80), "loss"),
        buy(10, date(3, 10), dec!(100), "later"),
        buy(10, date(2, 20), dec!(100), "earlier"),
    ]);
    assert!(find(&report.lots, "earlier").is_replacement);
    assert_eq!(find(&report.lots, "earlier").basis, dec!(120));
    assert!(!find(&report.lots, "later").is_replacement);
    assert_eq!(find(&report.lots, "later").basis, dec!(100));
}

#[test]
fn test_replacement_sold_at_loss_chains() {
    let input = vec![
        sold(100, date(1, 1), dec!(1000), date(2, 1), dec!(800), "a"),
        sold(100, date(2, 10), dec!(900), date(3, 1), dec!(700), "b"),
        buy(100, date(3, 15), dec!(800), "c"),
    ];
    let report = run(input.clone());
    let lots = &report.lots;

    let b = find(lots, "b");
    assert_eq!(b.basis, dec!(1100));
    assert_eq!(b.buydate, date(1, 10));
    assert_eq!(b.adjustment, Some(dec!(400)));

    let c = find(lots, "c");
    assert_eq!(c.basis, dec!(1200));
    assert_eq!(c.buydate, date(1, 24));
    assert_eq!(c.lineage.origins().count(), 3);

    assert_eq!(report.total_disallowed(), dec!(600));
    assert_conserved(&input, lots);
}

#[test]
fn test_replacement_not_reused() {
    // One replacement, two losses on different days: only the first washes.
    let report = run(vec![
        sold(10, date(1, 1), dec!(100), date(3, 1), dec!(80), "first"),
        sold(10, date(1, 1), dec!(100), date(3, 5), dec!(80), "second"),
        buy(10, date(3, 3), dec!(100), "b"),
    ]);
    assert_eq!(report.adjustments.len(), 1);
    assert_eq!(find(&report.lots, "first").code, Some('W'));
    assert_eq!(find(&report.lots, "second").code, None);
    assert_eq!(find(&report.lots, "b").basis, dec!(120));
}

#[test]
fn test_symbol_rule() {
    let mut other = buy(10, date(3, 3), dec!(100), "other");
    other.symbol = "ABC".to_string();
    let lots = vec![sold(10, date(1, 1), dec!(100), date(3, 1), dec!(80), "loss"), other];

    let strict = WashEngine::new(WashRules {
        same_symbol_only: true,
        ..WashRules::us()
    });
    assert!(strict.run(lots.clone(), &mut NullReporter).unwrap().adjustments.is_empty());
    assert_eq!(run(lots).adjustments.len(), 1);
}

#[test]
fn test_symbol_rule_keeps_same_day_losses_apart() {
    let mut abc_loss = sold(10, date(1, 1), dec!(100), date(3, 1), dec!(80), "abc-loss");
    abc_loss.symbol = "ABC".to_string();
    let xyz_loss = sold(10, date(1, 2), dec!(100), date(3, 1), dec!(70), "xyz-loss");
    let mut abc_buy = buy(20, date(3, 5), dec!(200), "abc-buy");
    abc_buy.symbol = "ABC".to_string();

    let strict = WashEngine::new(WashRules {
        same_symbol_only: true,
        ..WashRules::us()
    });
    let report = strict
        .run(vec![abc_loss, xyz_loss, abc_buy], &mut NullReporter)
        .unwrap();

    assert_eq!(report.adjustments.len(), 1);
    assert_eq!(report.adjustments[0].symbol, "ABC");
    assert_eq!(report.adjustments[0].replacement_position, "abc-buy.1");

    let xyz = find(&report.lots, "xyz-loss");
    assert_eq!(xyz.code, None);
    assert_eq!(xyz.adjustment, None);
    assert_eq!(find(&report.lots, "abc-buy.1").basis, dec!(120));
    let spare = find(&report.lots, "abc-buy.2");
    assert_eq!(spare.basis, dec!(100));
    assert!(!spare.is_replacement);
}

#[test]
fn test_recorded_adjustment_is_not_rewashed() {
    let mut washed = sold(100, date(1, 1), dec!(1000), date(3, 1), dec!(800), "loss");
    washed.code = Some('W');
    washed.adjustment = Some(dec!(200));
    let input = vec![washed, buy(100, date(3, 5), dec!(900), "b")];

    let report = run(input.clone());
    assert!(report.adjustments.is_empty());
    for lot in &input {
        assert!(find(&report.lots, &lot.form_position).same_record(lot));
    }
    assert!(!find(&report.lots, "b").is_replacement);
}

#[test]
fn test_rerun_is_idempotent() {
    let input = vec![
        sold(100, date(1, 1), dec!(1000), date(3, 1), dec!(800), "a"),
        buy(150, date(3, 5), dec!(1500), "b"),
        sold(30, date(2, 1), dec!(300), date(4, 1), dec!(200), "c"),
        buy(10, date(4, 15), dec!(100), "d"),
    ];
    let first = run(input);
    let second = run(first.lots.clone());

    assert!(second.adjustments.is_empty());
    assert_eq!(second.lots.len(), first.lots.len());
    for (a, b) in first.lots.iter().zip(&second.lots) {
        assert!(a.same_record(b), "{} != {}", a, b);
    }
}

#[test]
fn test_output_sorted_by_sell_date() {
    let report = run(vec![
        buy(10, date(1, 20), dec!(100), "buy"),
        sold(10, date(1, 1), dec!(100), date(3, 1), dec!(120), "late"),
        sold(10, date(1, 1), dec!(100), date(2, 1), dec!(80), "early"),
    ]);
    let order: Vec<_> = report.lots.iter().map(|l| l.form_position.as_str()).collect();
    assert_eq!(order, vec!["early", "late", "buy"]);
}

#[test]
fn test_reporter_checkpoints() {
    let mut reporter = RecordingReporter::default();
    WashEngine::default()
        .run(
            vec![
                sold(100, date(1, 1), dec!(1000), date(3, 1), dec!(800), "loss"),
                buy(150, date(2, 20), dec!(1350), "buy"),
            ],
            &mut reporter,
        )
        .unwrap();

    assert_eq!(
        reporter.messages,
        vec![
            "Found the following losses",
            "Here are the replacements",
            "Splitting buy",
            "into these",
            "pairing these",
            "pair complete",
        ]
    );
    assert_eq!(reporter.highlighted, vec![1, 1, 1, 2, 2, 1]);
}
