use crate::indicators::*;
use chrono::NaiveDate;
use sentiment_core::{Bar, SentimentLabel};
use std::collections::BTreeMap;

fn bar(i: usize, close: f64, volume: u64) -> Bar {
    Bar {
        date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + chrono::Duration::days(i as i64),
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume,
    }
}

fn series(closes: &[f64]) -> Vec<Bar> {
    closes.iter().enumerate().map(|(i, &c)| bar(i, c, 1000)).collect()
}

fn flat(n: usize, price: f64) -> Vec<Bar> {
    series(&vec![price; n])
}

fn alternating(n: usize, a: f64, b: f64) -> Vec<Bar> {
    let closes: Vec<f64> = (0..n).map(|i| if i % 2 == 0 { a } else { b }).collect();
    series(&closes)
}

fn ramp(n: usize, from: f64, to: f64) -> Vec<Bar> {
    let closes: Vec<f64> = (0..n)
        .map(|i| from + (to - from) * i as f64 / (n - 1).max(1) as f64)
        .collect();
    series(&closes)
}

fn universe(members: Vec<Vec<Bar>>) -> BTreeMap<String, Vec<Bar>> {
    members
        .into_iter()
        .enumerate()
        .map(|(i, s)| (format!("SYM{:03}.NS", i), s))
        .collect()
}

// --- Momentum ---

#[test]
fn test_momentum_at_sma_is_neutral() {
    // 125 equal closes: current == SMA125 exactly.
    let ind = momentum(&flat(125, 100.0)).unwrap();
    assert_eq!(ind.value, 50);
    assert_eq!(ind.label, SentimentLabel::Neutral);
}

#[test]
fn test_momentum_insufficient_bars() {
    assert!(momentum(&flat(124, 100.0)).is_none());
}

#[test]
fn test_momentum_strong_rally_saturates() {
    let mut closes = vec![100.0; 124];
    closes.push(200.0);
    let ind = momentum(&series(&closes)).unwrap();
    assert_eq!(ind.value, 100);
    assert_eq!(ind.label, SentimentLabel::ExtremeGreed);
}

#[test]
fn test_momentum_selloff_saturates() {
    let mut closes = vec![100.0; 124];
    closes.push(50.0);
    let ind = momentum(&series(&closes)).unwrap();
    assert_eq!(ind.value, 0);
}

// --- Volume Strength ---

#[test]
fn test_volume_strength_balanced_is_neutral() {
    // Alternating up/down days with identical volume: ratio exactly 1.0.
    let members = (0..12).map(|_| alternating(31, 100.0, 101.0)).collect();
    let ind = volume_strength(&universe(members)).unwrap();
    assert_eq!(ind.value, 50);
}

#[test]
fn test_volume_strength_all_up_days() {
    let members = (0..12).map(|_| ramp(31, 100.0, 130.0)).collect();
    let ind = volume_strength(&universe(members)).unwrap();
    assert_eq!(ind.value, 100);
}

#[test]
fn test_volume_strength_below_symbol_floor() {
    let members = (0..8).map(|_| alternating(31, 100.0, 101.0)).collect();
    assert!(volume_strength(&universe(members)).is_none());
}

#[test]
fn test_volume_strength_ignores_short_series() {
    // 12 symbols but only 9 have the 31 trailing bars.
    let mut members: Vec<Vec<Bar>> = (0..9).map(|_| alternating(31, 100.0, 101.0)).collect();
    members.extend((0..3).map(|_| alternating(10, 100.0, 101.0)));
    assert!(volume_strength(&universe(members)).is_none());
}

// --- Market Breadth ---

#[test]
fn test_breadth_half_above_sma() {
    let mut members: Vec<Vec<Bar>> = (0..6).map(|_| ramp(50, 100.0, 150.0)).collect();
    members.extend((0..6).map(|_| ramp(50, 150.0, 100.0)));
    let ind = market_breadth(&universe(members)).unwrap();
    assert_eq!(ind.value, 50);
}

#[test]
fn test_breadth_all_above() {
    let members = (0..10).map(|_| ramp(50, 100.0, 150.0)).collect();
    let ind = market_breadth(&universe(members)).unwrap();
    assert_eq!(ind.value, 100);
    assert_eq!(ind.label, SentimentLabel::ExtremeGreed);
}

#[test]
fn test_breadth_below_symbol_floor() {
    let members = (0..9).map(|_| ramp(50, 100.0, 150.0)).collect();
    assert!(market_breadth(&universe(members)).is_none());
}

// --- Volatility ---

#[test]
fn test_volatility_steady_regime_is_neutral() {
    // The same oscillation throughout: short and long windows nearly match.
    let ind = volatility(&alternating(260, 100.0, 101.0)).unwrap();
    assert!((45..=55).contains(&ind.value), "value {}", ind.value);
}

#[test]
fn test_volatility_flat_series_degenerate() {
    assert!(volatility(&flat(260, 100.0)).is_none());
}

#[test]
fn test_volatility_insufficient_bars() {
    assert!(volatility(&alternating(59, 100.0, 101.0)).is_none());
}

#[test]
fn test_volatility_spike_reads_as_fear() {
    // Quiet year, violent final month.
    let mut bars = alternating(240, 100.0, 100.1);
    let spike = alternating(20, 100.0, 105.0);
    bars.extend(spike.into_iter().enumerate().map(|(i, mut b)| {
        b.date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap() + chrono::Duration::days(i as i64);
        b
    }));
    let ind = volatility(&bars).unwrap();
    assert!(ind.value < 20, "value {}", ind.value);
}

// --- New Highs vs Lows ---

#[test]
fn test_highs_lows_all_near_high() {
    let members = (0..12).map(|_| ramp(100, 100.0, 200.0)).collect();
    let ind = highs_lows(&universe(members)).unwrap();
    assert_eq!(ind.value, 100);
}

#[test]
fn test_highs_lows_neutral_when_mid_range() {
    // Window spans 50..150 but the last close sits at 100: near neither edge.
    let members = (0..12)
        .map(|_| {
            let mut bars = ramp(99, 50.0, 150.0);
            bars.push(bar(99, 100.0, 1000));
            bars
        })
        .collect();
    let ind = highs_lows(&universe(members)).unwrap();
    assert_eq!(ind.value, 50);
}

#[test]
fn test_highs_lows_below_symbol_floor() {
    let members = (0..9).map(|_| ramp(100, 100.0, 200.0)).collect();
    assert!(highs_lows(&universe(members)).is_none());
}

// --- Small vs Large ---

#[test]
fn test_small_vs_large_equal_returns_neutral() {
    let ind = small_vs_large(&flat(21, 100.0), &flat(21, 500.0)).unwrap();
    assert_eq!(ind.value, 50);
}

#[test]
fn test_small_vs_large_small_cap_rally() {
    let small = ramp(21, 100.0, 110.0); // +10% over 20 sessions
    let ind = small_vs_large(&small, &flat(21, 500.0)).unwrap();
    assert_eq!(ind.value, 100);
}

#[test]
fn test_small_vs_large_insufficient_bars() {
    assert!(small_vs_large(&flat(20, 100.0), &flat(21, 500.0)).is_none());
    assert!(small_vs_large(&flat(21, 100.0), &flat(20, 500.0)).is_none());
}

// --- Safe-Haven Demand ---

#[test]
fn test_safe_haven_flight_to_gold() {
    let gold = ramp(21, 2000.0, 2200.0); // gold +10%, stocks flat
    let ind = safe_haven_demand(&flat(21, 100.0), &gold).unwrap();
    assert_eq!(ind.value, 0);
    assert_eq!(ind.label, SentimentLabel::ExtremeFear);
}

#[test]
fn test_safe_haven_risk_on() {
    let bench = ramp(21, 100.0, 110.0);
    let ind = safe_haven_demand(&bench, &flat(21, 2000.0)).unwrap();
    assert_eq!(ind.value, 100);
}

// --- compute_all ---

#[test]
fn test_compute_all_full_inputs() {
    let benchmark = alternating(260, 100.0, 101.0);
    let small_cap = ramp(30, 100.0, 105.0);
    let gold = flat(30, 2000.0);
    let members = (0..12).map(|_| ramp(120, 100.0, 150.0)).collect();
    let uni = universe(members);

    let slots = compute_all(&MarketData {
        benchmark: Some(&benchmark),
        small_cap: Some(&small_cap),
        safe_haven: Some(&gold),
        universe: &uni,
    });

    assert!(slots.iter().all(|s| s.is_some()), "expected all 7 indicators");
}

#[test]
fn test_compute_all_thin_universe_nulls_breadth_family() {
    // Only 8 usable symbols: the three universe-driven indicators go null,
    // the series-driven four survive.
    let benchmark = alternating(260, 100.0, 101.0);
    let small_cap = ramp(30, 100.0, 105.0);
    let gold = flat(30, 2000.0);
    let members = (0..8).map(|_| ramp(120, 100.0, 150.0)).collect();
    let uni = universe(members);

    let slots = compute_all(&MarketData {
        benchmark: Some(&benchmark),
        small_cap: Some(&small_cap),
        safe_haven: Some(&gold),
        universe: &uni,
    });

    assert!(slots[0].is_some()); // momentum
    assert!(slots[1].is_none()); // volume strength
    assert!(slots[2].is_none()); // breadth
    assert!(slots[3].is_some()); // volatility
    assert!(slots[4].is_none()); // highs/lows
    assert!(slots[5].is_some()); // small vs large
    assert!(slots[6].is_some()); // safe haven
}

#[test]
fn test_compute_all_nothing_available() {
    let uni = universe(vec![]);
    let slots = compute_all(&MarketData {
        benchmark: None,
        small_cap: None,
        safe_haven: None,
        universe: &uni,
    });
    assert!(slots.iter().all(|s| s.is_none()));
}
