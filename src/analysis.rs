//! Tabular reductions over a market snapshot
//!
//! Rows missing the value being reduced are skipped. Ordering is stable, so
//! ties keep the upstream order and the first occurrence wins.

use crate::{
    constants::TOP_N,
    types::{ChangeEntry, CoinSnapshot, MarketCapEntry, MarketSummary},
};
use std::cmp::Ordering;

/// Returns up to `n` rows with the largest `key`, descending
pub fn largest_by<F>(rows: &[CoinSnapshot], n: usize, key: F) -> Vec<&CoinSnapshot>
where
    F: Fn(&CoinSnapshot) -> Option<f64>,
{
    ranked(rows, n, key, |a, b| b.total_cmp(&a))
}

/// Returns up to `n` rows with the smallest `key`, ascending
pub fn smallest_by<F>(rows: &[CoinSnapshot], n: usize, key: F) -> Vec<&CoinSnapshot>
where
    F: Fn(&CoinSnapshot) -> Option<f64>,
{
    ranked(rows, n, key, |a, b| a.total_cmp(&b))
}

fn ranked<F, C>(rows: &[CoinSnapshot], n: usize, key: F, cmp: C) -> Vec<&CoinSnapshot>
where
    F: Fn(&CoinSnapshot) -> Option<f64>,
    C: Fn(f64, f64) -> Ordering,
{
    let mut keyed: Vec<(f64, &CoinSnapshot)> = rows
        .iter()
        .filter_map(|row| key(row).filter(|v| !v.is_nan()).map(|v| (v + 0.0, row)))
        .collect();

    // sort_by is stable; `+ 0.0` above folds -0.0 into 0.0 so they tie
    keyed.sort_by(|(a, _), (b, _)| cmp(*a, *b));
    keyed.into_iter().take(n).map(|(_, row)| row).collect()
}

/// Top `n` coins by market cap
pub fn top_by_market_cap(rows: &[CoinSnapshot], n: usize) -> Vec<MarketCapEntry> {
    largest_by(rows, n, |row| row.market_cap)
        .into_iter()
        .filter_map(|row| {
            row.market_cap.map(|market_cap| MarketCapEntry {
                name: row.name.clone(),
                symbol: row.symbol.clone(),
                market_cap,
            })
        })
        .collect()
}

/// Arithmetic mean of `current_price`
pub fn average_price(rows: &[CoinSnapshot]) -> Option<f64> {
    let prices: Vec<f64> = rows
        .iter()
        .filter_map(|row| row.current_price)
        .filter(|p| !p.is_nan())
        .collect();

    if prices.is_empty() {
        return None;
    }

    Some(prices.iter().sum::<f64>() / prices.len() as f64)
}

/// Row with the highest 24h change
pub fn highest_change(rows: &[CoinSnapshot]) -> Option<ChangeEntry> {
    largest_by(rows, 1, |row| row.price_change_percentage_24h)
        .first()
        .and_then(|row| change_entry(row))
}

/// Row with the lowest 24h change
pub fn lowest_change(rows: &[CoinSnapshot]) -> Option<ChangeEntry> {
    smallest_by(rows, 1, |row| row.price_change_percentage_24h)
        .first()
        .and_then(|row| change_entry(row))
}

fn change_entry(row: &CoinSnapshot) -> Option<ChangeEntry> {
    row.price_change_percentage_24h.map(|change| ChangeEntry {
        name: row.name.clone(),
        symbol: row.symbol.clone(),
        price_change_percentage_24h: change,
    })
}

/// Computes every statistic shown on the dashboard
pub fn summarize(rows: &[CoinSnapshot]) -> MarketSummary {
    MarketSummary {
        top_by_market_cap: top_by_market_cap(rows, TOP_N),
        average_price: average_price(rows),
        highest_change: highest_change(rows),
        lowest_change: lowest_change(rows),
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{coin, sample_rows};
    use super::*;

    #[test]
    fn test_top_five_sorted_descending() {
        let mut rows = sample_rows();
        rows.reverse();

        let top = top_by_market_cap(&rows, 5);
        assert_eq!(top.len(), 5);
        let names: Vec<&str> = top.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Bitcoin", "Ethereum", "Tether", "BNB", "Solana"]);
        assert!(top.windows(2).all(|w| w[0].market_cap >= w[1].market_cap));
    }

    #[test]
    fn test_top_five_with_fewer_rows() {
        let rows = sample_rows()[..3].to_vec();
        assert_eq!(top_by_market_cap(&rows, 5).len(), 3);
        assert!(top_by_market_cap(&[], 5).is_empty());
    }

    #[test]
    fn test_top_skips_missing_market_cap() {
        let mut rows = sample_rows();
        rows[0].market_cap = None;
        let top = top_by_market_cap(&rows, 5);
        assert_eq!(top[0].name, "Ethereum");
        assert!(top.iter().all(|e| e.name != "Bitcoin"));
    }

    #[test]
    fn test_ties_keep_input_order() {
        let rows = vec![
            coin("First", 1.0, 100.0, 5.0),
            coin("Second", 1.0, 100.0, 5.0),
            coin("Third", 1.0, 50.0, -5.0),
            coin("Fourth", 1.0, 50.0, -5.0),
        ];

        let top = top_by_market_cap(&rows, 2);
        assert_eq!(top[0].name, "First");
        assert_eq!(top[1].name, "Second");

        assert_eq!(highest_change(&rows).unwrap().name, "First");
        assert_eq!(lowest_change(&rows).unwrap().name, "Third");
    }

    #[test]
    fn test_signed_zero_changes_tie() {
        let rows = vec![coin("A", 1.0, 100.0, 0.0), coin("B", 1.0, 50.0, -0.0)];
        assert_eq!(lowest_change(&rows).unwrap().name, "A");
        assert_eq!(highest_change(&rows).unwrap().name, "A");

        let rows = vec![coin("A", 1.0, 100.0, -0.0), coin("B", 1.0, 50.0, 0.0)];
        assert_eq!(highest_change(&rows).unwrap().name, "A");
    }

    #[test]
    fn test_average_price() {
        let rows = sample_rows();
        let expected = rows.iter().map(|r| r.current_price.unwrap()).sum::<f64>() / rows.len() as f64;
        let avg = average_price(&rows).unwrap();
        assert!((avg - expected).abs() < 1e-9);
    }

    #[test]
    fn test_average_price_ignores_missing() {
        let mut rows = vec![coin("A", 10.0, 1.0, 0.0), coin("B", 20.0, 1.0, 0.0)];
        rows.push(CoinSnapshot {
            current_price: None,
            ..coin("C", 0.0, 1.0, 0.0)
        });
        assert_eq!(average_price(&rows), Some(15.0));
        assert_eq!(average_price(&[]), None);
    }

    #[test]
    fn test_highest_and_lowest_change() {
        let rows = sample_rows();
        let highest = highest_change(&rows).unwrap();
        let lowest = lowest_change(&rows).unwrap();

        assert_eq!(highest.name, "BNB");
        assert_eq!(highest.price_change_percentage_24h, 3.2);
        assert_eq!(lowest.name, "Solana");
        assert_eq!(lowest.price_change_percentage_24h, -4.1);

        let max = rows
            .iter()
            .filter_map(|r| r.price_change_percentage_24h)
            .fold(f64::MIN, f64::max);
        assert_eq!(highest.price_change_percentage_24h, max);
    }

    #[test]
    fn test_smallest_by_orders_ascending() {
        let rows = sample_rows();
        let bottom = smallest_by(&rows, 2, |r| r.current_price);
        assert_eq!(bottom.len(), 2);
        assert_eq!(bottom[0].name, "XRP");
        assert_eq!(bottom[1].name, "Tether");
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[]);
        assert!(summary.top_by_market_cap.is_empty());
        assert_eq!(summary.average_price, None);
        assert_eq!(summary.highest_change, None);
        assert_eq!(summary.lowest_change, None);
    }
}
