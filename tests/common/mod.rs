#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use stockcast::domain::market::{Bar, PriceSeries};

pub fn day(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() + Duration::days(i as i64)
}

pub fn series(ticker: &str, prices: &[f64]) -> PriceSeries {
    let bars = prices
        .iter()
        .enumerate()
        .map(|(i, &p)| Bar::flat(day(i), p, 1_000_000.0))
        .collect();
    PriceSeries::new(ticker, bars).unwrap()
}

/// Deterministic pseudo-random walk (LCG), floored at 10.
pub fn random_walk(n: usize, seed: u64) -> Vec<f64> {
    let mut price = 100.0;
    (0..n)
        .map(|i| {
            let s = (i as u64 ^ seed)
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let change = ((s >> 33) % 200) as f64 / 100.0 - 1.0; // -1.0 to +0.99
            price = (price + change).max(10.0);
            price
        })
        .collect()
}

/// Declines for 90 bars, then climbs steadily.
pub fn v_shape(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            if i < 90 {
                130.0 - 0.3 * i as f64
            } else {
                103.0 + (i - 90) as f64 * 1.5
            }
        })
        .collect()
}
