//! Technical indicators
//!
//! Pure functions over price slices, oldest first. Each returns `None` when
//! the input is shorter than the lookback it needs - callers turn that into
//! per-ticker error records rather than guessing.
//!
//! Math is done in `f64`; monetary values are converted at the boundary.

/// Simple moving average of the last `period` values.
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let tail = &values[values.len() - period..];
    Some(tail.iter().sum::<f64>() / period as f64)
}

/// Exponential moving average series, seeded with the first value.
/// alpha = 2 / (period + 1).
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    if values.is_empty() || period == 0 {
        return Vec::new();
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = values[0];
    out.push(ema);
    for value in &values[1..] {
        ema = alpha * value + (1.0 - alpha) * ema;
        out.push(ema);
    }
    out
}

/// Latest EMA value.
pub fn ema(values: &[f64], period: usize) -> Option<f64> {
    if values.len() < period {
        return None;
    }
    ema_series(values, period).last().copied()
}

/// Relative Strength Index (Wilder smoothing) over closes.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let delta = closes[i] - closes[i - 1];
        if delta > 0.0 {
            avg_gain += delta;
        } else {
            avg_loss -= delta;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;

    for i in (period + 1)..closes.len() {
        let delta = closes[i] - closes[i - 1];
        let (gain, loss) = if delta > 0.0 {
            (delta, 0.0)
        } else {
            (0.0, -delta)
        };
        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;
    }

    if avg_loss == 0.0 {
        return Some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// MACD(12, 26, 9): returns (macd line, signal line, histogram).
pub fn macd(closes: &[f64]) -> Option<(f64, f64, f64)> {
    if closes.len() < 26 + 9 {
        return None;
    }
    let fast = ema_series(closes, 12);
    let slow = ema_series(closes, 26);
    let line: Vec<f64> = fast.iter().zip(slow.iter()).map(|(f, s)| f - s).collect();
    let signal = ema_series(&line, 9);
    let m = *line.last()?;
    let s = *signal.last()?;
    Some((m, s, m - s))
}

/// Bollinger bands: (lower, middle, upper) with `k` standard deviations.
pub fn bollinger(closes: &[f64], period: usize, k: f64) -> Option<(f64, f64, f64)> {
    if period < 2 || closes.len() < period {
        return None;
    }
    let tail = &closes[closes.len() - period..];
    let mean = tail.iter().sum::<f64>() / period as f64;
    let variance = tail.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / period as f64;
    let std_dev = variance.sqrt();
    Some((mean - k * std_dev, mean, mean + k * std_dev))
}

/// Average True Range over (high, low, close) triples.
pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Option<f64> {
    let n = highs.len().min(lows.len()).min(closes.len());
    if period == 0 || n < period + 1 {
        return None;
    }
    let mut true_ranges = Vec::with_capacity(n - 1);
    for i in 1..n {
        let hl = highs[i] - lows[i];
        let hc = (highs[i] - closes[i - 1]).abs();
        let lc = (lows[i] - closes[i - 1]).abs();
        true_ranges.push(hl.max(hc).max(lc));
    }
    // Wilder smoothing over the true ranges
    let mut atr = true_ranges[..period].iter().sum::<f64>() / period as f64;
    for tr in &true_ranges[period..] {
        atr = (atr * (period as f64 - 1.0) + tr) / period as f64;
    }
    Some(atr)
}

/// Stochastic oscillator: (%K, %D) with the standard 14/3 lookbacks.
pub fn stochastic(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    k_period: usize,
    d_period: usize,
) -> Option<(f64, f64)> {
    let n = highs.len().min(lows.len()).min(closes.len());
    if k_period == 0 || d_period == 0 || n < k_period + d_period - 1 {
        return None;
    }
    let k_at = |end: usize| -> f64 {
        let start = end + 1 - k_period;
        let high = highs[start..=end].iter().cloned().fold(f64::MIN, f64::max);
        let low = lows[start..=end].iter().cloned().fold(f64::MAX, f64::min);
        if high == low {
            50.0
        } else {
            100.0 * (closes[end] - low) / (high - low)
        }
    };
    let k = k_at(n - 1);
    let d = (0..d_period).map(|i| k_at(n - 1 - i)).sum::<f64>() / d_period as f64;
    Some((k, d))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(sma(&values, 5), Some(3.0));
        assert_eq!(sma(&values, 2), Some(4.5));
        assert_eq!(sma(&values, 6), None);
    }

    #[test]
    fn test_ema_converges_toward_latest() {
        let values: Vec<f64> = (0..50).map(|_| 10.0).collect();
        let e = ema(&values, 12).unwrap();
        assert!((e - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let values: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        assert_eq!(rsi(&values, 14), Some(100.0));
    }

    #[test]
    fn test_rsi_flat_needs_history() {
        assert_eq!(rsi(&[1.0, 2.0], 14), None);
    }

    #[test]
    fn test_rsi_mixed_in_range() {
        let values: Vec<f64> = (0..40)
            .map(|i| 100.0 + if i % 2 == 0 { 1.0 } else { -0.5 } * i as f64 * 0.1)
            .collect();
        let r = rsi(&values, 14).unwrap();
        assert!((0.0..=100.0).contains(&r));
    }

    #[test]
    fn test_macd_needs_35_bars() {
        let short: Vec<f64> = (0..30).map(|i| i as f64).collect();
        assert!(macd(&short).is_none());

        let long: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.3).sin()).collect();
        assert!(macd(&long).is_some());
    }

    #[test]
    fn test_bollinger_ordering() {
        let values: Vec<f64> = (0..25).map(|i| 50.0 + (i as f64 * 0.7).sin() * 3.0).collect();
        let (lower, mid, upper) = bollinger(&values, 20, 2.0).unwrap();
        assert!(lower < mid && mid < upper);
    }

    #[test]
    fn test_bollinger_flat_series_collapses() {
        let values = [5.0; 20];
        let (lower, mid, upper) = bollinger(&values, 20, 2.0).unwrap();
        assert_eq!(lower, 5.0);
        assert_eq!(mid, 5.0);
        assert_eq!(upper, 5.0);
    }

    #[test]
    fn test_atr_positive_for_ranging_bars() {
        let highs: Vec<f64> = (0..30).map(|i| 102.0 + (i % 3) as f64).collect();
        let lows: Vec<f64> = (0..30).map(|i| 98.0 - (i % 2) as f64).collect();
        let closes: Vec<f64> = (0..30).map(|_| 100.0).collect();
        let a = atr(&highs, &lows, &closes, 14).unwrap();
        assert!(a > 0.0);
    }

    #[test]
    fn test_stochastic_bounds() {
        let highs: Vec<f64> = (0..30).map(|i| 110.0 + (i as f64).sin()).collect();
        let lows: Vec<f64> = (0..30).map(|i| 90.0 - (i as f64).cos()).collect();
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 0.5).sin() * 5.0).collect();
        let (k, d) = stochastic(&highs, &lows, &closes, 14, 3).unwrap();
        assert!((0.0..=100.0).contains(&k));
        assert!((0.0..=100.0).contains(&d));
    }
}
