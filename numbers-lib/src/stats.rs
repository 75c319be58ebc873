//! Descriptive statistics for price series.
//!
//! Variances use Bessel's correction. Two series are paired by index over
//! the shorter one. Undefined results (too few samples, zero spread) come
//! back as `None` instead of NaN.

use crate::stocks::PriceSeries;
use std::fmt::{Display, Formatter};

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Mean after each sample, `out[i] == mean(values[..=i])`.
pub fn running_mean(values: &[f64]) -> Vec<f64> {
    let mut sum = 0.0;
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            sum += v;
            sum / (i + 1) as f64
        })
        .collect()
}

pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some(squares / (values.len() - 1) as f64)
}

pub fn std_dev(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

fn paired<'a>(a: &'a [f64], b: &'a [f64]) -> (&'a [f64], &'a [f64]) {
    let n = a.len().min(b.len());
    (&a[..n], &b[..n])
}

pub fn covariance(a: &[f64], b: &[f64]) -> Option<f64> {
    let (a, b) = paired(a, b);
    if a.len() < 2 {
        return None;
    }
    let mean_a = mean(a)?;
    let mean_b = mean(b)?;
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum();
    Some(sum / (a.len() - 1) as f64)
}

/// Pearson correlation coefficient, clamped to `[-1, 1]`.
pub fn correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    let (a, b) = paired(a, b);
    let covariance = covariance(a, b)?;
    let spread = std_dev(a)? * std_dev(b)?;
    if spread == 0.0 || !spread.is_finite() {
        return None;
    }
    Some((covariance / spread).clamp(-1.0, 1.0))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
}

impl SeriesStats {
    pub fn of(values: &[f64]) -> Self {
        Self {
            mean: mean(values),
            std_dev: std_dev(values),
        }
    }
}

/// Pairwise correlations of a set of tickers, row and column order equal to
/// `tickers`.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub tickers: Vec<String>,
    pub stats: Vec<SeriesStats>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn compute(series: &[PriceSeries]) -> Self {
        let prices: Vec<Vec<f64>> = series.iter().map(PriceSeries::prices).collect();
        // the diagonal goes through the general formula too
        let values = prices
            .iter()
            .map(|row| prices.iter().map(|col| correlation(row, col)).collect())
            .collect();
        Self {
            tickers: series.iter().map(|s| s.ticker.clone()).collect(),
            stats: prices.iter().map(|p| SeriesStats::of(p)).collect(),
            values,
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row)?.get(col).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

/// Heatmap cell colour: blue for positive correlation, red otherwise, paler
/// as the correlation approaches zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HslColor {
    pub hue: u16,
    pub saturation: f64,
    pub lightness: f64,
}

pub fn heat_color(correlation: f64) -> HslColor {
    let intensity = correlation.abs().min(1.0);
    HslColor {
        hue: if correlation > 0.0 { 200 } else { 0 },
        saturation: 100.0,
        lightness: 100.0 - intensity * 50.0,
    }
}

impl HslColor {
    /// Approximate sRGB, for terminals that cannot render HSL.
    pub fn to_rgb(self) -> (u8, u8, u8) {
        let s = self.saturation / 100.0;
        let l = self.lightness / 100.0;
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let h = self.hue as f64 / 60.0;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        (channel(r), channel(g), channel(b))
    }
}

impl Display for HslColor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "hsl({}, {}%, {}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}
