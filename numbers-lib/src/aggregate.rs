use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AggregateError {
    #[error("average of an empty window is undefined")]
    EmptyWindow,
}

/// Arithmetic mean of the window rounded to two decimals.
///
/// Rounding is half away from zero (`f64::round`).
pub fn average(window: &[i64]) -> Result<f64, AggregateError> {
    if window.is_empty() {
        return Err(AggregateError::EmptyWindow);
    }
    let sum: i128 = window.iter().map(|&n| n as i128).sum();
    Ok(round2(sum as f64 / window.len() as f64))
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
