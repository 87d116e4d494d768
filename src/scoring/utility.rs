/// Computes the arithmetic mean of a slice of values. Returns `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Computes the population standard deviation. Returns 0.0 for empty input.
pub fn population_stddev(values: &[f64]) -> f64 {
    let Some(mean) = mean(values) else {
        return 0.0;
    };
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}
