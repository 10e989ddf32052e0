// src/processing/stats.rs

/// Mean of the finite values, accumulated in f64. `None` when there are none.
pub fn nan_mean(values: &[f32]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0f64, 0usize), |(sum, count), &v| (sum + v as f64, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Round to `decimals` places, as stored in the persisted series.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
