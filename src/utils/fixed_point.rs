// src/utils/fixed_point.rs
pub const NODATA_INT: i16 = -10000;
pub const NODATA_FLOAT: f32 = -999.0;

/// Index values in [-1, 1] to int16 scaled by `scale_factor`; NaN becomes nodata.
pub fn to_fixed_point(data: &[f32], scale_factor: i32) -> Vec<i16> {
    data.iter()
        .map(|&value| {
            if value.is_nan() {
                NODATA_INT
            } else {
                // Clamp to avoid overflow and scale
                let clamped = value.max(-0.9999).min(0.9999);
                (clamped * scale_factor as f32).round() as i16
            }
        })
        .collect()
}
