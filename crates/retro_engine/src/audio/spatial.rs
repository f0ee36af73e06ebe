//! Distance attenuation

/// Linear falloff: full gain at the listener, silent at `max_distance`
/// and beyond. A non-positive `max_distance` is always silent.
#[must_use]
pub fn linear_attenuation(distance: f32, max_distance: f32) -> f32 {
    if max_distance <= 0.0 || !distance.is_finite() {
        return 0.0;
    }
    (1.0 - distance / max_distance).clamp(0.0, 1.0)
}
