/*!
 * Proportional time partitioning for split segments.
 */

/// Convert engine seconds to whole milliseconds, clamping negatives to zero
pub fn seconds_to_ms(seconds: f64) -> u64 {
    if seconds <= 0.0 {
        0
    } else {
        (seconds * 1000.0).round() as u64
    }
}

/// Split `[start_ms, end_ms]` into consecutive spans sized by `weights`.
///
/// Boundaries are rounded to the nearest millisecond and the last span ends
/// exactly at `end_ms`, so spans are contiguous and never overlap. Zero total
/// weight splits evenly.
pub fn partition(start_ms: u64, end_ms: u64, weights: &[usize]) -> Vec<(u64, u64)> {
    if weights.is_empty() {
        return Vec::new();
    }

    let end_ms = end_ms.max(start_ms);
    let duration = u128::from(end_ms - start_ms);

    let even = weights.iter().all(|w| *w == 0);
    let weight_of = |w: usize| -> u128 { if even { 1 } else { w as u128 } };
    let total: u128 = weights.iter().map(|w| weight_of(*w)).sum();

    let mut spans = Vec::with_capacity(weights.len());
    let mut cumulative: u128 = 0;
    let mut span_start = start_ms;

    for (i, weight) in weights.iter().enumerate() {
        cumulative += weight_of(*weight);
        let span_end = if i + 1 == weights.len() {
            end_ms
        } else {
            // Round half up
            let offset = (duration * cumulative * 2 + total) / (total * 2);
            start_ms + offset as u64
        };
        spans.push((span_start, span_end));
        span_start = span_end;
    }

    spans
}
