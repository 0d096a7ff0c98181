/// Min-max scales `value` into `[0, 1]`. A degenerate range maps to 1.0.
pub fn normalize_value(value: f64, min: f64, max: f64) -> f64 {
    if min == max {
        return 1.0;
    }
    let scaled = (value - min) / (max - min);
    if scaled.is_finite() {
        return scaled;
    }
    // The span overflows when min and max sit at opposite ends of f64.
    (value / 2.0 - min / 2.0) / (max / 2.0 - min / 2.0)
}

/// Percentage change between two price targets.
///
/// A zero starting target has no meaningful ratio; the absolute change is
/// used instead. The same fallback applies when the ratio overflows, as it
/// does for subnormal starting targets, so batch ranges stay finite.
pub fn percentage_change(target_from: f64, target_to: f64) -> f64 {
    let diff = target_to - target_from;
    if target_from == 0.0 {
        return diff;
    }
    let percent = diff / target_from * 100.0;
    if percent.is_finite() { percent } else { diff }
}

pub fn absolute_change(target_from: f64, target_to: f64) -> f64 {
    target_to - target_from
}

/// Lowercases and collapses whitespace so brokerage spellings group together.
pub fn brokerage_key(brokerage: &str) -> String {
    brokerage
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
