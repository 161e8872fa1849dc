//! # Utility Module
//!
//! Small numeric helpers shared by the BSP builder.

/// Returns `value` unless it lies within `epsilon` of `target`, in which case
/// `target` is returned.
///
/// # Examples
///
/// ```
/// use rust_bsp::utils::util::snap;
///
/// assert_eq!(snap(0.9999, 1.0, 1e-3), 1.0);
/// assert_eq!(snap(0.5, 1.0, 1e-3), 0.5);
/// ```
pub fn snap(value: f64, target: f64, epsilon: f64) -> f64 {
    if (value - target).abs() <= epsilon {
        target
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_within_epsilon() {
        assert_eq!(snap(0.9999, 1.0, 1e-3), 1.0);
        assert_eq!(snap(-1e-9, 0.0, 1e-6), 0.0);
    }

    #[test]
    fn test_snap_outside_epsilon() {
        assert_eq!(snap(0.5, 1.0, 1e-3), 0.5);
        assert_eq!(snap(1.01, 1.0, 1e-3), 1.01);
    }
}
