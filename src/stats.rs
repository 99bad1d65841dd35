//! Numeric primitives shared by the scoring and preprocessing paths.
//!
//! Plain free functions, no shared state.

/// ln(2π), the normalization constant of the Normal log-density.
const LN_2PI: f64 = 1.837_877_066_409_345_5;

/// Clamp `x` into `[lo, hi]`.  NaN propagates.
pub fn clip(x: f64, lo: f64, hi: f64) -> f64 {
    x.clamp(lo, hi)
}

/// Clamp `x` from below.  NaN propagates.
pub fn clip_min(x: f64, lo: f64) -> f64 {
    if x < lo { lo } else { x }
}

/// Log-density of `Normal(loc, scale)` evaluated at `x`:
/// `-ln(scale) - ln(2π)/2 - (x - loc)²/(2·scale²)`.
pub fn normal_logpdf(x: f64, loc: f64, scale: f64) -> f64 {
    let z = (x - loc) / scale;
    -scale.ln() - 0.5 * LN_2PI - 0.5 * z * z
}

/// Arithmetic mean of an `f32` slice, accumulated in `f64`.
/// An empty slice yields NaN.
pub fn mean(values: &[f32]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = values.iter().map(|&v| v as f64).sum();
    sum / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_normal_logpdf_at_zero() {
        // -ln(sqrt(2π))
        let expected = -0.918_938_533_204_672_7;
        assert!((normal_logpdf(0.0, 0.0, 1.0) - expected).abs() < 1e-15);
    }

    #[test]
    fn logpdf_matches_closed_form() {
        let (x, loc, scale): (f64, f64, f64) = (1.3, 0.7, 2.5);
        let expected = -(scale.ln()) - 0.5 * (2.0 * std::f64::consts::PI).ln()
            - (x - loc) * (x - loc) / (2.0 * scale * scale);
        assert!((normal_logpdf(x, loc, scale) - expected).abs() < 1e-15);
    }

    #[test]
    fn clip_bounds_and_nan() {
        assert_eq!(clip(1.5, 0.0, 1.0), 1.0);
        assert_eq!(clip(-0.2, 0.0, 1.0), 0.0);
        assert_eq!(clip(0.4, 0.0, 1.0), 0.4);
        assert!(clip(f64::NAN, 0.0, 1.0).is_nan());
    }

    #[test]
    fn clip_min_floors_small_sigmas() {
        assert_eq!(clip_min(0.0, 1e-15), 1e-15);
        assert_eq!(clip_min(-4.0, 1e-15), 1e-15);
        assert_eq!(clip_min(0.3, 1e-15), 0.3);
        assert!(clip_min(f64::NAN, 1e-15).is_nan());
    }

    #[test]
    fn mean_accumulates_in_f64() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
        assert!(mean(&[]).is_nan());
    }
}
