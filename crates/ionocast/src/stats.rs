//! Small statistical kernel: the cumulative standard normal used by every
//! exceedance probability in the predictor, and the quadrature combination
//! of decile deviations.

use std::f64::consts::SQRT_2;

/// Error function by the Abramowitz & Stegun 7.1.26 rational approximation,
/// absolute error below 1.5e-7 over the whole line.
fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t * (-x * x).exp();
    sign * y
}

/// Cumulative standard normal distribution.
pub fn cumulative_normal(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / SQRT_2))
}

/// Probability that a standard normal exceeds `z`, clamped into [0, 1].
pub fn exceedance_probability(z: f64) -> f64 {
    (1.0 - cumulative_normal(z)).clamp(0.0, 1.0)
}

/// Root-sum-square combination of two independent decile deviations.
pub fn rss(a: f64, b: f64) -> f64 {
    (a * a + b * b).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::Z_DECILE;

    #[test]
    fn phi_at_zero_is_half() {
        assert!((cumulative_normal(0.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn phi_at_the_decile_point_is_ninety_percent() {
        assert!((cumulative_normal(Z_DECILE) - 0.9).abs() < 1e-6);
        assert!((cumulative_normal(-Z_DECILE) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn exceedance_is_strictly_decreasing_and_bounded() {
        let mut prev = exceedance_probability(-6.0);
        for i in -59..=60 {
            let p = exceedance_probability(i as f64 / 10.0);
            assert!(p <= prev, "exceedance rose at z = {}", i as f64 / 10.0);
            assert!((0.0..=1.0).contains(&p));
            prev = p;
        }
    }

    #[test]
    fn deep_tails_saturate() {
        assert!(exceedance_probability(8.0) < 1e-12);
        assert!(exceedance_probability(-8.0) > 1.0 - 1e-12);
    }

    #[test]
    fn rss_is_pythagorean() {
        assert!((rss(3.0, 4.0) - 5.0).abs() < 1e-12);
        assert_eq!(rss(0.0, 7.0), 7.0);
    }
}
