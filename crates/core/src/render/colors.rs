//! Sequential color scale for node importance.
//!
//! White-to-dark-red ramp (the classic 9-class "Reds" scheme), sampled by
//! linear interpolation between stops.

use plotters::style::RGBColor;

const REDS: [(u8, u8, u8); 9] = [
    (255, 245, 240),
    (254, 224, 210),
    (252, 187, 161),
    (252, 146, 114),
    (251, 106, 74),
    (239, 59, 44),
    (203, 24, 29),
    (165, 15, 21),
    (103, 0, 13),
];

pub const EDGE_GRAY: RGBColor = RGBColor(128, 128, 128);
pub const PANEL_WHEAT: RGBColor = RGBColor(245, 222, 179);

/// Color at position `t` in `[0, 1]` (clamped)
pub fn reds(t: f64) -> RGBColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (REDS.len() - 1) as f64;
    let lo = (scaled.floor() as usize).min(REDS.len() - 2);
    let frac = scaled - lo as f64;

    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    let (a, b) = (REDS[lo], REDS[lo + 1]);
    RGBColor(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}

/// Linear mapping of raw intensities onto `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalize {
    pub min: f64,
    pub max: f64,
}

impl Normalize {
    /// Fit to the range of `values`; an empty slice maps onto `[0, 1]`
    pub fn fit(values: impl IntoIterator<Item = f64>) -> Self {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if min > max {
            Self { min: 0.0, max: 1.0 }
        } else {
            Self { min, max }
        }
    }

    /// Position of `value` in the range; a degenerate range maps to 0
    pub fn apply(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            0.0
        } else {
            ((value - self.min) / span).clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_endpoints() {
        assert_eq!(reds(0.0), RGBColor(255, 245, 240));
        assert_eq!(reds(1.0), RGBColor(103, 0, 13));
        assert_eq!(reds(-3.0), reds(0.0));
        assert_eq!(reds(f64::NAN), reds(0.0));
    }

    #[test]
    fn test_ramp_darkens_monotonically() {
        let mut prev = reds(0.0);
        for i in 1..=20 {
            let next = reds(i as f64 / 20.0);
            assert!(next.1 <= prev.1);
            prev = next;
        }
    }

    #[test]
    fn test_normalize() {
        let norm = Normalize::fit([0.2, 0.6, 0.4]);
        assert!((norm.apply(0.4) - 0.5).abs() < 1e-12);
        assert_eq!(norm.apply(0.6), 1.0);

        let flat = Normalize::fit([0.3, 0.3]);
        assert_eq!(flat.apply(0.3), 0.0);
        assert_eq!(Normalize::fit(std::iter::empty()), Normalize { min: 0.0, max: 1.0 });
    }
}
