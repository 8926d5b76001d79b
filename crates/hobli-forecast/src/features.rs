//! Fixed-width numeric encoding of an observation for the regressor.

use crate::observation::Level;

/// Width of the feature vector.
pub const N_FEATURES: usize = 6;

/// Year mapped to 0 by the year feature.
pub const YEAR_EPOCH: i32 = 2020;

/// Divisor applied to `year - YEAR_EPOCH`.
pub const YEAR_SCALE: f64 = 5.0;

/// `[normal, deviation, scaled_year, is_hobli, is_taluk, is_district]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; N_FEATURES]);

impl FeatureVector {
    /// Encode one set of inputs.
    ///
    /// NaN deviation becomes 0. NaN normal is passed through; training and
    /// inference filter it out before encoding. An unknown level sets no flag.
    #[must_use]
    pub fn encode(normal: f64, deviation: f64, year: i32, level: Option<Level>) -> Self {
        let deviation = if deviation.is_nan() { 0.0 } else { deviation };
        let scaled_year = (f64::from(year) - f64::from(YEAR_EPOCH)) / YEAR_SCALE;
        let flag = |l: Level| if level == Some(l) { 1.0 } else { 0.0 };
        Self([
            normal,
            deviation,
            scaled_year,
            flag(Level::Hobli),
            flag(Level::Taluk),
            flag(Level::District),
        ])
    }

    /// Borrow the raw values.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Copy into an owned row.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }
}

impl AsRef<[f64]> for FeatureVector {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_and_one_hot() {
        let v = FeatureVector::encode(800.0, -7.5, 2025, Some(Level::Taluk));
        assert_eq!(v.as_slice(), &[800.0, -7.5, 1.0, 0.0, 1.0, 0.0]);

        let h = FeatureVector::encode(1.0, 2.0, 2020, Some(Level::Hobli));
        assert_eq!(&h.as_slice()[2..], &[0.0, 1.0, 0.0, 0.0]);

        let d = FeatureVector::encode(1.0, 2.0, 2015, Some(Level::District));
        assert_eq!(&d.as_slice()[2..], &[-1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn nan_deviation_becomes_zero() {
        let v = FeatureVector::encode(500.0, f64::NAN, 2021, Some(Level::District));
        assert_eq!(v.as_slice()[1], 0.0);
        assert!((v.as_slice()[2] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn nan_normal_propagates() {
        let v = FeatureVector::encode(f64::NAN, 1.0, 2021, None);
        assert!(v.as_slice()[0].is_nan());
    }

    #[test]
    fn extreme_years_do_not_overflow() {
        let low = FeatureVector::encode(500.0, 0.0, i32::MIN, None);
        let expected = (f64::from(i32::MIN) - 2020.0) / YEAR_SCALE;
        assert_eq!(low.as_slice()[2], expected);

        let high = FeatureVector::encode(500.0, 0.0, i32::MAX, None);
        assert!(high.as_slice()[2].is_finite());
        assert!(high.as_slice()[2] > 0.0);
    }

    #[test]
    fn unknown_level_sets_no_flag() {
        let v = FeatureVector::encode(500.0, 0.0, 2020, None);
        assert_eq!(&v.as_slice()[3..], &[0.0, 0.0, 0.0]);
    }
}
