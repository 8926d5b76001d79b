//! Spread an annual total across months with a fixed monsoon profile.

/// Month labels, January first.
pub const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Relative rainfall weight per month, peaking in the south-west monsoon.
pub const MONSOON_WEIGHTS: [f64; 12] = [
    5.0, 8.0, 12.0, 35.0, 70.0, 140.0, 180.0, 170.0, 140.0, 80.0, 30.0, 10.0,
];

/// Rainfall assigned to one month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyRainfall {
    /// Short month label.
    pub month: &'static str,
    /// Rainfall in mm.
    pub rainfall: f64,
}

/// Distribute `annual` mm over twelve months in proportion to
/// [`MONSOON_WEIGHTS`].
#[must_use]
pub fn distribute(annual: f64) -> Vec<MonthlyRainfall> {
    let total: f64 = MONSOON_WEIGHTS.iter().sum();
    MONTHS
        .iter()
        .zip(MONSOON_WEIGHTS)
        .map(|(&month, weight)| MonthlyRainfall {
            month,
            rainfall: annual * (weight / total),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_to_annual() {
        for annual in [0.0, 1.0, 499.5, 812.0, 1200.0, 4321.987] {
            let months = distribute(annual);
            assert_eq!(months.len(), 12);
            let sum: f64 = months.iter().map(|m| m.rainfall).sum();
            assert!((sum - annual).abs() < 1e-9 * annual.max(1.0), "{annual}: {sum}");
            assert!(months.iter().all(|m| m.rainfall >= 0.0));
        }
    }

    #[test]
    fn july_is_the_wettest_month() {
        let months = distribute(880.0);
        // Weights sum to 880, so each month gets exactly its weight.
        assert_eq!(months[6].month, "Jul");
        assert!((months[6].rainfall - 180.0).abs() < 1e-9);
        assert!((months[0].rainfall - 5.0).abs() < 1e-9);
        let wettest = months
            .iter()
            .max_by(|a, b| a.rainfall.total_cmp(&b.rainfall))
            .unwrap();
        assert_eq!(wettest.month, "Jul");
    }

    #[test]
    fn month_order() {
        let labels: Vec<&str> = distribute(100.0).iter().map(|m| m.month).collect();
        assert_eq!(labels, MONTHS.to_vec());
    }
}
