//! Static soil and crop advisories keyed by annual rainfall band.

use std::fmt;

/// Advisory for one soil type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recommendation {
    /// Soil type the advice applies to.
    pub soil_type: &'static str,
    /// Suggested crops.
    pub crops: &'static str,
    /// Sowing window.
    pub sowing_period: &'static str,
    /// Diseases to watch for.
    pub common_diseases: &'static str,
    /// Recommended precautions.
    pub precautions: &'static str,
}

/// Annual rainfall range selecting a set of advisories.
///
/// Lower bounds are inclusive: 500 mm is `Moderate`, 1200 mm is `High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RainfallBand {
    /// Below 500 mm.
    Low,
    /// 500 mm up to (not including) 1200 mm.
    Moderate,
    /// 1200 mm and above.
    High,
}

const LOW: [Recommendation; 2] = [
    Recommendation {
        soil_type: "Red Soil",
        crops: "Millets, Pulses",
        sowing_period: "June-July",
        common_diseases: "Leaf spot",
        precautions: "Drought-tolerant varieties",
    },
    Recommendation {
        soil_type: "Black Soil",
        crops: "Sorghum, Wheat",
        sowing_period: "June-July",
        common_diseases: "Rust",
        precautions: "Minimal irrigation",
    },
];

const MODERATE: [Recommendation; 2] = [
    Recommendation {
        soil_type: "Red Soil",
        crops: "Groundnut, Cotton",
        sowing_period: "June-July",
        common_diseases: "Leaf spot, Root rot",
        precautions: "Crop rotation",
    },
    Recommendation {
        soil_type: "Black Soil",
        crops: "Cotton, Sorghum, Wheat",
        sowing_period: "June-July",
        common_diseases: "Rust, Blight",
        precautions: "Integrated pest management",
    },
];

const HIGH: [Recommendation; 2] = [
    Recommendation {
        soil_type: "Red Soil",
        crops: "Paddy, Sugarcane",
        sowing_period: "June-July",
        common_diseases: "Blast, Root rot",
        precautions: "Water management",
    },
    Recommendation {
        soil_type: "Black Soil",
        crops: "Paddy, Cotton",
        sowing_period: "June-July",
        common_diseases: "Blight",
        precautions: "Ensure drainage",
    },
];

impl RainfallBand {
    /// Band for an annual total in mm.
    #[must_use]
    pub fn for_annual(annual_mm: f64) -> Self {
        if annual_mm < 500.0 {
            Self::Low
        } else if annual_mm < 1200.0 {
            Self::Moderate
        } else {
            Self::High
        }
    }

    /// The advisories for this band, one per soil type.
    #[must_use]
    pub fn recommendations(self) -> &'static [Recommendation] {
        match self {
            Self::Low => &LOW,
            Self::Moderate => &MODERATE,
            Self::High => &HIGH,
        }
    }
}

impl fmt::Display for RainfallBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "below 500 mm",
            Self::Moderate => "500-1200 mm",
            Self::High => "1200 mm and above",
        })
    }
}

/// Advisories for an annual total in mm.
#[must_use]
pub fn recommendations_for(annual_mm: f64) -> &'static [Recommendation] {
    RainfallBand::for_annual(annual_mm).recommendations()
}
