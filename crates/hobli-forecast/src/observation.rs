//! Typed rainfall observations and the record normalizer.

use std::fmt;

/// Administrative level of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Top level.
    District,
    /// Child of a district.
    Taluk,
    /// Child of a taluk.
    Hobli,
}

impl Level {
    /// Parse a single-letter level code (`D`, `T`, `H`), ignoring case and
    /// surrounding whitespace.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "D" | "d" => Some(Self::District),
            "T" | "t" => Some(Self::Taluk),
            "H" | "h" => Some(Self::Hobli),
            _ => None,
        }
    }

    /// The single-letter code for this level.
    #[must_use]
    pub fn code(self) -> char {
        match self {
            Self::District => 'D',
            Self::Taluk => 'T',
            Self::Hobli => 'H',
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::District => "District",
            Self::Taluk => "Taluk",
            Self::Hobli => "Hobli",
        })
    }
}

/// One normalized rainfall record for a named unit in a given year.
///
/// Numeric fields are NaN when the source text was absent or unparseable.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Year the source dataset belongs to.
    pub year: i32,
    /// Recognized level, or `None` for an unknown code.
    pub level: Option<Level>,
    /// Trimmed unit name.
    pub name: String,
    /// Long-period normal rainfall in mm.
    pub normal_rainfall: f64,
    /// Observed rainfall in mm.
    pub actual_rainfall: f64,
    /// Percent departure of actual from normal.
    pub deviation_percent: f64,
}

/// Raw string fields of one source row.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawRow<'a> {
    /// Level code text.
    pub level: &'a str,
    /// Unit name text.
    pub name: &'a str,
    /// Normal rainfall text.
    pub normal: &'a str,
    /// Actual rainfall text.
    pub actual: &'a str,
    /// Percent deviation text.
    pub deviation: &'a str,
}

/// Parse a rainfall figure, tolerating thousands separators and spaces.
///
/// Anything that does not parse to a finite number yields NaN.
#[must_use]
pub fn parse_rainfall(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|&c| c != ',' && !c.is_whitespace())
        .collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => f64::NAN,
    }
}

/// Normalize one raw row.
///
/// Returns `None` when the trimmed name or level is empty. An unrecognized
/// but non-empty level keeps the row with `level: None`.
#[must_use]
pub fn normalize(row: &RawRow<'_>, year: i32) -> Option<Observation> {
    let name = row.name.trim();
    let level = row.level.trim();
    if name.is_empty() || level.is_empty() {
        return None;
    }
    Some(Observation {
        year,
        level: Level::from_code(level),
        name: name.to_string(),
        normal_rainfall: parse_rainfall(row.normal),
        actual_rainfall: parse_rainfall(row.actual),
        deviation_percent: parse_rainfall(row.deviation),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row<'a>(level: &'a str, name: &'a str, normal: &'a str) -> RawRow<'a> {
        RawRow {
            level,
            name,
            normal,
            actual: "100",
            deviation: "-5",
        }
    }

    #[test]
    fn level_codes_case_insensitive() {
        assert_eq!(Level::from_code("d"), Some(Level::District));
        assert_eq!(Level::from_code(" T "), Some(Level::Taluk));
        assert_eq!(Level::from_code("h"), Some(Level::Hobli));
        assert_eq!(Level::from_code("X"), None);
        assert_eq!(Level::from_code("DT"), None);
    }

    #[test]
    fn parse_strips_separators_and_spaces() {
        assert_eq!(parse_rainfall("1,234.5"), 1234.5);
        assert_eq!(parse_rainfall("  812 "), 812.0);
        assert_eq!(parse_rainfall("1 020"), 1020.0);
        assert_eq!(parse_rainfall("-12"), -12.0);
    }

    #[test]
    fn parse_bad_text_is_nan() {
        for raw in ["", "   ", "abc", "--", "12mm", "inf", "NaN"] {
            assert!(parse_rainfall(raw).is_nan(), "{raw:?} should be NaN");
        }
    }

    #[test]
    fn parse_rejects_trailing_units() {
        // No leading-number salvage: a unit suffix makes the whole cell unusable.
        for raw in ["812mm", "812 mm", "1,020.5mm", "12.5%"] {
            assert!(parse_rainfall(raw).is_nan(), "{raw:?} should be NaN");
        }
        assert_eq!(parse_rainfall("812"), 812.0);
    }

    #[test]
    fn normalize_keeps_row_with_bad_numbers() {
        let obs = normalize(&row("D", " Mysore ", "n/a"), 2021).unwrap();
        assert_eq!(obs.name, "Mysore");
        assert_eq!(obs.year, 2021);
        assert_eq!(obs.level, Some(Level::District));
        assert!(obs.normal_rainfall.is_nan());
        assert_eq!(obs.actual_rainfall, 100.0);
        assert_eq!(obs.deviation_percent, -5.0);
    }

    #[test]
    fn normalize_rejects_missing_identity() {
        assert!(normalize(&row("D", "   ", "800"), 2020).is_none());
        assert!(normalize(&row("", "Mysore", "800"), 2020).is_none());
        assert!(normalize(&row(" ", "Mysore", "800"), 2020).is_none());
    }

    #[test]
    fn normalize_keeps_unknown_level() {
        let obs = normalize(&row("Z", "Somewhere", "800"), 2020).unwrap();
        assert_eq!(obs.level, None);
        assert_eq!(obs.normal_rainfall, 800.0);
    }
}
