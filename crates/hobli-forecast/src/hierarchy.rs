//! District → Taluk → Hobli tree built by folding rows in source order.
//!
//! Row adjacency encodes nesting: a taluk row belongs to the nearest
//! preceding district row, and a hobli row to the nearest preceding taluk
//! row under that district. The fold state carries those two names
//! explicitly instead of keeping them in ambient mutable variables.

use tracing::{debug, info, instrument};

use crate::history::{History, HistoryEntry, PathKey};
use crate::observation::{Level, Observation};

/// A taluk and the hoblis seen under it, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taluk {
    name: String,
    district: String,
    hoblis: Vec<String>,
}

impl Taluk {
    /// Taluk name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the parent district.
    #[must_use]
    pub fn district(&self) -> &str {
        &self.district
    }

    /// Hobli names in first-seen order.
    #[must_use]
    pub fn hoblis(&self) -> &[String] {
        &self.hoblis
    }
}

/// A district and its taluks, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct District {
    name: String,
    taluks: Vec<Taluk>,
}

impl District {
    /// District name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Taluks in first-seen order.
    #[must_use]
    pub fn taluks(&self) -> &[Taluk] {
        &self.taluks
    }

    /// Find a taluk by name.
    #[must_use]
    pub fn taluk(&self, name: &str) -> Option<&Taluk> {
        self.taluks.iter().find(|t| t.name == name)
    }
}

/// The administrative tree. Sibling names are unique; order is first-seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
    districts: Vec<District>,
}

impl Hierarchy {
    /// Districts in first-seen order.
    #[must_use]
    pub fn districts(&self) -> &[District] {
        &self.districts
    }

    /// Find a district by name.
    #[must_use]
    pub fn district(&self, name: &str) -> Option<&District> {
        self.districts.iter().find(|d| d.name == name)
    }

    /// Find a taluk by district and taluk name.
    #[must_use]
    pub fn taluk(&self, district: &str, taluk: &str) -> Option<&Taluk> {
        self.district(district)?.taluk(taluk)
    }

    /// Return true if the tree has no districts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.districts.is_empty()
    }

    fn district_mut(&mut self, name: &str) -> Option<&mut District> {
        self.districts.iter_mut().find(|d| d.name == name)
    }
}

/// Output of the fold: the tree and the per-node history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationIndex {
    /// The administrative tree.
    pub hierarchy: Hierarchy,
    /// Observations recorded against each node.
    pub history: History,
}

/// Why a row did not contribute to the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The level code was not D, T or H.
    UnknownLevel,
    /// A taluk row appeared before any district row.
    TalukWithoutDistrict,
    /// A hobli row appeared before a district and taluk row.
    HobliWithoutTaluk,
}

/// Fold state: current district/taluk context plus the tree and history so far.
#[derive(Debug, Clone, Default)]
pub struct HierarchyBuilder {
    current_district: Option<String>,
    current_taluk: Option<String>,
    index: LocationIndex,
    rows_applied: usize,
    rows_skipped: usize,
}

impl HierarchyBuilder {
    /// Start an empty fold.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one observation into the state.
    #[must_use]
    pub fn step(mut self, obs: &Observation) -> Self {
        match self.apply(obs) {
            Ok(()) => self.rows_applied += 1,
            Err(reason) => {
                debug!(name = %obs.name, year = obs.year, ?reason, "row skipped");
                self.rows_skipped += 1;
            }
        }
        self
    }

    /// Fold a sequence of observations, in order.
    #[must_use]
    pub fn extend<'a, I>(self, observations: I) -> Self
    where
        I: IntoIterator<Item = &'a Observation>,
    {
        observations.into_iter().fold(self, Self::step)
    }

    /// Rows that updated the tree and history so far.
    #[must_use]
    pub fn rows_applied(&self) -> usize {
        self.rows_applied
    }

    /// Rows skipped so far.
    #[must_use]
    pub fn rows_skipped(&self) -> usize {
        self.rows_skipped
    }

    /// Finish the fold.
    #[must_use]
    pub fn finish(self) -> LocationIndex {
        self.index
    }

    fn apply(&mut self, obs: &Observation) -> Result<(), SkipReason> {
        let name = obs.name.as_str();
        let entry = HistoryEntry::from(obs);
        match obs.level {
            None => Err(SkipReason::UnknownLevel),
            Some(Level::District) => {
                self.current_district = Some(name.to_string());
                self.current_taluk = None;
                if self.index.hierarchy.district(name).is_none() {
                    self.index.hierarchy.districts.push(District {
                        name: name.to_string(),
                        taluks: Vec::new(),
                    });
                }
                self.index.history.record(PathKey::district(name), entry);
                Ok(())
            }
            Some(Level::Taluk) => {
                let Some(district_name) = self.current_district.as_deref() else {
                    return Err(SkipReason::TalukWithoutDistrict);
                };
                let district = self
                    .index
                    .hierarchy
                    .district_mut(district_name)
                    .ok_or(SkipReason::TalukWithoutDistrict)?;
                if district.taluk(name).is_none() {
                    district.taluks.push(Taluk {
                        name: name.to_string(),
                        district: district_name.to_string(),
                        hoblis: Vec::new(),
                    });
                }
                self.index
                    .history
                    .record(PathKey::taluk(name, district_name), entry);
                self.current_taluk = Some(name.to_string());
                Ok(())
            }
            Some(Level::Hobli) => {
                let (Some(district_name), Some(taluk_name)) = (
                    self.current_district.as_deref(),
                    self.current_taluk.as_deref(),
                ) else {
                    return Err(SkipReason::HobliWithoutTaluk);
                };
                let taluk = self
                    .index
                    .hierarchy
                    .district_mut(district_name)
                    .and_then(|d| d.taluks.iter_mut().find(|t| t.name == taluk_name))
                    .ok_or(SkipReason::HobliWithoutTaluk)?;
                if !taluk.hoblis.iter().any(|h| h == name) {
                    taluk.hoblis.push(name.to_string());
                }
                self.index
                    .history
                    .record(PathKey::hobli(name, district_name, taluk_name), entry);
                Ok(())
            }
        }
    }
}

/// Build the tree and history from observations in source order.
#[instrument(skip_all, fields(n_rows = observations.len()))]
pub fn build_hierarchy(observations: &[Observation]) -> LocationIndex {
    let builder = HierarchyBuilder::new().extend(observations);
    info!(
        rows_applied = builder.rows_applied(),
        rows_skipped = builder.rows_skipped(),
        n_districts = builder.index.hierarchy.districts.len(),
        n_nodes = builder.index.history.len(),
        "hierarchy built"
    );
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(level: Option<Level>, name: &str, year: i32) -> Observation {
        Observation {
            year,
            level,
            name: name.to_string(),
            normal_rainfall: 800.0,
            actual_rainfall: 760.0,
            deviation_percent: -5.0,
        }
    }

    fn d(name: &str) -> Observation {
        obs(Some(Level::District), name, 2020)
    }
    fn t(name: &str) -> Observation {
        obs(Some(Level::Taluk), name, 2020)
    }
    fn h(name: &str) -> Observation {
        obs(Some(Level::Hobli), name, 2020)
    }

    #[test]
    fn nesting_follows_row_adjacency() {
        let rows = vec![
            d("Mysore"),
            t("Nanjangud"),
            h("Hullahalli"),
            h("Chikkaiahnachatra"),
            t("Hunsur"),
            h("Bilikere"),
            d("Mandya"),
            t("Maddur"),
        ];
        let index = build_hierarchy(&rows);
        let tree = &index.hierarchy;

        let names: Vec<&str> = tree.districts().iter().map(District::name).collect();
        assert_eq!(names, vec!["Mysore", "Mandya"]);

        let nanjangud = tree.taluk("Mysore", "Nanjangud").unwrap();
        assert_eq!(nanjangud.district(), "Mysore");
        assert_eq!(nanjangud.hoblis(), &["Hullahalli", "Chikkaiahnachatra"]);
        assert_eq!(tree.taluk("Mysore", "Hunsur").unwrap().hoblis(), &["Bilikere"]);
        assert!(tree.taluk("Mandya", "Maddur").unwrap().hoblis().is_empty());
        assert!(tree.taluk("Mysore", "Maddur").is_none());
    }

    #[test]
    fn district_row_resets_taluk_context() {
        // The hobli follows a district row directly, so there is no taluk.
        let index = build_hierarchy(&[d("A"), t("T1"), d("B"), h("Orphan")]);
        assert!(index.hierarchy.district("B").unwrap().taluks().is_empty());
        assert!(index.hierarchy.taluk("A", "T1").unwrap().hoblis().is_empty());
        assert!(index
            .history
            .get(&PathKey::hobli("Orphan", "B", "T1"))
            .is_empty());
    }

    #[test]
    fn repeated_rows_append_history_not_nodes() {
        let mut rows = vec![d("Mysore"), t("Nanjangud"), h("Hullahalli")];
        let later: Vec<Observation> = rows
            .iter()
            .map(|o| Observation {
                year: 2021,
                ..o.clone()
            })
            .collect();
        rows.extend(later);
        let index = build_hierarchy(&rows);

        assert_eq!(index.hierarchy.districts().len(), 1);
        assert_eq!(index.hierarchy.district("Mysore").unwrap().taluks().len(), 1);
        assert_eq!(
            index.hierarchy.taluk("Mysore", "Nanjangud").unwrap().hoblis(),
            &["Hullahalli"]
        );
        assert_eq!(index.history.get(&PathKey::district("Mysore")).len(), 2);
        assert_eq!(
            index
                .history
                .get(&PathKey::hobli("Hullahalli", "Mysore", "Nanjangud"))
                .len(),
            2
        );
    }

    #[test]
    fn same_taluk_name_under_two_districts() {
        let index = build_hierarchy(&[d("A"), t("Central"), d("B"), t("Central")]);
        assert_eq!(index.hierarchy.taluk("A", "Central").unwrap().district(), "A");
        assert_eq!(index.hierarchy.taluk("B", "Central").unwrap().district(), "B");
        assert_eq!(index.history.get(&PathKey::taluk("Central", "A")).len(), 1);
        assert_eq!(index.history.get(&PathKey::taluk("Central", "B")).len(), 1);
    }

    #[test]
    fn orphan_rows_and_unknown_levels_are_skipped() {
        let builder = HierarchyBuilder::new().extend(&[
            h("EarlyHobli"),
            t("EarlyTaluk"),
            obs(None, "Mystery", 2020),
            d("Mysore"),
            h("NoTaluk"),
        ]);
        assert_eq!(builder.rows_skipped(), 4);
        assert_eq!(builder.rows_applied(), 1);
        let index = builder.finish();
        assert_eq!(index.history.len(), 1);
        assert!(index.hierarchy.district("Mysore").unwrap().taluks().is_empty());
    }

    #[test]
    fn history_preserves_row_order() {
        let mut first = d("Mysore");
        first.normal_rainfall = 1.0;
        let mut second = d("Mysore");
        second.normal_rainfall = 2.0;
        let index = build_hierarchy(&[first, second]);
        let normals: Vec<f64> = index
            .history
            .get(&PathKey::district("Mysore"))
            .iter()
            .map(|e| e.normal_rainfall)
            .collect();
        assert_eq!(normals, vec![1.0, 2.0]);
    }
}
