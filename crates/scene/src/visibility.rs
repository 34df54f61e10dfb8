use std::collections::BTreeSet;

use crate::components::FeatureProperties;
use crate::dataset::OverlayDataset;
use crate::entity_set::EntitySet;

/// Immutable search/filter snapshot.
///
/// An empty search text or an empty set matches everything on that
/// dimension. Search text is stored trimmed and lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    search_text: String,
    types: BTreeSet<String>,
    status: BTreeSet<String>,
}

impl FilterCriteria {
    pub fn new<T, S>(
        search_text: &str,
        types: impl IntoIterator<Item = T>,
        status: impl IntoIterator<Item = S>,
    ) -> Self
    where
        T: Into<String>,
        S: Into<String>,
    {
        Self {
            search_text: search_text.trim().to_lowercase(),
            types: types.into_iter().map(Into::into).collect(),
            status: status.into_iter().map(Into::into).collect(),
        }
    }

    /// Criteria that accept every entity.
    pub fn match_all() -> Self {
        Self::default()
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn types(&self) -> &BTreeSet<String> {
        &self.types
    }

    pub fn status(&self) -> &BTreeSet<String> {
        &self.status
    }

    pub fn is_match_all(&self) -> bool {
        self.search_text.is_empty() && self.types.is_empty() && self.status.is_empty()
    }

    pub fn match_text(&self, name: &str) -> bool {
        self.search_text.is_empty() || name.to_lowercase().contains(&self.search_text)
    }

    pub fn match_type(&self, kind: &str) -> bool {
        self.types.is_empty() || self.types.contains(kind)
    }

    pub fn match_status(&self, status: &str) -> bool {
        self.status.is_empty() || self.status.contains(status)
    }

    pub fn matches(&self, props: &FeatureProperties) -> bool {
        self.match_text(&props.name) && self.match_type(&props.kind) && self.match_status(&props.status)
    }
}

/// Compute which entities should be visible under `criteria`.
///
/// Pure: reads the dataset and returns the derived mask. Feed the result to
/// [`OverlayDataset::apply_visibility`] to publish it.
pub fn recompute(dataset: &OverlayDataset, criteria: &FilterCriteria) -> EntitySet {
    let mut mask = EntitySet::with_max_index(dataset.len().saturating_sub(1) as u32);
    for entity in dataset.iter() {
        if criteria.matches(&entity.properties) {
            mask.insert(entity.id);
        }
    }
    mask
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VisibilityUpdate {
    pub visible: usize,
    pub hidden: usize,
    pub changed: usize,
}

/// Recompute and apply in one step. Idempotent for identical inputs.
pub fn refresh(dataset: &mut OverlayDataset, criteria: &FilterCriteria) -> VisibilityUpdate {
    let mask = recompute(dataset, criteria);
    let changed = dataset.apply_visibility(&mask);
    VisibilityUpdate {
        visible: mask.len(),
        hidden: dataset.len() - mask.len(),
        changed,
    }
}

#[cfg(test)]
mod tests {
    use super::{FilterCriteria, recompute, refresh};
    use crate::components::FeatureProperties;
    use crate::dataset::OverlayDataset;
    use foundation::math::Geodetic;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn dataset(rows: &[(&str, &str, &str)]) -> OverlayDataset {
        let mut ds = OverlayDataset::new("targets");
        for (i, (name, kind, status)) in rows.iter().enumerate() {
            ds.spawn(
                format!("f-{i}"),
                Geodetic::from_degrees(133.5 + i as f64 * 0.01, 33.5, 0.0),
                FeatureProperties::from_pairs([
                    ("name", *name),
                    ("type", *kind),
                    ("status", *status),
                ]),
            );
        }
        ds
    }

    fn sample() -> OverlayDataset {
        dataset(&[
            ("Harimaya Bridge", "bridge", "pending"),
            ("Route 32", "road", "inspecting"),
            ("Water Plant", "facility", "done"),
            ("Kagami Bridge", "bridge", "done"),
        ])
    }

    fn visible_names(ds: &OverlayDataset) -> Vec<String> {
        ds.iter()
            .filter(|e| e.is_visible())
            .map(|e| e.properties.name.clone())
            .collect()
    }

    #[test]
    fn empty_criteria_show_everything() {
        let mut ds = sample();
        let update = refresh(&mut ds, &FilterCriteria::match_all());
        assert_eq!(update.visible, 4);
        assert_eq!(update.changed, 0);
    }

    #[test]
    fn search_is_trimmed_and_case_insensitive() {
        let mut ds = sample();
        refresh(&mut ds, &FilterCriteria::new("  BRIDGE ", [] as [&str; 0], [] as [&str; 0]));
        assert_eq!(
            visible_names(&ds),
            vec!["Harimaya Bridge".to_string(), "Kagami Bridge".to_string()]
        );
    }

    #[test]
    fn dimensions_combine_with_and() {
        let mut ds = sample();
        let update = refresh(&mut ds, &FilterCriteria::new("bridge", ["bridge"], ["done"]));
        assert_eq!(visible_names(&ds), vec!["Kagami Bridge".to_string()]);
        assert_eq!(update.hidden, 3);
    }

    #[test]
    fn loosening_criteria_restores_entities() {
        let mut ds = sample();
        refresh(&mut ds, &FilterCriteria::new("", ["road"], [] as [&str; 0]));
        assert_eq!(ds.visible_count(), 1);
        let update = refresh(&mut ds, &FilterCriteria::match_all());
        assert_eq!(update.changed, 3);
        assert_eq!(ds.visible_count(), 4);
    }

    #[test]
    fn recompute_does_not_touch_the_dataset() {
        let ds = sample();
        let before = ds.clone();
        let mask = recompute(&ds, &FilterCriteria::new("", ["facility"], [] as [&str; 0]));
        assert_eq!(mask.len(), 1);
        assert_eq!(ds, before);
    }

    #[test]
    fn unknown_type_hides_everything() {
        let mut ds = sample();
        refresh(&mut ds, &FilterCriteria::new("", ["tunnel"], [] as [&str; 0]));
        assert_eq!(ds.visible_count(), 0);
    }

    const NAMES: [&str; 4] = ["Harimaya Bridge", "route 32", "PLANT", ""];
    const TYPES: [&str; 3] = ["bridge", "road", "facility"];
    const STATUS: [&str; 3] = ["pending", "inspecting", "done"];

    fn row_strategy() -> impl Strategy<Value = (usize, usize, usize)> {
        (0..NAMES.len(), 0..TYPES.len(), 0..STATUS.len())
    }

    fn criteria_strategy() -> impl Strategy<Value = FilterCriteria> {
        (
            prop::sample::select(vec!["", "bridge", "ROUTE", "plant", "zzz"]),
            prop::collection::btree_set(prop::sample::select(TYPES.to_vec()), 0..3),
            prop::collection::btree_set(prop::sample::select(STATUS.to_vec()), 0..3),
        )
            .prop_map(|(text, types, status)| FilterCriteria::new(text, types, status))
    }

    proptest! {
        #[test]
        fn visible_equals_conjunction_of_matches(
            rows in prop::collection::vec(row_strategy(), 0..24),
            criteria in criteria_strategy(),
        ) {
            let rows: Vec<(&str, &str, &str)> = rows
                .into_iter()
                .map(|(n, t, s)| (NAMES[n], TYPES[t], STATUS[s]))
                .collect();
            let mut ds = dataset(&rows);
            refresh(&mut ds, &criteria);

            for e in ds.iter() {
                let p = &e.properties;
                let expected = (criteria.search_text().is_empty()
                    || p.name.to_lowercase().contains(criteria.search_text()))
                    && (criteria.types().is_empty() || criteria.types().contains(&p.kind))
                    && (criteria.status().is_empty() || criteria.status().contains(&p.status));
                prop_assert_eq!(e.is_visible(), expected);
            }
        }

        #[test]
        fn refresh_is_idempotent(
            rows in prop::collection::vec(row_strategy(), 0..24),
            criteria in criteria_strategy(),
        ) {
            let rows: Vec<(&str, &str, &str)> = rows
                .into_iter()
                .map(|(n, t, s)| (NAMES[n], TYPES[t], STATUS[s]))
                .collect();
            let mut once = dataset(&rows);
            refresh(&mut once, &criteria);

            let mut twice = once.clone();
            let second = refresh(&mut twice, &criteria);

            prop_assert_eq!(second.changed, 0);
            prop_assert_eq!(once.visible_set(), twice.visible_set());
            prop_assert_eq!(recompute(&once, &criteria), once.visible_set());
        }
    }
}
