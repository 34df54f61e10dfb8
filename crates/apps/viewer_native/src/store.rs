use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;

use clap::ValueEnum;
use scene::selection::SelectedFeature;
use scene::visibility::FilterCriteria;
use tracing::warn;
use viewer::{CriteriaListener, StateBridge, SubscriptionId};

pub const FEATURE_TYPES: [&str; 3] = ["bridge", "road", "facility"];
pub const FEATURE_STATUS: [&str; 3] = ["pending", "inspecting", "done"];

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, ValueEnum)]
pub enum City {
    #[default]
    Kochi,
    Osaka,
    Tokyo,
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Kochi => "kochi",
            Self::Osaka => "osaka",
            Self::Tokyo => "tokyo",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub types: Vec<String>,
    pub status: Vec<String>,
}

/// Partial filter update; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterUpdate {
    pub types: Option<Vec<String>>,
    pub status: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub selected_city: City,
    pub filters: Filters,
    pub search_text: String,
    pub selected_feature: Option<SelectedFeature>,
}

impl AppState {
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria::new(
            &self.search_text,
            self.filters.types.iter().cloned(),
            self.filters.status.iter().cloned(),
        )
    }
}

/// In-memory application state shared by the header, side panel and viewer.
#[derive(Default)]
pub struct AppStore {
    state: RefCell<AppState>,
    listeners: RefCell<BTreeMap<SubscriptionId, CriteriaListener>>,
    next_subscription: Cell<u64>,
}

impl AppStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> AppState {
        self.state.borrow().clone()
    }

    pub fn selected_feature(&self) -> Option<SelectedFeature> {
        self.state.borrow().selected_feature.clone()
    }

    pub fn set_city(&self, city: City) {
        self.state.borrow_mut().selected_city = city;
    }

    pub fn set_search_text(&self, text: impl Into<String>) {
        let text = text.into();
        self.update_criteria(|state| state.search_text = text);
    }

    /// Merge `update` into the current filters.
    pub fn set_filters(&self, update: FilterUpdate) {
        for value in update.types.iter().flatten() {
            if !FEATURE_TYPES.contains(&value.as_str()) {
                warn!(value = value.as_str(), "unknown feature type in filter");
            }
        }
        for value in update.status.iter().flatten() {
            if !FEATURE_STATUS.contains(&value.as_str()) {
                warn!(value = value.as_str(), "unknown status in filter");
            }
        }
        self.update_criteria(|state| {
            if let Some(types) = update.types {
                state.filters.types = types;
            }
            if let Some(status) = update.status {
                state.filters.status = status;
            }
        });
    }

    pub fn set_selected_feature(&self, feature: Option<SelectedFeature>) {
        self.state.borrow_mut().selected_feature = feature;
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn update_criteria(&self, apply: impl FnOnce(&mut AppState)) {
        let (before, after) = {
            let mut state = self.state.borrow_mut();
            let before = state.criteria();
            apply(&mut state);
            (before, state.criteria())
        };
        if before == after {
            return;
        }
        let listeners: Vec<CriteriaListener> = self.listeners.borrow().values().cloned().collect();
        for listener in listeners {
            listener(&after);
        }
    }
}

impl StateBridge for AppStore {
    fn filter_criteria(&self) -> FilterCriteria {
        self.state.borrow().criteria()
    }

    fn publish_selection(&self, selection: Option<SelectedFeature>) {
        self.set_selected_feature(selection);
    }

    fn subscribe_criteria(&self, listener: CriteriaListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.get());
        self.next_subscription.set(id.0 + 1);
        self.listeners.borrow_mut().insert(id, listener);
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.borrow_mut().remove(&id).is_some()
    }
}
