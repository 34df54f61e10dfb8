use std::collections::BTreeMap;

use serde::Serialize;

/// Property bag of an overlay feature.
///
/// The six well-known keys are lifted into fields; any other key is kept in
/// `extra` so a snapshot carries the complete bag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeatureProperties {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub last_updated: String,
    pub owner: String,
    pub notes: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl FeatureProperties {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut props = Self::default();
        for (k, v) in pairs {
            props.insert(k.into(), v.into());
        }
        props
    }

    pub fn insert(&mut self, key: String, value: String) {
        match key.as_str() {
            "name" => self.name = value,
            "type" => self.kind = value,
            "status" => self.status = value,
            "last_updated" => self.last_updated = value,
            "owner" => self.owner = value,
            "notes" => self.notes = value,
            _ => {
                self.extra.insert(key, value);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "name" => Some(self.name.as_str()),
            "type" => Some(self.kind.as_str()),
            "status" => Some(self.status.as_str()),
            "last_updated" => Some(self.last_updated.as_str()),
            "owner" => Some(self.owner.as_str()),
            "notes" => Some(self.notes.as_str()),
            other => self.extra.get(other).map(String::as_str),
        }
    }
}
