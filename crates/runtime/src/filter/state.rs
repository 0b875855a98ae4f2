use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterGroup {
    Color,
    Type,
    Rarity,
    Counter,
    Power,
    Price,
}

impl FilterGroup {
    pub const ALL: [FilterGroup; 6] = [
        FilterGroup::Color,
        FilterGroup::Type,
        FilterGroup::Rarity,
        FilterGroup::Counter,
        FilterGroup::Power,
        FilterGroup::Price,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterGroup::Color => "color",
            FilterGroup::Type => "type",
            FilterGroup::Rarity => "rarity",
            FilterGroup::Counter => "counter",
            FilterGroup::Power => "power",
            FilterGroup::Price => "price",
        }
    }
}

impl fmt::Display for FilterGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterGroup {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        FilterGroup::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| anyhow!("unknown filter group: {}", s))
    }
}

/// Value held by one filter group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FilterValue {
    Set { values: BTreeSet<String> },
    Range { min: f64, max: f64 },
}

impl FilterValue {
    pub fn set<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterValue::Set {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn range(min: f64, max: f64) -> Self {
        FilterValue::Range { min, max }
    }
}

/// Active filters for a browsing session. A missing group is unconstrained.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterState {
    groups: BTreeMap<FilterGroup, FilterValue>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, group: FilterGroup, value: FilterValue) -> Self {
        self.set(group, value);
        self
    }

    pub fn set(&mut self, group: FilterGroup, value: FilterValue) {
        self.groups.insert(group, value);
    }

    pub fn remove(&mut self, group: FilterGroup) -> Option<FilterValue> {
        self.groups.remove(&group)
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    pub fn get(&self, group: FilterGroup) -> Option<&FilterValue> {
        self.groups.get(&group)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FilterGroup, &FilterValue)> {
        self.groups.iter().map(|(g, v)| (*g, v))
    }

    /// Adds `value` to a set group, or takes it out if already present.
    /// A group currently holding a range is replaced by a one-value set.
    pub fn toggle(&mut self, group: FilterGroup, value: &str) {
        match self.groups.get_mut(&group) {
            Some(FilterValue::Set { values }) => {
                if !values.remove(value) {
                    values.insert(value.to_string());
                }
            }
            _ => self.set(group, FilterValue::set([value])),
        }
    }

    /// The group's set, if it holds a non-empty one.
    pub fn active_set(&self, group: FilterGroup) -> Option<&BTreeSet<String>> {
        match self.groups.get(&group) {
            Some(FilterValue::Set { values }) if !values.is_empty() => Some(values),
            _ => None,
        }
    }

    pub fn active_range(&self, group: FilterGroup) -> Option<(f64, f64)> {
        match self.groups.get(&group) {
            Some(FilterValue::Range { min, max }) => Some((*min, *max)),
            _ => None,
        }
    }
}

pub fn serialize_filters(filters: &FilterState) -> Value {
    let mut obj = Map::new();
    for (group, value) in filters.iter() {
        match serde_json::to_value(value) {
            Ok(v) => {
                obj.insert(group.as_str().to_string(), v);
            }
            Err(e) => warn!("Failed to serialize filter group {}: {}", group, e),
        }
    }
    Value::Object(obj)
}

/// Restores filters from their stored form. Accepts the tagged form written
/// by [`serialize_filters`] and the older untagged one, where sets were
/// plain arrays and a pair of numbers meant a range. Groups that cannot be
/// read are dropped.
pub fn deserialize_filters(value: &Value) -> FilterState {
    let mut filters = FilterState::new();
    let Some(obj) = value.as_object() else {
        warn!("Stored filters are not an object, ignoring");
        return filters;
    };

    for (key, raw) in obj {
        let group = match key.parse::<FilterGroup>() {
            Ok(group) => group,
            Err(e) => {
                warn!("Skipping stored filter: {}", e);
                continue;
            }
        };
        match decode_value(raw) {
            Some(v) => filters.set(group, v),
            None => warn!("Skipping unreadable filter value for group {}", group),
        }
    }
    filters
}

fn decode_value(raw: &Value) -> Option<FilterValue> {
    if raw.is_object() {
        return serde_json::from_value(raw.clone()).ok();
    }

    let items = raw.as_array()?;
    if let [Value::Number(min), Value::Number(max)] = items.as_slice() {
        return Some(FilterValue::range(min.as_f64()?, max.as_f64()?));
    }

    let values = items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect();
    Some(FilterValue::Set { values })
}
