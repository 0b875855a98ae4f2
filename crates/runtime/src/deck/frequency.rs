use serde::{Deserialize, Serialize};

pub const COST_BUCKETS: [&str; 11] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10"];
pub const RARITY_BUCKETS: [&str; 8] = ["C", "UC", "R", "SR", "SEC", "PR", "TR", "DON"];
pub const COUNTER_BUCKETS: [&str; 3] = ["0", "1000", "2000"];

/// Count table over a fixed template of buckets.
///
/// Entries keep template order; keys outside the template are appended in
/// the order they are first seen. Serializes as an array of `[key, count]`
/// entries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrequencyMap {
    entries: Vec<(String, u32)>,
}

impl FrequencyMap {
    pub fn from_template(buckets: &[&str]) -> Self {
        Self {
            entries: buckets.iter().map(|b| (b.to_string(), 0)).collect(),
        }
    }

    pub fn cost() -> Self {
        Self::from_template(&COST_BUCKETS)
    }

    pub fn rarity() -> Self {
        Self::from_template(&RARITY_BUCKETS)
    }

    pub fn counter() -> Self {
        Self::from_template(&COUNTER_BUCKETS)
    }

    pub fn get(&self, key: &str) -> u32 {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn increment(&mut self, key: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((key.to_string(), 1)),
        }
    }

    /// Decrements `key`, never going below zero.
    pub fn decrement(&mut self, key: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, count)) => *count = count.saturating_sub(1),
            None => self.entries.push((key.to_string(), 0)),
        }
    }

    pub fn total(&self) -> u32 {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(k, count)| (k.as_str(), *count))
    }

    /// True when every template bucket is present.
    pub fn covers(&self, buckets: &[&str]) -> bool {
        buckets.iter().all(|b| self.entries.iter().any(|(k, _)| k == b))
    }
}
