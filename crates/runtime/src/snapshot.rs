use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cards::Card;
use crate::deck::{Deck, DeckRecord, FrequencyMap, DEFAULT_DECK_NAME};
use crate::filter::{deserialize_filters, serialize_filters, FilterState};
use crate::storage::{get_json, keys, set_json, LocalStore};

pub const DEFAULT_LEFT_PANEL_WIDTH: f64 = 60.0;
pub const MIN_LEFT_PANEL_WIDTH: f64 = 20.0;
pub const MAX_LEFT_PANEL_WIDTH: f64 = 80.0;

fn default_deck_name() -> String {
    DEFAULT_DECK_NAME.to_string()
}

/// Stored form of the active deck. The statistics are written for readers
/// of the raw value; restoring derives them again from `cards`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DeckSnapshot {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user: String,
    #[serde(default = "default_deck_name")]
    pub name: String,
    #[serde(default)]
    pub leader: Option<Card>,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub total_price: f64,
    #[serde(default)]
    pub cost_map: FrequencyMap,
    #[serde(default)]
    pub rarity_map: FrequencyMap,
    #[serde(default)]
    pub counter_map: FrequencyMap,
}

impl From<&Deck> for DeckSnapshot {
    fn from(deck: &Deck) -> Self {
        Self {
            id: deck.id().to_string(),
            user: deck.user().to_string(),
            name: deck.name().to_string(),
            leader: deck.leader().cloned(),
            cards: deck.cards().to_vec(),
            total_price: deck.total_price(),
            cost_map: deck.cost_map().clone(),
            rarity_map: deck.rarity_map().clone(),
            counter_map: deck.counter_map().clone(),
        }
    }
}

impl From<DeckSnapshot> for DeckRecord {
    fn from(snapshot: DeckSnapshot) -> Self {
        Self {
            id: snapshot.id,
            user: snapshot.user,
            name: snapshot.name,
            leader: snapshot.leader,
            cards: snapshot.cards,
        }
    }
}

pub fn save_deck_snapshot(store: &dyn LocalStore, deck: &Deck) -> Result<()> {
    set_json(store, keys::ACTIVE_DECK, &DeckSnapshot::from(deck))
}

/// The stored active deck, if there is a readable one.
pub fn restore_deck_snapshot(store: &dyn LocalStore) -> Option<DeckRecord> {
    get_json::<DeckSnapshot>(store, keys::ACTIVE_DECK).map(DeckRecord::from)
}

pub fn clear_deck_snapshot(store: &dyn LocalStore) -> Result<()> {
    store.remove(keys::ACTIVE_DECK)
}

pub fn save_filters(store: &dyn LocalStore, filters: &FilterState) -> Result<()> {
    set_json(store, keys::ACTIVE_FILTERS, &serialize_filters(filters))
}

pub fn restore_filters(store: &dyn LocalStore) -> FilterState {
    get_json::<Value>(store, keys::ACTIVE_FILTERS)
        .map(|value| deserialize_filters(&value))
        .unwrap_or_default()
}

pub fn clear_filters(store: &dyn LocalStore) -> Result<()> {
    store.remove(keys::ACTIVE_FILTERS)
}

pub fn clamp_left_panel_width(width: f64) -> f64 {
    if width.is_nan() {
        return DEFAULT_LEFT_PANEL_WIDTH;
    }
    width.clamp(MIN_LEFT_PANEL_WIDTH, MAX_LEFT_PANEL_WIDTH)
}

pub fn load_left_panel_width(store: &dyn LocalStore) -> f64 {
    get_json::<f64>(store, keys::LEFT_PANEL_WIDTH)
        .map(clamp_left_panel_width)
        .unwrap_or(DEFAULT_LEFT_PANEL_WIDTH)
}

/// Stores the clamped width and returns it.
pub fn save_left_panel_width(store: &dyn LocalStore, width: f64) -> Result<f64> {
    let width = clamp_left_panel_width(width);
    set_json(store, keys::LEFT_PANEL_WIDTH, &width)?;
    Ok(width)
}
