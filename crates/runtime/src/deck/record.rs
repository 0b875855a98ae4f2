use serde::{Deserialize, Serialize};

use crate::cards::Card;

pub const DEFAULT_DECK_NAME: &str = "Untitled Deck";

fn default_deck_name() -> String {
    DEFAULT_DECK_NAME.to_string()
}

/// A deck as it arrives from outside the reducer: a local snapshot or a
/// remote deck resolved against the catalog. Any statistics it carried are
/// discarded; `Deck::load` derives them from `cards`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DeckRecord {
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
}

impl Default for DeckRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            user: String::new(),
            name: default_deck_name(),
            leader: None,
            cards: Vec::new(),
        }
    }
}

/// Body of a deck save request: card ids only.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DeckPayload {
    pub name: String,
    pub leader: Option<i64>,
    pub cards: Vec<i64>,
}
