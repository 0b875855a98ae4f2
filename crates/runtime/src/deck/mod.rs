mod frequency;
mod record;
mod state;

pub use frequency::{FrequencyMap, COST_BUCKETS, COUNTER_BUCKETS, RARITY_BUCKETS};
pub use record::{DeckPayload, DeckRecord, DEFAULT_DECK_NAME};
pub use state::{Deck, DeckRejection};

#[cfg(test)]
mod tests;
