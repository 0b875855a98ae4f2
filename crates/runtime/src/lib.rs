mod cards;
mod catalog;
mod debounce;
mod deck;
mod filter;
mod remote;
mod session;
mod snapshot;
mod storage;

pub use cards::{Card, CardPricePoint, PriceTrend, DON_RARITY, LEADER_TYPE, MAX_COPIES, UNTYPED_CARD_TYPE};
pub use catalog::{CatalogCache, CATALOG_MAX_AGE_MS};
pub use debounce::{Debouncer, DEFAULT_SNAPSHOT_DELAY};
pub use deck::{
    Deck, DeckPayload, DeckRecord, DeckRejection, FrequencyMap, COST_BUCKETS, COUNTER_BUCKETS,
    DEFAULT_DECK_NAME, RARITY_BUCKETS,
};
pub use filter::{
    compare, deserialize_filters, display_order, filter_and_sort, matches, serialize_filters,
    text_matches, FilterGroup, FilterState, FilterValue, PACKS_TYPE, PRICE_SLIDER_MAX,
};
pub use remote::{
    parse_latest_prices, CardHistorySource, CardSource, DeckStore, PriceSource, RemoteDeck, SavedDeck,
};
pub use session::{DeckSession, Notification, SessionConfig};
pub use snapshot::{
    clamp_left_panel_width, clear_deck_snapshot, clear_filters, load_left_panel_width,
    restore_deck_snapshot, restore_filters, save_deck_snapshot, save_filters, save_left_panel_width,
    DeckSnapshot, DEFAULT_LEFT_PANEL_WIDTH, MAX_LEFT_PANEL_WIDTH, MIN_LEFT_PANEL_WIDTH,
};
pub use storage::{get_json, keys, set_json, LocalStore, MemoryStore};
