use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::cards::Card;
use crate::catalog::CatalogCache;
use crate::debounce::{Debouncer, DEFAULT_SNAPSHOT_DELAY};
use crate::deck::{Deck, DeckRecord};
use crate::filter::{filter_and_sort, FilterGroup, FilterState, FilterValue};
use crate::remote::{DeckStore, PriceSource, RemoteDeck};
use crate::snapshot::{
    clear_deck_snapshot, clear_filters, restore_deck_snapshot, restore_filters,
    save_deck_snapshot, save_filters,
};
use crate::storage::LocalStore;

/// User-facing message, shown briefly by whatever front end drives the session.
#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
    Success(String),
    Error(String),
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub snapshot_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            snapshot_delay: DEFAULT_SNAPSHOT_DELAY,
        }
    }
}

/// Owns the active deck and filters for one browsing session.
///
/// Operations apply in call order. Every change schedules a debounced
/// snapshot to local storage; saving to the deck store only happens on
/// [`DeckSession::save`]. Dropping the session cancels pending snapshots.
pub struct DeckSession {
    store: Arc<dyn LocalStore>,
    deck: Deck,
    filters: FilterState,
    search: String,
    deck_snapshot: Debouncer,
    filter_snapshot: Debouncer,
    notifications: mpsc::Sender<Notification>,
}

impl DeckSession {
    pub fn new(store: Arc<dyn LocalStore>, config: SessionConfig) -> (Self, mpsc::Receiver<Notification>) {
        let (notifications, rx) = mpsc::channel(50);
        (
            Self {
                store,
                deck: Deck::default(),
                filters: FilterState::new(),
                search: String::new(),
                deck_snapshot: Debouncer::new(config.snapshot_delay),
                filter_snapshot: Debouncer::new(config.snapshot_delay),
                notifications,
            },
            rx,
        )
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Brings back the stored deck (with current prices) and filters.
    pub async fn restore(&mut self, prices: &dyn PriceSource) {
        if let Some(record) = restore_deck_snapshot(self.store.as_ref()) {
            let latest = fetch_latest_prices(prices, &record).await;
            self.deck = Deck::load(record, latest.as_ref());
            info!("Restored deck \"{}\" with {} cards", self.deck.name(), self.deck.cards().len());
        }
        self.filters = restore_filters(self.store.as_ref());
    }

    /// Returns whether the card went in.
    pub fn add_card(&mut self, card: &Card) -> bool {
        match self.deck.add_card(card) {
            Ok(deck) => {
                self.commit(deck);
                true
            }
            Err(rejection) => {
                warn!("{}", rejection);
                false
            }
        }
    }

    pub fn remove_card(&mut self, card: &Card) {
        let deck = self.deck.remove_card(card);
        self.commit(deck);
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        let deck = self.deck.renamed(name);
        self.commit(deck);
    }

    /// Empties the deck and detaches it from its stored copy.
    pub fn clear(&mut self) {
        if let Err(e) = clear_deck_snapshot(self.store.as_ref()) {
            warn!("Failed to clear stored deck: {}", e);
        }
        let deck = self.deck.cleared().with_remote_identity("", "");
        self.commit(deck);
    }

    pub async fn load(&mut self, record: DeckRecord, prices: &dyn PriceSource) {
        let latest = fetch_latest_prices(prices, &record).await;
        let deck = Deck::load(record, latest.as_ref());
        self.commit(deck);
    }

    pub async fn load_remote(&mut self, remote: &RemoteDeck, catalog: &CatalogCache, prices: &dyn PriceSource) {
        self.load(catalog.resolve(remote), prices).await;
    }

    pub async fn list_remote(&self, decks: &dyn DeckStore) -> Result<Vec<RemoteDeck>> {
        decks.list_decks().await.map_err(|e| {
            error!("Failed to list decks: {}", e);
            self.notify(Notification::Error("Failed to load decks".to_string()));
            e
        })
    }

    /// Sends the deck to the deck store and adopts the identity it assigns.
    /// On failure the deck is left as it was.
    pub async fn save(&mut self, decks: &dyn DeckStore) -> Result<()> {
        let payload = self.deck.save_payload();
        match decks.save_deck(&payload).await {
            Ok(saved) => {
                info!("Deck saved successfully: {} ({})", payload.name, saved.id);
                let deck = self.deck.with_remote_identity(saved.id, saved.user);
                self.commit(deck);
                self.notify(Notification::Success(format!("Saved \"{}\"!", payload.name)));
                Ok(())
            }
            Err(e) => {
                error!("Failed to save deck: {}", e);
                self.notify(Notification::Error("Failed to save deck".to_string()));
                Err(e)
            }
        }
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn set_filter(&mut self, group: FilterGroup, value: FilterValue) {
        self.filters.set(group, value);
        self.schedule_filter_snapshot();
    }

    pub fn toggle_filter(&mut self, group: FilterGroup, value: &str) {
        self.filters.toggle(group, value);
        self.schedule_filter_snapshot();
    }

    pub fn remove_filter(&mut self, group: FilterGroup) {
        self.filters.remove(group);
        self.schedule_filter_snapshot();
    }

    pub fn clear_filters(&mut self) {
        self.filter_snapshot.cancel();
        if let Err(e) = clear_filters(self.store.as_ref()) {
            warn!("Failed to clear stored filters: {}", e);
        }
        self.filters.clear();
    }

    /// Catalog cards passing the active search and filters, in grid order.
    pub fn visible_cards<'a>(&self, catalog: &'a CatalogCache) -> Vec<&'a Card> {
        filter_and_sort(catalog.cards(), &self.search, &self.filters)
    }

    /// Writes both snapshots now instead of waiting for the debounce.
    pub fn flush(&mut self) -> Result<()> {
        self.deck_snapshot.cancel();
        self.filter_snapshot.cancel();
        save_deck_snapshot(self.store.as_ref(), &self.deck)?;
        save_filters(self.store.as_ref(), &self.filters)?;
        Ok(())
    }

    fn commit(&mut self, deck: Deck) {
        self.deck = deck;
        let store = self.store.clone();
        let snapshot = self.deck.clone();
        self.deck_snapshot.schedule(move || {
            if let Err(e) = save_deck_snapshot(store.as_ref(), &snapshot) {
                warn!("Failed to store active deck: {}", e);
            }
        });
    }

    fn schedule_filter_snapshot(&mut self) {
        let store = self.store.clone();
        let filters = self.filters.clone();
        self.filter_snapshot.schedule(move || {
            if let Err(e) = save_filters(store.as_ref(), &filters) {
                warn!("Failed to store active filters: {}", e);
            }
        });
    }

    fn notify(&self, notification: Notification) {
        if let Err(e) = self.notifications.try_send(notification) {
            debug!("Notification dropped: {}", e);
        }
    }
}

async fn fetch_latest_prices(prices: &dyn PriceSource, record: &DeckRecord) -> Option<HashMap<i64, f64>> {
    let mut ids: Vec<i64> = record
        .cards
        .iter()
        .chain(record.leader.iter())
        .map(|c| c.id)
        .collect();
    if ids.is_empty() {
        return None;
    }
    ids.sort_unstable();
    ids.dedup();

    match prices.latest_prices(&ids).await {
        Ok(latest) => Some(latest),
        Err(e) => {
            warn!("Failed to fetch latest prices: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::anyhow;
    use async_trait::async_trait;

    use super::*;
    use crate::deck::DeckPayload;
    use crate::remote::SavedDeck;
    use crate::storage::{keys, MemoryStore};

    struct FakePrices(Option<HashMap<i64, f64>>);

    #[async_trait]
    impl PriceSource for FakePrices {
        async fn latest_prices(&self, card_ids: &[i64]) -> Result<HashMap<i64, f64>> {
            let prices = self.0.clone().ok_or_else(|| anyhow!("prices unavailable"))?;
            Ok(prices.into_iter().filter(|(id, _)| card_ids.contains(id)).collect())
        }
    }

    #[derive(Default)]
    struct FakeDecks {
        fail: bool,
        saved: Mutex<Vec<DeckPayload>>,
    }

    #[async_trait]
    impl DeckStore for FakeDecks {
        async fn list_decks(&self) -> Result<Vec<RemoteDeck>> {
            if self.fail {
                return Err(anyhow!("unauthorized"));
            }
            Ok(vec![])
        }

        async fn save_deck(&self, payload: &DeckPayload) -> Result<SavedDeck> {
            if self.fail {
                return Err(anyhow!("unauthorized"));
            }
            self.saved.lock().unwrap().push(payload.clone());
            Ok(SavedDeck { id: "17".to_string(), user: "3".to_string() })
        }
    }

    fn card(id: i64, price: f64) -> Card {
        Card {
            id,
            product_id: id,
            name: format!("Card {}", id),
            card_type: Some("Character".to_string()),
            cost: Some(2),
            rarity: Some("C".to_string()),
            market_price: Some(price),
            ..Default::default()
        }
    }

    fn session(store: &Arc<MemoryStore>) -> (DeckSession, mpsc::Receiver<Notification>) {
        DeckSession::new(store.clone(), SessionConfig::default())
    }

    async fn settle() {
        tokio::time::sleep(DEFAULT_SNAPSHOT_DELAY + Duration::from_millis(100)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_written_after_quiet_period() {
        let store = Arc::new(MemoryStore::new());
        let (mut session, _rx) = session(&store);

        assert!(session.add_card(&card(1, 1.0)));
        assert!(session.add_card(&card(2, 2.0)));
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(store.get(keys::ACTIVE_DECK).unwrap(), None);

        settle().await;
        let record = restore_deck_snapshot(store.as_ref()).unwrap();
        assert_eq!(record.cards.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_add_leaves_deck_alone() {
        let store = Arc::new(MemoryStore::new());
        let (mut session, _rx) = session(&store);
        let c = card(1, 1.0);

        for _ in 0..4 {
            assert!(session.add_card(&c));
        }
        let before = session.deck().clone();
        assert!(!session.add_card(&c));
        assert_eq!(session.deck(), &before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_adopts_remote_identity() {
        let store = Arc::new(MemoryStore::new());
        let (mut session, mut rx) = session(&store);
        let decks = FakeDecks::default();

        session.rename("Red Aggro");
        session.add_card(&card(5, 1.0));
        session.save(&decks).await.unwrap();

        assert_eq!(session.deck().id(), "17");
        assert_eq!(session.deck().user(), "3");
        assert!(session.deck().is_saved());
        assert_eq!(decks.saved.lock().unwrap()[0].cards, vec![5]);
        assert_eq!(rx.recv().await, Some(Notification::Success("Saved \"Red Aggro\"!".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_save_reports_and_keeps_state() {
        let store = Arc::new(MemoryStore::new());
        let (mut session, mut rx) = session(&store);
        let decks = FakeDecks { fail: true, ..Default::default() };

        session.add_card(&card(5, 1.0));
        let before = session.deck().clone();
        assert!(session.save(&decks).await.is_err());
        assert_eq!(session.deck(), &before);
        assert!(matches!(rx.recv().await, Some(Notification::Error(_))));

        assert!(session.list_remote(&decks).await.is_err());
        assert!(matches!(rx.recv().await, Some(Notification::Error(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_refreshes_prices() {
        let store = Arc::new(MemoryStore::new());
        {
            let (mut session, _rx) = session(&store);
            session.add_card(&card(1, 1.0));
            session.add_card(&card(2, 2.0));
            session.toggle_filter(FilterGroup::Color, "Red");
            session.flush().unwrap();
        }

        let (mut session, _rx) = session(&store);
        session.restore(&FakePrices(Some(HashMap::from([(1, 4.0)])))).await;
        assert_eq!(session.deck().cards().len(), 2);
        assert_eq!(session.deck().total_price(), 6.0);
        assert_eq!(session.filters().active_set(FilterGroup::Color).map(|s| s.len()), Some(1));

        // without prices the stored ones stand
        let (mut session, _rx) = DeckSession::new(store.clone(), SessionConfig::default());
        session.restore(&FakePrices(None)).await;
        assert_eq!(session.deck().total_price(), 3.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_remote_resolves_ids_and_refreshes_prices() {
        let store = Arc::new(MemoryStore::new());
        let leader = Card {
            card_type: Some("Leader".to_string()),
            rarity: Some("L".to_string()),
            ..card(1, 1.0)
        };
        crate::storage::set_json(store.as_ref(), keys::CARDS, &vec![leader, card(2, 2.0)]).unwrap();
        let catalog = CatalogCache::restore(store.clone());
        let (mut session, _rx) = session(&store);

        let remote = RemoteDeck {
            id: "9".to_string(),
            user: "3".to_string(),
            name: "Straw Hats".to_string(),
            leader: Some(1),
            cards: vec![1, 2, 2, 99],
        };
        session
            .load_remote(&remote, &catalog, &FakePrices(Some(HashMap::from([(2, 5.0)]))))
            .await;

        let deck = session.deck();
        assert_eq!(deck.id(), "9");
        assert_eq!(deck.name(), "Straw Hats");
        assert_eq!(deck.leader().map(|l| l.id), Some(1));
        assert_eq!(deck.cards().len(), 3);
        assert_eq!(deck.non_leader_count(), 2);
        assert_eq!(deck.total_price(), 11.0);
        assert_eq!(deck.cost_map().get("2"), 2);

        settle().await;
        let stored = restore_deck_snapshot(store.as_ref()).unwrap();
        assert_eq!(stored.id, "9");
        assert_eq!(stored.cards.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_detaches_deck() {
        let store = Arc::new(MemoryStore::new());
        let (mut session, _rx) = session(&store);
        session.add_card(&card(1, 1.0));
        session.save(&FakeDecks::default()).await.unwrap();
        settle().await;
        assert!(store.get(keys::ACTIVE_DECK).unwrap().is_some());

        session.clear();
        assert!(!session.deck().is_saved());
        assert!(session.deck().cards().is_empty());
        assert_eq!(store.get(keys::ACTIVE_DECK).unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_filters_drive_visible_cards() {
        let store = Arc::new(MemoryStore::new());
        crate::storage::set_json(store.as_ref(), keys::CARDS, &vec![card(1, 1.0), card(2, 2.0)]).unwrap();
        let catalog = CatalogCache::restore(store.clone());
        let (mut session, _rx) = session(&store);

        // nothing is selected yet
        assert!(session.visible_cards(&catalog).is_empty());

        session.toggle_filter(FilterGroup::Type, "Character");
        assert_eq!(session.visible_cards(&catalog).len(), 2);
        session.set_search("card 2");
        assert_eq!(session.visible_cards(&catalog).len(), 1);

        settle().await;
        assert!(store.get(keys::ACTIVE_FILTERS).unwrap().is_some());
        session.clear_filters();
        assert_eq!(store.get(keys::ACTIVE_FILTERS).unwrap(), None);
        assert!(session.filters().is_empty());
    }
}
