use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::cards::Card;
use crate::deck::DeckRecord;
use crate::remote::{CardSource, RemoteDeck};
use crate::storage::{get_json, keys, set_json, LocalStore};

/// The catalog is fetched from the backend at most once per day.
pub const CATALOG_MAX_AGE_MS: u64 = 24 * 60 * 60 * 1000;

/// Full card list, mirrored in local storage between runs.
pub struct CatalogCache {
    store: Arc<dyn LocalStore>,
    cards: Vec<Card>,
    by_id: HashMap<i64, usize>,
}

impl CatalogCache {
    /// Cache holding whatever the local store has.
    pub fn restore(store: Arc<dyn LocalStore>) -> Self {
        let cards = get_json::<Vec<Card>>(store.as_ref(), keys::CARDS).unwrap_or_default();
        let mut cache = Self {
            store,
            cards: Vec::new(),
            by_id: HashMap::new(),
        };
        cache.replace(cards);
        cache
    }

    /// Restores from local storage, then refreshes from `source` when the
    /// stored copy is missing or older than a day. A failed fetch keeps the
    /// stored cards.
    pub async fn load(store: Arc<dyn LocalStore>, source: &dyn CardSource, now_ms: u64) -> Self {
        let mut cache = Self::restore(store);
        if let Err(e) = cache.refresh_if_stale(source, now_ms).await {
            error!("Failed to fetch cards: {}", e);
        }
        cache
    }

    pub fn last_fetched(&self) -> Option<u64> {
        get_json::<u64>(self.store.as_ref(), keys::CARDS_LAST_FETCHED)
    }

    pub fn is_stale(&self, now_ms: u64) -> bool {
        match self.last_fetched() {
            Some(last) => now_ms.saturating_sub(last) > CATALOG_MAX_AGE_MS,
            None => true,
        }
    }

    /// Returns whether a fetch happened.
    pub async fn refresh_if_stale(&mut self, source: &dyn CardSource, now_ms: u64) -> Result<bool> {
        if !self.is_stale(now_ms) {
            return Ok(false);
        }
        self.refresh(source, now_ms).await?;
        Ok(true)
    }

    pub async fn refresh(&mut self, source: &dyn CardSource, now_ms: u64) -> Result<()> {
        let cards = source.fetch_cards().await?;
        info!("Fetched {} cards from the catalog", cards.len());
        self.replace(cards);
        let persisted = set_json(self.store.as_ref(), keys::CARDS, &self.cards)
            .and_then(|()| set_json(self.store.as_ref(), keys::CARDS_LAST_FETCHED, &now_ms));
        if let Err(e) = persisted {
            warn!("Failed to store fetched cards: {}", e);
        }
        Ok(())
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Card> {
        self.by_id.get(&id).map(|&index| &self.cards[index])
    }

    /// Turns a stored deck's card ids back into cards. Ids missing from the
    /// catalog are dropped.
    pub fn resolve(&self, remote: &RemoteDeck) -> DeckRecord {
        let cards = remote
            .cards
            .iter()
            .filter_map(|id| {
                let card = self.get(*id);
                if card.is_none() {
                    warn!("Deck {} references unknown card {}", remote.id, id);
                }
                card.cloned()
            })
            .collect();

        DeckRecord {
            id: remote.id.clone(),
            user: remote.user.clone(),
            name: remote.name.clone(),
            leader: remote.leader.and_then(|id| self.get(id).cloned()),
            cards,
        }
    }

    fn replace(&mut self, cards: Vec<Card>) {
        self.by_id = cards.iter().enumerate().map(|(i, c)| (c.id, i)).collect();
        self.cards = cards;
    }
}
