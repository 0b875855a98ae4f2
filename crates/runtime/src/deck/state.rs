use std::collections::HashMap;
use std::sync::Arc;

use bounty_common::round_cents;
use tracing::warn;

use crate::cards::{Card, MAX_COPIES};
use crate::deck::frequency::FrequencyMap;
use crate::deck::record::{DeckPayload, DeckRecord, DEFAULT_DECK_NAME};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeckRejection {
    #[error("{name} is already at the max of {} copies", MAX_COPIES)]
    CopyLimit { name: String, product_id: i64 },
    #[error("deck already has a leader ({current}); cannot add {name}")]
    DuplicateLeader { current: String, name: String },
}

/// The active deck and its derived statistics.
///
/// Every operation returns a new `Deck`. The card list and the frequency
/// maps sit behind `Arc`s and are cloned on write, so a previous `Deck`
/// value is never changed by a later operation.
#[derive(Clone, Debug, PartialEq)]
pub struct Deck {
    id: String,
    user: String,
    name: String,
    leader: Option<Card>,
    cards: Arc<Vec<Card>>,
    total_price: f64,
    cost_map: Arc<FrequencyMap>,
    rarity_map: Arc<FrequencyMap>,
    counter_map: Arc<FrequencyMap>,
}

impl Default for Deck {
    fn default() -> Self {
        Self {
            id: String::new(),
            user: String::new(),
            name: DEFAULT_DECK_NAME.to_string(),
            leader: None,
            cards: Arc::new(Vec::new()),
            total_price: 0.0,
            cost_map: Arc::new(FrequencyMap::cost()),
            rarity_map: Arc::new(FrequencyMap::rarity()),
            counter_map: Arc::new(FrequencyMap::counter()),
        }
    }
}

impl Deck {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn leader(&self) -> Option<&Card> {
        self.leader.as_ref()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn total_price(&self) -> f64 {
        self.total_price
    }

    pub fn cost_map(&self) -> &FrequencyMap {
        &self.cost_map
    }

    pub fn rarity_map(&self) -> &FrequencyMap {
        &self.rarity_map
    }

    pub fn counter_map(&self) -> &FrequencyMap {
        &self.counter_map
    }

    pub fn is_saved(&self) -> bool {
        !self.id.is_empty()
    }

    pub fn copies_of(&self, product_id: i64) -> usize {
        self.cards.iter().filter(|c| c.product_id == product_id).count()
    }

    /// Cards counted by the frequency maps.
    pub fn non_leader_count(&self) -> usize {
        self.cards.len() - usize::from(self.leader_index().is_some())
    }

    pub fn add_card(&self, card: &Card) -> Result<Deck, DeckRejection> {
        if self.copies_of(card.product_id) >= MAX_COPIES {
            return Err(DeckRejection::CopyLimit {
                name: card.name.clone(),
                product_id: card.product_id,
            });
        }

        if card.is_leader() {
            if let Some(current) = &self.leader {
                return Err(DeckRejection::DuplicateLeader {
                    current: current.name.clone(),
                    name: card.name.clone(),
                });
            }
        }

        let mut next = self.clone();
        next.total_price = round_cents(self.total_price + card.price());

        if card.is_leader() {
            next.leader = Some(card.clone());
            Arc::make_mut(&mut next.cards).insert(0, card.clone());
            return Ok(next);
        }

        Arc::make_mut(&mut next.cards).push(card.clone());
        Arc::make_mut(&mut next.cost_map).increment(&card.cost_key());
        Arc::make_mut(&mut next.counter_map).increment(&card.counter_key());
        Arc::make_mut(&mut next.rarity_map).increment(&card.rarity_key());
        Ok(next)
    }

    /// Removes the most recently added copy of `card` (matched by id).
    pub fn remove_card(&self, card: &Card) -> Deck {
        let Some(index) = self.cards.iter().rposition(|c| c.id == card.id) else {
            return self.clone();
        };

        let mut next = self.clone();
        let removed = Arc::make_mut(&mut next.cards).remove(index);
        next.total_price = round_cents(self.total_price - removed.price()).max(0.0);

        let is_current_leader = removed.is_leader()
            && self.leader.as_ref().map(|l| l.id) == Some(removed.id);
        if is_current_leader {
            next.leader = None;
            return next;
        }

        Arc::make_mut(&mut next.cost_map).decrement(&removed.cost_key());
        Arc::make_mut(&mut next.counter_map).decrement(&removed.counter_key());
        Arc::make_mut(&mut next.rarity_map).decrement(&removed.rarity_key());
        next
    }

    pub fn renamed(&self, name: impl Into<String>) -> Deck {
        Deck {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Empties the deck, keeping its name and remote identity.
    pub fn cleared(&self) -> Deck {
        Deck {
            id: self.id.clone(),
            user: self.user.clone(),
            name: self.name.clone(),
            ..Deck::default()
        }
    }

    pub fn with_remote_identity(&self, id: impl Into<String>, user: impl Into<String>) -> Deck {
        Deck {
            id: id.into(),
            user: user.into(),
            ..self.clone()
        }
    }

    /// Builds a deck from an external record, deriving every statistic from
    /// its card list. Prices found in `latest_prices` replace the recorded ones.
    pub fn load(record: DeckRecord, latest_prices: Option<&HashMap<i64, f64>>) -> Deck {
        let DeckRecord { id, user, name, leader, mut cards } = record;

        let mut leader = match leader {
            Some(slot) if slot.is_leader() => Some(slot),
            Some(slot) => {
                warn!("Deck {} names {} as leader, which is not a Leader card", id, slot.name);
                None
            }
            None => None,
        };
        if leader.is_none() {
            leader = cards.iter().find(|c| c.is_leader()).cloned();
        }

        // exactly one Leader-typed entry survives: the first copy of the leader
        let leader_id = leader.as_ref().map(|l| l.id);
        let mut kept_leader = false;
        cards.retain(|c| {
            if !c.is_leader() {
                return true;
            }
            if Some(c.id) == leader_id && !kept_leader {
                kept_leader = true;
                return true;
            }
            warn!("Deck {} drops extra leader {}", id, c.name);
            false
        });
        if let Some(l) = &leader {
            if !kept_leader {
                cards.insert(0, l.clone());
            }
        }

        if let Some(prices) = latest_prices {
            let refresh = |card: &mut Card| {
                if let Some(price) = prices.get(&card.id) {
                    card.market_price = Some(*price);
                }
            };
            cards.iter_mut().for_each(&refresh);
            leader.iter_mut().for_each(&refresh);
        }

        Self::from_parts(id, user, name, leader, cards)
    }

    /// The same deck with statistics recomputed from the card list.
    pub fn recomputed(&self) -> Deck {
        Self::from_parts(
            self.id.clone(),
            self.user.clone(),
            self.name.clone(),
            self.leader.clone(),
            self.cards.to_vec(),
        )
    }

    /// Whether incremental and recomputed statistics describe the same deck.
    pub fn agrees_with(&self, other: &Deck) -> bool {
        (self.total_price - other.total_price).abs() < 0.005
            && self.cost_map == other.cost_map
            && self.rarity_map == other.rarity_map
            && self.counter_map == other.counter_map
    }

    pub fn to_record(&self) -> DeckRecord {
        DeckRecord {
            id: self.id.clone(),
            user: self.user.clone(),
            name: self.name.clone(),
            leader: self.leader.clone(),
            cards: self.cards.to_vec(),
        }
    }

    pub fn save_payload(&self) -> DeckPayload {
        DeckPayload {
            name: self.name.clone(),
            leader: self.leader.as_ref().map(|l| l.id),
            cards: self.cards.iter().map(|c| c.id).collect(),
        }
    }

    fn leader_index(&self) -> Option<usize> {
        let leader_id = self.leader.as_ref()?.id;
        self.cards.iter().position(|c| c.id == leader_id)
    }

    fn from_parts(
        id: String,
        user: String,
        name: String,
        leader: Option<Card>,
        cards: Vec<Card>,
    ) -> Deck {
        let mut cost_map = FrequencyMap::cost();
        let mut rarity_map = FrequencyMap::rarity();
        let mut counter_map = FrequencyMap::counter();

        let leader_index = leader
            .as_ref()
            .and_then(|l| cards.iter().position(|c| c.id == l.id));

        let mut total = 0.0;
        for (index, card) in cards.iter().enumerate() {
            total += card.price();
            if Some(index) == leader_index {
                continue;
            }
            cost_map.increment(&card.cost_key());
            counter_map.increment(&card.counter_key());
            rarity_map.increment(&card.rarity_key());
        }

        Deck {
            id,
            user,
            name,
            leader,
            cards: Arc::new(cards),
            total_price: round_cents(total),
            cost_map: Arc::new(cost_map),
            rarity_map: Arc::new(rarity_map),
            counter_map: Arc::new(counter_map),
        }
    }
}
