use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::cards::{Card, CardPricePoint};
use crate::deck::DeckPayload;

#[async_trait]
pub trait CardSource: Send + Sync {
    async fn fetch_cards(&self) -> Result<Vec<Card>>;
}

#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Current market price per card id. Ids without a price are absent.
    async fn latest_prices(&self, card_ids: &[i64]) -> Result<HashMap<i64, f64>>;
}

#[async_trait]
pub trait DeckStore: Send + Sync {
    async fn list_decks(&self) -> Result<Vec<RemoteDeck>>;
    async fn save_deck(&self, payload: &DeckPayload) -> Result<SavedDeck>;
}

#[async_trait]
pub trait CardHistorySource: Send + Sync {
    async fn card_history(&self, card_id: i64) -> Result<Vec<CardPricePoint>>;
}

/// A deck as the deck store returns it: card references by id.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RemoteDeck {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub user: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "optional_id")]
    pub leader: Option<i64>,
    #[serde(default)]
    pub cards: Vec<i64>,
}

/// Identity the deck store assigns on save.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SavedDeck {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub user: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

// The deck table stores the leader as text, so ids come back as strings.
fn optional_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Decodes a latest-price response (`{"<id>": price}`), skipping entries
/// whose id or price is unreadable.
pub fn parse_latest_prices(body: &Value) -> HashMap<i64, f64> {
    let Some(obj) = body.as_object() else {
        return HashMap::new();
    };
    obj.iter()
        .filter_map(|(id, price)| {
            let id = id.parse::<i64>().ok()?;
            let price = match price {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.parse::<f64>().ok(),
                _ => None,
            }?;
            Some((id, price))
        })
        .collect()
}
