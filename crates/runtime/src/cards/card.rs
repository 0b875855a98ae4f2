use serde::{Deserialize, Deserializer, Serialize};

pub const LEADER_TYPE: &str = "Leader";
/// `card_type` the catalog uses for sealed product (packs, boxes).
pub const UNTYPED_CARD_TYPE: &str = "<NA>";
pub const DON_RARITY: &str = "DON!!";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Card {
    pub id: i64,
    pub product_id: i64,
    #[serde(default = "default_foil_type")]
    pub foil_type: String,

    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tcgplayer_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub market_price: Option<f64>,

    #[serde(default)]
    pub rarity: Option<String>,
    #[serde(default)]
    pub card_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub card_type: Option<String>,
    #[serde(default)]
    pub life: Option<i64>,
    #[serde(default)]
    pub power: Option<i64>,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub attribute: Option<String>,
    #[serde(default)]
    pub cost: Option<i64>,
    #[serde(default)]
    pub counter: Option<i64>,

    #[serde(default)]
    pub last_update: String,
}

fn default_foil_type() -> String {
    "Normal".to_string()
}

// The backend serializes FloatField prices as numbers, but older exports
// carry them as strings.
fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|p| p.is_finite()))
}

impl Default for Card {
    fn default() -> Self {
        Self {
            id: 0,
            product_id: 0,
            foil_type: default_foil_type(),
            name: String::new(),
            image_url: None,
            tcgplayer_url: None,
            market_price: None,
            rarity: None,
            card_id: None,
            description: None,
            color: None,
            card_type: None,
            life: None,
            power: None,
            subtype: None,
            attribute: None,
            cost: None,
            counter: None,
            last_update: String::new(),
        }
    }
}

impl Card {
    pub fn is_leader(&self) -> bool {
        self.card_type.as_deref() == Some(LEADER_TYPE)
    }

    /// Price used for deck totals; a missing price counts as zero.
    pub fn price(&self) -> f64 {
        self.market_price.unwrap_or(0.0)
    }

    pub fn cost_key(&self) -> String {
        self.cost.unwrap_or(0).to_string()
    }

    pub fn counter_key(&self) -> String {
        self.counter.unwrap_or(0).to_string()
    }

    pub fn rarity_key(&self) -> String {
        match self.rarity.as_deref() {
            Some(DON_RARITY) => "DON".to_string(),
            Some(rarity) => rarity.to_string(),
            None => "0".to_string(),
        }
    }

    /// Individual colors of a multi-color card ("Red/Blue" -> ["Red", "Blue"]).
    pub fn colors(&self) -> impl Iterator<Item = &str> {
        self.color
            .as_deref()
            .into_iter()
            .flat_map(|c| c.split('/'))
            .map(str::trim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_catalog_record() {
        let raw = r#"{
            "id": 42,
            "product_id": 100,
            "name": "Monkey.D.Luffy",
            "market_price": "12.50",
            "rarity": "L",
            "card_id": "OP01-003",
            "color": "Red/Green",
            "card_type": "Leader",
            "power": 5000,
            "life": 4,
            "last_update": "2025-05-01T10:00:00Z"
        }"#;
        let card: Card = serde_json::from_str(raw).unwrap();
        assert_eq!(card.id, 42);
        assert_eq!(card.foil_type, "Normal");
        assert_eq!(card.market_price, Some(12.5));
        assert!(card.is_leader());
        assert_eq!(card.colors().collect::<Vec<_>>(), vec!["Red", "Green"]);
        assert_eq!(card.cost, None);
    }

    #[test]
    fn test_unparseable_price_is_none() {
        let card: Card = serde_json::from_str(
            r#"{"id": 1, "product_id": 1, "name": "Pack", "market_price": "n/a"}"#,
        )
        .unwrap();
        assert_eq!(card.market_price, None);
        assert_eq!(card.price(), 0.0);

        let card: Card = serde_json::from_str(
            r#"{"id": 1, "product_id": 1, "name": "Pack", "market_price": null}"#,
        )
        .unwrap();
        assert_eq!(card.market_price, None);
    }

    #[test]
    fn test_bucket_keys() {
        let mut card = Card {
            rarity: Some("DON!!".to_string()),
            ..Default::default()
        };
        assert_eq!(card.rarity_key(), "DON");
        assert_eq!(card.cost_key(), "0");
        assert_eq!(card.counter_key(), "0");

        card.rarity = None;
        card.cost = Some(7);
        card.counter = Some(2000);
        assert_eq!(card.rarity_key(), "0");
        assert_eq!(card.cost_key(), "7");
        assert_eq!(card.counter_key(), "2000");
    }
}
