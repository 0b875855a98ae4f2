use serde::{Deserialize, Serialize};

/// One day of market price for a card, as served by the card history endpoint.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CardPricePoint {
    pub id: i64,
    pub history_date: String,
    #[serde(default)]
    pub market_price: Option<f64>,
    pub card_id: i64,
}

/// Summary over a price history, oldest point first.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceTrend {
    pub first: f64,
    pub last: f64,
    pub low: f64,
    pub high: f64,
}

impl PriceTrend {
    pub fn from_history(points: &[CardPricePoint]) -> Option<Self> {
        let mut prices = points.iter().filter_map(|p| p.market_price);
        let first = prices.next()?;
        let mut trend = Self { first, last: first, low: first, high: first };
        for price in prices {
            trend.last = price;
            trend.low = trend.low.min(price);
            trend.high = trend.high.max(price);
        }
        Some(trend)
    }

    pub fn change(&self) -> f64 {
        bounty_common::round_cents(self.last - self.first)
    }
}
