mod card;
mod price_history;

pub use card::{Card, DON_RARITY, LEADER_TYPE, UNTYPED_CARD_TYPE};
pub use price_history::{CardPricePoint, PriceTrend};

/// Copies of one product a deck may hold, leader included.
pub const MAX_COPIES: usize = 4;
