use std::cmp::Ordering;

use crate::cards::{Card, UNTYPED_CARD_TYPE};
use crate::filter::state::{FilterGroup, FilterState};

/// Type filter value that also selects untyped products.
pub const PACKS_TYPE: &str = "Packs";
/// Top of the price slider; a maximum at this value means no upper bound.
pub const PRICE_SLIDER_MAX: f64 = 500.0;

/// Case-insensitive search over name, external card id and subtype.
pub fn text_matches(card: &Card, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    [Some(card.name.as_str()), card.card_id.as_deref(), card.subtype.as_deref()]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
}

fn color_matches(card: &Card, filters: &FilterState) -> bool {
    match filters.active_set(FilterGroup::Color) {
        Some(colors) if card.color.is_some() => card.colors().any(|c| colors.contains(c)),
        _ => false,
    }
}

fn type_matches(card: &Card, filters: &FilterState) -> bool {
    match (filters.active_set(FilterGroup::Type), card.card_type.as_deref()) {
        (Some(types), Some(card_type)) => {
            types.contains(card_type)
                || (types.contains(PACKS_TYPE) && card_type == UNTYPED_CARD_TYPE)
        }
        _ => false,
    }
}

/// Color and type. Both active: the card must satisfy both. Otherwise either
/// one is enough, so with neither active nothing passes.
fn primary_matches(card: &Card, filters: &FilterState) -> bool {
    let color = color_matches(card, filters);
    let card_type = type_matches(card, filters);
    let both_active = filters.active_set(FilterGroup::Color).is_some()
        && filters.active_set(FilterGroup::Type).is_some();
    if both_active {
        color && card_type
    } else {
        color || card_type
    }
}

fn rarity_matches(card: &Card, filters: &FilterState) -> bool {
    match (filters.active_set(FilterGroup::Rarity), card.rarity.as_deref()) {
        (Some(rarities), Some(rarity)) => rarities.contains(rarity),
        _ => true,
    }
}

fn counter_matches(card: &Card, filters: &FilterState) -> bool {
    match filters.active_set(FilterGroup::Counter) {
        Some(counters) => {
            let key = card.counter.map(|c| c.to_string()).unwrap_or_default();
            counters.contains(&key)
        }
        None => true,
    }
}

fn power_matches(card: &Card, filters: &FilterState) -> bool {
    match filters.active_range(FilterGroup::Power) {
        Some((min, max)) => card
            .power
            .map(|p| (p as f64) >= min && (p as f64) <= max)
            .unwrap_or(false),
        None => true,
    }
}

fn price_matches(card: &Card, filters: &FilterState) -> bool {
    let Some((min, max)) = filters.active_range(FilterGroup::Price) else {
        return true;
    };
    match card.market_price {
        Some(price) if !price.is_nan() => {
            price >= min && (max == PRICE_SLIDER_MAX || price <= max)
        }
        _ => false,
    }
}

/// Whether `card` belongs in the browsing grid.
pub fn matches(card: &Card, search: &str, filters: &FilterState) -> bool {
    primary_matches(card, filters)
        && rarity_matches(card, filters)
        && counter_matches(card, filters)
        && power_matches(card, filters)
        && price_matches(card, filters)
        && text_matches(card, search)
}

fn color_key(card: &Card) -> String {
    card.color.as_deref().unwrap_or_default().to_lowercase()
}

fn cost_key(card: &Card) -> f64 {
    card.cost.map(|c| c as f64).unwrap_or(f64::INFINITY)
}

fn order_before_name(a: &Card, b: &Card) -> Ordering {
    color_key(a)
        .cmp(&color_key(b))
        .then_with(|| cost_key(a).total_cmp(&cost_key(b)))
}

/// Grid order: color, then cost (missing last), then name, all ascending.
///
/// Cards with equal names compare as `Greater` in both directions. This is
/// not a valid total order; [`display_order`] is the variant safe to sort with.
pub fn compare(a: &Card, b: &Card) -> Ordering {
    match order_before_name(a, b) {
        Ordering::Equal if a.name.to_lowercase() < b.name.to_lowercase() => Ordering::Less,
        Ordering::Equal => Ordering::Greater,
        other => other,
    }
}

/// [`compare`] with equal names treated as equal.
pub fn display_order(a: &Card, b: &Card) -> Ordering {
    order_before_name(a, b).then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
}

/// Cards passing the filters, in grid order. Ties keep catalog order.
pub fn filter_and_sort<'a>(cards: &'a [Card], search: &str, filters: &FilterState) -> Vec<&'a Card> {
    let mut shown: Vec<&Card> = cards.iter().filter(|c| matches(c, search, filters)).collect();
    shown.sort_by(|a, b| display_order(a, b));
    shown
}
