use std::collections::BTreeSet;

use bounty_runtime::{
    Card, Deck, FilterGroup, FilterState, FrequencyMap, PACKS_TYPE, UNTYPED_CARD_TYPE,
};

pub fn card_line(card: &Card) -> String {
    let cost = card.cost.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string());
    format!(
        "{} [{}] {} {} cost {} ${:.2}",
        card.name,
        card.card_id.as_deref().unwrap_or("?"),
        card.color.as_deref().unwrap_or("-"),
        card.card_type.as_deref().unwrap_or("-"),
        cost,
        card.price(),
    )
}

/// Values a set filter can take, drawn from the catalog.
pub fn filter_options(cards: &[Card], group: FilterGroup) -> Vec<String> {
    let mut options = BTreeSet::new();
    for card in cards {
        match group {
            FilterGroup::Color => options.extend(card.colors().filter(|c| !c.is_empty()).map(str::to_string)),
            FilterGroup::Type => {
                if let Some(card_type) = card.card_type.as_deref() {
                    let option = if card_type == UNTYPED_CARD_TYPE { PACKS_TYPE } else { card_type };
                    options.insert(option.to_string());
                }
            }
            FilterGroup::Rarity => options.extend(card.rarity.clone()),
            FilterGroup::Counter => {
                options.insert(card.counter.map(|c| c.to_string()).unwrap_or_default());
            }
            FilterGroup::Power | FilterGroup::Price => {}
        }
    }
    options.into_iter().collect()
}

pub fn option_label(filters: &FilterState, group: FilterGroup, option: &str) -> String {
    let checked = filters.active_set(group).is_some_and(|s| s.contains(option));
    let name = if option.is_empty() { "(none)" } else { option };
    format!("[{}] {}", if checked { "x" } else { " " }, name)
}

/// Parses "min max" (or "min-max") into a range.
pub fn parse_range(input: &str) -> Option<(f64, f64)> {
    let parts: Vec<f64> = input
        .split(|c: char| c.is_whitespace() || c == '-' || c == ',')
        .filter(|p| !p.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [min, max] if min <= max => Some((*min, *max)),
        _ => None,
    }
}

pub fn curve(title: &str, map: &FrequencyMap) -> String {
    let mut out = format!("{}\n", title);
    for (key, count) in map.iter() {
        out.push_str(&format!("  {:>5} | {:<3} {}\n", key, count, "#".repeat(count as usize)));
    }
    out
}

pub fn deck_summary(deck: &Deck) -> String {
    let mut out = format!(
        "{} {}\n",
        deck.name(),
        if deck.is_saved() { format!("(#{})", deck.id()) } else { "(unsaved)".to_string() }
    );
    match deck.leader() {
        Some(leader) => out.push_str(&format!("Leader: {}\n", card_line(leader))),
        None => out.push_str("Leader: none\n"),
    }
    out.push_str(&format!(
        "{} cards, ${:.2}\n",
        deck.non_leader_count(),
        deck.total_price()
    ));
    for (card, copies) in grouped(deck.cards()) {
        if card.is_leader() {
            continue;
        }
        out.push_str(&format!("  {}x {}\n", copies, card_line(card)));
    }
    out
}

/// Distinct cards in first-seen order, with their copy counts.
pub fn grouped(cards: &[Card]) -> Vec<(&Card, usize)> {
    let mut groups: Vec<(&Card, usize)> = Vec::new();
    for card in cards {
        match groups.iter_mut().find(|(c, _)| c.id == card.id) {
            Some((_, copies)) => *copies += 1,
            None => groups.push((card, 1)),
        }
    }
    groups
}
