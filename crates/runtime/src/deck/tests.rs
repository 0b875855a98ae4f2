use std::collections::HashMap;

use super::*;
use crate::cards::Card;

fn character(id: i64, product_id: i64, cost: i64, rarity: &str, counter: Option<i64>, price: f64) -> Card {
    Card {
        id,
        product_id,
        name: format!("Character {}", id),
        color: Some("Red".to_string()),
        card_type: Some("Character".to_string()),
        cost: Some(cost),
        rarity: Some(rarity.to_string()),
        counter,
        market_price: Some(price),
        ..Default::default()
    }
}

fn leader(id: i64, price: f64) -> Card {
    Card {
        id,
        product_id: 1000 + id,
        name: format!("Leader {}", id),
        color: Some("Red/Green".to_string()),
        card_type: Some("Leader".to_string()),
        rarity: Some("L".to_string()),
        power: Some(5000),
        market_price: Some(price),
        ..Default::default()
    }
}

fn assert_maps_match_count(deck: &Deck) {
    let n = deck.non_leader_count() as u32;
    assert_eq!(deck.cost_map().total(), n, "cost map out of sync");
    assert_eq!(deck.rarity_map().total(), n, "rarity map out of sync");
    assert_eq!(deck.counter_map().total(), n, "counter map out of sync");
}

#[test]
fn test_add_character_updates_statistics() {
    let deck = Deck::default();
    let card = character(1, 100, 3, "SR", Some(1000), 12.50);

    let deck = deck.add_card(&card).unwrap();
    assert_eq!(deck.cards().len(), 1);
    assert_eq!(deck.total_price(), 12.5);
    assert_eq!(deck.cost_map().get("3"), 1);
    assert_eq!(deck.rarity_map().get("SR"), 1);
    assert_eq!(deck.counter_map().get("1000"), 1);
    assert_maps_match_count(&deck);
}

#[test]
fn test_don_rarity_is_normalized() {
    let mut don = character(5, 500, 0, "DON!!", None, 0.25);
    don.card_type = Some("DON!!".to_string());
    let deck = Deck::default().add_card(&don).unwrap();
    assert_eq!(deck.rarity_map().get("DON"), 1);
    assert_eq!(deck.rarity_map().get("DON!!"), 0);
    assert_eq!(deck.counter_map().get("0"), 1);
}

#[test]
fn test_fifth_copy_is_rejected() {
    let mut deck = Deck::default();
    for id in 1..=4 {
        deck = deck.add_card(&character(id, 100, 2, "C", None, 0.1)).unwrap();
    }
    let before = deck.clone();

    let result = deck.add_card(&character(5, 100, 2, "C", None, 0.1));
    assert!(matches!(result, Err(DeckRejection::CopyLimit { product_id: 100, .. })));
    assert_eq!(deck, before);
    assert_eq!(deck.cards().len(), 4);
    assert_eq!(deck.cost_map().get("2"), 4);
}

#[test]
fn test_leader_counts_toward_copy_limit() {
    let l = leader(1, 3.0);
    let mut deck = Deck::default().add_card(&l).unwrap();
    let mut same_product = character(2, l.product_id, 1, "C", None, 0.5);
    for id in 2..=4 {
        same_product.id = id;
        deck = deck.add_card(&same_product).unwrap();
    }
    same_product.id = 5;
    assert!(deck.add_card(&same_product).is_err());
    assert_eq!(deck.copies_of(l.product_id), 4);
}

#[test]
fn test_leader_is_prepended_and_excluded_from_maps() {
    let deck = Deck::default()
        .add_card(&character(1, 100, 3, "SR", None, 2.0))
        .unwrap()
        .add_card(&leader(9, 5.25))
        .unwrap();

    assert_eq!(deck.cards()[0].id, 9);
    assert_eq!(deck.leader().map(|l| l.id), Some(9));
    assert_eq!(deck.total_price(), 7.25);
    assert_eq!(deck.non_leader_count(), 1);
    assert_eq!(deck.rarity_map().get("L"), 0);
    assert_maps_match_count(&deck);
}

#[test]
fn test_second_leader_is_rejected() {
    let deck = Deck::default().add_card(&leader(1, 1.0)).unwrap();
    let result = deck.add_card(&leader(2, 1.0));
    assert!(matches!(result, Err(DeckRejection::DuplicateLeader { .. })));
    assert_eq!(deck.cards().iter().filter(|c| c.is_leader()).count(), 1);
}

#[test]
fn test_add_then_remove_restores_statistics() {
    let base = Deck::default()
        .add_card(&leader(1, 4.4))
        .unwrap()
        .add_card(&character(2, 200, 5, "R", Some(2000), 1.15))
        .unwrap();
    let card = character(3, 300, 7, "SEC", Some(1000), 33.33);

    let restored = base.add_card(&card).unwrap().remove_card(&card);
    assert_eq!(restored.total_price(), base.total_price());
    assert_eq!(restored.cost_map(), base.cost_map());
    assert_eq!(restored.rarity_map(), base.rarity_map());
    assert_eq!(restored.counter_map(), base.counter_map());
    assert_eq!(restored.cards(), base.cards());
}

#[test]
fn test_remove_takes_most_recent_copy() {
    let mut first = character(7, 700, 1, "C", None, 1.0);
    first.name = "first".to_string();
    let other = character(8, 800, 2, "UC", None, 2.0);
    let mut second = first.clone();
    second.name = "second".to_string();

    let deck = Deck::default()
        .add_card(&first)
        .unwrap()
        .add_card(&other)
        .unwrap()
        .add_card(&second)
        .unwrap();

    let deck = deck.remove_card(&first);
    let names: Vec<_> = deck.cards().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["first", "Character 8"]);
}

#[test]
fn test_remove_missing_card_is_noop() {
    let deck = Deck::default().add_card(&character(1, 100, 1, "C", None, 1.0)).unwrap();
    let after = deck.remove_card(&character(99, 990, 1, "C", None, 1.0));
    assert_eq!(after, deck);
}

#[test]
fn test_remove_leader_clears_slot() {
    let l = leader(1, 6.0);
    let deck = Deck::default()
        .add_card(&l)
        .unwrap()
        .add_card(&character(2, 200, 4, "R", None, 1.0))
        .unwrap();
    let cost_before = deck.cost_map().clone();

    let deck = deck.remove_card(&l);
    assert!(deck.leader().is_none());
    assert_eq!(deck.total_price(), 1.0);
    assert_eq!(deck.cost_map(), &cost_before);
    assert_eq!(deck.cards().len(), 1);
}

#[test]
fn test_remove_subtracts_the_stored_price() {
    let mut card = character(1, 100, 1, "C", None, 2.0);
    let deck = Deck::default().add_card(&card).unwrap();
    // the caller's copy is stale; the deck's refreshed copy decides
    card.market_price = Some(50.0);
    let deck = Deck::load(deck.to_record(), Some(&HashMap::from([(1, 0.5)])));
    assert_eq!(deck.total_price(), 0.5);
    let deck = deck.remove_card(&card);
    assert_eq!(deck.total_price(), 0.0);
}

#[test]
fn test_previous_snapshot_is_untouched() {
    let before = Deck::default().add_card(&character(1, 100, 3, "C", None, 1.0)).unwrap();
    let before_costs = before.cost_map().clone();
    let after = before.add_card(&character(2, 200, 3, "C", None, 1.0)).unwrap();

    assert_eq!(before.cost_map(), &before_costs);
    assert_eq!(before.cards().len(), 1);
    assert_eq!(after.cost_map().get("3"), 2);
}

#[test]
fn test_rename_only_changes_name() {
    let deck = Deck::default().add_card(&character(1, 100, 3, "C", None, 1.0)).unwrap();
    let renamed = deck.renamed("Red Rush");
    assert_eq!(renamed.name(), "Red Rush");
    assert_eq!(renamed.cards(), deck.cards());
    assert_eq!(renamed.total_price(), deck.total_price());
}

#[test]
fn test_clear_resets_to_templates() {
    let mut deck = Deck::default().renamed("Keep me").add_card(&leader(1, 3.0)).unwrap();
    for id in 2..=6 {
        deck = deck.add_card(&character(id, id * 10, id, "UC", Some(1000), 1.5)).unwrap();
    }

    let cleared = deck.cleared();
    assert!(cleared.cards().is_empty());
    assert!(cleared.leader().is_none());
    assert_eq!(cleared.total_price(), 0.0);
    assert_eq!(cleared.cost_map(), &FrequencyMap::cost());
    assert_eq!(cleared.rarity_map(), &FrequencyMap::rarity());
    assert_eq!(cleared.counter_map(), &FrequencyMap::counter());
    assert_eq!(cleared.name(), "Keep me");
}

#[test]
fn test_load_ignores_embedded_statistics_and_refreshes_prices() {
    let l = leader(1, 2.0);
    let record = DeckRecord {
        id: "abc".to_string(),
        user: "7".to_string(),
        name: "Loaded".to_string(),
        leader: Some(l.clone()),
        cards: vec![
            l.clone(),
            character(2, 200, 10, "SR", Some(2000), 3.0),
            character(3, 300, 11, "PR", None, 1.0),
        ],
    };
    let prices = HashMap::from([(1, 2.5), (2, 4.0)]);

    let deck = Deck::load(record, Some(&prices));
    assert_eq!(deck.id(), "abc");
    assert_eq!(deck.user(), "7");
    assert_eq!(deck.total_price(), 7.5);
    assert_eq!(deck.leader().and_then(|l| l.market_price), Some(2.5));
    assert_eq!(deck.cards()[1].market_price, Some(4.0));
    assert_eq!(deck.cost_map().get("10"), 1);
    assert_eq!(deck.cost_map().get("11"), 1);
    assert!(deck.cost_map().covers(&COST_BUCKETS));
    assert_eq!(deck.rarity_map().get("L"), 0);
    assert_maps_match_count(&deck);
}

#[test]
fn test_load_prepends_missing_leader() {
    let record = DeckRecord {
        leader: Some(leader(1, 1.0)),
        cards: vec![character(2, 200, 1, "C", None, 1.0)],
        ..Default::default()
    };
    let deck = Deck::load(record, None);
    assert_eq!(deck.cards().len(), 2);
    assert_eq!(deck.cards()[0].id, 1);
    assert_eq!(deck.non_leader_count(), 1);
    assert_eq!(deck.total_price(), 2.0);
}

#[test]
fn test_load_adopts_leader_from_card_list() {
    let record = DeckRecord {
        leader: None,
        cards: vec![character(2, 200, 1, "C", None, 1.0), leader(1, 1.0), leader(3, 1.0)],
        ..Default::default()
    };
    let deck = Deck::load(record, None);
    assert_eq!(deck.leader().map(|l| l.id), Some(1));
    assert_eq!(deck.cards().iter().filter(|c| c.is_leader()).count(), 1);
    assert_eq!(deck.rarity_map().get("L"), 0);
    assert_maps_match_count(&deck);

    assert!(matches!(
        deck.add_card(&leader(4, 1.0)),
        Err(DeckRejection::DuplicateLeader { .. })
    ));

    let deck = deck.remove_card(&leader(1, 1.0));
    assert!(deck.leader().is_none());
    assert_eq!(deck.total_price(), 1.0);
    assert_maps_match_count(&deck);
}

#[test]
fn test_load_rejects_non_leader_in_leader_slot() {
    let imposter = character(2, 200, 1, "C", None, 1.0);
    let record = DeckRecord {
        leader: Some(imposter.clone()),
        cards: vec![imposter.clone()],
        ..Default::default()
    };
    let deck = Deck::load(record, None);
    assert!(deck.leader().is_none());
    assert_eq!(deck.non_leader_count(), 1);
    assert_eq!(deck.cost_map().get("1"), 1);

    let deck = deck.remove_card(&imposter);
    assert!(deck.cards().is_empty());
    assert_eq!(deck.cost_map().total(), 0);
    assert!(deck.add_card(&leader(1, 1.0)).is_ok());
}

#[test]
fn test_incremental_agrees_with_recompute() {
    let cards = vec![
        leader(1, 1.99),
        character(2, 200, 2, "C", Some(1000), 0.15),
        character(3, 300, 3, "UC", None, 0.35),
        character(2, 200, 2, "C", Some(1000), 0.15),
        character(4, 400, 12, "TR", Some(2000), 19.99),
        character(5, 500, 6, "SEC", None, 120.0),
    ];

    let mut deck = Deck::default();
    for (step, card) in cards.iter().enumerate() {
        deck = deck.add_card(card).unwrap();
        assert!(deck.agrees_with(&deck.recomputed()), "diverged after add {}", step);
        assert_maps_match_count(&deck);
    }
    for card in cards.iter().rev().step_by(2) {
        deck = deck.remove_card(card);
        assert!(deck.agrees_with(&deck.recomputed()), "diverged after removing {}", card.id);
        assert_maps_match_count(&deck);
    }
}

#[test]
fn test_save_payload_uses_ids() {
    let deck = Deck::default()
        .add_card(&character(2, 200, 2, "C", None, 1.0))
        .unwrap()
        .add_card(&leader(1, 1.0))
        .unwrap();
    let payload = deck.save_payload();
    assert_eq!(payload.name, DEFAULT_DECK_NAME);
    assert_eq!(payload.leader, Some(1));
    assert_eq!(payload.cards, vec![1, 2]);
}
