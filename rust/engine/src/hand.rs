use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::errors::GameError;

/// Hand categories, weakest first. Royal flush is kept apart from the
/// straight flush so it reports as its own category.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    HighCard = 1,
    OnePair = 2,
    TwoPair = 3,
    ThreeOfAKind = 4,
    Straight = 5,
    Flush = 6,
    FullHouse = 7,
    FourOfAKind = 8,
    StraightFlush = 9,
    RoyalFlush = 10,
}

/// Comparable strength of a best-five-card hand.
///
/// Ordering is by category, then lexicographically by kickers. Kicker lists
/// within one category always have the same length.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct HandValue {
    pub category: Category,
    // kickers: ordered high -> low for tiebreaks
    pub kickers: Vec<u8>,
}

/// Evaluates the best five-card hand that can be formed from 5 to 7 cards.
///
/// Every five-card subset is scored and the strongest one wins, so seven
/// cards cost 21 scorings.
///
/// # Errors
///
/// Returns [`GameError::InvalidCardCount`] when fewer than 5 or more than 7
/// cards are supplied.
///
/// # Examples
///
/// ```
/// use holdem_engine::cards::{Card, Rank, Suit};
/// use holdem_engine::hand::{evaluate_hand, Category};
///
/// let cards = [
///     Card::new(Rank::Ace, Suit::Spades),
///     Card::new(Rank::King, Suit::Spades),
///     Card::new(Rank::Queen, Suit::Spades),
///     Card::new(Rank::Jack, Suit::Spades),
///     Card::new(Rank::Ten, Suit::Spades),
///     Card::new(Rank::Two, Suit::Clubs),
///     Card::new(Rank::Three, Suit::Diamonds),
/// ];
/// let value = evaluate_hand(&cards).unwrap();
/// assert_eq!(value.category, Category::RoyalFlush);
/// ```
pub fn evaluate_hand(cards: &[Card]) -> Result<HandValue, GameError> {
    let n = cards.len();
    if !(5..=7).contains(&n) {
        return Err(GameError::InvalidCardCount(n));
    }

    let mut best: Option<HandValue> = None;
    for mask in 0u32..(1 << n) {
        if mask.count_ones() != 5 {
            continue;
        }
        let mut five = [cards[0]; 5];
        let mut slot = 0;
        for (i, &card) in cards.iter().enumerate() {
            if mask & (1 << i) != 0 {
                five[slot] = card;
                slot += 1;
            }
        }
        let value = score_five(&five);
        if best.as_ref().is_none_or(|b| value > *b) {
            best = Some(value);
        }
    }
    best.ok_or(GameError::InvalidCardCount(n))
}

/// Scores exactly five cards.
pub fn score_five(cards: &[Card; 5]) -> HandValue {
    let mut rank_counts = [0u8; 15]; // 2..14 used
    for c in cards {
        rank_counts[c.rank.value() as usize] += 1;
    }

    let is_flush = cards.iter().all(|c| c.suit == cards[0].suit);
    let straight_high = detect_straight_high(&rank_counts);

    // (count, rank) sorted by count then rank, both descending. Reading the
    // ranks off in this order yields the kicker list for every
    // multiple-based category.
    let mut groups: Vec<(u8, u8)> = (2..=14u8)
        .rev()
        .filter(|&r| rank_counts[r as usize] > 0)
        .map(|r| (rank_counts[r as usize], r))
        .collect();
    groups.sort_by(|a, b| b.cmp(a));
    let by_group: Vec<u8> = groups.iter().map(|&(_, r)| r).collect();

    let mut descending: Vec<u8> = cards.iter().map(|c| c.rank.value()).collect();
    descending.sort_unstable_by(|a, b| b.cmp(a));

    let (category, kickers) = match (is_flush, straight_high, groups[0].0, groups.get(1)) {
        (true, Some(14), _, _) => (Category::RoyalFlush, vec![14]),
        (true, Some(high), _, _) => (Category::StraightFlush, vec![high]),
        (_, _, 4, _) => (Category::FourOfAKind, by_group),
        (_, _, 3, Some(&(2, _))) => (Category::FullHouse, by_group),
        (true, None, _, _) => (Category::Flush, descending),
        (false, Some(high), _, _) => (Category::Straight, vec![high]),
        (_, _, 3, _) => (Category::ThreeOfAKind, by_group),
        (_, _, 2, Some(&(2, _))) => (Category::TwoPair, by_group),
        (_, _, 2, _) => (Category::OnePair, by_group),
        _ => (Category::HighCard, descending),
    };

    HandValue { category, kickers }
}

pub fn compare_hands(a: &HandValue, b: &HandValue) -> Ordering {
    match a.category.cmp(&b.category) {
        Ordering::Equal => a.kickers.cmp(&b.kickers),
        ord => ord,
    }
}

/// High card of a five-distinct-rank run, or 5 for the wheel (A-2-3-4-5).
fn detect_straight_high(rank_counts: &[u8; 15]) -> Option<u8> {
    let present: Vec<u8> = (2..=14u8)
        .filter(|&r| rank_counts[r as usize] > 0)
        .collect();
    if present.len() != 5 {
        return None;
    }
    if present[4] - present[0] == 4 {
        return Some(present[4]);
    }
    if present == [2, 3, 4, 5, 14] {
        return Some(5);
    }
    None
}
