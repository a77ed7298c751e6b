use holdem_engine::cards::{Card, Rank as R, Suit as S};
use holdem_engine::errors::GameError;
use holdem_engine::hand::{compare_hands, evaluate_hand, Category};

fn c(s: S, r: R) -> Card {
    Card::new(r, s)
}

#[test]
fn detects_royal_flush() {
    let cards = [
        c(S::Hearts, R::Ten),
        c(S::Hearts, R::Jack),
        c(S::Hearts, R::Queen),
        c(S::Hearts, R::King),
        c(S::Hearts, R::Ace),
        c(S::Clubs, R::Two),
        c(S::Diamonds, R::Three),
    ];
    let hv = evaluate_hand(&cards).unwrap();
    assert_eq!(hv.category, Category::RoyalFlush);
}

#[test]
fn royal_flush_beats_nine_high_straight_flush() {
    let royal = [
        c(S::Spades, R::Ace),
        c(S::Spades, R::King),
        c(S::Spades, R::Queen),
        c(S::Spades, R::Jack),
        c(S::Spades, R::Ten),
    ];
    let nine_high = [
        c(S::Hearts, R::Nine),
        c(S::Hearts, R::Eight),
        c(S::Hearts, R::Seven),
        c(S::Hearts, R::Six),
        c(S::Hearts, R::Five),
    ];
    let a = evaluate_hand(&royal).unwrap();
    let b = evaluate_hand(&nine_high).unwrap();
    assert_eq!(b.category, Category::StraightFlush);
    assert_eq!(b.kickers, vec![9]);
    assert!(compare_hands(&a, &b).is_gt());
}

#[test]
fn wheel_is_five_high_and_loses_to_six_high() {
    let wheel = [
        c(S::Clubs, R::Ace),
        c(S::Diamonds, R::Two),
        c(S::Hearts, R::Three),
        c(S::Spades, R::Four),
        c(S::Clubs, R::Five),
    ];
    let six_high = [
        c(S::Clubs, R::Two),
        c(S::Diamonds, R::Three),
        c(S::Hearts, R::Four),
        c(S::Spades, R::Five),
        c(S::Clubs, R::Six),
    ];
    let a = evaluate_hand(&wheel).unwrap();
    let b = evaluate_hand(&six_high).unwrap();
    assert_eq!(a.category, Category::Straight);
    assert_eq!(a.kickers, vec![5]);
    assert!(compare_hands(&a, &b).is_lt());
}

#[test]
fn category_ordering_is_correct() {
    let quads = [
        c(S::Clubs, R::Ace),
        c(S::Diamonds, R::Ace),
        c(S::Hearts, R::Ace),
        c(S::Spades, R::Ace),
        c(S::Clubs, R::King),
        c(S::Diamonds, R::Queen),
        c(S::Hearts, R::Two),
    ];
    let full_house = [
        c(S::Clubs, R::King),
        c(S::Diamonds, R::King),
        c(S::Hearts, R::King),
        c(S::Clubs, R::Queen),
        c(S::Diamonds, R::Queen),
        c(S::Hearts, R::Two),
        c(S::Spades, R::Three),
    ];
    let a = evaluate_hand(&quads).unwrap();
    let b = evaluate_hand(&full_house).unwrap();
    assert_eq!(a.kickers, vec![14, 13]);
    assert_eq!(b.kickers, vec![13, 12]);
    assert!(compare_hands(&a, &b).is_gt());
}

#[test]
fn straight_beats_three_of_a_kind() {
    let straight = [
        c(S::Clubs, R::Five),
        c(S::Hearts, R::Six),
        c(S::Clubs, R::Seven),
        c(S::Hearts, R::Eight),
        c(S::Diamonds, R::Nine),
        c(S::Spades, R::Two),
        c(S::Clubs, R::Three),
    ];
    let trips = [
        c(S::Clubs, R::Queen),
        c(S::Hearts, R::Queen),
        c(S::Spades, R::Queen),
        c(S::Hearts, R::Eight),
        c(S::Diamonds, R::Four),
        c(S::Spades, R::Two),
        c(S::Clubs, R::Three),
    ];
    let a = evaluate_hand(&straight).unwrap();
    let b = evaluate_hand(&trips).unwrap();
    assert_eq!(b.category, Category::ThreeOfAKind);
    assert_eq!(b.kickers, vec![12, 8, 4]);
    assert!(compare_hands(&a, &b).is_gt());
}

#[test]
fn one_pair_kickers_break_ties() {
    let board = [
        c(S::Clubs, R::Nine),
        c(S::Hearts, R::Nine),
        c(S::Spades, R::Four),
        c(S::Diamonds, R::Seven),
        c(S::Clubs, R::Two),
    ];
    let with = |a: Card, b: Card| {
        let mut cards = board.to_vec();
        cards.extend([a, b]);
        evaluate_hand(&cards).unwrap()
    };
    let ace_kicker = with(c(S::Hearts, R::Ace), c(S::Spades, R::Three));
    let king_kicker = with(c(S::Hearts, R::King), c(S::Spades, R::Three));
    assert_eq!(ace_kicker.category, Category::OnePair);
    assert_eq!(ace_kicker.kickers, vec![9, 14, 7, 4]);
    assert!(compare_hands(&ace_kicker, &king_kicker).is_gt());
}

#[test]
fn identical_boards_play_as_a_tie() {
    let board = [
        c(S::Spades, R::Ace),
        c(S::Spades, R::King),
        c(S::Hearts, R::Queen),
        c(S::Diamonds, R::Jack),
        c(S::Clubs, R::Ten),
    ];
    let mut a = board.to_vec();
    a.extend([c(S::Clubs, R::Two), c(S::Diamonds, R::Three)]);
    let mut b = board.to_vec();
    b.extend([c(S::Hearts, R::Two), c(S::Hearts, R::Four)]);
    let va = evaluate_hand(&a).unwrap();
    let vb = evaluate_hand(&b).unwrap();
    assert!(compare_hands(&va, &vb).is_eq());
}

#[test]
fn rejects_too_few_and_too_many_cards() {
    let cards = [c(S::Clubs, R::Two); 8];
    assert_eq!(
        evaluate_hand(&cards[..4]),
        Err(GameError::InvalidCardCount(4))
    );
    assert_eq!(evaluate_hand(&cards), Err(GameError::InvalidCardCount(8)));
}
