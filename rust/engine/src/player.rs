use crate::cards::Card;
use crate::errors::GameError;
use serde::{Deserialize, Serialize};

/// Opaque identity of a seated player, stable for the whole match.
pub type PlayerId = String;

/// One of the two seats at a heads-up table, in join order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    pub const BOTH: [Seat; 2] = [Seat::First, Seat::Second];

    pub fn index(self) -> usize {
        match self {
            Seat::First => 0,
            Seat::Second => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Seat> {
        match index {
            0 => Some(Seat::First),
            1 => Some(Seat::Second),
            _ => None,
        }
    }

    pub fn other(self) -> Seat {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }
}

/// Wire name of an action, as sent by clients and echoed in
/// `player_action` events.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Fold,
    Check,
    Call,
    Bet,
    Raise,
    AllIn,
}

/// Represents a player action during a betting round.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "amount", rename_all = "snake_case")]
pub enum PlayerAction {
    /// Fold and forfeit the hand
    Fold,
    /// Check (no bet, only valid if no bet to call)
    Check,
    /// Call the current bet, all-in for less if short
    Call,
    /// Open the betting for the given amount
    Bet(u32),
    /// Raise the current bet by the given increment
    Raise(u32),
    /// Bet all remaining chips
    AllIn,
}

impl PlayerAction {
    /// Builds an action from its wire kind and optional amount.
    ///
    /// Bets and raises without an amount are rejected; amounts on other
    /// kinds are ignored.
    pub fn from_parts(kind: ActionKind, amount: Option<u32>) -> Result<Self, GameError> {
        let missing = GameError::InvalidBetAmount {
            amount: 0,
            minimum: 1,
        };
        Ok(match kind {
            ActionKind::Fold => PlayerAction::Fold,
            ActionKind::Check => PlayerAction::Check,
            ActionKind::Call => PlayerAction::Call,
            ActionKind::Bet => PlayerAction::Bet(amount.ok_or(missing)?),
            ActionKind::Raise => PlayerAction::Raise(amount.ok_or(missing)?),
            ActionKind::AllIn => PlayerAction::AllIn,
        })
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            PlayerAction::Fold => ActionKind::Fold,
            PlayerAction::Check => ActionKind::Check,
            PlayerAction::Call => ActionKind::Call,
            PlayerAction::Bet(_) => ActionKind::Bet,
            PlayerAction::Raise(_) => ActionKind::Raise,
            PlayerAction::AllIn => ActionKind::AllIn,
        }
    }
}

/// A seated player: chip stack, private hole cards and per-hand betting
/// state. Owned exclusively by its session.
#[derive(Debug, Clone)]
pub struct Player {
    id: PlayerId,
    chips: u32,
    hole: Vec<Card>,
    /// Wagered in the current betting round
    current_bet: u32,
    /// Wagered across the whole hand
    total_bet: u32,
    has_acted: bool,
    is_active: bool,
    is_all_in: bool,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, chips: u32) -> Self {
        Self {
            id: id.into(),
            chips,
            hole: Vec::with_capacity(2),
            current_bet: 0,
            total_bet: 0,
            has_acted: false,
            is_active: true,
            is_all_in: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
    pub fn chips(&self) -> u32 {
        self.chips
    }
    pub fn hole_cards(&self) -> &[Card] {
        &self.hole
    }
    pub fn current_bet(&self) -> u32 {
        self.current_bet
    }
    pub fn total_bet(&self) -> u32 {
        self.total_bet
    }
    pub fn has_acted(&self) -> bool {
        self.has_acted
    }
    pub fn is_active(&self) -> bool {
        self.is_active
    }
    pub fn is_all_in(&self) -> bool {
        self.is_all_in
    }

    /// Still in the hand with chips behind.
    pub fn can_act(&self) -> bool {
        self.is_active && !self.is_all_in
    }

    pub fn give_card(&mut self, c: Card) -> Result<(), GameError> {
        if self.hole.len() >= 2 {
            return Err(GameError::HoleCardsFull(self.id.clone()));
        }
        self.hole.push(c);
        Ok(())
    }

    pub fn reset_for_hand(&mut self) {
        self.hole.clear();
        self.current_bet = 0;
        self.total_bet = 0;
        self.has_acted = false;
        self.is_active = true;
        self.is_all_in = false;
    }

    pub fn reset_for_round(&mut self) {
        self.current_bet = 0;
        self.has_acted = false;
    }

    /// Moves up to `amount` chips from the stack into the current bet and
    /// returns what was actually wagered. Emptying the stack puts the
    /// player all-in.
    pub fn place_bet(&mut self, amount: u32) -> u32 {
        let paid = amount.min(self.chips);
        self.chips -= paid;
        self.current_bet += paid;
        self.total_bet += paid;
        if self.chips == 0 {
            self.is_all_in = true;
        }
        paid
    }

    pub fn add_chips(&mut self, amount: u32) -> Result<(), GameError> {
        self.chips = self.chips.checked_add(amount).ok_or(GameError::ChipOverflow)?;
        Ok(())
    }

    pub fn mark_acted(&mut self) {
        self.has_acted = true;
    }

    pub fn fold(&mut self) {
        self.is_active = false;
        self.has_acted = true;
    }

    pub(crate) fn leave_hand(&mut self) {
        self.is_active = false;
    }

    pub(crate) fn forfeit_stack(&mut self) {
        self.chips = 0;
        self.is_active = false;
    }

    #[cfg(test)]
    pub(crate) fn set_chips(&mut self, chips: u32) {
        self.chips = chips;
    }

    #[cfg(test)]
    pub(crate) fn set_hole_cards(&mut self, cards: [Card; 2]) {
        self.hole = cards.to_vec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Rank, Suit};

    #[test]
    fn place_bet_caps_at_stack_and_flags_all_in() {
        let mut p = Player::new("alice", 40);
        let paid = p.place_bet(100);
        assert_eq!(paid, 40);
        assert_eq!(p.chips(), 0);
        assert_eq!(p.current_bet(), 40);
        assert_eq!(p.total_bet(), 40);
        assert!(p.is_all_in());
        assert!(!p.can_act());
    }

    #[test]
    fn round_reset_keeps_hand_totals() {
        let mut p = Player::new("bob", 1_000);
        p.place_bet(100);
        p.mark_acted();
        p.reset_for_round();
        assert_eq!(p.current_bet(), 0);
        assert_eq!(p.total_bet(), 100);
        assert!(!p.has_acted());
    }

    #[test]
    fn third_hole_card_is_refused() {
        let mut p = Player::new("carol", 1_000);
        let card = Card::new(Rank::Two, Suit::Clubs);
        p.give_card(card).expect("first");
        p.give_card(card).expect("second");
        assert_eq!(
            p.give_card(card),
            Err(GameError::HoleCardsFull("carol".into()))
        );
    }

    #[test]
    fn bet_and_raise_need_an_amount() {
        assert!(PlayerAction::from_parts(ActionKind::Bet, None).is_err());
        assert_eq!(
            PlayerAction::from_parts(ActionKind::Raise, Some(300)),
            Ok(PlayerAction::Raise(300))
        );
        assert_eq!(
            PlayerAction::from_parts(ActionKind::Check, Some(5)),
            Ok(PlayerAction::Check)
        );
    }

    #[test]
    fn seats_alternate() {
        assert_eq!(Seat::First.other(), Seat::Second);
        assert_eq!(Seat::Second.other().index(), 0);
        assert_eq!(Seat::from_index(2), None);
    }
}
