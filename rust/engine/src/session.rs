use std::cmp::Ordering;

use tracing::{debug, info};

use crate::cards::Card;
use crate::config::{FirstToAct, TableConfig};
use crate::deck::Deck;
use crate::errors::GameError;
use crate::events::{
    GameEvent, GameStateView, MatchState, Outbound, Phase, PlayerView, Recipient, ShowdownHand,
};
use crate::hand::{compare_hands, evaluate_hand, HandValue};
use crate::player::{ActionKind, Player, PlayerAction, PlayerId, Seat};
use crate::rules::{validate_action, BettingContext, ValidatedAction};

/// Human-entered code identifying a session.
pub type GameCode = String;

/// One deal: deck, board, pot and whose turn it is.
#[derive(Debug)]
pub struct Hand {
    number: u32,
    deck: Deck,
    community: Vec<Card>,
    pot: u32,
    phase: Phase,
    dealer: Seat,
    current: Option<Seat>,
    last_raise: u32,
}

impl Hand {
    pub fn number(&self) -> u32 {
        self.number
    }
    pub fn community_cards(&self) -> &[Card] {
        &self.community
    }
    pub fn pot(&self) -> u32 {
        self.pot
    }
    pub fn phase(&self) -> Phase {
        self.phase
    }
    pub fn dealer(&self) -> Seat {
        self.dealer
    }
    pub fn current_player(&self) -> Option<Seat> {
        self.current
    }
    pub fn last_raise(&self) -> u32 {
        self.last_raise
    }
    pub fn deck_remaining(&self) -> usize {
        self.deck.remaining()
    }
}

#[derive(Debug, Default)]
struct Events(Vec<Outbound>);

impl Events {
    fn broadcast(&mut self, event: GameEvent) {
        self.0.push(Outbound {
            recipient: Recipient::All,
            event,
        });
    }

    fn private(&mut self, player_id: &str, event: GameEvent) {
        self.0.push(Outbound {
            recipient: Recipient::Player(player_id.to_string()),
            event,
        });
    }

    fn into_vec(self) -> Vec<Outbound> {
        self.0
    }
}

/// A heads-up match between the two players seated under one game code.
///
/// The session is the only mutator of its state. Every operation either
/// applies completely and returns the events it produced, or fails with a
/// [`GameError`] and leaves the state untouched.
#[derive(Debug)]
pub struct Session {
    code: GameCode,
    config: TableConfig,
    /// Seat order is join order
    players: Vec<Player>,
    hand: Option<Hand>,
    state: MatchState,
    hands_played: u32,
    seed: Option<u64>,
}

impl Session {
    pub fn new(code: impl Into<GameCode>, config: TableConfig) -> Self {
        Self {
            code: code.into(),
            config,
            players: Vec::with_capacity(2),
            hand: None,
            state: MatchState::Waiting,
            hands_played: 0,
            seed: None,
        }
    }

    /// Session whose decks are derived from `seed`, for reproducible matches.
    pub fn with_seed(code: impl Into<GameCode>, config: TableConfig, seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::new(code, config)
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }
    pub fn config(&self) -> &TableConfig {
        &self.config
    }
    pub fn state(&self) -> MatchState {
        self.state
    }
    pub fn players(&self) -> &[Player] {
        &self.players
    }
    pub fn hand(&self) -> Option<&Hand> {
        self.hand.as_ref()
    }
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id() == player_id)
    }

    fn seat_of(&self, player_id: &str) -> Result<Seat, GameError> {
        self.players
            .iter()
            .position(|p| p.id() == player_id)
            .and_then(Seat::from_index)
            .ok_or_else(|| GameError::UnknownPlayer(player_id.to_string()))
    }

    /// Seats a player. The second arrival starts the match and deals the
    /// first hand.
    pub fn join(&mut self, player_id: impl Into<PlayerId>) -> Result<Vec<Outbound>, GameError> {
        let player_id = player_id.into();
        if self.state == MatchState::GameOver {
            return Err(GameError::MatchNotInProgress);
        }
        if self.player(&player_id).is_some() {
            return Err(GameError::DuplicatePlayer(player_id));
        }
        if self.players.len() >= 2 {
            return Err(GameError::SessionFull);
        }

        info!(game_code = %self.code, player_id = %player_id, "player seated");
        self.players
            .push(Player::new(player_id.clone(), self.config.starting_stack));

        let mut out = Events::default();
        out.broadcast(GameEvent::PlayerJoined { player_id });
        if self.players.len() == 2 {
            self.state = MatchState::InGame;
            info!(game_code = %self.code, "match started");
            self.start_new_hand(&mut out)?;
        }
        Ok(out.into_vec())
    }

    /// Applies a betting action for the player whose turn it is.
    ///
    /// # Errors
    ///
    /// Fails without touching any state when the match is not running, the
    /// player is unknown, it is not their turn, they already folded, or the
    /// action breaks a sizing rule (see [`validate_action`]).
    pub fn act(
        &mut self,
        player_id: &str,
        action: PlayerAction,
    ) -> Result<Vec<Outbound>, GameError> {
        if self.state != MatchState::InGame {
            return Err(GameError::MatchNotInProgress);
        }
        let seat = self.seat_of(player_id)?;
        let hand = self.hand.as_ref().ok_or(GameError::NoHandInProgress)?;
        if hand.current != Some(seat) {
            return Err(GameError::NotPlayersTurn(player_id.to_string()));
        }
        let player = &self.players[seat.index()];
        if !player.is_active() {
            return Err(GameError::PlayerAlreadyFolded(player_id.to_string()));
        }
        let ctx = BettingContext {
            stack: player.chips(),
            to_call: self.to_call(seat),
            min_raise: hand.last_raise,
        };
        let validated = validate_action(ctx, action)?;

        debug!(
            game_code = %self.code,
            hand_number = hand.number,
            player_id = %player_id,
            action = ?validated,
            "applying action"
        );

        let (kind, amount) = match validated {
            ValidatedAction::Fold => {
                self.players[seat.index()].fold();
                (ActionKind::Fold, None)
            }
            ValidatedAction::Check => (ActionKind::Check, None),
            ValidatedAction::Call(chips) => (ActionKind::Call, Some(self.wager(seat, chips)?)),
            ValidatedAction::Bet(chips) => {
                let paid = self.wager(seat, chips)?;
                self.set_last_raise(chips)?;
                (ActionKind::Bet, Some(paid))
            }
            ValidatedAction::Raise { by, total } => {
                self.wager(seat, total)?;
                self.set_last_raise(by)?;
                (ActionKind::Raise, Some(by))
            }
            ValidatedAction::AllIn(chips) => (ActionKind::AllIn, Some(self.wager(seat, chips)?)),
        };
        self.players[seat.index()].mark_acted();

        let mut out = Events::default();
        out.broadcast(GameEvent::PlayerAction {
            player_id: player_id.to_string(),
            action: kind,
            amount,
        });

        if kind == ActionKind::Fold {
            self.award_to_last_standing(&mut out)?;
            self.end_hand(&mut out)?;
        } else {
            self.advance(&mut out)?;
        }
        Ok(out.into_vec())
    }

    /// Forfeits the match: the player's stack is zeroed, the opponent takes
    /// the pot of the hand in progress and the match ends.
    pub fn resign(&mut self, player_id: &str) -> Result<Vec<Outbound>, GameError> {
        if self.state != MatchState::InGame {
            return Err(GameError::MatchNotInProgress);
        }
        let seat = self.seat_of(player_id)?;
        info!(game_code = %self.code, player_id = %player_id, "player resigned");

        let mut out = Events::default();
        self.players[seat.index()].forfeit_stack();
        self.award_to_last_standing(&mut out)?;
        self.end_hand(&mut out)?;
        Ok(out.into_vec())
    }

    /// Removes a player. Mid-match this folds their hand, hands the pot to
    /// the opponent and ends the match.
    pub fn disconnect(&mut self, player_id: &str) -> Result<Vec<Outbound>, GameError> {
        let seat = self.seat_of(player_id)?;
        info!(game_code = %self.code, player_id = %player_id, "player left");

        let mut out = Events::default();
        let in_game = self.state == MatchState::InGame;
        if in_game {
            self.players[seat.index()].leave_hand();
            self.award_to_last_standing(&mut out)?;
        }
        self.players.remove(seat.index());
        if in_game {
            self.end_hand(&mut out)?;
        }
        Ok(out.into_vec())
    }

    /// Public table state. Never contains hole cards.
    pub fn snapshot(&self) -> GameStateView {
        let hand = self.hand.as_ref();
        GameStateView {
            game_code: self.code.clone(),
            match_state: self.state,
            hand_number: hand.map(|h| h.number),
            phase: hand.map(|h| h.phase),
            pot: hand.map_or(0, |h| h.pot),
            community_cards: hand.map(|h| h.community.clone()).unwrap_or_default(),
            current_player: hand.and_then(|h| h.current).map(Seat::index),
            dealer_index: hand.map(|h| h.dealer.index()),
            players: self
                .players
                .iter()
                .map(|p| PlayerView {
                    id: p.id().to_string(),
                    chips: p.chips(),
                    current_bet: p.current_bet(),
                    is_active: p.is_active(),
                    is_all_in: p.is_all_in(),
                })
                .collect(),
            small_blind: self.config.small_blind,
            big_blind: self.config.big_blind,
        }
    }

    fn start_new_hand(&mut self, out: &mut Events) -> Result<(), GameError> {
        if self.players.len() != 2 {
            return Err(GameError::MatchNotInProgress);
        }
        self.hands_played += 1;
        let number = self.hands_played;
        let dealer = self.hand.as_ref().map_or(Seat::First, |h| h.dealer.other());
        let mut deck = match self.seed {
            Some(seed) => Deck::new_with_seed(seed.wrapping_add(u64::from(number))),
            None => Deck::new(),
        };
        deck.shuffle();
        for p in &mut self.players {
            p.reset_for_hand();
        }

        let TableConfig {
            small_blind,
            big_blind,
            ..
        } = self.config;
        self.hand = Some(Hand {
            number,
            deck,
            community: Vec::with_capacity(5),
            pot: 0,
            phase: Phase::Preflop,
            dealer,
            current: None,
            last_raise: big_blind,
        });
        info!(
            game_code = %self.code,
            hand_number = number,
            dealer_index = dealer.index(),
            "new hand"
        );
        out.broadcast(GameEvent::NewHand {
            hand_number: number,
            dealer_index: dealer.index(),
            small_blind,
            big_blind,
        });

        self.wager(dealer, small_blind)?;
        self.wager(dealer.other(), big_blind)?;

        for _ in 0..2 {
            for seat in [dealer, dealer.other()] {
                let hand = self.hand.as_mut().ok_or(GameError::NoHandInProgress)?;
                let card = hand.deck.draw()?;
                self.players[seat.index()].give_card(card)?;
            }
        }
        for p in &self.players {
            out.private(
                p.id(),
                GameEvent::HoleCardsDealt {
                    player_id: p.id().to_string(),
                    cards: p.hole_cards().to_vec(),
                },
            );
        }

        self.begin_round(out)
    }

    /// Moves chips from a seat into the pot, capped at the seat's stack.
    fn wager(&mut self, seat: Seat, amount: u32) -> Result<u32, GameError> {
        let hand = self.hand.as_mut().ok_or(GameError::NoHandInProgress)?;
        let player = &mut self.players[seat.index()];
        let pot = hand
            .pot
            .checked_add(amount.min(player.chips()))
            .ok_or(GameError::ChipOverflow)?;
        let paid = player.place_bet(amount);
        hand.pot = pot;
        Ok(paid)
    }

    fn set_last_raise(&mut self, amount: u32) -> Result<(), GameError> {
        let hand = self.hand.as_mut().ok_or(GameError::NoHandInProgress)?;
        hand.last_raise = amount;
        Ok(())
    }

    fn to_call(&self, seat: Seat) -> u32 {
        let max_bet = self
            .players
            .iter()
            .map(Player::current_bet)
            .max()
            .unwrap_or(0);
        max_bet.saturating_sub(self.players[seat.index()].current_bet())
    }

    /// Every active player with chips behind has acted, and every active
    /// player matches the highest bet unless all-in.
    fn round_complete(&self) -> bool {
        let active = || self.players.iter().filter(|p| p.is_active());
        if active().any(|p| !p.is_all_in() && !p.has_acted()) {
            return false;
        }
        let max_bet = active().map(Player::current_bet).max().unwrap_or(0);
        active().all(|p| p.current_bet() == max_bet || p.is_all_in())
    }

    /// No betting is possible: nobody can act, or the only player who can
    /// owes nothing.
    fn betting_closed(&self) -> bool {
        let mut able = Seat::BOTH
            .into_iter()
            .filter(|s| self.players.get(s.index()).is_some_and(Player::can_act));
        match (able.next(), able.next()) {
            (None, _) => true,
            (Some(seat), None) => self.to_call(seat) == 0,
            _ => false,
        }
    }

    fn begin_round(&mut self, out: &mut Events) -> Result<(), GameError> {
        if self.betting_closed() {
            return self.complete_round(out);
        }
        let hand = self.hand.as_mut().ok_or(GameError::NoHandInProgress)?;
        let opener = match (hand.phase, self.config.postflop_first_to_act) {
            (Phase::Preflop, _) | (_, FirstToAct::Dealer) => hand.dealer,
            (_, FirstToAct::NonDealer) => hand.dealer.other(),
        };
        hand.current = if self.players[opener.index()].can_act() {
            Some(opener)
        } else {
            Some(opener.other())
        };
        out.broadcast(GameEvent::GameState(self.snapshot()));
        Ok(())
    }

    fn advance(&mut self, out: &mut Events) -> Result<(), GameError> {
        if self.round_complete() {
            return self.complete_round(out);
        }
        let hand = self.hand.as_mut().ok_or(GameError::NoHandInProgress)?;
        if let Some(current) = hand.current {
            let next = current.other();
            if self.players[next.index()].can_act() {
                hand.current = Some(next);
            }
        }
        out.broadcast(GameEvent::GameState(self.snapshot()));
        Ok(())
    }

    /// Closes the betting round and deals the next street, or goes to
    /// showdown after the river.
    fn complete_round(&mut self, out: &mut Events) -> Result<(), GameError> {
        for p in &mut self.players {
            p.reset_for_round();
        }
        let big_blind = self.config.big_blind;
        let hand = self.hand.as_mut().ok_or(GameError::NoHandInProgress)?;
        hand.current = None;
        hand.last_raise = big_blind;

        let (phase, count) = match hand.phase {
            Phase::Preflop => (Phase::Flop, 3),
            Phase::Flop => (Phase::Turn, 1),
            Phase::Turn => (Phase::River, 1),
            Phase::River | Phase::Showdown => return self.showdown(out),
        };
        hand.deck.burn()?;
        for _ in 0..count {
            let card = hand.deck.draw()?;
            hand.community.push(card);
        }
        hand.phase = phase;
        debug!(
            game_code = %self.code,
            hand_number = hand.number,
            phase = ?phase,
            "street dealt"
        );
        out.broadcast(GameEvent::CommunityCards {
            cards: hand.community.clone(),
            phase,
        });
        self.begin_round(out)
    }

    fn showdown(&mut self, out: &mut Events) -> Result<(), GameError> {
        let hand = self.hand.as_mut().ok_or(GameError::NoHandInProgress)?;
        hand.phase = Phase::Showdown;
        let pot = hand.pot;
        let dealer = hand.dealer;
        let community = hand.community.clone();

        let contenders: Vec<Seat> = Seat::BOTH
            .into_iter()
            .filter(|s| self.players.get(s.index()).is_some_and(Player::is_active))
            .collect();

        let shares = match contenders.as_slice() {
            [only] => vec![(*only, pot)],
            [a, b] => {
                let value_a = self.hand_value(*a, &community)?;
                let value_b = self.hand_value(*b, &community)?;
                out.broadcast(GameEvent::Showdown {
                    hands: vec![
                        self.reveal(*a, &value_a),
                        self.reveal(*b, &value_b),
                    ],
                });
                match compare_hands(&value_a, &value_b) {
                    Ordering::Greater => vec![(*a, pot)],
                    Ordering::Less => vec![(*b, pot)],
                    // odd chip to the player out of position
                    Ordering::Equal => vec![(dealer.other(), pot - pot / 2), (dealer, pot / 2)],
                }
            }
            _ => Vec::new(),
        };
        self.award(out, &shares)?;
        self.end_hand(out)
    }

    fn hand_value(&self, seat: Seat, community: &[Card]) -> Result<HandValue, GameError> {
        let mut cards = self.players[seat.index()].hole_cards().to_vec();
        cards.extend_from_slice(community);
        evaluate_hand(&cards)
    }

    fn reveal(&self, seat: Seat, value: &HandValue) -> ShowdownHand {
        let player = &self.players[seat.index()];
        ShowdownHand {
            player_id: player.id().to_string(),
            hole_cards: player.hole_cards().to_vec(),
            category: value.category,
        }
    }

    fn award(&mut self, out: &mut Events, shares: &[(Seat, u32)]) -> Result<(), GameError> {
        for &(seat, amount) in shares {
            let Some(player) = self.players.get_mut(seat.index()) else {
                continue;
            };
            player.add_chips(amount)?;
            info!(
                game_code = %self.code,
                player_id = %player.id(),
                amount,
                "pot awarded"
            );
            out.broadcast(GameEvent::HandWinner {
                winner_id: player.id().to_string(),
                pot_amount: amount,
                winner_chips: player.chips(),
            });
        }
        Ok(())
    }

    /// Gives the whole pot to the only player still in the hand, if exactly
    /// one remains.
    fn award_to_last_standing(&mut self, out: &mut Events) -> Result<(), GameError> {
        let Some(pot) = self.hand.as_ref().map(|h| h.pot) else {
            return Ok(());
        };
        match self.last_standing() {
            Some(seat) => self.award(out, &[(seat, pot)]),
            None => Ok(()),
        }
    }

    fn last_standing(&self) -> Option<Seat> {
        let mut standing = Seat::BOTH
            .into_iter()
            .filter(|s| self.players.get(s.index()).is_some_and(Player::is_active));
        match (standing.next(), standing.next()) {
            (Some(seat), None) => Some(seat),
            _ => None,
        }
    }

    /// Ends the match if a stack is empty or a seat is vacant, otherwise
    /// deals the next hand.
    fn end_hand(&mut self, out: &mut Events) -> Result<(), GameError> {
        if let Some(hand) = self.hand.as_mut() {
            hand.current = None;
        }
        let eliminated =
            self.players.len() < 2 || self.players.iter().any(|p| p.chips() == 0);
        if !eliminated {
            return self.start_new_hand(out);
        }

        self.state = MatchState::GameOver;
        let winner = self
            .players
            .iter()
            .find(|p| p.chips() > 0)
            .or_else(|| self.players.first());
        if let Some(winner) = winner {
            info!(game_code = %self.code, winner_id = %winner.id(), "match over");
            out.broadcast(GameEvent::GameOver {
                winner_id: winner.id().to_string(),
            });
        }
        Ok(())
    }
}
