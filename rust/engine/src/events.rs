use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::hand::Category;
use crate::player::{ActionKind, PlayerId};

/// Street of the hand in progress.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
}

/// Lifecycle of a match.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    /// Fewer than two seats filled
    Waiting,
    InGame,
    /// Terminal: one player holds every chip or the table emptied
    GameOver,
}

/// Who an outbound event is for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Recipient {
    /// Every seated player
    All,
    /// Only this player; used for hole cards and rejections
    Player(PlayerId),
}

/// An event produced by a session together with its audience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub recipient: Recipient,
    pub event: GameEvent,
}

/// Public view of a seat. Hole cards are never part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub chips: u32,
    pub current_bet: u32,
    pub is_active: bool,
    pub is_all_in: bool,
}

/// Table state safe to show to both players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStateView {
    pub game_code: String,
    pub match_state: MatchState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    pub pot: u32,
    pub community_cards: Vec<Card>,
    pub current_player: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dealer_index: Option<usize>,
    pub players: Vec<PlayerView>,
    pub small_blind: u32,
    pub big_blind: u32,
}

/// A player's cards as revealed at showdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowdownHand {
    pub player_id: PlayerId,
    pub hole_cards: Vec<Card>,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    GameCreated {
        game_code: String,
        player_id: PlayerId,
    },
    PlayerJoined {
        player_id: PlayerId,
    },
    NewHand {
        hand_number: u32,
        dealer_index: usize,
        small_blind: u32,
        big_blind: u32,
    },
    HoleCardsDealt {
        player_id: PlayerId,
        cards: Vec<Card>,
    },
    CommunityCards {
        cards: Vec<Card>,
        phase: Phase,
    },
    PlayerAction {
        player_id: PlayerId,
        action: ActionKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        amount: Option<u32>,
    },
    GameState(GameStateView),
    Showdown {
        hands: Vec<ShowdownHand>,
    },
    HandWinner {
        winner_id: PlayerId,
        pot_amount: u32,
        winner_chips: u32,
    },
    GameOver {
        winner_id: PlayerId,
    },
    ActionRejected {
        reason: String,
    },
    Error {
        message: String,
    },
}
