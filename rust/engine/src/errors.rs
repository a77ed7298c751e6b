use thiserror::Error;

use crate::player::PlayerId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid bet amount: {amount}, minimum: {minimum}")]
    InvalidBetAmount { amount: u32, minimum: u32 },
    #[error("Insufficient chips: need {needed}, have {available}")]
    InsufficientChips { needed: u32, available: u32 },
    #[error("Cannot check while facing a bet of {to_call}")]
    CheckFacingBet { to_call: u32 },
    #[error("Cannot bet while facing a bet of {to_call}; call or raise instead")]
    BetFacingBet { to_call: u32 },
    #[error("Nothing to raise; bet instead")]
    NothingToRaise,
    #[error("No hand in progress")]
    NoHandInProgress,
    #[error("Player {0} already folded")]
    PlayerAlreadyFolded(PlayerId),
    #[error("It's not player {0}'s turn")]
    NotPlayersTurn(PlayerId),
    #[error("Player {0} is not seated in this game")]
    UnknownPlayer(PlayerId),
    #[error("Player {0} is already seated in this game")]
    DuplicatePlayer(PlayerId),
    #[error("Game is full")]
    SessionFull,
    #[error("Match is not in progress")]
    MatchNotInProgress,
    #[error("Player {0} already holds two cards")]
    HoleCardsFull(PlayerId),
    #[error("Deck exhausted")]
    DeckExhausted,
    #[error("Hand evaluation needs 5 to 7 cards, got {0}")]
    InvalidCardCount(usize),
    #[error("Invalid table configuration: {0}")]
    InvalidConfig(String),
    #[error("Chip count overflow")]
    ChipOverflow,
}
