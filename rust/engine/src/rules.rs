use crate::errors::GameError;
use crate::player::PlayerAction as A;

/// An action that passed validation, carrying the chips it moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedAction {
    Fold,
    Check,
    /// Chips paid, capped at the stack
    Call(u32),
    Bet(u32),
    /// Raise increment and total outlay (call + increment)
    Raise { by: u32, total: u32 },
    AllIn(u32),
}

/// What the acting player faces when choosing an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BettingContext {
    /// Player's remaining chip stack
    pub stack: u32,
    /// Difference between the table's highest bet and the player's bet
    pub to_call: u32,
    /// Size of the most recent bet or raise
    pub min_raise: u32,
}

/// Validates a player action according to betting rules and stack size.
///
/// # Arguments
///
/// * `ctx` - Stack, amount to call and minimum raise for the acting player
/// * `action` - The action the player wishes to perform
///
/// # Returns
///
/// The action to execute with the chips it moves. A call that exceeds the
/// stack becomes an all-in call for less. Going all-in is always allowed and
/// skips every sizing rule.
///
/// # Errors
///
/// - [`GameError::CheckFacingBet`] - check while a call is owed
/// - [`GameError::BetFacingBet`] - bet while a call is owed
/// - [`GameError::NothingToRaise`] - raise with nothing to call
/// - [`GameError::InvalidBetAmount`] - zero bet, or raise below the last raise
/// - [`GameError::InsufficientChips`] - bet or call-plus-raise above the stack
///
/// # Examples
///
/// ```
/// use holdem_engine::rules::{validate_action, BettingContext, ValidatedAction};
/// use holdem_engine::player::PlayerAction;
///
/// let ctx = BettingContext { stack: 1_000, to_call: 50, min_raise: 100 };
/// assert_eq!(validate_action(ctx, PlayerAction::Call), Ok(ValidatedAction::Call(50)));
/// assert_eq!(
///     validate_action(ctx, PlayerAction::Raise(100)),
///     Ok(ValidatedAction::Raise { by: 100, total: 150 })
/// );
/// assert!(validate_action(ctx, PlayerAction::Raise(50)).is_err());
/// ```
pub fn validate_action(ctx: BettingContext, action: A) -> Result<ValidatedAction, GameError> {
    let BettingContext {
        stack,
        to_call,
        min_raise,
    } = ctx;
    match action {
        A::Fold => Ok(ValidatedAction::Fold),
        A::Check => {
            if to_call == 0 {
                Ok(ValidatedAction::Check)
            } else {
                Err(GameError::CheckFacingBet { to_call })
            }
        }
        A::Call => Ok(ValidatedAction::Call(to_call.min(stack))),
        A::Bet(amount) => {
            if to_call > 0 {
                return Err(GameError::BetFacingBet { to_call });
            }
            if amount == 0 {
                return Err(GameError::InvalidBetAmount { amount, minimum: 1 });
            }
            if amount > stack {
                return Err(GameError::InsufficientChips {
                    needed: amount,
                    available: stack,
                });
            }
            Ok(ValidatedAction::Bet(amount))
        }
        A::Raise(amount) => {
            if to_call == 0 {
                return Err(GameError::NothingToRaise);
            }
            if amount < min_raise {
                return Err(GameError::InvalidBetAmount {
                    amount,
                    minimum: min_raise,
                });
            }
            let total = to_call.saturating_add(amount);
            if total > stack {
                return Err(GameError::InsufficientChips {
                    needed: total,
                    available: stack,
                });
            }
            Ok(ValidatedAction::Raise { by: amount, total })
        }
        A::AllIn => Ok(ValidatedAction::AllIn(stack)),
    }
}
