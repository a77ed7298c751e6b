use serde::{Deserialize, Serialize};

use crate::errors::GameError;

/// Who opens the betting on the flop, turn and river.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirstToAct {
    /// The dealer opens every street, preflop included
    #[default]
    Dealer,
    /// Standard heads-up order: the big blind opens post-flop
    NonDealer,
}

/// Fixed stakes and seating rules for one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub small_blind: u32,
    pub big_blind: u32,
    pub starting_stack: u32,
    #[serde(default)]
    pub postflop_first_to_act: FirstToAct,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            small_blind: 50,
            big_blind: 100,
            starting_stack: 20_000,
            postflop_first_to_act: FirstToAct::Dealer,
        }
    }
}

impl TableConfig {
    pub fn validate(&self) -> Result<(), GameError> {
        if self.small_blind == 0 || self.big_blind == 0 {
            return Err(GameError::InvalidConfig(
                "blinds must be greater than 0".into(),
            ));
        }
        if self.small_blind > self.big_blind {
            return Err(GameError::InvalidConfig(
                "small_blind must not exceed big_blind".into(),
            ));
        }
        if self.starting_stack <= self.big_blind {
            return Err(GameError::InvalidConfig(
                "starting_stack must exceed big_blind".into(),
            ));
        }
        // both stacks can end up in one pot
        if self.starting_stack.checked_mul(2).is_none() {
            return Err(GameError::InvalidConfig(format!(
                "starting_stack must not exceed {}",
                u32::MAX / 2
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_fifty_one_hundred() {
        let cfg = TableConfig::default();
        assert_eq!((cfg.small_blind, cfg.big_blind), (50, 100));
        assert_eq!(cfg.starting_stack, 20_000);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_inverted_blinds() {
        let cfg = TableConfig {
            small_blind: 200,
            ..TableConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(GameError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_stack_not_covering_big_blind() {
        let cfg = TableConfig {
            starting_stack: 100,
            ..TableConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_stack_too_large_for_one_pot() {
        let cfg = TableConfig {
            starting_stack: 3_000_000_000,
            ..TableConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(GameError::InvalidConfig(_))));

        let largest = TableConfig {
            starting_stack: u32::MAX / 2,
            ..TableConfig::default()
        };
        assert!(largest.validate().is_ok());
    }
}
