use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::cards::{full_deck, Card};
use crate::errors::GameError;

/// A 52-card deck dealt from the top.
///
/// Cards are consumed destructively; `shuffle` restores all 52 and applies
/// a uniform Fisher-Yates permutation driven by ChaCha20.
#[derive(Debug)]
pub struct Deck {
    cards: Vec<Card>,
    position: usize,
    rng: ChaCha20Rng,
}

impl Deck {
    /// Deck seeded from the thread RNG. Shuffles are not reproducible.
    pub fn new() -> Self {
        Self::with_rng(ChaCha20Rng::from_rng(&mut rand::rng()))
    }

    pub fn new_with_seed(seed: u64) -> Self {
        Self::with_rng(ChaCha20Rng::seed_from_u64(seed))
    }

    fn with_rng(rng: ChaCha20Rng) -> Self {
        // Keep initial order until shuffle is called explicitly
        Self {
            cards: full_deck(),
            position: 0,
            rng,
        }
    }

    pub fn shuffle(&mut self) {
        self.cards = full_deck();
        self.cards.shuffle(&mut self.rng);
        self.position = 0;
    }

    /// Removes and returns the top card.
    pub fn draw(&mut self) -> Result<Card, GameError> {
        let card = self
            .cards
            .get(self.position)
            .copied()
            .ok_or(GameError::DeckExhausted)?;
        self.position += 1;
        Ok(card)
    }

    /// Discards the top card face down.
    pub fn burn(&mut self) -> Result<(), GameError> {
        self.draw().map(|_| ())
    }

    pub fn remaining(&self) -> usize {
        self.cards.len().saturating_sub(self.position)
    }

    /// Deck that deals `cards` in order.
    #[cfg(test)]
    pub(crate) fn stacked(cards: Vec<Card>) -> Self {
        Self {
            cards,
            position: 0,
            rng: ChaCha20Rng::seed_from_u64(0),
        }
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}
