//! # holdem-engine: Heads-up Hold'em Match Core
//!
//! Rules engine for a two-player No-Limit Texas Hold'em match: a shuffled
//! deck, blinds and betting rounds, showdown evaluation and elimination.
//! A [`session::Session`] is a pure state machine. Every operation returns
//! the events it produced, each tagged with its audience, and leaves
//! delivery to the caller.
//!
//! ## Core Modules
//!
//! - [`cards`] - Card representation (Suit, Rank, Card) and deck construction
//! - [`deck`] - Shuffled 52-card deck with burn and draw
//! - [`hand`] - Best-five-of-seven evaluation and hand comparison
//! - [`player`] - Seats, player actions and stack bookkeeping
//! - [`rules`] - Betting validation
//! - [`session`] - The match state machine
//! - [`events`] - Outbound events and the public table view
//! - [`config`] - Blinds, starting stack and post-flop action order
//! - [`errors`] - Error types for game operations
//!
//! ## Quick Start
//!
//! ```rust
//! use holdem_engine::config::TableConfig;
//! use holdem_engine::events::{GameEvent, Recipient};
//! use holdem_engine::player::PlayerAction;
//! use holdem_engine::session::Session;
//!
//! let mut session = Session::new("K7PQ2M", TableConfig::default());
//! session.join("alice").unwrap();
//! let dealt = session.join("bob").unwrap();
//!
//! // hole cards are addressed to their owner only
//! assert!(dealt.iter().any(|o| matches!(
//!     (&o.recipient, &o.event),
//!     (Recipient::Player(p), GameEvent::HoleCardsDealt { .. }) if p == "alice"
//! )));
//!
//! // the dealer posts the small blind and acts first preflop
//! let events = session.act("alice", PlayerAction::Call).unwrap();
//! assert!(!events.is_empty());
//! assert_eq!(session.snapshot().pot, 200);
//! ```
//!
//! ## Reproducible Matches
//!
//! ```rust
//! use holdem_engine::deck::Deck;
//!
//! let mut a = Deck::new_with_seed(42);
//! let mut b = Deck::new_with_seed(42);
//! a.shuffle();
//! b.shuffle();
//! assert_eq!(a.draw(), b.draw());
//! ```

pub mod cards;
pub mod config;
pub mod deck;
pub mod errors;
pub mod events;
pub mod hand;
pub mod player;
pub mod rules;
pub mod session;
