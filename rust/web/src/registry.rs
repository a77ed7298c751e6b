use crate::errors::{ErrorSeverity, IntoErrorResponse};
use crate::events::{EventBus, EventSender, EventSubscription};
use crate::metrics::MetricsCollector;
use holdem_engine::config::TableConfig;
use holdem_engine::errors::GameError;
use holdem_engine::events::{GameEvent, GameStateView, MatchState, Outbound, Recipient};
use holdem_engine::player::{ActionKind, PlayerAction};
use holdem_engine::session::{GameCode, Session};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use thiserror::Error;
use warp::http::StatusCode;

/// Unambiguous characters only: no 0/O or 1/I.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const GAME_CODE_LEN: usize = 6;
const MAX_CODE_LEN: usize = 16;
const MAX_PLAYER_ID_LEN: usize = 64;
const MAX_CODE_ATTEMPTS: usize = 64;

/// One row of the lobby listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyEntry {
    pub game_code: GameCode,
    pub players: usize,
    pub match_state: MatchState,
}

/// Owns every live session, keyed by game code.
///
/// Each operation locks exactly one session and keeps it locked until the
/// events it produced have been handed to the [`EventBus`], so the players
/// of one game observe events in the order the session emitted them while
/// other games proceed independently.
#[derive(Debug)]
pub struct GameRegistry {
    sessions: RwLock<HashMap<GameCode, Arc<Mutex<Session>>>>,
    event_bus: Arc<EventBus>,
    metrics: MetricsCollector,
    table: TableConfig,
}

impl GameRegistry {
    pub fn new(table: TableConfig, event_bus: Arc<EventBus>, metrics: MetricsCollector) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            event_bus,
            metrics,
            table,
        }
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    pub fn table_config(&self) -> TableConfig {
        self.table
    }

    /// A random code not used by any live session. The code is not
    /// reserved; `create` may still lose a race for it.
    pub fn generate_code(&self) -> Result<GameCode, RegistryError> {
        let guard = self
            .sessions
            .read()
            .map_err(|_| RegistryError::StoragePoisoned)?;
        let mut rng = rand::rng();
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = random_code(&mut rng);
            if !guard.contains_key(&code) {
                return Ok(code);
            }
        }
        Err(RegistryError::CodeSpaceExhausted)
    }

    /// Opens a new session under `game_code` and seats its creator.
    pub fn create(
        &self,
        game_code: &str,
        player_id: &str,
        sender: EventSender,
    ) -> Result<EventSubscription, RegistryError> {
        let code = normalize_code(game_code)?;
        let player_id = validate_player_id(player_id)?;

        let session = Arc::new(Mutex::new(Session::new(code.clone(), self.table)));
        // Locked before it becomes reachable so the creator always takes
        // the first seat.
        let mut locked = session
            .lock()
            .map_err(|_| RegistryError::StoragePoisoned)?;
        {
            let mut guard = self
                .sessions
                .write()
                .map_err(|_| RegistryError::StoragePoisoned)?;
            if guard.contains_key(&code) {
                return Err(RegistryError::GameCodeTaken(code));
            }
            guard.insert(code.clone(), Arc::clone(&session));
        }
        self.metrics.session_created();
        tracing::info!(game_code = %code, player_id = %player_id, "creating game session");

        let created = Outbound {
            recipient: Recipient::Player(player_id.to_string()),
            event: GameEvent::GameCreated {
                game_code: code.clone(),
                player_id: player_id.to_string(),
            },
        };
        match self.seat(&session, &mut locked, player_id, sender, Some(created)) {
            Ok(subscription) => Ok(subscription),
            Err(err) => {
                self.remove(&code, &session);
                Err(err)
            }
        }
    }

    /// Seats a second player; on success the match starts immediately.
    pub fn join(
        &self,
        game_code: &str,
        player_id: &str,
        sender: EventSender,
    ) -> Result<EventSubscription, RegistryError> {
        let code = normalize_code(game_code)?;
        let player_id = validate_player_id(player_id)?;
        let session = self.get(&code)?;
        self.join_session(&code, &session, player_id, sender)
    }

    fn join_session(
        &self,
        code: &str,
        session: &Arc<Mutex<Session>>,
        player_id: &str,
        sender: EventSender,
    ) -> Result<EventSubscription, RegistryError> {
        let mut locked = session
            .lock()
            .map_err(|_| RegistryError::StoragePoisoned)?;
        // The last player may have left between lookup and lock.
        if !self.is_registered(code, session)? {
            return Err(RegistryError::NotFound(code.to_string()));
        }
        self.seat(session, &mut locked, player_id, sender, None)
    }

    /// Applies a betting action. A rejection is returned to the caller and
    /// also sent privately to the player as `action_rejected`.
    pub fn action(
        &self,
        game_code: &str,
        player_id: &str,
        kind: ActionKind,
        amount: Option<u32>,
    ) -> Result<(), RegistryError> {
        let code = normalize_code(game_code)?;
        let session = self.get(&code)?;
        let mut locked = session
            .lock()
            .map_err(|_| RegistryError::StoragePoisoned)?;
        let result =
            PlayerAction::from_parts(kind, amount).and_then(|action| locked.act(player_id, action));
        self.settle(&session, &mut locked, player_id, result)
    }

    pub fn resign(&self, game_code: &str, player_id: &str) -> Result<(), RegistryError> {
        let code = normalize_code(game_code)?;
        let session = self.get(&code)?;
        let mut locked = session
            .lock()
            .map_err(|_| RegistryError::StoragePoisoned)?;
        let result = locked.resign(player_id);
        self.settle(&session, &mut locked, player_id, result)
    }

    /// Removes a player whose connection went away. A session with nobody
    /// left in it is dropped.
    pub fn disconnect(&self, game_code: &str, player_id: &str) -> Result<(), RegistryError> {
        let code = normalize_code(game_code)?;
        let session = self.get(&code)?;
        let mut locked = session
            .lock()
            .map_err(|_| RegistryError::StoragePoisoned)?;
        let outbound = locked.disconnect(player_id)?;
        self.publish(&session, &mut locked, outbound);
        Ok(())
    }

    /// Public state of one game.
    pub fn snapshot(&self, game_code: &str) -> Result<GameStateView, RegistryError> {
        let code = normalize_code(game_code)?;
        let session = self.get(&code)?;
        let locked = session
            .lock()
            .map_err(|_| RegistryError::StoragePoisoned)?;
        Ok(locked.snapshot())
    }

    /// Every live game with its seat count, sorted by code.
    pub fn lobby(&self) -> Result<Vec<LobbyEntry>, RegistryError> {
        let sessions: Vec<Arc<Mutex<Session>>> = {
            let guard = self
                .sessions
                .read()
                .map_err(|_| RegistryError::StoragePoisoned)?;
            guard.values().cloned().collect()
        };
        let mut entries = sessions
            .iter()
            .map(|session| -> Result<LobbyEntry, RegistryError> {
                let locked = session
                    .lock()
                    .map_err(|_| RegistryError::StoragePoisoned)?;
                Ok(LobbyEntry {
                    game_code: locked.code().to_string(),
                    players: locked.players().len(),
                    match_state: locked.state(),
                })
            })
            .collect::<Result<Vec<_>, RegistryError>>()?;
        entries.sort_by(|a, b| a.game_code.cmp(&b.game_code));
        Ok(entries)
    }

    pub fn active_games(&self) -> usize {
        match self.sessions.read() {
            Ok(guard) => guard.len(),
            Err(_) => 0,
        }
    }

    fn get(&self, code: &str) -> Result<Arc<Mutex<Session>>, RegistryError> {
        let guard = self
            .sessions
            .read()
            .map_err(|_| RegistryError::StoragePoisoned)?;
        guard
            .get(code)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(code.to_string()))
    }

    fn is_registered(
        &self,
        code: &str,
        session: &Arc<Mutex<Session>>,
    ) -> Result<bool, RegistryError> {
        let guard = self
            .sessions
            .read()
            .map_err(|_| RegistryError::StoragePoisoned)?;
        Ok(guard.get(code).is_some_and(|live| Arc::ptr_eq(live, session)))
    }

    /// Drops `session` from the map. Callers hold its lock, taken before the
    /// map lock as in `create`, so no join can slip in between.
    fn remove(&self, code: &str, session: &Arc<Mutex<Session>>) {
        let mut guard = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let removed = match guard.get(code) {
            Some(live) if Arc::ptr_eq(live, session) => guard.remove(code),
            _ => None,
        };
        drop(guard);
        if removed.is_some() {
            self.event_bus.drop_game(code);
            self.metrics.session_removed();
            tracing::info!(game_code = %code, "game session removed");
        }
    }

    /// Seats a player on a locked session. The subscription is only made
    /// once the session accepted the player, so a refused join never sees
    /// the table's private events.
    fn seat(
        &self,
        session: &Arc<Mutex<Session>>,
        locked: &mut Session,
        player_id: &str,
        sender: EventSender,
        greeting: Option<Outbound>,
    ) -> Result<EventSubscription, RegistryError> {
        let joined = locked.join(player_id)?;
        let subscription = self.event_bus.subscribe(locked.code(), player_id, sender);
        let outbound: Vec<Outbound> = greeting.into_iter().chain(joined).collect();
        self.publish(session, locked, outbound);
        Ok(subscription)
    }

    fn settle(
        &self,
        session: &Arc<Mutex<Session>>,
        locked: &mut Session,
        player_id: &str,
        result: Result<Vec<Outbound>, GameError>,
    ) -> Result<(), RegistryError> {
        match result {
            Ok(outbound) => {
                self.metrics.action_applied();
                self.publish(session, locked, outbound);
                Ok(())
            }
            Err(err) => {
                self.metrics.action_rejected();
                let err = RegistryError::Game(err);
                let code = locked.code();
                if err.severity() == ErrorSeverity::Critical {
                    tracing::error!(game_code = %code, player_id = %player_id, error = %err, "session invariant violated");
                } else {
                    tracing::debug!(game_code = %code, player_id = %player_id, error = %err, "action rejected");
                }
                let rejected = Outbound {
                    recipient: Recipient::Player(player_id.to_string()),
                    event: GameEvent::ActionRejected {
                        reason: err.to_string(),
                    },
                };
                self.publish(session, locked, vec![rejected]);
                Err(err)
            }
        }
    }

    /// Hands a session's events to the bus while its lock is held. A player
    /// whose event buffer overflowed is disconnected from the session, and
    /// the events that produces are delivered in turn. A session left
    /// without players is dropped.
    fn publish(
        &self,
        session: &Arc<Mutex<Session>>,
        locked: &mut Session,
        outbound: Vec<Outbound>,
    ) {
        let mut pending = outbound;
        while !pending.is_empty() {
            let hands = pending
                .iter()
                .filter(|o| matches!(o.event, GameEvent::NewHand { .. }))
                .count();
            if hands > 0 {
                self.metrics.hands_dealt(hands as u64);
            }
            let delivery = self.event_bus.deliver(locked.code(), &pending);
            self.metrics.events_delivered(delivery.delivered as u64);

            pending = Vec::new();
            for player_id in delivery.stalled {
                match locked.disconnect(&player_id) {
                    Ok(outbound) => {
                        tracing::error!(
                            game_code = %locked.code(),
                            player_id = %player_id,
                            "player stopped reading events; removed from game"
                        );
                        pending.extend(outbound);
                    }
                    Err(err) => tracing::debug!(
                        game_code = %locked.code(),
                        player_id = %player_id,
                        error = %err,
                        "stalled subscriber already left"
                    ),
                }
            }
        }
        if locked.is_empty() {
            let code = locked.code().to_string();
            self.remove(&code, session);
        }
    }
}

/// Upper-cases and checks a client-supplied game code.
pub fn normalize_code(raw: &str) -> Result<GameCode, RegistryError> {
    let code = raw.trim().to_ascii_uppercase();
    if code.is_empty()
        || code.len() > MAX_CODE_LEN
        || !code.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(RegistryError::InvalidGameCode(raw.to_string()));
    }
    Ok(code)
}

fn validate_player_id(raw: &str) -> Result<&str, RegistryError> {
    let id = raw.trim();
    if id.is_empty() || id.len() > MAX_PLAYER_ID_LEN {
        return Err(RegistryError::InvalidPlayerId(raw.to_string()));
    }
    Ok(id)
}

fn random_code<R: Rng + ?Sized>(rng: &mut R) -> GameCode {
    (0..GAME_CODE_LEN)
        .map(|_| char::from(CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())]))
        .collect()
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Game not found: {0}")]
    NotFound(GameCode),
    #[error("Game code already exists: {0}")]
    GameCodeTaken(GameCode),
    #[error("Invalid game code: {0:?}")]
    InvalidGameCode(String),
    #[error("Invalid player id: {0:?}")]
    InvalidPlayerId(String),
    #[error("No free game code available")]
    CodeSpaceExhausted,
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("Session storage poisoned")]
    StoragePoisoned,
}

impl IntoErrorResponse for RegistryError {
    fn status_code(&self) -> StatusCode {
        match self {
            RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
            RegistryError::GameCodeTaken(_) => StatusCode::CONFLICT,
            RegistryError::InvalidGameCode(_) | RegistryError::InvalidPlayerId(_) => {
                StatusCode::BAD_REQUEST
            }
            RegistryError::CodeSpaceExhausted => StatusCode::SERVICE_UNAVAILABLE,
            RegistryError::Game(GameError::SessionFull | GameError::DuplicatePlayer(_)) => {
                StatusCode::CONFLICT
            }
            RegistryError::Game(
                GameError::DeckExhausted
                | GameError::HoleCardsFull(_)
                | GameError::InvalidConfig(_)
                | GameError::ChipOverflow,
            ) => StatusCode::INTERNAL_SERVER_ERROR,
            RegistryError::Game(_) => StatusCode::BAD_REQUEST,
            RegistryError::StoragePoisoned => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            RegistryError::NotFound(_) => "game_not_found",
            RegistryError::GameCodeTaken(_) => "game_code_taken",
            RegistryError::InvalidGameCode(_) => "invalid_game_code",
            RegistryError::InvalidPlayerId(_) => "invalid_player_id",
            RegistryError::CodeSpaceExhausted => "code_space_exhausted",
            RegistryError::Game(GameError::SessionFull) => "game_full",
            RegistryError::Game(GameError::DuplicatePlayer(_)) => "duplicate_player",
            RegistryError::Game(GameError::NotPlayersTurn(_)) => "not_your_turn",
            RegistryError::Game(GameError::MatchNotInProgress) => "match_not_in_progress",
            RegistryError::Game(_) => "invalid_action",
            RegistryError::StoragePoisoned => "session_storage_error",
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            RegistryError::NotFound(code) | RegistryError::GameCodeTaken(code) => {
                Some(serde_json::json!({ "game_code": code }))
            }
            _ => None,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            RegistryError::StoragePoisoned
            | RegistryError::Game(
                GameError::DeckExhausted | GameError::HoleCardsFull(_) | GameError::ChipOverflow,
            ) => ErrorSeverity::Critical,
            _ if self.status_code().is_server_error() => ErrorSeverity::Server,
            _ => ErrorSeverity::Client,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{event_channel, EventReceiver};
    use std::collections::HashSet;
    use std::thread;

    fn registry() -> GameRegistry {
        GameRegistry::new(
            TableConfig::default(),
            Arc::new(EventBus::new()),
            MetricsCollector::new(),
        )
    }

    fn drain(rx: &mut EventReceiver) -> Vec<GameEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn create_and_join_start_the_match() {
        let registry = registry();
        let (tx_a, mut rx_a) = event_channel(64);
        let (tx_b, mut rx_b) = event_channel(64);

        let _a = registry.create("abc123", "alice", tx_a).expect("create");
        let created = drain(&mut rx_a);
        assert!(matches!(
            &created[0],
            GameEvent::GameCreated { game_code, .. } if game_code == "ABC123"
        ));

        let _b = registry.join("ABC123", "bob", tx_b).expect("join");
        let alice_events = drain(&mut rx_a);
        let bob_events = drain(&mut rx_b);

        assert!(alice_events.contains(&GameEvent::PlayerJoined {
            player_id: "bob".into()
        }));
        let hole_owners = |events: &[GameEvent]| -> Vec<String> {
            events
                .iter()
                .filter_map(|e| match e {
                    GameEvent::HoleCardsDealt { player_id, .. } => Some(player_id.clone()),
                    _ => None,
                })
                .collect()
        };
        assert_eq!(hole_owners(&alice_events), vec!["alice".to_string()]);
        assert_eq!(hole_owners(&bob_events), vec!["bob".to_string()]);

        let snap = registry.snapshot("abc123").expect("snapshot");
        assert_eq!(snap.match_state, MatchState::InGame);
        assert_eq!(snap.pot, 150);
    }

    #[test]
    fn duplicate_code_is_refused() {
        let registry = registry();
        let (tx, _rx) = event_channel(8);
        let _a = registry.create("DUP", "alice", tx.clone()).expect("create");
        assert!(matches!(
            registry.create("dup", "bob", tx),
            Err(RegistryError::GameCodeTaken(code)) if code == "DUP"
        ));
    }

    #[test]
    fn join_errors_map_to_conflict_and_not_found() {
        let registry = registry();
        let (tx, _rx) = event_channel(64);
        let _a = registry.create("G1", "alice", tx.clone()).expect("create");

        let missing = registry.join("NOPE", "bob", tx.clone()).unwrap_err();
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let dup = registry.join("G1", "alice", tx.clone()).unwrap_err();
        assert_eq!(dup.error_code(), "duplicate_player");

        let _b = registry.join("G1", "bob", tx.clone()).expect("join");
        let full = registry.join("G1", "carol", tx).unwrap_err();
        assert_eq!(full.status_code(), StatusCode::CONFLICT);
        assert_eq!(full.error_code(), "game_full");
    }

    #[test]
    fn refused_join_never_subscribes() {
        let registry = registry();
        let (tx_a, _rx_a) = event_channel(64);
        let (tx_b, _rx_b) = event_channel(64);
        let (tx_c, mut rx_c) = event_channel(64);
        let _a = registry.create("G1", "alice", tx_a).expect("create");
        let _b = registry.join("G1", "bob", tx_b).expect("join");

        assert!(registry.join("G1", "alice", tx_c).is_err());
        registry
            .action("G1", "alice", ActionKind::Call, None)
            .expect("call");
        assert!(drain(&mut rx_c).is_empty());
    }

    #[test]
    fn rejected_action_is_reported_privately() {
        let registry = registry();
        let (tx_a, mut rx_a) = event_channel(64);
        let (tx_b, mut rx_b) = event_channel(64);
        let _a = registry.create("G1", "alice", tx_a).expect("create");
        let _b = registry.join("G1", "bob", tx_b).expect("join");
        drain(&mut rx_a);
        drain(&mut rx_b);

        let err = registry
            .action("G1", "bob", ActionKind::Check, None)
            .unwrap_err();
        assert_eq!(err.error_code(), "not_your_turn");
        assert!(drain(&mut rx_a).is_empty());
        assert!(matches!(
            drain(&mut rx_b).as_slice(),
            [GameEvent::ActionRejected { .. }]
        ));
        assert_eq!(registry.metrics.snapshot().actions_rejected, 1);
    }

    #[test]
    fn bet_without_amount_is_rejected() {
        let registry = registry();
        let (tx, _rx) = event_channel(64);
        let _a = registry.create("G1", "alice", tx.clone()).expect("create");
        let _b = registry.join("G1", "bob", tx).expect("join");
        registry
            .action("G1", "alice", ActionKind::Call, None)
            .expect("call");
        let err = registry
            .action("G1", "bob", ActionKind::Bet, None)
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Game(GameError::InvalidBetAmount { .. })
        ));
    }

    #[test]
    fn resign_ends_match_for_both_players() {
        let registry = registry();
        let (tx_a, mut rx_a) = event_channel(64);
        let (tx_b, mut rx_b) = event_channel(64);
        let _a = registry.create("G1", "alice", tx_a).expect("create");
        let _b = registry.join("G1", "bob", tx_b).expect("join");

        registry.resign("G1", "alice").expect("resign");
        let over = GameEvent::GameOver {
            winner_id: "bob".into(),
        };
        assert!(drain(&mut rx_a).contains(&over));
        assert!(drain(&mut rx_b).contains(&over));
        assert_eq!(
            registry.snapshot("G1").expect("snapshot").match_state,
            MatchState::GameOver
        );
    }

    #[test]
    fn last_disconnect_drops_the_session() {
        let registry = registry();
        let (tx, _rx) = event_channel(64);
        let a = registry.create("G1", "alice", tx.clone()).expect("create");
        let b = registry.join("G1", "bob", tx).expect("join");
        assert_eq!(registry.active_games(), 1);

        drop(a);
        registry.disconnect("G1", "alice").expect("disconnect");
        assert_eq!(registry.active_games(), 1);
        drop(b);
        registry.disconnect("G1", "bob").expect("disconnect");
        assert_eq!(registry.active_games(), 0);
        assert!(matches!(
            registry.snapshot("G1"),
            Err(RegistryError::NotFound(_))
        ));
        assert_eq!(registry.metrics.snapshot().active_sessions, 0);
    }

    #[test]
    fn join_after_last_player_left_is_not_found() {
        let registry = registry();
        let (tx, _rx) = event_channel(64);
        let host = registry.create("G2", "alice", tx.clone()).expect("create");
        // a joiner that looked the game up just before the host left
        let stale = registry.get("G2").expect("lookup");

        drop(host);
        registry.disconnect("G2", "alice").expect("disconnect");
        assert_eq!(registry.active_games(), 0);

        let joined = registry.join_session("G2", &stale, "bob", tx.clone());
        assert!(matches!(joined, Err(RegistryError::NotFound(_))));
        assert_eq!(stale.lock().expect("session").players().len(), 0);
        assert_eq!(registry.event_bus.subscriber_count(), 0);

        // the code is free again for a fresh game
        let _again = registry.create("G2", "bob", tx).expect("recreate");
        assert_eq!(registry.active_games(), 1);
    }

    #[test]
    fn disconnect_and_join_racing_never_strand_a_player() {
        let registry = Arc::new(registry());
        let host = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..200 {
                    let (tx, _rx) = event_channel(64);
                    if let Ok(sub) = registry.create("RACE", "alice", tx) {
                        drop(sub);
                        let _ = registry.disconnect("RACE", "alice");
                    }
                }
            })
        };
        let guest = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..200 {
                    let (tx, _rx) = event_channel(64);
                    if let Ok(sub) = registry.join("RACE", "bob", tx) {
                        let state = registry.snapshot("RACE").expect("joined game is listed");
                        assert!(state.players.iter().any(|p| p.id == "bob"));
                        drop(sub);
                        registry.disconnect("RACE", "bob").expect("leave");
                    }
                }
            })
        };
        host.join().expect("host thread");
        guest.join().expect("guest thread");
        assert_eq!(registry.active_games(), 0);
    }

    #[test]
    fn player_who_stops_reading_events_is_removed_from_the_game() {
        let registry = registry();
        let (tx_a, mut rx_a) = event_channel(64);
        let (tx_b, _rx_b) = event_channel(1);
        let _a = registry.create("SLOW", "alice", tx_a).expect("create");
        // bob's buffer overflows on the first hand's events
        let _b = registry.join("SLOW", "bob", tx_b).expect("join");

        let alice_events = drain(&mut rx_a);
        assert!(alice_events.contains(&GameEvent::HandWinner {
            winner_id: "alice".into(),
            pot_amount: 150,
            winner_chips: 20_100,
        }));
        assert_eq!(
            alice_events.last(),
            Some(&GameEvent::GameOver {
                winner_id: "alice".into()
            })
        );

        let state = registry.snapshot("SLOW").expect("snapshot");
        assert_eq!(state.match_state, MatchState::GameOver);
        let seated: Vec<_> = state.players.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(seated, vec!["alice"]);
        assert!(matches!(
            registry.action("SLOW", "bob", ActionKind::Fold, None),
            Err(RegistryError::Game(GameError::MatchNotInProgress))
        ));
    }

    #[test]
    fn lobby_lists_games_in_code_order() {
        let registry = registry();
        let (tx, _rx) = event_channel(64);
        let _b = registry.create("BBB", "bob", tx.clone()).expect("create");
        let _a = registry.create("AAA", "alice", tx.clone()).expect("create");
        let _c = registry.join("AAA", "carol", tx).expect("join");

        let lobby = registry.lobby().expect("lobby");
        assert_eq!(
            lobby,
            vec![
                LobbyEntry {
                    game_code: "AAA".into(),
                    players: 2,
                    match_state: MatchState::InGame,
                },
                LobbyEntry {
                    game_code: "BBB".into(),
                    players: 1,
                    match_state: MatchState::Waiting,
                },
            ]
        );
    }

    #[test]
    fn invalid_codes_and_ids_are_refused() {
        let registry = registry();
        let (tx, _rx) = event_channel(8);
        assert!(matches!(
            registry.create("  ", "alice", tx.clone()),
            Err(RegistryError::InvalidGameCode(_))
        ));
        assert!(matches!(
            registry.create("AB-12", "alice", tx.clone()),
            Err(RegistryError::InvalidGameCode(_))
        ));
        assert!(matches!(
            registry.create("AB12", "", tx),
            Err(RegistryError::InvalidPlayerId(_))
        ));
        assert_eq!(registry.active_games(), 0);
    }

    #[test]
    fn generated_codes_use_the_unambiguous_alphabet() {
        let registry = registry();
        for _ in 0..50 {
            let code = registry.generate_code().expect("code");
            assert_eq!(code.len(), GAME_CODE_LEN);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
            assert_eq!(normalize_code(&code).expect("valid"), code);
        }
    }

    #[test]
    fn concurrent_game_creation_is_safe() {
        let registry = Arc::new(registry());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let mut subs = Vec::new();
                    for i in 0..16 {
                        let (tx, _rx) = event_channel(8);
                        let code = format!("T{t}G{i}");
                        subs.push(registry.create(&code, "host", tx).expect("create"));
                    }
                    subs.len()
                })
            })
            .collect();

        let created: usize = handles
            .into_iter()
            .map(|h| h.join().expect("join thread"))
            .sum();
        assert_eq!(created, 128);
        assert_eq!(registry.active_games(), 128);
        let codes: HashSet<_> = registry
            .lobby()
            .expect("lobby")
            .into_iter()
            .map(|e| e.game_code)
            .collect();
        assert_eq!(codes.len(), 128);
    }
}
