use holdem_engine::events::{GameEvent, Outbound, Recipient};
use holdem_engine::player::PlayerId;
use holdem_engine::session::GameCode;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Per-connection buffer. A subscriber whose buffer fills up is dropped
/// rather than stalling the session that is delivering to it, and is
/// reported in [`Delivery::stalled`].
pub const DEFAULT_EVENT_BUFFER: usize = 1000;

pub type EventSender = mpsc::Sender<GameEvent>;
pub type EventReceiver = mpsc::Receiver<GameEvent>;

/// Creates the channel a connection reads its events from.
pub fn event_channel(buffer: usize) -> (EventSender, EventReceiver) {
    mpsc::channel(buffer.max(1))
}

/// Keeps a player attached to a game's events; dropping it detaches them.
#[derive(Debug)]
pub struct EventSubscription {
    bus: EventBus,
    game_code: GameCode,
    subscriber_id: usize,
}

impl EventSubscription {
    pub fn game_code(&self) -> &str {
        &self.game_code
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(&self.game_code, self.subscriber_id);
    }
}

/// Outcome of one [`EventBus::deliver`] call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    /// Players dropped because their buffer was full
    pub stalled: Vec<PlayerId>,
}

#[derive(Debug, Clone)]
struct Subscriber {
    id: usize,
    player_id: PlayerId,
    sender: EventSender,
}

impl Subscriber {
    fn wants(&self, recipient: &Recipient) -> bool {
        match recipient {
            Recipient::All => true,
            Recipient::Player(id) => *id == self.player_id,
        }
    }
}

/// Routes session events to the connections of the players they are
/// addressed to.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    inner: Arc<EventBusInner>,
}

#[derive(Debug, Default)]
struct EventBusInner {
    subscribers: RwLock<HashMap<GameCode, Vec<Subscriber>>>,
    next_id: AtomicUsize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        game_code: &str,
        player_id: &str,
        sender: EventSender,
    ) -> EventSubscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::AcqRel);
        {
            let mut guard = self
                .inner
                .subscribers
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            guard.entry(game_code.to_string()).or_default().push(Subscriber {
                id,
                player_id: player_id.to_string(),
                sender,
            });
        }

        tracing::info!(
            game_code = %game_code,
            player_id = %player_id,
            subscriber_id = id,
            "player subscribed to game events"
        );

        EventSubscription {
            bus: self.clone(),
            game_code: game_code.to_string(),
            subscriber_id: id,
        }
    }

    /// Sends each event to its audience in order. Subscribers that cannot
    /// take an event are unsubscribed; the ones that fell behind are listed
    /// so the caller can take them out of the game.
    pub fn deliver(&self, game_code: &str, outbound: &[Outbound]) -> Delivery {
        let subscribers = {
            let guard = self
                .inner
                .subscribers
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            match guard.get(game_code) {
                Some(list) => list.clone(),
                None => {
                    tracing::debug!(game_code = %game_code, "no subscribers for game");
                    return Delivery::default();
                }
            }
        };

        let mut delivery = Delivery::default();
        let mut failed = Vec::new();
        for message in outbound {
            tracing::trace!(
                game_code = %game_code,
                event = ?message.event,
                "delivering game event"
            );
            for sub in subscribers.iter().filter(|s| s.wants(&message.recipient)) {
                if failed.contains(&sub.id) {
                    continue;
                }
                // try_send: a full or closed channel never blocks the session
                match sub.sender.try_send(message.event.clone()) {
                    Ok(()) => delivery.delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        tracing::error!(
                            game_code = %game_code,
                            player_id = %sub.player_id,
                            subscriber_id = sub.id,
                            "subscriber buffer full; dropping it from game events"
                        );
                        failed.push(sub.id);
                        if !delivery.stalled.contains(&sub.player_id) {
                            delivery.stalled.push(sub.player_id.clone());
                        }
                    }
                    Err(TrySendError::Closed(_)) => {
                        tracing::warn!(
                            game_code = %game_code,
                            player_id = %sub.player_id,
                            subscriber_id = sub.id,
                            "subscriber channel closed"
                        );
                        failed.push(sub.id);
                    }
                }
            }
        }
        if !failed.is_empty() {
            self.remove_subscribers(game_code, &failed);
        }
        delivery
    }

    /// Sends one event privately to a player.
    pub fn send_to(&self, game_code: &str, player_id: &str, event: GameEvent) -> Delivery {
        self.deliver(
            game_code,
            &[Outbound {
                recipient: Recipient::Player(player_id.to_string()),
                event,
            }],
        )
    }

    pub fn unsubscribe(&self, game_code: &str, subscriber_id: usize) {
        self.remove_subscribers(game_code, &[subscriber_id]);
    }

    pub fn drop_game(&self, game_code: &str) {
        let mut guard = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.remove(game_code);
    }

    pub fn subscriber_count(&self) -> usize {
        let guard = self
            .inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        guard.values().map(Vec::len).sum()
    }

    fn remove_subscribers(&self, game_code: &str, ids: &[usize]) {
        let mut guard = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = guard.get_mut(game_code) {
            list.retain(|s| !ids.contains(&s.id));
            if list.is_empty() {
                guard.remove(game_code);
            }
        }
    }
}
