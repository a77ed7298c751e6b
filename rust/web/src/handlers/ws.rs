//! WebSocket transport: one socket per player.
//!
//! A connection is anonymous until it sends `create_game` or `join_game`;
//! from then on it is bound to that seat and receives the game's events.
//! Closing the socket leaves the game.

use crate::events::{event_channel, EventSender, EventSubscription};
use crate::metrics::MetricsCollector;
use crate::registry::{GameRegistry, RegistryError};
use futures_util::{SinkExt, StreamExt};
use holdem_engine::events::GameEvent;
use holdem_engine::player::{ActionKind, PlayerId};
use holdem_engine::session::GameCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use warp::ws::{Message, WebSocket};

/// Messages a client may send, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateGame {
        game_code: String,
        player_id: PlayerId,
    },
    JoinGame {
        game_code: String,
        player_id: PlayerId,
    },
    PlayerAction {
        action: ActionKind,
        #[serde(default)]
        amount: Option<u32>,
    },
    Resign,
}

struct Binding {
    game_code: GameCode,
    player_id: PlayerId,
    subscription: EventSubscription,
}

struct Connection {
    id: Uuid,
    registry: Arc<GameRegistry>,
    events: EventSender,
    binding: Option<Binding>,
}

enum Failure {
    /// Already reported to the player by the registry.
    Reported,
    Message(String),
}

impl From<RegistryError> for Failure {
    fn from(err: RegistryError) -> Self {
        Failure::Message(err.to_string())
    }
}

impl Connection {
    fn handle_text(&mut self, text: &str) {
        let message = match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(connection_id = %self.id, error = %err, "malformed client message");
                self.send_error(format!("Malformed message: {err}"));
                return;
            }
        };

        match self.dispatch(message) {
            Ok(()) | Err(Failure::Reported) => {}
            Err(Failure::Message(message)) => self.send_error(message),
        }
    }

    fn dispatch(&mut self, message: ClientMessage) -> Result<(), Failure> {
        match message {
            ClientMessage::CreateGame {
                game_code,
                player_id,
            } => {
                self.ensure_unbound()?;
                let subscription =
                    self.registry
                        .create(&game_code, &player_id, self.events.clone())?;
                self.bind(subscription, player_id);
                Ok(())
            }
            ClientMessage::JoinGame {
                game_code,
                player_id,
            } => {
                self.ensure_unbound()?;
                let subscription = self
                    .registry
                    .join(&game_code, &player_id, self.events.clone())?;
                self.bind(subscription, player_id);
                Ok(())
            }
            ClientMessage::PlayerAction { action, amount } => {
                let binding = self.bound()?;
                self.registry
                    .action(&binding.game_code, &binding.player_id, action, amount)
                    .map_err(|err| self.reported(err))
            }
            ClientMessage::Resign => {
                let binding = self.bound()?;
                self.registry
                    .resign(&binding.game_code, &binding.player_id)
                    .map_err(|err| self.reported(err))
            }
        }
    }

    fn ensure_unbound(&self) -> Result<(), Failure> {
        match &self.binding {
            Some(binding) => Err(Failure::Message(format!(
                "Already seated in game {}",
                binding.game_code
            ))),
            None => Ok(()),
        }
    }

    fn bound(&self) -> Result<&Binding, Failure> {
        self.binding
            .as_ref()
            .ok_or_else(|| Failure::Message("Join a game first".into()))
    }

    fn bind(&mut self, subscription: EventSubscription, player_id: PlayerId) {
        let game_code = subscription.game_code().to_string();
        tracing::info!(
            connection_id = %self.id,
            game_code = %game_code,
            player_id = %player_id,
            "connection bound to game"
        );
        self.binding = Some(Binding {
            game_code,
            player_id: player_id.trim().to_string(),
            subscription,
        });
    }

    /// Game rule rejections already reached the player as
    /// `action_rejected`; anything else still needs an error frame.
    fn reported(&self, err: RegistryError) -> Failure {
        match err {
            RegistryError::Game(_) => Failure::Reported,
            other => Failure::from(other),
        }
    }

    fn send_error(&self, message: String) {
        if let Err(err) = self.events.try_send(GameEvent::Error { message }) {
            tracing::warn!(connection_id = %self.id, error = %err, "dropping error frame");
        }
    }

    fn close(self) {
        let Connection {
            id,
            registry,
            binding,
            ..
        } = self;
        let Some(Binding {
            game_code,
            player_id,
            subscription,
        }) = binding
        else {
            return;
        };
        drop(subscription);
        match registry.disconnect(&game_code, &player_id) {
            Ok(()) => tracing::info!(
                connection_id = %id,
                game_code = %game_code,
                player_id = %player_id,
                "player disconnected"
            ),
            Err(err) => tracing::debug!(
                connection_id = %id,
                game_code = %game_code,
                error = %err,
                "disconnect after game ended"
            ),
        }
    }
}

/// Drives one upgraded socket until the client goes away.
pub async fn handle_socket(
    socket: WebSocket,
    registry: Arc<GameRegistry>,
    metrics: MetricsCollector,
    buffer: usize,
) {
    let id = Uuid::new_v4();
    metrics.connection_opened();
    tracing::info!(connection_id = %id, "websocket connected");

    let (mut ws_tx, mut ws_rx) = socket.split();
    let (events, mut events_rx) = event_channel(buffer);

    let send_task = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(err) => {
                    tracing::error!(connection_id = %id, error = %err, "failed to encode event");
                    continue;
                }
            };
            if ws_tx.send(Message::text(text)).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    let mut connection = Connection {
        id,
        registry,
        events,
        binding: None,
    };

    while let Some(frame) = ws_rx.next().await {
        let message = match frame {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(connection_id = %id, error = %err, "websocket receive error");
                break;
            }
        };
        if message.is_close() {
            break;
        }
        // Pings are answered by the transport and binary frames are ignored.
        if let Ok(text) = message.to_str() {
            connection.handle_text(text);
        }
    }

    connection.close();
    // The send task drains whatever was queued and ends once the last
    // sender is gone.
    if let Err(err) = send_task.await {
        tracing::warn!(connection_id = %id, error = %err, "send task failed");
    }
    tracing::info!(connection_id = %id, "websocket closed");
}
