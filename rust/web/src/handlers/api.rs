use crate::errors::IntoErrorResponse;
use crate::metrics::{MetricsCollector, MetricsSnapshot};
use crate::registry::{GameRegistry, LobbyEntry, RegistryError};
use holdem_engine::session::GameCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::Reply;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthBody {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewGameResponse {
    pub game_code: GameCode,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LobbyResponse {
    pub games: Vec<LobbyEntry>,
}

#[derive(Debug, Serialize)]
pub struct MetricsBody {
    #[serde(flatten)]
    pub counters: MetricsSnapshot,
    pub average_response_time_ms: u64,
    pub active_games: usize,
}

pub fn health() -> Response {
    success_response(
        StatusCode::OK,
        HealthBody {
            status: "ok".into(),
        },
    )
}

/// `POST /api/games`: hands out a code no live game is using. The game
/// itself is opened by the first `create_game` message that names it.
pub async fn new_game_code(registry: Arc<GameRegistry>) -> Response {
    match registry.generate_code() {
        Ok(game_code) => success_response(StatusCode::OK, NewGameResponse { game_code }),
        Err(err) => registry_error(err),
    }
}

/// `GET /api/games`
pub async fn lobby(registry: Arc<GameRegistry>) -> Response {
    match registry.lobby() {
        Ok(games) => success_response(StatusCode::OK, LobbyResponse { games }),
        Err(err) => registry_error(err),
    }
}

/// `GET /api/games/{code}`: the public table state. Hole cards are never
/// part of it.
pub async fn game_state(registry: Arc<GameRegistry>, game_code: String) -> Response {
    match registry.snapshot(&game_code) {
        Ok(view) => success_response(StatusCode::OK, view),
        Err(err) => registry_error(err),
    }
}

pub async fn metrics(metrics: MetricsCollector, registry: Arc<GameRegistry>) -> Response {
    let counters = metrics.snapshot();
    success_response(
        StatusCode::OK,
        MetricsBody {
            average_response_time_ms: counters.average_response_time_ms(),
            counters,
            active_games: registry.active_games(),
        },
    )
}

fn success_response<T>(status: StatusCode, body: T) -> Response
where
    T: Serialize,
{
    reply::with_status(reply::json(&body), status).into_response()
}

fn registry_error(err: RegistryError) -> Response {
    err.into_http_response()
}
