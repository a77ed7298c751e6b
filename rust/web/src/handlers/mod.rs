pub mod api;
pub mod ws;

pub use api::{game_state, health, lobby, metrics, new_game_code};
pub use ws::{handle_socket, ClientMessage};
