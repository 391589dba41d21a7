//! Mini-app HTTP surface
//!
//! Serves the editor's static files under `/webapp` and the JSON API it talks
//! to under `/api`. Every API route verifies the Telegram init data first.

mod server;

pub mod routes;
pub mod state;
pub mod utils;

pub use server::{shutdown, start_server};
pub use state::AppState;
