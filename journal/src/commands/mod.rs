//! Commands exposed to a transport layer
//!
//! Each command takes plain data plus the authenticated player and
//! returns a serializable view or an [`AppError`](crate::error::AppError).
//! Submodules:
//! - `players`: login, player settings, current game, username
//! - `records`: journal records
//! - `entities`: chars, NPCs, locations and mention suggestions
//! - `quests`: quests, task progress and sessions
//! - `games`: game creation and settings

pub mod entities;
pub mod games;
pub mod players;
pub mod quests;
pub mod records;
pub mod views;

use serde::Serialize;

// Re-export all commands for a flat call surface
pub use entities::*;
pub use games::*;
pub use players::*;
pub use quests::*;
pub use records::*;
pub use views::*;

// ===== General Commands =====

/// Build information
#[derive(Debug, Clone, Serialize)]
pub struct AppInfo {
    pub name: &'static str,
    pub version: &'static str,
}

pub fn get_app_info() -> AppInfo {
    AppInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    }
}
