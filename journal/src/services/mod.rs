//! Services module
//!
//! Business logic services that coordinate between commands and repository.
//! Every service resolves the acting player's current game first.

mod context;
pub mod entities;
pub mod games;
pub mod players;
pub mod quests;
pub mod records;
pub mod sessions;

pub use context::current_context;
pub use entities::{EntitiesService, EntityPage, EntityRow};
pub use games::GamesService;
pub use players::{Login, PlayersService};
pub use quests::{QuestPage, QuestsService};
pub use records::{GameRecords, RecordsService};
pub use sessions::SessionsService;
