//! Database models
//!
//! Rust structs representing database entities and the plain-data
//! requests that create or change them. All models use serde so the
//! command layer can hand them straight to a transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// The three kinds of game entity a record can mention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Char,
    Npc,
    Location,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Char, EntityKind::Npc, EntityKind::Location];

    /// Tag used in mentions and suggestion ids
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Char => "char",
            EntityKind::Npc => "npc",
            EntityKind::Location => "location",
        }
    }

    pub(crate) fn table(self) -> &'static str {
        match self {
            EntityKind::Char => "chars",
            EntityKind::Npc => "npcs",
            EntityKind::Location => "locations",
        }
    }

    pub(crate) fn link_table(self) -> &'static str {
        match self {
            EntityKind::Char => "records_chars",
            EntityKind::Npc => "records_npcs",
            EntityKind::Location => "records_locations",
        }
    }

    pub(crate) fn link_column(self) -> &'static str {
        match self {
            EntityKind::Char => "char_id",
            EntityKind::Npc => "npc_id",
            EntityKind::Location => "location_id",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "char" => Ok(EntityKind::Char),
            "npc" => Ok(EntityKind::Npc),
            "location" => Ok(EntityKind::Location),
            other => Err(format!("unknown entity kind: {}", other)),
        }
    }
}

/// A campaign. The GM is the player who created it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Game {
    pub id: i64,
    pub name: String,
    pub gm_id: i64,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Per-game policy switches
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct GameSettings {
    pub game_id: i64,
    pub allow_all_edit_records: bool,
}

/// A game together with its settings, loaded once per request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameContext {
    pub game: Game,
    pub settings: GameSettings,
}

impl GameContext {
    pub fn is_game_master(&self, player_id: i64) -> bool {
        self.game.gm_id == player_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Player {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub access_key: String,
    pub current_game_id: Option<i64>,
    pub registered_at: DateTime<Utc>,
    pub last_action_at: DateTime<Utc>,
}

/// Player character
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Char {
    pub id: i64,
    pub game_id: i64,
    pub name: String,
    pub title: String,
    pub description: String,
    pub hidden_by: i64,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Npc {
    pub id: i64,
    pub game_id: i64,
    pub name: String,
    pub title: String,
    pub description: String,
    pub hidden_by: i64,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Location, optionally nested under a parent location
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub id: i64,
    pub game_id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
    pub title: String,
    pub description: String,
    pub hidden_by: i64,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Shared accessors over [`Char`], [`Npc`] and [`Location`]
pub trait GameEntity {
    const KIND: EntityKind;

    fn id(&self) -> i64;
    fn game_id(&self) -> i64;
    fn name(&self) -> &str;
}

macro_rules! impl_game_entity {
    ($ty:ty, $kind:expr) => {
        impl GameEntity for $ty {
            const KIND: EntityKind = $kind;

            fn id(&self) -> i64 {
                self.id
            }

            fn game_id(&self) -> i64 {
                self.game_id
            }

            fn name(&self) -> &str {
                &self.name
            }
        }
    };
}

impl_game_entity!(Char, EntityKind::Char);
impl_game_entity!(Npc, EntityKind::Npc);
impl_game_entity!(Location, EntityKind::Location);

/// A journal entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Record {
    pub id: i64,
    pub game_id: i64,
    pub player_id: i64,
    pub text: String,
    pub hidden_by: i64,
    pub quest_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Quest {
    pub id: i64,
    pub game_id: i64,
    pub name: String,
    pub title: String,
    pub description: String,
    pub hidden_by: i64,
    pub successful: bool,
    pub parent_id: Option<i64>,
    pub child_id: Option<i64>,
    pub head_id: Option<i64>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// How a task's progress counts towards completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum TaskType {
    /// Done or not done
    #[default]
    Binary = 0,
    /// Counted up to a capacity
    Decimal = 1,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuestTask {
    pub id: i64,
    pub quest_id: i64,
    pub game_id: i64,
    pub name: String,
    pub description: String,
    pub task_type: TaskType,
    pub capacity: i64,
    #[sqlx(rename = "current_value")]
    pub current: i64,
    pub hidden_by: i64,
    pub finished_at: Option<DateTime<Utc>>,
}

/// A numbered play session. `end_time == None` means it is still running.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: i64,
    pub game_id: i64,
    pub number: i64,
    pub started_at: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Autocomplete entry for mentions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Suggestion {
    pub id: i64,
    /// `"<kind>:<id>"`
    pub sid: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub hidden: bool,
}

/// Stored hash of an issued auth token
#[derive(Debug, Clone, FromRow)]
pub struct AuthToken {
    pub id: i64,
    pub player_id: i64,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

// ===== Requests =====

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecordRequest {
    pub text: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub quest_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRecordRequest {
    pub id: i64,
    pub text: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub quest_id: Option<i64>,
}

/// Create request shared by chars, NPCs and locations.
/// `parent_id` is only accepted for locations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateEntityRequest {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEntityRequest {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateQuestRequest {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub child_id: Option<i64>,
    #[serde(default)]
    pub head_id: Option<i64>,
    #[serde(default)]
    pub successful: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub tasks: Vec<TaskDraft>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateQuestRequest {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub child_id: Option<i64>,
    #[serde(default)]
    pub head_id: Option<i64>,
    #[serde(default)]
    pub successful: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub finished: bool,
    /// Full desired task set; tasks missing from it are deleted
    #[serde(default)]
    pub tasks: Vec<TaskDraft>,
}

/// Requested state of one task. `id == 0` asks for a new task.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskDraft {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub task_type: TaskType,
    #[serde(default)]
    pub capacity: i64,
    #[serde(default)]
    pub hidden: bool,
}

/// Progress-only change to an existing task
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TaskProgress {
    pub id: i64,
    pub current: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGameRequest {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameSettingsUpdate {
    pub game_id: i64,
    pub allow_all_edit_records: bool,
}
