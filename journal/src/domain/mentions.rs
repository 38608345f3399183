//! Mention parser
//!
//! Record bodies reference game entities inline as ``@kind:id`Name` ``.
//! Parsing never fails: malformed ids and unknown kinds are logged and
//! skipped so a bad mention cannot block saving a record.

use crate::database::EntityKind;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static MENTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@(?P<kind>\w+):(?P<id>\d+)`(?P<name>[^`]+)`").expect("valid mention regex")
});

/// One inline reference found in a record body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mention {
    pub kind: EntityKind,
    pub id: i64,
    pub display_name: String,
}

/// Extract all well-formed mentions from `text`, in order of appearance.
///
/// Duplicates are kept; use [`crate::domain::LinkSet::from_mentions`] to
/// collapse them before touching link tables.
pub fn parse_mentions(text: &str) -> Vec<Mention> {
    let mut mentions = Vec::new();

    for caps in MENTION_RE.captures_iter(text) {
        let raw_kind = &caps["kind"];
        let raw_id = &caps["id"];

        let kind = match raw_kind.parse::<EntityKind>() {
            Ok(kind) => kind,
            Err(_) => {
                tracing::warn!("Skipping mention {} with unknown kind", &caps[0]);
                continue;
            }
        };

        let id = match raw_id.parse::<i64>() {
            Ok(id) => id,
            Err(_) => {
                tracing::debug!("Skipping mention {} with unparsable id", &caps[0]);
                continue;
            }
        };

        mentions.push(Mention {
            kind,
            id,
            display_name: caps["name"].to_string(),
        });
    }

    mentions
}

/// Canonical text form of a mention
pub fn render_mention(kind: EntityKind, id: i64, display_name: &str) -> String {
    format!("@{}:{}`{}`", kind, id, display_name)
}
