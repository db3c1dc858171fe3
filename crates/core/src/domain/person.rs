use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::text;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PersonId(pub i64);

/// The last text question the bot asked a person. Block-based questions
/// carry their correlation in the block id, so only free-text questions
/// need this state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LastQuery {
    AddIntro,
    UpdateIntro,
}

impl LastQuery {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddIntro => "add_intro",
            Self::UpdateIntro => "update_intro",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "add_intro" => Some(Self::AddIntro),
            "update_intro" => Some(Self::UpdateIntro),
            _ => None,
        }
    }
}

/// A single Slack user known to the bot. Created the first time the bot sees
/// them in a pool's channel; never hard-deleted in normal operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    /// Slack user id, e.g. `U0123456789`.
    pub user_id: String,
    /// Slack handle. Not guaranteed unique by Slack; kept because many
    /// workspaces map it to a corp id.
    pub user_name: String,
    pub full_name: String,
    /// How you'd address this person in "Hey {casual_name}, nice to meet
    /// you!" Stored separately from `full_name` instead of being derived on
    /// the fly, so it stays editable.
    pub casual_name: String,
    /// Introduction shown to people they are matched with. Empty until the
    /// person has answered the onboarding question.
    pub intro: String,
    /// Whether this person may be dropped to even out an odd pool.
    pub can_be_excluded: bool,
    pub last_query: Option<LastQuery>,
    pub joined_at: DateTime<Utc>,
}

impl Person {
    pub fn new(user_id: impl Into<String>, user_name: impl Into<String>, full_name: impl Into<String>) -> Self {
        let full_name = full_name.into();
        let casual_name = text::first_name(&full_name).to_owned();
        Self {
            id: PersonId(0),
            user_id: user_id.into(),
            user_name: user_name.into(),
            full_name,
            casual_name,
            intro: String::new(),
            can_be_excluded: true,
            last_query: None,
            joined_at: Utc::now(),
        }
    }

    pub fn has_intro(&self) -> bool {
        !self.intro.is_empty()
    }
}

impl std::fmt::Display for Person {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.full_name, self.user_name)
    }
}
