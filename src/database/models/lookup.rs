use serde::{Deserialize, Serialize};

use super::{Gameday, Team};

/// Label/value pair offered to a dynamic select on the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupItem {
    pub label: String,
    pub value: String,
}

impl From<&Team> for LookupItem {
    fn from(team: &Team) -> Self {
        Self {
            label: team.name.clone(),
            value: team.id.clone(),
        }
    }
}

impl From<&Gameday> for LookupItem {
    fn from(gameday: &Gameday) -> Self {
        Self {
            label: gameday.title.clone(),
            value: gameday.id.clone(),
        }
    }
}
