use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TeamMember;
use super::macros::string_enum;
use crate::error::AppError;

/// Format accepted for `scheduled_at` on create requests, interpreted as UTC.
pub const SCHEDULED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum GamedayState {
        Scheduled => "scheduled",
        InProgress => "in_progress",
        Cancelled => "cancelled",
        Completed => "completed",
    }
}

impl GamedayState {
    /// States that count toward rotation fairness and default listings.
    pub const ACTIVE: [GamedayState; 2] = [GamedayState::Scheduled, GamedayState::InProgress];

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

impl Default for GamedayState {
    fn default() -> Self {
        GamedayState::Scheduled
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gameday {
    pub id: String,
    pub title: String,
    pub team_id: String,
    pub team_name: String, // joined from team
    pub scheduled_at: i64, // epoch seconds
    pub state: GamedayState,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Gameday {
    pub fn scheduled_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.scheduled_at, 0)
    }

    pub fn scheduled_at_display(&self) -> String {
        format_scheduled_at(self.scheduled_at)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamedayNominee {
    pub id: String,
    pub gameday_id: String,
    pub member_id: String,
    pub user_id: String, // joined from team_member
    pub label: String,   // joined from team_member
    pub is_primary: bool,
    pub is_secondary: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl GamedayNominee {
    pub fn is_on_duty(&self) -> bool {
        self.is_primary || self.is_secondary
    }

    pub fn role(&self) -> &'static str {
        match (self.is_primary, self.is_secondary) {
            (true, _) => "master of disaster",
            (false, true) => "on call",
            (false, false) => "observer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGameday {
    pub title: String,
    pub team_id: String,
    pub scheduled_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNominee {
    pub gameday_id: String,
    pub member_id: String,
    pub is_primary: bool,
    pub is_secondary: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateGamedayInput {
    #[serde(default, alias = "name")]
    pub title: String,
    #[serde(default, alias = "teamId", alias = "team")]
    pub team_id: String,
    #[serde(default, alias = "scheduledAt", alias = "schedule_at")]
    pub scheduled_at: String,
}

impl CreateGamedayInput {
    pub fn validate(&self) -> Result<NewGameday, AppError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation(
                "missing required field `title`".to_string(),
            ));
        }
        let team_id = self.team_id.trim();
        if team_id.is_empty() {
            return Err(AppError::Validation(
                "missing required field `team_id`".to_string(),
            ));
        }
        let scheduled_at = parse_scheduled_at(&self.scheduled_at)?;

        Ok(NewGameday {
            title: title.to_string(),
            team_id: team_id.to_string(),
            scheduled_at,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GamedayIdInput {
    #[serde(default)]
    pub id: String,
}

impl GamedayIdInput {
    pub fn validate(&self) -> Result<&str, AppError> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(AppError::Validation(
                "missing required field `id`".to_string(),
            ));
        }
        Ok(id)
    }
}

/// The two duty holders drawn for a gameday. Both may be the same member on
/// a one-person team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nomination {
    pub primary: TeamMember,
    pub secondary: TeamMember,
}

/// A freshly scheduled gameday with its nominees and the roster they were drawn from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledGameday {
    pub gameday: Gameday,
    pub primary: TeamMember,
    pub secondary: TeamMember,
    pub nominees: Vec<GamedayNominee>,
    #[serde(skip)]
    pub members: Vec<TeamMember>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GamedayDetails {
    pub gameday: Gameday,
    pub nominees: Vec<GamedayNominee>,
}

pub fn parse_scheduled_at(value: &str) -> Result<i64, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(
            "missing required field `scheduled_at`".to_string(),
        ));
    }
    NaiveDateTime::parse_from_str(value, SCHEDULED_AT_FORMAT)
        .map(|naive| naive.and_utc().timestamp())
        .map_err(|e| {
            AppError::Validation(format!(
                "`scheduled_at` must match YYYY-MM-DD HH:MM:SS, got '{}': {}",
                value, e
            ))
        })
}

pub fn format_scheduled_at(epoch_seconds: i64) -> String {
    DateTime::from_timestamp(epoch_seconds, 0)
        .map(|dt| dt.format(SCHEDULED_AT_FORMAT).to_string())
        .unwrap_or_else(|| epoch_seconds.to_string())
}
