use crate::error::AppError;

use super::models::{Gameday, GamedayNominee, GamedayState, Team, TeamMember, TeamMemberWithTeam};

// Database row types in the column shapes every backend decodes through `sqlx::Any`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TeamRow {
    pub id: String,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TeamMemberRow {
    pub id: String,
    pub team_id: String,
    pub user_id: String,
    pub label: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TeamMemberWithTeamRow {
    pub id: String,
    pub team_id: String,
    pub user_id: String,
    pub label: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub team_name: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GamedayRow {
    pub id: String,
    pub title: String,
    pub team_id: String,
    pub team_name: String,
    pub scheduled_at: i64,
    pub state: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GamedayNomineeRow {
    pub id: String,
    pub gameday_id: String,
    pub member_id: String,
    pub user_id: String,
    pub label: String,
    pub is_primary: i64,
    pub is_secondary: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

// Conversion functions
impl From<TeamRow> for Team {
    fn from(row: TeamRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<TeamMemberRow> for TeamMember {
    fn from(row: TeamMemberRow) -> Self {
        Self {
            id: row.id,
            team_id: row.team_id,
            user_id: row.user_id,
            label: row.label,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<TeamMemberWithTeamRow> for TeamMemberWithTeam {
    fn from(row: TeamMemberWithTeamRow) -> Self {
        Self {
            member: TeamMember {
                id: row.id,
                team_id: row.team_id,
                user_id: row.user_id,
                label: row.label,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            team_name: row.team_name,
        }
    }
}

impl TryFrom<GamedayRow> for Gameday {
    type Error = AppError;

    fn try_from(row: GamedayRow) -> Result<Self, Self::Error> {
        let state = row.state.parse::<GamedayState>().map_err(|e| {
            log::error!("Gameday {} has an unreadable state: {}", row.id, e);
            AppError::internal_server_error_message(e)
        })?;

        Ok(Self {
            id: row.id,
            title: row.title,
            team_id: row.team_id,
            team_name: row.team_name,
            scheduled_at: row.scheduled_at,
            state,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<GamedayNomineeRow> for GamedayNominee {
    fn from(row: GamedayNomineeRow) -> Self {
        Self {
            id: row.id,
            gameday_id: row.gameday_id,
            member_id: row.member_id,
            user_id: row.user_id,
            label: row.label,
            is_primary: row.is_primary != 0,
            is_secondary: row.is_secondary != 0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub fn into_gamedays(rows: Vec<GamedayRow>) -> Result<Vec<Gameday>, AppError> {
    rows.into_iter().map(Gameday::try_from).collect()
}

pub fn flag(value: bool) -> i64 {
    i64::from(value)
}
