use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    pub created_at: i64, // epoch millis
    pub updated_at: i64, // epoch millis
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: String,
    pub team_id: String,
    pub user_id: String, // identity on the chat platform
    pub label: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberWithTeam {
    #[serde(flatten)]
    pub member: TeamMember,
    pub team_name: String,
}

/// A team together with its members after a join.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRoster {
    pub team: Team,
    pub members: Vec<TeamMember>,
    pub created: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInput {
    #[serde(default)]
    pub label: String,
    #[serde(default, rename = "value", alias = "userId", alias = "user_id")]
    pub user_id: String,
}

impl MemberInput {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.user_id.trim().is_empty() {
            return Err(AppError::Validation(
                "missing required field `member.value`".to_string(),
            ));
        }
        if self.label.trim().is_empty() {
            return Err(AppError::Validation(
                "missing required field `member.label`".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub member: MemberInput,
}

impl CreateTeamInput {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation(
                "missing required field `name`".to_string(),
            ));
        }
        self.member.validate()
    }
}
