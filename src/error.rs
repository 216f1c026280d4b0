use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use thiserror::Error;

use crate::database::models::GamedayState;
use crate::handlers::shared::ApiResponse;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Team '{0}' already exists")]
    DuplicateTeam(String),

    #[error("User {user_id} is already a member of team {team_id}")]
    DuplicateMember { team_id: String, user_id: String },

    #[error("Team {team_id} already has a gameday scheduled at {scheduled_at}")]
    DuplicateSchedule { team_id: String, scheduled_at: i64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(
        "Invalid transition from {from} to {to}; allowed from {from}: {}",
        display_states(.allowed)
    )]
    InvalidTransition {
        from: GamedayState,
        to: GamedayState,
        allowed: Vec<GamedayState>,
    },

    #[error("Team {0} has no members eligible for nomination")]
    NoEligibleMembers(String),

    #[error("Unauthorized access: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    #[error("Internal server error{}", .0.as_ref().map_or("".to_string(), |s| format!(": {}", s)))]
    InternalServerError(Option<String>),
}

/// Error taxonomy preserved across the service boundary so the transport can
/// pick a response code without inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    InvalidTransition,
    NoEligibleMembers,
    Unauthorized,
    Store,
}

#[derive(Debug, Serialize)]
struct ErrorDetails {
    kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    allowed: Option<Vec<GamedayState>>,
}

fn display_states(states: &[GamedayState]) -> String {
    if states.is_empty() {
        return "none".to_string();
    }
    states
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::DuplicateTeam(_)
            | AppError::DuplicateMember { .. }
            | AppError::DuplicateSchedule { .. } => ErrorKind::Conflict,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            AppError::NoEligibleMembers(_) => ErrorKind::NoEligibleMembers,
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => ErrorKind::Store,
        }
    }

    pub fn internal_server_error_message(message: impl Into<String>) -> Self {
        AppError::InternalServerError(Some(message.into()))
    }

    pub fn internal_server_error() -> Self {
        AppError::InternalServerError(None)
    }

    /// Maps a unique-constraint violation to `duplicate` and a foreign-key
    /// violation to `missing`. Anything else stays a store error.
    pub fn on_constraint_violation(
        error: sqlx::Error,
        duplicate: impl FnOnce() -> AppError,
        missing: impl FnOnce() -> AppError,
    ) -> Self {
        let mapped = match error.as_database_error().map(|db_err| db_err.kind()) {
            Some(sqlx::error::ErrorKind::UniqueViolation) => duplicate(),
            Some(sqlx::error::ErrorKind::ForeignKeyViolation) => missing(),
            _ => return AppError::from(error),
        };
        log::debug!("Constraint violation mapped to: {}", mapped);
        mapped
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidTransition | ErrorKind::NoEligibleMembers => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Store => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_message = match self.kind() {
            // Driver detail stays in the logs.
            ErrorKind::Store => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        log::error!("Request failed with status {}: {}", status_code, self);

        let allowed = match self {
            AppError::InvalidTransition { allowed, .. } => Some(allowed.clone()),
            _ => None,
        };
        let details = ErrorDetails {
            kind: self.kind(),
            allowed,
        };

        HttpResponse::build(status_code).json(ApiResponse::error_with_data(details, &error_message))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        log::error!("Database error: {}", error);
        AppError::DatabaseError(error)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        log::error!("Anyhow error: {}", error);

        if error.is::<sqlx::Error>() {
            match error.downcast::<sqlx::Error>() {
                Ok(sqlx_err) => return AppError::DatabaseError(sqlx_err),
                Err(original_error) => {
                    return AppError::InternalServerError(Some(original_error.to_string()));
                }
            }
        }

        AppError::InternalServerError(Some(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_taxonomy() {
        assert_eq!(AppError::Validation("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(AppError::DuplicateTeam("Falcons".into()).kind(), ErrorKind::Conflict);
        assert_eq!(
            AppError::DuplicateSchedule {
                team_id: "t".into(),
                scheduled_at: 1
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(AppError::NotFound("g".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            AppError::NoEligibleMembers("t".into()).kind(),
            ErrorKind::NoEligibleMembers
        );
        assert_eq!(AppError::internal_server_error().kind(), ErrorKind::Store);
        assert_eq!(
            AppError::DatabaseError(sqlx::Error::PoolTimedOut).kind(),
            ErrorKind::Store
        );
    }

    #[test]
    fn status_codes_separate_client_and_server_errors() {
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::DuplicateTeam("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::InvalidTransition {
                from: GamedayState::Completed,
                to: GamedayState::InProgress,
                allowed: vec![],
            }
            .status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::DatabaseError(sqlx::Error::PoolTimedOut).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn invalid_transition_lists_allowed_targets() {
        let err = AppError::InvalidTransition {
            from: GamedayState::Scheduled,
            to: GamedayState::Completed,
            allowed: vec![GamedayState::InProgress, GamedayState::Cancelled],
        };
        assert_eq!(
            err.to_string(),
            "Invalid transition from scheduled to completed; allowed from scheduled: in_progress, cancelled"
        );

        let terminal = AppError::InvalidTransition {
            from: GamedayState::Completed,
            to: GamedayState::InProgress,
            allowed: vec![],
        };
        assert!(terminal.to_string().ends_with("allowed from completed: none"));
    }

    #[test]
    fn non_constraint_errors_stay_store_errors() {
        let err = AppError::on_constraint_violation(
            sqlx::Error::PoolTimedOut,
            || AppError::DuplicateTeam("Falcons".into()),
            || AppError::NotFound("Team t not found".into()),
        );
        assert_eq!(err.kind(), ErrorKind::Store);
    }
}
