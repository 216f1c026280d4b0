use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::database::models::GamedayState;
use crate::error::AppError;

/// User-facing lifecycle commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamedayAction {
    Start,
    Complete,
    Cancel,
}

impl GamedayAction {
    pub const ALL: [GamedayAction; 3] = [
        GamedayAction::Start,
        GamedayAction::Complete,
        GamedayAction::Cancel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GamedayAction::Start => "start",
            GamedayAction::Complete => "complete",
            GamedayAction::Cancel => "cancel",
        }
    }

    pub fn target(&self) -> GamedayState {
        match self {
            GamedayAction::Start => GamedayState::InProgress,
            GamedayAction::Complete => GamedayState::Completed,
            GamedayAction::Cancel => GamedayState::Cancelled,
        }
    }

    /// States a gameday must be in for this action to apply.
    pub fn source_states(&self) -> &'static [GamedayState] {
        match self {
            GamedayAction::Start => &[GamedayState::Scheduled],
            GamedayAction::Complete => &[GamedayState::InProgress],
            GamedayAction::Cancel => &[GamedayState::Scheduled, GamedayState::InProgress],
        }
    }

    /// Past-tense verb used in notifications.
    pub fn past_tense(&self) -> &'static str {
        match self {
            GamedayAction::Start => "started",
            GamedayAction::Complete => "completed",
            GamedayAction::Cancel => "cancelled",
        }
    }
}

impl fmt::Display for GamedayAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GamedayAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "start" => Ok(GamedayAction::Start),
            "complete" => Ok(GamedayAction::Complete),
            "cancel" => Ok(GamedayAction::Cancel),
            _ => Err(format!("Invalid gameday action: {}", s)),
        }
    }
}

pub fn allowed_transitions(from: GamedayState) -> Vec<GamedayState> {
    match from {
        GamedayState::Scheduled => vec![GamedayState::InProgress, GamedayState::Cancelled],
        GamedayState::InProgress => vec![GamedayState::Completed, GamedayState::Cancelled],
        GamedayState::Cancelled | GamedayState::Completed => Vec::new(),
    }
}

/// Checks a single step of the state machine. Re-applying the current state is
/// rejected like any other illegal move.
pub fn transition(from: GamedayState, to: GamedayState) -> Result<GamedayState, AppError> {
    let allowed = allowed_transitions(from);
    if allowed.contains(&to) {
        Ok(to)
    } else {
        Err(AppError::InvalidTransition { from, to, allowed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use GamedayState::*;

    #[test]
    fn happy_path_runs_in_order() {
        assert_eq!(transition(Scheduled, InProgress).unwrap(), InProgress);
        assert_eq!(transition(InProgress, Completed).unwrap(), Completed);
    }

    #[test]
    fn cancel_is_allowed_from_both_active_states() {
        assert!(transition(Scheduled, Cancelled).is_ok());
        assert!(transition(InProgress, Cancelled).is_ok());
    }

    #[test]
    fn terminal_states_go_nowhere() {
        for from in [Completed, Cancelled] {
            for to in GamedayState::ALL {
                match transition(from, *to) {
                    Err(AppError::InvalidTransition { allowed, .. }) => assert!(allowed.is_empty()),
                    other => panic!("expected invalid transition, got {:?}", other),
                }
            }
        }
    }

    #[test]
    fn repeating_a_transition_is_an_error() {
        assert!(matches!(
            transition(InProgress, InProgress),
            Err(AppError::InvalidTransition { .. })
        ));
        assert!(matches!(
            transition(Scheduled, Scheduled),
            Err(AppError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn skipping_start_is_rejected() {
        match transition(Scheduled, Completed) {
            Err(AppError::InvalidTransition { allowed, .. }) => {
                assert_eq!(allowed, vec![InProgress, Cancelled]);
            }
            other => panic!("expected invalid transition, got {:?}", other),
        }
    }

    #[test]
    fn every_action_source_state_allows_its_target() {
        for action in GamedayAction::ALL {
            for from in action.source_states() {
                assert!(transition(*from, action.target()).is_ok(), "{} from {}", action, from);
            }
        }
    }

    #[test]
    fn actions_parse_case_insensitively() {
        assert_eq!("Start".parse::<GamedayAction>().unwrap(), GamedayAction::Start);
        assert!("restart".parse::<GamedayAction>().is_err());
    }
}
