use crate::database::{
    models::{CreateTeamInput, LookupItem, Team, TeamMemberWithTeam, TeamRoster},
    repositories::TeamRepository,
};
use crate::error::AppError;
use crate::services::notifier::{SharedNotifier, notify_all};

pub fn team_join_message(team_name: &str) -> String {
    format!("You are added in Team: **{}**", team_name.to_uppercase())
}

/// Runs `join` again once when it lost the race to create the team, so the
/// second attempt finds the team the other request inserted.
async fn retry_on_duplicate_team<F, Fut>(name: &str, mut join: F) -> Result<TeamRoster, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<TeamRoster, AppError>>,
{
    match join().await {
        Err(AppError::DuplicateTeam(_)) => {
            log::debug!("Team '{}' created concurrently, joining it", name);
            join().await
        }
        other => other,
    }
}

#[derive(Clone)]
pub struct TeamService {
    repository: TeamRepository,
    notifier: SharedNotifier,
}

impl TeamService {
    pub fn new(repository: TeamRepository, notifier: SharedNotifier) -> Self {
        Self {
            repository,
            notifier,
        }
    }

    /// Adds the member to the named team, creating the team if no team of
    /// that name exists yet.
    pub async fn create_team(&self, input: &CreateTeamInput) -> Result<TeamRoster, AppError> {
        input.validate()?;
        let name = input.name.trim();
        let user_id = input.member.user_id.trim();
        let label = input.member.label.trim();

        let repository = &self.repository;
        let roster = retry_on_duplicate_team(name, move || {
            repository.create_team_with_member(name, user_id, label)
        })
        .await?;

        log::info!(
            "User {} joined team '{}' ({} members)",
            user_id,
            roster.team.name,
            roster.members.len()
        );

        notify_all(
            self.notifier.as_ref(),
            &[(user_id.to_string(), team_join_message(&roster.team.name))],
        )
        .await;

        Ok(roster)
    }

    pub async fn list_teams(&self) -> Result<Vec<TeamMemberWithTeam>, AppError> {
        self.repository.list_teams_with_members().await
    }

    pub async fn lookup_teams(&self) -> Result<Vec<LookupItem>, AppError> {
        let teams = self.repository.list_teams().await?;
        Ok(teams.iter().map(LookupItem::from).collect())
    }

    pub async fn get_team(&self, id: &str) -> Result<Team, AppError> {
        self.repository
            .get_team_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Team {} not found", id)))
    }
}
