use chrono::Utc;
use sqlx::AnyConnection;

use crate::database::{
    Database,
    ids::new_id,
    models::{Team, TeamMember, TeamMemberWithTeam, TeamRoster},
    transaction::DatabaseTransaction,
    types::{TeamMemberRow, TeamMemberWithTeamRow, TeamRow},
    utils::sql,
};
use crate::error::AppError;

#[derive(Clone)]
pub struct TeamRepository {
    db: Database,
}

impl TeamRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create_team(&self, name: &str) -> Result<String, AppError> {
        let mut conn = self.db.pool().acquire().await?;
        let team = insert_team(&mut conn, name).await?;
        Ok(team.id)
    }

    /// Case-insensitive exact match on the team name.
    pub async fn get_team_by_name(&self, name: &str) -> Result<Option<Team>, AppError> {
        let mut conn = self.db.pool().acquire().await?;
        find_team_by_name(&mut conn, name).await
    }

    pub async fn get_team_by_id(&self, id: &str) -> Result<Option<Team>, AppError> {
        let mut conn = self.db.pool().acquire().await?;
        find_team_by_id(&mut conn, id).await
    }

    pub async fn list_teams(&self) -> Result<Vec<Team>, AppError> {
        let rows = sqlx::query_as::<_, TeamRow>(&sql(r#"
                SELECT
                    id,
                    name,
                    created_at,
                    updated_at
                FROM
                    team
                ORDER BY
                    name,
                    id
            "#))
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Team::from).collect())
    }

    pub async fn list_teams_with_members(&self) -> Result<Vec<TeamMemberWithTeam>, AppError> {
        let rows = sqlx::query_as::<_, TeamMemberWithTeamRow>(&sql(r#"
                SELECT
                    tm.id,
                    tm.team_id,
                    tm.user_id,
                    tm.label,
                    tm.created_at,
                    tm.updated_at,
                    t.name AS team_name
                FROM
                    team_member tm
                    INNER JOIN team t ON tm.team_id = t.id
                ORDER BY
                    t.name,
                    tm.created_at,
                    tm.id
            "#))
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(TeamMemberWithTeam::from).collect())
    }

    pub async fn add_member(
        &self,
        team_id: &str,
        user_id: &str,
        label: &str,
    ) -> Result<String, AppError> {
        let mut conn = self.db.pool().acquire().await?;
        let member = insert_member(&mut conn, team_id, user_id, label).await?;
        Ok(member.id)
    }

    pub async fn list_members(&self, team_id: &str) -> Result<Vec<TeamMember>, AppError> {
        let mut conn = self.db.pool().acquire().await?;
        members_of_team(&mut conn, team_id).await
    }

    /// Joins `user_id` to the team called `name`, creating the team first when
    /// no team matches the name case-insensitively. Runs in one transaction.
    pub async fn create_team_with_member(
        &self,
        name: &str,
        user_id: &str,
        label: &str,
    ) -> Result<TeamRoster, AppError> {
        let mut tx = self.db.begin().await?;

        let result = async {
            let (team, created) = match find_team_by_name(&mut tx, name).await? {
                Some(team) => (team, false),
                None => (insert_team(&mut tx, name).await?, true),
            };
            insert_member(&mut tx, &team.id, user_id, label).await?;
            let members = members_of_team(&mut tx, &team.id).await?;

            Ok::<_, AppError>(TeamRoster {
                team,
                members,
                created,
            })
        }
        .await;

        DatabaseTransaction::finish(tx, result).await
    }
}

/// Unicode lowercase form that team names are unique under. Folded here
/// because SQLite's `LOWER()` only handles ASCII.
pub(crate) fn team_name_key(name: &str) -> String {
    name.to_lowercase()
}

pub(crate) async fn insert_team(conn: &mut AnyConnection, name: &str) -> Result<Team, AppError> {
    let now = Utc::now().timestamp_millis();
    let team = Team {
        id: new_id(),
        name: name.to_string(),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(&sql(r#"
            INSERT INTO
                team (
                    id,
                    name,
                    name_key,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?)
        "#))
    .bind(&team.id)
    .bind(&team.name)
    .bind(team_name_key(name))
    .bind(team.created_at)
    .bind(team.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        AppError::on_constraint_violation(
            e,
            || AppError::DuplicateTeam(name.to_string()),
            AppError::internal_server_error,
        )
    })?;

    log::info!("Created team '{}' ({})", team.name, team.id);
    Ok(team)
}

pub(crate) async fn find_team_by_name(
    conn: &mut AnyConnection,
    name: &str,
) -> Result<Option<Team>, AppError> {
    let row = sqlx::query_as::<_, TeamRow>(&sql(r#"
            SELECT
                id,
                name,
                created_at,
                updated_at
            FROM
                team
            WHERE
                name_key = ?
        "#))
    .bind(team_name_key(name))
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Team::from))
}

pub(crate) async fn find_team_by_id(
    conn: &mut AnyConnection,
    id: &str,
) -> Result<Option<Team>, AppError> {
    let row = sqlx::query_as::<_, TeamRow>(&sql(r#"
            SELECT
                id,
                name,
                created_at,
                updated_at
            FROM
                team
            WHERE
                id = ?
        "#))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Team::from))
}

pub(crate) async fn insert_member(
    conn: &mut AnyConnection,
    team_id: &str,
    user_id: &str,
    label: &str,
) -> Result<TeamMember, AppError> {
    let now = Utc::now().timestamp_millis();
    let member = TeamMember {
        id: new_id(),
        team_id: team_id.to_string(),
        user_id: user_id.to_string(),
        label: label.to_string(),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(&sql(r#"
            INSERT INTO
                team_member (
                    id,
                    team_id,
                    user_id,
                    label,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?)
        "#))
    .bind(&member.id)
    .bind(&member.team_id)
    .bind(&member.user_id)
    .bind(&member.label)
    .bind(member.created_at)
    .bind(member.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        AppError::on_constraint_violation(
            e,
            || AppError::DuplicateMember {
                team_id: team_id.to_string(),
                user_id: user_id.to_string(),
            },
            || AppError::NotFound(format!("Team {} not found", team_id)),
        )
    })?;

    Ok(member)
}

pub(crate) async fn members_of_team(
    conn: &mut AnyConnection,
    team_id: &str,
) -> Result<Vec<TeamMember>, AppError> {
    let rows = sqlx::query_as::<_, TeamMemberRow>(&sql(r#"
            SELECT
                id,
                team_id,
                user_id,
                label,
                created_at,
                updated_at
            FROM
                team_member
            WHERE
                team_id = ?
            ORDER BY
                created_at,
                id
        "#))
    .bind(team_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(TeamMember::from).collect())
}
