use chrono::Utc;
use sqlx::AnyConnection;

use super::team::{find_team_by_id, members_of_team};
use crate::database::{
    Database,
    ids::new_id,
    models::{
        Gameday, GamedayNominee, GamedayState, NewGameday, NewNominee, Nomination,
        ScheduledGameday, TeamMember,
    },
    transaction::DatabaseTransaction,
    types::{GamedayNomineeRow, GamedayRow, flag, into_gamedays},
    utils::{placeholders, sql},
};
use crate::error::AppError;

const SELECT_GAMEDAY: &str = r#"
    SELECT
        g.id,
        g.title,
        g.team_id,
        t.name AS team_name,
        g.scheduled_at,
        g.state,
        g.created_at,
        g.updated_at
    FROM
        gameday g
        INNER JOIN team t ON g.team_id = t.id
"#;

const SELECT_NOMINEE: &str = r#"
    SELECT
        n.id,
        n.gameday_id,
        n.member_id,
        tm.user_id,
        tm.label,
        n.is_primary,
        n.is_secondary,
        n.created_at,
        n.updated_at
    FROM
        gameday_nominee n
        INNER JOIN team_member tm ON n.member_id = tm.id
        INNER JOIN gameday g ON n.gameday_id = g.id
"#;

#[derive(Clone)]
pub struct GamedayRepository {
    db: Database,
}

impl GamedayRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Inserts a gameday in `scheduled` state without nominating anyone.
    pub async fn create_gameday(&self, input: &NewGameday) -> Result<String, AppError> {
        let mut conn = self.db.pool().acquire().await?;
        let id = insert_gameday(&mut conn, input).await?;
        Ok(id)
    }

    /// Schedules a gameday and its two nominees as one unit.
    ///
    /// Inside a single transaction: the team is verified, the gameday row is
    /// inserted, `nominate` is handed the team's members and the nominees of
    /// the team's active gamedays, and the primary and secondary rows are
    /// written. Any error (including one returned by `nominate`) rolls the
    /// whole unit back, so no gameday is ever left without nominees.
    pub async fn create_gameday_with_nominees<F>(
        &self,
        input: &NewGameday,
        nominate: F,
    ) -> Result<ScheduledGameday, AppError>
    where
        F: FnOnce(&[TeamMember], &[GamedayNominee]) -> Result<Nomination, AppError>,
    {
        let mut tx = self.db.begin().await?;

        let result = async {
            let team = find_team_by_id(&mut tx, &input.team_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Team {} not found", input.team_id)))?;

            let gameday_id = insert_gameday(&mut tx, input).await?;
            let members = members_of_team(&mut tx, &team.id).await?;
            let on_duty = active_nominees_for_team(&mut tx, &team.id).await?;

            let nomination = nominate(&members, &on_duty)?;

            let primary = insert_nominee(
                &mut tx,
                &NewNominee {
                    gameday_id: gameday_id.clone(),
                    member_id: nomination.primary.id.clone(),
                    is_primary: true,
                    is_secondary: false,
                },
            )
            .await?;
            let secondary = insert_nominee(
                &mut tx,
                &NewNominee {
                    gameday_id: gameday_id.clone(),
                    member_id: nomination.secondary.id.clone(),
                    is_primary: false,
                    is_secondary: true,
                },
            )
            .await?;

            let gameday = find_gameday(&mut tx, &gameday_id)
                .await?
                .ok_or_else(|| AppError::internal_server_error_message("Inserted gameday vanished"))?;

            Ok::<_, AppError>(ScheduledGameday {
                gameday,
                nominees: vec![
                    nominee_for(primary, &nomination.primary),
                    nominee_for(secondary, &nomination.secondary),
                ],
                primary: nomination.primary,
                secondary: nomination.secondary,
                members,
            })
        }
        .await;

        DatabaseTransaction::finish(tx, result).await
    }

    pub async fn get_gameday(&self, id: &str) -> Result<Option<Gameday>, AppError> {
        let mut conn = self.db.pool().acquire().await?;
        find_gameday(&mut conn, id).await
    }

    pub async fn list_active_gamedays(&self) -> Result<Vec<Gameday>, AppError> {
        self.list_gamedays_by_state(&GamedayState::ACTIVE).await
    }

    /// Gamedays in any of `states`, ordered by schedule time then id.
    pub async fn list_gamedays_by_state(
        &self,
        states: &[GamedayState],
    ) -> Result<Vec<Gameday>, AppError> {
        let mut wanted: Vec<GamedayState> = Vec::with_capacity(states.len());
        for state in states {
            if !wanted.contains(state) {
                wanted.push(*state);
            }
        }
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let query = sql(&format!(
            "{} WHERE g.state IN ({}) ORDER BY g.scheduled_at, g.id",
            SELECT_GAMEDAY,
            placeholders(wanted.len())
        ));
        let mut q = sqlx::query_as::<_, GamedayRow>(&query);
        for state in &wanted {
            q = q.bind(state.as_str());
        }
        let rows = q.fetch_all(self.db.pool()).await?;

        into_gamedays(rows)
    }

    /// Unconditionally sets the state. Legality is the caller's concern.
    pub async fn update_gameday_state(
        &self,
        id: &str,
        state: GamedayState,
    ) -> Result<(), AppError> {
        let result = sqlx::query(&sql(r#"
                UPDATE
                    gameday
                SET
                    state = ?,
                    updated_at = ?
                WHERE
                    id = ?
            "#))
        .bind(state.as_str())
        .bind(Utc::now().timestamp_millis())
        .bind(id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Gameday {} not found", id)));
        }
        Ok(())
    }

    /// Moves the gameday from `from` to `to` only if it is still in `from`.
    /// Returns whether the row was updated.
    pub async fn transition_gameday_state(
        &self,
        id: &str,
        from: GamedayState,
        to: GamedayState,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(&sql(r#"
                UPDATE
                    gameday
                SET
                    state = ?,
                    updated_at = ?
                WHERE
                    id = ?
                    AND state = ?
            "#))
        .bind(to.as_str())
        .bind(Utc::now().timestamp_millis())
        .bind(id)
        .bind(from.as_str())
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Moves the gameday out of `seen`, the state the caller last read, into
    /// the state `step` allows from there. When another writer changed the
    /// row first, the current state is read again and `step` is asked again,
    /// so only a move that `step` rejects fails. Returns the state left.
    pub async fn advance_gameday_state<F>(
        &self,
        id: &str,
        seen: GamedayState,
        step: F,
    ) -> Result<GamedayState, AppError>
    where
        F: Fn(GamedayState) -> Result<GamedayState, AppError>,
    {
        let mut from = seen;
        loop {
            let to = step(from)?;
            if self.transition_gameday_state(id, from, to).await? {
                return Ok(from);
            }

            let current = self
                .get_gameday(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Gameday {} not found", id)))?;
            log::debug!(
                "Gameday {} left {} concurrently, now {}",
                id,
                from,
                current.state
            );
            from = current.state;
        }
    }

    pub async fn create_nominee(&self, input: &NewNominee) -> Result<String, AppError> {
        let mut conn = self.db.pool().acquire().await?;
        let created = insert_nominee(&mut conn, input).await?;
        Ok(created.id)
    }

    pub async fn list_nominees(&self, gameday_id: &str) -> Result<Vec<GamedayNominee>, AppError> {
        let query = sql(&format!(
            "{} WHERE n.gameday_id = ? ORDER BY n.is_primary DESC, n.created_at, n.id",
            SELECT_NOMINEE
        ));
        let rows = sqlx::query_as::<_, GamedayNomineeRow>(&query)
            .bind(gameday_id)
            .fetch_all(self.db.pool())
            .await?;

        Ok(rows.into_iter().map(GamedayNominee::from).collect())
    }

    /// Nominees of every active gameday belonging to the same team as `gameday_id`.
    pub async fn list_active_nominees(
        &self,
        gameday_id: &str,
    ) -> Result<Vec<GamedayNominee>, AppError> {
        let mut conn = self.db.pool().acquire().await?;
        let gameday = find_gameday(&mut conn, gameday_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Gameday {} not found", gameday_id)))?;

        active_nominees_for_team(&mut conn, &gameday.team_id).await
    }
}

struct InsertedNominee {
    id: String,
    gameday_id: String,
    is_primary: bool,
    is_secondary: bool,
    created_at: i64,
}

fn nominee_for(row: InsertedNominee, member: &TeamMember) -> GamedayNominee {
    GamedayNominee {
        id: row.id,
        gameday_id: row.gameday_id,
        member_id: member.id.clone(),
        user_id: member.user_id.clone(),
        label: member.label.clone(),
        is_primary: row.is_primary,
        is_secondary: row.is_secondary,
        created_at: row.created_at,
        updated_at: row.created_at,
    }
}

async fn insert_gameday(conn: &mut AnyConnection, input: &NewGameday) -> Result<String, AppError> {
    let id = new_id();
    let now = Utc::now().timestamp_millis();

    sqlx::query(&sql(r#"
            INSERT INTO
                gameday (
                    id,
                    title,
                    team_id,
                    scheduled_at,
                    state,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?)
        "#))
    .bind(&id)
    .bind(&input.title)
    .bind(&input.team_id)
    .bind(input.scheduled_at)
    .bind(GamedayState::Scheduled.as_str())
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        AppError::on_constraint_violation(
            e,
            || AppError::DuplicateSchedule {
                team_id: input.team_id.clone(),
                scheduled_at: input.scheduled_at,
            },
            || AppError::NotFound(format!("Team {} not found", input.team_id)),
        )
    })?;

    log::info!(
        "Created gameday '{}' ({}) for team {}",
        input.title,
        id,
        input.team_id
    );
    Ok(id)
}

async fn insert_nominee(
    conn: &mut AnyConnection,
    input: &NewNominee,
) -> Result<InsertedNominee, AppError> {
    let id = new_id();
    let now = Utc::now().timestamp_millis();

    sqlx::query(&sql(r#"
            INSERT INTO
                gameday_nominee (
                    id,
                    gameday_id,
                    member_id,
                    is_primary,
                    is_secondary,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?)
        "#))
    .bind(&id)
    .bind(&input.gameday_id)
    .bind(&input.member_id)
    .bind(flag(input.is_primary))
    .bind(flag(input.is_secondary))
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        AppError::on_constraint_violation(
            e,
            || {
                AppError::Validation(format!(
                    "Gameday {} already has a {} nominee",
                    input.gameday_id,
                    if input.is_primary { "primary" } else { "secondary" }
                ))
            },
            || {
                AppError::NotFound(format!(
                    "Gameday {} or member {} not found",
                    input.gameday_id, input.member_id
                ))
            },
        )
    })?;

    Ok(InsertedNominee {
        id,
        gameday_id: input.gameday_id.clone(),
        is_primary: input.is_primary,
        is_secondary: input.is_secondary,
        created_at: now,
    })
}

async fn find_gameday(conn: &mut AnyConnection, id: &str) -> Result<Option<Gameday>, AppError> {
    let query = sql(&format!("{} WHERE g.id = ?", SELECT_GAMEDAY));
    let row = sqlx::query_as::<_, GamedayRow>(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(Gameday::try_from).transpose()
}

async fn active_nominees_for_team(
    conn: &mut AnyConnection,
    team_id: &str,
) -> Result<Vec<GamedayNominee>, AppError> {
    let query = sql(&format!(
        "{} WHERE g.team_id = ? AND g.state IN ({}) ORDER BY n.created_at, n.id",
        SELECT_NOMINEE,
        placeholders(GamedayState::ACTIVE.len())
    ));
    let mut q = sqlx::query_as::<_, GamedayNomineeRow>(&query).bind(team_id);
    for state in GamedayState::ACTIVE {
        q = q.bind(state.as_str());
    }
    let rows = q.fetch_all(&mut *conn).await?;

    Ok(rows.into_iter().map(GamedayNominee::from).collect())
}
