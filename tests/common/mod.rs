#![allow(dead_code)]

use std::env;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use rand::{SeedableRng, rngs::StdRng};
use tempfile::TempDir;

use chaos_engine::config::Config;
use chaos_engine::database::{
    Database, init_database,
    models::{CreateGamedayInput, CreateTeamInput, MemberInput, TeamRoster},
    repositories::{GamedayRepository, TeamRepository},
};
use chaos_engine::handlers::shared::ApiResponse;
use chaos_engine::services::{GamedayService, Notifier, NotifyError, SharedNotifier, TeamService};
use chaos_engine::AppState;

pub const TEST_SEED: u64 = 0x5eed;

/// Captures every notification instead of sending it.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, user_id: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(u, _)| u == user_id)
            .map(|(_, m)| m)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, user_id: &str, message: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((user_id.to_string(), message.to_string()));
        Ok(())
    }
}

/// Rejects every notification.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _user_id: &str, _message: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("connection refused".to_string()))
    }
}

pub struct TestContext {
    pub db: Database,
    pub config: Config,
    pub notifier: Arc<RecordingNotifier>,
    pub temp_dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let database_url = format!("sqlite:{}/test.db", temp_dir.path().display());

        let config = Config {
            database_url: database_url.clone(),
            db_max_connections: 1,
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
            app_secret: None,
            notify_webhook_url: None,
        };

        let db = init_database(&database_url, config.db_max_connections).await?;

        Ok(TestContext {
            db,
            config,
            notifier: Arc::new(RecordingNotifier::default()),
            temp_dir,
        })
    }

    pub fn shared_notifier(&self) -> SharedNotifier {
        self.notifier.clone()
    }

    pub fn team_repository(&self) -> TeamRepository {
        TeamRepository::new(self.db.clone())
    }

    pub fn gameday_repository(&self) -> GamedayRepository {
        GamedayRepository::new(self.db.clone())
    }

    pub fn team_service(&self) -> TeamService {
        TeamService::new(self.team_repository(), self.shared_notifier())
    }

    pub fn gameday_service(&self) -> GamedayService {
        self.gameday_service_with(self.shared_notifier())
    }

    pub fn gameday_service_with(&self, notifier: SharedNotifier) -> GamedayService {
        GamedayService::with_rng(
            self.gameday_repository(),
            notifier,
            StdRng::seed_from_u64(TEST_SEED),
        )
    }

    pub fn app_state(&self) -> AppState {
        AppState::with_rng(
            self.db.clone(),
            self.shared_notifier(),
            StdRng::seed_from_u64(TEST_SEED),
        )
    }

    /// Creates `team` with the given `(user_id, label)` members, in order.
    pub async fn seed_team(&self, team: &str, members: &[(&str, &str)]) -> Result<TeamRoster> {
        let service = self.team_service();
        let mut roster = None;
        for (user_id, label) in members {
            roster = Some(service.create_team(&team_input(team, user_id, label)).await?);
        }
        roster.ok_or_else(|| anyhow::anyhow!("seed_team needs at least one member"))
    }
}

pub fn team_input(name: &str, user_id: &str, label: &str) -> CreateTeamInput {
    CreateTeamInput {
        name: name.to_string(),
        member: MemberInput {
            label: label.to_string(),
            user_id: user_id.to_string(),
        },
    }
}

pub fn gameday_input(title: &str, team_id: &str, scheduled_at: &str) -> CreateGamedayInput {
    CreateGamedayInput {
        title: title.to_string(),
        team_id: team_id.to_string(),
        scheduled_at: scheduled_at.to_string(),
    }
}

pub fn setup_test_env() {
    unsafe {
        env::set_var("RUST_LOG", "debug");
    }
    let _ = env_logger::builder().is_test(true).try_init();
}

// Test assertion helpers
pub struct TestAssertions;

impl TestAssertions {
    pub fn assert_success_response<T>(body: &[u8]) -> T
    where
        T: serde::de::DeserializeOwned,
    {
        let response: ApiResponse<T> =
            serde_json::from_slice(body).expect("Failed to parse JSON response");

        assert!(
            response.success,
            "Expected successful response but got error: {:?}",
            response.message
        );
        response.data.expect("Expected data in successful response")
    }

    pub async fn assert_record_count(db: &Database, table: &str, expected_count: i64) {
        let query = format!("SELECT COUNT(*) AS count FROM {}", table);
        let result = sqlx::query_scalar::<_, i64>(&query)
            .fetch_one(db.pool())
            .await
            .expect("Failed to count records");

        assert_eq!(
            result, expected_count,
            "Expected {} records in {} table, but found {}",
            expected_count, table, result
        );
    }
}
