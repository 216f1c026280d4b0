pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;

use rand::rngs::StdRng;

pub use config::Config;
use database::{
    Database,
    repositories::{GamedayRepository, TeamRepository},
};
pub use error::AppError;
pub use services::{GamedayService, SharedNotifier, TeamService};

pub struct AppState {
    pub db: Database,
    pub team_service: TeamService,
    pub gameday_service: GamedayService,
}

impl AppState {
    pub fn new(db: Database, notifier: SharedNotifier) -> Self {
        Self {
            team_service: TeamService::new(TeamRepository::new(db.clone()), notifier.clone()),
            gameday_service: GamedayService::new(GamedayRepository::new(db.clone()), notifier),
            db,
        }
    }

    /// Same wiring with a fixed random source for nominee draws.
    pub fn with_rng(db: Database, notifier: SharedNotifier, rng: StdRng) -> Self {
        Self {
            team_service: TeamService::new(TeamRepository::new(db.clone()), notifier.clone()),
            gameday_service: GamedayService::with_rng(
                GamedayRepository::new(db.clone()),
                notifier,
                rng,
            ),
            db,
        }
    }
}
