use std::sync::{Arc, Mutex};

use rand::{SeedableRng, rngs::StdRng};

use crate::database::{
    models::{
        CreateGamedayInput, Gameday, GamedayDetails, GamedayNominee, LookupItem, ScheduledGameday,
    },
    repositories::GamedayRepository,
};
use crate::error::AppError;
use crate::services::{
    lifecycle::{self, GamedayAction},
    notifier::{SharedNotifier, notify_all},
    rotation::select_nominees,
};

pub fn scheduled_message(gameday: &Gameday) -> String {
    format!(
        "Gameday: **{}** is scheduled for {} UTC",
        gameday.title.to_uppercase(),
        gameday.scheduled_at_display()
    )
}

pub fn nomination_message(gameday: &Gameday, nominee: &GamedayNominee) -> String {
    format!(
        "You are the **{}** for Gameday: **{}**",
        nominee.role(),
        gameday.title.to_uppercase()
    )
}

pub fn transition_message(gameday: &Gameday, action: GamedayAction) -> String {
    format!(
        "Gameday **{}** just {}",
        gameday.title.to_uppercase(),
        action.past_tense()
    )
}

#[derive(Clone)]
pub struct GamedayService {
    repository: GamedayRepository,
    notifier: SharedNotifier,
    rng: Arc<Mutex<StdRng>>,
}

impl GamedayService {
    pub fn new(repository: GamedayRepository, notifier: SharedNotifier) -> Self {
        Self::with_rng(repository, notifier, StdRng::from_os_rng())
    }

    /// Uses the given random source for nominee draws. Tests pass a seeded one.
    pub fn with_rng(repository: GamedayRepository, notifier: SharedNotifier, rng: StdRng) -> Self {
        Self {
            repository,
            notifier,
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    /// Schedules a gameday and nominates its primary and secondary in one
    /// transaction, then tells the team.
    pub async fn create_gameday(
        &self,
        input: &CreateGamedayInput,
    ) -> Result<ScheduledGameday, AppError> {
        let new_gameday = input.validate()?;
        let team_id = new_gameday.team_id.clone();

        let scheduled = self
            .repository
            .create_gameday_with_nominees(&new_gameday, |members, on_duty| {
                let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
                select_nominees(members, on_duty, &mut *rng).map_err(|e| match e {
                    AppError::NoEligibleMembers(_) => AppError::NoEligibleMembers(team_id.clone()),
                    other => other,
                })
            })
            .await?;

        log::info!(
            "Scheduled gameday '{}' ({}) at {} with primary {} and secondary {}",
            scheduled.gameday.title,
            scheduled.gameday.id,
            scheduled.gameday.scheduled_at_display(),
            scheduled.primary.user_id,
            scheduled.secondary.user_id
        );

        let announcement = scheduled_message(&scheduled.gameday);
        let mut messages: Vec<(String, String)> = scheduled
            .members
            .iter()
            .map(|m| (m.user_id.clone(), announcement.clone()))
            .collect();
        messages.extend(
            scheduled
                .nominees
                .iter()
                .map(|n| (n.user_id.clone(), nomination_message(&scheduled.gameday, n))),
        );
        notify_all(self.notifier.as_ref(), &messages).await;

        Ok(scheduled)
    }

    /// Applies `action` to the gameday and notifies its nominees.
    pub async fn transition(
        &self,
        id: &str,
        action: GamedayAction,
    ) -> Result<GamedayDetails, AppError> {
        let current = self.find(id).await?;
        let to = action.target();
        let from = self
            .repository
            .advance_gameday_state(id, current.state, |from| lifecycle::transition(from, to))
            .await?;

        let gameday = self.find(id).await?;
        let nominees = self.repository.list_nominees(id).await?;
        log::info!("Gameday {} moved from {} to {}", id, from, to);

        let message = transition_message(&gameday, action);
        let mut messages: Vec<(String, String)> = Vec::with_capacity(nominees.len());
        for nominee in &nominees {
            if !messages.iter().any(|(user_id, _)| *user_id == nominee.user_id) {
                messages.push((nominee.user_id.clone(), message.clone()));
            }
        }
        notify_all(self.notifier.as_ref(), &messages).await;

        Ok(GamedayDetails { gameday, nominees })
    }

    pub async fn list_gamedays(&self) -> Result<Vec<Gameday>, AppError> {
        self.repository.list_active_gamedays().await
    }

    /// Gamedays `action` can currently be applied to.
    pub async fn lookup_gamedays(&self, action: GamedayAction) -> Result<Vec<LookupItem>, AppError> {
        let gamedays = self
            .repository
            .list_gamedays_by_state(action.source_states())
            .await?;
        Ok(gamedays.iter().map(LookupItem::from).collect())
    }

    pub async fn get_gameday(&self, id: &str) -> Result<GamedayDetails, AppError> {
        let gameday = self.find(id).await?;
        let nominees = self.repository.list_nominees(id).await?;
        Ok(GamedayDetails { gameday, nominees })
    }

    async fn find(&self, id: &str) -> Result<Gameday, AppError> {
        self.repository
            .get_gameday(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Gameday {} not found", id)))
    }
}
