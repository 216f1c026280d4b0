use actix_web::{HttpRequest, HttpResponse, web};

use crate::AppState;
use crate::auth::PlatformCall;
use crate::database::models::{CreateGamedayInput, GamedayIdInput};
use crate::error::AppError;
use crate::handlers::{
    markdown,
    shared::{ApiResponse, log_failure},
};
use crate::services::GamedayAction;

fn parse_action(raw: &str) -> Result<GamedayAction, AppError> {
    raw.parse::<GamedayAction>().map_err(AppError::NotFound)
}

/// Teams a gameday can be scheduled for.
pub async fn lookup_teams(
    _call: PlatformCall,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let items = state
        .team_service
        .lookup_teams()
        .await
        .map_err(log_failure(&req, "lookup teams"))?;

    Ok(ApiResponse::success(items).ok())
}

pub async fn create_gameday(
    _call: PlatformCall,
    state: web::Data<AppState>,
    input: web::Json<CreateGamedayInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let scheduled = state
        .gameday_service
        .create_gameday(&input)
        .await
        .map_err(log_failure(&req, "create gameday"))?;

    let message = format!("Gameday **{}** scheduled successfully", scheduled.gameday.title);
    Ok(ApiResponse::success_with_message(Some(scheduled), &message).created())
}

/// Active gamedays, with a markdown table in the message.
pub async fn list_gamedays(
    _call: PlatformCall,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let gamedays = state
        .gameday_service
        .list_gamedays()
        .await
        .map_err(log_failure(&req, "list gamedays"))?;

    let table = markdown::gamedays_table(&gamedays);
    Ok(ApiResponse::success_with_message(Some(gamedays), &table).ok())
}

pub async fn lookup_gamedays(
    _call: PlatformCall,
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let action = parse_action(&path)?;
    let items = state
        .gameday_service
        .lookup_gamedays(action)
        .await
        .map_err(log_failure(&req, "lookup gamedays"))?;

    Ok(ApiResponse::success(items).ok())
}

/// Handles `start`, `complete` and `cancel`.
pub async fn transition_gameday(
    call: PlatformCall,
    state: web::Data<AppState>,
    path: web::Path<String>,
    input: web::Json<GamedayIdInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let action = parse_action(&path)?;
    let id = input.validate()?;

    let details = state
        .gameday_service
        .transition(id, action)
        .await
        .map_err(log_failure(&req, action.as_str()))?;

    if let Some(user_id) = call.acting_user_id.as_deref() {
        log::info!("Gameday {} {} by {}", id, action.past_tense(), user_id);
    }

    let message = format!("Gameday just {}", action.past_tense());
    Ok(ApiResponse::success_with_message(Some(details), &message).ok())
}

pub async fn get_gameday(
    _call: PlatformCall,
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let details = state
        .gameday_service
        .get_gameday(&path)
        .await
        .map_err(log_failure(&req, "get gameday"))?;

    Ok(ApiResponse::success(details).ok())
}
