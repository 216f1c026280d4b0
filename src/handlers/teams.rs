use actix_web::{HttpRequest, HttpResponse, web};

use crate::AppState;
use crate::auth::PlatformCall;
use crate::database::models::CreateTeamInput;
use crate::error::AppError;
use crate::handlers::{
    markdown,
    shared::{ApiResponse, log_failure},
};

/// Creates the team if needed and adds the member to it.
pub async fn create_team(
    _call: PlatformCall,
    state: web::Data<AppState>,
    input: web::Json<CreateTeamInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let roster = state
        .team_service
        .create_team(&input)
        .await
        .map_err(log_failure(&req, "create team"))?;

    if roster.created {
        let message = format!("Team **{}** created", roster.team.name);
        Ok(ApiResponse::success_with_message(Some(roster), &message).created())
    } else {
        let message = format!("Joined team **{}**", roster.team.name);
        Ok(ApiResponse::success_with_message(Some(roster), &message).ok())
    }
}

pub async fn list_teams(
    _call: PlatformCall,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let members = state
        .team_service
        .list_teams()
        .await
        .map_err(log_failure(&req, "list teams"))?;

    let table = markdown::teams_table(&members);
    Ok(ApiResponse::success_with_message(Some(members), &table).ok())
}
