use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::future::{Ready, ready};

use crate::config::Config;
use crate::error::AppError;

/// Claims carried by a signed call from the chat platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformClaims {
    #[serde(default)]
    pub acting_user_id: Option<String>,
    pub exp: usize, // expiration time
}

/// An inbound platform call that passed verification.
///
/// With an app secret configured the request must carry
/// `Authorization: Bearer <jwt>` signed HS256 with that secret. Without one
/// every call is accepted and no acting user is known.
#[derive(Debug, Clone, Default)]
pub struct PlatformCall {
    pub acting_user_id: Option<String>,
}

impl PlatformCall {
    pub fn verify(secret: &str, token: &str) -> Result<PlatformClaims, AppError> {
        decode::<PlatformClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            log::debug!("Rejected platform token: {}", e);
            AppError::Unauthorized("Invalid token".to_string())
        })
    }

    fn from_headers(req: &HttpRequest) -> Result<Self, AppError> {
        let Some(config) = req.app_data::<Data<Config>>() else {
            return Err(AppError::internal_server_error_message(
                "Configuration missing from app data",
            ));
        };
        let Some(secret) = config.app_secret.as_deref() else {
            return Ok(PlatformCall::default());
        };

        let token = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .ok_or_else(|| {
                AppError::Unauthorized("Missing or invalid authorization header".to_string())
            })?;

        let claims = Self::verify(secret, token)?;
        Ok(PlatformCall {
            acting_user_id: claims.acting_user_id,
        })
    }
}

impl FromRequest for PlatformCall {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_headers(req))
    }
}

/// Signs a platform token. Used by tests and local tooling to build calls.
pub fn sign_platform_token(
    secret: &str,
    acting_user_id: Option<&str>,
    exp: usize,
) -> Result<String, AppError> {
    let claims = PlatformClaims {
        acting_user_id: acting_user_id.map(str::to_string),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_server_error_message(e.to_string()))
}
