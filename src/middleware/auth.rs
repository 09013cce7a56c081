use actix_web::dev::Payload;
use actix_web::http::header::Header;
use actix_web::{FromRequest, HttpRequest, web};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{DecodingKey, EncodingKey, Header as JwtHeader, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::database::RedisService;
use crate::user::model::User;
use crate::utils::error::CustomError;

/// Cookie the login view sets so browser forms carry the token.
pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub id: i64,
    pub username: String,
    pub exp: usize,
}

#[derive(Clone)]
pub struct TokenSettings {
    secret: String,
    ttl_hours: i64,
}

impl TokenSettings {
    pub fn new(secret: impl Into<String>, ttl_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_hours,
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_hours.max(0).saturating_mul(3600) as u64
    }
}

pub fn create_token(user: &User, settings: &TokenSettings) -> Result<String, CustomError> {
    let expiration = chrono::Utc::now()
        .checked_add_signed(
            chrono::Duration::try_hours(settings.ttl_hours)
                .ok_or_else(|| CustomError::InternalServerError("Invalid token lifetime".to_string()))?,
        )
        .ok_or_else(|| CustomError::InternalServerError("Invalid token lifetime".to_string()))?
        .timestamp() as usize;

    let claims = Claims {
        id: user.id,
        username: user.username.clone(),
        exp: expiration,
    };

    encode(
        &JwtHeader::default(),
        &claims,
        &EncodingKey::from_secret(settings.secret.as_bytes()),
    )
    .map_err(|_| CustomError::InternalServerError("Token generation failed".to_string()))
}

pub fn decode_token(token: &str, settings: &TokenSettings) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

/// The caller behind a valid session. Handlers that take this extractor
/// are login-only: anonymous callers are redirected to the login page
/// with the current path as `next`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub username: String,
}

/// Optional variant for pages anyone may view.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthenticatedUser>);

fn request_token(req: &HttpRequest) -> Option<String> {
    if let Ok(auth) = Authorization::<Bearer>::parse(req) {
        return Some(auth.as_ref().token().to_string());
    }
    req.cookie(SESSION_COOKIE).map(|c| c.value().to_string())
}

async fn authenticate(req: &HttpRequest) -> Result<Option<AuthenticatedUser>, CustomError> {
    let Some(token) = request_token(req) else {
        return Ok(None);
    };

    let settings = req
        .app_data::<web::Data<TokenSettings>>()
        .ok_or_else(|| CustomError::InternalServerError("Token settings missing".to_string()))?;

    let Some(claims) = decode_token(&token, settings) else {
        log::debug!("rejecting undecodable token on {}", req.path());
        return Ok(None);
    };

    // Without Redis the signed token alone is trusted
    let Some(redis_service) = req.app_data::<web::Data<RedisService>>() else {
        return Ok(Some(AuthenticatedUser {
            id: claims.id,
            username: claims.username,
        }));
    };

    match redis_service.validate_session(&token).await {
        Ok(Some(stored_user_id)) if stored_user_id == claims.id => Ok(Some(AuthenticatedUser {
            id: claims.id,
            username: claims.username,
        })),
        Ok(_) => {
            log::debug!("session for user {} expired or replaced", claims.id);
            Ok(None)
        }
        Err(e) => {
            log::warn!("session lookup failed, trusting token: {}", e);
            Ok(Some(AuthenticatedUser {
                id: claims.id,
                username: claims.username,
            }))
        }
    }
}

fn return_path(req: &HttpRequest) -> String {
    req.uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.path().to_string())
}

impl FromRequest for AuthenticatedUser {
    type Error = CustomError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            authenticate(&req)
                .await?
                .ok_or_else(|| CustomError::UnauthenticatedError(return_path(&req)))
        })
    }
}

impl FromRequest for MaybeUser {
    type Error = CustomError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { authenticate(&req).await.map(MaybeUser) })
    }
}
