use std::sync::Arc;

use chrono::Utc;

use crate::database::{RedisService, Store};
use crate::middleware::auth::{AuthenticatedUser, TokenSettings, create_token};
use crate::user::model::{CreateUserRequest, NewUser, User};
use crate::utils::error::CustomError;
use crate::utils::hashing;
use crate::utils::model::LoginRequests;
use crate::utils::validation::{validate_password, validate_username};

pub struct UserService {
    store: Arc<dyn Store>,
    tokens: TokenSettings,
    redis: Option<RedisService>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>, tokens: TokenSettings, redis: Option<RedisService>) -> Self {
        UserService {
            store,
            tokens,
            redis,
        }
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User, CustomError> {
        self.insert_user(request, false).await
    }

    pub async fn create_staff_user(&self, request: CreateUserRequest) -> Result<User, CustomError> {
        self.insert_user(request, true).await
    }

    /// Startup bootstrap of the administrator account. An existing user
    /// with that name is left untouched.
    pub async fn ensure_staff_user(&self, request: CreateUserRequest) -> Result<(), CustomError> {
        if let Some(existing) = self.store.find_user_by_username(&request.username).await? {
            if !existing.is_staff {
                log::warn!("admin account '{}' exists without staff rights", existing.username);
            }
            return Ok(());
        }
        let user = self.create_staff_user(request).await?;
        log::info!("created staff account '{}'", user.username);
        Ok(())
    }

    async fn insert_user(&self, request: CreateUserRequest, is_staff: bool) -> Result<User, CustomError> {
        validate_username(&request.username)?;
        validate_password(&request.password)?;

        let hashed_password = hashing::hash_password(&request.password)
            .map_err(|e| CustomError::InternalServerError(e.to_string()))?;

        let user = self
            .store
            .insert_user(NewUser {
                username: request.username,
                password: hashed_password,
                is_staff,
                date_joined: Utc::now(),
            })
            .await?;

        log::info!("user {} registered as '{}'", user.id, user.username);
        Ok(user)
    }

    pub async fn authenticate_user(&self, username: &str, password: &str) -> Result<User, CustomError> {
        let user = self
            .store
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| CustomError::UnauthorizedError("Invalid credentials".to_string()))?;

        if !hashing::verify_password(password, &user.password)
            .map_err(|_| CustomError::UnauthorizedError("Invalid credentials".to_string()))?
        {
            return Err(CustomError::UnauthorizedError(
                "Invalid credentials".to_string(),
            ));
        }

        Ok(user)
    }

    pub fn token_ttl_seconds(&self) -> u64 {
        self.tokens.ttl_seconds()
    }

    /// Checks credentials and opens a session. Returns the signed token.
    pub async fn login_fn(&self, login_data: LoginRequests) -> Result<(User, String), CustomError> {
        let user = self
            .authenticate_user(&login_data.username, &login_data.password)
            .await?;

        let token = create_token(&user, &self.tokens)?;

        if let Some(redis) = &self.redis {
            redis
                .store_session(user.id, &token, self.tokens.ttl_seconds())
                .await
                .map_err(|e| CustomError::InternalServerError(format!("Failed to store session: {}", e)))?;
        }

        log::info!("user '{}' logged in", user.username);
        Ok((user, token))
    }

    pub async fn logout(&self, user: &AuthenticatedUser) -> Result<(), CustomError> {
        if let Some(redis) = &self.redis {
            redis.invalidate_session(user.id).await.map_err(|e| {
                CustomError::InternalServerError(format!("Failed to invalidate session: {}", e))
            })?;
        }
        Ok(())
    }

    /// Admin surface is limited to staff accounts.
    pub async fn require_staff(&self, caller: &AuthenticatedUser) -> Result<User, CustomError> {
        match self.store.find_user(caller.id).await? {
            Some(user) if user.is_staff => Ok(user),
            _ => Err(CustomError::PermissionDeniedError(
                "Staff account required".to_string(),
            )),
        }
    }

    /// Removes an account together with its posts and comments.
    pub async fn delete_user(&self, username: &str) -> Result<(), CustomError> {
        let user = self
            .store
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| CustomError::NotFoundError(format!("User '{}' not found", username)))?;

        if let Some(redis) = &self.redis {
            if let Err(e) = redis.invalidate_session(user.id).await {
                log::warn!("could not drop session of deleted user {}: {}", user.id, e);
            }
        }

        if !self.store.delete_user(user.id).await? {
            return Err(CustomError::NotFoundError(format!("User '{}' not found", username)));
        }

        log::info!("user '{}' deleted", username);
        Ok(())
    }
}
