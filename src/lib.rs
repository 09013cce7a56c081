pub mod comment;
pub mod config;
pub mod database;
pub mod group;
pub mod middleware;
pub mod post;
pub mod router;
pub mod user;
pub mod utils;

use std::sync::Arc;

use actix_web::web;

use crate::comment::service::CommentService;
use crate::config::{AppConfig, StoreBackend};
use crate::database::{MemoryStore, RedisService, Store, connect_to_mongo, connect_to_redis};
use crate::group::service::GroupService;
use crate::middleware::auth::TokenSettings;
use crate::post::post_service::PostService;
use crate::user::model::CreateUserRequest;
use crate::user::service::UserService;
use crate::utils::error::CustomError;
use crate::utils::uploads::{MediaStorage, UploadService};

/// Urlencoded and JSON bodies above this are refused. Multipart uploads
/// are streamed and capped separately.
const FORM_BODY_LIMIT: usize = 256 * 1024;

/// Shared per-worker state handed to every handler.
#[derive(Clone)]
pub struct AppServices {
    pub posts: web::Data<PostService>,
    pub groups: web::Data<GroupService>,
    pub comments: web::Data<CommentService>,
    pub users: web::Data<UserService>,
    pub tokens: web::Data<TokenSettings>,
    pub redis: Option<web::Data<RedisService>>,
}

impl AppServices {
    pub fn new(
        store: Arc<dyn Store>,
        media: MediaStorage,
        tokens: TokenSettings,
        redis: Option<RedisService>,
    ) -> Self {
        let media = Arc::new(media);
        AppServices {
            posts: web::Data::new(PostService::new(store.clone(), media)),
            groups: web::Data::new(GroupService::new(store.clone())),
            comments: web::Data::new(CommentService::new(store.clone())),
            users: web::Data::new(UserService::new(store, tokens.clone(), redis.clone())),
            tokens: web::Data::new(tokens),
            redis: redis.map(web::Data::new),
        }
    }

    /// Connects the configured backends.
    pub async fn from_config(config: &AppConfig) -> Result<Self, String> {
        let store: Arc<dyn Store> = match config.store_backend {
            StoreBackend::Mongo => Arc::new(
                connect_to_mongo(&config.mongodb_uri, &config.mongodb_database)
                    .await
                    .map_err(|e| format!("Failed to connect to MongoDB: {}", e))?,
            ),
            StoreBackend::Memory => {
                log::warn!("using the in-memory store, data is lost on restart");
                Arc::new(MemoryStore::new())
            }
        };

        let redis = match &config.redis_url {
            Some(url) => Some(connect_to_redis(url).await?),
            None => None,
        };

        let media = match &config.cloudinary {
            Some(cloudinary) => MediaStorage::Cloudinary(UploadService::with_config(cloudinary.clone())),
            None => MediaStorage::local(config.media_root.clone(), config.media_url.clone()),
        };

        let services = Self::new(
            store,
            media,
            TokenSettings::new(config.jwt_secret.clone(), config.token_ttl_hours),
            redis,
        );

        if let Some((username, password)) = &config.admin {
            services
                .users
                .ensure_staff_user(CreateUserRequest {
                    username: username.clone(),
                    password: password.clone(),
                })
                .await
                .map_err(|e| format!("Failed to create admin account: {}", e))?;
        }

        Ok(services)
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.posts.clone())
            .app_data(self.groups.clone())
            .app_data(self.comments.clone())
            .app_data(self.users.clone())
            .app_data(self.tokens.clone())
            .app_data(
                web::FormConfig::default()
                    .limit(FORM_BODY_LIMIT)
                    .error_handler(|err, _| CustomError::BadRequestError(err.to_string()).into()),
            )
            .app_data(
                web::JsonConfig::default()
                    .limit(FORM_BODY_LIMIT)
                    .error_handler(|err, _| CustomError::BadRequestError(err.to_string()).into()),
            );
        if let Some(redis) = &self.redis {
            cfg.app_data(redis.clone());
        }
        cfg.configure(router::index::routes);
    }
}
