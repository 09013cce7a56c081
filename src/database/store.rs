use async_trait::async_trait;
use thiserror::Error;

use crate::comment::model::{Comment, NewComment};
use crate::group::model::{Group, NewGroup};
use crate::post::post_model::{NewPost, Post, PostChanges, PostFilter};
use crate::user::model::{NewUser, User};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique field (username, group slug) is already taken.
    #[error("duplicate {0}")]
    Duplicate(String),

    #[error("sequence {0} could not be advanced")]
    Sequence(String),

    #[error("mongodb: {0}")]
    Mongo(#[from] mongodb::error::Error),
}

/// Everything the services need from the data store.
///
/// Backends keep the referential rules of the data model themselves:
/// removing a group clears the group of its posts, removing a user removes
/// their posts and every comment written by them or left on those posts.
/// Post listings are ordered by `pub_date` descending, ties by id descending.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn delete_user(&self, id: i64) -> Result<bool, StoreError>;

    async fn insert_group(&self, group: NewGroup) -> Result<Group, StoreError>;
    async fn find_group(&self, id: i64) -> Result<Option<Group>, StoreError>;
    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>, StoreError>;
    async fn list_groups(&self) -> Result<Vec<Group>, StoreError>;
    async fn delete_group(&self, id: i64) -> Result<bool, StoreError>;

    async fn insert_post(&self, post: NewPost) -> Result<Post, StoreError>;
    async fn find_post(&self, id: i64) -> Result<Option<Post>, StoreError>;
    async fn update_post(&self, id: i64, changes: PostChanges) -> Result<Option<Post>, StoreError>;
    async fn count_posts(&self, filter: PostFilter) -> Result<u64, StoreError>;
    async fn list_posts(
        &self,
        filter: PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, StoreError>;

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, StoreError>;
    /// Oldest first.
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, StoreError>;
}
