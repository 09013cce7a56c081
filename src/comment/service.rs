use std::sync::Arc;

use chrono::Utc;

use crate::comment::model::{Comment, CommentForm, NewComment};
use crate::database::Store;
use crate::utils::error::CustomError;
use crate::utils::forms::{FormErrors, FormOutcome, REQUIRED_FIELD};

pub struct CommentService {
    store: Arc<dyn Store>,
}

impl CommentService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        CommentService { store }
    }

    /// Appends a comment to an existing post.
    pub async fn add_comment(
        &self,
        post_id: i64,
        author_id: i64,
        form: CommentForm,
    ) -> Result<FormOutcome<Comment, CommentForm>, CustomError> {
        self.store
            .find_post(post_id)
            .await?
            .ok_or_else(|| CustomError::NotFoundError("Post not found".into()))?;

        let author = self
            .store
            .find_user(author_id)
            .await?
            .ok_or_else(|| CustomError::UnauthenticatedError(format!("/posts/{}/", post_id)))?;

        let text = form.text.trim();
        if text.is_empty() {
            let mut errors = FormErrors::new();
            errors.add("text", REQUIRED_FIELD);
            return Ok(FormOutcome::Invalid(form, errors));
        }

        let comment = self
            .store
            .insert_comment(NewComment {
                post_id,
                author_id: author.id,
                author_username: author.username,
                text: text.to_string(),
                created_at: Utc::now(),
            })
            .await?;

        log::info!("user {} commented on post {}", author_id, post_id);
        Ok(FormOutcome::Saved(comment))
    }

    /// Comments on a post, oldest first.
    pub async fn get_comments_for_post(&self, post_id: i64) -> Result<Vec<Comment>, CustomError> {
        Ok(self.store.list_comments(post_id).await?)
    }
}
