use std::sync::Arc;

use chrono::Utc;

use crate::database::Store;
use crate::group::model::{Group, GroupRef};
use crate::post::guard::{EditPermission, check_edit_permission};
use crate::post::post_model::{NewPost, Post, PostChanges, PostDetail, PostFilter, PostForm};
use crate::user::model::User;
use crate::utils::error::CustomError;
use crate::utils::forms::{FormErrors, FormOutcome, INVALID_CHOICE, REQUIRED_FIELD};
use crate::utils::helpers::post_detail_url;
use crate::utils::pagination::{Page, Paginator};
use crate::utils::uploads::{FileUpload, FileValidator, MediaStorage, POST_IMAGE_FOLDER};

struct CleanedPost {
    text: String,
    group: Option<GroupRef>,
}

pub struct PostService {
    store: Arc<dyn Store>,
    media: Arc<MediaStorage>,
    paginator: Paginator,
    image_validator: FileValidator,
}

impl PostService {
    pub fn new(store: Arc<dyn Store>, media: Arc<MediaStorage>) -> Self {
        PostService {
            store,
            media,
            paginator: Paginator::default(),
            image_validator: FileValidator::images(),
        }
    }

    async fn page(&self, filter: PostFilter, requested: Option<&str>) -> Result<Page<Post>, CustomError> {
        let count = self.store.count_posts(filter).await?;
        let window = self.paginator.window(count, requested);
        let posts = self
            .store
            .list_posts(filter, window.offset, window.limit)
            .await?;
        Ok(window.into_page(posts))
    }

    /// Global feed, newest first.
    pub async fn list_all(&self, requested: Option<&str>) -> Result<Page<Post>, CustomError> {
        self.page(PostFilter::All, requested).await
    }

    pub async fn list_by_group(
        &self,
        slug: &str,
        requested: Option<&str>,
    ) -> Result<(Group, Page<Post>), CustomError> {
        let group = self
            .store
            .find_group_by_slug(slug)
            .await?
            .ok_or_else(|| CustomError::NotFoundError(format!("Group '{}' not found", slug)))?;
        let page = self.page(PostFilter::Group(group.id), requested).await?;
        Ok((group, page))
    }

    pub async fn list_by_author(
        &self,
        username: &str,
        requested: Option<&str>,
    ) -> Result<(User, Page<Post>), CustomError> {
        let author = self
            .store
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| CustomError::NotFoundError(format!("User '{}' not found", username)))?;
        let page = self.page(PostFilter::Author(author.id), requested).await?;
        Ok((author, page))
    }

    pub async fn get_post(&self, post_id: i64) -> Result<Post, CustomError> {
        self.store
            .find_post(post_id)
            .await?
            .ok_or_else(|| CustomError::NotFoundError("Post not found".into()))
    }

    /// The post plus how many posts its author has written.
    pub async fn get_post_detail(&self, post_id: i64) -> Result<PostDetail, CustomError> {
        let post = self.get_post(post_id).await?;
        let posts_count = self
            .store
            .count_posts(PostFilter::Author(post.author_id))
            .await?;
        Ok(PostDetail { post, posts_count })
    }

    /// Loads a post for editing, refusing anyone but its author.
    pub async fn authorize_edit(&self, post_id: i64, caller_id: i64) -> Result<Post, CustomError> {
        let post = self.get_post(post_id).await?;
        match check_edit_permission(&post, caller_id) {
            EditPermission::Allowed => Ok(post),
            EditPermission::Forbidden(reason) => {
                log::warn!(
                    "user {} may not edit post {}: {:?}",
                    caller_id,
                    post_id,
                    reason
                );
                Err(CustomError::ForbiddenError(post_detail_url(post_id)))
            }
        }
    }

    async fn clean(
        &self,
        form: &PostForm,
        image: Option<&FileUpload>,
    ) -> Result<Result<CleanedPost, FormErrors>, CustomError> {
        let mut errors = FormErrors::new();

        let text = form.text.trim();
        if text.is_empty() {
            errors.add("text", REQUIRED_FIELD);
        }

        let group = match form.group.trim() {
            "" => None,
            raw => {
                let found = match raw.parse::<i64>() {
                    Ok(id) => self.store.find_group(id).await?,
                    Err(_) => None,
                };
                if found.is_none() {
                    errors.add("group", INVALID_CHOICE);
                }
                found.map(|g| g.to_ref())
            }
        };

        if let Some(file) = image {
            if let Err(message) = self.image_validator.validate(file) {
                errors.add("image", message);
            }
        }

        if errors.is_empty() {
            Ok(Ok(CleanedPost {
                text: text.to_string(),
                group,
            }))
        } else {
            Ok(Err(errors))
        }
    }

    async fn store_image(&self, image: Option<FileUpload>) -> Result<Option<String>, CustomError> {
        match image {
            Some(file) => self
                .media
                .store(file, POST_IMAGE_FOLDER)
                .await
                .map(Some)
                .map_err(|e| {
                    log::error!("image upload failed: {}", e);
                    CustomError::InternalServerError("Failed to store image".into())
                }),
            None => Ok(None),
        }
    }

    /// Publishes a post. The author is always the caller's own account;
    /// nothing in the submitted form can change it.
    pub async fn create_post(
        &self,
        author_id: i64,
        form: PostForm,
        image: Option<FileUpload>,
    ) -> Result<FormOutcome<Post, PostForm>, CustomError> {
        let author = self
            .store
            .find_user(author_id)
            .await?
            .ok_or_else(|| CustomError::UnauthenticatedError("/create/".into()))?;

        let cleaned = match self.clean(&form, image.as_ref()).await? {
            Ok(cleaned) => cleaned,
            Err(errors) => return Ok(FormOutcome::Invalid(form, errors)),
        };

        let image = self.store_image(image).await?;
        let post = self
            .store
            .insert_post(NewPost {
                text: cleaned.text,
                pub_date: Utc::now(),
                author_id: author.id,
                author_username: author.username,
                group: cleaned.group,
                image,
            })
            .await?;

        log::info!("user {} published post {}", author_id, post.id);
        Ok(FormOutcome::Saved(post))
    }

    pub async fn edit_post(
        &self,
        post_id: i64,
        caller_id: i64,
        form: PostForm,
        image: Option<FileUpload>,
    ) -> Result<FormOutcome<Post, PostForm>, CustomError> {
        self.authorize_edit(post_id, caller_id).await?;

        let cleaned = match self.clean(&form, image.as_ref()).await? {
            Ok(cleaned) => cleaned,
            Err(errors) => return Ok(FormOutcome::Invalid(form, errors)),
        };

        let image = self.store_image(image).await?;
        let post = self
            .store
            .update_post(
                post_id,
                PostChanges {
                    text: cleaned.text,
                    group: cleaned.group,
                    image,
                },
            )
            .await?
            .ok_or_else(|| CustomError::NotFoundError("Post not found".into()))?;

        log::info!("user {} edited post {}", caller_id, post_id);
        Ok(FormOutcome::Saved(post))
    }
}
