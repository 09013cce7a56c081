use std::sync::Arc;

use crate::database::Store;
use crate::group::model::{CreateGroupRequest, Group, NewGroup};
use crate::utils::error::CustomError;
use crate::utils::validation::{GROUP_TITLE_MAX, validate_slug};

pub struct GroupService {
    store: Arc<dyn Store>,
}

impl GroupService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        GroupService { store }
    }

    pub async fn list_groups(&self) -> Result<Vec<Group>, CustomError> {
        Ok(self.store.list_groups().await?)
    }

    pub async fn create_group(&self, request: CreateGroupRequest) -> Result<Group, CustomError> {
        let title = request.title.trim();
        if title.is_empty() || title.chars().count() > GROUP_TITLE_MAX {
            return Err(CustomError::ValidationError(format!(
                "Title is required and may be at most {} characters.",
                GROUP_TITLE_MAX
            )));
        }
        validate_slug(&request.slug)?;

        let group = self
            .store
            .insert_group(NewGroup {
                title: title.to_string(),
                slug: request.slug,
                description: request.description,
            })
            .await?;

        log::info!("group '{}' created", group.slug);
        Ok(group)
    }

    /// Removes a group. Its posts stay, just without a group.
    pub async fn delete_group(&self, slug: &str) -> Result<(), CustomError> {
        let group = self
            .store
            .find_group_by_slug(slug)
            .await?
            .ok_or_else(|| CustomError::NotFoundError(format!("Group '{}' not found", slug)))?;

        if !self.store.delete_group(group.id).await? {
            return Err(CustomError::NotFoundError(format!("Group '{}' not found", slug)));
        }

        log::info!("group '{}' deleted", slug);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    fn request(title: &str, slug: &str) -> CreateGroupRequest {
        CreateGroupRequest {
            title: title.into(),
            slug: slug.into(),
            description: String::new(),
        }
    }

    #[actix_web::test]
    async fn create_validates_and_rejects_duplicate_slugs() {
        let service = GroupService::new(Arc::new(MemoryStore::new()));

        assert!(service.create_group(request("Test", "test-group")).await.is_ok());
        assert!(matches!(
            service.create_group(request("Again", "test-group")).await,
            Err(CustomError::ConflictError(_))
        ));
        assert!(matches!(
            service.create_group(request("", "empty-title")).await,
            Err(CustomError::ValidationError(_))
        ));
        assert!(matches!(
            service.create_group(request("Bad", "bad slug")).await,
            Err(CustomError::ValidationError(_))
        ));
    }

    #[actix_web::test]
    async fn delete_unknown_group_is_not_found() {
        let service = GroupService::new(Arc::new(MemoryStore::new()));
        assert!(matches!(
            service.delete_group("missing").await,
            Err(CustomError::NotFoundError(_))
        ));
    }
}
