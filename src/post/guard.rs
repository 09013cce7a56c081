use crate::post::post_model::Post;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenReason {
    NotAuthor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditPermission {
    Allowed,
    Forbidden(ForbiddenReason),
}

/// Only the stored author may change a post. Evaluated before any write.
pub fn check_edit_permission(post: &Post, caller_id: i64) -> EditPermission {
    if post.author_id == caller_id {
        EditPermission::Allowed
    } else {
        EditPermission::Forbidden(ForbiddenReason::NotAuthor)
    }
}
