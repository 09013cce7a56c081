use actix_web::{Either, HttpResponse, web};
use serde_json::json;

use crate::comment::model::CommentForm;
use crate::comment::service::CommentService;
use crate::middleware::auth::AuthenticatedUser;
use crate::utils::error::CustomError;
use crate::utils::forms::FormOutcome;
use crate::utils::helpers::{post_detail_url, redirect, service_name};

/// Add a comment to a post, then go back to the post
/// POST /posts/{post_id}/comment/
pub async fn add_comment(
    user: AuthenticatedUser,
    comment_service: web::Data<CommentService>,
    path: web::Path<i64>,
    body: Either<web::Form<CommentForm>, web::Json<CommentForm>>,
) -> Result<HttpResponse, CustomError> {
    let post_id = path.into_inner();
    let form = match body {
        Either::Left(form) => form.into_inner(),
        Either::Right(json) => json.into_inner(),
    };

    match comment_service.add_comment(post_id, user.id, form).await? {
        FormOutcome::Saved(_) => Ok(redirect(&post_detail_url(post_id))),
        FormOutcome::Invalid(form, errors) => Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "Form contains errors",
            "httpStatusCode": 400,
            "service": service_name(),
            "post_id": post_id,
            "form": form,
            "errors": errors,
        }))),
    }
}
