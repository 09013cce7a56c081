use actix_multipart::Multipart;
use actix_web::guard::GuardContext;
use actix_web::http::StatusCode;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpResponse, web};
use futures_util::StreamExt;
use serde_json::json;

use crate::comment::service::CommentService;
use crate::group::service::GroupService;
use crate::middleware::auth::{AuthenticatedUser, MaybeUser};
use crate::post::post_model::PostForm;
use crate::post::post_service::PostService;
use crate::utils::error::CustomError;
use crate::utils::forms::{FormErrors, FormOutcome};
use crate::utils::helpers::{post_detail_url, profile_url, redirect, service_name};
use crate::utils::pagination::PageQuery;
use crate::utils::uploads::FileUpload;

/// Whole multipart bodies above this are refused before they reach the
/// image validator.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Routes `multipart/form-data` submissions to the streaming handlers.
pub fn is_multipart(ctx: &GuardContext) -> bool {
    ctx.head()
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
}

async fn read_multipart(mut payload: Multipart) -> Result<(PostForm, Option<FileUpload>), CustomError> {
    let mut form = PostForm::default();
    let mut image = None;
    let mut received = 0usize;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| {
            CustomError::BadRequestError(format!("Error reading multipart field: {}", e))
        })?;

        let Some(content_disposition) = field.content_disposition() else {
            continue;
        };
        let field_name = content_disposition.get_name().unwrap_or("").to_string();
        let file_name = content_disposition.get_filename().map(|f| f.to_string());
        let content_type = field.content_type().map(|ct| ct.to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk
                .map_err(|e| CustomError::BadRequestError(format!("Error reading file chunk: {}", e)))?;
            received += chunk.len();
            if received > MAX_UPLOAD_BYTES {
                return Err(CustomError::BadRequestError("Upload too large".to_string()));
            }
            data.extend_from_slice(&chunk);
        }

        match field_name.as_str() {
            "text" => form.text = String::from_utf8_lossy(&data).into_owned(),
            "group" => form.group = String::from_utf8_lossy(&data).into_owned(),
            // browsers send an empty part when no file was picked
            "image" if !data.is_empty() => {
                image = Some(FileUpload::new(
                    file_name.unwrap_or_else(|| "upload".to_string()),
                    data,
                    content_type,
                ));
            }
            _ => {}
        }
    }

    Ok((form, image))
}

async fn form_response(
    group_service: &GroupService,
    form: PostForm,
    errors: Option<FormErrors>,
    editing: Option<i64>,
) -> Result<HttpResponse, CustomError> {
    let groups = group_service.list_groups().await?;
    let (status, message) = match errors {
        Some(_) => (StatusCode::BAD_REQUEST, "Form contains errors"),
        None => (StatusCode::OK, "Post form"),
    };

    Ok(HttpResponse::build(status).json(json!({
        "success": status.is_success(),
        "message": message,
        "httpStatusCode": status.as_u16(),
        "service": service_name(),
        "form": form,
        "errors": errors.unwrap_or_default(),
        "groups": groups,
        "is_edit": editing.is_some(),
        "post_id": editing,
    })))
}

/// GET /
pub async fn index(
    post_service: web::Data<PostService>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, CustomError> {
    let page_obj = post_service.list_all(query.requested()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Latest posts",
        "httpStatusCode": 200,
        "service": service_name(),
        "page_obj": page_obj,
    })))
}

/// GET /group/{slug}/
pub async fn group_posts(
    post_service: web::Data<PostService>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, CustomError> {
    let (group, page_obj) = post_service
        .list_by_group(&path.into_inner(), query.requested())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("Posts in group {}", group.title),
        "httpStatusCode": 200,
        "service": service_name(),
        "group": group,
        "page_obj": page_obj,
    })))
}

/// GET /profile/{username}/
pub async fn profile(
    post_service: web::Data<PostService>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, CustomError> {
    let (author, page_obj) = post_service
        .list_by_author(&path.into_inner(), query.requested())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("Posts by {}", author.username),
        "httpStatusCode": 200,
        "service": service_name(),
        "author": author,
        "posts_count": page_obj.count,
        "page_obj": page_obj,
    })))
}

/// GET /posts/{post_id}/
pub async fn post_detail(
    post_service: web::Data<PostService>,
    comment_service: web::Data<CommentService>,
    path: web::Path<i64>,
    viewer: MaybeUser,
) -> Result<HttpResponse, CustomError> {
    let post_id = path.into_inner();
    let detail = post_service.get_post_detail(post_id).await?;
    let comments = comment_service.get_comments_for_post(post_id).await?;
    let viewer_id = viewer.0.map(|u| u.id);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Post fetched successfully",
        "httpStatusCode": 200,
        "service": service_name(),
        "is_author": viewer_id == Some(detail.post.author_id),
        "user": viewer_id,
        "post": detail.post,
        "posts_count": detail.posts_count,
        "comments": comments,
    })))
}

/// GET /create/
pub async fn post_create_form(
    _user: AuthenticatedUser,
    group_service: web::Data<GroupService>,
) -> Result<HttpResponse, CustomError> {
    form_response(&group_service, PostForm::default(), None, None).await
}

async fn save_new_post(
    user: AuthenticatedUser,
    post_service: &PostService,
    group_service: &GroupService,
    form: PostForm,
    image: Option<FileUpload>,
) -> Result<HttpResponse, CustomError> {
    match post_service.create_post(user.id, form, image).await? {
        FormOutcome::Saved(post) => Ok(redirect(&profile_url(&post.author_username))),
        FormOutcome::Invalid(form, errors) => {
            form_response(group_service, form, Some(errors), None).await
        }
    }
}

/// POST /create/ (urlencoded)
pub async fn post_create(
    user: AuthenticatedUser,
    post_service: web::Data<PostService>,
    group_service: web::Data<GroupService>,
    form: web::Form<PostForm>,
) -> Result<HttpResponse, CustomError> {
    save_new_post(user, &post_service, &group_service, form.into_inner(), None).await
}

/// POST /create/ (multipart, may carry an image)
pub async fn post_create_upload(
    user: AuthenticatedUser,
    post_service: web::Data<PostService>,
    group_service: web::Data<GroupService>,
    payload: Multipart,
) -> Result<HttpResponse, CustomError> {
    let (form, image) = read_multipart(payload).await?;
    save_new_post(user, &post_service, &group_service, form, image).await
}

/// GET /posts/{post_id}/edit/
pub async fn post_edit_form(
    user: AuthenticatedUser,
    post_service: web::Data<PostService>,
    group_service: web::Data<GroupService>,
    path: web::Path<i64>,
) -> Result<HttpResponse, CustomError> {
    let post = post_service.authorize_edit(path.into_inner(), user.id).await?;
    form_response(&group_service, PostForm::from_post(&post), None, Some(post.id)).await
}

async fn save_post_edit(
    user: AuthenticatedUser,
    post_service: &PostService,
    group_service: &GroupService,
    post_id: i64,
    form: PostForm,
    image: Option<FileUpload>,
) -> Result<HttpResponse, CustomError> {
    match post_service.edit_post(post_id, user.id, form, image).await? {
        FormOutcome::Saved(post) => Ok(redirect(&post_detail_url(post.id))),
        FormOutcome::Invalid(form, errors) => {
            form_response(group_service, form, Some(errors), Some(post_id)).await
        }
    }
}

/// POST /posts/{post_id}/edit/ (urlencoded)
pub async fn post_edit(
    user: AuthenticatedUser,
    post_service: web::Data<PostService>,
    group_service: web::Data<GroupService>,
    path: web::Path<i64>,
    form: web::Form<PostForm>,
) -> Result<HttpResponse, CustomError> {
    let post_id = path.into_inner();
    save_post_edit(user, &post_service, &group_service, post_id, form.into_inner(), None).await
}

/// POST /posts/{post_id}/edit/ (multipart, may carry an image)
pub async fn post_edit_upload(
    user: AuthenticatedUser,
    post_service: web::Data<PostService>,
    group_service: web::Data<GroupService>,
    path: web::Path<i64>,
    payload: Multipart,
) -> Result<HttpResponse, CustomError> {
    let post_id = path.into_inner();
    let (form, image) = read_multipart(payload).await?;
    save_post_edit(user, &post_service, &group_service, post_id, form, image).await
}
