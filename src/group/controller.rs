use actix_web::{HttpResponse, web};
use serde_json::json;

use crate::group::model::CreateGroupRequest;
use crate::group::service::GroupService;
use crate::middleware::auth::AuthenticatedUser;
use crate::user::service::UserService;
use crate::utils::error::CustomError;
use crate::utils::helpers::service_name;

/// GET /groups/
pub async fn list_groups(
    group_service: web::Data<GroupService>,
) -> Result<HttpResponse, CustomError> {
    let groups = group_service.list_groups().await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Groups fetched successfully",
        "httpStatusCode": 200,
        "service": service_name(),
        "count": groups.len(),
        "groups": groups,
    })))
}

/// POST /admin/groups/
pub async fn create_group(
    user: AuthenticatedUser,
    user_service: web::Data<UserService>,
    group_service: web::Data<GroupService>,
    body: web::Json<CreateGroupRequest>,
) -> Result<HttpResponse, CustomError> {
    user_service.require_staff(&user).await?;
    let group = group_service.create_group(body.into_inner()).await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Group created successfully",
        "httpStatusCode": 201,
        "service": service_name(),
        "group": group,
    })))
}

/// DELETE /admin/groups/{slug}/
pub async fn delete_group(
    user: AuthenticatedUser,
    user_service: web::Data<UserService>,
    group_service: web::Data<GroupService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    user_service.require_staff(&user).await?;
    group_service.delete_group(&path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Group deleted successfully",
        "httpStatusCode": 200,
        "service": service_name(),
    })))
}
