use actix_web::cookie::{Cookie, time::Duration};
use actix_web::http::header::LOCATION;
use actix_web::{Either, HttpResponse, web};
use serde_json::json;

use crate::middleware::auth::{AuthenticatedUser, SESSION_COOKIE};
use crate::user::model::CreateUserRequest;
use crate::user::service::UserService;
use crate::utils::error::CustomError;
use crate::utils::helpers::{safe_next, service_name};
use crate::utils::model::{LoginRequests, NextQuery};

fn session_cookie(value: String, max_age: Duration) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, value)
        .path("/")
        .http_only(true)
        .max_age(max_age)
        .finish()
}

/// POST /auth/signup/
pub async fn register_user(
    user_service: web::Data<UserService>,
    body: Either<web::Json<CreateUserRequest>, web::Form<CreateUserRequest>>,
) -> Result<HttpResponse, CustomError> {
    let request = match body {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    };
    let user = user_service.create_user(request).await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "User created successfully",
        "httpStatusCode": 201,
        "service": service_name(),
        "user": user,
    })))
}

/// GET /auth/login/?next=
pub async fn login_page(query: web::Query<NextQuery>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Login required",
        "httpStatusCode": 200,
        "service": service_name(),
        "next": safe_next(query.next.as_deref()),
    }))
}

/// POST /auth/login/?next=
pub async fn login_user(
    user_service: web::Data<UserService>,
    query: web::Query<NextQuery>,
    body: Either<web::Json<LoginRequests>, web::Form<LoginRequests>>,
) -> Result<HttpResponse, CustomError> {
    let login_info = match body {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    };
    let (user, token) = user_service.login_fn(login_info).await?;
    let cookie = session_cookie(token.clone(), Duration::seconds(user_service.token_ttl_seconds() as i64));

    if let Some(next) = safe_next(query.next.as_deref()) {
        return Ok(HttpResponse::Found()
            .insert_header((LOCATION, next))
            .cookie(cookie)
            .finish());
    }

    Ok(HttpResponse::Ok().cookie(cookie).json(json!({
        "success": true,
        "message": "Login successful",
        "httpStatusCode": 200,
        "service": service_name(),
        "user": user,
        "token": token,
    })))
}

/// POST /auth/logout/
pub async fn logout_user(
    user: AuthenticatedUser,
    user_service: web::Data<UserService>,
) -> Result<HttpResponse, CustomError> {
    user_service.logout(&user).await?;

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(String::new(), Duration::ZERO))
        .json(json!({
            "success": true,
            "message": "Logged out",
            "httpStatusCode": 200,
            "service": service_name(),
        })))
}

/// DELETE /admin/users/{username}/
pub async fn delete_user(
    user: AuthenticatedUser,
    user_service: web::Data<UserService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    user_service.require_staff(&user).await?;
    user_service.delete_user(&path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "User deleted successfully",
        "httpStatusCode": 200,
        "service": service_name(),
    })))
}
