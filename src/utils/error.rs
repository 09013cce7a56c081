use actix_web::http::header::LOCATION;
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::database::StoreError;
use crate::utils::helpers::{login_url, service_name};

#[derive(Debug, Error)]
pub enum CustomError {
    /// Invalid credentials on login.
    #[error("Unauthorized: {0}")]
    UnauthorizedError(String),

    #[error("Bad Request: {0}")]
    BadRequestError(String),

    #[error("Conflict: {0}")]
    ConflictError(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    /// No usable session. Carries the path to come back to after login.
    #[error("Unauthenticated: login required for {0}")]
    UnauthenticatedError(String),

    /// Mutation refused. Carries the location the caller is sent to instead.
    #[error("Forbidden: redirecting to {0}")]
    ForbiddenError(String),

    #[error("Permission Denied: {0}")]
    PermissionDeniedError(String),

    #[error("Not Found: {0}")]
    NotFoundError(String),

    #[error("Validation Error: {0}")]
    ValidationError(String),
}

impl CustomError {
    fn code(&self) -> &'static str {
        match *self {
            CustomError::UnauthorizedError(..) => "UNAUTHORIZED_ERROR",
            CustomError::BadRequestError(..) => "BAD_REQUEST_ERROR",
            CustomError::ConflictError(..) => "CONFLICT_ERROR",
            CustomError::InternalServerError(..) => "INTERNAL_SERVER_ERROR",
            CustomError::UnauthenticatedError(..) => "UNAUTHENTICATED_ERROR",
            CustomError::ForbiddenError(..) => "FORBIDDEN_ERROR",
            CustomError::PermissionDeniedError(..) => "PERMISSION_DENIED_ERROR",
            CustomError::NotFoundError(..) => "NOT_FOUND_ERROR",
            CustomError::ValidationError(..) => "VALIDATION_ERROR",
        }
    }
}

impl ResponseError for CustomError {
    fn status_code(&self) -> StatusCode {
        match *self {
            CustomError::UnauthorizedError(..) => StatusCode::UNAUTHORIZED,
            CustomError::BadRequestError(..) => StatusCode::BAD_REQUEST,
            CustomError::ConflictError(..) => StatusCode::CONFLICT,
            CustomError::InternalServerError(..) => StatusCode::INTERNAL_SERVER_ERROR,
            CustomError::UnauthenticatedError(..) => StatusCode::FOUND,
            CustomError::ForbiddenError(..) => StatusCode::FOUND,
            CustomError::PermissionDeniedError(..) => StatusCode::FORBIDDEN,
            CustomError::NotFoundError(..) => StatusCode::NOT_FOUND,
            CustomError::ValidationError(..) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            CustomError::UnauthenticatedError(next) => {
                return HttpResponse::Found()
                    .insert_header((LOCATION, login_url(next)))
                    .finish();
            }
            CustomError::ForbiddenError(location) => {
                return HttpResponse::Found()
                    .insert_header((LOCATION, location.as_str()))
                    .finish();
            }
            _ => {}
        }

        let error_message = json!({
            "success": false,
            "message": self.to_string(),
            "httpStatusCode": self.status_code().as_u16(),
            "error": self.code(),
            "service": service_name(),
        });

        HttpResponse::build(self.status_code()).json(error_message)
    }
}

impl From<StoreError> for CustomError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(what) => CustomError::ConflictError(format!("{} already exists", what)),
            other => {
                log::error!("store failure: {}", other);
                CustomError::InternalServerError("Data store unavailable".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_redirects_to_login_with_return_path() {
        let res = CustomError::UnauthenticatedError("/create/".into()).error_response();
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(
            res.headers().get(LOCATION).unwrap(),
            "/auth/login/?next=%2Fcreate%2F"
        );
    }

    #[test]
    fn forbidden_redirects_instead_of_error_page() {
        let res = CustomError::ForbiddenError("/posts/7/".into()).error_response();
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers().get(LOCATION).unwrap(), "/posts/7/");
    }

    #[test]
    fn duplicate_store_error_becomes_conflict() {
        let err: CustomError = StoreError::Duplicate("Group slug".into()).into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
