use actix_web::HttpResponse;
use actix_web::http::header::LOCATION;

/// Login endpoint that anonymous callers are sent to.
pub const LOGIN_PATH: &str = "/auth/login/";

pub fn service_name() -> String {
    std::env::var("SERVICE_NAME").unwrap_or_else(|_| "yatube".to_string())
}

/// Login URL carrying the path to return to once a session exists.
pub fn login_url(next: &str) -> String {
    format!("{}?next={}", LOGIN_PATH, urlencoding::encode(next))
}

/// Only same-site absolute paths are followed after login.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((LOCATION, location))
        .finish()
}

pub fn post_detail_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}
