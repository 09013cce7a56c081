use super::controller::{delete_user, login_page, login_user, logout_user, register_user};
use actix_web::web;

pub fn user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/signup/", web::post().to(register_user))
            .route("/login/", web::get().to(login_page))
            .route("/login/", web::post().to(login_user))
            .route("/logout/", web::post().to(logout_user)),
    )
    .route("/admin/users/{username}/", web::delete().to(delete_user));
}
