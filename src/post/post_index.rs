use super::post_controller::{
    group_posts, index, is_multipart, post_create, post_create_form, post_create_upload,
    post_detail, post_edit, post_edit_form, post_edit_upload, profile,
};
use actix_web::{guard, web};

pub fn post_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/group/{slug}/", web::get().to(group_posts))
        .route("/profile/{username}/", web::get().to(profile))
        .route("/create/", web::get().to(post_create_form))
        .route(
            "/create/",
            web::post().guard(guard::fn_guard(is_multipart)).to(post_create_upload),
        )
        .route("/create/", web::post().to(post_create))
        .route("/posts/{post_id}/", web::get().to(post_detail))
        .route("/posts/{post_id}/edit/", web::get().to(post_edit_form))
        .route(
            "/posts/{post_id}/edit/",
            web::post().guard(guard::fn_guard(is_multipart)).to(post_edit_upload),
        )
        .route("/posts/{post_id}/edit/", web::post().to(post_edit));
}
