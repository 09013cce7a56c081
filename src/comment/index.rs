use super::controller::add_comment;
use actix_web::web;

pub fn comment_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/posts/{post_id}/comment/", web::post().to(add_comment));
}
