use super::controller::{create_group, delete_group, list_groups};
use actix_web::web;

pub fn group_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/groups/", web::get().to(list_groups))
        .route("/admin/groups/", web::post().to(create_group))
        .route("/admin/groups/{slug}/", web::delete().to(delete_group));
}
