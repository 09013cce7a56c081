use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::http::header::{AUTHORIZATION, CONTENT_TYPE, LOCATION};
use actix_web::middleware::ErrorHandlers;
use actix_web::{App, test};
use serde_json::Value;

use yatube::AppServices;
use yatube::database::MemoryStore;
use yatube::group::model::CreateGroupRequest;
use yatube::middleware::auth::{TokenSettings, create_token};
use yatube::middleware::not_found::not_found;
use yatube::post::post_model::PostForm;
use yatube::user::model::{CreateUserRequest, User};
use yatube::utils::forms::FormOutcome;
use yatube::utils::uploads::MediaStorage;

const SECRET: &str = "test-secret";

struct Harness {
    services: AppServices,
    _media: tempfile::TempDir,
}

fn harness() -> Harness {
    let media = tempfile::tempdir().unwrap();
    let services = AppServices::new(
        Arc::new(MemoryStore::new()),
        MediaStorage::local(media.path(), "/media/"),
        TokenSettings::new(SECRET, 24),
        None,
    );
    Harness {
        services,
        _media: media,
    }
}

macro_rules! app {
    ($services:expr) => {{
        let services = $services.clone();
        test::init_service(
            App::new()
                .configure(move |cfg| services.configure(cfg))
                .wrap(ErrorHandlers::new().handler(StatusCode::NOT_FOUND, not_found)),
        )
        .await
    }};
}

async fn register(services: &AppServices, username: &str, staff: bool) -> User {
    let request = CreateUserRequest {
        username: username.into(),
        password: "Secret123".into(),
    };
    if staff {
        services.users.create_staff_user(request).await.unwrap()
    } else {
        services.users.create_user(request).await.unwrap()
    }
}

fn bearer(user: &User) -> (actix_web::http::header::HeaderName, String) {
    let token = create_token(user, &TokenSettings::new(SECRET, 24)).unwrap();
    (AUTHORIZATION, format!("Bearer {}", token))
}

async fn publish(services: &AppServices, author: &User, text: &str, group: &str) -> i64 {
    let form = PostForm {
        text: text.into(),
        group: group.into(),
    };
    match services.posts.create_post(author.id, form, None).await.unwrap() {
        FormOutcome::Saved(post) => post.id,
        FormOutcome::Invalid(_, errors) => panic!("post rejected: {:?}", errors),
    }
}

const BOUNDARY: &str = "yatube-test-boundary";

struct Upload<'a> {
    file_name: &'a str,
    content_type: &'a str,
    data: Vec<u8>,
}

fn png(file_name: &str, len: usize) -> Upload<'_> {
    Upload {
        file_name,
        content_type: "image/png",
        data: vec![0x89; len],
    }
}

/// Encodes text fields and an optional `image` part the way a browser does.
fn multipart_body(fields: &[(&str, &str)], image: Option<Upload<'_>>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some(upload) = image {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, upload.file_name, upload.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(&upload.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_post(uri: &str, user: &User, body: Vec<u8>) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .insert_header(bearer(user))
        .insert_header((
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(body)
}

fn location(res: &actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>) -> String {
    res.headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[actix_web::test]
async fn group_listing_pages_fifteen_posts_as_ten_and_five() {
    let h = harness();
    let dima = register(&h.services, "Dima", false).await;
    let group = h
        .services
        .groups
        .create_group(CreateGroupRequest {
            title: "Test".into(),
            slug: "test-group".into(),
            description: "Test group".into(),
        })
        .await
        .unwrap();
    for i in 1..=15 {
        publish(&h.services, &dima, &format!("post {}", i), &group.id.to_string()).await;
    }
    let app = app!(h.services);

    let req = test::TestRequest::get().uri("/group/test-group/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["page_obj"]["object_list"].as_array().unwrap().len(), 10);
    assert_eq!(body["page_obj"]["object_list"][0]["text"], "post 15");
    assert_eq!(body["page_obj"]["num_pages"], 2);

    let req = test::TestRequest::get().uri("/group/test-group/?page=2").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["page_obj"]["object_list"].as_array().unwrap().len(), 5);

    let req = test::TestRequest::get().uri("/group/test-group/?page=99").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["page_obj"]["number"], 2);

    let req = test::TestRequest::get().uri("/?page=abc").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["page_obj"]["number"], 1);
    assert_eq!(body["page_obj"]["count"], 15);
}

#[actix_web::test]
async fn non_author_edit_redirects_to_detail_and_keeps_text() {
    let h = harness();
    let dima = register(&h.services, "Dima", false).await;
    let anton = register(&h.services, "Anton", false).await;
    let post_id = publish(&h.services, &dima, "original", "").await;
    let app = app!(h.services);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit/", post_id))
        .insert_header(bearer(&anton))
        .set_form(vec![("text", "hijacked"), ("group", "")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), format!("/posts/{}/", post_id));

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/edit/", post_id))
        .insert_header(bearer(&anton))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/", post_id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["post"]["text"], "original");
    assert_eq!(body["is_author"], false);
}

#[actix_web::test]
async fn author_edit_saves_and_redirects_to_detail() {
    let h = harness();
    let dima = register(&h.services, "Dima", false).await;
    let post_id = publish(&h.services, &dima, "original", "").await;
    let app = app!(h.services);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/edit/", post_id))
        .insert_header(bearer(&dima))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["form"]["text"], "original");
    assert_eq!(body["is_edit"], true);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit/", post_id))
        .insert_header(bearer(&dima))
        .set_form(vec![("text", "edited"), ("group", "")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), format!("/posts/{}/", post_id));

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/", post_id))
        .insert_header(bearer(&dima))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["post"]["text"], "edited");
    assert_eq!(body["is_author"], true);
}

#[actix_web::test]
async fn missing_post_is_not_found() {
    let h = harness();
    let app = app!(h.services);

    let req = test::TestRequest::get().uri("/posts/999999/").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["error"], "NOT_FOUND_ERROR");
}

#[actix_web::test]
async fn anonymous_create_redirects_to_login() {
    let h = harness();
    let app = app!(h.services);

    let req = test::TestRequest::post()
        .uri("/create/")
        .set_form(vec![("text", "sneaky"), ("group", "")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/auth/login/?next=%2Fcreate%2F");

    let req = test::TestRequest::get().uri("/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["page_obj"]["count"], 0);
}

#[actix_web::test]
async fn create_ignores_submitted_author_and_redirects_to_profile() {
    let h = harness();
    let dima = register(&h.services, "Dima", false).await;
    register(&h.services, "Anton", false).await;
    let app = app!(h.services);

    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header(bearer(&dima))
        .set_form(vec![("text", "mine"), ("group", ""), ("author", "Anton")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/profile/Dima/");

    let req = test::TestRequest::get().uri("/profile/Dima/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["posts_count"], 1);
    assert_eq!(body["page_obj"]["object_list"][0]["author_username"], "Dima");
}

#[actix_web::test]
async fn invalid_post_form_is_echoed_back() {
    let h = harness();
    let dima = register(&h.services, "Dima", false).await;
    let app = app!(h.services);

    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header(bearer(&dima))
        .set_form(vec![("text", "   "), ("group", "7")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["form"]["group"], "7");
    assert!(body["errors"]["text"].is_array());
    assert!(body["errors"]["group"].is_array());
}

#[actix_web::test]
async fn comments_are_added_and_listed_on_detail() {
    let h = harness();
    let dima = register(&h.services, "Dima", false).await;
    let anton = register(&h.services, "Anton", false).await;
    let post_id = publish(&h.services, &dima, "hello", "").await;
    let app = app!(h.services);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post_id))
        .insert_header(bearer(&anton))
        .set_form(vec![("text", "nice post")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), format!("/posts/{}/", post_id));

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post_id))
        .insert_header(bearer(&anton))
        .set_form(vec![("text", "  ")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/posts/999999/comment/")
        .insert_header(bearer(&anton))
        .set_form(vec![("text", "lost")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post_id))
        .set_form(vec![("text", "anonymous")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert!(location(&res).starts_with("/auth/login/?next="));

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/", post_id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let comments = body["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["text"], "nice post");
    assert_eq!(comments[0]["author_username"], "Anton");
}

#[actix_web::test]
async fn deleting_group_keeps_its_posts() {
    let h = harness();
    let admin = register(&h.services, "admin", true).await;
    let dima = register(&h.services, "Dima", false).await;
    let app = app!(h.services);

    let req = test::TestRequest::post()
        .uri("/admin/groups/")
        .insert_header(bearer(&admin))
        .set_json(serde_json::json!({"title": "Cats", "slug": "cats", "description": "Meow"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let group_id = body["group"]["id"].as_i64().unwrap();
    let post_id = publish(&h.services, &dima, "cat picture", &group_id.to_string()).await;

    let req = test::TestRequest::delete()
        .uri("/admin/groups/cats/")
        .insert_header(bearer(&dima))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri("/admin/groups/cats/")
        .insert_header(bearer(&admin))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/", post_id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["post"]["group"].is_null());
    assert_eq!(body["posts_count"], 1);

    let req = test::TestRequest::get().uri("/group/cats/").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn deleting_user_removes_their_posts() {
    let h = harness();
    let admin = register(&h.services, "admin", true).await;
    let dima = register(&h.services, "Dima", false).await;
    publish(&h.services, &dima, "soon gone", "").await;
    let app = app!(h.services);

    let req = test::TestRequest::delete()
        .uri("/admin/users/Dima/")
        .insert_header(bearer(&admin))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["page_obj"]["count"], 0);

    let req = test::TestRequest::get().uri("/profile/Dima/").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn unknown_route_gets_json_not_found() {
    let h = harness();
    let app = app!(h.services);

    let req = test::TestRequest::get().uri("/no/such/page/").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["message"], "Route does not exist");
}

#[actix_web::test]
async fn signup_then_login_redirects_to_next_with_cookie() {
    let h = harness();
    let app = app!(h.services);

    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_json(serde_json::json!({"username": "Dima", "password": "Secret123"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/auth/login/?next=%2Fcreate%2F")
        .set_form(vec![("username", "Dima"), ("password", "Secret123")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/create/");
    let cookie = res
        .response()
        .cookies()
        .find(|c| c.name() == "session")
        .expect("session cookie")
        .into_owned();

    let req = test::TestRequest::get().uri("/create/").cookie(cookie).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form(vec![("username", "Dima"), ("password", "nope")])
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn multipart_create_accepts_a_photo_sized_image() {
    let h = harness();
    let dima = register(&h.services, "Dima", false).await;
    let app = app!(h.services);

    let body = multipart_body(
        &[("text", "holiday"), ("group", "")],
        Some(png("beach.png", 3 * 1024 * 1024)),
    );
    let res = test::call_service(&app, multipart_post("/create/", &dima, body).to_request()).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/profile/Dima/");

    let req = test::TestRequest::get().uri("/profile/Dima/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let post = &body["page_obj"]["object_list"][0];
    assert_eq!(post["text"], "holiday");
    let image = post["image"].as_str().unwrap();
    assert!(image.starts_with("/media/posts/") && image.ends_with(".png"));
}

#[actix_web::test]
async fn multipart_edit_replaces_image_and_empty_part_keeps_it() {
    let h = harness();
    let dima = register(&h.services, "Dima", false).await;
    let post_id = publish(&h.services, &dima, "original", "").await;
    let app = app!(h.services);
    let edit_uri = format!("/posts/{}/edit/", post_id);
    let detail_uri = format!("/posts/{}/", post_id);

    let body = multipart_body(
        &[("text", "with photo"), ("group", "")],
        Some(png("photo.png", 2 * 1024 * 1024)),
    );
    let res = test::call_service(&app, multipart_post(&edit_uri, &dima, body).to_request()).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), detail_uri);

    let req = test::TestRequest::get().uri(&detail_uri).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let stored = body["post"]["image"].as_str().unwrap().to_string();
    assert!(stored.starts_with("/media/posts/"));

    let empty_part = Upload {
        file_name: "",
        content_type: "application/octet-stream",
        data: Vec::new(),
    };
    let body = multipart_body(&[("text", "text only"), ("group", "")], Some(empty_part));
    let res = test::call_service(&app, multipart_post(&edit_uri, &dima, body).to_request()).await;
    assert_eq!(res.status(), StatusCode::FOUND);

    let req = test::TestRequest::get().uri(&detail_uri).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["post"]["text"], "text only");
    assert_eq!(body["post"]["image"], stored.as_str());
}

#[actix_web::test]
async fn multipart_image_over_validator_limit_is_a_form_error() {
    let h = harness();
    let dima = register(&h.services, "Dima", false).await;
    let app = app!(h.services);

    let body = multipart_body(
        &[("text", "too big"), ("group", "")],
        Some(png("huge.png", 11 * 1024 * 1024)),
    );
    let res = test::call_service(&app, multipart_post("/create/", &dima, body).to_request()).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert!(body["errors"]["image"].is_array());
    assert_eq!(body["form"]["text"], "too big");

    let req = test::TestRequest::get().uri("/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["page_obj"]["count"], 0);
}

#[actix_web::test]
async fn multipart_body_over_upload_cap_is_rejected_as_json() {
    let h = harness();
    let dima = register(&h.services, "Dima", false).await;
    let app = app!(h.services);

    let body = multipart_body(
        &[("text", "way too big"), ("group", "")],
        Some(png("huge.png", 17 * 1024 * 1024)),
    );
    let res = test::call_service(&app, multipart_post("/create/", &dima, body).to_request()).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["error"], "BAD_REQUEST_ERROR");
}

#[actix_web::test]
async fn oversized_urlencoded_form_is_rejected_as_json() {
    let h = harness();
    let dima = register(&h.services, "Dima", false).await;
    let app = app!(h.services);

    let text = "a".repeat(300 * 1024);
    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header(bearer(&dima))
        .set_form(vec![("text", text.as_str()), ("group", "")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["error"], "BAD_REQUEST_ERROR");
}
