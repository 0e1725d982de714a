//! HTTP-level tests
//!
//! Drives the full router (session middleware, handlers, templates, JSON
//! endpoints) over an in-memory database.

use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestServer, TestServerConfig};
use serde_json::Value;

use crate::config::Config;
use crate::db::{create_test_pool, migrations};
use crate::web::json::CatalogResponse;
use crate::web::state::AppState;
use crate::web::templates::{TemplateEngine, DEFAULT_TEMPLATE_GLOB};

struct TestApp {
    router: axum::Router,
    _upload_dir: tempfile::TempDir,
}

async fn test_app() -> TestApp {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    migrations::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    let upload_dir = tempfile::tempdir().expect("Failed to create temp dir");

    let mut config = Config::default();
    config.upload.path = upload_dir.path().to_path_buf();
    // Nothing listens here; OAuth calls past the state check fail fast
    config.facebook.graph_url = "http://127.0.0.1:1/v2.8".to_string();
    config.facebook.app_id = "test-app".to_string();

    let templates = TemplateEngine::new(DEFAULT_TEMPLATE_GLOB).expect("Templates should load");
    let state = AppState::build(&config, pool, templates).expect("Failed to build state");

    TestApp {
        router: crate::web::build_router(state),
        _upload_dir: upload_dir,
    }
}

fn server_for(router: &axum::Router) -> TestServer {
    let config = TestServerConfig {
        save_cookies: true,
        ..TestServerConfig::default()
    };
    TestServer::new_with_config(router.clone(), config).expect("Failed to start test server")
}

async fn signup_and_login(server: &TestServer, name: &str, email: &str) {
    let response = server
        .post("/signup")
        .form(&[
            ("name", name),
            ("email", email),
            ("password", "hunter22"),
            ("confirm", "hunter22"),
        ])
        .await;
    assert!(
        response.status_code().is_redirection(),
        "Signup should redirect, got {}",
        response.status_code()
    );

    let response = server
        .post("/login")
        .form(&[("email", email), ("password", "hunter22")])
        .await;
    assert!(
        response.status_code().is_redirection(),
        "Login should redirect, got {}",
        response.status_code()
    );
}

async fn create_category(server: &TestServer, name: &str) {
    let response = server.post("/category/new").form(&[("name", name)]).await;
    assert!(response.status_code().is_redirection());
}

async fn catalog(server: &TestServer) -> CatalogResponse {
    server.get("/catalog.json").await.json::<CatalogResponse>()
}

#[tokio::test]
async fn test_front_page_renders() {
    let app = test_app().await;
    let server = server_for(&app.router);

    let response = server.get("/").await;

    assert_eq!(response.status_code(), 200);
    assert!(response.text().contains("Categories"));
}

#[tokio::test]
async fn test_signup_mismatched_confirmation_rerenders() {
    let app = test_app().await;
    let server = server_for(&app.router);

    let response = server
        .post("/signup")
        .form(&[
            ("name", "alice"),
            ("email", "alice@example.com"),
            ("password", "hunter22"),
            ("confirm", "different"),
        ])
        .await;

    // Validation failures re-render the form, they are not errors
    assert_eq!(response.status_code(), 200);
    assert!(response.text().contains("Passwords must match"));

    // No account was created
    let login = server
        .post("/login")
        .form(&[("email", "alice@example.com"), ("password", "hunter22")])
        .await;
    assert_eq!(login.status_code(), 200);
    assert!(login.text().contains("User not valid"));
}

#[tokio::test]
async fn test_signup_and_login_flow() {
    let app = test_app().await;
    let server = server_for(&app.router);

    signup_and_login(&server, "alice", "alice@example.com").await;

    let home = server.get("/").await;
    assert!(home.text().contains("alice"));
    assert!(home.text().contains("You were logged in"));

    // The flash is one-shot
    let again = server.get("/").await;
    assert!(!again.text().contains("You were logged in"));
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = test_app().await;
    let server = server_for(&app.router);

    signup_and_login(&server, "alice", "alice@example.com").await;
    server.get("/logout").await;

    let response = server
        .post("/login")
        .form(&[("email", "alice@example.com"), ("password", "wrong")])
        .await;

    assert_eq!(response.status_code(), 200);
    assert!(response.text().contains("User not valid"));
}

#[tokio::test]
async fn test_logout_clears_identity() {
    let app = test_app().await;
    let server = server_for(&app.router);

    signup_and_login(&server, "alice", "alice@example.com").await;

    let response = server.get("/logout").await;
    assert!(response.status_code().is_redirection());

    let home = server.get("/").await;
    assert!(home.text().contains("You were logged out"));
    assert!(home.text().contains("Log in"));
}

#[tokio::test]
async fn test_anonymous_mutation_redirects_to_login() {
    let app = test_app().await;
    let server = server_for(&app.router);

    let response = server
        .post("/category/new")
        .form(&[("name", "Camping")])
        .await;

    assert!(response.status_code().is_redirection());
    assert_eq!(
        response.headers().get("location").unwrap().to_str().unwrap(),
        "/login"
    );

    // The gate flashes its message on the login page
    let login = server.get("/login").await;
    assert!(login
        .text()
        .contains("You need to login to change the content"));
}

#[tokio::test]
async fn test_create_category_appears_in_catalog() {
    let app = test_app().await;
    let server = server_for(&app.router);

    signup_and_login(&server, "alice", "alice@example.com").await;
    create_category(&server, "Camping").await;

    let home = server.get("/").await;
    assert!(home.text().contains("New category was successfully posted"));

    let catalog = catalog(&server).await;
    assert_eq!(catalog.categories.len(), 1);
    assert_eq!(catalog.categories[0].category, "Camping");
    assert!(catalog.categories[0].items.is_empty());
}

#[tokio::test]
async fn test_duplicate_category_rerenders_form() {
    let app = test_app().await;
    let server = server_for(&app.router);

    signup_and_login(&server, "alice", "alice@example.com").await;
    create_category(&server, "Camping").await;

    let response = server
        .post("/category/new")
        .form(&[("name", "Camping")])
        .await;

    assert_eq!(response.status_code(), 200);
    assert!(response.text().contains("already exists"));
}

#[tokio::test]
async fn test_only_author_can_delete_category() {
    let app = test_app().await;
    let author = server_for(&app.router);
    let other = server_for(&app.router);

    signup_and_login(&author, "alice", "alice@example.com").await;
    create_category(&author, "Camping").await;
    let category_id = catalog(&author).await.categories[0].id;

    signup_and_login(&other, "mallory", "mallory@example.com").await;

    let response = other.get(&format!("/category/delete/{}", category_id)).await;
    assert!(response.status_code().is_redirection());

    let home = other.get("/").await;
    assert!(home
        .text()
        .contains("Only the author can delete this category"));

    // The record is unchanged
    let catalog = catalog(&author).await;
    assert_eq!(catalog.categories.len(), 1);
    assert_eq!(catalog.categories[0].category, "Camping");
}

#[tokio::test]
async fn test_only_author_can_edit_category() {
    let app = test_app().await;
    let author = server_for(&app.router);
    let other = server_for(&app.router);

    signup_and_login(&author, "alice", "alice@example.com").await;
    create_category(&author, "Camping").await;
    let category_id = catalog(&author).await.categories[0].id;

    signup_and_login(&other, "mallory", "mallory@example.com").await;

    let response = other
        .post(&format!("/category/edit/{}", category_id))
        .form(&[("name", "Hijacked")])
        .await;
    assert!(response.status_code().is_redirection());

    let catalog = catalog(&author).await;
    assert_eq!(catalog.categories[0].category, "Camping");
}

#[tokio::test]
async fn test_author_delete_cascades_items() {
    let app = test_app().await;
    let server = server_for(&app.router);

    signup_and_login(&server, "alice", "alice@example.com").await;
    create_category(&server, "Camping").await;
    let category_id = catalog(&server).await.categories[0].id;

    let form = MultipartForm::new()
        .add_text("name", "Tent")
        .add_text("body", "Good shelter even on the rainy days")
        .add_text("category_id", category_id.to_string());
    let response = server.post("/item/new").multipart(form).await;
    assert!(response.status_code().is_redirection());

    let response = server.get(&format!("/category/delete/{}", category_id)).await;
    assert!(response.status_code().is_redirection());

    let home = server.get("/").await;
    assert!(home.text().contains("Camping category deleted successfully"));

    let catalog = catalog(&server).await;
    assert!(catalog.categories.is_empty());

    let gone = server.get("/Camping").await;
    assert_eq!(gone.status_code(), 404);
}

#[tokio::test]
async fn test_item_lifecycle_and_json_views() {
    let app = test_app().await;
    let server = server_for(&app.router);

    signup_and_login(&server, "alice", "alice@example.com").await;
    create_category(&server, "Basketball").await;
    let category_id = catalog(&server).await.categories[0].id;

    let form = MultipartForm::new()
        .add_text("name", "Ball")
        .add_text("body", "Perfectly round and bouncier than ever")
        .add_text("category_id", category_id.to_string());
    let response = server.post("/item/new").multipart(form).await;
    assert!(response.status_code().is_redirection());

    // Every listed field is populated in catalog.json
    let catalog_response = catalog(&server).await;
    let category = &catalog_response.categories[0];
    assert_eq!(category.items.len(), 1);
    let item = &category.items[0];
    assert_eq!(item.name, "Ball");
    assert_eq!(item.description, "Perfectly round and bouncier than ever");
    assert_eq!(item.category_id, category.id);
    assert!(item.author_id > 0);

    let items_json = server.get("/Basketball/items.json").await.json::<Value>();
    assert_eq!(items_json["items"].as_array().unwrap().len(), 1);

    let item_json = server.get("/Basketball/Ball/item.json").await.json::<Value>();
    assert_eq!(item_json["item"]["name"], "Ball");

    let page = server.get("/Basketball/Ball").await;
    assert_eq!(page.status_code(), 200);
    assert!(page.text().contains("Ball"));
}

#[tokio::test]
async fn test_item_image_upload_and_serving() {
    let app = test_app().await;
    let server = server_for(&app.router);

    signup_and_login(&server, "alice", "alice@example.com").await;
    create_category(&server, "Camping").await;
    let category_id = catalog(&server).await.categories[0].id;

    let image = Part::bytes(vec![0x89, b'P', b'N', b'G'])
        .file_name("tent.png")
        .mime_type("image/png");
    let form = MultipartForm::new()
        .add_text("name", "Tent")
        .add_text("body", "Shelter")
        .add_text("category_id", category_id.to_string())
        .add_part("image", image);

    let response = server.post("/item/new").multipart(form).await;
    assert!(response.status_code().is_redirection());

    // The item page links the stored image, which /uploads serves
    let page = server.get("/Camping/Tent").await;
    let text = page.text();
    let start = text.find("/uploads/").expect("Image link missing");
    let end = text[start..].find('"').unwrap() + start;
    let url = &text[start..end];

    let image_response = server.get(url).await;
    assert_eq!(image_response.status_code(), 200);
}

#[tokio::test]
async fn test_item_upload_rejects_disallowed_type() {
    let app = test_app().await;
    let server = server_for(&app.router);

    signup_and_login(&server, "alice", "alice@example.com").await;
    create_category(&server, "Camping").await;
    let category_id = catalog(&server).await.categories[0].id;

    let file = Part::bytes(b"%PDF-1.4".to_vec())
        .file_name("doc.pdf")
        .mime_type("application/pdf");
    let form = MultipartForm::new()
        .add_text("name", "Tent")
        .add_text("body", "Shelter")
        .add_text("category_id", category_id.to_string())
        .add_part("image", file);

    let response = server.post("/item/new").multipart(form).await;

    assert_eq!(response.status_code(), 200);
    assert!(response.text().contains("not allowed"));
}

#[tokio::test]
async fn test_only_author_can_delete_item() {
    let app = test_app().await;
    let author = server_for(&app.router);
    let other = server_for(&app.router);

    signup_and_login(&author, "alice", "alice@example.com").await;
    create_category(&author, "Camping").await;
    let category_id = catalog(&author).await.categories[0].id;

    let form = MultipartForm::new()
        .add_text("name", "Tent")
        .add_text("body", "Shelter")
        .add_text("category_id", category_id.to_string());
    author.post("/item/new").multipart(form).await;

    let item_json = author.get("/Camping/Tent/item.json").await.json::<Value>();
    let item_id = item_json["item"]["id"].as_i64().unwrap();

    signup_and_login(&other, "mallory", "mallory@example.com").await;
    let response = other.get(&format!("/item/delete/{}", item_id)).await;
    assert!(response.status_code().is_redirection());

    // Still there
    let still = author.get("/Camping/Tent/item.json").await.json::<Value>();
    assert_eq!(still["item"]["name"], "Tent");
}

#[tokio::test]
async fn test_unknown_category_is_404() {
    let app = test_app().await;
    let server = server_for(&app.router);

    let page = server.get("/NoSuchCategory").await;
    assert_eq!(page.status_code(), 404);

    let json = server.get("/NoSuchCategory/items.json").await;
    assert_eq!(json.status_code(), 404);
    let body = json.json::<Value>();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_fbconnect_state_mismatch_is_unauthorized() {
    let app = test_app().await;
    let server = server_for(&app.router);

    // Render the login page so a state token is issued and stored
    let login = server.get("/login").await;
    assert_eq!(login.status_code(), 200);

    let response = server
        .post("/fbconnect")
        .form(&[("state", "forged-state"), ("access_token", "short-lived")])
        .await;

    assert_eq!(response.status_code(), 401);
    let body = response.json::<Value>();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    // No session was established
    let home = server.get("/").await;
    assert!(home.text().contains("Log in"));
}

#[tokio::test]
async fn test_fbconnect_without_issued_state_is_unauthorized() {
    let app = test_app().await;
    let server = server_for(&app.router);

    let response = server
        .post("/fbconnect")
        .form(&[("state", ""), ("access_token", "short-lived")])
        .await;

    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_fbconnect_provider_failure_establishes_no_session() {
    let app = test_app().await;
    let server = server_for(&app.router);

    let login = server.get("/login").await;
    let text = login.text();

    // Pull the issued state out of the rendered page
    let marker = "data-state=\"";
    let start = text.find(marker).expect("State missing from login page") + marker.len();
    let end = text[start..].find('"').unwrap() + start;
    let state = &text[start..end];

    // The state matches, but the token exchange hits an unreachable
    // provider and the flow aborts
    let response = server
        .post("/fbconnect")
        .form(&[("state", state), ("access_token", "short-lived")])
        .await;

    assert_eq!(response.status_code(), 401);

    let home = server.get("/").await;
    assert!(home.text().contains("Log in"));
}

#[tokio::test]
async fn test_session_cookie_issued_once() {
    let app = test_app().await;
    let server = server_for(&app.router);

    let first = server.get("/").await;
    assert!(first.headers().get("set-cookie").is_some());

    // The saved cookie is replayed, so no new session is minted
    let second = server.get("/").await;
    assert!(second.headers().get("set-cookie").is_none());
}
