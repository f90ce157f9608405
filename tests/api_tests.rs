mod common;

use common::*;
use hangar::models::{OwnershipRole, ProviderIdentity};
use hangar::{AppConfig, AppState, RegistryError, RegistryResult, VcsProvider};
use rocket::http::{ContentType, Header, Status};
use rocket::local::blocking::Client;
use serial_test::serial;
use std::sync::Arc;

/// Provider double keyed on fixed tokens
struct StubProvider;

#[rocket::async_trait]
impl VcsProvider for StubProvider {
    async fn identify(&self, token: &str) -> RegistryResult<ProviderIdentity> {
        let (node_id, username) = match token {
            "admin-token" => ("node-admin", "ada"),
            "maint-token" => ("node-maint", "max"),
            _ => return Err(RegistryError::BadAuth("Unknown token".to_string())),
        };
        Ok(ProviderIdentity {
            node_id: node_id.to_string(),
            username: username.to_string(),
            avatar: format!("https://avatars.example.test/{username}"),
        })
    }

    async fn check_ownership(&self, token: &str, _repo: &str) -> RegistryResult<OwnershipRole> {
        match token {
            "admin-token" => Ok(OwnershipRole::Admin),
            "maint-token" => Ok(OwnershipRole::Maintainer),
            _ => Err(RegistryError::BadAuth("Unknown token".to_string())),
        }
    }
}

struct TestServer {
    client: Client,
    _db: Arc<TestDatabase>,
}

fn create_test_server() -> TestServer {
    let db = Arc::new(create_test_database());
    let database = Arc::new(hangar::DatabaseService {
        pool: db.service.pool.clone(),
    });

    let state = AppState {
        config: AppConfig::default(),
        database,
        vcs: Arc::new(StubProvider),
    };

    let rocket = hangar::build_rocket(state).expect("valid rocket");
    let client = Client::tracked(rocket).expect("valid rocket instance");
    TestServer { client, _db: db }
}

fn bearer(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Bearer {token}"))
}

fn sign_in(client: &Client, token: &str) {
    let response = client
        .post("/api/users/session")
        .header(bearer(token))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
}

fn publish(client: &Client, token: &str, name: &str, semver: &str) -> Status {
    let body = serde_json::json!({
        "name": name,
        "repository": {"type": "git", "url": format!("https://github.com/hangar-test/{name}")},
        "readme": format!("# {name}"),
        "creation_method": "User Made Package",
        "owner": "hangar-test",
        "metadata": {"name": name, "version": semver},
        "version": {
            "semver": semver,
            "license": "MIT",
            "engines": {"atom": "*"},
            "tarball_url": format!("https://codeload.example.test/{name}/v{semver}.tar.gz"),
        }
    });

    client
        .post("/api/packages")
        .header(ContentType::JSON)
        .header(bearer(token))
        .body(body.to_string())
        .dispatch()
        .status()
}

#[test]
fn test_health_check() {
    let server = create_test_server();
    let response = server.client.get("/api/health").dispatch();
    assert_eq!(response.status(), Status::Ok);

    let body: serde_json::Value = response.into_json().expect("json body");
    assert_eq!(body["status"], "ok");
}

#[test]
fn test_sign_in_creates_user_once() {
    let server = create_test_server();
    sign_in(&server.client, "admin-token");
    sign_in(&server.client, "admin-token");

    let response = server.client.get("/api/users/ada").dispatch();
    assert_eq!(response.status(), Status::Ok);
    let body: serde_json::Value = response.into_json().expect("json body");
    assert_eq!(body["username"], "ada");

    let response = server
        .client
        .post("/api/users/session")
        .header(bearer("bogus"))
        .dispatch();
    assert_eq!(response.status(), Status::Unauthorized);
}

#[test]
fn test_publish_and_read_package() {
    let server = create_test_server();
    sign_in(&server.client, "admin-token");

    assert_eq!(
        publish(&server.client, "admin-token", "Minimap", "1.0.0"),
        Status::Created
    );

    let response = server.client.get("/api/packages/MINIMAP").dispatch();
    assert_eq!(response.status(), Status::Ok);
    let body: serde_json::Value = response.into_json().expect("json body");
    assert_eq!(body["name"], "minimap");
    assert_eq!(body["downloads"], "0");
    assert_eq!(body["versions"][0]["semver"], "1.0.0");
    assert_eq!(body["versions"][0]["status"], "latest");

    assert_eq!(
        publish(&server.client, "admin-token", "minimap", "2.0.0"),
        Status::Conflict
    );
}

#[test]
fn test_missing_package_returns_error_body() {
    let server = create_test_server();
    let response = server.client.get("/api/packages/nothing-here").dispatch();
    assert_eq!(response.status(), Status::NotFound);

    let body: serde_json::Value = response.into_json().expect("json body");
    assert_eq!(body["ok"], false);
    assert_eq!(body["category"], "not_found");
}

#[test]
fn test_mutations_require_authentication() {
    let server = create_test_server();
    sign_in(&server.client, "admin-token");
    publish(&server.client, "admin-token", "guarded", "1.0.0");

    let response = server.client.post("/api/packages/guarded/star").dispatch();
    assert_eq!(response.status(), Status::Unauthorized);

    let response = server.client.delete("/api/packages/guarded").dispatch();
    assert_eq!(response.status(), Status::Unauthorized);

    // Valid provider token, but the account never signed in
    let response = server
        .client
        .post("/api/packages/guarded/star")
        .header(bearer("maint-token"))
        .dispatch();
    assert_eq!(response.status(), Status::Unauthorized);
}

#[test]
fn test_guard_failures_render_json_errors() {
    let server = create_test_server();
    sign_in(&server.client, "admin-token");
    publish(&server.client, "admin-token", "fenced", "1.0.0");

    let response = server.client.post("/api/packages/fenced/star").dispatch();
    assert_eq!(response.status(), Status::Unauthorized);
    let body: serde_json::Value = response.into_json().expect("json body");
    assert_eq!(body["ok"], false);
    assert_eq!(body["category"], "bad_auth");
    assert_eq!(body["message"], "Authorization header required");

    let response = server
        .client
        .post("/api/packages/fenced/star")
        .header(bearer("bogus"))
        .dispatch();
    assert_eq!(response.status(), Status::Unauthorized);
    let body: serde_json::Value = response.into_json().expect("json body");
    assert_eq!(body["message"], "Unknown token");

    let response = server.client.get("/api/no/such/route").dispatch();
    assert_eq!(response.status(), Status::NotFound);
    let body: serde_json::Value = response.into_json().expect("json body");
    assert_eq!(body["category"], "not_found");
}

#[test]
fn test_publish_version_and_download_tarball() {
    let server = create_test_server();
    sign_in(&server.client, "maint-token");
    publish(&server.client, "maint-token", "tools", "1.0.0");

    let response = server
        .client
        .post("/api/packages/tools/versions")
        .header(ContentType::JSON)
        .header(bearer("maint-token"))
        .body(
            serde_json::json!({
                "semver": "1.1.0",
                "tarball_url": "https://codeload.example.test/tools/v1.1.0.tar.gz"
            })
            .to_string(),
        )
        .dispatch();
    assert_eq!(response.status(), Status::Created);

    let response = server
        .client
        .get("/api/packages/tools/versions/1.1.0/tarball")
        .dispatch();
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(
        response.headers().get_one("Location"),
        Some("https://codeload.example.test/tools/v1.1.0.tar.gz")
    );

    let response = server.client.get("/api/packages/tools/versions/1.1.0").dispatch();
    let body: serde_json::Value = response.into_json().expect("json body");
    assert_eq!(body["status"], "latest");
    assert_eq!(body["license"], "NONE");

    let response = server.client.get("/api/packages/tools").dispatch();
    let body: serde_json::Value = response.into_json().expect("json body");
    assert_eq!(body["downloads"], "1");
}

#[test]
fn test_star_flow_and_stargazers() {
    let server = create_test_server();
    sign_in(&server.client, "admin-token");
    publish(&server.client, "admin-token", "shiny", "1.0.0");

    let response = server
        .client
        .post("/api/packages/shiny/star")
        .header(bearer("admin-token"))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);

    let response = server.client.get("/api/packages/shiny/stargazers").dispatch();
    let body: serde_json::Value = response.into_json().expect("json body");
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["username"], "ada");

    let response = server.client.get("/api/users/ada/stars").dispatch();
    let body: serde_json::Value = response.into_json().expect("json body");
    assert_eq!(body[0]["name"], "shiny");
    assert_eq!(body[0]["stargazers_count"], "1");

    let response = server
        .client
        .delete("/api/packages/shiny/star")
        .header(bearer("admin-token"))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);

    let response = server
        .client
        .delete("/api/packages/shiny/star")
        .header(bearer("admin-token"))
        .dispatch();
    assert_eq!(response.status(), Status::NotFound);

    let response = server
        .client
        .get("/api/stars")
        .header(bearer("admin-token"))
        .dispatch();
    let body: serde_json::Value = response.into_json().expect("json body");
    assert_eq!(body.as_array().map(Vec::len), Some(0));
}

#[test]
fn test_rename_over_http() {
    let server = create_test_server();
    sign_in(&server.client, "admin-token");
    publish(&server.client, "admin-token", "first-name", "1.0.0");

    let response = server
        .client
        .post("/api/packages/first-name/rename")
        .header(ContentType::JSON)
        .header(bearer("admin-token"))
        .body(serde_json::json!({"new_name": "second-name"}).to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Ok);

    let response = server.client.get("/api/packages/first-name").dispatch();
    let body: serde_json::Value = response.into_json().expect("json body");
    assert_eq!(body["name"], "second-name");
}

#[test]
fn test_maintainer_cannot_delete() {
    let server = create_test_server();
    sign_in(&server.client, "maint-token");
    sign_in(&server.client, "admin-token");
    publish(&server.client, "maint-token", "shared", "1.0.0");

    let response = server
        .client
        .delete("/api/packages/shared")
        .header(bearer("maint-token"))
        .dispatch();
    assert_eq!(response.status(), Status::Unauthorized);
    assert_eq!(
        server.client.get("/api/packages/shared").dispatch().status(),
        Status::Ok
    );

    let response = server
        .client
        .delete("/api/packages/shared")
        .header(bearer("admin-token"))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(
        server.client.get("/api/packages/shared").dispatch().status(),
        Status::NotFound
    );
}

#[test]
#[serial]
fn test_create_rocket_from_environment() {
    let temp_dir = tempfile::TempDir::new().expect("temp dir");
    let database_url = temp_dir.path().join("env.db").to_string_lossy().to_string();

    // SAFETY: serialized with every other test that touches the environment
    unsafe {
        std::env::set_var("HANGAR_DATABASE_URL", &database_url);
        std::env::set_var("HANGAR_PORT", "9191");
    }

    let rocket = hangar::create_rocket().expect("rocket from env");
    let state = rocket.state::<AppState>().expect("managed state");
    assert_eq!(state.config.port, 9191);
    assert_eq!(state.config.database_url, database_url);

    unsafe {
        std::env::remove_var("HANGAR_DATABASE_URL");
        std::env::remove_var("HANGAR_PORT");
    }
}
