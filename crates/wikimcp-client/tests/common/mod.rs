//! Shared fixtures for the wiremock-backed client tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wikimcp_client::{HttpClient, RequestDispatcher, SessionManager};
use wikimcp_core::{HttpConfig, WikiConfig};

pub const LOGIN_TOKEN: &str = "b5780b6e2f27e20b450921d9461010b4+\\";
pub const CSRF_TOKEN: &str = "d41d8cd98f00b204e9800998ecf8427e+\\";

/// Wiki pointing at the mock server with script path `/w`.
pub fn wiki(server: &MockServer) -> WikiConfig {
    WikiConfig {
        sitename: "Test Wiki".to_string(),
        server: server.uri(),
        ..WikiConfig::default()
    }
}

/// Same wiki with session credentials.
pub fn wiki_with_login(server: &MockServer) -> WikiConfig {
    WikiConfig {
        username: Some("Bot".to_string()),
        password: Some("hunter2".to_string()),
        ..wiki(server)
    }
}

pub fn http() -> HttpClient {
    HttpClient::new(&HttpConfig::default()).unwrap()
}

pub fn http_with_timeout(secs: u64) -> HttpClient {
    HttpClient::new(&HttpConfig {
        timeout_secs: secs,
        ..HttpConfig::default()
    })
    .unwrap()
}

pub fn session(wiki: &WikiConfig) -> SessionManager {
    SessionManager::new(http(), wiki)
}

pub fn dispatcher(wiki: WikiConfig) -> RequestDispatcher {
    let session = Arc::new(session(&wiki));
    RequestDispatcher::new(http(), Arc::new(wiki), session)
}

pub fn login_token_body() -> Value {
    json!({"batchcomplete": "", "query": {"tokens": {"logintoken": LOGIN_TOKEN}}})
}

pub fn csrf_token_body() -> Value {
    json!({"batchcomplete": "", "query": {"tokens": {"csrftoken": CSRF_TOKEN}}})
}

pub fn clientlogin_body(status: &str) -> Value {
    match status {
        "PASS" => json!({"clientlogin": {"status": "PASS", "username": "Bot"}}),
        other => json!({"clientlogin": {
            "status": other,
            "message": "Incorrect username or password entered.",
            "messagecode": "wrongpassword"
        }}),
    }
}

pub fn page_body(title: &str) -> Value {
    json!({
        "id": 1,
        "key": title.replace(' ', "_"),
        "title": title,
        "latest": {"id": 42, "timestamp": "2025-01-01T00:00:00Z"},
        "content_model": "wikitext",
        "license": {"url": "https://creativecommons.org/licenses/by-sa/4.0/", "title": "CC BY-SA 4.0"},
        "html_url": null
    })
}

/// Mount the login-token step.
pub async fn mount_login_token(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/w/api.php"))
        .and(body_string_contains("type=login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(login_token_body())
                .append_header("set-cookie", "wiki_session=pre; path=/; HttpOnly"),
        )
        .expect(expected)
        .mount(server)
        .await;
}

/// Mount the credential step returning `status`.
pub async fn mount_clientlogin(server: &MockServer, status: &str, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/w/api.php"))
        .and(body_string_contains("action=clientlogin"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(clientlogin_body(status))
                .append_header("set-cookie", "wiki_session=post; path=/; HttpOnly")
                .append_header("set-cookie", "wikiUserName=Bot; path=/"),
        )
        .expect(expected)
        .mount(server)
        .await;
}

/// Mount the CSRF token fetch.
pub async fn mount_csrf_token(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/w/api.php"))
        .and(body_string_contains("type=csrf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(csrf_token_body()))
        .expect(expected)
        .mount(server)
        .await;
}

pub const SHORT_DELAY: Duration = Duration::from_millis(200);
