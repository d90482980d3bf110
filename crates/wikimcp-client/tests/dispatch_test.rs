//! Request dispatcher behaviour against a mock MediaWiki.

mod common;

use serde_json::{json, Value};
use wiremock::matchers::{
    body_partial_json, body_string_contains, header, method, path, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wikimcp_client::types::{PageObject, SearchPageResponse};
use wikimcp_core::{ErrorKind, WikiConfig};

use common::*;

#[tokio::test]
async fn test_anonymous_get_sends_one_bare_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/rest.php/v1/page/Main_Page"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body("Main Page")))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = dispatcher(wiki(&server));
    let page: PageObject = dispatcher
        .rest_get_or_none("/v1/page/Main_Page", &[], false)
        .await
        .unwrap();
    assert_eq!(page.title, "Main Page");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("cookie").is_none());
    assert!(requests[0].headers.get("authorization").is_none());
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn test_credentials_unused_when_not_needed() {
    let server = MockServer::start().await;
    mount_login_token(&server, 0).await;
    Mock::given(method("GET"))
        .and(path("/w/rest.php/v1/page/Main_Page/bare"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body("Main Page")))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = dispatcher(wiki_with_login(&server));
    let page: Option<PageObject> = dispatcher
        .rest_get_or_none("/v1/page/Main_Page/bare", &[], false)
        .await;
    assert!(page.is_some());
}

#[tokio::test]
async fn test_query_parameters_are_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/rest.php/v1/search/page"))
        .and(query_param("q", "earth & moon"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"pages": []})))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = dispatcher(wiki(&server));
    let results: SearchPageResponse = dispatcher
        .rest_get(
            "/v1/search/page",
            &[("q", "earth & moon".to_string()), ("limit", "5".to_string())],
            false,
        )
        .await
        .unwrap();
    assert!(results.pages.is_empty());
}

#[tokio::test]
async fn test_oauth_token_skips_session_login() {
    let server = MockServer::start().await;
    mount_login_token(&server, 0).await;
    Mock::given(method("GET"))
        .and(path("/w/rest.php/v1/page/Secret"))
        .and(header("authorization", "Bearer owner-only-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body("Secret")))
        .expect(1)
        .mount(&server)
        .await;

    let wiki = WikiConfig {
        token: Some("owner-only-token".to_string()),
        private: true,
        ..wiki_with_login(&server)
    };
    let page: PageObject = dispatcher(wiki)
        .rest_get("/v1/page/Secret", &[], true)
        .await
        .unwrap();
    assert_eq!(page.title, "Secret");

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("cookie").is_none());
}

#[tokio::test]
async fn test_private_wiki_logs_in_before_reading() {
    let server = MockServer::start().await;
    mount_login_token(&server, 1).await;
    mount_clientlogin(&server, "PASS", 1).await;
    Mock::given(method("GET"))
        .and(path("/w/rest.php/v1/page/Internal"))
        .and(header("cookie", "wiki_session=post; wikiUserName=Bot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body("Internal")))
        .expect(2)
        .mount(&server)
        .await;

    let wiki = WikiConfig {
        private: true,
        ..wiki_with_login(&server)
    };
    let dispatcher = dispatcher(wiki);
    for _ in 0..2 {
        let page: Option<PageObject> = dispatcher.rest_get_or_none("/v1/page/Internal", &[], false).await;
        assert!(page.is_some());
    }
}

#[tokio::test]
async fn test_private_wiki_failed_login_never_sends_request() {
    let server = MockServer::start().await;
    mount_login_token(&server, 1).await;
    mount_clientlogin(&server, "FAIL", 1).await;
    Mock::given(method("GET"))
        .and(path("/w/rest.php/v1/page/Internal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body("Internal")))
        .expect(0)
        .mount(&server)
        .await;

    let wiki = WikiConfig {
        private: true,
        ..wiki_with_login(&server)
    };
    let dispatcher = dispatcher(wiki);
    let page: Option<PageObject> = dispatcher.rest_get_or_none("/v1/page/Internal", &[], false).await;
    assert!(page.is_none());

    let err = dispatcher
        .rest_get::<PageObject>("/v1/page/Internal", &[], false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
}

#[tokio::test]
async fn test_need_auth_without_credentials_sends_nothing() {
    let server = MockServer::start().await;
    let dispatcher = dispatcher(wiki(&server));

    let created: Option<PageObject> = dispatcher
        .rest_post_or_none("/v1/page", json!({"title": "X", "source": "x"}), true)
        .await;
    assert!(created.is_none());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_http_error_is_none_for_rest_but_raised_for_action() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/rest.php/v1/page/Missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"httpCode": 404})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/w/api.php"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let dispatcher = dispatcher(wiki(&server));

    let page: Option<PageObject> = dispatcher.rest_get_or_none("/v1/page/Missing", &[], false).await;
    assert!(page.is_none());

    let err = dispatcher
        .rest_get::<PageObject>("/v1/page/Missing", &[], false)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert!(err.to_string().contains("/w/rest.php/v1/page/Missing"));

    let err = dispatcher
        .action::<Value>(&[("action", "query"), ("meta", "siteinfo")], false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HttpStatus);
    assert_eq!(err.status(), Some(503));
    assert!(err.to_string().contains("upstream unavailable"));
}

#[tokio::test]
async fn test_invalid_json_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/rest.php/v1/page/Broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<!DOCTYPE html>"))
        .mount(&server)
        .await;

    let err = dispatcher(wiki(&server))
        .rest_get::<PageObject>("/v1/page/Broken", &[], false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[tokio::test]
async fn test_cookie_post_adds_fresh_edit_token() {
    let server = MockServer::start().await;
    mount_login_token(&server, 1).await;
    mount_clientlogin(&server, "PASS", 1).await;
    mount_csrf_token(&server, 2).await;
    Mock::given(method("POST"))
        .and(path("/w/rest.php/v1/page"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({"title": "New page", "token": CSRF_TOKEN})))
        .respond_with(ResponseTemplate::new(201).set_body_json(page_body("New page")))
        .expect(2)
        .mount(&server)
        .await;

    let dispatcher = dispatcher(wiki_with_login(&server));
    for _ in 0..2 {
        let page: PageObject = dispatcher
            .rest_post(
                "/v1/page",
                json!({"title": "New page", "source": "Hello", "comment": ""}),
                true,
            )
            .await
            .unwrap();
        assert_eq!(page.title, "New page");
    }
}

#[tokio::test]
async fn test_cookie_post_rejects_body_that_cannot_carry_a_token() {
    let server = MockServer::start().await;
    mount_login_token(&server, 1).await;
    mount_clientlogin(&server, "PASS", 1).await;
    mount_csrf_token(&server, 0).await;
    Mock::given(method("POST"))
        .and(path("/w/rest.php/v1/page"))
        .respond_with(ResponseTemplate::new(201).set_body_json(page_body("New page")))
        .expect(0)
        .mount(&server)
        .await;

    let err = dispatcher(wiki_with_login(&server))
        .rest_post::<PageObject>("/v1/page", json!(["not", "an", "object"]), true)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert!(err.to_string().contains("/w/rest.php/v1/page"));
}

#[tokio::test]
async fn test_put_with_oauth_sends_body_without_token() {
    let server = MockServer::start().await;
    mount_csrf_token(&server, 0).await;
    Mock::given(method("PUT"))
        .and(path("/w/rest.php/v1/page/Sandbox"))
        .and(header("authorization", "Bearer tok"))
        .and(body_partial_json(json!({"source": "v2", "latest": {"id": 42}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body("Sandbox")))
        .expect(1)
        .mount(&server)
        .await;

    let wiki = WikiConfig {
        token: Some("tok".to_string()),
        ..wiki(&server)
    };
    let page: PageObject = dispatcher(wiki)
        .rest_put(
            "/v1/page/Sandbox",
            json!({"source": "v2", "comment": "edit", "latest": {"id": 42}}),
            true,
        )
        .await
        .unwrap();
    assert_eq!(page.latest.id, 42);

    let requests = server.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(sent.get("token").is_none());
}

#[tokio::test]
async fn test_action_with_auth_adds_token_and_surfaces_api_errors() {
    let server = MockServer::start().await;
    mount_login_token(&server, 1).await;
    mount_clientlogin(&server, "PASS", 1).await;
    mount_csrf_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/w/api.php"))
        .and(body_string_contains("action=edit"))
        .and(body_string_contains("format=json"))
        .and(body_string_contains("token=d41d8cd98f00b204e9800998ecf8427e%2B%5C"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"code": "protectedpage", "info": "This page has been protected."}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = dispatcher(wiki_with_login(&server))
        .action::<Value>(&[("action", "edit"), ("title", "Main Page"), ("text", "x")], true)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Api);
    assert!(err.to_string().contains("protectedpage"));
}

#[tokio::test]
async fn test_action_auth_failure_is_raised() {
    let server = MockServer::start().await;
    mount_login_token(&server, 1).await;
    mount_clientlogin(&server, "FAIL", 1).await;
    mount_csrf_token(&server, 0).await;

    let err = dispatcher(wiki_with_login(&server))
        .action::<Value>(&[("action", "edit")], true)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
}
