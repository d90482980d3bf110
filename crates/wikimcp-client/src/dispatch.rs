//! Request dispatcher: per-call credential selection and request shaping.
//!
//! Every call goes through [`AuthStrategy::select`]. An OAuth token always
//! wins. Otherwise a call that needs auth (explicitly, or because the wiki is
//! private) requires a live session and fails without one. Anything else is
//! sent anonymously.
//!
//! REST calls send JSON bodies. Action API calls send URL-encoded forms.

use std::sync::Arc;

use reqwest::header::{ACCEPT, AUTHORIZATION, COOKIE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use wikimcp_core::{ApiError, WikiConfig};

use crate::http::HttpClient;
use crate::session::SessionManager;
use crate::types::TokensResponse;

/// How a single request is authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStrategy {
    /// `Authorization: Bearer <token>`
    OAuthBearer,
    /// `Cookie: <session jar>`
    SessionCookie,
    /// No credentials.
    Anonymous,
}

impl AuthStrategy {
    /// Pick the strategy for a call against `wiki`.
    ///
    /// Fails when the call needs auth but neither a token nor a username is
    /// configured.
    pub fn select(wiki: &WikiConfig, need_auth: bool) -> Result<Self, ApiError> {
        if wiki.oauth_token().is_some() {
            return Ok(AuthStrategy::OAuthBearer);
        }

        if !(need_auth || wiki.is_private()) {
            return Ok(AuthStrategy::Anonymous);
        }

        if wiki.username().is_some() {
            Ok(AuthStrategy::SessionCookie)
        } else {
            Err(ApiError::authentication(format!(
                "{} requires authentication but no OAuth token or username is configured",
                wiki.server()
            )))
        }
    }
}

/// Sends requests to one wiki.
///
/// Holds a snapshot of the wiki's configuration taken when the dispatcher was
/// created, so switching the current wiki never redirects a request that is
/// already in flight.
#[derive(Debug, Clone)]
pub struct RequestDispatcher {
    http: HttpClient,
    wiki: Arc<WikiConfig>,
    session: Arc<SessionManager>,
}

impl RequestDispatcher {
    /// Create a dispatcher for `wiki` using `session` for cookie auth.
    pub fn new(http: HttpClient, wiki: Arc<WikiConfig>, session: Arc<SessionManager>) -> Self {
        Self {
            http,
            wiki,
            session,
        }
    }

    /// Configuration this dispatcher targets.
    pub fn wiki(&self) -> &WikiConfig {
        &self.wiki
    }

    /// Session used for cookie auth.
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    // ------------------------------------------------------------------------
    // REST API
    // ------------------------------------------------------------------------

    /// `GET {server}{scriptpath}/rest.php{path}` with query parameters.
    #[instrument(skip(self, query), fields(wiki = %self.wiki.server()))]
    pub async fn rest_get<T>(
        &self,
        path: &str,
        query: &[(&str, String)],
        need_auth: bool,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let strategy = self.authorize(need_auth).await?;
        let url = self.wiki.rest_url(path);

        let mut request = self
            .http
            .client()
            .get(&url)
            .header(ACCEPT, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        let request = self.attach(request, strategy).await;

        Ok(self.http.send_json(request, &url).await?.body)
    }

    /// `POST` a JSON body to a REST path.
    pub async fn rest_post<T>(&self, path: &str, body: Value, need_auth: bool) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        self.rest_send(Method::POST, path, body, need_auth).await
    }

    /// `PUT` a JSON body to a REST path.
    pub async fn rest_put<T>(&self, path: &str, body: Value, need_auth: bool) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        self.rest_send(Method::PUT, path, body, need_auth).await
    }

    /// Like [`rest_get`](Self::rest_get), but any failure is logged and
    /// becomes `None`.
    pub async fn rest_get_or_none<T>(
        &self,
        path: &str,
        query: &[(&str, String)],
        need_auth: bool,
    ) -> Option<T>
    where
        T: DeserializeOwned,
    {
        discard(path, self.rest_get(path, query, need_auth).await)
    }

    /// Like [`rest_post`](Self::rest_post), but failures become `None`.
    pub async fn rest_post_or_none<T>(&self, path: &str, body: Value, need_auth: bool) -> Option<T>
    where
        T: DeserializeOwned,
    {
        discard(path, self.rest_post(path, body, need_auth).await)
    }

    /// Like [`rest_put`](Self::rest_put), but failures become `None`.
    pub async fn rest_put_or_none<T>(&self, path: &str, body: Value, need_auth: bool) -> Option<T>
    where
        T: DeserializeOwned,
    {
        discard(path, self.rest_put(path, body, need_auth).await)
    }

    #[instrument(skip(self, body), fields(wiki = %self.wiki.server()))]
    async fn rest_send<T>(
        &self,
        method: Method,
        path: &str,
        mut body: Value,
        need_auth: bool,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let strategy = self.authorize(need_auth).await?;

        let url = self.wiki.rest_url(path);

        // Cookie sessions must prove the request came from this client.
        if strategy == AuthStrategy::SessionCookie {
            let Value::Object(ref mut fields) = body else {
                return Err(ApiError::InvalidRequest {
                    url,
                    message: "a cookie-authenticated body must be a JSON object to carry the edit token"
                        .to_string(),
                });
            };
            let token = self.session.edit_token().await?;
            fields.insert("token".to_string(), Value::String(token));
        }

        let request = self
            .http
            .client()
            .request(method, &url)
            .header(ACCEPT, "application/json")
            .json(&body);
        let request = self.attach(request, strategy).await;

        Ok(self.http.send_json(request, &url).await?.body)
    }

    // ------------------------------------------------------------------------
    // Action API
    // ------------------------------------------------------------------------

    /// `POST` a form to `api.php`.
    ///
    /// `format=json` is added. With `need_auth`, a fresh CSRF token is added
    /// as `token`. Unlike the REST helpers this propagates every failure,
    /// including errors the wiki reports inside a 200 response.
    #[instrument(skip(self, params), fields(wiki = %self.wiki.server()))]
    pub async fn action<T>(&self, params: &[(&str, &str)], need_auth: bool) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let strategy = self.authorize(need_auth).await?;

        let mut form: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        form.push(("format".to_string(), "json".to_string()));

        if need_auth {
            let token = self.edit_token(strategy).await?;
            form.push(("token".to_string(), token));
        }

        let url = self.wiki.api_url();
        let request = self.http.client().post(&url).form(&form);
        let request = self.attach(request, strategy).await;

        let body: Value = self.http.send_json(request, &url).await?.body;
        check_action_response(&body)?;

        serde_json::from_value(body).map_err(|e| ApiError::decode(&url, e.to_string()))
    }

    // ------------------------------------------------------------------------
    // Credentials
    // ------------------------------------------------------------------------

    /// Select a strategy and, for cookie auth, make sure a session exists.
    async fn authorize(&self, need_auth: bool) -> Result<AuthStrategy, ApiError> {
        let strategy = AuthStrategy::select(&self.wiki, need_auth)?;

        if strategy == AuthStrategy::SessionCookie && !self.session.authenticate().await {
            return Err(ApiError::authentication(format!(
                "login to {} as {} did not succeed",
                self.wiki.server(),
                self.wiki.username().unwrap_or_default()
            )));
        }

        debug!(?strategy, "Request authorized");
        Ok(strategy)
    }

    async fn attach(&self, request: RequestBuilder, strategy: AuthStrategy) -> RequestBuilder {
        match strategy {
            AuthStrategy::OAuthBearer => match self.wiki.oauth_token() {
                Some(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
                None => request,
            },
            AuthStrategy::SessionCookie => {
                let cookies = self.session.cookies().await;
                if cookies.is_empty() {
                    request
                } else {
                    request.header(COOKIE, cookies)
                }
            }
            AuthStrategy::Anonymous => request,
        }
    }

    async fn edit_token(&self, strategy: AuthStrategy) -> Result<String, ApiError> {
        match strategy {
            AuthStrategy::SessionCookie => self.session.edit_token().await,
            AuthStrategy::OAuthBearer | AuthStrategy::Anonymous => {
                let url = self.wiki.api_url();
                let request = self.http.client().post(&url).form(&[
                    ("action", "query"),
                    ("meta", "tokens"),
                    ("type", "csrf"),
                    ("format", "json"),
                ]);
                let request = self.attach(request, strategy).await;
                let response = self.http.send_json::<TokensResponse>(request, &url).await?;

                response
                    .body
                    .csrf_token()
                    .ok_or_else(|| ApiError::decode(&url, "response has no query.tokens.csrftoken"))
            }
        }
    }
}

/// Surface errors reported inside an Action API payload.
fn check_action_response(body: &Value) -> Result<(), ApiError> {
    if let Some(error) = body.get("error") {
        let field = |name: &str| {
            error
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        return Err(ApiError::Api {
            code: field("code"),
            info: field("info"),
        });
    }

    if let Some(result) = body.pointer("/edit/result").and_then(Value::as_str) {
        if result != "Success" {
            return Err(ApiError::Api {
                code: "editfailed".to_string(),
                info: format!("edit result was {}", result),
            });
        }
    }

    Ok(())
}

fn discard<T>(path: &str, result: Result<T, ApiError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(path, kind = ?e.kind(), error = %e, "REST request failed");
            None
        }
    }
}
