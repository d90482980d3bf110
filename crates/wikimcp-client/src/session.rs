//! Cookie-based session authentication against the Action API.
//!
//! A [`SessionManager`] logs in with `action=clientlogin` and trusts the
//! resulting session for a fixed window. The handshake runs under the
//! session lock, so concurrent callers never start two logins: a caller that
//! arrives while a handshake is in flight waits for it and shares its result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use wikimcp_core::{ApiError, WikiConfig};

use crate::cookie::CookieJar;
use crate::http::HttpClient;
use crate::types::{ClientLoginResponse, TokensResponse};

/// How long a successful login is trusted without re-checking.
pub const DEFAULT_AUTH_CACHE: Duration = Duration::from_secs(5 * 60);

/// The only `clientlogin.status` that means success.
const LOGIN_PASS: &str = "PASS";

/// Mutable session state, guarded by the session lock.
#[derive(Debug, Default)]
struct SessionState {
    /// Cookies for this wiki.
    jar: CookieJar,
    /// Expiry of the cached login; `None` means anonymous.
    authenticated_until: Option<Instant>,
    /// Outcome of the most recent handshake.
    last_outcome: bool,
}

impl SessionState {
    fn is_fresh(&self) -> bool {
        self.authenticated_until
            .map(|until| Instant::now() < until)
            .unwrap_or(false)
    }
}

/// Session manager for a single wiki.
pub struct SessionManager {
    http: HttpClient,
    api_url: String,
    server: String,
    username: Option<String>,
    password: Option<String>,
    cache_ttl: Duration,
    state: Mutex<SessionState>,
    /// Number of completed handshakes; lets waiters detect that a login
    /// finished while they were queued on the lock.
    handshakes: AtomicU64,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("api_url", &self.api_url)
            .field("username", &self.username)
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

impl SessionManager {
    /// Create a session manager for `wiki`.
    pub fn new(http: HttpClient, wiki: &WikiConfig) -> Self {
        Self {
            http,
            api_url: wiki.api_url(),
            server: wiki.server().to_string(),
            username: wiki.username().map(str::to_string),
            password: wiki.password().map(str::to_string),
            cache_ttl: DEFAULT_AUTH_CACHE,
            state: Mutex::new(SessionState::default()),
            handshakes: AtomicU64::new(0),
        }
    }

    /// Set how long a successful login is trusted.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Whether both a username and a password are configured.
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// Check for (or establish) an authenticated session.
    ///
    /// Returns `true` immediately while a previous login is inside the cache
    /// window. Without credentials returns `false` and performs no I/O.
    /// Otherwise logs in; failures are logged and reported as `false`.
    #[instrument(skip(self), fields(api = %self.api_url))]
    pub async fn is_authenticated(&self) -> bool {
        let observed = self.handshakes.load(Ordering::Acquire);
        let mut state = self.state.lock().await;

        if state.is_fresh() {
            return true;
        }

        if !self.has_credentials() {
            return false;
        }

        // Someone else completed a handshake while we waited for the lock.
        // Its success only counts while the session it opened is still fresh.
        if self.handshakes.load(Ordering::Acquire) != observed {
            return state.last_outcome && state.is_fresh();
        }

        let outcome = self.login(&mut state).await;
        state.last_outcome = outcome;
        self.handshakes.fetch_add(1, Ordering::Release);
        outcome
    }

    /// Entry point for state-changing calls; same contract as
    /// [`is_authenticated`](Self::is_authenticated).
    pub async fn authenticate(&self) -> bool {
        self.is_authenticated().await
    }

    /// Cookies for a `Cookie` request header (empty if never logged in).
    pub async fn cookies(&self) -> String {
        self.state.lock().await.jar.serialize()
    }

    /// Fetch a fresh CSRF token for edits using the session cookies.
    #[instrument(skip(self), fields(api = %self.api_url))]
    pub async fn edit_token(&self) -> Result<String, ApiError> {
        let mut state = self.state.lock().await;

        let response = self
            .post_form::<TokensResponse>(
                &state.jar,
                &[
                    ("action", "query"),
                    ("meta", "tokens"),
                    ("type", "csrf"),
                    ("format", "json"),
                ],
            )
            .await?;
        state.jar.merge(&response.set_cookies);

        response
            .body
            .csrf_token()
            .ok_or_else(|| ApiError::decode(&self.api_url, "response has no query.tokens.csrftoken"))
    }

    /// Forget the session: clear cookies and return to anonymous.
    pub async fn logout(&self) {
        let mut state = self.state.lock().await;
        state.jar.clear();
        state.authenticated_until = None;
        state.last_outcome = false;
        debug!(api = %self.api_url, "Session cleared");
    }

    /// Run the two-step login handshake.
    ///
    /// Works on a scratch jar so a transport failure leaves the session's
    /// cookies untouched. An expired session's cookies are dropped before the
    /// first attempt, so they never reach a new login even if that attempt
    /// fails and is retried; cookies collected by earlier failed attempts are
    /// carried over.
    async fn login(&self, state: &mut SessionState) -> bool {
        let (Some(username), Some(password)) = (&self.username, &self.password) else {
            return false;
        };

        if state.authenticated_until.take().is_some() {
            debug!("Session expired, discarding its cookies");
            state.jar.clear();
        }
        let mut jar = state.jar.clone();

        let token = match self.fetch_login_token(&mut jar).await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to get login token");
                return false;
            }
        };

        let response = match self
            .post_form::<ClientLoginResponse>(
                &jar,
                &[
                    ("action", "clientlogin"),
                    ("username", username),
                    ("password", password),
                    ("logintoken", &token),
                    ("loginreturnurl", &self.server),
                    ("format", "json"),
                ],
            )
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Error during login");
                return false;
            }
        };

        // Failed logins may still set cookies needed for the next attempt.
        jar.merge(&response.set_cookies);
        state.jar = jar;

        match response.body.clientlogin {
            Some(login) if login.status == LOGIN_PASS => {
                state.authenticated_until = Some(Instant::now() + self.cache_ttl);
                info!(user = %username, "Logged in");
                true
            }
            Some(login) => {
                warn!(
                    status = %login.status,
                    reason = %login.message.or(login.messagecode).unwrap_or_default(),
                    "Login failed"
                );
                false
            }
            None => {
                warn!("Login failed: response has no clientlogin object");
                false
            }
        }
    }

    async fn fetch_login_token(&self, jar: &mut CookieJar) -> Result<String, ApiError> {
        let response = self
            .post_form::<TokensResponse>(
                jar,
                &[
                    ("action", "query"),
                    ("meta", "tokens"),
                    ("type", "login"),
                    ("format", "json"),
                ],
            )
            .await?;
        jar.merge(&response.set_cookies);

        response
            .body
            .login_token()
            .ok_or_else(|| ApiError::decode(&self.api_url, "response has no query.tokens.logintoken"))
    }

    async fn post_form<T>(
        &self,
        jar: &CookieJar,
        form: &[(&str, &str)],
    ) -> Result<crate::http::JsonResponse<T>, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut request = self.http.client().post(&self.api_url).form(form);
        if !jar.is_empty() {
            request = request.header(reqwest::header::COOKIE, jar.serialize());
        }
        self.http.send_json(request, &self.api_url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wikimcp_core::HttpConfig;

    fn manager(wiki: WikiConfig) -> SessionManager {
        let http = HttpClient::new(&HttpConfig::default()).unwrap();
        SessionManager::new(http, &wiki)
    }

    #[tokio::test]
    async fn test_no_credentials_is_not_authenticated() {
        // Unroutable server: any network attempt would fail the test by timing out.
        let session = manager(WikiConfig {
            server: "http://127.0.0.1:9".to_string(),
            ..WikiConfig::default()
        });
        assert!(!session.has_credentials());
        assert!(!session.is_authenticated().await);
        assert_eq!(session.cookies().await, "");
    }

    #[tokio::test]
    async fn test_logout_resets_state() {
        let session = manager(WikiConfig {
            server: "http://127.0.0.1:9".to_string(),
            ..WikiConfig::default()
        });
        {
            let mut state = session.state.lock().await;
            state.jar.merge(["mwsession=abc"]);
            state.authenticated_until = Some(Instant::now() + DEFAULT_AUTH_CACHE);
        }
        assert!(session.is_authenticated().await);

        session.logout().await;
        assert!(!session.is_authenticated().await);
        assert_eq!(session.cookies().await, "");
    }
}
