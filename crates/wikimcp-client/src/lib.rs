//! # wikimcp-client
//!
//! Authenticated access to MediaWiki REST and Action APIs.
//!
//! This crate provides:
//! - A cookie jar and a session manager that logs in with `clientlogin`
//!   and caches the session for a fixed window
//! - A request dispatcher that picks OAuth, session or anonymous auth per call
//! - A registry of configured wikis with one session per wiki
//! - Siteinfo discovery for wikis that are not configured yet

pub mod cookie;
pub mod discovery;
pub mod dispatch;
pub mod http;
pub mod registry;
pub mod session;
pub mod types;

pub use cookie::CookieJar;
pub use discovery::{discover, origin_of, WikiInfo};
pub use dispatch::{AuthStrategy, RequestDispatcher};
pub use http::{HttpClient, JsonResponse};
pub use registry::WikiRegistry;
pub use session::{SessionManager, DEFAULT_AUTH_CACHE};
