//! Discover a wiki's paths from its Action API siteinfo.

use reqwest::header::ACCEPT;
use tracing::debug;
use url::Url;

use wikimcp_core::{ApiError, WikiConfig};

use crate::http::HttpClient;
use crate::types::SiteInfoResponse;

/// Script paths tried, in order.
pub const COMMON_SCRIPT_PATHS: [&str; 2] = ["/w", ""];

/// What siteinfo tells us about a wiki.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiInfo {
    pub sitename: String,
    /// Article path without the `/$1` placeholder.
    pub articlepath: String,
    pub scriptpath: String,
    pub server: String,
    /// Host name; used as the registry key.
    pub servername: String,
}

impl WikiInfo {
    /// Configuration for an anonymous connection to this wiki.
    pub fn into_config(self) -> WikiConfig {
        WikiConfig {
            sitename: self.sitename,
            server: self.server,
            articlepath: self.articlepath,
            scriptpath: self.scriptpath,
            ..WikiConfig::default()
        }
    }
}

/// `scheme://host[:port]` of any URL on a wiki.
pub fn origin_of(wiki_url: &str) -> Result<String, ApiError> {
    let url = Url::parse(wiki_url)
        .map_err(|e| ApiError::decode(wiki_url, format!("invalid wiki URL: {}", e)))?;
    let host = url
        .host_str()
        .ok_or_else(|| ApiError::decode(wiki_url, "wiki URL has no host"))?;

    Ok(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

/// Probe the common script paths under `origin` and return the first
/// siteinfo that answers.
pub async fn discover(http: &HttpClient, origin: &str) -> Option<WikiInfo> {
    for script_path in COMMON_SCRIPT_PATHS {
        match fetch_site_info(http, origin, script_path).await {
            Ok(info) => return Some(info),
            Err(e) => debug!(origin, script_path, error = %e, "No siteinfo at candidate path"),
        }
    }
    None
}

async fn fetch_site_info(
    http: &HttpClient,
    origin: &str,
    script_path: &str,
) -> Result<WikiInfo, ApiError> {
    let url = format!("{}{}/api.php", origin, script_path);
    let request = http
        .client()
        .get(&url)
        .header(ACCEPT, "application/json")
        .query(&[
            ("action", "query"),
            ("meta", "siteinfo"),
            ("siprop", "general"),
            ("format", "json"),
            ("origin", "*"),
        ]);

    let response = http.send_json::<SiteInfoResponse>(request, &url).await?;
    let general = response
        .body
        .query
        .ok_or_else(|| ApiError::decode(&url, "response has no query.general"))?
        .general;

    Ok(WikiInfo {
        sitename: general.sitename,
        articlepath: general.articlepath.replace("/$1", ""),
        scriptpath: general.scriptpath,
        server: resolve_server(&general.server, origin),
        servername: general.servername,
    })
}

/// Resolve a protocol-relative `$wgServer` against the scheme we reached
/// the wiki with.
fn resolve_server(server: &str, origin: &str) -> String {
    match server.strip_prefix("//") {
        Some(rest) => {
            let scheme = origin.split("://").next().unwrap_or("https");
            format!("{}://{}", scheme, rest)
        }
        None => server.to_string(),
    }
}
