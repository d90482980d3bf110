//! MediaWiki REST and Action API payload types.
//!
//! Only the fields wikimcp reads are modelled; everything else in the
//! responses is ignored.

use serde::{Deserialize, Serialize};

// ============================================================================
// REST API (rest.php/v1)
// ============================================================================

/// Standard page object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageObject {
    pub id: u64,
    pub key: String,
    pub title: String,
    pub latest: LatestRevision,
    pub content_model: String,
    pub license: License,
    #[serde(default)]
    pub html_url: Option<String>,
    /// Present on `/v1/page/{title}` and edit responses.
    #[serde(default)]
    pub source: Option<String>,
    /// Present on `/v1/page/{title}/with_html`.
    #[serde(default)]
    pub html: Option<String>,
}

/// Latest revision reference on a page object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestRevision {
    pub id: u64,
    pub timestamp: String,
}

/// Content license.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct License {
    pub url: String,
    pub title: String,
}

/// User reference on a revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
}

/// Revision object from the history endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionObject {
    pub id: u64,
    pub timestamp: String,
    pub user: UserRef,
    #[serde(default)]
    pub comment: Option<String>,
    pub size: u64,
    pub delta: i64,
    #[serde(default)]
    pub minor: bool,
}

/// Response of `/v1/page/{title}/history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageHistoryResponse {
    pub revisions: Vec<RevisionObject>,
    #[serde(default)]
    pub latest: Option<String>,
    #[serde(default)]
    pub older: Option<String>,
    #[serde(default)]
    pub newer: Option<String>,
}

/// Thumbnail reference in search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

/// A single search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultObject {
    pub id: u64,
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<Thumbnail>,
}

/// Response of `/v1/search/page`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchPageResponse {
    #[serde(default)]
    pub pages: Vec<SearchResultObject>,
}

/// One rendition of a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRendition {
    pub url: String,
    #[serde(default)]
    pub mediatype: Option<String>,
    #[serde(default)]
    pub width: Option<u64>,
    #[serde(default)]
    pub height: Option<u64>,
}

/// Latest upload of a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileLatest {
    pub timestamp: String,
    pub user: UserRef,
}

/// File object from `/v1/file/{title}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileObject {
    pub title: String,
    pub file_description_url: String,
    pub latest: FileLatest,
    pub preferred: FileRendition,
    pub original: FileRendition,
    #[serde(default)]
    pub thumbnail: Option<FileRendition>,
}

// ============================================================================
// Action API (api.php)
// ============================================================================

/// `action=query&meta=tokens` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokensResponse {
    #[serde(default)]
    pub query: Option<TokensQuery>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokensQuery {
    #[serde(default)]
    pub tokens: Tokens,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Tokens {
    #[serde(default)]
    pub logintoken: Option<String>,
    #[serde(default)]
    pub csrftoken: Option<String>,
}

impl TokensResponse {
    /// The login token, if present and non-empty.
    pub fn login_token(self) -> Option<String> {
        self.query?.tokens.logintoken.filter(|t| !t.is_empty())
    }

    /// The CSRF (edit) token, if present and non-empty.
    pub fn csrf_token(self) -> Option<String> {
        self.query?.tokens.csrftoken.filter(|t| !t.is_empty())
    }
}

/// `action=clientlogin` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientLoginResponse {
    #[serde(default)]
    pub clientlogin: Option<ClientLogin>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientLogin {
    pub status: String,
    #[serde(default)]
    pub messagecode: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `action=query&meta=siteinfo&siprop=general` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteInfoResponse {
    #[serde(default)]
    pub query: Option<SiteInfoQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteInfoQuery {
    pub general: SiteInfoGeneral,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteInfoGeneral {
    pub sitename: String,
    pub articlepath: String,
    pub scriptpath: String,
    pub server: String,
    pub servername: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_object_without_optional_fields() {
        let json = r#"{
            "id": 1,
            "key": "Main_Page",
            "title": "Main Page",
            "latest": {"id": 42, "timestamp": "2025-01-01T00:00:00Z"},
            "content_model": "wikitext",
            "license": {"url": "https://creativecommons.org/licenses/by-sa/4.0/", "title": "CC BY-SA 4.0"}
        }"#;
        let page: PageObject = serde_json::from_str(json).unwrap();
        assert_eq!(page.latest.id, 42);
        assert!(page.source.is_none());
        assert!(page.html_url.is_none());
    }

    #[test]
    fn test_missing_login_token() {
        let response: TokensResponse = serde_json::from_str(r#"{"batchcomplete": ""}"#).unwrap();
        assert_eq!(response.login_token(), None);

        let response: TokensResponse =
            serde_json::from_str(r#"{"query": {"tokens": {"logintoken": "ABC+\\"}}}"#).unwrap();
        assert_eq!(response.login_token().as_deref(), Some("ABC+\\"));
    }
}
