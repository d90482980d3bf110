//! Minimal cookie jar for the MediaWiki login flow.
//!
//! Only the `name=value` part of each `Set-Cookie` header is kept; `Path`,
//! `Expires` and other attributes are dropped and nothing expires on its own.
//! MediaWiki reissues the cookies it needs on every relevant response, so
//! replacing by name is enough.

/// Ordered set of `name=value` cookies, unique by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    entries: Vec<String>,
}

impl CookieJar {
    /// Create an empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `Set-Cookie` header values into the jar.
    ///
    /// A cookie whose name is already present replaces the old value in
    /// place, so the jar keeps the order of first insertion.
    pub fn merge<I, S>(&mut self, set_cookie_headers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for header in set_cookie_headers {
            let Some((name, pair)) = parse_set_cookie(header.as_ref()) else {
                continue;
            };

            match self.entries.iter_mut().find(|entry| cookie_name(entry) == name) {
                Some(existing) => *existing = pair,
                None => self.entries.push(pair),
            }
        }
    }

    /// Value for a `Cookie` request header.
    pub fn serialize(&self) -> String {
        self.entries.join("; ")
    }

    /// Look up a cookie value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| cookie_name(entry) == name)
            .map(|entry| entry.split_once('=').map_or("", |(_, value)| value))
    }

    /// Remove every cookie.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cookies held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the jar holds no cookies.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split a `Set-Cookie` value into its name and `name=value` pair.
fn parse_set_cookie(header: &str) -> Option<(String, String)> {
    let pair = header.split(';').next()?.trim();
    let name = cookie_name(pair);
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), pair.to_string()))
}

fn cookie_name(pair: &str) -> &str {
    pair.split_once('=').map_or(pair, |(name, _)| name).trim()
}
