use axum::http::{HeaderMap, HeaderValue, header};
use std::collections::HashMap;
use vote_guard::LocalStorage;

/// Ten years; the guard is meant to outlive the match
const COOKIE_MAX_AGE_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Vote guard storage backed by the visitor's cookies.
///
/// Reads come from the request's `Cookie` headers; writes are collected and
/// turned into `Set-Cookie` headers for the response.
#[derive(Debug, Clone, Default)]
pub struct CookieStorage {
    items: HashMap<String, String>,
    pending: Vec<(String, String)>,
}

impl CookieStorage {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let items = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                Some((name.trim().to_string(), value.trim().to_string()))
            })
            .collect();

        Self {
            items,
            pending: Vec::new(),
        }
    }

    /// `Set-Cookie` values for everything written since the request came in
    pub fn set_cookie_headers(&self) -> Vec<HeaderValue> {
        self.pending
            .iter()
            .filter_map(|(name, value)| {
                let cookie = format!("{name}={value}; Path=/; Max-Age={COOKIE_MAX_AGE_SECS}; SameSite=Lax");
                HeaderValue::from_str(&cookie).ok()
            })
            .collect()
    }
}

impl LocalStorage for CookieStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) {
        self.items.insert(key.to_string(), value.to_string());
        self.pending.retain(|(name, _)| name != key);
        self.pending.push((key.to_string(), value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vote_guard::{HAS_VOTED_KEY, VOTED_FOR_KEY, VoteGuard};

    #[test]
    fn reads_every_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark; hasVoted=true"));
        headers.append(header::COOKIE, HeaderValue::from_static("votedFor=1"));

        let guard = VoteGuard::new(CookieStorage::from_headers(&headers));
        assert!(guard.has_voted());
        assert_eq!(guard.voted_for(), Some(domain::VoteOption::Second));
    }

    #[test]
    fn writes_become_set_cookie_headers() {
        let mut storage = CookieStorage::from_headers(&HeaderMap::new());
        assert!(storage.set_cookie_headers().is_empty());

        storage.set_item(HAS_VOTED_KEY, "true");
        storage.set_item(VOTED_FOR_KEY, "0");
        storage.set_item(VOTED_FOR_KEY, "1");

        let headers: Vec<String> = storage
            .set_cookie_headers()
            .iter()
            .map(|value| value.to_str().unwrap().to_string())
            .collect();
        assert_eq!(headers.len(), 2);
        assert!(headers[0].starts_with("hasVoted=true; Path=/; Max-Age="));
        assert!(headers[1].starts_with("votedFor=1;"));
        assert_eq!(storage.get_item(VOTED_FOR_KEY).as_deref(), Some("1"));
    }
}
