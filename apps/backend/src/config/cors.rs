//! Allowed browser origins, parsed from `CLIENT_URL`.

use super::process_env;

pub const CLIENT_URL_VAR: &str = "CLIENT_URL";

/// Used when `CLIENT_URL` is unset or contains nothing usable.
pub const DEFAULT_ORIGIN: &str = "http://localhost:5173";

/// Origins permitted to make credentialed cross-origin requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedOrigins {
    origins: Vec<String>,
}

impl AllowedOrigins {
    pub fn from_env() -> Self {
        Self::parse(process_env(CLIENT_URL_VAR).as_deref())
    }

    /// Parse a comma-separated list. Entries are trimmed and a trailing `/`
    /// is dropped so they compare equal to browser `Origin` headers; empty,
    /// `null` and non-http(s) entries are ignored.
    pub fn parse(raw: Option<&str>) -> Self {
        let mut origins: Vec<String> = Vec::new();
        for entry in raw.unwrap_or_default().split(',') {
            let entry = entry.trim().trim_end_matches('/');
            if entry.is_empty() || entry == "null" {
                continue;
            }
            if !(entry.starts_with("http://") || entry.starts_with("https://")) {
                continue;
            }
            if !origins.iter().any(|o| o == entry) {
                origins.push(entry.to_string());
            }
        }

        if origins.is_empty() {
            origins.push(DEFAULT_ORIGIN.to_string());
        }
        Self { origins }
    }

    pub fn contains(&self, origin: &str) -> bool {
        self.origins.iter().any(|o| o == origin)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.origins.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }
}

impl Default for AllowedOrigins {
    fn default() -> Self {
        Self::parse(None)
    }
}
