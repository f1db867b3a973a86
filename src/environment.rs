//! Environment resolution: which backend a session talks to.
//!
//! The choice depends only on the host the client is served from. Local
//! development hosts go to the development backend, everything else goes to
//! production.

/// Backend used when running on a development host
pub const DEFAULT_DEV_API_URL: &str = "http://127.0.0.1:5000";

/// Backend used everywhere else
pub const DEFAULT_PROD_API_URL: &str = "https://varadar.pythonanywhere.com";

/// Hosts treated as local development
const LOCAL_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

/// The pair of backend endpoints a host can resolve to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    development: String,
    production: String,
}

impl Endpoints {
    /// Create endpoints, stripping trailing slashes so paths join cleanly.
    pub fn new(development: &str, production: &str) -> Self {
        Self {
            development: development.trim_end_matches('/').to_string(),
            production: production.trim_end_matches('/').to_string(),
        }
    }

    /// Resolve the base URL for a host.
    pub fn resolve(&self, host: &str) -> &str {
        if is_local_host(host) {
            &self.development
        } else {
            &self.production
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_DEV_API_URL, DEFAULT_PROD_API_URL)
    }
}

/// Check whether a host is a local development host.
pub fn is_local_host(host: &str) -> bool {
    let host = host.trim();
    LOCAL_HOSTS
        .iter()
        .any(|local| local.eq_ignore_ascii_case(host))
}

/// Resolve an audio URL returned by the backend.
///
/// Absolute URLs (anything starting with `http`) are used as-is, everything
/// else is appended to the base URL.
pub fn resolve_audio_url(api_base: &str, audio_url: &str) -> String {
    if audio_url.starts_with("http") {
        audio_url.to_string()
    } else {
        format!("{}{}", api_base, audio_url)
    }
}
