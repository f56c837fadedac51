//! Configuration for the search-store client.

/// Connection settings for the search store.
///
/// Credentials are optional; when present they are sent as HTTP basic auth.
#[derive(Debug, Clone)]
pub struct SearchStoreConfig {
    /// The search store URL (e.g., "https://localhost:9200").
    pub endpoint: String,
    /// Optional basic-auth user name.
    pub username: Option<String>,
    /// Optional basic-auth password.
    pub password: Option<String>,
}

impl SearchStoreConfig {
    /// Create a config for an unauthenticated endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: None,
            password: None,
        }
    }

    /// Create a config with basic-auth credentials.
    pub fn with_basic_auth(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// Whether both credential halves are present.
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}
