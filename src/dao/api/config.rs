/// Runtime configuration describing how to reach the competition backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Root URL every endpoint path is joined to.
    pub base_url: String,
    /// Bearer token, omitted from requests when `None`.
    pub access_token: Option<String>,
}

impl ApiConfig {
    /// Construct a configuration from an explicit base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            access_token: None,
        }
    }

    /// Attach the bearer token sent with every request.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}
