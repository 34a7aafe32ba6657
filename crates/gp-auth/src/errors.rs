use thiserror::Error;

/// Store authentication error types
#[derive(Error, Debug)]
pub enum GpAuthError {
    #[error("Device profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Device profile '{profile}' is missing required attribute '{key}'")]
    MissingProfileAttribute { profile: String, key: String },

    #[error("Invalid value for device attribute '{key}': {value}")]
    InvalidProfileAttribute { key: String, value: String },

    #[error("Failed to parse device profile store: {0}")]
    ProfileParse(String),

    #[error("Invalid locale {0:?}, expected a value like en_US")]
    InvalidLocale(String),

    #[error("No timezone given and the device profile declares none")]
    InvalidTimezone,

    #[error("Malformed server public key: {0}")]
    InvalidPublicKey(String),

    #[error("Credential encryption failed: {0}")]
    Encryption(String),

    #[error("Login failed: {0}")]
    Login(String),

    /// The server wants the user to pass an interactive check first
    #[error(
        "Security check is needed (server says: {error}), try to visit \
         https://accounts.google.com/b/0/DisplayUnlockCaptcha to unlock, or setup an \
         app-specific password. Callback URL: {}",
        .callback_url.as_deref().unwrap_or("none")
    )]
    SecurityCheck {
        error: String,
        callback_url: Option<String>,
    },

    #[error("Request rejected by server: {0}")]
    Request(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error {status}: {body_snippet}")]
    Http {
        status: reqwest::StatusCode,
        body_snippet: String,
    },

    #[error("Failed to decode server response: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("TLS configuration error: {0}")]
    Tls(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Credential store is locked by another process")]
    LockTimeout,
}

impl GpAuthError {
    /// The caller has to hand control to a human (browser unlock, app password)
    pub fn requires_user_action(&self) -> bool {
        matches!(self, Self::SecurityCheck { .. })
    }

    /// The server rejected the credentials or the handshake
    pub fn is_credential_error(&self) -> bool {
        matches!(self, Self::Login(_))
    }

    /// Retrying the same call later may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Decode(_) => true,
            Self::Http { status, .. } => status.is_server_error(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, GpAuthError>;
