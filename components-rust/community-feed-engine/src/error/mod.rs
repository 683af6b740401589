use thiserror::Error;

pub type Result<T> = std::result::Result<T, FeedError>;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum FeedError {
    /// The operation needs a session and there is none. Never reaches the network.
    #[error("Authentication required")]
    AuthRequired,

    /// The server rejected an action the client believed was permitted.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
        session_expired: bool,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    /// Network or timeout failure, retried only by a later user-initiated refresh.
    #[error("Transient failure: {0}")]
    Transient(String),

    /// Client-side precondition failure. Never reaches the network.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The server refused the request as malformed (400/422).
    #[error("Rejected by server: {0}")]
    Rejected(String),
}

impl FeedError {
    pub fn unauthorized<T: ToString>(message: T) -> Self {
        Self::Unauthorized {
            message: message.to_string(),
            session_expired: false,
        }
    }

    pub fn session_expired<T: ToString>(message: T) -> Self {
        Self::Unauthorized {
            message: message.to_string(),
            session_expired: true,
        }
    }

    pub fn not_found<T: ToString>(what: T) -> Self {
        Self::NotFound(what.to_string())
    }

    pub fn transient<T: ToString>(msg: T) -> Self {
        Self::Transient(msg.to_string())
    }

    pub fn validation<T: ToString>(msg: T) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Maps a transport status code and server message onto the taxonomy.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => Self::session_expired(message),
            403 => Self::unauthorized(message),
            404 => Self::NotFound(message),
            400 | 422 => Self::Rejected(message),
            _ => Self::Transient(format!("HTTP {status}: {message}")),
        }
    }

    /// True when the failure was decided without any network call.
    pub fn is_client_side(&self) -> bool {
        matches!(self, FeedError::AuthRequired | FeedError::Validation(_))
    }

    pub fn invalidates_session(&self) -> bool {
        matches!(
            self,
            FeedError::Unauthorized {
                session_expired: true,
                ..
            }
        )
    }

    /// Text shown to the user for this failure.
    pub fn user_notice(&self) -> String {
        match self {
            FeedError::AuthRequired => "Please log in to continue.".to_string(),
            FeedError::Unauthorized {
                session_expired: true,
                ..
            } => "Your session has expired. Please log in again.".to_string(),
            FeedError::Unauthorized { .. } => "You are not allowed to do that.".to_string(),
            FeedError::NotFound(_) => "This content is no longer available.".to_string(),
            FeedError::Transient(_) => "Something went wrong. Pull to refresh.".to_string(),
            FeedError::Validation(msg) | FeedError::Rejected(msg) => msg.clone(),
        }
    }
}
