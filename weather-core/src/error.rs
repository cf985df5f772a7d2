//! Error taxonomy for searches, suggestion fetches and backend calls.

use reqwest::StatusCode;
use thiserror::Error;

/// Everything a search, a suggestion fetch or a history call can fail with.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SearchError {
    /// Empty or invalid input, reported inline and never retried.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The provider answered, but the payload lacks required fields.
    #[error("Unexpected provider payload: {0}")]
    UpstreamShape(String),

    /// HTTP 400 from the provider.
    #[error("Location not found")]
    NotFound,

    /// HTTP 401/403 from the provider.
    #[error("Provider rejected the credentials (status {status})")]
    Auth { status: u16 },

    /// Any other non-2xx status from the provider.
    #[error("Provider unavailable (status {status})")]
    Unavailable { status: u16 },

    /// No response at all.
    #[error("Network error: {0}")]
    Network(String),

    /// The history backend refused or failed a request.
    #[error("Backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Geolocation(#[from] GeolocationError),
}

impl SearchError {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    pub fn upstream_shape<S: Into<String>>(message: S) -> Self {
        Self::UpstreamShape(message.into())
    }

    /// Map a non-success provider status onto the taxonomy.
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            400 => Self::NotFound,
            code @ (401 | 403) => Self::Auth { status: code },
            code => Self::Unavailable { status: code },
        }
    }

    /// Message meant for the person at the keyboard.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::UpstreamShape(_) => "Unable to fetch weather data.".to_string(),
            Self::NotFound => {
                "Location not found. Please check your input and try again.".to_string()
            }
            Self::Auth { .. } => "Invalid API key. Please check your configuration.".to_string(),
            Self::Unavailable { .. } => {
                "Unable to fetch weather data. Please try again later.".to_string()
            }
            Self::Network(_) => {
                "Network error. Please check your internet connection.".to_string()
            }
            Self::Backend(detail) => detail.clone(),
            Self::Geolocation(err) => err.to_string(),
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        // Reached only before a status is known: connect, timeout, body read.
        Self::Network(err.to_string())
    }
}

/// Why a device position could not be obtained.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum GeolocationError {
    #[error(
        "Location permission denied. Please enable location access in your browser settings."
    )]
    PermissionDenied,
    #[error("Location information is unavailable.")]
    PositionUnavailable,
    #[error("Location request timed out.")]
    Timeout,
    #[error("An unknown error occurred while getting your location.")]
    Unknown,
}
