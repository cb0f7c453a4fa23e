//! Error types for link building and navigation.

/// Errors raised by the strict link-building entry points.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error("Invalid phone number format. Use international format (+1234567890)")]
    InvalidPhoneNumber,
    #[error("WhatsApp is not supported on this platform")]
    UnsupportedPlatform,
}

/// A navigation primitive (`window.open`, `location.href = ...`) failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("no window available")]
    NoWindow,
    #[error("opening {url} was refused: {reason}")]
    Refused { url: String, reason: String },
}

impl NavigationError {
    pub fn refused(url: impl Into<String>, reason: impl Into<String>) -> Self {
        NavigationError::Refused {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Anything that stops a launch; reported to the user, never returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LaunchError {
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
}
