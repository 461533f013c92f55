use thiserror::Error;

/// Failures surfaced by the repository client and the create guard.
///
/// `Fetch` displays only the operation message; the underlying status or
/// transport error is kept in `detail` for logging and never reaches the
/// store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MenuError {
    #[error("{message}")]
    Fetch { message: String, detail: String },
    #[error("{0}")]
    Validation(String),
}

impl MenuError {
    pub fn fetch(message: impl Into<String>, detail: impl Into<String>) -> Self {
        MenuError::Fetch {
            message: message.into(),
            detail: detail.into(),
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            MenuError::Fetch { detail, .. } => Some(detail),
            MenuError::Validation(_) => None,
        }
    }
}

pub type MenuResult<T> = std::result::Result<T, MenuError>;
