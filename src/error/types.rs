use thiserror::Error;

use crate::geometry::Rect;
use crate::lifecycle::LifecycleState;
use crate::logging::LoggingError;

/// Unified result type for the pane layout crate.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Errors surfaced by a layout pass and its collaborators.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layout tree is empty")]
    EmptyLayout,
    /// The view has not been created on the terminal surface yet. Expected
    /// during startup and swallowed by the binder.
    #[error("unknown view `{0}`")]
    UnknownView(String),
    #[error("unknown context `{0}`")]
    UnknownContext(String),
    #[error("context for view `{0}` is already registered")]
    DuplicateContext(String),
    #[error("invalid bounds for view `{view}`: {bounds:?}")]
    InvalidBounds { view: String, bounds: Rect },
    #[error("lifecycle cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        from: LifecycleState,
        to: LifecycleState,
    },
    #[error("terminal backend error: {0}")]
    Backend(String),
    #[error("deferred action failed: {0}")]
    Deferred(String),
    #[error("app state error: {0}")]
    State(String),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Logging(#[from] LoggingError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LayoutError {
    pub fn is_unknown_view(&self) -> bool {
        matches!(self, Self::UnknownView(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_view_is_distinguishable() {
        assert!(LayoutError::UnknownView("files".into()).is_unknown_view());
        assert!(!LayoutError::Backend("boom".into()).is_unknown_view());
    }
}
