// Error types for the selenese engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving locators or executing commands.
///
/// The taxonomy matters: the invocation layer classifies failures before
/// deciding whether to retry ([`Error::StaleElement`]), swallow
/// ([`Error::PageLoadTimeout`], when configured), or propagate unchanged.
#[derive(Debug, Error)]
pub enum Error {
    /// A locator used a `prefix=` that is not registered for its kind
    /// (element, option, or window). Never retried.
    #[error("Unknown {kind} locator strategy: {name}")]
    UnknownStrategy { kind: &'static str, name: String },

    /// No element (or select option) matched the locator.
    #[error("No element found for locator: {0}")]
    NoSuchElement(String),

    /// No window matched the locator, or the referenced window is closed.
    #[error("No such window: {0}")]
    NoSuchWindow(String),

    /// A previously resolved element no longer corresponds to a live DOM
    /// node. Transient: the invocation layer retries the whole command
    /// from scratch, since the stale reference is unusable.
    #[error("Stale element reference: {0}")]
    StaleElement(String),

    /// A bounded condition wait expired. Carries the condition name and
    /// its last recorded reason for diagnostics.
    #[error("Timed out waiting for condition: {0}")]
    Timeout(String),

    /// A page-load wait expired. Distinguished from [`Error::Timeout`] so
    /// it can be selectively ignored by configuration.
    #[error("Timed out waiting for page to load: {0}")]
    PageLoadTimeout(String),

    /// The session cannot perform the requested operation (typically:
    /// script execution on a non-scriptable session).
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A single-shot assertion command evaluated to false.
    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    /// A command argument or precondition check failed (wrong tag name,
    /// disabled element, malformed coordinates, ...).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The string-keyed dispatch surface received an unrecognized
    /// command name.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Opaque failure reported by the underlying session.
    #[error("Session error: {0}")]
    Session(String),

    /// Error with additional context
    #[error("{0}: {1}")]
    Context(String, #[source] Box<Error>),
}

impl Error {
    /// Adds context to the error
    pub fn context(self, msg: impl Into<String>) -> Self {
        Error::Context(msg.into(), Box::new(self))
    }

    /// Returns the innermost error, unwrapping any context layers.
    pub fn root(&self) -> &Error {
        let mut err = self;
        while let Error::Context(_, source) = err {
            err = source;
        }
        err
    }

    /// Whether this failure is a stale-element reference (retryable).
    pub fn is_stale(&self) -> bool {
        matches!(self.root(), Error::StaleElement(_))
    }

    /// Whether this failure is a page-load timeout (swallowable).
    pub fn is_page_load_timeout(&self) -> bool {
        matches!(self.root(), Error::PageLoadTimeout(_))
    }
}
