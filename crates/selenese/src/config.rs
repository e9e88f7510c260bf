// Engine configuration
//
// All knobs are passed explicitly at adapter construction. There is no
// global configuration source; callers that load options from files or
// the environment build an EngineConfig themselves.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::Result;

/// Hook invoked after an act-and-wait step on sessions that block
/// natively on navigation. Gives the embedding test framework a chance to
/// wait for its own asynchronous activity (background requests, timers)
/// to settle before the next command runs.
#[async_trait]
pub trait CompletionHook: Send + Sync {
    async fn await_quiescence(&self) -> Result<()>;
}

/// Configuration for a [`crate::CommandAdapter`] /
/// [`crate::CommandInterceptor`] pair.
#[derive(Clone)]
pub struct EngineConfig {
    /// Maximum attempts per top-level command invocation. A command that
    /// fails with a stale-element reference is re-invoked from scratch
    /// until this bound is reached; the final failure is re-raised
    /// unchanged.
    pub command_retry_count: u32,

    /// When set, a page-load timeout raised during a command is swallowed
    /// and the invocation returns no value. Only commands without a
    /// meaningful return value should rely on this.
    pub ignore_page_load_timeouts: bool,

    /// Overrides page-load-strategy detection. `None` derives the flag
    /// from the session capabilities (`none`/`eager` mean the engine must
    /// wait for page loads itself).
    pub driver_waits_for_page_load: Option<bool>,

    /// Whether clicks verify that no other element would receive the
    /// click event (an extra script round-trip per click).
    pub check_element_clickable: bool,

    /// Whether `setTimeout` also propagates to the session's own
    /// navigation and script timeouts.
    pub set_timeouts_at_session: bool,

    /// Initial command timeout, applied to condition waits and (if
    /// enabled) the session timeouts.
    pub default_timeout: Duration,

    /// Sleep between condition poll ticks.
    pub poll_interval: Duration,

    /// Base URL that relative `open` targets are resolved against.
    pub base_url: Option<Url>,

    /// See [`CompletionHook`].
    pub completion_hook: Option<Arc<dyn CompletionHook>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command_retry_count: 3,
            ignore_page_load_timeouts: false,
            driver_waits_for_page_load: None,
            check_element_clickable: false,
            set_timeouts_at_session: true,
            default_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(50),
            base_url: None,
            completion_hook: None,
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("command_retry_count", &self.command_retry_count)
            .field("ignore_page_load_timeouts", &self.ignore_page_load_timeouts)
            .field("driver_waits_for_page_load", &self.driver_waits_for_page_load)
            .field("check_element_clickable", &self.check_element_clickable)
            .field("set_timeouts_at_session", &self.set_timeouts_at_session)
            .field("default_timeout", &self.default_timeout)
            .field("poll_interval", &self.poll_interval)
            .field("base_url", &self.base_url)
            .field("completion_hook", &self.completion_hook.is_some())
            .finish()
    }
}
