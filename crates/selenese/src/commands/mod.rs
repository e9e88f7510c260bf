// Command adapter
//
// CommandAdapter implements the script command vocabulary on top of one
// session: actions resolve their target through the locator resolvers
// and verify structural preconditions before acting, queries read and
// normalize values, waitFor* commands poll conditions, and *AndWait
// variants add page-load synchronization. The adapter itself never
// retries; cross-cutting retry and failure downgrading live in the
// invocation layer.
//
// The adapter is a cheap clone over shared inner state, so condition
// predicates can capture it and re-resolve locators on every poll tick.

mod actions;
mod frames;
mod queries;
pub(crate) mod scripts;
mod waits;

use std::future::Future;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use parking_lot::Mutex;
use regex::Regex;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::locator::Finder;
use crate::pageload::PageLoadSynchronizer;
use crate::session::{Cookie, ScriptArg, Session, WindowHandle};

static COOKIE_PAIR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^=;\s]+)=([^;]*)$").expect("valid pattern"));
static COOKIE_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^=;\s]+$").expect("valid pattern"));
static MAX_AGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"max_age=(\d+)").expect("valid pattern"));
static COOKIE_PATH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"path=([^\s,]+)").expect("valid pattern"));

/// Fails with `InvalidArgument` when a command precondition does not
/// hold.
pub(crate) fn check_is_true(message: impl Into<String>, flag: bool) -> Result<()> {
    if flag {
        Ok(())
    } else {
        Err(Error::InvalidArgument(message.into()))
    }
}

/// Parses an `"x,y"` coordinate string.
pub(crate) fn parse_coordinates(coordinates: &str) -> Result<(i32, i32)> {
    let invalid = || Error::InvalidArgument(format!("Invalid coordinates: {coordinates}"));

    let (x, y) = coordinates.split_once(',').ok_or_else(invalid)?;
    Ok((
        x.trim().parse().map_err(|_| invalid())?,
        y.trim().parse().map_err(|_| invalid())?,
    ))
}

struct Inner {
    session: Arc<dyn Session>,
    finder: Finder,
    config: EngineConfig,
    original_window: WindowHandle,
    timeout: Mutex<Duration>,
    driver_waits_for_page_load: bool,
    synchronizer: PageLoadSynchronizer,
}

/// The facade implementing the script command vocabulary against one
/// session. One adapter drives one session strictly sequentially.
#[derive(Clone)]
pub struct CommandAdapter {
    inner: Arc<Inner>,
}

impl CommandAdapter {
    /// Creates an adapter for the given session.
    ///
    /// Captures the current window handle as the window that
    /// `selectWindow(null)` returns to, derives the page-load-wait mode
    /// from the session capabilities (unless overridden), and applies the
    /// configured default timeout.
    pub async fn new(session: Arc<dyn Session>, config: EngineConfig) -> Result<Self> {
        let original_window = session.current_window_handle().await?;

        let driver_waits_for_page_load = match config.driver_waits_for_page_load {
            Some(waits) => waits,
            None => match session.capabilities().page_load_strategy() {
                Some(strategy) => {
                    !strategy.eq_ignore_ascii_case("none") && !strategy.eq_ignore_ascii_case("eager")
                }
                // "normal" is the default strategy
                None => true,
            },
        };
        if !driver_waits_for_page_load {
            info!("session will not wait for page loads, the scripting layer will");
        }

        let synchronizer = PageLoadSynchronizer::new(Arc::clone(&session), config.poll_interval);
        let default_timeout = config.default_timeout;

        let adapter = Self {
            inner: Arc::new(Inner {
                finder: Finder::new(),
                original_window,
                timeout: Mutex::new(default_timeout),
                driver_waits_for_page_load,
                synchronizer,
                session,
                config,
            }),
        };

        adapter.set_timeout(default_timeout).await?;
        Ok(adapter)
    }

    /// The underlying session.
    pub fn session(&self) -> &Arc<dyn Session> {
        &self.inner.session
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Whether the session blocks natively on navigation.
    pub fn driver_waits_for_page_load(&self) -> bool {
        self.inner.driver_waits_for_page_load
    }

    /// The currently configured command timeout.
    pub fn timeout(&self) -> Duration {
        *self.inner.timeout.lock()
    }

    pub(crate) fn session_ref(&self) -> &dyn Session {
        self.inner.session.as_ref()
    }

    pub(crate) fn finder(&self) -> &Finder {
        &self.inner.finder
    }

    pub(crate) fn original_window(&self) -> &WindowHandle {
        &self.inner.original_window
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        self.inner.config.poll_interval
    }

    /// Updates the command timeout and, if enabled, propagates it to the
    /// session's own navigation and script timeouts.
    pub async fn set_timeout(&self, timeout: Duration) -> Result<()> {
        *self.inner.timeout.lock() = timeout;

        if self.inner.config.set_timeouts_at_session {
            self.session_ref().set_page_load_timeout(timeout).await?;
            self.session_ref().set_script_timeout(timeout).await?;
        }
        Ok(())
    }

    /// First element matching the locator, invisible elements included.
    pub async fn find_element(&self, locator: &str) -> Result<crate::session::ElementRef> {
        self.inner
            .finder
            .find_element(self.session_ref(), locator, false)
            .await
    }

    /// All elements matching the locator.
    pub async fn find_elements(&self, locator: &str) -> Result<Vec<crate::session::ElementRef>> {
        self.inner
            .finder
            .find_elements(self.session_ref(), locator, false)
            .await
    }

    /// First element matching the locator, restricted to visible
    /// elements.
    pub async fn find_visible_element(&self, locator: &str) -> Result<crate::session::ElementRef> {
        self.inner
            .finder
            .find_element(self.session_ref(), locator, true)
            .await
    }

    /// All visible elements matching the locator.
    pub async fn find_visible_elements(
        &self,
        locator: &str,
    ) -> Result<Vec<crate::session::ElementRef>> {
        self.inner
            .finder
            .find_elements(self.session_ref(), locator, true)
            .await
    }

    /// Runs an action that is expected to trigger navigation and waits
    /// for that navigation to complete. When the session blocks natively,
    /// the action's own return is the wait (plus the configured
    /// completion hook, if any); otherwise the page-load synchronizer
    /// takes over.
    pub(crate) async fn execute_and_wait<F, Fut>(&self, action: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        if self.inner.driver_waits_for_page_load {
            action().await?;
            if let Some(hook) = &self.inner.config.completion_hook {
                hook.await_quiescence().await?;
            }
            Ok(())
        } else {
            action().await?;
            self.wait_for_page_to_load().await
        }
    }

    pub(crate) async fn sync_page_load(&self) -> Result<()> {
        self.inner.synchronizer.wait_for_load(self.timeout()).await
    }

    /// Opens a URL, resolved against the configured base URL, and waits
    /// for the page load.
    pub async fn open(&self, url: &str) -> Result<()> {
        let target = self.resolve_url(url)?;
        let session = Arc::clone(&self.inner.session);
        self.execute_and_wait(move || async move { session.navigate(&target).await })
            .await
    }

    fn resolve_url(&self, url: &str) -> Result<String> {
        match &self.inner.config.base_url {
            Some(base) => base
                .join(url)
                .map(|resolved| resolved.to_string())
                .map_err(|err| Error::InvalidArgument(format!("Invalid URL '{url}': {err}"))),
            None => Ok(url.to_string()),
        }
    }

    /// Closes the current window.
    pub async fn close(&self) -> Result<()> {
        self.session_ref().close().await
    }

    /// Sleeps unconditionally for the given time.
    pub async fn pause(&self, waiting_time: Duration) {
        tokio::time::sleep(waiting_time).await;
    }

    /// Logs a message at info level.
    pub fn echo(&self, message: &str) {
        info!("echo: {message}");
    }

    /// Evaluates an expression in the current window and returns its
    /// stringified result.
    pub async fn evaluate(&self, expression: &str) -> Result<Option<String>> {
        let value = scripts::execute_script_if_possible(
            self.session_ref(),
            scripts::EVAL_SCRIPT,
            vec![ScriptArg::from(expression)],
        )
        .await?;
        Ok(value.and_then(|v| v.as_str().map(str::to_string)))
    }

    /// Whether the given expression evaluates to a truthy value. A blank
    /// expression is falsy without a session round-trip.
    pub async fn evaluates_to_true(&self, expression: &str) -> Result<bool> {
        if expression.trim().is_empty() {
            return Ok(false);
        }

        let result = self.evaluate(&format!("!!({expression})")).await?;
        let result = result.ok_or_else(|| {
            Error::InvalidArgument(format!("Failed to evaluate expression: {expression}"))
        })?;
        Ok(result == "true")
    }

    /// Stores a cookie for the current page. `cookie` is a `name=value`
    /// pair; `options` may carry `max_age=<seconds>` and `path=<path>`.
    pub async fn create_cookie(&self, cookie: &str, options: &str) -> Result<()> {
        let captures = COOKIE_PAIR_PATTERN
            .captures(cookie)
            .ok_or_else(|| Error::InvalidArgument(format!("Invalid cookie string: {cookie}")))?;
        let name = captures[1].to_string();
        let value = captures[2].to_string();

        let max_age = MAX_AGE_PATTERN
            .captures(options)
            .and_then(|c| c[1].parse::<u64>().ok())
            .map(Duration::from_secs);

        let path = match COOKIE_PATH_PATTERN.captures(options) {
            Some(captures) => {
                let raw = &captures[1];
                if raw.starts_with("http") {
                    match url::Url::parse(raw) {
                        Ok(parsed) => Some(parsed.path().to_string()),
                        Err(_) => Some(raw.to_string()),
                    }
                } else {
                    Some(raw.to_string())
                }
            }
            None => None,
        };

        self.session_ref()
            .add_cookie(Cookie {
                name,
                value,
                path,
                max_age,
            })
            .await
    }

    /// Deletes the cookie with the given name.
    pub async fn delete_cookie(&self, name: &str) -> Result<()> {
        check_is_true(
            format!("Invalid cookie name: {name}"),
            COOKIE_NAME_PATTERN.is_match(name),
        )?;
        self.session_ref().delete_cookie(name).await
    }

    /// Deletes all cookies visible to the current page.
    pub async fn delete_all_visible_cookies(&self) -> Result<()> {
        self.session_ref().delete_all_cookies().await
    }
}
