// Window locator resolution
//
// Finding a window requires switching into each candidate to inspect it,
// so the search is inherently stateful. The contract: when a window
// matches, the session stays switched to it and its handle is returned;
// when nothing matches (or the scan fails), the originally focused
// window is restored, provided `switch_back` was requested. Capturing
// the original handle may itself fail when the current window was
// already closed; that failure propagates and nothing is restored.

use tracing::warn;

use crate::error::{Error, Result};
use crate::locator;
use crate::matching;
use crate::session::{ScriptArg, Session, WindowHandle};

const WINDOW_NAME_SCRIPT: &str = "return window.name";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Name,
    Title,
    Implicit,
}

impl Strategy {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Strategy::Name),
            "title" => Some(Strategy::Title),
            "implicit" => Some(Strategy::Implicit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Check {
    /// Compare against `window.name` of the candidate window.
    Name,
    /// Compare against the candidate window's page title.
    Title,
}

pub(crate) struct WindowFinder;

impl WindowFinder {
    pub fn new() -> Self {
        Self
    }

    /// Finds a window by locator and returns its handle; the session ends
    /// up switched to the found window.
    pub async fn find(
        &self,
        session: &dyn Session,
        window_locator: &str,
        switch_back: bool,
    ) -> Result<WindowHandle> {
        let raw = locator::parse(window_locator);
        let name = raw.strategy.unwrap_or("implicit");
        let strategy = Strategy::from_name(name).ok_or_else(|| Error::UnknownStrategy {
            kind: "window",
            name: name.to_string(),
        })?;

        let found = match strategy {
            Strategy::Name => {
                self.search(session, raw.criterion, switch_back, Check::Name)
                    .await?
            }
            Strategy::Title => {
                self.search(session, raw.criterion, switch_back, Check::Title)
                    .await?
            }
            Strategy::Implicit => {
                // name first, then title
                match self
                    .search(session, raw.criterion, switch_back, Check::Name)
                    .await?
                {
                    Some(handle) => Some(handle),
                    None => {
                        self.search(session, raw.criterion, switch_back, Check::Title)
                            .await?
                    }
                }
            }
        };

        found.ok_or_else(|| {
            Error::NoSuchWindow(format!("No window found for locator: {window_locator}"))
        })
    }

    async fn search(
        &self,
        session: &dyn Session,
        criterion: &str,
        switch_back: bool,
        check: Check,
    ) -> Result<Option<WindowHandle>> {
        // may fail with NoSuchWindow when the current window is closed;
        // that propagates without a restore attempt
        let original = if switch_back {
            Some(session.current_window_handle().await?)
        } else {
            None
        };

        let outcome = self.scan(session, criterion, check).await;

        match &outcome {
            // matched: the caller ends up on the found window
            Ok(Some(_)) => {}
            Ok(None) => {
                if let Some(handle) = &original {
                    session.switch_to_window(handle).await?;
                }
            }
            Err(_) => {
                if let Some(handle) = &original {
                    if let Err(restore_err) = session.switch_to_window(handle).await {
                        warn!(%handle, %restore_err, "failed to restore window after scan error");
                    }
                }
            }
        }

        outcome
    }

    async fn scan(
        &self,
        session: &dyn Session,
        criterion: &str,
        check: Check,
    ) -> Result<Option<WindowHandle>> {
        for handle in session.window_handles().await? {
            session.switch_to_window(&handle).await?;

            let matched = match check {
                Check::Name => {
                    let value = session
                        .execute_script(WINDOW_NAME_SCRIPT, Vec::<ScriptArg>::new())
                        .await?;
                    matching::is_match(value.as_str().unwrap_or(""), criterion, true, true)
                }
                Check::Title => {
                    matching::is_match(&session.title().await?, criterion, true, true)
                }
            };

            if matched {
                return Ok(Some(handle));
            }
        }

        Ok(None)
    }
}
