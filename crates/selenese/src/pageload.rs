// Page-load synchronization
//
// Sessions configured with a non-blocking page-load strategy return from
// navigation before the page has loaded. This synchronizer emulates the
// blocking behavior: a sentinel script installs a load-event listener on
// the top-level window the first time it runs, and on every call reports
// whether a load event has been observed since. The sentinel is deleted
// afterwards regardless of outcome, so the next navigation starts fresh.

use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tracing::debug;

use crate::condition::{await_condition, Condition, Eval};
use crate::error::{Error, Result};
use crate::session::{ScriptArg, Session};

const LOAD_SENTINEL_SCRIPT: &str = "\
return (function (win) {\n\
  if (!win.__loadSentinel) {\n\
    win.__loadSentinel = { loaded: false };\n\
    win.addEventListener('load', function (event) {\n\
      if (event.target.defaultView === event.target.defaultView.top) {\n\
        win.__loadSentinel.loaded = true;\n\
      }\n\
    });\n\
  }\n\
  return win.__loadSentinel.loaded;\n\
})(window)";

const DROP_SENTINEL_SCRIPT: &str = "delete window.__loadSentinel";

pub(crate) struct PageLoadSynchronizer {
    session: Arc<dyn Session>,
    poll_interval: Duration,
}

impl PageLoadSynchronizer {
    pub fn new(session: Arc<dyn Session>, poll_interval: Duration) -> Self {
        Self {
            session,
            poll_interval,
        }
    }

    /// Waits until the top-level window has seen a load event, or the
    /// timeout elapses. Sessions that cannot execute script cannot be
    /// observed this way; the wait then degrades to a no-op.
    pub async fn wait_for_load(&self, timeout: Duration) -> Result<()> {
        let session = Arc::clone(&self.session);
        let condition = Condition::new("PAGE LOADED", move || {
            let session = Arc::clone(&session);
            async move {
                let value = session
                    .execute_script(LOAD_SENTINEL_SCRIPT, Vec::<ScriptArg>::new())
                    .await?;
                let loaded = value.as_bool().unwrap_or(false);
                Ok(Eval::new(
                    loaded,
                    if loaded { "page loaded" } else { "page did not load yet" },
                ))
            }
            .boxed()
        });

        let outcome = await_condition(condition, timeout, self.poll_interval).await;

        // best-effort cleanup; a failure here must not mask the outcome
        if let Err(err) = self
            .session
            .execute_script(DROP_SENTINEL_SCRIPT, Vec::<ScriptArg>::new())
            .await
        {
            debug!(%err, "failed to drop page-load sentinel");
        }

        match outcome {
            Ok(()) => Ok(()),
            Err(Error::Timeout(reason)) => Err(Error::PageLoadTimeout(reason)),
            Err(err) if matches!(err.root(), Error::UnsupportedOperation(_)) => {
                debug!("session cannot execute script; skipping page-load wait");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}
