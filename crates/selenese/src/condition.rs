// Condition polling
//
// A Condition is a named predicate re-evaluated on each poll tick. Each
// evaluation reports whether it is satisfied plus a human-readable
// reason; the last reason ends up in the timeout error so a failed wait
// says what it last saw, not just that it expired.

use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::time::Instant;

use crate::error::{Error, Result};

/// Outcome of one condition evaluation.
pub(crate) struct Eval {
    pub satisfied: bool,
    pub reason: String,
}

impl Eval {
    pub fn new(satisfied: bool, reason: impl Into<String>) -> Self {
        Self {
            satisfied,
            reason: reason.into(),
        }
    }
}

type EvalFn = Box<dyn FnMut() -> BoxFuture<'static, Result<Eval>> + Send>;

/// A named, repeatedly evaluated predicate.
pub(crate) struct Condition {
    name: &'static str,
    eval: EvalFn,
}

impl Condition {
    pub fn new<F>(name: &'static str, eval: F) -> Self
    where
        F: FnMut() -> BoxFuture<'static, Result<Eval>> + Send + 'static,
    {
        Self {
            name,
            eval: Box::new(eval),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) async fn check(&mut self) -> Result<Eval> {
        (self.eval)().await
    }
}

/// Polls `condition` until it is satisfied or `timeout` elapses.
///
/// Transient evaluation failures (an element disappearing between polls,
/// a window closing mid-scan) are recorded as the reason and polling
/// continues; unknown-strategy and unsupported-operation failures cannot
/// resolve themselves and abort the wait immediately.
pub(crate) async fn await_condition(
    mut condition: Condition,
    timeout: Duration,
    interval: Duration,
) -> Result<()> {
    let start = Instant::now();
    let mut last_reason = String::from("condition has not been evaluated");

    loop {
        match condition.check().await {
            Ok(eval) => {
                if eval.satisfied {
                    return Ok(());
                }
                last_reason = eval.reason;
            }
            Err(err) if is_fatal(&err) => return Err(err),
            Err(err) => last_reason = err.to_string(),
        }

        if start.elapsed() >= timeout {
            return Err(Error::Timeout(format!(
                "{} ({last_reason})",
                condition.name()
            )));
        }

        tokio::time::sleep(interval).await;
    }
}

/// Evaluates `condition` exactly once; an unsatisfied outcome fails with
/// the condition's reason. Used by the single-shot assertion commands.
pub(crate) async fn assure(mut condition: Condition) -> Result<()> {
    let eval = condition.check().await?;
    if eval.satisfied {
        Ok(())
    } else {
        Err(Error::AssertionFailed(eval.reason))
    }
}

fn is_fatal(err: &Error) -> bool {
    matches!(
        err.root(),
        Error::UnknownStrategy { .. } | Error::UnsupportedOperation(_)
    )
}
