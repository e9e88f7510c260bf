//! selenese: a scripting-command execution engine for session-based
//! browser automation.
//!
//! The crate drives a remote browser session on behalf of declarative,
//! string-encoded test scripts: locator strings such as `css=...`,
//! `id=...`, or `name=foo&value=bar&index=0` are resolved to live DOM
//! elements, select options, and windows; named commands (`click`,
//! `type`, `select`, `waitForText`, ...) act on them; and a
//! synchronization layer papers over the asynchronous, failure-prone
//! nature of the session with stale-element retries, emulated page-load
//! waiting, and timeout-bounded condition polling.
//!
//! The browser itself is out of scope: the engine consumes any client
//! that implements the [`Session`] and [`Element`] capability traits.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use selenese::{CommandAdapter, CommandInterceptor, EngineConfig, Session};
//!
//! # async fn run(session: Arc<dyn Session>) -> selenese::Result<()> {
//! let adapter = CommandAdapter::new(session, EngineConfig::default()).await?;
//! let commands = CommandInterceptor::new(adapter);
//!
//! // typed surface
//! commands
//!     .invoke("open", |a| async move { a.open("/login").await })
//!     .await?;
//!
//! // string-keyed surface, as a script runner would drive it
//! commands.execute("type", Some("id=user"), Some("alice")).await?;
//! commands.execute("clickAndWait", Some("css=button[type=submit]"), None).await?;
//! commands.execute("waitForTitle", Some("Dashboard"), None).await?;
//! # Ok(())
//! # }
//! ```

mod commands;
mod condition;
mod config;
mod error;
mod interceptor;
mod pageload;
mod session;

pub mod locator;
pub mod matching;

// Re-export error types
pub use error::{Error, Result};

// Re-export the session capability surface
pub use session::{
    By, Capabilities, Cookie, Element, ElementRef, FrameTarget, ScriptArg, ScriptValue, Session,
    WindowHandle,
};

// Re-export configuration
pub use config::{CompletionHook, EngineConfig};

// Re-export the command layer
pub use commands::CommandAdapter;
pub use interceptor::{CommandInterceptor, CommandValue};
