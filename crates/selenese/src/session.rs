// Session capability layer
//
// The engine does not talk to a browser directly. It consumes a session
// through the object-safe traits below; any concrete client (a WebDriver
// remote, a CDP connection, an in-process emulation) can implement them.
// The engine never assumes the session is thread-safe: one adapter owns
// one session and drives it strictly sequentially.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Shared handle to a resolved element.
pub type ElementRef = Arc<dyn Element>;

/// A native element query understood by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum By {
    /// CSS selector query.
    Css(String),
    /// XPath expression query.
    XPath(String),
    /// All elements with the given tag name.
    TagName(String),
}

impl By {
    pub fn css(selector: impl Into<String>) -> Self {
        By::Css(selector.into())
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        By::XPath(expression.into())
    }

    pub fn tag_name(name: impl Into<String>) -> Self {
        By::TagName(name.into())
    }
}

impl fmt::Display for By {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            By::Css(s) => write!(f, "css selector '{s}'"),
            By::XPath(s) => write!(f, "xpath '{s}'"),
            By::TagName(s) => write!(f, "tag name '{s}'"),
        }
    }
}

/// Opaque identifier of an open window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowHandle(pub String);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Target of a frame switch.
pub enum FrameTarget {
    /// Switch to the frame at the given position within the current
    /// document.
    Index(usize),
    /// Switch to the frame with the given name or id.
    Name(String),
    /// Switch into a previously resolved frame element.
    Element(ElementRef),
}

impl fmt::Debug for FrameTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameTarget::Index(i) => write!(f, "FrameTarget::Index({i})"),
            FrameTarget::Name(n) => write!(f, "FrameTarget::Name({n:?})"),
            FrameTarget::Element(_) => f.write_str("FrameTarget::Element(..)"),
        }
    }
}

/// Argument passed into a script execution.
pub enum ScriptArg {
    /// A plain JSON value.
    Value(Value),
    /// A live element reference; sessions serialize it to their native
    /// element representation.
    Element(ElementRef),
}

impl From<Value> for ScriptArg {
    fn from(value: Value) -> Self {
        ScriptArg::Value(value)
    }
}

impl From<&str> for ScriptArg {
    fn from(value: &str) -> Self {
        ScriptArg::Value(Value::String(value.to_string()))
    }
}

impl From<ElementRef> for ScriptArg {
    fn from(element: ElementRef) -> Self {
        ScriptArg::Element(element)
    }
}

/// Result of a script execution.
pub enum ScriptValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// The script evaluated to a DOM element reference.
    Element(ElementRef),
    /// Any other structured result.
    Json(Value),
}

impl ScriptValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScriptValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_element(self) -> Option<ElementRef> {
        match self {
            ScriptValue::Element(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Debug for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Null => f.write_str("null"),
            ScriptValue::Bool(b) => write!(f, "{b}"),
            ScriptValue::Number(n) => write!(f, "{n}"),
            ScriptValue::String(s) => write!(f, "{s:?}"),
            ScriptValue::Element(_) => f.write_str("<element>"),
            ScriptValue::Json(v) => write!(f, "{v}"),
        }
    }
}

/// Session capabilities, as reported by the remote end.
///
/// A free-form map; the engine only interprets `pageLoadStrategy`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Capabilities(pub serde_json::Map<String, Value>);

impl Capabilities {
    /// The session's page-load strategy (`normal`, `eager`, `none`), if
    /// reported.
    pub fn page_load_strategy(&self) -> Option<&str> {
        self.0.get("pageLoadStrategy").and_then(Value::as_str)
    }
}

/// A cookie to be stored by the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    /// Time to live, relative to now. `None` makes a session cookie.
    pub max_age: Option<Duration>,
}

/// A live, remote-controlled browser instance.
#[async_trait]
pub trait Session: Send + Sync {
    /// Runs a native element query against the current document.
    async fn find_elements(&self, by: &By) -> Result<Vec<ElementRef>>;

    /// Executes a script snippet in the current window.
    ///
    /// Fails with [`crate::Error::UnsupportedOperation`] when the session
    /// is not script-capable.
    async fn execute_script(&self, script: &str, args: Vec<ScriptArg>) -> Result<ScriptValue>;

    /// Handle of the focused window. Fails with
    /// [`crate::Error::NoSuchWindow`] when that window was closed.
    async fn current_window_handle(&self) -> Result<WindowHandle>;

    /// Handles of all open windows.
    async fn window_handles(&self) -> Result<Vec<WindowHandle>>;

    async fn switch_to_window(&self, handle: &WindowHandle) -> Result<()>;

    async fn switch_to_frame(&self, target: FrameTarget) -> Result<()>;

    /// Switches back to the top-level document of the current window.
    async fn switch_to_default_content(&self) -> Result<()>;

    /// Navigates the current window to the given URL.
    ///
    /// A navigation timeout should surface as
    /// [`crate::Error::PageLoadTimeout`] so the invocation layer can
    /// selectively ignore it.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Title of the current page.
    async fn title(&self) -> Result<String>;

    /// Capabilities negotiated for this session.
    fn capabilities(&self) -> Capabilities;

    async fn set_page_load_timeout(&self, timeout: Duration) -> Result<()>;

    async fn set_script_timeout(&self, timeout: Duration) -> Result<()>;

    async fn add_cookie(&self, cookie: Cookie) -> Result<()>;

    async fn delete_cookie(&self, name: &str) -> Result<()>;

    async fn delete_all_cookies(&self) -> Result<()>;

    /// Closes the current window.
    async fn close(&self) -> Result<()>;
}

/// A resolved DOM element.
///
/// References may go stale when the page rebuilds; operations then fail
/// with [`crate::Error::StaleElement`] and the invocation layer re-resolves.
#[async_trait]
pub trait Element: std::fmt::Debug + Send + Sync {
    /// Returns `self` for downcasting. Sessions use this to map an
    /// [`ElementRef`] handed back to them (for example as a script
    /// argument) onto their native element representation.
    fn as_any(&self) -> &dyn std::any::Any;

    async fn tag_name(&self) -> Result<String>;

    /// Value of the given attribute, or `None` when the attribute is not
    /// defined on the element.
    async fn attribute(&self, name: &str) -> Result<Option<String>>;

    /// Rendered text of the element.
    async fn text(&self) -> Result<String>;

    async fn is_displayed(&self) -> Result<bool>;

    async fn is_enabled(&self) -> Result<bool>;

    /// Whether a checkbox/radio is checked or an option is selected.
    async fn is_selected(&self) -> Result<bool>;

    async fn click(&self) -> Result<()>;

    async fn send_keys(&self, text: &str) -> Result<()>;

    async fn clear(&self) -> Result<()>;

    /// Submits the form this element belongs to.
    async fn submit(&self) -> Result<()>;

    /// Runs a native element query scoped to this element's subtree.
    async fn find_elements(&self, by: &By) -> Result<Vec<ElementRef>>;
}
