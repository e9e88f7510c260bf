// Invocation layer
//
// Every top-level command invocation goes through CommandInterceptor.
// It is the only place where failures are locally recovered or
// downgraded: a stale-element failure re-invokes the whole command from
// scratch (the stale reference is unusable, so the retry re-resolves)
// up to the configured attempt bound, and a page-load timeout is
// optionally swallowed. Everything else propagates unchanged, with the
// failing command prefixed into the error context.
//
// Besides the typed `invoke` combinator, the interceptor exposes the
// string-keyed `execute` surface that script runners drive: command
// name plus up to two positional string parameters, returning the
// command's declared value kind.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use crate::commands::CommandAdapter;
use crate::error::{Error, Result};

/// Value returned by a script command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandValue {
    Text(String),
    Flag(bool),
    List(Vec<String>),
}

impl fmt::Display for CommandValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandValue::Text(s) => f.write_str(s),
            CommandValue::Flag(b) => write!(f, "{b}"),
            CommandValue::List(items) => f.write_str(&items.join(",")),
        }
    }
}

/// Commands that take a value but no target; their first parameter is
/// logged in the value slot.
const VALUE_ONLY_COMMANDS: &[&str] = &[
    "assertNotTextPresent",
    "assertNotTitle",
    "assertTextPresent",
    "assertTitle",
    "echo",
    "open",
    "pause",
    "setTimeout",
    "waitForNotTextPresent",
    "waitForNotTitle",
    "waitForTextPresent",
    "waitForTitle",
];

/// Cross-cutting wrapper in front of [`CommandAdapter`].
///
/// The page-load-timeout swallow returns no value; only commands without
/// a meaningful return value should rely on it, since a swallowed
/// failure on a value-returning command yields a misleading absence.
pub struct CommandInterceptor {
    adapter: CommandAdapter,
    retry_count: u32,
    ignore_page_load_timeouts: bool,
}

impl CommandInterceptor {
    pub fn new(adapter: CommandAdapter) -> Self {
        let config = adapter.config();
        let retry_count = config.command_retry_count;
        let ignore_page_load_timeouts = config.ignore_page_load_timeouts;
        Self {
            adapter,
            retry_count,
            ignore_page_load_timeouts,
        }
    }

    /// The wrapped adapter, for callers that want to bypass the
    /// cross-cutting behavior.
    pub fn adapter(&self) -> &CommandAdapter {
        &self.adapter
    }

    /// Runs one command invocation with retry and swallow semantics.
    /// Returns `None` only when a page-load timeout was swallowed.
    pub async fn invoke<T, F, Fut>(&self, command: &str, f: F) -> Result<Option<T>>
    where
        F: Fn(CommandAdapter) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.retry_count.max(1);

        for attempt in 1..=attempts {
            match f(self.adapter.clone()).await {
                Ok(value) => return Ok(Some(value)),
                Err(err) if err.is_stale() && attempt < attempts => {
                    warn!(command, attempt, %err, "stale element reference, re-invoking command");
                }
                Err(err) if err.is_page_load_timeout() && self.ignore_page_load_timeouts => {
                    warn!(command, %err, "ignoring page-load timeout");
                    return Ok(None);
                }
                Err(err) => return Err(err.context(format!("Command failed: {command}"))),
            }
        }

        // attempts >= 1, so the loop always returns
        Err(Error::Session(format!(
            "Command '{command}' ended without outcome"
        )))
    }

    /// Executes a command by name with up to two positional string
    /// parameters. Unknown names fail with [`Error::UnknownCommand`].
    pub async fn execute(
        &self,
        name: &str,
        param1: Option<&str>,
        param2: Option<&str>,
    ) -> Result<Option<CommandValue>> {
        let (target, value) = if VALUE_ONLY_COMMANDS.contains(&name) {
            (None, param1)
        } else {
            (param1, param2)
        };
        info!(
            command = name,
            target = target.unwrap_or(""),
            value = value.unwrap_or(""),
            "executing command"
        );

        self.dispatch(name, param1, param2).await
    }

    async fn dispatch(
        &self,
        name: &str,
        param1: Option<&str>,
        param2: Option<&str>,
    ) -> Result<Option<CommandValue>> {
        let p1 = || required(name, param1);
        let p2 = || required(name, param2);

        match name {
            // actions on a single element
            "click" => self.void(name, |a| async move { a.click(p1()?).await }).await,
            "clickAndWait" => {
                self.void(name, |a| async move { a.click_and_wait(p1()?).await })
                    .await
            }
            "check" => self.void(name, |a| async move { a.check(p1()?).await }).await,
            "checkAndWait" => {
                self.void(name, |a| async move { a.check_and_wait(p1()?).await })
                    .await
            }
            "uncheck" => self.void(name, |a| async move { a.uncheck(p1()?).await }).await,
            "uncheckAndWait" => {
                self.void(name, |a| async move { a.uncheck_and_wait(p1()?).await })
                    .await
            }
            "doubleClick" => {
                self.void(name, |a| async move { a.double_click(p1()?).await })
                    .await
            }
            "doubleClickAndWait" => {
                self.void(name, |a| async move { a.double_click_and_wait(p1()?).await })
                    .await
            }
            "contextMenu" => {
                self.void(name, |a| async move { a.context_menu(p1()?).await })
                    .await
            }
            "contextMenuAt" => {
                self.void(name, |a| async move { a.context_menu_at(p1()?, p2()?).await })
                    .await
            }
            "mouseDown" => self.void(name, |a| async move { a.mouse_down(p1()?).await }).await,
            "mouseDownAt" => {
                self.void(name, |a| async move { a.mouse_down_at(p1()?, p2()?).await })
                    .await
            }
            "mouseUp" => self.void(name, |a| async move { a.mouse_up(p1()?).await }).await,
            "mouseUpAt" => {
                self.void(name, |a| async move { a.mouse_up_at(p1()?, p2()?).await })
                    .await
            }
            "mouseMove" => self.void(name, |a| async move { a.mouse_move(p1()?).await }).await,
            "mouseMoveAt" => {
                self.void(name, |a| async move { a.mouse_move_at(p1()?, p2()?).await })
                    .await
            }
            "mouseOver" => self.void(name, |a| async move { a.mouse_over(p1()?).await }).await,
            "mouseOut" => self.void(name, |a| async move { a.mouse_out(p1()?).await }).await,
            "submit" => self.void(name, |a| async move { a.submit(p1()?).await }).await,
            "submitAndWait" => {
                self.void(name, |a| async move { a.submit_and_wait(p1()?).await })
                    .await
            }
            "type" => {
                self.void(name, |a| async move { a.type_text(p1()?, param2.unwrap_or("")).await })
                    .await
            }
            "typeAndWait" => {
                self.void(name, |a| async move {
                    a.type_and_wait(p1()?, param2.unwrap_or("")).await
                })
                .await
            }
            "select" => self.void(name, |a| async move { a.select(p1()?, p2()?).await }).await,
            "selectAndWait" => {
                self.void(name, |a| async move { a.select_and_wait(p1()?, p2()?).await })
                    .await
            }
            "addSelection" => {
                self.void(name, |a| async move { a.add_selection(p1()?, p2()?).await })
                    .await
            }
            "removeSelection" => {
                self.void(name, |a| async move { a.remove_selection(p1()?, p2()?).await })
                    .await
            }

            // navigation and session management
            "open" => self.void(name, |a| async move { a.open(p1()?).await }).await,
            "close" => self.void(name, |a| async move { a.close().await }).await,
            "selectWindow" => {
                self.void(name, |a| async move { a.select_window(param1).await })
                    .await
            }
            "selectFrame" => {
                self.void(name, |a| async move { a.select_frame(p1()?).await })
                    .await
            }
            "setTimeout" => {
                let timeout = parse_millis(name, p1()?)?;
                self.void(name, |a| async move { a.set_timeout(timeout).await })
                    .await
            }
            "pause" => {
                let waiting_time = parse_millis(name, p1()?)?;
                self.adapter.pause(waiting_time).await;
                Ok(None)
            }
            "echo" => {
                self.adapter.echo(param1.unwrap_or(""));
                Ok(None)
            }
            "createCookie" => {
                self.void(name, |a| async move {
                    a.create_cookie(p1()?, param2.unwrap_or("")).await
                })
                .await
            }
            "deleteCookie" => {
                self.void(name, |a| async move { a.delete_cookie(p1()?).await })
                    .await
            }
            "deleteAllVisibleCookies" => {
                self.void(name, |a| async move { a.delete_all_visible_cookies().await })
                    .await
            }

            // queries
            "getAttribute" => {
                self.text(name, |a| async move { a.get_attribute(p1()?).await })
                    .await
            }
            "getElementCount" => {
                self.text(name, |a| async move {
                    Ok(a.get_element_count(p1()?).await?.to_string())
                })
                .await
            }
            "getPageText" => self.text(name, |a| async move { a.get_page_text().await }).await,
            "getText" => self.text(name, |a| async move { a.get_text(p1()?).await }).await,
            "getTitle" => self.text(name, |a| async move { a.get_title().await }).await,
            "getValue" => self.text(name, |a| async move { a.get_value(p1()?).await }).await,
            "getXpathCount" => {
                self.text(name, |a| async move {
                    Ok(a.get_xpath_count(p1()?).await?.to_string())
                })
                .await
            }
            "getEval" | "evaluate" => {
                self.text(name, |a| async move {
                    a.evaluate(p1()?).await?.ok_or_else(|| {
                        Error::UnsupportedOperation(
                            "session cannot evaluate expressions".to_string(),
                        )
                    })
                })
                .await
            }
            "isChecked" => {
                self.flag(name, |a| async move { a.is_checked(p1()?).await })
                    .await
            }
            "isElementPresent" => {
                self.flag(name, |a| async move { a.is_element_present(p1()?).await })
                    .await
            }
            "isEnabled" => self.flag(name, |a| async move { a.is_enabled(p1()?).await }).await,
            "isVisible" => self.flag(name, |a| async move { a.is_visible(p1()?).await }).await,
            "isTextPresent" => {
                self.flag(name, |a| async move { a.is_text_present(p1()?).await })
                    .await
            }
            "getSelectedIds" => {
                self.list(name, |a| async move { a.get_selected_ids(p1()?).await })
                    .await
            }
            "getSelectedIndexes" => {
                self.list(name, |a| async move {
                    Ok(a.get_selected_indices(p1()?)
                        .await?
                        .into_iter()
                        .map(|idx| idx.to_string())
                        .collect())
                })
                .await
            }
            "getSelectedLabels" => {
                self.list(name, |a| async move { a.get_selected_labels(p1()?).await })
                    .await
            }
            "getSelectedValues" => {
                self.list(name, |a| async move { a.get_selected_values(p1()?).await })
                    .await
            }

            // waits
            "waitForAttribute" => {
                self.void(name, |a| async move { a.wait_for_attribute(p1()?, p2()?).await })
                    .await
            }
            "waitForNotAttribute" => {
                self.void(name, |a| async move {
                    a.wait_for_not_attribute(p1()?, p2()?).await
                })
                .await
            }
            "waitForChecked" => {
                self.void(name, |a| async move { a.wait_for_checked(p1()?).await })
                    .await
            }
            "waitForNotChecked" => {
                self.void(name, |a| async move { a.wait_for_not_checked(p1()?).await })
                    .await
            }
            "waitForClass" => {
                self.void(name, |a| async move { a.wait_for_class(p1()?, p2()?).await })
                    .await
            }
            "waitForNotClass" => {
                self.void(name, |a| async move { a.wait_for_not_class(p1()?, p2()?).await })
                    .await
            }
            "waitForElementCount" => {
                let count = parse_count(name, p2()?)?;
                self.void(name, |a| async move { a.wait_for_element_count(p1()?, count).await })
                    .await
            }
            "waitForNotElementCount" => {
                let count = parse_count(name, p2()?)?;
                self.void(name, |a| async move {
                    a.wait_for_not_element_count(p1()?, count).await
                })
                .await
            }
            "waitForElementPresent" => {
                self.void(name, |a| async move { a.wait_for_element_present(p1()?).await })
                    .await
            }
            "waitForNotElementPresent" => {
                self.void(name, |a| async move {
                    a.wait_for_not_element_present(p1()?).await
                })
                .await
            }
            "waitForEval" => {
                self.void(name, |a| async move { a.wait_for_eval(p1()?, p2()?).await })
                    .await
            }
            "waitForNotEval" => {
                self.void(name, |a| async move { a.wait_for_not_eval(p1()?, p2()?).await })
                    .await
            }
            "waitForText" => {
                self.void(name, |a| async move { a.wait_for_text(p1()?, p2()?).await })
                    .await
            }
            "waitForNotText" => {
                self.void(name, |a| async move { a.wait_for_not_text(p1()?, p2()?).await })
                    .await
            }
            "waitForTextPresent" => {
                self.void(name, |a| async move { a.wait_for_text_present(p1()?).await })
                    .await
            }
            "waitForNotTextPresent" => {
                self.void(name, |a| async move { a.wait_for_not_text_present(p1()?).await })
                    .await
            }
            "waitForTitle" => {
                self.void(name, |a| async move { a.wait_for_title(p1()?).await })
                    .await
            }
            "waitForNotTitle" => {
                self.void(name, |a| async move { a.wait_for_not_title(p1()?).await })
                    .await
            }
            "waitForValue" => {
                self.void(name, |a| async move { a.wait_for_value(p1()?, p2()?).await })
                    .await
            }
            "waitForNotValue" => {
                self.void(name, |a| async move { a.wait_for_not_value(p1()?, p2()?).await })
                    .await
            }
            "waitForVisible" => {
                self.void(name, |a| async move { a.wait_for_visible(p1()?).await })
                    .await
            }
            "waitForNotVisible" => {
                self.void(name, |a| async move { a.wait_for_not_visible(p1()?).await })
                    .await
            }
            "waitForStyle" => {
                self.void(name, |a| async move { a.wait_for_style(p1()?, p2()?).await })
                    .await
            }
            "waitForNotStyle" => {
                self.void(name, |a| async move { a.wait_for_not_style(p1()?, p2()?).await })
                    .await
            }
            "waitForXpathCount" => {
                let count = parse_count(name, p2()?)?;
                self.void(name, |a| async move { a.wait_for_xpath_count(p1()?, count).await })
                    .await
            }
            "waitForNotXpathCount" => {
                let count = parse_count(name, p2()?)?;
                self.void(name, |a| async move {
                    a.wait_for_not_xpath_count(p1()?, count).await
                })
                .await
            }
            "waitForSelectedId" => {
                self.void(name, |a| async move { a.wait_for_selected_id(p1()?, p2()?).await })
                    .await
            }
            "waitForNotSelectedId" => {
                self.void(name, |a| async move {
                    a.wait_for_not_selected_id(p1()?, p2()?).await
                })
                .await
            }
            "waitForSelectedIndex" => {
                self.void(name, |a| async move {
                    a.wait_for_selected_index(p1()?, p2()?).await
                })
                .await
            }
            "waitForNotSelectedIndex" => {
                self.void(name, |a| async move {
                    a.wait_for_not_selected_index(p1()?, p2()?).await
                })
                .await
            }
            "waitForSelectedLabel" => {
                self.void(name, |a| async move {
                    a.wait_for_selected_label(p1()?, p2()?).await
                })
                .await
            }
            "waitForNotSelectedLabel" => {
                self.void(name, |a| async move {
                    a.wait_for_not_selected_label(p1()?, p2()?).await
                })
                .await
            }
            "waitForSelectedValue" => {
                self.void(name, |a| async move {
                    a.wait_for_selected_value(p1()?, p2()?).await
                })
                .await
            }
            "waitForNotSelectedValue" => {
                self.void(name, |a| async move {
                    a.wait_for_not_selected_value(p1()?, p2()?).await
                })
                .await
            }
            "waitForPageToLoad" => {
                self.void(name, |a| async move { a.wait_for_page_to_load().await })
                    .await
            }
            "waitForPopUp" => {
                let timeout = param2
                    .filter(|s| !s.is_empty())
                    .map(|s| parse_millis(name, s))
                    .transpose()?;
                match param1.filter(|s| !s.is_empty()) {
                    Some(_) => {
                        self.void(name, |a| async move {
                            a.wait_for_pop_up(p1()?, timeout).await
                        })
                        .await
                    }
                    None => {
                        self.void(name, |a| async move { a.wait_for_any_pop_up(timeout).await })
                            .await
                    }
                }
            }

            // single-shot assertions
            "assertAttribute" => {
                self.void(name, |a| async move { a.assert_attribute(p1()?, p2()?).await })
                    .await
            }
            "assertNotAttribute" => {
                self.void(name, |a| async move {
                    a.assert_not_attribute(p1()?, p2()?).await
                })
                .await
            }
            "assertChecked" => {
                self.void(name, |a| async move { a.assert_checked(p1()?).await })
                    .await
            }
            "assertNotChecked" => {
                self.void(name, |a| async move { a.assert_not_checked(p1()?).await })
                    .await
            }
            "assertClass" => {
                self.void(name, |a| async move { a.assert_class(p1()?, p2()?).await })
                    .await
            }
            "assertNotClass" => {
                self.void(name, |a| async move { a.assert_not_class(p1()?, p2()?).await })
                    .await
            }
            "assertElementCount" => {
                let count = parse_count(name, p2()?)?;
                self.void(name, |a| async move { a.assert_element_count(p1()?, count).await })
                    .await
            }
            "assertNotElementCount" => {
                let count = parse_count(name, p2()?)?;
                self.void(name, |a| async move {
                    a.assert_not_element_count(p1()?, count).await
                })
                .await
            }
            "assertElementPresent" => {
                self.void(name, |a| async move { a.assert_element_present(p1()?).await })
                    .await
            }
            "assertNotElementPresent" => {
                self.void(name, |a| async move {
                    a.assert_not_element_present(p1()?).await
                })
                .await
            }
            "assertEval" => {
                self.void(name, |a| async move { a.assert_eval(p1()?, p2()?).await })
                    .await
            }
            "assertNotEval" => {
                self.void(name, |a| async move { a.assert_not_eval(p1()?, p2()?).await })
                    .await
            }
            "assertText" => {
                self.void(name, |a| async move { a.assert_text(p1()?, p2()?).await })
                    .await
            }
            "assertNotText" => {
                self.void(name, |a| async move { a.assert_not_text(p1()?, p2()?).await })
                    .await
            }
            "assertTextPresent" => {
                self.void(name, |a| async move { a.assert_text_present(p1()?).await })
                    .await
            }
            "assertNotTextPresent" => {
                self.void(name, |a| async move { a.assert_not_text_present(p1()?).await })
                    .await
            }
            "assertTitle" => {
                self.void(name, |a| async move { a.assert_title(p1()?).await })
                    .await
            }
            "assertNotTitle" => {
                self.void(name, |a| async move { a.assert_not_title(p1()?).await })
                    .await
            }
            "assertValue" => {
                self.void(name, |a| async move { a.assert_value(p1()?, p2()?).await })
                    .await
            }
            "assertNotValue" => {
                self.void(name, |a| async move { a.assert_not_value(p1()?, p2()?).await })
                    .await
            }
            "assertVisible" => {
                self.void(name, |a| async move { a.assert_visible(p1()?).await })
                    .await
            }
            "assertNotVisible" => {
                self.void(name, |a| async move { a.assert_not_visible(p1()?).await })
                    .await
            }
            "assertStyle" => {
                self.void(name, |a| async move { a.assert_style(p1()?, p2()?).await })
                    .await
            }
            "assertNotStyle" => {
                self.void(name, |a| async move { a.assert_not_style(p1()?, p2()?).await })
                    .await
            }
            "assertXpathCount" => {
                let count = parse_count(name, p2()?)?;
                self.void(name, |a| async move { a.assert_xpath_count(p1()?, count).await })
                    .await
            }
            "assertNotXpathCount" => {
                let count = parse_count(name, p2()?)?;
                self.void(name, |a| async move {
                    a.assert_not_xpath_count(p1()?, count).await
                })
                .await
            }
            "assertSelectedId" => {
                self.void(name, |a| async move { a.assert_selected_id(p1()?, p2()?).await })
                    .await
            }
            "assertNotSelectedId" => {
                self.void(name, |a| async move {
                    a.assert_not_selected_id(p1()?, p2()?).await
                })
                .await
            }
            "assertSelectedIndex" => {
                self.void(name, |a| async move {
                    a.assert_selected_index(p1()?, p2()?).await
                })
                .await
            }
            "assertNotSelectedIndex" => {
                self.void(name, |a| async move {
                    a.assert_not_selected_index(p1()?, p2()?).await
                })
                .await
            }
            "assertSelectedLabel" => {
                self.void(name, |a| async move {
                    a.assert_selected_label(p1()?, p2()?).await
                })
                .await
            }
            "assertNotSelectedLabel" => {
                self.void(name, |a| async move {
                    a.assert_not_selected_label(p1()?, p2()?).await
                })
                .await
            }
            "assertSelectedValue" => {
                self.void(name, |a| async move {
                    a.assert_selected_value(p1()?, p2()?).await
                })
                .await
            }
            "assertNotSelectedValue" => {
                self.void(name, |a| async move {
                    a.assert_not_selected_value(p1()?, p2()?).await
                })
                .await
            }

            _ => Err(Error::UnknownCommand(name.to_string())),
        }
    }

    async fn void<F, Fut>(&self, name: &str, f: F) -> Result<Option<CommandValue>>
    where
        F: Fn(CommandAdapter) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        self.invoke(name, f).await?;
        Ok(None)
    }

    async fn text<F, Fut>(&self, name: &str, f: F) -> Result<Option<CommandValue>>
    where
        F: Fn(CommandAdapter) -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        Ok(self.invoke(name, f).await?.map(CommandValue::Text))
    }

    async fn flag<F, Fut>(&self, name: &str, f: F) -> Result<Option<CommandValue>>
    where
        F: Fn(CommandAdapter) -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        Ok(self.invoke(name, f).await?.map(CommandValue::Flag))
    }

    async fn list<F, Fut>(&self, name: &str, f: F) -> Result<Option<CommandValue>>
    where
        F: Fn(CommandAdapter) -> Fut,
        Fut: Future<Output = Result<Vec<String>>>,
    {
        Ok(self.invoke(name, f).await?.map(CommandValue::List))
    }
}

fn required<'a>(command: &str, param: Option<&'a str>) -> Result<&'a str> {
    param
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::InvalidArgument(format!("Command '{command}' is missing an argument")))
}

fn parse_count(command: &str, value: &str) -> Result<usize> {
    value.parse().map_err(|_| {
        Error::InvalidArgument(format!("Command '{command}': invalid count '{value}'"))
    })
}

fn parse_millis(command: &str, value: &str) -> Result<Duration> {
    value.parse::<u64>().map(Duration::from_millis).map_err(|_| {
        Error::InvalidArgument(format!("Command '{command}': invalid duration '{value}'"))
    })
}
