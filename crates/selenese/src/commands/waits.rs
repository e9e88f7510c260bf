// Wait, assertion, and probe commands
//
// All three share the same condition builders: a waitFor* command polls
// the condition up to the configured timeout, an assert* command
// evaluates it exactly once, and the boolean probes (hasText, ...)
// report a single evaluation without failing. Conditions capture a
// clone of the adapter and re-resolve their locators on every tick, so
// a page rebuild between polls is handled naturally.

use std::collections::HashMap;
use std::time::Duration;

use futures_util::FutureExt;

use crate::commands::{check_is_true, CommandAdapter};
use crate::condition::{assure, await_condition, Condition, Eval};
use crate::error::{Error, Result};
use crate::locator;
use crate::matching;
use crate::session::{Element, Session};

fn verdict(matched: bool) -> &'static str {
    if matched {
        "matches"
    } else {
        "does not match"
    }
}

/// Parses a `prop: value; prop: value` style string into a property map.
fn parse_style_properties(style: &str) -> HashMap<String, String> {
    let mut properties = HashMap::new();
    for part in style.split(';') {
        if let Some((name, value)) = part.split_once(':') {
            let name = name.trim().to_lowercase();
            if !name.is_empty() {
                properties.insert(name, value.trim().to_string());
            }
        }
    }
    properties
}

impl CommandAdapter {
    async fn wait_for(&self, condition: Condition) -> Result<()> {
        await_condition(condition, self.timeout(), self.poll_interval()).await
    }

    async fn probe(&self, mut condition: Condition) -> Result<bool> {
        Ok(condition.check().await?.satisfied)
    }

    // === condition builders ===

    fn attribute_matches(
        &self,
        element_locator: &str,
        attribute_name: &str,
        pattern: &str,
        positive: bool,
    ) -> Condition {
        let adapter = self.clone();
        let element_locator = element_locator.to_string();
        let attribute_name = attribute_name.to_string();
        let pattern = pattern.to_string();
        Condition::new(
            if positive {
                "ATTRIBUTE MATCH"
            } else {
                "ATTRIBUTE NO-MATCH"
            },
            move || {
                let adapter = adapter.clone();
                let element_locator = element_locator.clone();
                let attribute_name = attribute_name.clone();
                let pattern = pattern.clone();
                async move {
                    let value = adapter
                        .attribute_value(&element_locator, &attribute_name)
                        .await?;
                    let matched = matching::is_match(&value, &pattern, true, false);
                    Ok(Eval::new(
                        matched == positive,
                        format!("Attribute value '{value}' {}", verdict(matched)),
                    ))
                }
                .boxed()
            },
        )
    }

    fn style_matches(&self, element_locator: &str, style: &str, positive: bool) -> Condition {
        let adapter = self.clone();
        let element_locator = element_locator.to_string();
        let style = style.to_string();
        let properties = parse_style_properties(&style);
        Condition::new(
            if positive { "STYLE MATCH" } else { "STYLE NO-MATCH" },
            move || {
                let adapter = adapter.clone();
                let element_locator = element_locator.clone();
                let style = style.clone();
                let properties = properties.clone();
                async move {
                    let mut offending = Vec::new();
                    let mut all_match = true;

                    for (name, expected) in &properties {
                        let actual = adapter
                            .get_effective_style(&element_locator, name)
                            .await?;
                        let matches = actual.as_deref() == Some(expected.as_str());
                        if matches {
                            if !positive {
                                offending.push(name.clone());
                            }
                        } else {
                            all_match = false;
                            if positive {
                                offending.push(format!(
                                    "'{name}' (expected '{expected}' but was '{}')",
                                    actual.unwrap_or_default()
                                ));
                            }
                        }
                    }

                    let mut reason =
                        format!("Actual style '{style}' {}", verdict(all_match));
                    if !offending.is_empty() {
                        reason.push_str(&format!(
                            " ({}matching properties: {})",
                            if positive { "non-" } else { "" },
                            offending.join(", ")
                        ));
                    }
                    Ok(Eval::new(offending.is_empty(), reason))
                }
                .boxed()
            },
        )
    }

    fn page_text_matches(&self, pattern: &str, positive: bool) -> Condition {
        let adapter = self.clone();
        let pattern = pattern.to_string();
        Condition::new(
            if positive {
                "PAGE TEXT MATCH"
            } else {
                "PAGE TEXT NO-MATCH"
            },
            move || {
                let adapter = adapter.clone();
                let pattern = pattern.clone();
                async move {
                    let text = adapter.get_page_text().await?;
                    let matched = matching::is_match(&text, &pattern, false, true);
                    Ok(Eval::new(
                        matched == positive,
                        format!("Page text {}", verdict(matched)),
                    ))
                }
                .boxed()
            },
        )
    }

    fn text_matches(&self, element_locator: &str, pattern: &str, positive: bool) -> Condition {
        let adapter = self.clone();
        let element_locator = element_locator.to_string();
        let pattern = pattern.to_string();
        Condition::new(
            if positive {
                "ELEMENT TEXT MATCH"
            } else {
                "ELEMENT TEXT NO-MATCH"
            },
            move || {
                let adapter = adapter.clone();
                let element_locator = element_locator.clone();
                let pattern = pattern.clone();
                async move {
                    let text = adapter.get_text(&element_locator).await?;
                    let matched = matching::is_match(&text, &pattern, true, true);
                    Ok(Eval::new(
                        matched == positive,
                        format!("Element text '{text}' {}", verdict(matched)),
                    ))
                }
                .boxed()
            },
        )
    }

    fn title_matches(&self, pattern: &str, positive: bool) -> Condition {
        let adapter = self.clone();
        let pattern = pattern.to_string();
        Condition::new(
            if positive { "TITLE MATCH" } else { "TITLE NO-MATCH" },
            move || {
                let adapter = adapter.clone();
                let pattern = pattern.clone();
                async move {
                    let title = adapter.get_title().await?;
                    let matched = matching::is_match(&title, &pattern, true, true);
                    Ok(Eval::new(
                        matched == positive,
                        format!("Page title '{title}' {}", verdict(matched)),
                    ))
                }
                .boxed()
            },
        )
    }

    fn value_matches(&self, element_locator: &str, pattern: &str, positive: bool) -> Condition {
        let adapter = self.clone();
        let element_locator = element_locator.to_string();
        let pattern = pattern.to_string();
        Condition::new(
            if positive {
                "ELEMENT VALUE MATCH"
            } else {
                "ELEMENT VALUE NO-MATCH"
            },
            move || {
                let adapter = adapter.clone();
                let element_locator = element_locator.clone();
                let pattern = pattern.clone();
                async move {
                    let value = adapter.get_value(&element_locator).await?;
                    let matched = matching::is_match(&value, &pattern, true, true);
                    Ok(Eval::new(
                        matched == positive,
                        format!("Element's value '{value}' {}", verdict(matched)),
                    ))
                }
                .boxed()
            },
        )
    }

    fn class_matches(&self, element_locator: &str, class_string: &str, positive: bool) -> Condition {
        let adapter = self.clone();
        let element_locator = element_locator.to_string();
        let wanted: Vec<String> = class_string
            .split_whitespace()
            .map(str::to_string)
            .collect();
        Condition::new(
            if positive { "CLASS MATCH" } else { "CLASS NO-MATCH" },
            move || {
                let adapter = adapter.clone();
                let element_locator = element_locator.clone();
                let wanted = wanted.clone();
                async move {
                    let element = adapter.find_element(&element_locator).await?;
                    let class_attribute = element.attribute("class").await?.unwrap_or_default();
                    let present: Vec<&str> = class_attribute.split_whitespace().collect();

                    let mut offending = Vec::new();
                    let mut all_match = true;
                    for class in &wanted {
                        if present.contains(&class.as_str()) {
                            if !positive {
                                offending.push(class.clone());
                            }
                        } else {
                            all_match = false;
                            if positive {
                                offending.push(class.clone());
                            }
                        }
                    }

                    let reason = format!(
                        "Element's class attribute '{class_attribute}' {} ({} classes: {})",
                        verdict(all_match),
                        if positive { "missing" } else { "found" },
                        if offending.is_empty() {
                            "none".to_string()
                        } else {
                            offending.join(", ")
                        }
                    );
                    Ok(Eval::new(offending.is_empty(), reason))
                }
                .boxed()
            },
        )
    }

    fn eval_matches(&self, expression: &str, pattern: &str, positive: bool) -> Condition {
        let adapter = self.clone();
        let expression = expression.to_string();
        let pattern = pattern.to_string();
        Condition::new(
            if positive { "EVAL MATCH" } else { "EVAL NO-MATCH" },
            move || {
                let adapter = adapter.clone();
                let expression = expression.clone();
                let pattern = pattern.clone();
                async move {
                    let result = adapter.evaluate(&expression).await?.ok_or_else(|| {
                        Error::UnsupportedOperation(
                            "session cannot evaluate expressions".to_string(),
                        )
                    })?;
                    let matched = matching::is_match(&result, &pattern, true, false);
                    Ok(Eval::new(
                        matched == positive,
                        format!("Result of evaluation '{result}' {}", verdict(matched)),
                    ))
                }
                .boxed()
            },
        )
    }

    fn element_checked(&self, element_locator: &str, positive: bool) -> Condition {
        let adapter = self.clone();
        let element_locator = element_locator.to_string();
        Condition::new(
            if positive {
                "ELEMENT CHECKED"
            } else {
                "ELEMENT UNCHECKED"
            },
            move || {
                let adapter = adapter.clone();
                let element_locator = element_locator.clone();
                async move {
                    let checked = adapter.is_checked(&element_locator).await?;
                    Ok(Eval::new(
                        checked == positive,
                        format!(
                            "Checkbox/radio element is {}",
                            if checked { "checked" } else { "not checked" }
                        ),
                    ))
                }
                .boxed()
            },
        )
    }

    fn element_present(&self, element_locator: &str, positive: bool) -> Condition {
        let adapter = self.clone();
        let element_locator = element_locator.to_string();
        Condition::new(
            if positive {
                "ELEMENT PRESENT"
            } else {
                "ELEMENT ABSENT"
            },
            move || {
                let adapter = adapter.clone();
                let element_locator = element_locator.clone();
                async move {
                    let found = adapter.is_element_present(&element_locator).await?;
                    Ok(Eval::new(
                        found == positive,
                        if found { "Element found" } else { "Element not found" },
                    ))
                }
                .boxed()
            },
        )
    }

    fn element_visible(&self, element_locator: &str, positive: bool) -> Condition {
        let adapter = self.clone();
        let element_locator = element_locator.to_string();
        Condition::new(
            if positive {
                "ELEMENT VISIBLE"
            } else {
                "ELEMENT INVISIBLE"
            },
            move || {
                let adapter = adapter.clone();
                let element_locator = element_locator.clone();
                async move {
                    let visible = adapter.is_visible(&element_locator).await?;
                    Ok(Eval::new(
                        visible == positive,
                        format!(
                            "Element is {}",
                            if visible { "visible" } else { "invisible" }
                        ),
                    ))
                }
                .boxed()
            },
        )
    }

    fn element_count_equal(&self, element_locator: &str, count: usize, positive: bool) -> Condition {
        let adapter = self.clone();
        let element_locator = element_locator.to_string();
        Condition::new(
            if positive {
                "ELEMENT COUNT EQUAL"
            } else {
                "ELEMENT COUNT DIFFERENT"
            },
            move || {
                let adapter = adapter.clone();
                let element_locator = element_locator.clone();
                async move {
                    let actual = adapter.get_element_count(&element_locator).await?;
                    let equal = actual == count;
                    Ok(Eval::new(equal == positive, count_reason(count, actual)))
                }
                .boxed()
            },
        )
    }

    fn xpath_count_equal(&self, xpath: &str, count: usize, positive: bool) -> Condition {
        let adapter = self.clone();
        let xpath = xpath.to_string();
        Condition::new(
            if positive {
                "XPATH COUNT EQUAL"
            } else {
                "XPATH COUNT DIFFERENT"
            },
            move || {
                let adapter = adapter.clone();
                let xpath = xpath.clone();
                async move {
                    let actual = adapter.get_xpath_count(&xpath).await?;
                    let equal = actual == count;
                    Ok(Eval::new(equal == positive, count_reason(count, actual)))
                }
                .boxed()
            },
        )
    }

    fn id_selected(&self, select_locator: &str, pattern: &str, positive: bool) -> Condition {
        let adapter = self.clone();
        let select_locator = select_locator.to_string();
        let pattern = pattern.to_string();
        Condition::new(
            if positive {
                "SELECTED ID MATCH"
            } else {
                "SELECTED ID NO-MATCH"
            },
            move || {
                let adapter = adapter.clone();
                let select_locator = select_locator.clone();
                let pattern = pattern.clone();
                async move {
                    let ids = adapter.get_selected_ids(&select_locator).await?;
                    let matched = ids
                        .iter()
                        .any(|id| matching::is_match(id, &pattern, true, false));
                    Ok(Eval::new(
                        matched == positive,
                        selected_reason(matched, "ID"),
                    ))
                }
                .boxed()
            },
        )
    }

    fn index_selected(&self, select_locator: &str, pattern: &str, positive: bool) -> Condition {
        let adapter = self.clone();
        let select_locator = select_locator.to_string();
        let pattern = pattern.to_string();
        Condition::new(
            if positive {
                "SELECTED INDEX MATCH"
            } else {
                "SELECTED INDEX NO-MATCH"
            },
            move || {
                let adapter = adapter.clone();
                let select_locator = select_locator.clone();
                let pattern = pattern.clone();
                async move {
                    let indices = adapter.get_selected_indices(&select_locator).await?;
                    let matched = indices
                        .iter()
                        .any(|idx| matching::is_match(&idx.to_string(), &pattern, true, false));
                    Ok(Eval::new(
                        matched == positive,
                        selected_reason(matched, "index"),
                    ))
                }
                .boxed()
            },
        )
    }

    fn label_selected(&self, select_locator: &str, pattern: &str, positive: bool) -> Condition {
        let adapter = self.clone();
        let select_locator = select_locator.to_string();
        let pattern = pattern.to_string();
        Condition::new(
            if positive {
                "SELECTED LABEL MATCH"
            } else {
                "SELECTED LABEL NO-MATCH"
            },
            move || {
                let adapter = adapter.clone();
                let select_locator = select_locator.clone();
                let pattern = pattern.clone();
                async move {
                    let labels = adapter.get_selected_labels(&select_locator).await?;
                    let matched = labels
                        .iter()
                        .any(|label| matching::is_match(label, &pattern, true, true));
                    Ok(Eval::new(
                        matched == positive,
                        selected_reason(matched, "label"),
                    ))
                }
                .boxed()
            },
        )
    }

    fn value_selected(&self, select_locator: &str, pattern: &str, positive: bool) -> Condition {
        let adapter = self.clone();
        let select_locator = select_locator.to_string();
        let pattern = pattern.to_string();
        Condition::new(
            if positive {
                "SELECTED VALUE MATCH"
            } else {
                "SELECTED VALUE NO-MATCH"
            },
            move || {
                let adapter = adapter.clone();
                let select_locator = select_locator.clone();
                let pattern = pattern.clone();
                async move {
                    let values = adapter.get_selected_values(&select_locator).await?;
                    let matched = values
                        .iter()
                        .any(|value| matching::is_match(value, &pattern, true, false));
                    Ok(Eval::new(
                        matched == positive,
                        selected_reason(matched, "value attribute"),
                    ))
                }
                .boxed()
            },
        )
    }

    // === waitFor* commands ===

    pub async fn wait_for_attribute(&self, attribute_locator: &str, pattern: &str) -> Result<()> {
        let parsed = locator::parse_attribute_locator(attribute_locator)?;
        self.wait_for(self.attribute_matches(parsed.element_locator, &parsed.attribute_name, pattern, true))
            .await
    }

    pub async fn wait_for_not_attribute(
        &self,
        attribute_locator: &str,
        pattern: &str,
    ) -> Result<()> {
        let parsed = locator::parse_attribute_locator(attribute_locator)?;
        self.wait_for(self.attribute_matches(parsed.element_locator, &parsed.attribute_name, pattern, false))
            .await
    }

    pub async fn wait_for_element_attribute(
        &self,
        element_locator: &str,
        attribute_name: &str,
        pattern: &str,
    ) -> Result<()> {
        self.wait_for(self.attribute_matches(element_locator, attribute_name, pattern, true))
            .await
    }

    pub async fn wait_for_not_element_attribute(
        &self,
        element_locator: &str,
        attribute_name: &str,
        pattern: &str,
    ) -> Result<()> {
        self.wait_for(self.attribute_matches(element_locator, attribute_name, pattern, false))
            .await
    }

    pub async fn wait_for_checked(&self, element_locator: &str) -> Result<()> {
        self.wait_for(self.element_checked(element_locator, true)).await
    }

    pub async fn wait_for_not_checked(&self, element_locator: &str) -> Result<()> {
        self.wait_for(self.element_checked(element_locator, false)).await
    }

    pub async fn wait_for_class(&self, element_locator: &str, class_string: &str) -> Result<()> {
        self.wait_for(self.class_matches(element_locator, class_string, true))
            .await
    }

    pub async fn wait_for_not_class(&self, element_locator: &str, class_string: &str) -> Result<()> {
        self.wait_for(self.class_matches(element_locator, class_string, false))
            .await
    }

    pub async fn wait_for_element_count(&self, element_locator: &str, count: usize) -> Result<()> {
        self.wait_for(self.element_count_equal(element_locator, count, true))
            .await
    }

    pub async fn wait_for_not_element_count(
        &self,
        element_locator: &str,
        count: usize,
    ) -> Result<()> {
        self.wait_for(self.element_count_equal(element_locator, count, false))
            .await
    }

    pub async fn wait_for_element_present(&self, element_locator: &str) -> Result<()> {
        self.wait_for(self.element_present(element_locator, true)).await
    }

    pub async fn wait_for_not_element_present(&self, element_locator: &str) -> Result<()> {
        self.wait_for(self.element_present(element_locator, false)).await
    }

    pub async fn wait_for_eval(&self, expression: &str, pattern: &str) -> Result<()> {
        self.wait_for(self.eval_matches(expression, pattern, true)).await
    }

    pub async fn wait_for_not_eval(&self, expression: &str, pattern: &str) -> Result<()> {
        self.wait_for(self.eval_matches(expression, pattern, false)).await
    }

    pub async fn wait_for_text(&self, element_locator: &str, pattern: &str) -> Result<()> {
        self.wait_for(self.text_matches(element_locator, pattern, true))
            .await
    }

    pub async fn wait_for_not_text(&self, element_locator: &str, pattern: &str) -> Result<()> {
        self.wait_for(self.text_matches(element_locator, pattern, false))
            .await
    }

    pub async fn wait_for_text_present(&self, pattern: &str) -> Result<()> {
        self.wait_for(self.page_text_matches(pattern, true)).await
    }

    pub async fn wait_for_not_text_present(&self, pattern: &str) -> Result<()> {
        self.wait_for(self.page_text_matches(pattern, false)).await
    }

    pub async fn wait_for_title(&self, pattern: &str) -> Result<()> {
        self.wait_for(self.title_matches(pattern, true)).await
    }

    pub async fn wait_for_not_title(&self, pattern: &str) -> Result<()> {
        self.wait_for(self.title_matches(pattern, false)).await
    }

    pub async fn wait_for_value(&self, element_locator: &str, pattern: &str) -> Result<()> {
        self.wait_for(self.value_matches(element_locator, pattern, true))
            .await
    }

    pub async fn wait_for_not_value(&self, element_locator: &str, pattern: &str) -> Result<()> {
        self.wait_for(self.value_matches(element_locator, pattern, false))
            .await
    }

    pub async fn wait_for_visible(&self, element_locator: &str) -> Result<()> {
        self.wait_for(self.element_visible(element_locator, true)).await
    }

    pub async fn wait_for_not_visible(&self, element_locator: &str) -> Result<()> {
        self.wait_for(self.element_visible(element_locator, false)).await
    }

    pub async fn wait_for_style(&self, element_locator: &str, style: &str) -> Result<()> {
        check_is_true("Style is blank", !style.trim().is_empty())?;
        self.wait_for(self.style_matches(element_locator, style, true))
            .await
    }

    pub async fn wait_for_not_style(&self, element_locator: &str, style: &str) -> Result<()> {
        check_is_true("Style is blank", !style.trim().is_empty())?;
        self.wait_for(self.style_matches(element_locator, style, false))
            .await
    }

    pub async fn wait_for_xpath_count(&self, xpath: &str, count: usize) -> Result<()> {
        self.wait_for(self.xpath_count_equal(xpath, count, true)).await
    }

    pub async fn wait_for_not_xpath_count(&self, xpath: &str, count: usize) -> Result<()> {
        self.wait_for(self.xpath_count_equal(xpath, count, false)).await
    }

    pub async fn wait_for_selected_id(&self, select_locator: &str, pattern: &str) -> Result<()> {
        self.wait_for(self.id_selected(select_locator, pattern, true))
            .await
    }

    pub async fn wait_for_not_selected_id(
        &self,
        select_locator: &str,
        pattern: &str,
    ) -> Result<()> {
        self.wait_for(self.id_selected(select_locator, pattern, false))
            .await
    }

    pub async fn wait_for_selected_index(
        &self,
        select_locator: &str,
        pattern: &str,
    ) -> Result<()> {
        self.wait_for(self.index_selected(select_locator, pattern, true))
            .await
    }

    pub async fn wait_for_not_selected_index(
        &self,
        select_locator: &str,
        pattern: &str,
    ) -> Result<()> {
        self.wait_for(self.index_selected(select_locator, pattern, false))
            .await
    }

    pub async fn wait_for_selected_label(
        &self,
        select_locator: &str,
        pattern: &str,
    ) -> Result<()> {
        self.wait_for(self.label_selected(select_locator, pattern, true))
            .await
    }

    pub async fn wait_for_not_selected_label(
        &self,
        select_locator: &str,
        pattern: &str,
    ) -> Result<()> {
        self.wait_for(self.label_selected(select_locator, pattern, false))
            .await
    }

    pub async fn wait_for_selected_value(
        &self,
        select_locator: &str,
        pattern: &str,
    ) -> Result<()> {
        self.wait_for(self.value_selected(select_locator, pattern, true))
            .await
    }

    pub async fn wait_for_not_selected_value(
        &self,
        select_locator: &str,
        pattern: &str,
    ) -> Result<()> {
        self.wait_for(self.value_selected(select_locator, pattern, false))
            .await
    }

    /// Waits until the top-level window has seen a load event. Only
    /// meaningful on sessions that do not block natively; see
    /// [`crate::EngineConfig::driver_waits_for_page_load`].
    pub async fn wait_for_page_to_load(&self) -> Result<()> {
        self.sync_page_load().await
    }

    /// Waits until more than one window is open.
    pub async fn wait_for_any_pop_up(&self, max_waiting_time: Option<Duration>) -> Result<()> {
        let adapter = self.clone();
        let condition = Condition::new("POPUP LOADED", move || {
            let adapter = adapter.clone();
            async move {
                let count = adapter.session_ref().window_handles().await?.len();
                let found = count > 1;
                Ok(Eval::new(
                    found,
                    format!(
                        "{} window found",
                        if found { "At least one" } else { "No" }
                    ),
                ))
            }
            .boxed()
        });

        await_condition(
            condition,
            max_waiting_time.unwrap_or_else(|| self.timeout()),
            self.poll_interval(),
        )
        .await
    }

    /// Waits until a window matching the locator exists. When the
    /// current window is still open, every probe switches back to it;
    /// when it was closed by the page under test, the probe stays
    /// wherever the scan ends.
    pub async fn wait_for_pop_up(
        &self,
        window_locator: &str,
        max_waiting_time: Option<Duration>,
    ) -> Result<()> {
        let current_window_open = self
            .session_ref()
            .current_window_handle()
            .await
            .is_ok();

        let adapter = self.clone();
        let window_locator_owned = window_locator.to_string();
        let condition = Condition::new("WINDOW PRESENT", move || {
            let adapter = adapter.clone();
            let window_locator = window_locator_owned.clone();
            async move {
                match adapter
                    .finder()
                    .find_window(adapter.session_ref(), &window_locator, current_window_open)
                    .await
                {
                    Ok(_) => Ok(Eval::new(true, "Window found")),
                    Err(Error::NoSuchWindow(_)) => Ok(Eval::new(false, "No such window found")),
                    Err(err) => Err(err),
                }
            }
            .boxed()
        });

        await_condition(
            condition,
            max_waiting_time.unwrap_or_else(|| self.timeout()),
            self.poll_interval(),
        )
        .await
    }

    // === assert* commands (single evaluation) ===

    pub async fn assert_attribute(&self, attribute_locator: &str, pattern: &str) -> Result<()> {
        let parsed = locator::parse_attribute_locator(attribute_locator)?;
        assure(self.attribute_matches(parsed.element_locator, &parsed.attribute_name, pattern, true))
            .await
    }

    pub async fn assert_not_attribute(&self, attribute_locator: &str, pattern: &str) -> Result<()> {
        let parsed = locator::parse_attribute_locator(attribute_locator)?;
        assure(self.attribute_matches(parsed.element_locator, &parsed.attribute_name, pattern, false))
            .await
    }

    pub async fn assert_checked(&self, element_locator: &str) -> Result<()> {
        assure(self.element_checked(element_locator, true)).await
    }

    pub async fn assert_not_checked(&self, element_locator: &str) -> Result<()> {
        assure(self.element_checked(element_locator, false)).await
    }

    pub async fn assert_class(&self, element_locator: &str, class_string: &str) -> Result<()> {
        assure(self.class_matches(element_locator, class_string, true)).await
    }

    pub async fn assert_not_class(&self, element_locator: &str, class_string: &str) -> Result<()> {
        assure(self.class_matches(element_locator, class_string, false)).await
    }

    pub async fn assert_element_count(&self, element_locator: &str, count: usize) -> Result<()> {
        assure(self.element_count_equal(element_locator, count, true)).await
    }

    pub async fn assert_not_element_count(
        &self,
        element_locator: &str,
        count: usize,
    ) -> Result<()> {
        assure(self.element_count_equal(element_locator, count, false)).await
    }

    pub async fn assert_element_present(&self, element_locator: &str) -> Result<()> {
        assure(self.element_present(element_locator, true)).await
    }

    pub async fn assert_not_element_present(&self, element_locator: &str) -> Result<()> {
        assure(self.element_present(element_locator, false)).await
    }

    pub async fn assert_eval(&self, expression: &str, pattern: &str) -> Result<()> {
        assure(self.eval_matches(expression, pattern, true)).await
    }

    pub async fn assert_not_eval(&self, expression: &str, pattern: &str) -> Result<()> {
        assure(self.eval_matches(expression, pattern, false)).await
    }

    pub async fn assert_text(&self, element_locator: &str, pattern: &str) -> Result<()> {
        assure(self.text_matches(element_locator, pattern, true)).await
    }

    pub async fn assert_not_text(&self, element_locator: &str, pattern: &str) -> Result<()> {
        assure(self.text_matches(element_locator, pattern, false)).await
    }

    pub async fn assert_text_present(&self, pattern: &str) -> Result<()> {
        assure(self.page_text_matches(pattern, true)).await
    }

    pub async fn assert_not_text_present(&self, pattern: &str) -> Result<()> {
        assure(self.page_text_matches(pattern, false)).await
    }

    pub async fn assert_title(&self, pattern: &str) -> Result<()> {
        assure(self.title_matches(pattern, true)).await
    }

    pub async fn assert_not_title(&self, pattern: &str) -> Result<()> {
        assure(self.title_matches(pattern, false)).await
    }

    pub async fn assert_value(&self, element_locator: &str, pattern: &str) -> Result<()> {
        assure(self.value_matches(element_locator, pattern, true)).await
    }

    pub async fn assert_not_value(&self, element_locator: &str, pattern: &str) -> Result<()> {
        assure(self.value_matches(element_locator, pattern, false)).await
    }

    pub async fn assert_visible(&self, element_locator: &str) -> Result<()> {
        assure(self.element_visible(element_locator, true)).await
    }

    pub async fn assert_not_visible(&self, element_locator: &str) -> Result<()> {
        assure(self.element_visible(element_locator, false)).await
    }

    pub async fn assert_style(&self, element_locator: &str, style: &str) -> Result<()> {
        check_is_true("Style is blank", !style.trim().is_empty())?;
        assure(self.style_matches(element_locator, style, true)).await
    }

    pub async fn assert_not_style(&self, element_locator: &str, style: &str) -> Result<()> {
        check_is_true("Style is blank", !style.trim().is_empty())?;
        assure(self.style_matches(element_locator, style, false)).await
    }

    pub async fn assert_xpath_count(&self, xpath: &str, count: usize) -> Result<()> {
        assure(self.xpath_count_equal(xpath, count, true)).await
    }

    pub async fn assert_not_xpath_count(&self, xpath: &str, count: usize) -> Result<()> {
        assure(self.xpath_count_equal(xpath, count, false)).await
    }

    pub async fn assert_selected_id(&self, select_locator: &str, pattern: &str) -> Result<()> {
        assure(self.id_selected(select_locator, pattern, true)).await
    }

    pub async fn assert_not_selected_id(&self, select_locator: &str, pattern: &str) -> Result<()> {
        assure(self.id_selected(select_locator, pattern, false)).await
    }

    pub async fn assert_selected_index(&self, select_locator: &str, pattern: &str) -> Result<()> {
        assure(self.index_selected(select_locator, pattern, true)).await
    }

    pub async fn assert_not_selected_index(
        &self,
        select_locator: &str,
        pattern: &str,
    ) -> Result<()> {
        assure(self.index_selected(select_locator, pattern, false)).await
    }

    pub async fn assert_selected_label(&self, select_locator: &str, pattern: &str) -> Result<()> {
        assure(self.label_selected(select_locator, pattern, true)).await
    }

    pub async fn assert_not_selected_label(
        &self,
        select_locator: &str,
        pattern: &str,
    ) -> Result<()> {
        assure(self.label_selected(select_locator, pattern, false)).await
    }

    pub async fn assert_selected_value(&self, select_locator: &str, pattern: &str) -> Result<()> {
        assure(self.value_selected(select_locator, pattern, true)).await
    }

    pub async fn assert_not_selected_value(
        &self,
        select_locator: &str,
        pattern: &str,
    ) -> Result<()> {
        assure(self.value_selected(select_locator, pattern, false)).await
    }

    // === boolean probes ===

    pub async fn has_text(&self, element_locator: &str, pattern: &str) -> Result<bool> {
        self.probe(self.text_matches(element_locator, pattern, true)).await
    }

    pub async fn has_value(&self, element_locator: &str, pattern: &str) -> Result<bool> {
        self.probe(self.value_matches(element_locator, pattern, true)).await
    }

    pub async fn has_title(&self, pattern: &str) -> Result<bool> {
        self.probe(self.title_matches(pattern, true)).await
    }

    pub async fn has_attribute(&self, attribute_locator: &str, pattern: &str) -> Result<bool> {
        let parsed = locator::parse_attribute_locator(attribute_locator)?;
        self.probe(self.attribute_matches(parsed.element_locator, &parsed.attribute_name, pattern, true))
            .await
    }

    pub async fn has_class(&self, element_locator: &str, class_string: &str) -> Result<bool> {
        self.probe(self.class_matches(element_locator, class_string, true))
            .await
    }

    pub async fn has_not_class(&self, element_locator: &str, class_string: &str) -> Result<bool> {
        self.probe(self.class_matches(element_locator, class_string, false))
            .await
    }

    pub async fn has_style(&self, element_locator: &str, style: &str) -> Result<bool> {
        self.probe(self.style_matches(element_locator, style, true)).await
    }

    pub async fn has_not_style(&self, element_locator: &str, style: &str) -> Result<bool> {
        self.probe(self.style_matches(element_locator, style, false)).await
    }

    pub async fn is_text_present(&self, pattern: &str) -> Result<bool> {
        self.probe(self.page_text_matches(pattern, true)).await
    }

    pub async fn is_eval_matching(&self, expression: &str, pattern: &str) -> Result<bool> {
        self.probe(self.eval_matches(expression, pattern, true)).await
    }

    pub async fn is_selected_id(&self, select_locator: &str, pattern: &str) -> Result<bool> {
        self.probe(self.id_selected(select_locator, pattern, true)).await
    }

    pub async fn is_selected_index(&self, select_locator: &str, pattern: &str) -> Result<bool> {
        self.probe(self.index_selected(select_locator, pattern, true)).await
    }

    pub async fn is_selected_label(&self, select_locator: &str, pattern: &str) -> Result<bool> {
        self.probe(self.label_selected(select_locator, pattern, true)).await
    }

    pub async fn is_selected_value(&self, select_locator: &str, pattern: &str) -> Result<bool> {
        self.probe(self.value_selected(select_locator, pattern, true)).await
    }
}

fn count_reason(expected: usize, actual: usize) -> String {
    if expected == actual {
        format!("Number of matching elements is equal to '{expected}'")
    } else {
        format!("Invalid number of matching elements, expected <{expected}> but was <{actual}>")
    }
}

fn selected_reason(matched: bool, what: &str) -> String {
    format!(
        "{} selected option found whose {what} matches the specified pattern",
        if matched { "At least one" } else { "No" }
    )
}
