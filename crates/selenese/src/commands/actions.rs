// Act-and-verify commands
//
// Each action resolves its target fresh, verifies structural
// preconditions (tag name, enabled state, applicable input type), then
// performs the action natively when the element can receive it and
// falls back to synthesized DOM events otherwise. The *AndWait variants
// add page-load synchronization around the same step.

use crate::commands::{check_is_true, parse_coordinates, scripts, CommandAdapter};
use crate::error::Result;
use crate::session::{By, Element, ElementRef};

/// WebDriver key code for Enter, appended by `typeAndWait`.
const ENTER_KEY: char = '\u{e007}';

impl CommandAdapter {
    /// Clicks the element. Elements that would not receive a native
    /// click get a synthesized mousedown/mouseup/click sequence instead.
    pub async fn click(&self, element_locator: &str) -> Result<()> {
        scripts::neutralize_dialogs(self.session_ref()).await?;

        let element = self.find_element(element_locator).await?;
        self.click_element(&element).await
    }

    pub async fn click_and_wait(&self, element_locator: &str) -> Result<()> {
        self.execute_and_wait(|| self.click(element_locator)).await
    }

    async fn click_element(&self, element: &ElementRef) -> Result<()> {
        if self.is_clickable(element, true).await? {
            element.click().await
        } else {
            scripts::fire_click_event(self.session_ref(), element).await
        }
    }

    async fn is_clickable(&self, element: &ElementRef, check_visibility: bool) -> Result<bool> {
        scripts::is_clickable(
            self.session_ref(),
            element,
            check_visibility,
            self.config().check_element_clickable,
        )
        .await
    }

    /// Checks a checkbox or radio button; a no-op when already checked.
    pub async fn check(&self, element_locator: &str) -> Result<()> {
        let input = self.resolve_checkable(element_locator, false).await?;

        scripts::neutralize_dialogs(self.session_ref()).await?;
        if !input.is_selected().await? {
            self.toggle_checked(&input, true).await?;
        }
        Ok(())
    }

    pub async fn check_and_wait(&self, element_locator: &str) -> Result<()> {
        self.execute_and_wait(|| self.check(element_locator)).await
    }

    /// Unchecks a checkbox; a no-op when already unchecked.
    pub async fn uncheck(&self, element_locator: &str) -> Result<()> {
        let input = self.resolve_checkable(element_locator, true).await?;

        scripts::neutralize_dialogs(self.session_ref()).await?;
        if input.is_selected().await? {
            self.toggle_checked(&input, false).await?;
        }
        Ok(())
    }

    pub async fn uncheck_and_wait(&self, element_locator: &str) -> Result<()> {
        self.execute_and_wait(|| self.uncheck(element_locator)).await
    }

    async fn resolve_checkable(
        &self,
        element_locator: &str,
        checkbox_only: bool,
    ) -> Result<ElementRef> {
        let input = self.find_element(element_locator).await?;

        let tag = input.tag_name().await?;
        check_is_true(
            format!("Element '{element_locator}' is not an HTML input element"),
            tag.eq_ignore_ascii_case("input"),
        )?;

        let input_type = input.attribute("type").await?.unwrap_or_default();
        if checkbox_only {
            check_is_true(
                "Only check boxes can be unchecked",
                input_type == "checkbox",
            )?;
        } else {
            check_is_true(
                "Check is only allowed on radio/checkbox input elements",
                input_type == "radio" || input_type == "checkbox",
            )?;
        }
        check_is_true(
            format!("Radio/checkbox '{element_locator}' is disabled"),
            input.is_enabled().await?,
        )?;

        Ok(input)
    }

    async fn toggle_checked(&self, input: &ElementRef, checked: bool) -> Result<()> {
        if self.is_clickable(input, true).await? {
            input.click().await
        } else {
            scripts::set_property(
                self.session_ref(),
                input,
                "checked",
                if checked { "true" } else { "false" },
            )
            .await?;
            scripts::fire_change_event(self.session_ref(), input).await
        }
    }

    /// Types text into the element. Editable elements are cleared first;
    /// elements that cannot receive native keystrokes get per-character
    /// synthesized key events.
    pub async fn type_text(&self, element_locator: &str, text: &str) -> Result<()> {
        scripts::neutralize_dialogs(self.session_ref()).await?;

        let element = self.find_element(element_locator).await?;
        let displayed = element.is_displayed().await?;

        // first of all clear the element
        if displayed && scripts::is_editable(&element, false).await? {
            element.clear().await?;
        }

        if !displayed || !self.is_clickable(&element, false).await? {
            self.type_keys(&element, text).await
        } else if text.is_empty() {
            // type some "null" text to still trigger the key events
            element.send_keys(" \u{8}").await
        } else {
            element.send_keys(text).await
        }
    }

    pub async fn type_and_wait(&self, element_locator: &str, text: &str) -> Result<()> {
        let text = format!("{text}{ENTER_KEY}");
        self.execute_and_wait(|| self.type_text(element_locator, &text))
            .await
    }

    /// Synthesized typing: fire key events per character, keeping the
    /// value property in sync for text and hidden inputs.
    async fn type_keys(&self, element: &ElementRef, text: &str) -> Result<()> {
        let tag = element.tag_name().await?;
        let input_type = element.attribute("type").await?.unwrap_or_default();
        let adjust_value = tag.eq_ignore_ascii_case("input")
            && (input_type.eq_ignore_ascii_case("hidden") || input_type.eq_ignore_ascii_case("text"));

        let mut typed = String::with_capacity(text.len());
        for c in text.chars() {
            typed.push(c);

            if adjust_value {
                scripts::set_property(
                    self.session_ref(),
                    element,
                    "value",
                    &scripts::js_string(&typed),
                )
                .await?;
            }

            let code = c as u32;
            scripts::fire_key_event(self.session_ref(), element, "keydown", code).await?;
            scripts::fire_key_event(self.session_ref(), element, "keypress", code).await?;
            scripts::fire_key_event(self.session_ref(), element, "keyup", code).await?;
        }
        Ok(())
    }

    /// Selects an option of a select element. On a multi-select, all
    /// other selections are removed first.
    pub async fn select(&self, select_locator: &str, option_locator: &str) -> Result<()> {
        scripts::neutralize_dialogs(self.session_ref()).await?;

        let select = self.resolve_select(select_locator, false).await?;

        if self.is_multiple_select(&select).await? {
            for option in select.find_elements(&By::tag_name("option")).await? {
                self.set_option_selected(&select, &option, false).await?;
            }

            let options = self.finder().find_options(&select, option_locator).await?;
            for option in options {
                self.set_option_selected(&select, &option, true).await?;
            }
        } else {
            let option = self.finder().find_option(&select, option_locator).await?;
            if self.is_clickable(&option, true).await? {
                if !option.is_selected().await? {
                    option.click().await?;
                }
            } else if !option.is_selected().await? && option.is_enabled().await? {
                self.session_ref()
                    .execute_script(
                        "arguments[0].selectedIndex = arguments[1].index;",
                        vec![select.clone().into(), option.clone().into()],
                    )
                    .await?;
                scripts::fire_change_event(self.session_ref(), &select).await?;
            }
        }
        Ok(())
    }

    pub async fn select_and_wait(&self, select_locator: &str, option_locator: &str) -> Result<()> {
        self.execute_and_wait(|| self.select(select_locator, option_locator))
            .await
    }

    /// Adds the matching options to the selection of a multi-select.
    pub async fn add_selection(&self, select_locator: &str, option_locator: &str) -> Result<()> {
        let select = self.resolve_select(select_locator, true).await?;

        let options = self.finder().find_options(&select, option_locator).await?;
        for option in options {
            self.set_option_selected(&select, &option, true).await?;
        }
        Ok(())
    }

    /// Removes the matching options from the selection of a multi-select.
    pub async fn remove_selection(&self, select_locator: &str, option_locator: &str) -> Result<()> {
        let select = self.resolve_select(select_locator, true).await?;

        let options = self.finder().find_options(&select, option_locator).await?;
        for option in options {
            self.set_option_selected(&select, &option, false).await?;
        }
        Ok(())
    }

    async fn resolve_select(
        &self,
        select_locator: &str,
        require_multiple: bool,
    ) -> Result<ElementRef> {
        let select = self.find_element(select_locator).await?;

        let tag = select.tag_name().await?;
        check_is_true(
            format!("Element '{select_locator}' is not an HTML select element"),
            tag.eq_ignore_ascii_case("select"),
        )?;
        if require_multiple {
            check_is_true(
                format!("Select '{select_locator}' does not support multiple selection"),
                self.is_multiple_select(&select).await?,
            )?;
        }
        check_is_true(
            format!("Select '{select_locator}' is disabled"),
            select.is_enabled().await?,
        )?;

        Ok(select)
    }

    async fn is_multiple_select(&self, select: &ElementRef) -> Result<bool> {
        Ok(matches!(
            select.attribute("multiple").await?.as_deref(),
            Some(value) if value != "false"
        ))
    }

    async fn set_option_selected(
        &self,
        select: &ElementRef,
        option: &ElementRef,
        selected: bool,
    ) -> Result<()> {
        if option.is_selected().await? != selected && option.is_enabled().await? {
            if self.is_clickable(option, true).await? {
                option.click().await?;
            } else {
                scripts::set_property(
                    self.session_ref(),
                    option,
                    "selected",
                    if selected { "true" } else { "false" },
                )
                .await?;
                scripts::fire_change_event(self.session_ref(), select).await?;
            }
        }
        Ok(())
    }

    /// Submits a form.
    pub async fn submit(&self, form_locator: &str) -> Result<()> {
        let form = self.find_element(form_locator).await?;

        let tag = form.tag_name().await?;
        check_is_true(
            format!("Element '{form_locator}' is not an HTML form element"),
            tag.eq_ignore_ascii_case("form"),
        )?;
        form.submit().await
    }

    pub async fn submit_and_wait(&self, form_locator: &str) -> Result<()> {
        self.execute_and_wait(|| self.submit(form_locator)).await
    }

    /// Double-clicks the element (synthesized dblclick after the click
    /// sequence).
    pub async fn double_click(&self, element_locator: &str) -> Result<()> {
        scripts::neutralize_dialogs(self.session_ref()).await?;

        let element = self.resolve_interactable(element_locator).await?;
        scripts::fire_click_event(self.session_ref(), &element).await?;
        scripts::fire_mouse_event(self.session_ref(), &element, "dblclick", None).await
    }

    pub async fn double_click_and_wait(&self, element_locator: &str) -> Result<()> {
        self.execute_and_wait(|| self.double_click(element_locator))
            .await
    }

    /// Opens the context menu on the element.
    pub async fn context_menu(&self, element_locator: &str) -> Result<()> {
        scripts::neutralize_dialogs(self.session_ref()).await?;

        let element = self.resolve_interactable(element_locator).await?;
        scripts::fire_mouse_event(self.session_ref(), &element, "contextmenu", None).await
    }

    pub async fn context_menu_at(&self, element_locator: &str, coordinates: &str) -> Result<()> {
        let offset = parse_coordinates(coordinates)?;
        scripts::neutralize_dialogs(self.session_ref()).await?;

        let element = self.resolve_interactable(element_locator).await?;
        scripts::fire_mouse_event(self.session_ref(), &element, "contextmenu", Some(offset)).await
    }

    pub async fn mouse_down(&self, element_locator: &str) -> Result<()> {
        self.fire_mouse(element_locator, "mousedown", None).await
    }

    pub async fn mouse_down_at(&self, element_locator: &str, coordinates: &str) -> Result<()> {
        let offset = parse_coordinates(coordinates)?;
        self.fire_mouse(element_locator, "mousedown", Some(offset)).await
    }

    pub async fn mouse_up(&self, element_locator: &str) -> Result<()> {
        self.fire_mouse(element_locator, "mouseup", None).await
    }

    pub async fn mouse_up_at(&self, element_locator: &str, coordinates: &str) -> Result<()> {
        let offset = parse_coordinates(coordinates)?;
        self.fire_mouse(element_locator, "mouseup", Some(offset)).await
    }

    pub async fn mouse_move(&self, element_locator: &str) -> Result<()> {
        self.fire_mouse(element_locator, "mousemove", None).await
    }

    pub async fn mouse_move_at(&self, element_locator: &str, coordinates: &str) -> Result<()> {
        let offset = parse_coordinates(coordinates)?;
        self.fire_mouse(element_locator, "mousemove", Some(offset)).await
    }

    pub async fn mouse_over(&self, element_locator: &str) -> Result<()> {
        self.fire_mouse(element_locator, "mouseover", None).await
    }

    pub async fn mouse_out(&self, element_locator: &str) -> Result<()> {
        self.fire_mouse(element_locator, "mouseout", None).await
    }

    async fn fire_mouse(
        &self,
        element_locator: &str,
        event_type: &str,
        coordinates: Option<(i32, i32)>,
    ) -> Result<()> {
        let element = self.resolve_interactable(element_locator).await?;
        scripts::fire_mouse_event(self.session_ref(), &element, event_type, coordinates).await
    }

    async fn resolve_interactable(&self, element_locator: &str) -> Result<ElementRef> {
        let element = self.find_element(element_locator).await?;
        check_is_true(
            "Cannot interact with invisible elements",
            element.is_displayed().await?,
        )?;
        Ok(element)
    }
}
