// Query commands
//
// Read-only commands that resolve their target and return a normalized
// value. Normalization quirks worth knowing: getText returns the empty
// string for invisible elements and for radio/checkbox inputs, and the
// value attribute for other inputs and textareas; getValue defaults an
// absent value attribute to the empty string.

use crate::commands::{check_is_true, scripts, CommandAdapter};
use crate::error::{Error, Result};
use crate::locator;
use crate::session::{By, Element, ElementRef, Session};

impl CommandAdapter {
    /// Rendered text of the element, per the normalization rules above.
    pub async fn get_text(&self, element_locator: &str) -> Result<String> {
        let element = self.find_element(element_locator).await?;

        if !element.is_displayed().await? {
            return Ok(String::new());
        }

        let tag = element.tag_name().await?;
        if tag.eq_ignore_ascii_case("input") {
            match element.attribute("type").await?.as_deref() {
                None | Some("radio") | Some("checkbox") => Ok(String::new()),
                Some(_) => self.element_value(&element).await,
            }
        } else if tag.eq_ignore_ascii_case("textarea") {
            self.element_value(&element).await
        } else {
            element.text().await
        }
    }

    /// Value attribute of the element, defaulting to the empty string.
    pub async fn get_value(&self, element_locator: &str) -> Result<String> {
        let element = self.find_element(element_locator).await?;
        self.element_value(&element).await
    }

    async fn element_value(&self, element: &ElementRef) -> Result<String> {
        Ok(element.attribute("value").await?.unwrap_or_default())
    }

    /// Attribute value addressed by a combined `locator@attr` string.
    pub async fn get_attribute(&self, attribute_locator: &str) -> Result<String> {
        let parsed = locator::parse_attribute_locator(attribute_locator)?;
        self.attribute_value(parsed.element_locator, &parsed.attribute_name)
            .await
    }

    /// Attribute value of the element resolved by `element_locator`.
    pub async fn get_element_attribute(
        &self,
        element_locator: &str,
        attribute_name: &str,
    ) -> Result<String> {
        check_is_true(
            "Attribute name must not be blank",
            !attribute_name.trim().is_empty(),
        )?;
        self.attribute_value(element_locator, attribute_name).await
    }

    /// Resolves the element and reads an attribute that must exist.
    pub(crate) async fn attribute_value(
        &self,
        element_locator: &str,
        attribute_name: &str,
    ) -> Result<String> {
        let element = self.find_element(element_locator).await?;
        element.attribute(attribute_name).await?.ok_or_else(|| {
            Error::NoSuchElement(format!(
                "Element '{element_locator}' does not have attribute '{attribute_name}'"
            ))
        })
    }

    /// Number of elements matching the locator (zero is a legitimate
    /// result, not a failure).
    pub async fn get_element_count(&self, element_locator: &str) -> Result<usize> {
        Ok(self.find_elements(element_locator).await?.len())
    }

    /// Number of nodes matching a raw xpath expression.
    pub async fn get_xpath_count(&self, xpath: &str) -> Result<usize> {
        Ok(self
            .session_ref()
            .find_elements(&By::xpath(xpath))
            .await?
            .len())
    }

    /// Text of the current page's body.
    pub async fn get_page_text(&self) -> Result<String> {
        let body = self
            .session_ref()
            .find_elements(&By::tag_name("body"))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NoSuchElement("No body element on current page".to_string()))?;
        body.text().await
    }

    /// Title of the current page.
    pub async fn get_title(&self) -> Result<String> {
        self.session_ref().title().await
    }

    /// Computed value of a CSS property on the element.
    pub async fn get_effective_style(
        &self,
        element_locator: &str,
        property_name: &str,
    ) -> Result<Option<String>> {
        check_is_true(
            "CSS property name is blank",
            !property_name.trim().is_empty(),
        )?;

        let element = self.find_element(element_locator).await?;
        scripts::effective_style(self.session_ref(), &element, property_name).await
    }

    /// Whether the checkbox/radio resolved by the locator is checked.
    pub async fn is_checked(&self, element_locator: &str) -> Result<bool> {
        let input = self.find_element(element_locator).await?;

        let tag = input.tag_name().await?;
        check_is_true(
            format!("Element '{element_locator}' is not an HTML input element"),
            tag.eq_ignore_ascii_case("input"),
        )?;
        let input_type = input.attribute("type").await?.unwrap_or_default();
        check_is_true(
            format!("Input '{element_locator}' is neither a checkbox nor a radio button"),
            input_type == "radio" || input_type == "checkbox",
        )?;

        input.is_selected().await
    }

    /// Whether at least one element matches the locator.
    pub async fn is_element_present(&self, element_locator: &str) -> Result<bool> {
        self.finder()
            .is_element_present(self.session_ref(), element_locator)
            .await
    }

    pub async fn is_enabled(&self, element_locator: &str) -> Result<bool> {
        self.find_element(element_locator).await?.is_enabled().await
    }

    pub async fn is_visible(&self, element_locator: &str) -> Result<bool> {
        self.find_element(element_locator)
            .await?
            .is_displayed()
            .await
    }

    /// IDs of all selected options of the select; when nothing is
    /// selected, the first option stands in (the browser's implicit
    /// selection).
    pub async fn get_selected_ids(&self, select_locator: &str) -> Result<Vec<String>> {
        let options = self.select_options(select_locator).await?;

        let mut ids = Vec::new();
        for option in &options {
            if option.is_selected().await? {
                ids.push(option.attribute("id").await?.unwrap_or_default());
            }
        }
        if ids.is_empty() {
            ids.push(options[0].attribute("id").await?.unwrap_or_default());
        }
        Ok(ids)
    }

    /// Indices of all selected options of the select.
    pub async fn get_selected_indices(&self, select_locator: &str) -> Result<Vec<usize>> {
        let options = self.select_options(select_locator).await?;

        let mut indices = Vec::new();
        for (index, option) in options.iter().enumerate() {
            if option.is_selected().await? {
                indices.push(index);
            }
        }
        if indices.is_empty() {
            indices.push(0);
        }
        Ok(indices)
    }

    /// Labels (rendered text) of all selected options of the select;
    /// invisible options contribute empty labels.
    pub async fn get_selected_labels(&self, select_locator: &str) -> Result<Vec<String>> {
        let options = self.select_options(select_locator).await?;

        let mut labels = Vec::new();
        for option in &options {
            if option.is_selected().await? {
                labels.push(self.option_label(option).await?);
            }
        }
        if labels.is_empty() {
            labels.push(self.option_label(&options[0]).await?);
        }
        Ok(labels)
    }

    /// Value attributes of all selected options of the select.
    pub async fn get_selected_values(&self, select_locator: &str) -> Result<Vec<String>> {
        let options = self.select_options(select_locator).await?;

        let mut values = Vec::new();
        for option in &options {
            if option.is_selected().await? {
                values.push(option.attribute("value").await?.unwrap_or_default());
            }
        }
        if values.is_empty() {
            values.push(options[0].attribute("value").await?.unwrap_or_default());
        }
        Ok(values)
    }

    async fn option_label(&self, option: &ElementRef) -> Result<String> {
        if option.is_displayed().await? {
            option.text().await
        } else {
            Ok(String::new())
        }
    }

    /// Resolves a select element and returns its options, failing when
    /// the element is no select or has none.
    async fn select_options(&self, select_locator: &str) -> Result<Vec<ElementRef>> {
        let select = self.find_element(select_locator).await?;

        let tag = select.tag_name().await?;
        check_is_true(
            format!("Element '{select_locator}' is not an HTML select element"),
            tag.eq_ignore_ascii_case("select"),
        )?;

        let options = select.find_elements(&By::tag_name("option")).await?;
        check_is_true(
            format!("Select '{select_locator}' does not contain any option"),
            !options.is_empty(),
        )?;
        Ok(options)
    }
}
