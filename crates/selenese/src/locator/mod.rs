// Locator parsing and resolution
//
// Script locators are strings of the form `strategy=criterion`. Parsing
// never fails: an unrecognized prefix is deferred to the resolver, which
// rejects it with an unknown-strategy error; a string without a prefix
// resolves through the `implicit` strategy of its kind.

mod element;
mod option;
mod window;

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::session::{ElementRef, Session, WindowHandle};

pub(crate) use element::ElementFinder;
pub(crate) use option::OptionFinder;
pub(crate) use window::WindowFinder;

/// A locator split into its strategy prefix and criterion.
///
/// `strategy` is `None` when no `prefix=` was present; resolution then
/// uses the implicit strategy of the target kind with the whole string as
/// criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawLocator<'a> {
    pub strategy: Option<&'a str>,
    pub criterion: &'a str,
}

/// Splits a raw locator string into `(strategy, criterion)`.
///
/// A prefix is a leading run of ASCII letters followed by `=`. Anything
/// else (including an empty prefix or one containing digits) leaves the
/// string unsplit.
pub fn parse(raw: &str) -> RawLocator<'_> {
    if let Some((prefix, rest)) = raw.split_once('=') {
        if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_alphabetic()) {
            return RawLocator {
                strategy: Some(prefix),
                criterion: rest,
            };
        }
    }
    RawLocator {
        strategy: None,
        criterion: raw,
    }
}

static ATTRIBUTE_LOCATOR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@[^\d\s]\S*$").expect("valid pattern"));

/// An element locator combined with an attribute name: `locator@attr`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeLocator<'a> {
    pub element_locator: &'a str,
    pub attribute_name: String,
}

/// Splits `locator@attr` at the last `@`. The attribute name must not
/// start with a digit (so xpaths containing `@` in the locator part do
/// not confuse the split) and is lowercased.
pub fn parse_attribute_locator(raw: &str) -> Result<AttributeLocator<'_>> {
    if !ATTRIBUTE_LOCATOR_PATTERN.is_match(raw) {
        return Err(Error::InvalidArgument(format!(
            "Attribute locator '{raw}' is invalid"
        )));
    }
    let at = raw.rfind('@').ok_or_else(|| {
        Error::InvalidArgument(format!("Attribute locator '{raw}' is invalid"))
    })?;
    Ok(AttributeLocator {
        element_locator: &raw[..at],
        attribute_name: raw[at + 1..].to_lowercase(),
    })
}

/// Bundles the per-kind resolvers behind one entry point, including the
/// visible-only element finder variant.
pub(crate) struct Finder {
    elements: ElementFinder,
    visible_elements: ElementFinder,
    options: OptionFinder,
    windows: WindowFinder,
}

impl Finder {
    pub fn new() -> Self {
        Self {
            elements: ElementFinder::new(false),
            visible_elements: ElementFinder::new(true),
            options: OptionFinder::new(),
            windows: WindowFinder::new(),
        }
    }

    fn element_finder(&self, visible_only: bool) -> &ElementFinder {
        if visible_only {
            &self.visible_elements
        } else {
            &self.elements
        }
    }

    /// First element matching the locator, or `NoSuchElement`.
    pub async fn find_element(
        &self,
        session: &dyn Session,
        locator: &str,
        visible_only: bool,
    ) -> Result<ElementRef> {
        self.element_finder(visible_only).find(session, locator).await
    }

    /// All elements matching the locator; possibly empty, never
    /// `NoSuchElement`.
    pub async fn find_elements(
        &self,
        session: &dyn Session,
        locator: &str,
        visible_only: bool,
    ) -> Result<Vec<ElementRef>> {
        self.element_finder(visible_only)
            .find_all(session, locator)
            .await
    }

    /// Whether at least one element matches the locator. Unknown-strategy
    /// failures still propagate.
    pub async fn is_element_present(
        &self,
        session: &dyn Session,
        locator: &str,
    ) -> Result<bool> {
        match self.find_element(session, locator, false).await {
            Ok(_) => Ok(true),
            Err(Error::NoSuchElement(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// First option of `select` matching the option locator.
    pub async fn find_option(
        &self,
        select: &ElementRef,
        option_locator: &str,
    ) -> Result<ElementRef> {
        self.options.find_option(select, option_locator).await
    }

    /// All options of `select` matching the option locator.
    pub async fn find_options(
        &self,
        select: &ElementRef,
        option_locator: &str,
    ) -> Result<Vec<ElementRef>> {
        self.options.find_options(select, option_locator).await
    }

    /// Handle of the first window matching the window locator.
    pub async fn find_window(
        &self,
        session: &dyn Session,
        window_locator: &str,
        switch_back: bool,
    ) -> Result<WindowHandle> {
        self.windows.find(session, window_locator, switch_back).await
    }
}
