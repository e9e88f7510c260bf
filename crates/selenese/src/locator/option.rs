// Select-option locator resolution
//
// Operates on the option children of an already resolved select element.
// Strategies: value (pattern match on the value attribute), label
// (pattern match on the rendered text, also the implicit strategy), id
// (literal match on the id attribute), index (position). A lookup that
// matches nothing fails with NoSuchElement; strategy-level parse or
// range failures yield an empty candidate set first.

use crate::error::{Error, Result};
use crate::locator;
use crate::matching;
use crate::session::{By, Element, ElementRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Value,
    Label,
    Id,
    Index,
}

impl Strategy {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "value" => Some(Strategy::Value),
            "label" | "implicit" => Some(Strategy::Label),
            "id" => Some(Strategy::Id),
            "index" => Some(Strategy::Index),
            _ => None,
        }
    }
}

pub(crate) struct OptionFinder;

impl OptionFinder {
    pub fn new() -> Self {
        Self
    }

    /// First option of `select` matching the locator.
    ///
    /// `find_options` already fails when nothing matches, so the head of
    /// its result always exists.
    pub async fn find_option(
        &self,
        select: &ElementRef,
        option_locator: &str,
    ) -> Result<ElementRef> {
        self.find_options(select, option_locator)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                Error::NoSuchElement(format!(
                    "No option found for option locator: {option_locator}"
                ))
            })
    }

    /// All options of `select` matching the locator; fails with
    /// `NoSuchElement` when there are none.
    pub async fn find_options(
        &self,
        select: &ElementRef,
        option_locator: &str,
    ) -> Result<Vec<ElementRef>> {
        let raw = locator::parse(option_locator);
        let name = raw.strategy.unwrap_or("implicit");
        let strategy = Strategy::from_name(name).ok_or_else(|| Error::UnknownStrategy {
            kind: "option",
            name: name.to_string(),
        })?;

        let options = self.run(select, strategy, raw.criterion).await?;
        if options.is_empty() {
            return Err(Error::NoSuchElement(format!(
                "No option found for option locator: {option_locator}"
            )));
        }
        Ok(options)
    }

    async fn run(
        &self,
        select: &ElementRef,
        strategy: Strategy,
        criterion: &str,
    ) -> Result<Vec<ElementRef>> {
        let candidates = select.find_elements(&By::tag_name("option")).await?;

        match strategy {
            Strategy::Value => {
                let mut options = Vec::new();
                for option in candidates {
                    // an absent value attribute matches like an empty one
                    let value = option.attribute("value").await?.unwrap_or_default();
                    if matching::is_match(&value, criterion, true, false) {
                        options.push(option);
                    }
                }
                Ok(options)
            }
            Strategy::Label => {
                let mut options = Vec::new();
                for option in candidates {
                    if matching::is_match(&option.text().await?, criterion, true, true) {
                        options.push(option);
                    }
                }
                Ok(options)
            }
            Strategy::Id => {
                let mut options = Vec::new();
                for option in candidates {
                    if option.attribute("id").await?.as_deref() == Some(criterion) {
                        options.push(option);
                    }
                }
                Ok(options)
            }
            Strategy::Index => Ok(criterion
                .parse::<usize>()
                .ok()
                .and_then(|idx| candidates.into_iter().nth(idx))
                .map(|option| vec![option])
                .unwrap_or_default()),
        }
    }
}
