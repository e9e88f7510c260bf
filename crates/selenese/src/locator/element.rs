// Element locator resolution
//
// Eight strategies over a closed enum. `find` returns the first
// acceptable match in strategy order; `find_all` returns every
// acceptable match and never fails with NoSuchElement. When the finder
// was built visible-only, elements that do not report themselves as
// displayed are filtered out.

use tracing::debug;

use crate::error::{Error, Result};
use crate::locator;
use crate::matching;
use crate::session::{By, Element, ElementRef, ScriptArg, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Css,
    XPath,
    Id,
    Name,
    Identifier,
    Link,
    Dom,
    Implicit,
}

impl Strategy {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "css" => Some(Strategy::Css),
            "xpath" => Some(Strategy::XPath),
            "id" => Some(Strategy::Id),
            "name" => Some(Strategy::Name),
            "identifier" => Some(Strategy::Identifier),
            "link" => Some(Strategy::Link),
            "dom" => Some(Strategy::Dom),
            "implicit" => Some(Strategy::Implicit),
            _ => None,
        }
    }
}

/// Attribute criteria of the `name=` strategy:
/// `name=<name>&value=<value>&index=<index>` with `value` and `index`
/// optional. Values may be quoted.
#[derive(Debug, Default, PartialEq, Eq)]
struct NameCriteria {
    name: String,
    value: Option<String>,
    index: Option<String>,
}

fn parse_name_criteria(criterion: &str) -> NameCriteria {
    let mut criteria = NameCriteria::default();
    for (i, part) in criterion.split('&').enumerate() {
        match part.split_once('=') {
            Some(("value", v)) => criteria.value = Some(unquote(v).to_string()),
            Some(("index", v)) => criteria.index = Some(v.to_string()),
            Some(("name", v)) if i == 0 => criteria.name = unquote(v).to_string(),
            _ if i == 0 => criteria.name = unquote(part).to_string(),
            _ => {} // unrecognized pair, ignored
        }
    }
    criteria
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        if (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\'')
            || (bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
        {
            return &value[1..value.len() - 1];
        }
    }
    value
}

pub(crate) struct ElementFinder {
    visible_only: bool,
}

impl ElementFinder {
    pub fn new(visible_only: bool) -> Self {
        Self { visible_only }
    }

    /// First acceptable element for the locator.
    pub async fn find(&self, session: &dyn Session, locator: &str) -> Result<ElementRef> {
        self.find_all(session, locator)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NoSuchElement(format!("No element found for locator: {locator}")))
    }

    /// Every acceptable element for the locator, in strategy order.
    pub async fn find_all(
        &self,
        session: &dyn Session,
        locator: &str,
    ) -> Result<Vec<ElementRef>> {
        let raw = locator::parse(locator);
        let name = raw.strategy.unwrap_or("implicit");
        let strategy = Strategy::from_name(name).ok_or_else(|| Error::UnknownStrategy {
            kind: "element",
            name: name.to_string(),
        })?;

        debug!(locator, strategy = ?strategy, visible_only = self.visible_only, "resolving element locator");
        self.run(session, strategy, raw.criterion).await
    }

    async fn run(
        &self,
        session: &dyn Session,
        strategy: Strategy,
        criterion: &str,
    ) -> Result<Vec<ElementRef>> {
        match strategy {
            Strategy::Css => self.query(session, &By::css(criterion)).await,
            Strategy::XPath => self.query(session, &By::xpath(criterion)).await,
            Strategy::Id => self.by_id(session, criterion).await,
            Strategy::Name => self.by_name_criteria(session, criterion).await,
            Strategy::Identifier => self.by_identifier(session, criterion).await,
            Strategy::Link => self.by_link_text(session, criterion).await,
            Strategy::Dom => self.by_dom_expression(session, criterion).await,
            Strategy::Implicit => {
                if criterion.starts_with("document.") {
                    self.by_dom_expression(session, criterion).await
                } else if criterion.starts_with("//") {
                    self.query(session, &By::xpath(criterion)).await
                } else {
                    self.by_identifier(session, criterion).await
                }
            }
        }
    }

    /// Runs a native query and applies the visibility filter.
    async fn query(&self, session: &dyn Session, by: &By) -> Result<Vec<ElementRef>> {
        let found = session.find_elements(by).await?;
        let mut result = Vec::with_capacity(found.len());
        for element in found {
            if self.acceptable(&element).await? {
                result.push(element);
            }
        }
        Ok(result)
    }

    async fn acceptable(&self, element: &ElementRef) -> Result<bool> {
        if self.visible_only {
            element.is_displayed().await
        } else {
            Ok(true)
        }
    }

    async fn by_id(&self, session: &dyn Session, id: &str) -> Result<Vec<ElementRef>> {
        self.query(session, &By::xpath(format!("//*[@id='{id}']")))
            .await
    }

    /// `identifier=`: elements matched by id first, then by plain name.
    async fn by_identifier(
        &self,
        session: &dyn Session,
        identifier: &str,
    ) -> Result<Vec<ElementRef>> {
        let mut result = self.by_id(session, identifier).await?;
        result.extend(
            self.query(session, &By::xpath(format!("//*[@name='{identifier}']")))
                .await?,
        );
        Ok(result)
    }

    /// `name=` with attribute criteria: filter by value attribute, then
    /// select by index. A malformed or out-of-range index yields an empty
    /// result, not an error.
    async fn by_name_criteria(
        &self,
        session: &dyn Session,
        criterion: &str,
    ) -> Result<Vec<ElementRef>> {
        let criteria = parse_name_criteria(criterion);
        let mut elements = self
            .query(
                session,
                &By::xpath(format!("//*[@name='{}']", criteria.name)),
            )
            .await?;

        if let Some(wanted) = &criteria.value {
            let mut kept = Vec::with_capacity(elements.len());
            for element in elements {
                // the attribute must be defined, even when matching empty
                if let Some(value) = element.attribute("value").await? {
                    if value == *wanted {
                        kept.push(element);
                    }
                }
            }
            elements = kept;
        }

        if let Some(index) = &criteria.index {
            elements = match index.parse::<usize>() {
                Ok(idx) if idx < elements.len() => vec![elements.swap_remove(idx)],
                _ => Vec::new(),
            };
        }

        Ok(elements)
    }

    /// `link=`: anchors whose rendered text matches the pattern.
    async fn by_link_text(
        &self,
        session: &dyn Session,
        pattern: &str,
    ) -> Result<Vec<ElementRef>> {
        let anchors = session.find_elements(&By::tag_name("a")).await?;
        let mut result = Vec::new();
        for anchor in anchors {
            if self.acceptable(&anchor).await?
                && matching::is_match(&anchor.text().await?, pattern, true, true)
            {
                result.push(anchor);
            }
        }
        Ok(result)
    }

    /// `dom=`: evaluates the criterion as a script and accepts the result
    /// only if it is an element reference.
    async fn by_dom_expression(
        &self,
        session: &dyn Session,
        expression: &str,
    ) -> Result<Vec<ElementRef>> {
        let value = session
            .execute_script(&format!("return {expression}"), Vec::<ScriptArg>::new())
            .await?;

        if let Some(element) = value.into_element() {
            if self.acceptable(&element).await? {
                return Ok(vec![element]);
            }
        }
        Ok(Vec::new())
    }
}
