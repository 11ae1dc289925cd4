use chromiumoxide::element::Element;
use log::debug;

use crate::error::Error;

use super::{Locator, Page};

// Evaluated with `this` bound to the element.
const IS_STALE_JS: &str = "function() { return !this.isConnected; }";
const IS_CLICKABLE_JS: &str = r#"function() {
    if (!this.isConnected || this.disabled) { return false; }
    const rect = this.getBoundingClientRect();
    const style = window.getComputedStyle(this);
    return rect.width > 0 && rect.height > 0
        && style.visibility !== 'hidden'
        && style.display !== 'none';
}"#;

/// A `Page` backed by a chrome tab over the devtools protocol.
pub struct ChromePage {
    page: chromiumoxide::Page,
}

impl ChromePage {
    /// Returns a new ChromePage driving the given tab.
    pub fn new(page: chromiumoxide::Page) -> Self {
        Self { page }
    }

    async fn eval_bool(&self, el: &Element, function: &str) -> Result<Option<bool>, Error> {
        let ret = el.call_js_fn(function, false).await?;
        Ok(ret.result.value.and_then(|v| v.as_bool()))
    }
}

impl Page for ChromePage {
    type Element = Element;

    async fn goto(&self, url: &str) -> Result<(), Error> {
        self.page.goto(url).await?;
        Ok(())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<Element>, Error> {
        match locator {
            Locator::Css(selector) => Ok(self.page.find_elements(selector.as_str()).await?),
            Locator::LinkText(text) => {
                let mut found = Vec::new();
                for a in self.page.find_elements("a").await? {
                    if let Ok(Some(t)) = a.inner_text().await {
                        if t.trim() == text.as_str() {
                            found.push(a);
                        }
                    }
                }
                Ok(found)
            }
        }
    }

    async fn attribute(&self, el: &Element, name: &str) -> Result<Option<String>, Error> {
        Ok(el.attribute(name).await?)
    }

    async fn outer_html(&self, el: &Element) -> Result<String, Error> {
        Ok(el.outer_html().await?.unwrap_or_default())
    }

    async fn click(&self, el: &Element) -> Result<(), Error> {
        el.click().await?;
        Ok(())
    }

    async fn is_clickable(&self, el: &Element) -> Result<bool, Error> {
        Ok(self.eval_bool(el, IS_CLICKABLE_JS).await?.unwrap_or(false))
    }

    async fn is_stale(&self, el: &Element) -> Result<bool, Error> {
        // a destroyed execution context (navigation) also means stale
        match self.eval_bool(el, IS_STALE_JS).await {
            Ok(stale) => Ok(stale.unwrap_or(true)),
            Err(e) => {
                debug!("treating element as stale: {}", e);
                Ok(true)
            }
        }
    }
}
