use crate::error::Error;

use super::Locator;

/// A live, possibly asynchronously rendering, browser page.
///
/// Element handles may go stale at any time (the page re-rendered or
/// navigated); callers are expected to check `is_stale` or tolerate errors.
#[allow(async_fn_in_trait)]
pub trait Page {
    /// Handle to an element on the page.
    type Element;

    /// Navigate to the given url.
    async fn goto(&self, url: &str) -> Result<(), Error>;

    /// Returns every element currently matching the locator; empty when
    /// nothing matches.
    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self::Element>, Error>;

    /// Returns the value of an attribute of the element, if set.
    async fn attribute(&self, el: &Self::Element, name: &str) -> Result<Option<String>, Error>;

    /// Returns the outer html of the element.
    async fn outer_html(&self, el: &Self::Element) -> Result<String, Error>;

    /// Click the element.
    async fn click(&self, el: &Self::Element) -> Result<(), Error>;

    /// Returns whether the element is attached, rendered, visible and enabled.
    async fn is_clickable(&self, el: &Self::Element) -> Result<bool, Error>;

    /// Returns whether the element is no longer part of the document.
    async fn is_stale(&self, el: &Self::Element) -> Result<bool, Error>;
}
